use chrono::Duration;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::AccessToken;

/// Default access token lifetime in seconds.
pub const DEFAULT_ACCESS_TOKEN_LIFETIME: i64 = 7200;

pub type RefreshAction = Arc<dyn Fn(&mut AccessToken) + Send + Sync>;

/// What happens to the previous access token after a successful refresh grant.
#[derive(Clone, Default)]
pub enum OnRefresh {
    #[default]
    Nothing,
    Revoke,
    Destroy,
    /// Caller-supplied action. The mutated token is persisted afterwards.
    Custom(RefreshAction),
}

impl OnRefresh {
    pub fn custom<F>(action: F) -> Self
    where
        F: Fn(&mut AccessToken) + Send + Sync + 'static,
    {
        OnRefresh::Custom(Arc::new(action))
    }

    pub fn name(&self) -> &'static str {
        match self {
            OnRefresh::Nothing => "nothing",
            OnRefresh::Revoke => "revoke",
            OnRefresh::Destroy => "destroy",
            OnRefresh::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for OnRefresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OnRefresh {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "nothing" => Ok(OnRefresh::Nothing),
            "revoke" | "revoke!" => Ok(OnRefresh::Revoke),
            "destroy" => Ok(OnRefresh::Destroy),
            other => Err(format!(
                "unknown on_refresh policy '{other}' (expected nothing, revoke or destroy)"
            )),
        }
    }
}

/// Token issuance settings, built once at startup and shared with the engine.
#[derive(Debug, Clone)]
pub struct TokenSettings {
    /// `None` issues tokens that never expire.
    pub access_token_lifetime: Option<Duration>,
    pub issue_refresh_token: bool,
    pub on_refresh: OnRefresh,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            access_token_lifetime: Some(Duration::seconds(DEFAULT_ACCESS_TOKEN_LIFETIME)),
            issue_refresh_token: false,
            on_refresh: OnRefresh::Nothing,
        }
    }
}

impl TokenSettings {
    pub fn with_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.access_token_lifetime = lifetime;
        self
    }

    pub fn with_refresh_tokens(mut self, issue: bool) -> Self {
        self.issue_refresh_token = issue;
        self
    }

    pub fn with_on_refresh(mut self, on_refresh: OnRefresh) -> Self {
        self.on_refresh = on_refresh;
        self
    }
}
