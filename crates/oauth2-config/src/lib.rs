use chrono::{TimeDelta, Utc};
use config::{ConfigError, Environment};
use hocon::HoconLoader;
use serde::{Deserialize, Serialize};
use std::path::Path;

use oauth2_core::{OnRefresh, TokenSettings, DEFAULT_ACCESS_TOKEN_LIFETIME};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub token: TokenConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `memory`, `sqlite:...` or `postgres://...`.
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:oauth2.db?mode=rwc".to_string(),
        }
    }
}

/// Token issuance settings as written in configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    /// Lifetime in seconds. Zero or a negative value issues non-expiring tokens.
    #[serde(default = "default_access_token_lifetime")]
    pub access_token_lifetime: i64,
    #[serde(default)]
    pub issue_refresh_token: bool,
    /// `nothing`, `revoke` or `destroy`. Custom actions can only be set in code.
    #[serde(default = "default_on_refresh")]
    pub on_refresh: String,
}

fn default_access_token_lifetime() -> i64 {
    DEFAULT_ACCESS_TOKEN_LIFETIME
}

fn default_on_refresh() -> String {
    "nothing".to_string()
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime: default_access_token_lifetime(),
            issue_refresh_token: false,
            on_refresh: default_on_refresh(),
        }
    }
}

impl TokenConfig {
    /// Lifetimes so large that an expiry timestamp cannot be represented are
    /// rejected here rather than at issuance.
    pub fn to_settings(&self) -> Result<TokenSettings, String> {
        let lifetime = if self.access_token_lifetime > 0 {
            let lifetime = TimeDelta::try_seconds(self.access_token_lifetime)
                .filter(|lifetime| Utc::now().checked_add_signed(*lifetime).is_some())
                .ok_or_else(|| {
                    format!(
                        "access_token_lifetime {} is out of range",
                        self.access_token_lifetime
                    )
                })?;
            Some(lifetime)
        } else {
            None
        };
        let on_refresh: OnRefresh = self.on_refresh.parse()?;

        Ok(TokenSettings::default()
            .with_lifetime(lifetime)
            .with_refresh_tokens(self.issue_refresh_token)
            .with_on_refresh(on_refresh))
    }
}

impl Config {
    /// Load `application.conf` from the working directory, falling back to
    /// `OAUTH2_*` environment variables when it is missing or invalid.
    pub fn load() -> Result<Self, String> {
        Self::load_with("application.conf", Self::environment())
    }

    fn load_with<P: AsRef<Path>>(path: P, env: Environment) -> Result<Self, String> {
        Self::from_hocon_path(path).or_else(|e| {
            tracing::warn!(
                "Failed to load HOCON config: {}. Falling back to environment variables.",
                e
            );
            Self::from_environment(env).map_err(|e| e.to_string())
        })
    }

    /// Load configuration from HOCON file with environment variable substitution
    pub fn from_hocon() -> Result<Self, String> {
        Self::from_hocon_path("application.conf")
    }

    /// Load configuration from a specific HOCON file path
    pub fn from_hocon_path<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(format!("Configuration file not found: {}", path.display()));
        }

        let config: Config = HoconLoader::new()
            .load_file(path)
            .map_err(|e| format!("Failed to load HOCON file: {}", e))?
            .resolve()
            .map_err(|e| format!("Failed to parse and resolve HOCON: {}", e))?;

        config.token.to_settings()?;
        Ok(config)
    }

    /// Load from environment variables, e.g.
    /// `OAUTH2_TOKEN__ISSUE_REFRESH_TOKEN=true` or `OAUTH2_DATABASE__URL=memory`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix("OAUTH2")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn from_environment(env: Environment) -> Result<Self, ConfigError> {
        let config: Config = config::Config::builder()
            .add_source(env)
            .build()?
            .try_deserialize()?;

        config.token.to_settings().map_err(ConfigError::Message)?;
        Ok(config)
    }

    /// Produce a version safe to log (database credentials masked).
    pub fn sanitized(&self) -> Self {
        let mut clone = self.clone();
        clone.database.url = mask_url_password(&self.database.url);
        clone
    }
}

fn mask_url_password(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let authority_start = scheme_end + 3;
    let rest = &url[authority_start..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let authority = &rest[..authority_end];

    match (authority.rfind('@'), authority.find(':')) {
        (Some(at), Some(colon)) if colon < at => format!(
            "{}{}:***MASKED***{}",
            &url[..authority_start],
            &authority[..colon],
            &url[authority_start + at..]
        ),
        _ => url.to_string(),
    }
}
