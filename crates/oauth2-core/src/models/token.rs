use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{Client, ResourceOwner};

/// Persisted access token record.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub id: String,
    pub token: String,
    pub refresh_token: Option<String>,
    /// Owning client id. `None` marks a public token.
    pub client_id: Option<String>,
    pub resource_owner_id: Option<String>,
    /// Space-delimited, in the order the client submitted them.
    pub scopes: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(
        token: String,
        refresh_token: Option<String>,
        client: Option<&Client>,
        resource_owner: Option<&ResourceOwner>,
        scopes: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            token,
            refresh_token,
            client_id: client.map(|c| c.id.clone()),
            resource_owner_id: resource_owner.map(|o| o.id.clone()),
            scopes,
            expires_at,
            revoked_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_valid(&self) -> bool {
        !self.is_expired() && !self.is_revoked()
    }

    /// Public tokens are not bound to any client.
    pub fn is_public(&self) -> bool {
        self.client_id.is_none()
    }

    pub fn belongs_to(&self, client: &Client) -> bool {
        self.client_id.as_deref() == Some(client.id.as_str())
    }

    pub fn resource_owner(&self) -> Option<ResourceOwner> {
        self.resource_owner_id.clone().map(ResourceOwner::new)
    }

    /// Mark the token revoked.
    ///
    /// Without an explicit time an already revoked token keeps its first
    /// `revoked_at`. Returns whether the record changed.
    pub fn revoke(&mut self, at: Option<DateTime<Utc>>) -> bool {
        match at {
            Some(at) => {
                let changed = self.revoked_at != Some(at);
                self.revoked_at = Some(at);
                changed
            }
            None if self.revoked_at.is_some() => false,
            None => {
                self.revoked_at = Some(Utc::now());
                true
            }
        }
    }

    /// Seconds until expiry, rounded up and never negative.
    pub fn expires_in(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expires_at.map(|expires_at| {
            let millis = (expires_at - now).num_milliseconds();
            if millis <= 0 {
                0
            } else {
                (millis + 999) / 1000
            }
        })
    }

    pub fn to_bearer_token(&self, now: DateTime<Utc>) -> BearerToken {
        BearerToken {
            access_token: self.token.clone(),
            token_type: BearerToken::TOKEN_TYPE.to_string(),
            expires_in: self.expires_in(now),
            refresh_token: self.refresh_token.clone(),
            scope: self.scopes.clone(),
        }
    }
}

/// Token endpoint success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken {
    pub access_token: String,
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl BearerToken {
    pub const TOKEN_TYPE: &'static str = "bearer";
}

impl From<&AccessToken> for BearerToken {
    fn from(token: &AccessToken) -> Self {
        token.to_bearer_token(Utc::now())
    }
}

/// Which column a presented token value is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenTypeHint {
    #[default]
    AccessToken,
    RefreshToken,
}

impl TokenTypeHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenTypeHint::AccessToken => "access_token",
            TokenTypeHint::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for TokenTypeHint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenTypeHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access_token" => Ok(TokenTypeHint::AccessToken),
            "refresh_token" => Ok(TokenTypeHint::RefreshToken),
            other => Err(format!("unknown token type hint '{other}'")),
        }
    }
}
