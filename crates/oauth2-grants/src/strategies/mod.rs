//! One strategy per grant type. Each turns a request into a bearer token or a
//! typed failure.

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use oauth2_core::{BearerToken, GrantFailure, OAuth2Error};

use crate::context::GrantContext;
use crate::request::TokenRequest;

mod password;
mod refresh_token;
mod social_login;

pub use password::PasswordStrategy;
pub use refresh_token::RefreshTokenStrategy;
pub use social_login::{SocialLoginStrategy, DEFAULT_SOCIAL_LOGIN_ERROR};

#[async_trait]
pub trait GrantStrategy: Send + Sync {
    async fn process(
        &self,
        context: &GrantContext,
        request: &TokenRequest,
    ) -> Result<BearerToken, GrantFailure>;
}

/// Grant types the token endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantType {
    Password,
    RefreshToken,
    SocialLogin,
}

impl GrantType {
    pub const ALL: [GrantType; 3] = [
        GrantType::Password,
        GrantType::RefreshToken,
        GrantType::SocialLogin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GrantType::Password => "password",
            GrantType::RefreshToken => "refresh_token",
            GrantType::SocialLogin => "social_login",
        }
    }

    /// Parameters the request normalizer insists on for this grant type.
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            GrantType::Password => &["client_id", "client_secret", "login", "password"],
            GrantType::RefreshToken => &["client_id", "client_secret", "refresh_token"],
            GrantType::SocialLogin => &[
                "client_id",
                "client_secret",
                "email",
                "provider",
                "uid",
                "social_access_token",
            ],
        }
    }

    pub fn strategy(&self) -> &'static dyn GrantStrategy {
        match self {
            GrantType::Password => &PasswordStrategy,
            GrantType::RefreshToken => &RefreshTokenStrategy,
            GrantType::SocialLogin => &SocialLoginStrategy,
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrantType {
    type Err = OAuth2Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GrantType::ALL
            .into_iter()
            .find(|grant_type| grant_type.as_str() == s)
            .ok_or_else(|| {
                OAuth2Error::unsupported_grant_type(&format!("Grant type '{s}' not supported"))
            })
    }
}
