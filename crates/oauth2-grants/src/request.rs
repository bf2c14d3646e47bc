//! Normalized requests consumed by the engine, and the normalizer that builds
//! them from raw form/query parameters.
//!
//! Missing required parameters are rejected here with `invalid_request`, before
//! anything is dispatched.

use std::collections::HashMap;

use oauth2_core::{OAuth2Error, SocialAssertion, TokenTypeHint};

use crate::strategies::GrantType;

fn param(params: &HashMap<String, String>, name: &str) -> Option<String> {
    // RFC 6749 §3.1: parameters sent without a value are treated as omitted.
    params.get(name).filter(|v| !v.is_empty()).cloned()
}

pub(crate) fn required<'a>(name: &str, value: &'a Option<String>) -> Result<&'a str, OAuth2Error> {
    value
        .as_deref()
        .ok_or_else(|| OAuth2Error::invalid_request(&format!("'{name}' required.")))
}

/// Token endpoint request after transport-level extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRequest {
    pub grant_type: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub refresh_token: Option<String>,
    pub email: Option<String>,
    pub provider: Option<String>,
    pub uid: Option<String>,
    pub social_access_token: Option<String>,
}

impl TokenRequest {
    pub fn new(grant_type: impl Into<String>) -> Self {
        Self {
            grant_type: grant_type.into(),
            ..Self::default()
        }
    }

    pub fn with_client(mut self, client_id: &str, client_secret: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self.client_secret = Some(client_secret.to_string());
        self
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string());
        self
    }

    pub fn with_password(mut self, login: &str, password: &str) -> Self {
        self.login = Some(login.to_string());
        self.password = Some(password.to_string());
        self
    }

    pub fn with_refresh_token(mut self, refresh_token: &str) -> Self {
        self.refresh_token = Some(refresh_token.to_string());
        self
    }

    pub fn with_social(mut self, assertion: &SocialAssertion) -> Self {
        self.email = Some(assertion.email.clone());
        self.provider = Some(assertion.provider.clone());
        self.uid = Some(assertion.uid.clone());
        self.social_access_token = Some(assertion.social_access_token.clone());
        self
    }

    /// Build a request from decoded form parameters.
    ///
    /// Unknown grant types are passed through untouched so the dispatcher can
    /// answer `unsupported_grant_type`.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, OAuth2Error> {
        let grant_type = param(params, "grant_type")
            .ok_or_else(|| OAuth2Error::invalid_request("'grant_type' required."))?;

        let request = Self {
            grant_type,
            client_id: param(params, "client_id"),
            client_secret: param(params, "client_secret"),
            scope: param(params, "scope"),
            login: param(params, "login"),
            password: param(params, "password"),
            refresh_token: param(params, "refresh_token"),
            email: param(params, "email"),
            provider: param(params, "provider"),
            uid: param(params, "uid"),
            social_access_token: param(params, "social_access_token"),
        };

        if let Ok(grant_type) = request.grant_type.parse::<GrantType>() {
            for name in grant_type.required_params() {
                if request.get(name).is_none() {
                    return Err(OAuth2Error::invalid_request(&format!("'{name}' required.")));
                }
            }
        }

        Ok(request)
    }

    fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "client_id" => &self.client_id,
            "client_secret" => &self.client_secret,
            "scope" => &self.scope,
            "login" => &self.login,
            "password" => &self.password,
            "refresh_token" => &self.refresh_token,
            "email" => &self.email,
            "provider" => &self.provider,
            "uid" => &self.uid,
            "social_access_token" => &self.social_access_token,
            _ => return None,
        };
        value.as_deref()
    }

    pub fn social_assertion(&self) -> Result<SocialAssertion, OAuth2Error> {
        Ok(SocialAssertion {
            email: required("email", &self.email)?.to_string(),
            provider: required("provider", &self.provider)?.to_string(),
            uid: required("uid", &self.uid)?.to_string(),
            social_access_token: required("social_access_token", &self.social_access_token)?
                .to_string(),
        })
    }
}

/// RFC 7009 revocation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationRequest {
    pub token: String,
    pub token_type_hint: TokenTypeHint,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl RevocationRequest {
    pub fn new(token: impl Into<String>, token_type_hint: TokenTypeHint) -> Self {
        Self {
            token: token.into(),
            token_type_hint,
            client_id: None,
            client_secret: None,
        }
    }

    pub fn with_client(mut self, client_id: &str, client_secret: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self.client_secret = Some(client_secret.to_string());
        self
    }

    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, OAuth2Error> {
        let token = param(params, "token")
            .ok_or_else(|| OAuth2Error::invalid_request("'token' required."))?;

        let token_type_hint = match param(params, "token_type_hint") {
            Some(hint) => hint
                .parse::<TokenTypeHint>()
                .map_err(|e| OAuth2Error::invalid_request(&e))?,
            None => TokenTypeHint::default(),
        };

        Ok(Self {
            token,
            token_type_hint,
            client_id: param(params, "client_id"),
            client_secret: param(params, "client_secret"),
        })
    }
}

/// Authorization endpoint request. Validation belongs to the
/// [`crate::AuthorizationHandler`], so every field is optional here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub response_type: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
}

impl AuthorizationRequest {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            response_type: param(params, "response_type"),
            client_id: param(params, "client_id"),
            redirect_uri: param(params, "redirect_uri"),
            scope: param(params, "scope"),
            state: param(params, "state"),
        }
    }
}
