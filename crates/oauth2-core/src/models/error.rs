use serde::{Deserialize, Serialize};
use std::fmt;

/// RFC 6749 §5.2 (and RFC 7009) error codes understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    InvalidClient,
    InvalidGrant,
    UnauthorizedClient,
    UnsupportedGrantType,
    InvalidScope,
    /// Resource owner verification failed in a strategy that reports it as 401.
    Unauthorized,
    AccessDenied,
    UnsupportedResponseType,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::InvalidClient => "invalid_client",
            ErrorCode::InvalidGrant => "invalid_grant",
            ErrorCode::UnauthorizedClient => "unauthorized_client",
            ErrorCode::UnsupportedGrantType => "unsupported_grant_type",
            ErrorCode::InvalidScope => "invalid_scope",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::AccessDenied => "access_denied",
            ErrorCode::UnsupportedResponseType => "unsupported_response_type",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::InvalidClient | ErrorCode::Unauthorized => 401,
            ErrorCode::AccessDenied => 403,
            _ => 400,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A protocol-level failure. Rendered as the standard OAuth2 error body.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OAuth2Error {
    pub error: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl OAuth2Error {
    pub fn new(error: ErrorCode, description: Option<&str>) -> Self {
        Self {
            error,
            error_description: description.map(|s| s.to_string()),
        }
    }

    pub fn invalid_request(description: &str) -> Self {
        Self::new(ErrorCode::InvalidRequest, Some(description))
    }

    pub fn invalid_client(description: &str) -> Self {
        Self::new(ErrorCode::InvalidClient, Some(description))
    }

    pub fn invalid_grant(description: &str) -> Self {
        Self::new(ErrorCode::InvalidGrant, Some(description))
    }

    pub fn unauthorized_client(description: &str) -> Self {
        Self::new(ErrorCode::UnauthorizedClient, Some(description))
    }

    pub fn unsupported_grant_type(description: &str) -> Self {
        Self::new(ErrorCode::UnsupportedGrantType, Some(description))
    }

    pub fn invalid_scope(description: &str) -> Self {
        Self::new(ErrorCode::InvalidScope, Some(description))
    }

    pub fn unauthorized(description: &str) -> Self {
        Self::new(ErrorCode::Unauthorized, Some(description))
    }

    pub fn access_denied(description: &str) -> Self {
        Self::new(ErrorCode::AccessDenied, Some(description))
    }

    pub fn unsupported_response_type(description: &str) -> Self {
        Self::new(ErrorCode::UnsupportedResponseType, Some(description))
    }

    pub fn status_code(&self) -> u16 {
        self.error.status_code()
    }
}

impl fmt::Display for OAuth2Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{}: {}", self.error, description),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuth2Error {}

#[cfg(feature = "actix")]
impl actix_web::ResponseError for OAuth2Error {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::from_u16(OAuth2Error::status_code(self))
            .unwrap_or(actix_web::http::StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::build(actix_web::ResponseError::status_code(self))
            .insert_header(("Cache-Control", "no-store"))
            .insert_header(("Pragma", "no-cache"))
            .json(self)
    }
}

/// Failure reported by an `AccessTokenStore` implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint (token or refresh token) was violated.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Failure reported by an `Authenticator` implementation.
///
/// Bad credentials are not an error; they are an absent result.
#[derive(Debug, thiserror::Error)]
#[error("authenticator failure: {0}")]
pub struct AuthenticatorError(pub String);

/// Collaborator malfunction. Never interpreted by the engine; the transport
/// layer maps it to a 500.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Authenticator(#[from] AuthenticatorError),

    #[error("could not generate a unique token after {0} attempts")]
    TokenGeneration(u32),

    #[error("grant override finished without issuing a bearer token")]
    MissingBearerToken,

    #[error("access token lifetime overflows the expiry timestamp")]
    ExpiryOverflow,
}

#[cfg(feature = "actix")]
impl actix_web::ResponseError for ServerError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        // Collaborator details stay in the logs.
        actix_web::HttpResponse::InternalServerError()
            .insert_header(("Cache-Control", "no-store"))
            .json(serde_json::json!({ "error": "server_error" }))
    }
}

/// Outcome of a failed strategy: either a typed request failure that becomes an
/// error envelope, or a collaborator fault that propagates.
#[derive(Debug, thiserror::Error)]
pub enum GrantFailure {
    #[error(transparent)]
    Request(#[from] OAuth2Error),

    #[error(transparent)]
    Server(#[from] ServerError),
}

impl From<StoreError> for GrantFailure {
    fn from(err: StoreError) -> Self {
        GrantFailure::Server(err.into())
    }
}

impl From<AuthenticatorError> for GrantFailure {
    fn from(err: AuthenticatorError) -> Self {
        GrantFailure::Server(err.into())
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        // Provide a stable, non-leaky mapping for unique violations.
        if let sqlx::Error::Database(db_err) = &err {
            let code = db_err.code().unwrap_or_default();
            let msg = db_err.message();

            // Postgres unique violation: 23505
            // SQLite constraint error codes vary by extended code; also match by message.
            let is_unique = db_err.is_unique_violation()
                || code == "23505"
                || code == "2067"
                || code == "1555"
                || msg.contains("UNIQUE constraint failed")
                || msg.contains("duplicate key");

            if is_unique {
                return Self::Duplicate(msg.to_string());
            }
        }

        Self::Backend(err.to_string())
    }
}
