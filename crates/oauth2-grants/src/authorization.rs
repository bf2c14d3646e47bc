//! Authorization endpoint pass-through. Request validation and consent belong
//! to the host's [`AuthorizationHandler`]; this module only shapes responses.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use oauth2_core::{GrantFailure, OAuth2Error, OAuthResponse, ServerError};

use crate::context::GrantContext;
use crate::request::AuthorizationRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthorizationOutcome {
    /// 302 to `location`.
    Redirect { location: String },
    /// 302 back to the client with the error in the query (RFC 6749 §4.1.2.1).
    RedirectError {
        redirect_uri: String,
        error: OAuth2Error,
        state: Option<String>,
    },
    /// Answer directly, e.g. a consent page description.
    Render { status: u16, body: Value },
}

#[async_trait]
pub trait AuthorizationHandler: Send + Sync {
    async fn authorize(
        &self,
        context: &GrantContext,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationOutcome, GrantFailure>;
}

/// Handler for servers without an authorization endpoint flow.
pub struct UnsupportedResponseType;

#[async_trait]
impl AuthorizationHandler for UnsupportedResponseType {
    async fn authorize(
        &self,
        _context: &GrantContext,
        request: &AuthorizationRequest,
    ) -> Result<AuthorizationOutcome, GrantFailure> {
        let response_type = request.response_type.as_deref().unwrap_or("");
        Err(OAuth2Error::unsupported_response_type(&format!(
            "Response type '{response_type}' not supported"
        ))
        .into())
    }
}

pub struct AuthorizationDispatcher {
    context: Arc<GrantContext>,
    handler: Arc<dyn AuthorizationHandler>,
}

impl AuthorizationDispatcher {
    pub fn new(context: Arc<GrantContext>, handler: Arc<dyn AuthorizationHandler>) -> Self {
        Self { context, handler }
    }

    pub async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<OAuthResponse, ServerError> {
        let outcome = match self.handler.authorize(&self.context, request).await {
            Ok(outcome) => outcome,
            Err(GrantFailure::Request(err)) => {
                tracing::info!(error = %err.error.as_str(), "authorization rejected");
                return Ok(OAuthResponse::error(&err));
            }
            Err(GrantFailure::Server(err)) => {
                tracing::error!(error = %err, "authorization failed");
                return Err(err);
            }
        };

        Ok(match outcome {
            AuthorizationOutcome::Redirect { location } => OAuthResponse::redirect(location),
            AuthorizationOutcome::Render { status, body } => OAuthResponse::new(status, body)
                .with_header("Content-Type", "application/json"),
            AuthorizationOutcome::RedirectError {
                redirect_uri,
                error,
                state,
            } => match error_redirect(&redirect_uri, &error, state.as_deref()) {
                Some(location) => OAuthResponse::redirect(location),
                None => {
                    // Never redirect to something that is not an absolute URI.
                    tracing::warn!(redirect_uri = %redirect_uri, "unparseable redirect_uri");
                    OAuthResponse::error(&error)
                }
            },
        })
    }
}

fn error_redirect(redirect_uri: &str, error: &OAuth2Error, state: Option<&str>) -> Option<String> {
    let mut url = Url::parse(redirect_uri).ok()?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("error", error.error.as_str());
        if let Some(description) = &error.error_description {
            query.append_pair("error_description", description);
        }
        if let Some(state) = state {
            query.append_pair("state", state);
        }
    }
    Some(url.into())
}
