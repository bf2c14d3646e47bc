//! Token endpoint dispatch: grant type to strategy, result to response envelope.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::Instrument;

use oauth2_core::{BearerToken, GrantFailure, OAuthResponse, ServerError};

use crate::context::GrantContext;
use crate::request::TokenRequest;
use crate::strategies::GrantType;

/// Output slot filled by a [`GrantOverride`].
#[derive(Debug, Default)]
pub struct GrantResponse {
    pub access_token: Option<BearerToken>,
}

/// Replaces strategy resolution for a single call, e.g. a custom token
/// endpoint with its own client rules. It must either set
/// [`GrantResponse::access_token`] or fail.
#[async_trait]
pub trait GrantOverride: Send + Sync {
    async fn process(
        &self,
        context: &GrantContext,
        request: &TokenRequest,
        response: &mut GrantResponse,
    ) -> Result<(), GrantFailure>;
}

pub struct GrantDispatcher {
    context: Arc<GrantContext>,
}

impl GrantDispatcher {
    pub fn new(context: Arc<GrantContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<GrantContext> {
        &self.context
    }

    pub async fn dispatch(&self, request: &TokenRequest) -> Result<OAuthResponse, ServerError> {
        self.dispatch_with(request, None).await
    }

    /// Run the grant and wrap the outcome.
    ///
    /// Protocol failures become an error envelope here and nowhere else.
    /// Collaborator faults are returned as `Err` for the transport to map.
    pub async fn dispatch_with(
        &self,
        request: &TokenRequest,
        grant_override: Option<&dyn GrantOverride>,
    ) -> Result<OAuthResponse, ServerError> {
        let span = tracing::info_span!(
            "grant",
            grant_type = %request.grant_type,
            client_id = %request.client_id.as_deref().unwrap_or(""),
            custom = grant_override.is_some()
        );

        async move {
            match self.run(request, grant_override).await {
                Ok(token) => {
                    tracing::info!("grant succeeded");
                    Ok(OAuthResponse::bearer(&token))
                }
                Err(GrantFailure::Request(err)) => {
                    tracing::info!(
                        error = %err.error.as_str(),
                        description = %err.error_description.as_deref().unwrap_or(""),
                        "grant rejected"
                    );
                    Ok(OAuthResponse::error(&err))
                }
                Err(GrantFailure::Server(err)) => {
                    tracing::error!(error = %err, "grant failed");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: &TokenRequest,
        grant_override: Option<&dyn GrantOverride>,
    ) -> Result<BearerToken, GrantFailure> {
        if let Some(grant_override) = grant_override {
            let mut response = GrantResponse::default();
            grant_override
                .process(&self.context, request, &mut response)
                .await?;
            return response
                .access_token
                .ok_or_else(|| ServerError::MissingBearerToken.into());
        }

        let grant_type: GrantType = request.grant_type.parse()?;
        grant_type.strategy().process(&self.context, request).await
    }
}
