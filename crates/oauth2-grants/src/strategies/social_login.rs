use async_trait::async_trait;

use oauth2_core::{BearerToken, GrantFailure, OAuth2Error, SocialVerification};

use super::GrantStrategy;
use crate::context::GrantContext;
use crate::request::TokenRequest;

pub const DEFAULT_SOCIAL_LOGIN_ERROR: &str = "Username or Password is invalid.";

/// Grant backed by a social-identity assertion (provider, uid, provider token).
///
/// A rejected assertion is reported as `unauthorized` (401), not `invalid_grant`.
pub struct SocialLoginStrategy;

#[async_trait]
impl GrantStrategy for SocialLoginStrategy {
    async fn process(
        &self,
        context: &GrantContext,
        request: &TokenRequest,
    ) -> Result<BearerToken, GrantFailure> {
        let client = context.require_client(request).await?;

        let resource_owner = match context
            .authenticate_resource_owner_social(&client, request)
            .await?
        {
            SocialVerification::Verified(owner) => owner,
            SocialVerification::Rejected { message } => {
                let message = message
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DEFAULT_SOCIAL_LOGIN_ERROR);
                tracing::warn!(
                    provider = %request.provider.as_deref().unwrap_or(""),
                    reason = %message,
                    "social identity rejected"
                );
                return Err(OAuth2Error::unauthorized(message).into());
            }
        };

        let scopes = GrantContext::scopes_from(request);
        Ok(context.issue(&client, Some(&resource_owner), scopes).await?)
    }
}
