use async_trait::async_trait;

use oauth2_core::{BearerToken, GrantFailure, OAuth2Error};

use super::GrantStrategy;
use crate::context::GrantContext;
use crate::request::TokenRequest;

/// Resource Owner Password Credentials grant (RFC 6749 §4.3).
pub struct PasswordStrategy;

#[async_trait]
impl GrantStrategy for PasswordStrategy {
    async fn process(
        &self,
        context: &GrantContext,
        request: &TokenRequest,
    ) -> Result<BearerToken, GrantFailure> {
        let client = context.require_client(request).await?;

        let resource_owner = context
            .authenticate_resource_owner(&client, request)
            .await?
            .ok_or_else(|| OAuth2Error::invalid_grant("Invalid resource owner credentials"))?;

        let scopes = GrantContext::scopes_from(request);
        Ok(context.issue(&client, Some(&resource_owner), scopes).await?)
    }
}
