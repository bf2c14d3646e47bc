use std::sync::Arc;

use oauth2_core::{AccessToken, Client, OAuthResponse, ServerError};

use crate::context::GrantContext;
use crate::request::RevocationRequest;

/// RFC 7009 token revocation.
///
/// The response is always `200 {}`: unknown tokens and clients that do not own
/// the token are ignored so the endpoint cannot be used to probe for tokens.
pub struct RevocationEndpoint {
    context: Arc<GrantContext>,
}

impl RevocationEndpoint {
    pub fn new(context: Arc<GrantContext>) -> Self {
        Self { context }
    }

    pub async fn revoke(&self, request: &RevocationRequest) -> Result<OAuthResponse, ServerError> {
        let tokens = self.context.tokens();
        let Some(mut token) = tokens
            .authenticate(&request.token, request.token_type_hint)
            .await?
        else {
            tracing::debug!(hint = %request.token_type_hint, "revocation of unknown token ignored");
            return Ok(OAuthResponse::empty_ok());
        };

        if token.is_public() || self.owned_by_requester(&token, request).await? {
            tokens.revoke(&mut token, None).await?;
        } else {
            tracing::warn!(
                client_id = %request.client_id.as_deref().unwrap_or(""),
                "revocation requested by a client that does not own the token"
            );
        }

        Ok(OAuthResponse::empty_ok())
    }

    async fn owned_by_requester(
        &self,
        token: &AccessToken,
        request: &RevocationRequest,
    ) -> Result<bool, ServerError> {
        let Some(client_id) = request.client_id.as_deref() else {
            return Ok(false);
        };
        let client: Option<Client> = self
            .context
            .authenticator()
            .authenticate_client(client_id, request.client_secret.as_deref())
            .await?;
        Ok(client.is_some_and(|client| token.belongs_to(&client)))
    }
}
