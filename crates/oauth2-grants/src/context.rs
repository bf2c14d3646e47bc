use chrono::Utc;
use std::sync::Arc;

use oauth2_core::{
    parse_scopes, BearerToken, Client, GrantFailure, OAuth2Error, ResourceOwner, ServerError,
    SocialVerification, TokenSettings, TokenValueGenerator,
};
use oauth2_ports::{DynAccessTokenStore, DynAuthenticator};

use crate::request::{required, TokenRequest};
use crate::tokens::AccessTokenManager;

/// Everything a grant strategy (or a custom override) needs: the token
/// manager, the host's authenticator and the issuance settings.
///
/// Built once at startup and shared by reference between requests.
pub struct GrantContext {
    tokens: AccessTokenManager,
    authenticator: DynAuthenticator,
}

impl GrantContext {
    pub fn new(
        store: DynAccessTokenStore,
        authenticator: DynAuthenticator,
        settings: TokenSettings,
    ) -> Self {
        Self {
            tokens: AccessTokenManager::new(store, settings),
            authenticator,
        }
    }

    pub fn with_generator(
        store: DynAccessTokenStore,
        authenticator: DynAuthenticator,
        settings: TokenSettings,
        generator: Arc<dyn TokenValueGenerator>,
    ) -> Self {
        Self {
            tokens: AccessTokenManager::with_generator(store, settings, generator),
            authenticator,
        }
    }

    pub fn tokens(&self) -> &AccessTokenManager {
        &self.tokens
    }

    pub fn authenticator(&self) -> &DynAuthenticator {
        &self.authenticator
    }

    pub fn settings(&self) -> &TokenSettings {
        self.tokens.settings()
    }

    /// Authenticate the client named by the request's credentials.
    pub async fn authenticate_client(
        &self,
        request: &TokenRequest,
    ) -> Result<Option<Client>, GrantFailure> {
        let client_id = required("client_id", &request.client_id)?;
        Ok(self
            .authenticator
            .authenticate_client(client_id, request.client_secret.as_deref())
            .await?)
    }

    /// Like [`Self::authenticate_client`], failing with `invalid_client` when
    /// the credentials do not match.
    pub async fn require_client(&self, request: &TokenRequest) -> Result<Client, GrantFailure> {
        match self.authenticate_client(request).await? {
            Some(client) => Ok(client),
            None => {
                tracing::warn!(
                    client_id = %request.client_id.as_deref().unwrap_or(""),
                    "client authentication failed"
                );
                Err(OAuth2Error::invalid_client("Client authentication failed").into())
            }
        }
    }

    pub async fn authenticate_resource_owner(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> Result<Option<ResourceOwner>, GrantFailure> {
        let login = required("login", &request.login)?;
        let password = required("password", &request.password)?;
        Ok(self
            .authenticator
            .authenticate_resource_owner(client, login, password)
            .await?)
    }

    pub async fn authenticate_resource_owner_social(
        &self,
        client: &Client,
        request: &TokenRequest,
    ) -> Result<SocialVerification, GrantFailure> {
        let assertion = request.social_assertion()?;
        Ok(self
            .authenticator
            .authenticate_resource_owner_social(client, &assertion)
            .await?)
    }

    pub fn scopes_from(request: &TokenRequest) -> Option<String> {
        parse_scopes(request.scope.as_deref())
    }

    /// Mint a token and expose it as a bearer token.
    pub async fn issue(
        &self,
        client: &Client,
        resource_owner: Option<&ResourceOwner>,
        scopes: Option<String>,
    ) -> Result<BearerToken, ServerError> {
        let token = self
            .tokens
            .create_for(Some(client), resource_owner, scopes)
            .await?;
        Ok(token.to_bearer_token(Utc::now()))
    }
}
