use chrono::{DateTime, Utc};
use std::sync::Arc;

use oauth2_core::{
    AccessToken, Client, RandomTokenGenerator, ResourceOwner, ServerError, StoreError,
    TokenSettings, TokenTypeHint, TokenValueGenerator,
};
use oauth2_ports::DynAccessTokenStore;

/// How many times a colliding generated value is regenerated before giving up.
pub const MAX_GENERATION_ATTEMPTS: u32 = 5;

fn prefix(token: &str) -> String {
    // Never log full tokens.
    token.chars().take(12).collect::<String>()
}

/// Attributes of a token about to be created. Values left `None` are generated.
#[derive(Debug, Default)]
pub struct NewAccessToken<'a> {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub client: Option<&'a Client>,
    pub resource_owner: Option<&'a ResourceOwner>,
    pub scopes: Option<String>,
}

/// Lifecycle operations on access tokens: creation with unique values,
/// lookup, revocation and destruction.
pub struct AccessTokenManager {
    store: DynAccessTokenStore,
    generator: Arc<dyn TokenValueGenerator>,
    settings: TokenSettings,
}

impl AccessTokenManager {
    pub fn new(store: DynAccessTokenStore, settings: TokenSettings) -> Self {
        Self::with_generator(store, settings, Arc::new(RandomTokenGenerator::default()))
    }

    pub fn with_generator(
        store: DynAccessTokenStore,
        settings: TokenSettings,
        generator: Arc<dyn TokenValueGenerator>,
    ) -> Self {
        Self {
            store,
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    pub fn store(&self) -> &DynAccessTokenStore {
        &self.store
    }

    /// Issue a token to `client` (and optionally a resource owner) with the
    /// configured lifetime and, if enabled, a refresh token.
    pub async fn create_for(
        &self,
        client: Option<&Client>,
        resource_owner: Option<&ResourceOwner>,
        scopes: Option<String>,
    ) -> Result<AccessToken, ServerError> {
        self.create(NewAccessToken {
            client,
            resource_owner,
            scopes,
            ..NewAccessToken::default()
        })
        .await
    }

    /// Persist a new token. Generated values that collide with an existing
    /// record are regenerated; a collision on a caller-supplied value fails.
    pub async fn create(&self, new: NewAccessToken<'_>) -> Result<AccessToken, ServerError> {
        let generates_refresh = new.refresh_token.is_none() && self.settings.issue_refresh_token;
        let generates_any = new.token.is_none() || generates_refresh;

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let value = new
                .token
                .clone()
                .unwrap_or_else(|| self.generator.generate());
            let refresh_token = match &new.refresh_token {
                Some(refresh_token) => Some(refresh_token.clone()),
                None if generates_refresh => Some(self.generator.generate()),
                None => None,
            };

            let mut token = AccessToken::new(
                value,
                refresh_token,
                new.client,
                new.resource_owner,
                new.scopes.clone(),
                None,
            );
            token.expires_at = match self.settings.access_token_lifetime {
                Some(lifetime) => Some(
                    token
                        .created_at
                        .checked_add_signed(lifetime)
                        .ok_or(ServerError::ExpiryOverflow)?,
                ),
                None => None,
            };

            match self.store.insert(&token).await {
                Ok(()) => {
                    tracing::info!(
                        token_prefix = %prefix(&token.token),
                        client_id = %token.client_id.as_deref().unwrap_or(""),
                        resource_owner_id = %token.resource_owner_id.as_deref().unwrap_or(""),
                        has_refresh_token = token.refresh_token.is_some(),
                        "access token created"
                    );
                    return Ok(token);
                }
                Err(StoreError::Duplicate(what)) if generates_any => {
                    tracing::warn!(attempt, column = %what, "generated token collided, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ServerError::TokenGeneration(MAX_GENERATION_ATTEMPTS))
    }

    /// Find a token by its access token value, or by its refresh token when
    /// the hint says so.
    pub async fn authenticate(
        &self,
        value: &str,
        hint: TokenTypeHint,
    ) -> Result<Option<AccessToken>, StoreError> {
        self.store.find(value, hint).await
    }

    /// Revoke and persist. `at` defaults to now; an already revoked token keeps
    /// its original timestamp unless `at` is given.
    pub async fn revoke(
        &self,
        token: &mut AccessToken,
        at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        if token.revoke(at) {
            self.store.update(token).await?;
            tracing::info!(token_prefix = %prefix(&token.token), "access token revoked");
        }
        Ok(())
    }

    pub async fn update(&self, token: &AccessToken) -> Result<(), StoreError> {
        self.store.update(token).await
    }

    pub async fn destroy(&self, token: &AccessToken) -> Result<(), StoreError> {
        self.store.delete(token).await?;
        tracing::info!(token_prefix = %prefix(&token.token), "access token destroyed");
        Ok(())
    }
}
