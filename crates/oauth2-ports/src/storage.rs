use async_trait::async_trait;
use std::sync::Arc;

use oauth2_core::{AccessToken, StoreError, TokenTypeHint};

/// Persistence for access tokens.
///
/// `insert` must check uniqueness of `token` and `refresh_token` and write the
/// record as one atomic step, reporting a collision as `StoreError::Duplicate`.
#[async_trait]
pub trait AccessTokenStore: Send + Sync {
    /// Initialize the backing store (e.g., bootstrap schema / create indexes).
    async fn init(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert(&self, token: &AccessToken) -> Result<(), StoreError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<AccessToken>, StoreError>;

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<AccessToken>, StoreError>;

    /// Overwrite the record identified by `token.id`.
    async fn update(&self, token: &AccessToken) -> Result<(), StoreError>;

    /// Remove the record identified by `token.id`. Deleting a missing record is not an error.
    async fn delete(&self, token: &AccessToken) -> Result<(), StoreError>;

    /// Lookup by whichever value the hint names.
    async fn find(
        &self,
        value: &str,
        hint: TokenTypeHint,
    ) -> Result<Option<AccessToken>, StoreError> {
        match hint {
            TokenTypeHint::AccessToken => self.find_by_token(value).await,
            TokenTypeHint::RefreshToken => self.find_by_refresh_token(value).await,
        }
    }

    /// Lightweight liveness/readiness check.
    async fn healthcheck(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub type DynAccessTokenStore = Arc<dyn AccessTokenStore>;
