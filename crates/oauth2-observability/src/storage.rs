use async_trait::async_trait;
use tracing::Instrument;

use oauth2_core::{AccessToken, StoreError};
use oauth2_ports::{AccessTokenStore, DynAccessTokenStore};

/// A thin wrapper around a `DynAccessTokenStore` that creates a tracing span for each store call.
///
/// This lets grant spans extend naturally down into persistence calls.
pub struct ObservedStore {
    inner: DynAccessTokenStore,
    db_system: String,
}

impl ObservedStore {
    pub fn new(inner: DynAccessTokenStore, db_system: String) -> Self {
        Self { inner, db_system }
    }

    pub fn db_system(&self) -> &str {
        &self.db_system
    }

    fn span(&self, operation: &'static str) -> tracing::Span {
        tracing::info_span!("db", db_system = %self.db_system, db_operation = operation)
    }

    fn token_prefix(token: &str) -> String {
        token.chars().take(12).collect::<String>()
    }

    fn record_span(&self, operation: &'static str, token: &AccessToken) -> tracing::Span {
        // Never log full tokens.
        tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = operation,
            token_prefix = %Self::token_prefix(&token.token),
            client_id = %token.client_id.as_deref().unwrap_or(""),
            resource_owner_id = %token.resource_owner_id.as_deref().unwrap_or(""),
            revoked = token.is_revoked()
        )
    }

    fn lookup_span(&self, operation: &'static str, value: &str) -> tracing::Span {
        tracing::info_span!(
            "db",
            db_system = %self.db_system,
            db_operation = operation,
            token_prefix = %Self::token_prefix(value),
            token_len = value.len()
        )
    }
}

fn logged<T>(result: Result<T, StoreError>) -> Result<T, StoreError> {
    if let Err(err) = &result {
        match err {
            StoreError::Duplicate(what) => tracing::debug!(column = %what, "unique violation"),
            StoreError::Backend(message) => tracing::error!(error = %message, "store failure"),
        }
    }
    result
}

#[async_trait]
impl AccessTokenStore for ObservedStore {
    async fn init(&self) -> Result<(), StoreError> {
        let span = self.span("init");
        async move { logged(self.inner.init().await) }
            .instrument(span)
            .await
    }

    async fn insert(&self, token: &AccessToken) -> Result<(), StoreError> {
        let span = self.record_span("insert", token);
        async move { logged(self.inner.insert(token).await) }
            .instrument(span)
            .await
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<AccessToken>, StoreError> {
        let span = self.lookup_span("find_by_token", token);
        async move { logged(self.inner.find_by_token(token).await) }
            .instrument(span)
            .await
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<AccessToken>, StoreError> {
        let span = self.lookup_span("find_by_refresh_token", refresh_token);
        async move { logged(self.inner.find_by_refresh_token(refresh_token).await) }
            .instrument(span)
            .await
    }

    async fn update(&self, token: &AccessToken) -> Result<(), StoreError> {
        let span = self.record_span("update", token);
        async move { logged(self.inner.update(token).await) }
            .instrument(span)
            .await
    }

    async fn delete(&self, token: &AccessToken) -> Result<(), StoreError> {
        let span = self.record_span("delete", token);
        async move { logged(self.inner.delete(token).await) }
            .instrument(span)
            .await
    }

    async fn healthcheck(&self) -> Result<(), StoreError> {
        let span = self.span("healthcheck");
        async move { logged(self.inner.healthcheck().await) }
            .instrument(span)
            .await
    }
}
