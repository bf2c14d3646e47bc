use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use oauth2_core::{AccessToken, StoreError};
use oauth2_ports::AccessTokenStore;

/// Access tokens keyed by record id.
#[derive(Default)]
pub struct MemoryAccessTokenStore {
    tokens: Mutex<HashMap<String, AccessToken>>,
}

impl MemoryAccessTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, AccessToken>> {
        self.tokens.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of every record, oldest first.
    pub fn all(&self) -> Vec<AccessToken> {
        let mut tokens: Vec<AccessToken> = self.lock().values().cloned().collect();
        tokens.sort_by_key(|t| t.created_at);
        tokens
    }

    fn check_unique(
        tokens: &HashMap<String, AccessToken>,
        candidate: &AccessToken,
    ) -> Result<(), StoreError> {
        for existing in tokens.values().filter(|t| t.id != candidate.id) {
            if existing.token == candidate.token {
                return Err(StoreError::Duplicate("token".to_string()));
            }
            if candidate.refresh_token.is_some() && existing.refresh_token == candidate.refresh_token
            {
                return Err(StoreError::Duplicate("refresh_token".to_string()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AccessTokenStore for MemoryAccessTokenStore {
    async fn insert(&self, token: &AccessToken) -> Result<(), StoreError> {
        let mut tokens = self.lock();
        if tokens.contains_key(&token.id) {
            return Err(StoreError::Duplicate("id".to_string()));
        }
        Self::check_unique(&tokens, token)?;
        tokens.insert(token.id.clone(), token.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<AccessToken>, StoreError> {
        Ok(self.lock().values().find(|t| t.token == token).cloned())
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<AccessToken>, StoreError> {
        Ok(self
            .lock()
            .values()
            .find(|t| t.refresh_token.as_deref() == Some(refresh_token))
            .cloned())
    }

    async fn update(&self, token: &AccessToken) -> Result<(), StoreError> {
        let mut tokens = self.lock();
        if !tokens.contains_key(&token.id) {
            return Err(StoreError::Backend(format!(
                "access token {} does not exist",
                token.id
            )));
        }
        Self::check_unique(&tokens, token)?;
        tokens.insert(token.id.clone(), token.clone());
        Ok(())
    }

    async fn delete(&self, token: &AccessToken) -> Result<(), StoreError> {
        self.lock().remove(&token.id);
        Ok(())
    }
}
