#![allow(dead_code)]

use std::sync::Arc;

use actix_web::web;
use async_trait::async_trait;
use chrono::{Duration, Utc};

use rust_oauth2_grants::actix::Endpoints;
use rust_oauth2_grants::grants::{GrantContext, UnsupportedResponseType};
use rust_oauth2_grants::models::{AccessToken, Client, ResourceOwner, StoreError, TokenSettings};
use rust_oauth2_grants::observability::Metrics;
use rust_oauth2_grants::ports::{AccessTokenStore, DynAccessTokenStore};
use rust_oauth2_grants::storage::memory::MemoryAccessTokenStore;
use oauth2_storage_memory::MemoryDirectory;

/// A minimal contract every `AccessTokenStore` backend must satisfy.
///
/// Keeps backend parity honest (memory, SQLite, Postgres).
pub async fn run_store_contract(
    store: &dyn AccessTokenStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::new("contract-key".into(), "contract-secret".into(), "Contract".into());
    let owner = ResourceOwner::new("owner-1");

    let mut token = AccessToken::new(
        "contract-access".to_string(),
        Some("contract-refresh".to_string()),
        Some(&client),
        Some(&owner),
        Some("read write".to_string()),
        Some(Utc::now() + Duration::seconds(3600)),
    );

    store.insert(&token).await?;

    let fetched = store
        .find_by_token("contract-access")
        .await?
        .ok_or_else(|| std::io::Error::other("token should exist"))?;
    assert_eq!(fetched.id, token.id);
    assert_eq!(fetched.client_id, token.client_id);
    assert_eq!(fetched.resource_owner_id.as_deref(), Some("owner-1"));
    assert_eq!(fetched.scopes.as_deref(), Some("read write"));
    assert!(fetched.expires_at.is_some());
    assert!(!fetched.is_revoked());

    let by_refresh = store
        .find_by_refresh_token("contract-refresh")
        .await?
        .ok_or_else(|| std::io::Error::other("refresh token should resolve"))?;
    assert_eq!(by_refresh.id, token.id);

    // Exact matches only.
    assert!(store.find_by_token("contract-acces").await?.is_none());
    assert!(store.find_by_refresh_token("contract-access").await?.is_none());

    // Both values are unique.
    let same_access = AccessToken::new(
        "contract-access".to_string(),
        None,
        None,
        None,
        None,
        None,
    );
    assert!(matches!(
        store.insert(&same_access).await,
        Err(StoreError::Duplicate(_))
    ));
    let same_refresh = AccessToken::new(
        "contract-other".to_string(),
        Some("contract-refresh".to_string()),
        None,
        None,
        None,
        None,
    );
    assert!(matches!(
        store.insert(&same_refresh).await,
        Err(StoreError::Duplicate(_))
    ));
    assert!(store.find_by_token("contract-other").await?.is_none());

    // Public token without client, owner or expiry.
    let public = AccessToken::new("contract-public".to_string(), None, None, None, None, None);
    store.insert(&public).await?;
    let fetched_public = store
        .find_by_token("contract-public")
        .await?
        .ok_or_else(|| std::io::Error::other("public token should exist"))?;
    assert!(fetched_public.is_public());
    assert_eq!(fetched_public.expires_at, None);
    assert_eq!(fetched_public.refresh_token, None);

    // Update persists revocation.
    token.revoke(None);
    store.update(&token).await?;
    let revoked = store
        .find_by_token("contract-access")
        .await?
        .ok_or_else(|| std::io::Error::other("revoked token should still exist"))?;
    assert!(revoked.is_revoked());

    // Delete removes the record and tolerates a second call.
    store.delete(&token).await?;
    assert!(store.find_by_token("contract-access").await?.is_none());
    assert!(store.find_by_refresh_token("contract-refresh").await?.is_none());
    store.delete(&token).await?;

    store.healthcheck().await?;
    Ok(())
}

pub const LOGIN: &str = "test";
pub const PASSWORD: &str = "12345678";

pub struct Directory {
    pub client: Client,
    pub other_client: Client,
    pub admin_client: Client,
    pub owner: ResourceOwner,
    pub directory: MemoryDirectory,
}

pub fn directory() -> Directory {
    let client = Client::new("app1-key".into(), "app1-secret".into(), "App1".into());
    let other_client = Client::new("app2-key".into(), "app2-secret".into(), "Some".into());
    let admin_client = Client::new("admin-key".into(), "admin-secret".into(), "Admin".into());
    let owner = ResourceOwner::new("user-1");

    let directory = MemoryDirectory::new()
        .with_client(client.clone())
        .with_client(other_client.clone())
        .with_client(admin_client.clone())
        .with_owner(LOGIN, PASSWORD, owner.clone())
        .with_social_identity(
            "facebook",
            "fb-1",
            "test@example.com",
            "fb-token",
            owner.clone(),
        );

    Directory {
        client,
        other_client,
        admin_client,
        owner,
        directory,
    }
}

/// Everything an HTTP test needs to build an `App`.
pub struct Harness {
    pub store: Arc<MemoryAccessTokenStore>,
    pub context: Arc<GrantContext>,
    pub endpoints: web::Data<Endpoints>,
    pub metrics: web::Data<Metrics>,
    pub client: Client,
    pub other_client: Client,
    pub owner: ResourceOwner,
}

pub fn harness(settings: TokenSettings) -> Harness {
    let store = Arc::new(MemoryAccessTokenStore::new());
    harness_with_store(store.clone(), store, settings)
}

pub fn harness_with_store(
    store: Arc<MemoryAccessTokenStore>,
    engine_store: DynAccessTokenStore,
    settings: TokenSettings,
) -> Harness {
    let Directory {
        client,
        other_client,
        owner,
        directory,
        ..
    } = directory();

    let context = Arc::new(GrantContext::new(
        engine_store,
        Arc::new(directory),
        settings,
    ));
    let endpoints = web::Data::new(Endpoints::new(
        context.clone(),
        Arc::new(UnsupportedResponseType),
    ));
    let metrics = web::Data::new(Metrics::new().expect("metrics registry"));

    Harness {
        store,
        context,
        endpoints,
        metrics,
        client,
        other_client,
        owner,
    }
}

/// Store whose every call fails, standing in for an unreachable database.
pub struct BrokenStore;

#[async_trait]
impl AccessTokenStore for BrokenStore {
    async fn insert(&self, _token: &AccessToken) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn find_by_token(&self, _token: &str) -> Result<Option<AccessToken>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn find_by_refresh_token(
        &self,
        _refresh_token: &str,
    ) -> Result<Option<AccessToken>, StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn update(&self, _token: &AccessToken) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn delete(&self, _token: &AccessToken) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".to_string()))
    }
}
