mod common;

use rust_oauth2_grants::storage::{create_store, memory::MemoryAccessTokenStore, sqlx::SqlxAccessTokenStore};
use rust_oauth2_grants::ports::AccessTokenStore;

#[tokio::test]
async fn memory_store_satisfies_contract() {
    let store = MemoryAccessTokenStore::new();
    common::run_store_contract(&store).await.unwrap();
}

#[tokio::test]
async fn sqlite_store_satisfies_contract() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("contract.db").display());

    let store = SqlxAccessTokenStore::new(&url).await.unwrap();
    store.init().await.unwrap();
    common::run_store_contract(&store).await.unwrap();
}

#[tokio::test]
async fn factory_stores_satisfy_contract() {
    let memory = create_store("memory://").await.unwrap();
    common::run_store_contract(memory.as_ref()).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("factory.db").display());
    let sqlite = create_store(&url).await.unwrap();
    common::run_store_contract(sqlite.as_ref()).await.unwrap();
}

#[tokio::test]
async fn sqlite_tokens_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("reopen.db").display());

    {
        let store = create_store(&url).await.unwrap();
        let token = rust_oauth2_grants::models::AccessToken::new(
            "persisted".to_string(),
            Some("persisted-refresh".to_string()),
            None,
            None,
            None,
            None,
        );
        store.insert(&token).await.unwrap();
    }

    let reopened = create_store(&url).await.unwrap();
    let found = reopened.find_by_refresh_token("persisted-refresh").await.unwrap();
    assert_eq!(found.map(|t| t.token), Some("persisted".to_string()));
}
