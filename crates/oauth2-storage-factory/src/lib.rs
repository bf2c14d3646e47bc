//! Access token store selection.
//!
//! This crate centralizes URL-based backend selection (memory vs SQLx) and wraps
//! the chosen implementation with `ObservedStore` for tracing.

use std::sync::Arc;

use oauth2_core::StoreError;

pub use oauth2_observability::ObservedStore;
pub use oauth2_ports::{AccessTokenStore, DynAccessTokenStore};

pub mod memory {
    pub use oauth2_storage_memory::MemoryAccessTokenStore;
}

pub mod sqlx {
    pub use oauth2_storage_sqlx::SqlxAccessTokenStore;
}

/// Create an access token store based on URL scheme and run its `init`.
///
/// Supported:
/// - `memory` / `memory://` -> in-process store (tokens are lost on restart)
/// - `postgres://...` and `sqlite:...` -> SQLx backend
pub async fn create_store(database_url: &str) -> Result<DynAccessTokenStore, StoreError> {
    let (inner, db_system): (DynAccessTokenStore, &str) =
        if database_url == "memory" || database_url.starts_with("memory://") {
            (Arc::new(memory::MemoryAccessTokenStore::new()), "memory")
        } else {
            let store = sqlx::SqlxAccessTokenStore::new(database_url).await?;
            let db_system = if database_url.starts_with("postgres://")
                || database_url.starts_with("postgresql://")
            {
                "postgresql"
            } else if database_url.starts_with("sqlite:") {
                "sqlite"
            } else {
                "sql"
            };
            (Arc::new(store), db_system)
        };

    let observed = ObservedStore::new(inner, db_system.to_string());
    observed.init().await?;
    Ok(Arc::new(observed))
}
