//! In-process adapters for the OAuth2 grant engine.
//!
//! Useful for embedding, local development and tests. State lives behind a
//! mutex and is lost on restart.

mod directory;
mod store;

pub use directory::MemoryDirectory;
pub use store::MemoryAccessTokenStore;
