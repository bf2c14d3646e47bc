//! Framework-agnostic OAuth2 domain types and helpers.
//!
//! Everything the grant engine, the storage adapters and the HTTP layer agree on
//! lives here: the access token record and its lifecycle rules, the bearer token
//! wire shape, the response envelope and the error taxonomy.

pub mod models;

pub use models::*;
