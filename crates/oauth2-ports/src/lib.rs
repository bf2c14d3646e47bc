//! Integration ports for the OAuth2 grant engine.
//!
//! Implement these traits in your own crate to plug in custom persistence or
//! credential verification without forking.

pub mod authenticator;
pub mod storage;

pub use authenticator::*;
pub use storage::*;
