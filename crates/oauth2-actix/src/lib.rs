//! Actix-web HTTP surface for the OAuth2 grant engine.
//!
//! This crate only contains framework-specific code. The engine lives in
//! `oauth2-grants`; handlers decode parameters, call it, and copy the
//! resulting envelope onto an `HttpResponse`.

pub mod handlers;

pub use handlers::{configure, Endpoints};
