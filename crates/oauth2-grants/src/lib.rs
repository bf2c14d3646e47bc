//! Grant-processing engine for an OAuth2 authorization server.
//!
//! A normalized [`TokenRequest`] goes to the [`GrantDispatcher`], which picks
//! the strategy for its grant type, lets it authenticate the client and the
//! resource owner through the host's [`oauth2_ports::Authenticator`], mints or
//! rotates an access token through the [`AccessTokenManager`] and renders an
//! [`oauth2_core::OAuthResponse`]. Typed request failures become OAuth2 error
//! envelopes; collaborator faults come back as [`oauth2_core::ServerError`].

pub mod authorization;
pub mod context;
pub mod dispatcher;
pub mod request;
pub mod revocation;
pub mod strategies;
pub mod tokens;

pub use authorization::*;
pub use context::GrantContext;
pub use dispatcher::*;
pub use request::*;
pub use revocation::RevocationEndpoint;
pub use strategies::{GrantStrategy, GrantType};
pub use tokens::{AccessTokenManager, NewAccessToken, MAX_GENERATION_ATTEMPTS};

#[cfg(test)]
pub(crate) mod test_support;
