use async_trait::async_trait;
use std::sync::Arc;

use oauth2_core::{AuthenticatorError, Client, ResourceOwner, SocialAssertion, SocialVerification};

/// Verification of clients and resource owners, supplied by the host application.
///
/// Implementations have no side effects beyond verification and may be called
/// any number of times. Wrong credentials are an absent (or rejected) result;
/// `Err` is reserved for the verifier itself failing.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Look up a client by its public key and check the secret.
    async fn authenticate_client(
        &self,
        client_key: &str,
        client_secret: Option<&str>,
    ) -> Result<Option<Client>, AuthenticatorError>;

    async fn authenticate_resource_owner(
        &self,
        client: &Client,
        login: &str,
        password: &str,
    ) -> Result<Option<ResourceOwner>, AuthenticatorError>;

    async fn authenticate_resource_owner_social(
        &self,
        client: &Client,
        assertion: &SocialAssertion,
    ) -> Result<SocialVerification, AuthenticatorError>;
}

pub type DynAuthenticator = Arc<dyn Authenticator>;
