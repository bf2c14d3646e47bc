use serde::{Deserialize, Serialize};

/// Opaque principal resolved by an external authenticator.
///
/// The engine never looks inside; it only keeps the reference so tokens can be
/// associated with the owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceOwner {
    pub id: String,
}

impl ResourceOwner {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// A social-identity assertion presented with the `social_login` grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialAssertion {
    pub email: String,
    pub provider: String,
    pub uid: String,
    pub social_access_token: String,
}

/// Structured verdict of a social-identity verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocialVerification {
    Verified(ResourceOwner),
    /// The verifier refused the assertion, optionally explaining why.
    Rejected { message: Option<String> },
}
