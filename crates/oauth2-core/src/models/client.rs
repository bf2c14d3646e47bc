use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The party an access token is issued to.
///
/// Clients are registered and persisted elsewhere; the engine only reads them
/// and compares identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    /// Public identifier submitted as `client_id`.
    pub key: String,
    #[serde(skip_serializing)]
    pub secret: String,
    pub name: String,
}

impl Client {
    pub fn new(key: String, secret: String, name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            key,
            secret,
            name,
        }
    }
}

impl PartialEq for Client {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Client {}
