use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use oauth2_core::{Client, ResourceOwner, SocialAssertion, TokenSettings, TokenValueGenerator};
use oauth2_storage_memory::{MemoryAccessTokenStore, MemoryDirectory};

use crate::{AccessTokenManager, GrantContext, TokenRequest};

pub(crate) struct Fixture {
    pub store: Arc<MemoryAccessTokenStore>,
    pub context: Arc<GrantContext>,
    pub client: Client,
    pub other_client: Client,
    pub admin_client: Client,
    pub owner: ResourceOwner,
}

impl Fixture {
    pub fn tokens(&self) -> &AccessTokenManager {
        self.context.tokens()
    }

    pub fn password_request(&self) -> TokenRequest {
        TokenRequest::new("password")
            .with_client("app1-key", "app1-secret")
            .with_password("test", "12345678")
    }

    pub fn refresh_request(&self, refresh_token: &str) -> TokenRequest {
        TokenRequest::new("refresh_token")
            .with_client("app1-key", "app1-secret")
            .with_refresh_token(refresh_token)
    }
}

pub(crate) fn social_assertion() -> SocialAssertion {
    SocialAssertion {
        email: "test@example.com".to_string(),
        provider: "facebook".to_string(),
        uid: "fb-1".to_string(),
        social_access_token: "fb-token".to_string(),
    }
}

pub(crate) fn fixture(settings: TokenSettings) -> Fixture {
    let client = Client::new("app1-key".into(), "app1-secret".into(), "App1".into());
    let other_client = Client::new("app2-key".into(), "app2-secret".into(), "Some".into());
    let admin_client = Client::new("admin-key".into(), "admin-secret".into(), "Admin".into());
    let owner = ResourceOwner::new("user-1");
    let assertion = social_assertion();

    let directory = MemoryDirectory::new()
        .with_client(client.clone())
        .with_client(other_client.clone())
        .with_client(admin_client.clone())
        .with_owner("test", "12345678", owner.clone())
        .with_social_identity(
            &assertion.provider,
            &assertion.uid,
            &assertion.email,
            &assertion.social_access_token,
            owner.clone(),
        );

    let store = Arc::new(MemoryAccessTokenStore::new());
    let context = Arc::new(GrantContext::new(
        store.clone(),
        Arc::new(directory),
        settings,
    ));

    Fixture {
        store,
        context,
        client,
        other_client,
        admin_client,
        owner,
    }
}

/// Hands out the scripted values in order, then repeats the last one.
pub(crate) struct ScriptedGenerator {
    values: Mutex<VecDeque<String>>,
}

impl ScriptedGenerator {
    pub fn new(values: &[&str]) -> Self {
        Self {
            values: Mutex::new(values.iter().map(|v| v.to_string()).collect()),
        }
    }
}

impl TokenValueGenerator for ScriptedGenerator {
    fn generate(&self) -> String {
        let mut values = self.values.lock().unwrap();
        if values.len() > 1 {
            values.pop_front().unwrap()
        } else {
            values.front().cloned().unwrap_or_default()
        }
    }
}
