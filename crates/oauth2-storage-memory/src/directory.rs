use async_trait::async_trait;
use std::collections::HashMap;
use subtle::ConstantTimeEq;

use oauth2_core::{AuthenticatorError, Client, ResourceOwner, SocialAssertion, SocialVerification};
use oauth2_ports::Authenticator;

struct Account {
    password: String,
    owner: ResourceOwner,
}

struct SocialIdentity {
    email: String,
    social_access_token: String,
    owner: ResourceOwner,
}

/// Fixed set of clients and resource owners answering the `Authenticator` contract.
#[derive(Default)]
pub struct MemoryDirectory {
    clients: HashMap<String, Client>,
    accounts: HashMap<String, Account>,
    social: HashMap<(String, String), SocialIdentity>,
}

fn secrets_match(expected: &str, presented: &str) -> bool {
    // Use constant-time comparison to prevent timing attacks
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.clients.insert(client.key.clone(), client);
        self
    }

    pub fn with_owner(mut self, login: &str, password: &str, owner: ResourceOwner) -> Self {
        self.accounts.insert(
            login.to_string(),
            Account {
                password: password.to_string(),
                owner,
            },
        );
        self
    }

    pub fn with_social_identity(
        mut self,
        provider: &str,
        uid: &str,
        email: &str,
        social_access_token: &str,
        owner: ResourceOwner,
    ) -> Self {
        self.social.insert(
            (provider.to_string(), uid.to_string()),
            SocialIdentity {
                email: email.to_string(),
                social_access_token: social_access_token.to_string(),
                owner,
            },
        );
        self
    }

    pub fn client(&self, key: &str) -> Option<&Client> {
        self.clients.get(key)
    }
}

#[async_trait]
impl Authenticator for MemoryDirectory {
    async fn authenticate_client(
        &self,
        client_key: &str,
        client_secret: Option<&str>,
    ) -> Result<Option<Client>, AuthenticatorError> {
        let (Some(client), Some(secret)) = (self.clients.get(client_key), client_secret) else {
            return Ok(None);
        };

        if secrets_match(&client.secret, secret) {
            Ok(Some(client.clone()))
        } else {
            tracing::debug!(client_key = %client_key, "client secret mismatch");
            Ok(None)
        }
    }

    async fn authenticate_resource_owner(
        &self,
        _client: &Client,
        login: &str,
        password: &str,
    ) -> Result<Option<ResourceOwner>, AuthenticatorError> {
        Ok(self
            .accounts
            .get(login)
            .filter(|account| secrets_match(&account.password, password))
            .map(|account| account.owner.clone()))
    }

    async fn authenticate_resource_owner_social(
        &self,
        _client: &Client,
        assertion: &SocialAssertion,
    ) -> Result<SocialVerification, AuthenticatorError> {
        let key = (assertion.provider.clone(), assertion.uid.clone());
        let Some(identity) = self.social.get(&key) else {
            return Ok(SocialVerification::Rejected { message: None });
        };

        if !secrets_match(&identity.social_access_token, &assertion.social_access_token) {
            return Ok(SocialVerification::Rejected {
                message: Some(format!(
                    "{} access token could not be verified",
                    assertion.provider
                )),
            });
        }

        if !identity.email.eq_ignore_ascii_case(&assertion.email) {
            return Ok(SocialVerification::Rejected {
                message: Some("Email does not match the social identity".to_string()),
            });
        }

        Ok(SocialVerification::Verified(identity.owner.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> (MemoryDirectory, Client) {
        let client = Client::new("app1-key".into(), "app1-secret".into(), "App1".into());
        let directory = MemoryDirectory::new()
            .with_client(client.clone())
            .with_owner("test", "12345678", ResourceOwner::new("user-1"))
            .with_social_identity(
                "facebook",
                "fb-1",
                "test@example.com",
                "fb-token",
                ResourceOwner::new("user-1"),
            );
        (directory, client)
    }

    #[tokio::test]
    async fn authenticates_client_by_key_and_secret() {
        let (directory, client) = directory();

        let found = directory
            .authenticate_client("app1-key", Some("app1-secret"))
            .await
            .unwrap();
        assert_eq!(found, Some(client));

        assert!(directory
            .authenticate_client("app1-key", Some("wrong"))
            .await
            .unwrap()
            .is_none());
        assert!(directory
            .authenticate_client("app1-key", None)
            .await
            .unwrap()
            .is_none());
        assert!(directory
            .authenticate_client("blah-blah", Some("app1-secret"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn authenticates_owner_by_password() {
        let (directory, client) = directory();

        let owner = directory
            .authenticate_resource_owner(&client, "test", "12345678")
            .await
            .unwrap();
        assert_eq!(owner, Some(ResourceOwner::new("user-1")));

        assert!(directory
            .authenticate_resource_owner(&client, "test", "invalid")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn verifies_social_assertions() {
        let (directory, client) = directory();
        let mut assertion = SocialAssertion {
            email: "test@example.com".into(),
            provider: "facebook".into(),
            uid: "fb-1".into(),
            social_access_token: "fb-token".into(),
        };

        assert_eq!(
            directory
                .authenticate_resource_owner_social(&client, &assertion)
                .await
                .unwrap(),
            SocialVerification::Verified(ResourceOwner::new("user-1"))
        );

        assertion.social_access_token = "forged".into();
        assert!(matches!(
            directory
                .authenticate_resource_owner_social(&client, &assertion)
                .await
                .unwrap(),
            SocialVerification::Rejected { message: Some(_) }
        ));

        assertion.uid = "unknown".into();
        assert_eq!(
            directory
                .authenticate_resource_owner_social(&client, &assertion)
                .await
                .unwrap(),
            SocialVerification::Rejected { message: None }
        );
    }
}
