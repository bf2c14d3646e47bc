use async_trait::async_trait;
use chrono::Utc;

use oauth2_core::{
    AccessToken, BearerToken, GrantFailure, OAuth2Error, OnRefresh, StoreError, TokenTypeHint,
};

use super::GrantStrategy;
use crate::context::GrantContext;
use crate::request::{required, TokenRequest};
use crate::tokens::AccessTokenManager;

/// Refresh token grant (RFC 6749 §6).
///
/// An expired old token may still be refreshed. The configured
/// [`OnRefresh`] policy runs against the old token once the new one is stored.
pub struct RefreshTokenStrategy;

#[async_trait]
impl GrantStrategy for RefreshTokenStrategy {
    async fn process(
        &self,
        context: &GrantContext,
        request: &TokenRequest,
    ) -> Result<BearerToken, GrantFailure> {
        let client = context.require_client(request).await?;
        let refresh_token = required("refresh_token", &request.refresh_token)?;

        let old = context
            .tokens()
            .authenticate(refresh_token, TokenTypeHint::RefreshToken)
            .await?
            .ok_or_else(|| OAuth2Error::invalid_grant("Refresh token not found"))?;

        if !old.belongs_to(&client) {
            tracing::warn!(
                client_id = %client.id,
                token_client_id = %old.client_id.as_deref().unwrap_or(""),
                "refresh token presented by a client that does not own it"
            );
            return Err(OAuth2Error::unauthorized_client(
                "Refresh token was issued to another client",
            )
            .into());
        }

        if old.is_revoked() {
            return Err(OAuth2Error::invalid_grant("Refresh token has been revoked").into());
        }

        let scopes = GrantContext::scopes_from(request).or_else(|| old.scopes.clone());
        let resource_owner = old.resource_owner();
        let new = context
            .tokens()
            .create_for(Some(&client), resource_owner.as_ref(), scopes)
            .await?;

        if let Err(err) = apply_on_refresh(context.tokens(), old).await {
            tracing::warn!(
                policy = %context.settings().on_refresh.name(),
                error = %err,
                "on-refresh action failed, new token stays issued"
            );
        }

        Ok(new.to_bearer_token(Utc::now()))
    }
}

async fn apply_on_refresh(
    tokens: &AccessTokenManager,
    mut old: AccessToken,
) -> Result<(), StoreError> {
    match &tokens.settings().on_refresh {
        OnRefresh::Nothing => Ok(()),
        OnRefresh::Revoke => tokens.revoke(&mut old, None).await,
        OnRefresh::Destroy => tokens.destroy(&old).await,
        OnRefresh::Custom(action) => {
            action(&mut old);
            tokens.update(&old).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, Fixture};
    use chrono::Duration;
    use oauth2_core::{ErrorCode, TokenSettings};
    use oauth2_ports::AccessTokenStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn settings(on_refresh: OnRefresh) -> TokenSettings {
        TokenSettings::default()
            .with_refresh_tokens(true)
            .with_on_refresh(on_refresh)
    }

    async fn seed(f: &Fixture) -> AccessToken {
        f.tokens()
            .create_for(Some(&f.client), Some(&f.owner), Some("read write".to_string()))
            .await
            .unwrap()
    }

    fn error_code(err: GrantFailure) -> ErrorCode {
        match err {
            GrantFailure::Request(err) => err.error,
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[tokio::test]
    async fn issues_new_token_with_old_scopes() {
        let f = fixture(settings(OnRefresh::Nothing));
        let old = seed(&f).await;

        let bearer = RefreshTokenStrategy
            .process(&f.context, &f.refresh_request(old.refresh_token.as_deref().unwrap()))
            .await
            .unwrap();

        assert_ne!(bearer.access_token, old.token);
        assert_eq!(bearer.scope.as_deref(), Some("read write"));
        assert!(bearer.refresh_token.is_some());

        let new = f.store.find_by_token(&bearer.access_token).await.unwrap().unwrap();
        assert!(new.belongs_to(&f.client));
        assert_eq!(new.resource_owner(), Some(f.owner.clone()));

        // Nothing policy leaves the old record untouched.
        let stored = f.store.find_by_token(&old.token).await.unwrap().unwrap();
        assert_eq!(stored, old);
    }

    #[tokio::test]
    async fn request_scope_overrides_old_scopes() {
        let f = fixture(settings(OnRefresh::Nothing));
        let old = seed(&f).await;

        let request = f
            .refresh_request(old.refresh_token.as_deref().unwrap())
            .with_scope("read");
        let bearer = RefreshTokenStrategy.process(&f.context, &request).await.unwrap();

        assert_eq!(bearer.scope.as_deref(), Some("read"));
    }

    #[tokio::test]
    async fn unknown_refresh_token_is_invalid_grant() {
        let f = fixture(settings(OnRefresh::Nothing));

        let err = RefreshTokenStrategy
            .process(&f.context, &f.refresh_request("nope"))
            .await
            .unwrap_err();

        assert_eq!(error_code(err), ErrorCode::InvalidGrant);
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn token_of_another_client_is_unauthorized_client() {
        let f = fixture(settings(OnRefresh::Revoke));
        let old = f
            .tokens()
            .create_for(Some(&f.other_client), Some(&f.owner), None)
            .await
            .unwrap();

        let err = RefreshTokenStrategy
            .process(&f.context, &f.refresh_request(old.refresh_token.as_deref().unwrap()))
            .await
            .unwrap_err();

        assert_eq!(error_code(err), ErrorCode::UnauthorizedClient);
        assert_eq!(f.store.len(), 1);
        let stored = f.store.find_by_token(&old.token).await.unwrap().unwrap();
        assert!(!stored.is_revoked());
    }

    #[tokio::test]
    async fn bad_client_credentials_are_invalid_client() {
        let f = fixture(settings(OnRefresh::Nothing));
        let old = seed(&f).await;
        let request = TokenRequest::new("refresh_token")
            .with_client("app1-key", "wrong")
            .with_refresh_token(old.refresh_token.as_deref().unwrap());

        let err = RefreshTokenStrategy.process(&f.context, &request).await.unwrap_err();

        assert_eq!(error_code(err), ErrorCode::InvalidClient);
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn expired_old_token_still_refreshes() {
        let f = fixture(settings(OnRefresh::Nothing));
        let mut old = seed(&f).await;
        old.expires_at = Some(Utc::now() - Duration::seconds(60));
        f.store.update(&old).await.unwrap();

        let bearer = RefreshTokenStrategy
            .process(&f.context, &f.refresh_request(old.refresh_token.as_deref().unwrap()))
            .await
            .unwrap();

        assert_eq!(bearer.expires_in, Some(7200));
    }

    #[tokio::test]
    async fn revoked_old_token_is_invalid_grant() {
        let f = fixture(settings(OnRefresh::Nothing));
        let mut old = seed(&f).await;
        f.tokens().revoke(&mut old, None).await.unwrap();

        let err = RefreshTokenStrategy
            .process(&f.context, &f.refresh_request(old.refresh_token.as_deref().unwrap()))
            .await
            .unwrap_err();

        assert_eq!(error_code(err), ErrorCode::InvalidGrant);
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn revoke_policy_revokes_old_token() {
        let f = fixture(settings(OnRefresh::Revoke));
        let old = seed(&f).await;

        RefreshTokenStrategy
            .process(&f.context, &f.refresh_request(old.refresh_token.as_deref().unwrap()))
            .await
            .unwrap();

        let stored = f.store.find_by_token(&old.token).await.unwrap().unwrap();
        assert!(stored.is_revoked());
        assert_eq!(f.store.len(), 2);
    }

    #[tokio::test]
    async fn destroy_policy_removes_old_token() {
        let f = fixture(settings(OnRefresh::Destroy));
        let old = seed(&f).await;

        RefreshTokenStrategy
            .process(&f.context, &f.refresh_request(old.refresh_token.as_deref().unwrap()))
            .await
            .unwrap();

        assert!(f.store.find_by_token(&old.token).await.unwrap().is_none());
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn custom_policy_runs_once_and_is_persisted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let f = fixture(settings(OnRefresh::custom(move |token| {
            seen.fetch_add(1, Ordering::SeqCst);
            token.scopes = Some("retired".to_string());
        })));
        let old = seed(&f).await;

        RefreshTokenStrategy
            .process(&f.context, &f.refresh_request(old.refresh_token.as_deref().unwrap()))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stored = f.store.find_by_token(&old.token).await.unwrap().unwrap();
        assert_eq!(stored.scopes.as_deref(), Some("retired"));
    }

    #[tokio::test]
    async fn policy_does_not_run_when_refresh_fails() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let f = fixture(settings(OnRefresh::custom(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        })));
        let old = f
            .tokens()
            .create_for(Some(&f.other_client), None, None)
            .await
            .unwrap();

        let result = RefreshTokenStrategy
            .process(&f.context, &f.refresh_request(old.refresh_token.as_deref().unwrap()))
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_policy_keeps_new_token_issued() {
        let f = fixture(settings(OnRefresh::custom(|token| {
            // Point at a record that does not exist so the update fails.
            token.id = "missing".to_string();
        })));
        let old = seed(&f).await;

        let bearer = RefreshTokenStrategy
            .process(&f.context, &f.refresh_request(old.refresh_token.as_deref().unwrap()))
            .await
            .unwrap();

        assert!(f
            .store
            .find_by_token(&bearer.access_token)
            .await
            .unwrap()
            .is_some());
    }
}
