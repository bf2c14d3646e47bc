use std::sync::Arc;

use oauth2_config::Config;
use oauth2_core::StoreError;
use oauth2_grants::GrantContext;
use oauth2_ports::DynAuthenticator;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("invalid token configuration: {0}")]
    Config(String),

    #[error("could not open access token store: {0}")]
    Store(#[from] StoreError),
}

/// Open the configured store and build the shared grant context.
///
/// The authenticator is supplied by the host; client and resource owner
/// records are not managed here.
pub async fn build_context(
    config: &Config,
    authenticator: DynAuthenticator,
) -> Result<Arc<GrantContext>, BootstrapError> {
    let settings = config.token.to_settings().map_err(BootstrapError::Config)?;
    let store = oauth2_storage_factory::create_store(&config.database.url).await?;

    tracing::info!(
        database = %config.sanitized().database.url,
        access_token_lifetime = ?settings.access_token_lifetime.map(|d| d.num_seconds()),
        issue_refresh_token = settings.issue_refresh_token,
        on_refresh = %settings.on_refresh.name(),
        "grant engine configured"
    );

    Ok(Arc::new(GrantContext::new(store, authenticator, settings)))
}
