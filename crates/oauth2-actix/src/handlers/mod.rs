use actix_web::web;
use std::sync::Arc;

use oauth2_grants::{
    AuthorizationDispatcher, AuthorizationHandler, GrantContext, GrantDispatcher,
    RevocationEndpoint,
};

pub mod metrics;
pub mod oauth;

/// Engine entry points shared by the handlers as `web::Data<Endpoints>`.
pub struct Endpoints {
    pub grants: GrantDispatcher,
    pub revocation: RevocationEndpoint,
    pub authorization: AuthorizationDispatcher,
}

impl Endpoints {
    pub fn new(context: Arc<GrantContext>, authorization: Arc<dyn AuthorizationHandler>) -> Self {
        Self {
            grants: GrantDispatcher::new(context.clone()),
            revocation: RevocationEndpoint::new(context.clone()),
            authorization: AuthorizationDispatcher::new(context, authorization),
        }
    }

    pub fn context(&self) -> &Arc<GrantContext> {
        self.grants.context()
    }
}

/// Register the OAuth routes and `/metrics`.
///
/// Expects `web::Data<Endpoints>` and `web::Data<Metrics>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/oauth")
            .route("/token", web::post().to(oauth::token))
            .route("/revoke", web::post().to(oauth::revoke))
            .route("/authorize", web::get().to(oauth::authorize))
            .route("/authorize", web::post().to(oauth::authorize)),
    )
    .route("/metrics", web::get().to(metrics::metrics));
}
