//! Library exports.
//!
//! The engine is split into workspace crates; this crate re-exports them under
//! one roof and assembles a ready-to-serve [`GrantContext`] from configuration.
//!
//! ```no_run
//! # async fn run(authenticator: rust_oauth2_grants::ports::DynAuthenticator) -> Result<(), Box<dyn std::error::Error>> {
//! use actix_web::{web, App, HttpServer};
//! use rust_oauth2_grants::{actix, bootstrap, config::Config, grants, observability};
//! use rust_oauth2_grants::observability::{actix::MetricsMiddleware, Metrics};
//! use std::sync::Arc;
//!
//! observability::init_telemetry("oauth2-grants")?;
//! let config = Config::load()?;
//! let context = bootstrap::build_context(&config, authenticator).await?;
//! let endpoints = web::Data::new(actix::Endpoints::new(
//!     context,
//!     Arc::new(grants::UnsupportedResponseType),
//! ));
//! let metrics = Metrics::new()?;
//!
//! HttpServer::new(move || {
//!     App::new()
//!         .wrap(MetricsMiddleware::new(metrics.clone()))
//!         .app_data(web::Data::new(metrics.clone()))
//!         .app_data(endpoints.clone())
//!         .configure(actix::configure)
//! })
//! .bind((config.server.host.as_str(), config.server.port))?
//! .run()
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;

pub use oauth2_actix as actix;
pub use oauth2_config as config;
pub use oauth2_core as models;
pub use oauth2_grants as grants;
pub use oauth2_observability as observability;
pub use oauth2_ports as ports;
pub use oauth2_storage_factory as storage;

pub use bootstrap::{build_context, BootstrapError};
pub use oauth2_grants::GrantContext;
