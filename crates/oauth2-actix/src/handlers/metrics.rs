use actix_web::{web, HttpResponse};

use oauth2_observability::{encode_prometheus_text, Metrics};

/// Prometheus text exposition of the shared registry.
pub async fn metrics(metrics: web::Data<Metrics>) -> HttpResponse {
    match encode_prometheus_text(&metrics.registry) {
        Ok(buffer) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(buffer),
        Err(err) => {
            tracing::error!(error = %err, "failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}
