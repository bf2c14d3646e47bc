use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured logging.
///
/// - Emits JSON logs via `tracing_subscriber`, filtered by `RUST_LOG` (default `info`).
/// - Every event carries the active span stack (grant type, client id, store operation).
/// - Bridges `log` records into `tracing` so `log::info!` etc. end up in the same stream.
///
/// Calling it twice returns an error from the second `try_init`.
pub fn init_telemetry(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
        .try_init()?;

    // Ignore errors if a logger was already set (e.g., tests).
    let _ = tracing_log::LogTracer::init();

    tracing::info!(service = %service_name, "telemetry initialized");
    Ok(())
}
