use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
};

use oauth2_core::OAuthResponse;

/// Prometheus collectors for the HTTP surface and the grant engine.
///
/// Cloning is cheap; every clone reports into the same registry.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_total_by_route: IntCounterVec,
    pub http_request_duration_seconds_by_route: HistogramVec,
    pub oauth_tokens_issued_total: IntCounterVec,
    pub oauth_grant_failures_total: IntCounterVec,
    pub oauth_token_revocations_total: IntCounter,
    pub oauth_server_faults_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total number of HTTP requests")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ))?;
        let http_requests_total_by_route = IntCounterVec::new(
            Opts::new(
                "http_requests_total_by_route",
                "HTTP requests by method, route and status",
            ),
            &["method", "route", "status"],
        )?;
        let http_request_duration_seconds_by_route = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds_by_route",
                "HTTP request duration by method, route and status",
            ),
            &["method", "route", "status"],
        )?;
        let oauth_tokens_issued_total = IntCounterVec::new(
            Opts::new("oauth_tokens_issued_total", "Access tokens issued by grant type"),
            &["grant_type"],
        )?;
        let oauth_grant_failures_total = IntCounterVec::new(
            Opts::new(
                "oauth_grant_failures_total",
                "Rejected grant requests by grant type and error code",
            ),
            &["grant_type", "error"],
        )?;
        let oauth_token_revocations_total = IntCounter::new(
            "oauth_token_revocations_total",
            "Token revocation requests answered",
        )?;
        let oauth_server_faults_total = IntCounterVec::new(
            Opts::new(
                "oauth_server_faults_total",
                "Collaborator faults surfaced as server errors",
            ),
            &["endpoint"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_total_by_route.clone()))?;
        registry.register(Box::new(http_request_duration_seconds_by_route.clone()))?;
        registry.register(Box::new(oauth_tokens_issued_total.clone()))?;
        registry.register(Box::new(oauth_grant_failures_total.clone()))?;
        registry.register(Box::new(oauth_token_revocations_total.clone()))?;
        registry.register(Box::new(oauth_server_faults_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_total_by_route,
            http_request_duration_seconds_by_route,
            oauth_tokens_issued_total,
            oauth_grant_failures_total,
            oauth_token_revocations_total,
            oauth_server_faults_total,
        })
    }

    /// Count a token endpoint answer: issued on success, otherwise by error code.
    pub fn record_grant(&self, grant_type: &str, response: &OAuthResponse) {
        if response.is_success() {
            self.oauth_tokens_issued_total
                .with_label_values(&[grant_type])
                .inc();
        } else {
            let error = response
                .body
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown");
            self.oauth_grant_failures_total
                .with_label_values(&[grant_type, error])
                .inc();
        }
    }

    pub fn record_revocation(&self) {
        self.oauth_token_revocations_total.inc();
    }

    pub fn record_server_fault(&self, endpoint: &str) {
        self.oauth_server_faults_total
            .with_label_values(&[endpoint])
            .inc();
    }
}
