use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process.
    pub fn init() -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new().install_recorder()?;

        describe_counter!("headlines_fetch_total", "Homepage fetches by site and result.");
        describe_counter!("headlines_extracted_total", "Headlines extracted by site.");
        describe_counter!("headlines_notify_total", "Webhook deliveries by result.");
        describe_counter!("headlines_chains_total", "Finished chains by result.");
        describe_counter!("headlines_requests_total", "Accepted/rejected HTTP requests.");
        describe_histogram!("headlines_chain_ms", "End-to-end chain time in milliseconds.");

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
