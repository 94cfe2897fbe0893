//! Headline relay: binary entrypoint.
//! Boots the Axum HTTP server and the chain workers behind it.
//!
//! See `README.md` for quickstart and `config/headlines.toml` for settings.

use anyhow::Context;
use headline_relay::config::AppConfig;
use headline_relay::metrics::Metrics;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("headline_relay=info,tower_http=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl-c");
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default().context("loading configuration")?;

    let mut router = headline_relay::app(&cfg)
        .await
        .context("starting pipeline (is the classifier model readable?)")?;

    if cfg.server.metrics {
        let metrics = Metrics::init()?;
        router = router.merge(metrics.router());
    }

    let listener = TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("binding {}", cfg.server.bind))?;
    info!(
        bind = %cfg.server.bind,
        default_site = %cfg.server.default_site,
        workers = cfg.queue.workers,
        "headline relay listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
