// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod queue;
pub mod retry;
pub mod sites;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::error::PipelineError;
pub use crate::extract::Headline;
pub use crate::pipeline::{Pipeline, PipelineContext};

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::classify::Classifier;
use crate::config::AppConfig;
use crate::fetch::HttpFetcher;
use crate::notify::{HttpWebhook, Notifier};
use crate::queue::ChainQueue;
use crate::retry::Backoff;
use crate::sites::SiteRegistry;
use crate::store::NewsStore;

/// Wire registry, fetcher, classifier, store and notifier from config.
///
/// A classifier that is enabled but cannot be loaded is an error: the service must not
/// start without the model it was configured to use.
pub async fn build_pipeline(cfg: &AppConfig) -> anyhow::Result<Pipeline> {
    let registry = Arc::new(SiteRegistry::builtin());
    let client = fetch::build_client(&cfg.fetch.user_agent).context("building HTTP client")?;

    let mut fetcher = HttpFetcher::new(client.clone())
        .with_timeout(cfg.fetch.timeout_secs)
        .with_backoff(Backoff::new(
            cfg.fetch.max_retries,
            Duration::from_millis(cfg.fetch.backoff_ms),
        ));
    for (site, origin) in &cfg.fetch.origins {
        let origin = Url::parse(origin).with_context(|| format!("fetch.origins.{site}"))?;
        fetcher = fetcher.with_origin(site.clone(), origin);
    }

    let webhook = HttpWebhook::new(client)
        .with_timeout(cfg.notify.timeout_secs)
        .with_retries(cfg.notify.max_retries);
    let notifier = Notifier::new(Arc::new(webhook), cfg.notify.format);

    let mut pipeline = Pipeline::new(registry, Arc::new(fetcher), notifier);

    if cfg.classifier.enabled {
        let classifier = Classifier::load(&cfg.classifier.model_path)?;
        pipeline = pipeline.with_classifier(Arc::new(classifier));
    } else {
        info!("classifier disabled; headlines go out unlabeled");
    }

    if let Some(url) = &cfg.store.database_url {
        pipeline = pipeline.with_store(NewsStore::connect(url).await?);
    }

    Ok(pipeline)
}

/// Build the HTTP router and start the chain workers behind it.
pub async fn app(cfg: &AppConfig) -> anyhow::Result<axum::Router> {
    let pipeline = Arc::new(build_pipeline(cfg).await?);
    let registry = pipeline.registry();
    let (queue, _workers) = ChainQueue::start(pipeline, cfg.queue.to_queue_config());
    let state = AppState::new(registry, queue, cfg.server.default_site.clone());
    Ok(router(state))
}
