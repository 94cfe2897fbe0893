// src/pipeline.rs
//! The per-request chain: Fetch → Extract → [Classify] → [Persist] → [Notify].
//!
//! Each stage consumes what the previous one produced. A chain owns its
//! [`PipelineContext`]; the only things shared between chains are read-only
//! (registry, classifier model) or internally pooled (HTTP client, SQLite pool).

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::Classifier;
use crate::error::Result;
use crate::extract::{self, FetchResult, Headline};
use crate::fetch::Fetcher;
use crate::notify::{Delivery, Notifier};
use crate::sites::SiteRegistry;
use crate::store::{NewsRow, NewsStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetch,
    Extract,
    Classify,
    Persist,
    Notify,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineContext {
    pub site_id: String,
    pub callback_url: Option<String>,
    pub headlines: Vec<Headline>,
}

impl PipelineContext {
    pub fn new(site_id: impl Into<String>, callback_url: Option<String>) -> Self {
        Self {
            site_id: site_id.into(),
            callback_url: callback_url.filter(|u| !u.trim().is_empty()),
            headlines: Vec::new(),
        }
    }
}

/// What a finished chain did, for logs and tests.
#[derive(Debug, Clone)]
pub struct ChainReport {
    pub context: PipelineContext,
    pub stages: Vec<Stage>,
    pub classification_skipped: usize,
    pub persisted: usize,
    pub delivery: Option<Delivery>,
}

pub struct Pipeline {
    registry: Arc<SiteRegistry>,
    fetcher: Arc<dyn Fetcher>,
    classifier: Option<Arc<Classifier>>,
    store: Option<NewsStore>,
    notifier: Notifier,
}

impl Pipeline {
    pub fn new(registry: Arc<SiteRegistry>, fetcher: Arc<dyn Fetcher>, notifier: Notifier) -> Self {
        Self {
            registry,
            fetcher,
            classifier: None,
            store: None,
            notifier,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_store(mut self, store: NewsStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn registry(&self) -> Arc<SiteRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn classifier(&self) -> Option<&Classifier> {
        self.classifier.as_deref()
    }

    /// Without a callback the chain only fetches and extracts (for local inspection);
    /// with one it runs the full chain, classify/persist only when configured.
    pub fn plan(&self, ctx: &PipelineContext) -> Vec<Stage> {
        let mut stages = vec![Stage::Fetch, Stage::Extract];
        if ctx.callback_url.is_none() {
            return stages;
        }
        if self.classifier.is_some() {
            stages.push(Stage::Classify);
        }
        if self.store.is_some() {
            stages.push(Stage::Persist);
        }
        stages.push(Stage::Notify);
        stages
    }

    /// Run one chain to completion. Only a missing rule or a failed fetch ends it early;
    /// skipped classifications and failed deliveries are logged and reported.
    pub async fn run(&self, ctx: PipelineContext) -> Result<ChainReport> {
        let t0 = Instant::now();
        let stages = self.plan(&ctx);
        let rule = self.registry.resolve(&ctx.site_id)?;

        let mut report = ChainReport {
            context: ctx,
            stages: stages.clone(),
            classification_skipped: 0,
            persisted: 0,
            delivery: None,
        };
        let mut fetched: Option<FetchResult> = None;

        for stage in stages {
            debug!(site = %rule.id, ?stage, "stage start");
            match stage {
                Stage::Fetch => {
                    let res = self.fetcher.fetch(rule).await;
                    if let Err(e) = &res {
                        counter!("headlines_chains_total", "result" => "fetch_failed").increment(1);
                        warn!(site = %rule.id, error = %e, "chain stopped: nothing to extract");
                    }
                    fetched = Some(res?);
                }
                Stage::Extract => {
                    let raw = fetched.take().map(|f| f.raw_html).unwrap_or_default();
                    report.context.headlines = extract::extract(rule, &raw);
                    info!(
                        site = %rule.id,
                        count = report.context.headlines.len(),
                        "headlines extracted"
                    );
                    if report.context.callback_url.is_none() {
                        for h in &report.context.headlines {
                            info!(site = %rule.id, text = %h.text, link = %h.link, "headline");
                        }
                    }
                }
                Stage::Classify => {
                    if let Some(c) = &self.classifier {
                        report.classification_skipped =
                            c.classify_all(&mut report.context.headlines);
                    }
                }
                Stage::Persist => {
                    if let Some(store) = &self.store {
                        let rows: Vec<NewsRow> =
                            report.context.headlines.iter().map(NewsRow::from).collect();
                        match store.append(&rows).await {
                            Ok(n) => report.persisted = n,
                            Err(e) => warn!(site = %rule.id, error = %e, "persist failed"),
                        }
                    }
                }
                Stage::Notify => {
                    let ctx = &report.context;
                    match self
                        .notifier
                        .notify(&ctx.site_id, &ctx.headlines, ctx.callback_url.as_deref())
                        .await
                    {
                        Ok(d) => report.delivery = Some(d),
                        Err(e) => warn!(site = %rule.id, error = %e, "notify failed"),
                    }
                }
            }
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("headlines_chain_ms").record(ms);
        counter!("headlines_chains_total", "result" => "ok").increment(1);
        info!(
            site = %report.context.site_id,
            headlines = report.context.headlines.len(),
            skipped = report.classification_skipped,
            persisted = report.persisted,
            delivery = ?report.delivery,
            elapsed_ms = ms as u64,
            "chain finished"
        );
        Ok(report)
    }
}
