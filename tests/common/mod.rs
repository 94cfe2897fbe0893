// tests/common/mod.rs
//
// Shared test doubles: a canned-HTML fetcher and a webhook that records instead of posting.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use headline_relay::error::{PipelineError, Result};
use headline_relay::extract::FetchResult;
use headline_relay::fetch::Fetcher;
use headline_relay::notify::{Notifier, NotifyFormat, WebhookClient};
use headline_relay::sites::{SiteRegistry, SiteRule};
use headline_relay::Pipeline;

pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// Serves the same HTML for every site and counts calls.
#[derive(Default)]
pub struct StaticFetcher {
    html: String,
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn slow(html: impl Into<String>, delay: Duration) -> Self {
        Self {
            html: html.into(),
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, site: &SiteRule) -> Result<FetchResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        if self.fail {
            return Err(PipelineError::FetchFailed {
                site: site.id.clone(),
                reason: "connection refused".into(),
            });
        }
        Ok(FetchResult {
            site_id: site.id.clone(),
            raw_html: self.html.clone(),
        })
    }
}

/// Records every (url, body) it is asked to post.
#[derive(Default)]
pub struct RecordingWebhook {
    pub posts: Mutex<Vec<(String, Value)>>,
    pub fail: bool,
}

impl RecordingWebhook {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn count(&self) -> usize {
        self.posts.lock().len()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.posts.lock().last().map(|(_, b)| b.clone())
    }
}

#[async_trait]
impl WebhookClient for RecordingWebhook {
    async fn post_json(&self, url: &str, body: &Value) -> anyhow::Result<()> {
        self.posts.lock().push((url.to_string(), body.clone()));
        if self.fail {
            anyhow::bail!("webhook returned 500");
        }
        Ok(())
    }
}

pub fn pipeline_with(
    fetcher: Arc<StaticFetcher>,
    webhook: Arc<RecordingWebhook>,
    format: NotifyFormat,
) -> Pipeline {
    Pipeline::new(
        Arc::new(SiteRegistry::builtin()),
        fetcher,
        Notifier::new(webhook, format),
    )
}

/// Poll `cond` until it holds or two seconds pass.
pub async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
