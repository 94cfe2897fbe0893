// src/fetch.rs
//! Homepage retrieval.
//!
//! Scraping a homepage is idempotent, so transport errors and non-2xx answers are
//! retried a bounded number of times with backoff before the chain gives up.

use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use url::Url;

use crate::error::{PipelineError, Result};
use crate::extract::FetchResult;
use crate::retry::Backoff;
use crate::sites::SiteRule;

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, site: &SiteRule) -> Result<FetchResult>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    backoff: Backoff,
    origins: HashMap<String, Url>,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(10),
            backoff: Backoff::new(2, Duration::from_millis(500)),
            origins: HashMap::new(),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Fetch `site_id` from `origin` instead of `https://{site_id}/`.
    pub fn with_origin(mut self, site_id: impl Into<String>, origin: Url) -> Self {
        self.origins.insert(site_id.into(), origin);
        self
    }

    pub fn url_for(&self, site: &SiteRule) -> Url {
        self.origins
            .get(&site.id)
            .cloned()
            .unwrap_or_else(|| site.base_url.clone())
    }

    /// GET `url` with retries; the body is attributed to `site_id`.
    pub async fn fetch_url(&self, site_id: &str, url: &Url) -> Result<FetchResult> {
        let t0 = Instant::now();
        let mut attempt: u8 = 0;
        loop {
            match self.get_once(url).await {
                Ok(raw_html) => {
                    counter!("headlines_fetch_total", "site" => site_id.to_string(), "result" => "ok")
                        .increment(1);
                    info!(
                        site = site_id,
                        %url,
                        bytes = raw_html.len(),
                        attempts = attempt + 1,
                        elapsed_ms = t0.elapsed().as_millis() as u64,
                        "fetched homepage"
                    );
                    return Ok(FetchResult {
                        site_id: site_id.to_string(),
                        raw_html,
                    });
                }
                Err(reason) => {
                    attempt += 1;
                    if !self.backoff.should_retry(attempt) {
                        counter!("headlines_fetch_total", "site" => site_id.to_string(), "result" => "error")
                            .increment(1);
                        return Err(PipelineError::FetchFailed {
                            site: site_id.to_string(),
                            reason,
                        });
                    }
                    let delay = self.backoff.delay(attempt);
                    warn!(site = site_id, %url, attempt, ?delay, error = %reason, "fetch failed; backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn get_once(&self, url: &Url) -> std::result::Result<String, String> {
        let rsp = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let rsp = rsp.error_for_status().map_err(|e| e.to_string())?;
        rsp.text().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, site: &SiteRule) -> Result<FetchResult> {
        let url = self.url_for(site);
        self.fetch_url(&site.id, &url).await
    }
}

/// Shared HTTP client for fetch and webhook stages.
pub fn build_client(user_agent: &str) -> reqwest::Result<Client> {
    Client::builder().user_agent(user_agent).build()
}
