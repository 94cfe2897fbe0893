// src/notify/webhook.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::retry::Backoff;

/// Outbound JSON POST. One call is one logical delivery, whatever retrying happens inside.
#[async_trait]
pub trait WebhookClient: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<()>;
}

#[derive(Clone)]
pub struct HttpWebhook {
    client: Client,
    timeout: Duration,
    backoff: Backoff,
}

impl HttpWebhook {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(5),
            backoff: Backoff::new(2, Duration::from_millis(500)),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.backoff.max_retries = retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }
}

#[async_trait]
impl WebhookClient for HttpWebhook {
    async fn post_json(&self, url: &str, body: &Value) -> Result<()> {
        let mut attempt: u8 = 0;
        loop {
            let res = self
                .client
                .post(url)
                .timeout(self.timeout)
                .json(body)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status_ref() {
                    Ok(_) => return Ok(()),
                    Err(e) => anyhow!("webhook HTTP error: {e}"),
                },
                Err(e) => anyhow!("webhook request failed: {e}"),
            };

            attempt += 1;
            if !self.backoff.should_retry(attempt) {
                return Err(err);
            }
            let delay = self.backoff.delay(attempt);
            warn!(attempt, ?delay, error = %err, "webhook post failed; backing off");
            tokio::time::sleep(delay).await;
        }
    }
}
