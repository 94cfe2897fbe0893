// src/notify/mod.rs
//! Webhook delivery of the headline summary.
//!
//! - Only the first [`MAX_HEADLINES`] headlines (page order) are ever sent.
//! - Empty destination or no headlines: nothing is posted, and that is not an error.
//! - Otherwise exactly one delivery; retries live inside the [`WebhookClient`].

pub mod slack;
pub mod webhook;

use metrics::counter;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::extract::Headline;
pub use webhook::{HttpWebhook, WebhookClient};

pub const MAX_HEADLINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyFormat {
    /// Raw JSON listing inside a code block.
    Plain,
    /// Title + divider + one section per headline.
    #[default]
    Blocks,
}

impl std::str::FromStr for NotifyFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(NotifyFormat::Plain),
            "blocks" => Ok(NotifyFormat::Blocks),
            other => Err(format!("unknown notify format {other:?} (plain|blocks)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent { headlines: usize },
    Skipped,
}

#[derive(Clone)]
pub struct Notifier {
    webhook: Arc<dyn WebhookClient>,
    format: NotifyFormat,
}

impl Notifier {
    pub fn new(webhook: Arc<dyn WebhookClient>, format: NotifyFormat) -> Self {
        Self { webhook, format }
    }

    pub fn format(&self) -> NotifyFormat {
        self.format
    }

    pub fn payload(&self, site_id: &str, headlines: &[Headline]) -> serde_json::Value {
        let top = &headlines[..headlines.len().min(MAX_HEADLINES)];
        match self.format {
            NotifyFormat::Plain => slack::plain_payload(top),
            NotifyFormat::Blocks => slack::blocks_payload(site_id, top),
        }
    }

    pub async fn notify(
        &self,
        site_id: &str,
        headlines: &[Headline],
        destination: Option<&str>,
    ) -> Result<Delivery> {
        let Some(url) = destination.map(str::trim).filter(|u| !u.is_empty()) else {
            debug!(site = site_id, "no webhook destination; notify skipped");
            return Ok(Delivery::Skipped);
        };
        if headlines.is_empty() {
            debug!(site = site_id, "no headlines; notify skipped");
            return Ok(Delivery::Skipped);
        }

        let sent = headlines.len().min(MAX_HEADLINES);
        let body = self.payload(site_id, headlines);
        match self.webhook.post_json(url, &body).await {
            Ok(()) => {
                counter!("headlines_notify_total", "result" => "ok").increment(1);
                info!(site = site_id, headlines = sent, format = ?self.format, "webhook delivered");
                Ok(Delivery::Sent { headlines: sent })
            }
            Err(e) => {
                counter!("headlines_notify_total", "result" => "error").increment(1);
                Err(PipelineError::NotifyFailed {
                    reason: format!("{e:#}"),
                })
            }
        }
    }
}
