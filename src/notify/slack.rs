// src/notify/slack.rs
//! Slack message bodies for a headline summary.

use serde::Serialize;
use serde_json::{json, Value};

use crate::extract::Headline;

/// Preformatted text block holding the headlines as pretty JSON.
pub fn plain_payload(headlines: &[Headline]) -> Value {
    let listing = serde_json::to_string_pretty(headlines).unwrap_or_else(|_| "[]".to_string());
    json!({ "text": format!("```{listing}```") })
}

#[derive(Debug, Serialize)]
struct TextObject {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Block {
    Section { text: TextObject },
    Divider,
}

impl Block {
    fn mrkdwn(text: String) -> Self {
        Block::Section {
            text: TextObject {
                kind: "mrkdwn",
                text,
            },
        }
    }
}

/// Title, divider, then one section per headline.
pub fn blocks_payload(site_id: &str, headlines: &[Headline]) -> Value {
    let mut blocks = Vec::with_capacity(headlines.len() + 2);
    blocks.push(Block::mrkdwn(format!("*Recent headlines from {site_id}*")));
    blocks.push(Block::Divider);
    blocks.extend(headlines.iter().map(|h| Block::mrkdwn(headline_line(h))));
    json!({ "response_type": "in_channel", "blocks": blocks })
}

fn headline_line(h: &Headline) -> String {
    let mut line = format!("<{}|{}>", h.link, h.text);
    if let (Some(label), Some(score)) = (&h.label, h.score) {
        line.push_str(&format!("\n{label}: {}%", format_percent(score)));
    }
    line
}

/// `0.8765` -> `"87.65"`, `0.5` -> `"50.0"`: percent rounded to two decimals.
pub fn format_percent(score: f32) -> String {
    let pct = (f64::from(score) * 100.0 * 100.0).round() / 100.0;
    if pct.fract() == 0.0 {
        format!("{pct:.1}")
    } else {
        format!("{pct}")
    }
}
