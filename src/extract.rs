// src/extract.rs
//! Headline extraction: parse a homepage and apply a site's rule in document order.

use metrics::counter;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::classify::Label;
use crate::sites::SiteRule;

/// One extracted article title with its resolved link.
///
/// `label`/`score` are filled in by the classifier when that stage runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub text: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Headline {
    pub fn new(text: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: link.into(),
            label: None,
            score: None,
        }
    }

    pub fn is_classified(&self) -> bool {
        self.label.is_some() && self.score.is_some()
    }
}

/// Raw homepage body, handed from the fetch stage to the extract stage.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub site_id: String,
    pub raw_html: String,
}

/// Resolve `href` against `base`. Absolute http(s) links come back unchanged (only
/// trimmed); anything that cannot be joined or lands on another scheme (`javascript:`,
/// `mailto:`) is `None`.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if let Ok(abs) = Url::parse(href) {
        return matches!(abs.scheme(), "http" | "https").then(|| href.to_string());
    }
    let joined = base.join(href).ok()?;
    match joined.scheme() {
        "http" | "https" => Some(joined.to_string()),
        _ => None,
    }
}

/// Headlines in page order. Never yields empty text or a relative link.
pub fn extract(rule: &SiteRule, raw_html: &str) -> Vec<Headline> {
    let doc = Html::parse_document(raw_html);
    let mut out = Vec::new();
    let mut dropped = 0usize;

    for el in doc.root_element().descendants().filter_map(ElementRef::wrap) {
        if !rule.rule.matches(el) {
            continue;
        }
        let text = el.text().collect::<String>().trim().to_string();
        if text.is_empty() {
            continue;
        }
        let link = match rule.link_policy.href(el) {
            Some(href) => resolve_link(&rule.base_url, href),
            None => Some(rule.base_url.to_string()),
        };
        match link {
            Some(link) => out.push(Headline::new(text, link)),
            None => {
                dropped += 1;
                debug!(site = %rule.id, %text, "headline link not resolvable; skipped");
            }
        }
    }

    counter!("headlines_extracted_total", "site" => rule.id.clone()).increment(out.len() as u64);
    debug!(
        site = %rule.id,
        rule = rule.rule.name(),
        count = out.len(),
        dropped,
        "extracted headlines"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_links_are_left_alone() {
        let base = Url::parse("https://bbc.com/").unwrap();
        let abs = "https://other.example/x";
        assert_eq!(resolve_link(&base, abs).as_deref(), Some(abs));
        let once = resolve_link(&base, "/news/1").unwrap();
        assert_eq!(resolve_link(&base, &once), Some(once.clone()));
    }

    #[test]
    fn absolute_links_keep_their_exact_spelling() {
        let base = Url::parse("https://bbc.com/").unwrap();
        for href in [
            "https://www.bbc.com",
            "https://WWW.BBC.com/News/Story",
            "http://Example.ORG:80/a?b=c",
        ] {
            assert_eq!(resolve_link(&base, href).as_deref(), Some(href));
        }
        assert_eq!(
            resolve_link(&base, "  https://www.bbc.com  ").as_deref(),
            Some("https://www.bbc.com")
        );
    }

    #[test]
    fn non_http_schemes_are_rejected() {
        let base = Url::parse("https://bbc.com/").unwrap();
        assert_eq!(resolve_link(&base, "javascript:void(0)"), None);
        assert_eq!(resolve_link(&base, "mailto:desk@bbc.com"), None);
    }
}
