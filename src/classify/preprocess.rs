// src/classify/preprocess.rs
//! Text normalization applied before scoring.
//!
//! Must match what the model saw at training time token for token: lowercase, runs of
//! alphabetic word characters (digits split tokens), tokens starting with `_` dropped,
//! and only tokens of 2..=15 characters kept.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_TOKEN_LEN: usize = 2;
pub const MAX_TOKEN_LEN: usize = 15;

// Word characters except digits; underscore stays in so `_`-prefixed tokens can be dropped.
static RE_ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\W\d]+").unwrap());

pub fn tokens(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    RE_ALPHA
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !t.starts_with('_'))
        .filter(|t| {
            let n = t.chars().count();
            (MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&n)
        })
        .map(str::to_string)
        .collect()
}

/// Tokens re-joined with single spaces; empty when nothing survives.
pub fn preprocess(text: &str) -> String {
    tokens(text).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_punctuation_and_digits() {
        assert_eq!(
            preprocess("Why the Fed's 2024 rate-cut is WRONG!"),
            "why the fed rate cut is wrong"
        );
    }

    #[test]
    fn drops_short_long_and_underscore_tokens() {
        assert_eq!(preprocess("a I x _hidden ok"), "ok");
        assert_eq!(preprocess("supercalifragilistic word"), "word");
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(preprocess("Café Zürich"), "café zürich");
    }

    #[test]
    fn empty_when_nothing_survives() {
        assert_eq!(preprocess("   42 - 7 !!"), "");
    }
}
