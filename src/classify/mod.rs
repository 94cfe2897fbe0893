// src/classify/mod.rs
//! Fact/opinion classification of headlines.
//!
//! The model is loaded once at startup and shared read-only (`Arc<Classifier>`) by every
//! chain; nothing here mutates after `load`.

pub mod model;
pub mod preprocess;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::extract::Headline;
use model::LinearModel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Fact,
    Opinion,
    #[serde(untagged)]
    Other(String),
}

impl Label {
    pub fn from_model(raw: &str) -> Self {
        match raw {
            "fact" => Label::Fact,
            "opinion" => Label::Opinion,
            other => Label::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Label::Fact => "fact",
            Label::Opinion => "opinion",
            Label::Other(s) => s,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct Classifier {
    model: LinearModel,
}

impl Classifier {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let model = LinearModel::load(&path)?;
        info!(
            path = %path.as_ref().display(),
            labels = ?model.labels(),
            vocabulary = model.vocabulary_size(),
            "classifier model loaded"
        );
        Ok(Self { model })
    }

    pub fn from_model(model: LinearModel) -> Self {
        Self { model }
    }

    /// Label and confidence for raw headline text.
    pub fn predict(&self, text: &str) -> Result<(Label, f32)> {
        let tokens = preprocess::tokens(text);
        if tokens.is_empty() {
            return Err(PipelineError::ClassificationSkipped {
                text: text.to_string(),
            });
        }
        let (label, score) = self.model.predict_tokens(&tokens);
        Ok((Label::from_model(label), score))
    }

    /// Enrich one headline in place. On `ClassificationSkipped` label/score stay unset.
    pub fn classify(&self, headline: &mut Headline) -> Result<()> {
        let (label, score) = self.predict(&headline.text)?;
        headline.label = Some(label);
        headline.score = Some(score);
        Ok(())
    }

    /// Classify every headline of one request; returns how many were skipped.
    pub fn classify_all(&self, headlines: &mut [Headline]) -> usize {
        let mut skipped = 0;
        for h in headlines.iter_mut() {
            if let Err(e) = self.classify(h) {
                skipped += 1;
                debug!(error = %e, "classification skipped");
            }
        }
        skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        let m = LinearModel::from_json(
            r#"{"labels":["__label__fact","__label__opinion"],
                "bias":[0.0,0.0],
                "weights":{"says":[2.0,-1.0],"why":[-1.0,2.0]}}"#,
        )
        .unwrap();
        Classifier::from_model(m)
    }

    #[test]
    fn label_serializes_lowercase_and_passes_unknown_through() {
        assert_eq!(serde_json::to_string(&Label::Fact).unwrap(), "\"fact\"");
        assert_eq!(
            serde_json::to_string(&Label::Other("satire".into())).unwrap(),
            "\"satire\""
        );
        assert_eq!(Label::from_model("opinion"), Label::Opinion);
    }

    #[test]
    fn classify_all_skips_tokenless_text_without_failing_batch() {
        let c = classifier();
        let mut hs = vec![
            Headline::new("Minister says budget is final", "https://bbc.com/1"),
            Headline::new("2024", "https://bbc.com/2"),
            Headline::new("Why we must act now", "https://bbc.com/3"),
        ];
        assert_eq!(c.classify_all(&mut hs), 1);
        assert_eq!(hs[0].label, Some(Label::Fact));
        assert!(hs[1].label.is_none() && hs[1].score.is_none());
        assert_eq!(hs[2].label, Some(Label::Opinion));
    }

    #[test]
    fn prediction_is_deterministic_and_bounded() {
        let c = classifier();
        let a = c.predict("Police says suspect arrested").unwrap();
        let b = c.predict("Police says suspect arrested").unwrap();
        assert_eq!(a, b);
        assert!((0.0..=1.0).contains(&a.1));
    }
}
