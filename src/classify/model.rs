// src/classify/model.rs
//! Pre-trained linear text model, loaded from JSON.
//!
//! JSON shape:
//! {
//!   "labels": ["__label__fact", "__label__opinion"],
//!   "bias":   [0.10, -0.10],
//!   "weights": { "says": [0.9, -0.4], "why": [-0.6, 1.1] }
//! }
//!
//! Scoring averages the weight vectors of known tokens, adds the bias, and takes a
//! softmax over labels. Unknown tokens contribute nothing but still count towards the
//! average, so a headline full of unseen words leans on the bias alone.

use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

use crate::error::{PipelineError, Result};

const LABEL_PREFIX: &str = "__label__";

#[derive(Debug, Deserialize)]
struct ModelFile {
    labels: Vec<String>,
    #[serde(default)]
    bias: Vec<f32>,
    #[serde(default)]
    weights: HashMap<String, Vec<f32>>,
}

#[derive(Debug, Clone)]
pub struct LinearModel {
    labels: Vec<String>,
    bias: Vec<f32>,
    weights: HashMap<String, Vec<f32>>,
}

impl LinearModel {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let fail = |reason: String| PipelineError::ModelLoad {
            path: path.display().to_string(),
            reason,
        };
        let raw = fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
        Self::from_json(&raw).map_err(|e| match e {
            PipelineError::ModelLoad { reason, .. } => fail(reason),
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let bad = |reason: String| PipelineError::ModelLoad {
            path: "<inline>".into(),
            reason,
        };
        let file: ModelFile = serde_json::from_str(raw).map_err(|e| bad(e.to_string()))?;

        let n = file.labels.len();
        if n == 0 {
            return Err(bad("model declares no labels".into()));
        }
        let bias = if file.bias.is_empty() {
            vec![0.0; n]
        } else {
            file.bias
        };
        if bias.len() != n {
            return Err(bad(format!("bias has {} entries, expected {n}", bias.len())));
        }
        if let Some((tok, w)) = file.weights.iter().find(|(_, w)| w.len() != n) {
            return Err(bad(format!(
                "weights for {tok:?} have {} entries, expected {n}",
                w.len()
            )));
        }
        if bias
            .iter()
            .chain(file.weights.values().flatten())
            .any(|x| !x.is_finite())
        {
            return Err(bad("model contains non-finite weights".into()));
        }

        let labels = file
            .labels
            .into_iter()
            .map(|l| l.strip_prefix(LABEL_PREFIX).unwrap_or(&l).to_string())
            .collect();

        Ok(Self {
            labels,
            bias,
            weights: file.weights,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn vocabulary_size(&self) -> usize {
        self.weights.len()
    }

    /// Best label and its probability for already-preprocessed tokens.
    pub fn predict_tokens(&self, tokens: &[String]) -> (&str, f32) {
        let n = self.labels.len();
        let mut logits = vec![0.0f32; n];
        if !tokens.is_empty() {
            for tok in tokens {
                if let Some(w) = self.weights.get(tok) {
                    for (acc, x) in logits.iter_mut().zip(w) {
                        *acc += x;
                    }
                }
            }
            let k = tokens.len() as f32;
            logits.iter_mut().for_each(|x| *x /= k);
        }
        for (acc, b) in logits.iter_mut().zip(&self.bias) {
            *acc += b;
        }

        let probs = softmax(&logits);
        let (best, p) = probs
            .iter()
            .enumerate()
            .fold((0usize, f32::MIN), |acc, (i, &p)| if p > acc.1 { (i, p) } else { acc });
        (self.labels[best].as_str(), p.clamp(0.0, 1.0))
    }
}

fn softmax(xs: &[f32]) -> Vec<f32> {
    let max = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = xs.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
