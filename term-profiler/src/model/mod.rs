//! Pre-trained models used by the classification and regression metrics.
//!
//! Models are loaded once and then only read. Metrics receive them as
//! `Arc<dyn TextClassifier>` / `Arc<dyn Regressor>` at construction, so any
//! scorer can be plugged in; the crate ships JSON-loadable implementations.

mod linear;
mod text;

pub use linear::LinearRegressor;
pub use text::BagOfWordsClassifier;

use std::fmt::Debug;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{info, instrument};

use crate::error::{ProfilerError, Result};

/// Scores free text into two classes.
pub trait TextClassifier: Send + Sync + Debug {
    /// Returns `[p(class 0), p(class 1)]` for every input text.
    fn predict_probability(&self, texts: &[String]) -> Result<Vec<[f64; 2]>>;
}

/// Predicts a numeric target from numeric features.
pub trait Regressor: Send + Sync + Debug {
    /// Number of features each row must have.
    fn feature_count(&self) -> usize;

    /// Returns one prediction per feature row.
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// Reads and deserializes a JSON model file.
#[instrument(skip_all, fields(path = %path.display()))]
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path, model: &str) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ProfilerError::Model(format!("failed to read {model} from {}: {e}", path.display()))
    })?;
    let parsed = serde_json::from_str(&contents).map_err(|e| {
        ProfilerError::Model(format!("invalid {model} file {}: {e}", path.display()))
    })?;
    info!(model, "Loaded model");
    Ok(parsed)
}
