//! Bag-of-words text classification.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{load_json, TextClassifier};

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"[A-Za-z0-9]+").expect("Hard-coded regex pattern should be valid")
});

/// A logistic bag-of-words classifier.
///
/// `p(class 1) = sigmoid(bias + sum(weight[token]))` over the alphanumeric
/// tokens of the text; unknown tokens contribute nothing.
///
/// The JSON file looks like:
///
/// ```json
/// { "weights": { "street": 1.2, "xx": -2.0 }, "bias": -0.1, "lowercase": true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagOfWordsClassifier {
    weights: HashMap<String, f64>,
    #[serde(default)]
    bias: f64,
    #[serde(default = "default_lowercase")]
    lowercase: bool,
}

fn default_lowercase() -> bool {
    true
}

impl BagOfWordsClassifier {
    pub fn new(weights: HashMap<String, f64>, bias: f64) -> Self {
        Self {
            weights,
            bias,
            lowercase: true,
        }
    }

    /// Loads a classifier from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_json(path.as_ref(), "bag-of-words classifier")
    }

    fn score(&self, text: &str) -> f64 {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let logit = TOKEN
            .find_iter(&text)
            .filter_map(|token| self.weights.get(token.as_str()))
            .fold(self.bias, |acc, w| acc + w);
        1.0 / (1.0 + (-logit).exp())
    }
}

impl TextClassifier for BagOfWordsClassifier {
    fn predict_probability(&self, texts: &[String]) -> Result<Vec<[f64; 2]>> {
        Ok(texts
            .iter()
            .map(|text| {
                let positive = self.score(text);
                [1.0 - positive, positive]
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProfilerError;
    use std::io::Write;

    #[test]
    fn test_scores_known_tokens() {
        let classifier = BagOfWordsClassifier::new(
            HashMap::from([("street".to_string(), 3.0), ("xx".to_string(), -3.0)]),
            0.0,
        );
        let scores = classifier
            .predict_probability(&[
                "12 High Street".to_string(),
                "xx".to_string(),
                String::new(),
            ])
            .unwrap();
        assert!(scores[0][1] > 0.9);
        assert!(scores[1][1] < 0.1);
        assert!((scores[2][1] - 0.5).abs() < 1e-12);
        assert!((scores[0][0] + scores[0][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"weights": {{"deceased": 4.0}}, "bias": -2.0}}"#).unwrap();
        let classifier = BagOfWordsClassifier::load(file.path()).unwrap();
        let scores = classifier
            .predict_probability(&["Client DECEASED".to_string()])
            .unwrap();
        assert!(scores[0][1] > 0.8);
    }

    #[test]
    fn test_load_errors() {
        let missing = BagOfWordsClassifier::load("/definitely/not/here.json");
        assert!(matches!(missing, Err(ProfilerError::Model(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            BagOfWordsClassifier::load(file.path()),
            Err(ProfilerError::Model(_))
        ));
    }
}
