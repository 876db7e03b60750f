//! Linear regression scoring.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProfilerError, Result};

use super::{load_json, Regressor};

/// An ordinary linear model: `y = intercept + sum(coefficient_i * x_i)`.
///
/// Loaded from JSON of the form `{ "coefficients": [0.8, 12.0], "intercept": 3.5 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    coefficients: Vec<f64>,
    #[serde(default)]
    intercept: f64,
}

impl LinearRegressor {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// Loads a regressor from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_json(path.as_ref(), "linear regressor")
    }
}

impl Regressor for LinearRegressor {
    fn feature_count(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.coefficients.len() {
                    return Err(ProfilerError::Model(format!(
                        "expected {} features, got {}",
                        self.coefficients.len(),
                        row.len()
                    )));
                }
                Ok(row
                    .iter()
                    .zip(&self.coefficients)
                    .fold(self.intercept, |acc, (x, c)| acc + x * c))
            })
            .collect()
    }
}
