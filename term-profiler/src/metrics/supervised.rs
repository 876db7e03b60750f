//! Regression-based anomaly detection.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::{ProfilerError, Result};
use crate::metric::{DisplayEntry, MetricKind, MetricOutput, MetricParams};
use crate::model::Regressor;
use crate::stats::column_moments;
use crate::table::TabularTable;

/// Compares a regressor's predictions with the observed target.
///
/// Parameters: `x_cols` (default `["input"]`), `y_col` (default `output`) and
/// `id_col` (default `id`). Every input row is returned, id column first and
/// the remaining columns in table order, with `Predicted Value`,
/// `Absolute Error` and `Is Anomaly` appended, sorted by descending error. A
/// row is anomalous when its error exceeds the mean error plus two sample
/// standard deviations.
///
/// Rows with a missing feature or target are scored as `NaN` error and never
/// flagged.
#[derive(Debug, Clone)]
pub struct SupervisedAnomalyDetection {
    regressor: Arc<dyn Regressor>,
}

impl SupervisedAnomalyDetection {
    pub fn new(regressor: Arc<dyn Regressor>) -> Self {
        Self { regressor }
    }
}

#[async_trait]
impl MetricKind for SupervisedAnomalyDetection {
    fn name(&self) -> &str {
        "supervised_anomaly_detection"
    }

    fn display(&self) -> Vec<DisplayEntry> {
        vec![DisplayEntry::label("Anomaly Detection")]
    }

    fn recognized_params(&self) -> &'static [&'static str] {
        &["id_col", "x_cols", "y_col"]
    }

    #[instrument(skip(self, table, params))]
    async fn calculate_in_memory(
        &self,
        table: &TabularTable,
        params: &MetricParams,
    ) -> Result<MetricOutput> {
        let id_col = params.str_or("id_col", "id")?;
        table.column(&id_col)?;
        let x_cols = params.str_list_or("x_cols", &["input"])?;
        let y_col = params.str_or("y_col", "output")?;
        if x_cols.len() != self.regressor.feature_count() {
            return Err(ProfilerError::configuration(format!(
                "model expects {} feature columns, x_cols names {}",
                self.regressor.feature_count(),
                x_cols.len()
            )));
        }

        let features = x_cols
            .iter()
            .map(|c| table.float_column(c))
            .collect::<Result<Vec<_>>>()?;
        let targets = table.float_column(&y_col)?;

        // Only complete rows go through the model.
        let complete: Vec<usize> = (0..table.num_rows())
            .filter(|row| targets[*row].is_some() && features.iter().all(|f| f[*row].is_some()))
            .collect();
        let rows: Vec<Vec<f64>> = complete
            .iter()
            .map(|row| features.iter().map(|f| f[*row].unwrap_or(f64::NAN)).collect())
            .collect();
        let predictions = self.regressor.predict(&rows)?;
        if predictions.len() != rows.len() {
            return Err(ProfilerError::Model(format!(
                "regressor returned {} predictions for {} rows",
                predictions.len(),
                rows.len()
            )));
        }

        let mut predicted = vec![None; table.num_rows()];
        let mut errors = vec![f64::NAN; table.num_rows()];
        for (row, prediction) in complete.iter().zip(&predictions) {
            predicted[*row] = Some(*prediction);
            errors[*row] = (targets[*row].unwrap_or(f64::NAN) - prediction).abs();
        }

        let scored: ArrayRef = Arc::new(Float64Array::from(errors.clone()));
        let moments = column_moments(&[scored]).await?;
        let cutoff = match moments.first().map(|m| (m.mean, m.sample_std)) {
            Some((Some(mean), Some(std))) => mean + 2.0 * std,
            _ => f64::INFINITY,
        };
        debug!(rows = complete.len(), cutoff, "Scored regression errors");

        // Descending by error, unscored rows last.
        let mut order: Vec<u32> = (0..table.num_rows() as u32).collect();
        order.sort_by(|a, b| {
            let (ea, eb) = (errors[*a as usize], errors[*b as usize]);
            match (ea.is_nan(), eb.is_nan()) {
                (false, false) => eb.total_cmp(&ea),
                (a_nan, b_nan) => a_nan.cmp(&b_nan),
            }
        });

        let mut columns: Vec<(String, ArrayRef)> = Vec::with_capacity(table.num_columns() + 3);
        let names = std::iter::once(id_col.clone())
            .chain(table.column_names().into_iter().filter(|name| *name != id_col));
        for name in names {
            let sorted = table.take_column(&name, &order)?;
            columns.push((name, sorted));
        }
        columns.push((
            "Predicted Value".to_string(),
            Arc::new(
                order
                    .iter()
                    .map(|i| predicted[*i as usize])
                    .collect::<Float64Array>(),
            ),
        ));
        columns.push((
            "Absolute Error".to_string(),
            Arc::new(
                order
                    .iter()
                    .map(|i| Some(errors[*i as usize]).filter(|e| !e.is_nan()))
                    .collect::<Float64Array>(),
            ),
        ));
        columns.push((
            "Is Anomaly".to_string(),
            Arc::new(
                order
                    .iter()
                    .map(|i| Some(errors[*i as usize] > cutoff))
                    .collect::<BooleanArray>(),
            ),
        ));

        Ok(MetricOutput::Table(TabularTable::from_columns(columns)?))
    }
}
