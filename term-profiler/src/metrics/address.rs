//! Model-backed address validity scoring.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::{ProfilerError, Result};
use crate::metric::{DisplayEntry, MetricKind, MetricOutput, MetricParams};
use crate::model::TextClassifier;
use crate::stats::{is_upper_case, round_to, strip_non_ascii};
use crate::table::TabularTable;

/// Scores concatenated address fields with a text classifier.
///
/// Parameters: `id_col` (default `id`) and `address_col` (default
/// `["addr", "city"]`, joined with `", "`). The output has the id, the
/// joined `addr` and its `Validity Score` (class-1 probability, 2 dp), sorted
/// from least to most valid. Addresses written entirely in upper case are
/// left out.
#[derive(Debug, Clone)]
pub struct DetectBadAddress {
    classifier: Arc<dyn TextClassifier>,
}

impl DetectBadAddress {
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self { classifier }
    }
}

/// Joins the address columns row by row. Nulls contribute empty parts.
fn join_address(table: &TabularTable, columns: &[String]) -> Result<Vec<String>> {
    let parts = columns
        .iter()
        .map(|c| table.text_column(c))
        .collect::<Result<Vec<_>>>()?;
    Ok((0..table.num_rows())
        .map(|row| {
            let joined = parts
                .iter()
                .map(|column| column[row].as_deref().unwrap_or(""))
                .collect::<Vec<_>>()
                .join(", ");
            strip_non_ascii(&joined)
        })
        .collect())
}

/// Class-1 probabilities of `texts`, checked against the input length.
pub(crate) fn positive_scores(
    classifier: &dyn TextClassifier,
    texts: &[String],
) -> Result<Vec<f64>> {
    let probabilities = classifier.predict_probability(texts)?;
    if probabilities.len() != texts.len() {
        return Err(ProfilerError::Model(format!(
            "classifier returned {} scores for {} texts",
            probabilities.len(),
            texts.len()
        )));
    }
    Ok(probabilities.iter().map(|p| p[1]).collect())
}

/// Row indices ordered by ascending score. Ties keep input order.
pub(crate) fn ascending_order(scores: &[f64]) -> Vec<u32> {
    let mut order: Vec<u32> = (0..scores.len() as u32).collect();
    order.sort_by(|a, b| scores[*a as usize].total_cmp(&scores[*b as usize]));
    order
}

#[async_trait]
impl MetricKind for DetectBadAddress {
    fn name(&self) -> &str {
        "detect_bad_address"
    }

    fn display(&self) -> Vec<DisplayEntry> {
        vec![DisplayEntry::label("Detect Bad Address")]
    }

    fn recognized_params(&self) -> &'static [&'static str] {
        &["id_col", "address_col"]
    }

    #[instrument(skip(self, table, params))]
    async fn calculate_in_memory(
        &self,
        table: &TabularTable,
        params: &MetricParams,
    ) -> Result<MetricOutput> {
        let id_col = params.str_or("id_col", "id")?;
        let address_cols = params.str_list_or("address_col", &["addr", "city"])?;
        if address_cols.is_empty() {
            return Err(ProfilerError::configuration(
                "address_col must name at least one column",
            ));
        }

        let addresses = join_address(table, &address_cols)?;
        let scores = positive_scores(self.classifier.as_ref(), &addresses)?;

        let kept: Vec<u32> = ascending_order(&scores)
            .into_iter()
            .filter(|i| !is_upper_case(&addresses[*i as usize]))
            .collect();
        debug!(
            scored = addresses.len(),
            kept = kept.len(),
            "Scored addresses"
        );

        let ids = table.take_column(&id_col, &kept)?;
        let addr: ArrayRef = Arc::new(
            kept.iter()
                .map(|i| Some(addresses[*i as usize].as_str()))
                .collect::<StringArray>(),
        );
        let validity: ArrayRef = Arc::new(
            kept.iter()
                .map(|i| Some(round_to(scores[*i as usize], 2)))
                .collect::<Float64Array>(),
        );

        Ok(MetricOutput::Table(TabularTable::from_columns(vec![
            (id_col, ids),
            ("addr".to_string(), addr),
            ("Validity Score".to_string(), validity),
        ])?))
    }
}
