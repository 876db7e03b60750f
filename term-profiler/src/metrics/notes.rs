//! Free-text client note classification.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use async_trait::async_trait;
use tracing::instrument;

use crate::error::Result;
use crate::metric::{DisplayEntry, MetricKind, MetricOutput, MetricParams};
use crate::model::TextClassifier;
use crate::stats::round_to;
use crate::table::TabularTable;

use super::address::{ascending_order, positive_scores};

/// Scores a free-text notes column, e.g. for notifications of death.
///
/// Parameters: `id_col` (default `id`), `notes_col` (default
/// `client_notes`). Missing notes are scored as empty text. Output columns
/// are the id, the notes and `Confidence Score` (2 dp), sorted ascending.
#[derive(Debug, Clone)]
pub struct ClassifyClientNotes {
    classifier: Arc<dyn TextClassifier>,
}

impl ClassifyClientNotes {
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl MetricKind for ClassifyClientNotes {
    fn name(&self) -> &str {
        "classify_client_notes"
    }

    fn display(&self) -> Vec<DisplayEntry> {
        vec![DisplayEntry::label("Classify Client Notes")]
    }

    fn recognized_params(&self) -> &'static [&'static str] {
        &["id_col", "notes_col"]
    }

    #[instrument(skip(self, table, params))]
    async fn calculate_in_memory(
        &self,
        table: &TabularTable,
        params: &MetricParams,
    ) -> Result<MetricOutput> {
        let id_col = params.str_or("id_col", "id")?;
        let notes_col = params.str_or("notes_col", "client_notes")?;

        let notes: Vec<String> = table
            .text_column(&notes_col)?
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect();
        let scores = positive_scores(self.classifier.as_ref(), &notes)?;
        let order = ascending_order(&scores);

        let ids = table.take_column(&id_col, &order)?;
        let sorted_notes: ArrayRef = Arc::new(
            order
                .iter()
                .map(|i| Some(notes[*i as usize].as_str()))
                .collect::<StringArray>(),
        );
        let confidence: ArrayRef = Arc::new(
            order
                .iter()
                .map(|i| Some(round_to(scores[*i as usize], 2)))
                .collect::<Float64Array>(),
        );

        Ok(MetricOutput::Table(TabularTable::from_columns(vec![
            (id_col, ids),
            (notes_col, sorted_notes),
            ("Confidence Score".to_string(), confidence),
        ])?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{keyword_classifier, notes_table};

    #[tokio::test]
    async fn test_notes_scored_and_sorted() {
        let metric = ClassifyClientNotes::new(keyword_classifier());
        let output = metric
            .calculate_in_memory(&notes_table(), &MetricParams::new())
            .await
            .unwrap();
        let table = output.as_table().unwrap();

        assert_eq!(
            table.column_names(),
            vec!["id", "client_notes", "Confidence Score"]
        );
        assert_eq!(table.num_rows(), 4);
        let notes = table.text_column("client_notes").unwrap();
        // Highest confidence last; the missing note became empty text.
        assert_eq!(notes[3].as_deref(), Some("Customer deceased, notified by family"));
        assert!(notes.contains(&Some(String::new())));
    }
}
