//! Row and column counts.

use async_trait::async_trait;
use tracing::instrument;

use crate::error::Result;
use crate::metric::{DisplayEntry, MetricKind, MetricOutput, MetricParams};
use crate::table::TabularTable;
use crate::view::QueryableView;

use super::{first_count, view_subquery};

/// Reports `(row_count, column_count)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalRowsCols;

#[async_trait]
impl MetricKind for TotalRowsCols {
    fn name(&self) -> &str {
        "total_rows_cols"
    }

    fn display(&self) -> Vec<DisplayEntry> {
        vec![
            DisplayEntry::label("Total Rows")
                .with_icon("fa-table")
                .with_colour("text-success"),
            DisplayEntry::label("Total Columns")
                .with_icon("fa-columns")
                .with_colour("text-info"),
        ]
    }

    fn recognized_params(&self) -> &'static [&'static str] {
        &[]
    }

    async fn calculate_in_memory(
        &self,
        table: &TabularTable,
        _params: &MetricParams,
    ) -> Result<MetricOutput> {
        Ok(MetricOutput::Dimensions {
            rows: table.num_rows() as u64,
            columns: table.num_columns() as u64,
        })
    }

    #[instrument(skip(self, view, _params))]
    async fn calculate_over_view(
        &self,
        view: &dyn QueryableView,
        _params: &MetricParams,
    ) -> Result<MetricOutput> {
        let query = format!("SELECT count(*) AS row_count FROM {}", view_subquery(view));
        let result = view.run_query(&query, view.main_params()).await?;
        Ok(MetricOutput::Dimensions {
            rows: first_count(&result, "row_count")?,
            columns: view.column_names().len() as u64,
        })
    }
}
