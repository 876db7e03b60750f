//! Duplicate-row detection.

use async_trait::async_trait;
use tracing::instrument;

use crate::error::Result;
use crate::metric::{DisplayEntry, MetricKind, MetricOutput, MetricParams};
use crate::security::SqlSecurity;
use crate::table::TabularTable;
use crate::view::QueryableView;

use super::{first_count, view_subquery};

/// Counts repeated rows.
///
/// In memory, every row whose full value tuple already appeared earlier is
/// counted. Over a view, the count is the number of distinct tuples that occur
/// more than once.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateRows;

#[async_trait]
impl MetricKind for DuplicateRows {
    fn name(&self) -> &str {
        "duplicate_rows"
    }

    fn display(&self) -> Vec<DisplayEntry> {
        vec![DisplayEntry::label("Duplicate Rows")
            .with_icon("fa-clone")
            .with_colour("text-warning")]
    }

    fn recognized_params(&self) -> &'static [&'static str] {
        &[]
    }

    async fn calculate_in_memory(
        &self,
        table: &TabularTable,
        _params: &MetricParams,
    ) -> Result<MetricOutput> {
        Ok(MetricOutput::Count(table.duplicate_row_count()?))
    }

    #[instrument(skip(self, view, _params))]
    async fn calculate_over_view(
        &self,
        view: &dyn QueryableView,
        _params: &MetricParams,
    ) -> Result<MetricOutput> {
        if view.column_names().is_empty() {
            return Ok(MetricOutput::Count(0));
        }
        let columns = SqlSecurity::column_list(view.column_names())?;
        let query = format!(
            "SELECT count(*) AS duplicate_groups FROM (\
             SELECT {columns} FROM {} GROUP BY {columns} HAVING count(*) > 1\
             ) AS duplicated",
            view_subquery(view)
        );
        let result = view.run_query(&query, view.main_params()).await?;
        Ok(MetricOutput::Count(first_count(&result, "duplicate_groups")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProfilerContextConfig;
    use crate::view::DataFusionView;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use std::sync::Arc;

    fn orders() -> TabularTable {
        TabularTable::from_columns(vec![
            ("sku", Arc::new(Int64Array::from(vec![1, 1, 2, 1, 3, 3])) as ArrayRef),
            (
                "region",
                Arc::new(StringArray::from(vec![
                    Some("N"),
                    Some("N"),
                    Some("S"),
                    Some("N"),
                    None,
                    None,
                ])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_counts_every_repeat() {
        let output = DuplicateRows
            .calculate_in_memory(&orders(), &MetricParams::new())
            .await
            .unwrap();
        // (1, N) repeats twice, (3, null) once.
        assert_eq!(output, MetricOutput::Count(3));
    }

    #[tokio::test]
    async fn test_view_counts_duplicated_groups() {
        let ctx = ProfilerContextConfig::default().build_session();
        ctx.register_batch("orders", orders().into_batch()).unwrap();
        let view = DataFusionView::builder(ctx)
            .table("public", "orders")
            .build()
            .await
            .unwrap();

        let output = DuplicateRows
            .calculate_over_view(&view, &MetricParams::new())
            .await
            .unwrap();
        assert_eq!(output, MetricOutput::Count(2));
    }
}
