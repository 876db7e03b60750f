//! Blank-cell counting.
//!
//! A cell is blank when it is null, holds the empty string or, in a float
//! column, holds NaN.

use arrow::array::{Array, ArrayRef};
use arrow::datatypes::DataType;
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::{ProfilerError, Result};
use crate::metric::{DisplayEntry, MetricKind, MetricOutput, MetricParams};
use crate::security::SqlSecurity;
use crate::table::{float_values, is_null_at, is_text_type, text_values, TabularTable};
use crate::view::QueryableView;

use super::{first_count, view_subquery};

const DEFAULT_DECIMALS: u64 = 2;
/// Digits an `f64` ratio can meaningfully carry.
const MAX_DECIMALS: u64 = 15;

/// Counts blank cells over the whole table.
///
/// Parameters:
/// - `pc` (default `true`): report `blanks / (rows * columns)` formatted as
///   `"{ratio:.dp}%"` instead of the raw count
/// - `dp` (default `2`, at most `15`): decimals of the formatted ratio
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalBlankCells;

impl TotalBlankCells {
    fn format_ratio(blanks: u64, cells: u64, decimals: usize) -> String {
        let ratio = if cells == 0 {
            0.0
        } else {
            blanks as f64 / cells as f64
        };
        format!("{ratio:.decimals$}%")
    }

    fn output(params: &MetricParams, blanks: u64, cells: u64) -> Result<MetricOutput> {
        if params.bool_or("pc", true)? {
            let decimals = params.u64_or("dp", DEFAULT_DECIMALS)?;
            if decimals > MAX_DECIMALS {
                return Err(ProfilerError::configuration(format!(
                    "dp must be at most {MAX_DECIMALS}, got {decimals}"
                )));
            }
            Ok(MetricOutput::Text(Self::format_ratio(
                blanks,
                cells,
                decimals as usize,
            )))
        } else {
            Ok(MetricOutput::Count(blanks))
        }
    }
}

fn blank_count(array: &ArrayRef) -> Result<u64> {
    if matches!(
        array.data_type(),
        DataType::Float16 | DataType::Float32 | DataType::Float64
    ) {
        return Ok(float_values(array)?.iter().filter(|v| v.is_none()).count() as u64);
    }
    if !is_text_type(array.data_type()) {
        return Ok(array.logical_null_count() as u64);
    }
    let values = text_values(array)?;
    Ok(values
        .iter()
        .enumerate()
        .filter(|(i, v)| is_null_at(array.as_ref(), *i) || v.as_deref() == Some(""))
        .count() as u64)
}

#[async_trait]
impl MetricKind for TotalBlankCells {
    fn name(&self) -> &str {
        "total_blank_cells"
    }

    fn display(&self) -> Vec<DisplayEntry> {
        vec![DisplayEntry::label("Total Blank Cells")
            .with_icon("fa-question")
            .with_colour("text-danger")]
    }

    fn recognized_params(&self) -> &'static [&'static str] {
        &["pc", "dp"]
    }

    async fn calculate_in_memory(
        &self,
        table: &TabularTable,
        params: &MetricParams,
    ) -> Result<MetricOutput> {
        let blanks = table
            .batch()
            .columns()
            .iter()
            .map(blank_count)
            .sum::<Result<u64>>()?;
        let cells = (table.num_rows() * table.num_columns()) as u64;
        Self::output(params, blanks, cells)
    }

    #[instrument(skip(self, view, params))]
    async fn calculate_over_view(
        &self,
        view: &dyn QueryableView,
        params: &MetricParams,
    ) -> Result<MetricOutput> {
        let columns = view.column_names();
        let mut terms = Vec::with_capacity(columns.len());
        for column in columns {
            let quoted = SqlSecurity::quote_identifier(column)?;
            terms.push(format!(
                "sum(CASE WHEN {quoted} IS NULL OR CAST({quoted} AS VARCHAR) = '' THEN 1 ELSE 0 END)"
            ));
        }
        let blanks_expr = if terms.is_empty() {
            "0".to_string()
        } else {
            terms
                .iter()
                .map(|t| format!("coalesce({t}, 0)"))
                .collect::<Vec<_>>()
                .join(" + ")
        };
        let query = format!(
            "SELECT {blanks_expr} AS total_blanks, count(*) AS row_count FROM {}",
            view_subquery(view)
        );
        debug!(columns = columns.len(), "Counting blank cells over view");

        let result = view.run_query(&query, view.main_params()).await?;
        let blanks = first_count(&result, "total_blanks")?;
        let rows = first_count(&result, "row_count")?;
        Self::output(params, blanks, rows * columns.len() as u64)
    }
}
