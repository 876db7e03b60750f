//! Built-in metric kinds.
//!
//! | Kind | In-memory | Queryable view |
//! |------|-----------|----------------|
//! | [`BasicProfile`] | per-column profile | `information_schema.columns` |
//! | [`TotalBlankCells`] | null or empty cells | aggregation query |
//! | [`TotalRowsCols`] | `(rows, columns)` | `count(*)` query |
//! | [`DuplicateRows`] | repeated rows | grouped `HAVING count(*) > 1` |
//! | [`ExtractBadPostcode`] | UK postcode grammar | - |
//! | [`DetectBadAddress`] | classifier score | - |
//! | [`ClassifyClientNotes`] | classifier score | - |
//! | [`GroupedZScore`] | per-group z-score | - |
//! | [`SupervisedAnomalyDetection`] | regression error | - |
//! | [`ExtractDataRules`] | static report | - |
//! | [`ExtractPIIAttributes`] | static ratio | - |

pub mod address;
pub mod blanks;
pub mod duplicates;
pub mod notes;
pub mod pii;
pub mod postcode;
pub mod profile;
pub mod rules;
pub mod shape;
pub mod supervised;
pub mod zscore;

pub use address::DetectBadAddress;
pub use blanks::TotalBlankCells;
pub use duplicates::DuplicateRows;
pub use notes::ClassifyClientNotes;
pub use pii::ExtractPIIAttributes;
pub use postcode::ExtractBadPostcode;
pub use profile::{BasicProfile, ProfileView};
pub use rules::{DataRulesReport, ExtractDataRules};
pub use shape::TotalRowsCols;
pub use supervised::SupervisedAnomalyDetection;
pub use zscore::GroupedZScore;

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Int64Type};

use crate::error::{ProfilerError, Result};
use crate::table::TabularTable;
use crate::view::QueryableView;

/// Reads the first value of an integer-like result column. An empty result or
/// a null cell (e.g. `sum` over zero rows) reads as zero.
pub(crate) fn first_i64(table: &TabularTable, column: &str) -> Result<i64> {
    let array = cast(table.column(column)?, &DataType::Int64)?;
    if array.is_empty() || array.is_null(0) {
        return Ok(0);
    }
    Ok(array.as_primitive::<Int64Type>().value(0))
}

/// Reads a count from a query result, rejecting negative values.
pub(crate) fn first_count(table: &TabularTable, column: &str) -> Result<u64> {
    let value = first_i64(table, column)?;
    u64::try_from(value)
        .map_err(|_| ProfilerError::computation(format!("negative count {value} in '{column}'")))
}

/// Wraps the view's main query so aggregations can select from it.
pub(crate) fn view_subquery(view: &dyn QueryableView) -> String {
    format!("({}) AS view_rows", view.main_query())
}
