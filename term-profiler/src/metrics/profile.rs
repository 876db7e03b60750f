//! Per-column profiling.
//!
//! The in-memory profile has one row per input column and the columns below,
//! in this (lexical) order. The numeric statistics are null for non-numeric
//! columns and are left out entirely when the table has no numeric column.
//!
//! | Column | Content |
//! |--------|---------|
//! | `01. Column Name` | input column name |
//! | `02. Data Type` | Arrow data type |
//! | `03. Row Count` | rows in the table |
//! | `04. Nulls` | missing cells (NaN counts as missing) |
//! | `05. Non-Nulls` | present cells |
//! | `06. No. Unique Values` | distinct present values |
//! | `07. Average Value` .. `13. 75%` | mean, sample std, min, max, quartiles |
//! | `histogram_json` | chart payload, when `incl_graph` is set |

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use async_trait::async_trait;
use datafusion::scalar::ScalarValue;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::chart::{ColumnCounts, Figure};
use crate::error::{ProfilerError, Result};
use crate::metric::{DisplayEntry, MetricKind, MetricOutput, MetricParams};
use crate::stats::{column_moments, quantile_sorted, Moments};
use crate::table::{distinct_count, float_values, is_text_type, text_values, TabularTable};
use crate::view::{require_table_identity, QueryParams, QueryableView};

pub const COLUMN_NAME: &str = "01. Column Name";
pub const DATA_TYPE: &str = "02. Data Type";
pub const ROW_COUNT: &str = "03. Row Count";
pub const NULLS: &str = "04. Nulls";
pub const NON_NULLS: &str = "05. Non-Nulls";
pub const UNIQUE_VALUES: &str = "06. No. Unique Values";
pub const AVERAGE: &str = "07. Average Value";
pub const STD_DEV: &str = "08. Standard Deviation";
pub const MINIMUM: &str = "09. Minimum";
pub const MAXIMUM: &str = "10. Maximum";
pub const Q25: &str = "11. 25%";
pub const Q50: &str = "12. 50%";
pub const Q75: &str = "13. 75%";
pub const HISTOGRAM_JSON: &str = "histogram_json";

/// Text columns with more distinct values than this get a bar chart of
/// counts instead of a histogram.
const BAR_CHART_MIN_DISTINCT: u64 = 50;

#[derive(Debug, Clone, Copy, Default)]
struct NumericSummary {
    mean: Option<f64>,
    std: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
    q25: Option<f64>,
    q50: Option<f64>,
    q75: Option<f64>,
}

impl NumericSummary {
    fn new(moments: Moments, values: &[Option<f64>]) -> Self {
        let mut present: Vec<f64> = values.iter().flatten().copied().collect();
        present.sort_by(f64::total_cmp);
        Self {
            mean: moments.mean,
            std: moments.sample_std,
            min: moments.min,
            max: moments.max,
            q25: quantile_sorted(&present, 0.25),
            q50: quantile_sorted(&present, 0.5),
            q75: quantile_sorted(&present, 0.75),
        }
    }
}

/// Describes every numeric column; `None` for the others. Fails when there
/// is nothing numeric to describe.
async fn describe(table: &TabularTable) -> Result<Vec<Option<NumericSummary>>> {
    let numeric: Vec<ArrayRef> = table
        .batch()
        .columns()
        .iter()
        .filter(|array| array.data_type().is_numeric())
        .cloned()
        .collect();
    if numeric.is_empty() {
        return Err(ProfilerError::computation("no numeric columns to describe"));
    }
    let mut moments = column_moments(&numeric).await?.into_iter();

    table
        .batch()
        .columns()
        .iter()
        .map(|array| {
            if !array.data_type().is_numeric() {
                return Ok(None);
            }
            let column_moments = moments.next().unwrap_or_default();
            Ok(Some(NumericSummary::new(column_moments, &float_values(array)?)))
        })
        .collect()
}

fn chart_for(name: &str, array: &ArrayRef, counts: ColumnCounts) -> Result<String> {
    let figure = if is_text_type(array.data_type()) && counts.distinct > BAR_CHART_MIN_DISTINCT {
        Figure::count_bars(counts)
    } else if array.data_type().is_numeric() {
        let values = float_values(array)?
            .into_iter()
            .flatten()
            .map(Value::from)
            .collect();
        Figure::histogram(name, values)
    } else {
        let values = text_values(array)?
            .into_iter()
            .flatten()
            .map(Value::from)
            .collect();
        Figure::histogram(name, values)
    };
    figure.to_json()
}

/// Profiles every column of the table.
///
/// Parameters: `incl_graph` (default `true`) attaches `histogram_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicProfile;

impl BasicProfile {
    /// Builds the profile table.
    pub async fn profile(table: &TabularTable, incl_graph: bool) -> Result<TabularTable> {
        let schema = table.schema();
        let rows = table.num_rows() as u64;

        let mut names = Vec::new();
        let mut dtypes = Vec::new();
        let mut nulls = Vec::new();
        let mut non_nulls = Vec::new();
        let mut distinct = Vec::new();
        let mut charts = Vec::new();

        for (field, array) in schema.fields().iter().zip(table.batch().columns()) {
            let null_count = if array.data_type().is_numeric() {
                float_values(array)?.iter().filter(|v| v.is_none()).count() as u64
            } else {
                array.logical_null_count() as u64
            };
            let unique = if array.data_type().is_numeric() {
                float_values(array)?
                    .iter()
                    .flatten()
                    .map(|v| v.to_bits())
                    .collect::<HashSet<_>>()
                    .len() as u64
            } else {
                distinct_count(array)?
            };

            if incl_graph {
                let counts = ColumnCounts {
                    nulls: null_count,
                    non_nulls: rows - null_count,
                    total: rows,
                    distinct: unique,
                };
                charts.push(chart_for(field.name(), array, counts)?);
            }

            names.push(field.name().clone());
            dtypes.push(field.data_type().to_string());
            nulls.push(null_count as i64);
            non_nulls.push((rows - null_count) as i64);
            distinct.push(unique as i64);
        }

        let column_count = names.len();
        let mut columns: Vec<(&str, ArrayRef)> = vec![
            (COLUMN_NAME, Arc::new(StringArray::from(names)) as ArrayRef),
            (DATA_TYPE, Arc::new(StringArray::from(dtypes)) as ArrayRef),
            (
                ROW_COUNT,
                Arc::new(Int64Array::from(vec![rows as i64; column_count])) as ArrayRef,
            ),
            (NULLS, Arc::new(Int64Array::from(nulls)) as ArrayRef),
            (NON_NULLS, Arc::new(Int64Array::from(non_nulls)) as ArrayRef),
            (UNIQUE_VALUES, Arc::new(Int64Array::from(distinct)) as ArrayRef),
        ];

        match describe(table).await {
            Ok(summaries) => {
                let stat = |pick: fn(&NumericSummary) -> Option<f64>| -> ArrayRef {
                    Arc::new(
                        summaries
                            .iter()
                            .map(|s| s.as_ref().and_then(pick))
                            .collect::<Float64Array>(),
                    )
                };
                columns.push((AVERAGE, stat(|s| s.mean)));
                columns.push((STD_DEV, stat(|s| s.std)));
                columns.push((MINIMUM, stat(|s| s.min)));
                columns.push((MAXIMUM, stat(|s| s.max)));
                columns.push((Q25, stat(|s| s.q25)));
                columns.push((Q50, stat(|s| s.q50)));
                columns.push((Q75, stat(|s| s.q75)));
            }
            Err(ProfilerError::Computation(reason)) => {
                debug!(%reason, "Skipping numeric statistics");
            }
            Err(other) => return Err(other),
        }

        if incl_graph {
            columns.push((HISTOGRAM_JSON, Arc::new(StringArray::from(charts)) as ArrayRef));
        }

        TabularTable::from_columns(columns)
    }
}

#[async_trait]
impl MetricKind for BasicProfile {
    fn name(&self) -> &str {
        "basic_profile"
    }

    fn display(&self) -> Vec<DisplayEntry> {
        vec![DisplayEntry::label("Basic Profile")]
    }

    fn recognized_params(&self) -> &'static [&'static str] {
        &["incl_graph"]
    }

    #[instrument(skip(self, table, params), fields(columns = table.num_columns()))]
    async fn calculate_in_memory(
        &self,
        table: &TabularTable,
        params: &MetricParams,
    ) -> Result<MetricOutput> {
        let incl_graph = params.bool_or("incl_graph", true)?;
        Ok(MetricOutput::Table(Self::profile(table, incl_graph).await?))
    }

    /// Reads the column metadata of the view's table from
    /// `information_schema.columns`.
    #[instrument(skip(self, view, _params))]
    async fn calculate_over_view(
        &self,
        view: &dyn QueryableView,
        _params: &MetricParams,
    ) -> Result<MetricOutput> {
        let identity = require_table_identity(view, self.name())?;
        let mut params = QueryParams::new();
        params.insert(
            "db_name".to_string(),
            ScalarValue::Utf8(Some(identity.database.clone())),
        );
        params.insert(
            "table".to_string(),
            ScalarValue::Utf8(Some(identity.table.clone())),
        );
        let query = "SELECT * FROM information_schema.columns \
                     WHERE table_schema = $db_name AND table_name = $table \
                     ORDER BY ordinal_position";
        Ok(MetricOutput::Table(view.run_query(query, Some(&params)).await?))
    }
}

/// Read-side helpers over a profile table.
#[derive(Debug, Clone, Copy)]
pub struct ProfileView<'a> {
    profile: &'a TabularTable,
}

impl<'a> ProfileView<'a> {
    pub fn new(profile: &'a TabularTable) -> Self {
        Self { profile }
    }

    /// Name of the column holding profiled column names. Profiles read from
    /// `information_schema` use `column_name`.
    fn name_column(&self) -> &'static str {
        if self.profile.has_column(COLUMN_NAME) {
            COLUMN_NAME
        } else {
            "column_name"
        }
    }

    /// The profile row of one column as a JSON records string, floats
    /// rounded to `decimals` and null fields dropped.
    pub fn column_record(&self, column: &str, decimals: u32) -> Result<String> {
        let names = self.profile.text_column(self.name_column())?;
        let rows: Vec<u32> = names
            .iter()
            .enumerate()
            .filter(|(_, name)| name.as_deref() == Some(column))
            .map(|(i, _)| i as u32)
            .collect();
        if rows.is_empty() {
            return Err(ProfilerError::column_not_found(column));
        }
        self.profile
            .take_rows(&rows)?
            .round_floats(decimals)?
            .to_json_records()
    }

    /// The profile without chart payloads, floats rounded to `decimals`.
    pub fn tabular(&self, decimals: u32) -> Result<TabularTable> {
        self.profile
            .without_column(HISTOGRAM_JSON)?
            .round_floats(decimals)
    }
}
