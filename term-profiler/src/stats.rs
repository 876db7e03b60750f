//! Numeric summaries and small text helpers shared by the metric
//! implementations.
//!
//! Means, standard deviations and extrema are computed by DataFusion
//! aggregates over a single-partition session holding the values to
//! summarise. NaN is treated as missing, as everywhere else in the crate.
//! Quartiles use linear interpolation between the two closest ranks; DataFusion
//! only offers `approx_percentile_cont`, whose t-digest estimate drifts from
//! the interpolated value on small columns, so [`quantile_sorted`] stays here.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::prelude::SessionContext;
use tracing::{debug, instrument};

use crate::context::ProfilerContextConfig;
use crate::error::Result;
use crate::table::{float_values, TabularTable};

const SUMMARY_TABLE: &str = "summarised";

/// Aggregates of one numeric column. Every field is `None` when the column
/// has no present value; `sample_std` also needs at least two.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    pub mean: Option<f64>,
    pub sample_std: Option<f64>,
    pub population_std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Moments {
    const SELECT: &'static str = "avg({c}) AS {c}_mean, stddev_samp({c}) AS {c}_std, \
         stddev_pop({c}) AS {c}_pop_std, min({c}) AS {c}_min, max({c}) AS {c}_max";

    fn select(column: &str) -> String {
        Self::SELECT.replace("{c}", column)
    }

    fn read(result: &TabularTable, row: usize, column: &str) -> Result<Self> {
        let value = |suffix: &str| -> Result<Option<f64>> {
            Ok(result
                .float_column(&format!("{column}_{suffix}"))?
                .get(row)
                .copied()
                .flatten())
        };
        Ok(Self {
            mean: value("mean")?,
            sample_std: value("std")?,
            population_std: value("pop_std")?,
            min: value("min")?,
            max: value("max")?,
        })
    }
}

fn float_field(name: &str) -> Field {
    Field::new(name, DataType::Float64, true)
}

/// NaN-free `Float64` copy of a numeric column.
fn present_floats(array: &ArrayRef) -> Result<ArrayRef> {
    Ok(Arc::new(
        float_values(array)?.into_iter().collect::<Float64Array>(),
    ))
}

async fn aggregate(batch: RecordBatch, query: &str) -> Result<TabularTable> {
    let ctx: SessionContext = ProfilerContextConfig::default()
        .with_target_partitions(1)
        .build_session();
    ctx.register_batch(SUMMARY_TABLE, batch)?;
    let df = ctx.sql(query).await?;
    let schema = df.schema().inner().clone();
    TabularTable::from_batches(schema, df.collect().await?)
}

/// Summarises each numeric column, in order.
#[instrument(skip(columns), fields(count = columns.len()))]
pub async fn column_moments(columns: &[ArrayRef]) -> Result<Vec<Moments>> {
    if columns.is_empty() {
        return Ok(Vec::new());
    }
    let names: Vec<String> = (0..columns.len()).map(|i| format!("c{i}")).collect();
    let fields: Vec<Field> = names.iter().map(|n| float_field(n)).collect();
    let arrays = columns
        .iter()
        .map(present_floats)
        .collect::<Result<Vec<_>>>()?;
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;

    let selects: Vec<String> = names.iter().map(|n| Moments::select(n)).collect();
    let query = format!("SELECT {} FROM {SUMMARY_TABLE}", selects.join(", "));
    let result = aggregate(batch, &query).await?;
    names
        .iter()
        .map(|name| Moments::read(&result, 0, name))
        .collect()
}

/// Summarises `values` per distinct `keys` entry. Rows with a missing value
/// are ignored; a missing key forms its own group.
#[instrument(skip(keys, values), fields(rows = keys.len()))]
pub async fn grouped_moments(
    keys: &[Option<String>],
    values: &[Option<f64>],
) -> Result<HashMap<Option<String>, Moments>> {
    let schema = Schema::new(vec![
        Field::new("k", DataType::Utf8, true),
        float_field("v"),
    ]);
    let batch = RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(keys.iter().map(Option::as_deref).collect::<StringArray>()) as ArrayRef,
            Arc::new(values.iter().copied().collect::<Float64Array>()) as ArrayRef,
        ],
    )?;
    let query = format!(
        "SELECT k, {} FROM {SUMMARY_TABLE} WHERE v IS NOT NULL GROUP BY k",
        Moments::select("v")
    );
    let result = aggregate(batch, &query).await?;
    let group_keys = result.text_column("k")?;
    debug!(groups = group_keys.len(), "Grouped moments complete");
    group_keys
        .into_iter()
        .enumerate()
        .map(|(row, key)| Ok((key, Moments::read(&result, row, "v")?)))
        .collect()
}

/// Quantile of an ascending slice using linear interpolation between the
/// two closest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Rounds half away from zero to the given number of decimals.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Removes every non-ASCII character.
pub fn strip_non_ascii(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

/// True when the text has at least one cased character and no lowercase ones.
pub fn is_upper_case(text: &str) -> bool {
    let mut has_cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}
