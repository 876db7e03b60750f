//! Chart payloads attached to column profiles.
//!
//! Figures serialize to the JSON shape plotly.js accepts directly:
//! `{"data": [trace, ...], "layout": {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Number of bins used for per-column histograms.
pub const HISTOGRAM_BINS: usize = 75;

/// A plotly figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

/// A single plotly trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Bar {
        x: Vec<String>,
        y: Vec<u64>,
    },
    Histogram {
        name: String,
        x: Vec<Value>,
        nbinsx: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub xaxis: Axis,
    pub yaxis: Axis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub title: AxisTitle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisTitle {
    pub text: String,
}

impl Axis {
    fn titled(text: impl Into<String>) -> Self {
        Self {
            title: AxisTitle { text: text.into() },
        }
    }
}

/// Counts shown for high-cardinality text columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnCounts {
    pub nulls: u64,
    pub non_nulls: u64,
    pub total: u64,
    pub distinct: u64,
}

impl Figure {
    /// Bar chart of a column's null, non-null, total and distinct counts.
    pub fn count_bars(counts: ColumnCounts) -> Self {
        Self {
            data: vec![Trace::Bar {
                x: vec![
                    "Null Values".to_string(),
                    "Total Non-Null Values".to_string(),
                    "Total Values inc. Nulls".to_string(),
                    "Distinct Values".to_string(),
                ],
                y: vec![counts.nulls, counts.non_nulls, counts.total, counts.distinct],
            }],
            layout: Layout {
                xaxis: Axis::titled("col_names"),
                yaxis: Axis::titled("value"),
            },
        }
    }

    /// Histogram of a column's raw values.
    pub fn histogram(column: &str, values: Vec<Value>) -> Self {
        Self {
            data: vec![Trace::Histogram {
                name: column.to_string(),
                x: values,
                nbinsx: HISTOGRAM_BINS,
            }],
            layout: Layout {
                xaxis: Axis::titled(column),
                yaxis: Axis::titled("count"),
            },
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bar_chart_shape() {
        let figure = Figure::count_bars(ColumnCounts {
            nulls: 1,
            non_nulls: 99,
            total: 100,
            distinct: 60,
        });
        let value = figure.to_value().unwrap();
        assert_eq!(value["data"][0]["type"], "bar");
        assert_eq!(value["data"][0]["y"], json!([1, 99, 100, 60]));
        assert_eq!(value["layout"]["yaxis"]["title"]["text"], "value");
    }

    #[test]
    fn test_histogram_shape() {
        let figure = Figure::histogram("age", vec![json!(31), json!(45)]);
        let parsed: Value = serde_json::from_str(&figure.to_json().unwrap()).unwrap();
        assert_eq!(parsed["data"][0]["type"], "histogram");
        assert_eq!(parsed["data"][0]["nbinsx"], 75);
        assert_eq!(parsed["data"][0]["x"], json!([31, 45]));
    }
}
