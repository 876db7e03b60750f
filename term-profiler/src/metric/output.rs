//! Result shapes produced by metrics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metrics::rules::DataRulesReport;
use crate::table::TabularTable;

/// A scalar shown on a headline card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum MetricValue {
    /// A floating-point value (e.g., a ratio).
    Double(f64),

    /// An integer value (e.g., a count).
    Long(i64),

    /// A preformatted value (e.g., `"12.50%"` or `"10/21"`).
    String(String),

    Boolean(bool),
}

impl MetricValue {
    /// Checks if the value is numeric (Double or Long).
    pub fn is_numeric(&self) -> bool {
        matches!(self, MetricValue::Double(_) | MetricValue::Long(_))
    }

    /// Attempts to get the numeric value as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Double(v) => Some(*v),
            MetricValue::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetricValue::Long(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Double(v) if v.fract() == 0.0 => write!(f, "{v:.0}"),
            MetricValue::Double(v) => write!(f, "{v:.4}"),
            MetricValue::Long(v) => write!(f, "{v}"),
            MetricValue::String(s) => write!(f, "{s}"),
            MetricValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        MetricValue::Long(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        MetricValue::from(v as u64)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Double(v)
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        MetricValue::String(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::String(v.to_string())
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Boolean(v)
    }
}

/// What a metric invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricOutput {
    /// A single count.
    Count(u64),

    /// Preformatted text, e.g. a percentage.
    Text(String),

    /// Row and column counts of the dataset.
    Dimensions { rows: u64, columns: u64 },

    /// A result table.
    Table(TabularTable),

    /// Extracted data rules.
    Rules(DataRulesReport),
}

impl MetricOutput {
    pub fn as_table(&self) -> Option<&TabularTable> {
        match self {
            MetricOutput::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<u64> {
        match self {
            MetricOutput::Count(count) => Some(*count),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetricOutput::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_rules(&self) -> Option<&DataRulesReport> {
        match self {
            MetricOutput::Rules(report) => Some(report),
            _ => None,
        }
    }

    /// Short name of the output shape, used in logs and errors.
    pub fn shape(&self) -> &'static str {
        match self {
            MetricOutput::Count(_) => "count",
            MetricOutput::Text(_) => "text",
            MetricOutput::Dimensions { .. } => "dimensions",
            MetricOutput::Table(_) => "table",
            MetricOutput::Rules(_) => "rules",
        }
    }

    /// The values this output contributes to a headline card, one per
    /// display entry of a well-formed metric.
    pub fn headline_values(&self) -> Vec<MetricValue> {
        match self {
            MetricOutput::Count(count) => vec![MetricValue::from(*count)],
            MetricOutput::Text(text) => vec![MetricValue::String(text.clone())],
            MetricOutput::Dimensions { rows, columns } => {
                vec![MetricValue::from(*rows), MetricValue::from(*columns)]
            }
            MetricOutput::Table(table) => vec![MetricValue::from(table.num_rows())],
            MetricOutput::Rules(report) => vec![MetricValue::from(report.rules.len())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headline_values() {
        let dims = MetricOutput::Dimensions { rows: 10, columns: 3 };
        assert_eq!(
            dims.headline_values(),
            vec![MetricValue::Long(10), MetricValue::Long(3)]
        );
        assert_eq!(
            MetricOutput::Text("1.50%".into()).headline_values(),
            vec![MetricValue::String("1.50%".into())]
        );
        assert_eq!(MetricOutput::Count(4).as_count(), Some(4));
        assert!(MetricOutput::Count(4).as_table().is_none());
    }

    #[test]
    fn test_metric_value_display() {
        assert_eq!(MetricValue::Double(2.0).to_string(), "2");
        assert_eq!(MetricValue::Double(0.123456).to_string(), "0.1235");
        assert_eq!(MetricValue::from("10/21").to_string(), "10/21");
        assert!(MetricValue::Long(3).is_numeric());
        assert_eq!(MetricValue::Long(3).as_f64(), Some(3.0));
    }
}
