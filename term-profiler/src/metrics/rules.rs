//! Data-rule extraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::metric::{DisplayEntry, MetricKind, MetricOutput, MetricParams};
use crate::table::TabularTable;

const RULES: &[&str] = &[
    r#""user_id" is unique"#,
    r#""Email_Address" is unique"#,
    r#""product_start_date" contains 94.9% null values"#,
    r#""dob" can be transformed to exactly match "cleaned_dob" with the following transformation: "Remove elements 2 & 5""#,
    r#""gender" takes the values ("M","F")"#,
    r#""dob" is between "01/01/1950" and "31/12/2001""#,
];

const INFERRED_RULES: &[&str] = &[
    r#"Rows with "Student Credit Card" are 81.5% likely to have "Interest-only Mortgage""#,
    r#"Rows with "Fixed-rate Mortgage" are 74.3% likely to have "Classic Credit Card""#,
    r#""ENGLAND" and "UNITED KINGDOM" always imply "GB" - storage space could be saved by normalising"#,
];

/// Rule strings describing the dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRulesReport {
    /// Hand-authored rules.
    pub rules: Vec<String>,
    /// Rules inferred from correlations between values.
    pub inferred_rules: Vec<String>,
}

/// Reports the curated rule set for the dataset.
///
/// The report is fixed; the table is not inspected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractDataRules;

#[async_trait]
impl MetricKind for ExtractDataRules {
    fn name(&self) -> &str {
        "extract_data_rules"
    }

    fn display(&self) -> Vec<DisplayEntry> {
        vec![DisplayEntry::label("Extract Data Rules")]
    }

    fn recognized_params(&self) -> &'static [&'static str] {
        &[]
    }

    async fn calculate_in_memory(
        &self,
        _table: &TabularTable,
        _params: &MetricParams,
    ) -> Result<MetricOutput> {
        Ok(MetricOutput::Rules(DataRulesReport {
            rules: RULES.iter().map(|r| r.to_string()).collect(),
            inferred_rules: INFERRED_RULES.iter().map(|r| r.to_string()).collect(),
        }))
    }
}
