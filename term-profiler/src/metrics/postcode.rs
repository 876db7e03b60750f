//! UK postcode validation.

use arrow::array::BooleanArray;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::metric::{DisplayEntry, MetricKind, MetricOutput, MetricParams};
use crate::table::TabularTable;

/// UK postcode grammar, anchored at the start of the value only: `GIR 0AA`,
/// outward code + optional space + inward code, or five digits.
static UK_POSTCODE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(concat!(
        r"^(?:([Gg][Ii][Rr] 0[Aa]{2})",
        r"|((([A-Za-z][0-9]{1,2})|(([A-Za-z][A-Ha-hJ-Yj-y][0-9]{1,2})",
        r"|(([A-Za-z][0-9][A-Za-z])|([A-Za-z][A-Ha-hJ-Yj-y][0-9][A-Za-z]?))))\s?[0-9][A-Za-z]{2})",
        r"|([0-9][0-9][0-9][0-9][0-9]))",
    ))
    .expect("Hard-coded regex pattern should be valid")
});

/// True when `value` starts with a well-formed UK postcode.
pub fn is_valid_postcode(value: &str) -> bool {
    UK_POSTCODE.is_match(value)
}

/// Returns the rows whose postcode does not match the UK grammar.
///
/// Parameters: `id_col` (default `id`), `postcd_col` (default `postcode`).
/// Null postcodes are invalid. Output columns are the id and postcode columns,
/// rows in input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractBadPostcode;

#[async_trait]
impl MetricKind for ExtractBadPostcode {
    fn name(&self) -> &str {
        "extract_bad_postcode"
    }

    fn display(&self) -> Vec<DisplayEntry> {
        vec![DisplayEntry::label("Extract Bad Postcode")]
    }

    fn recognized_params(&self) -> &'static [&'static str] {
        &["id_col", "postcd_col"]
    }

    async fn calculate_in_memory(
        &self,
        table: &TabularTable,
        params: &MetricParams,
    ) -> Result<MetricOutput> {
        let id_col = params.str_or("id_col", "id")?;
        let postcode_col = params.str_or("postcd_col", "postcode")?;
        let id_values = table.column(&id_col)?.clone();

        let invalid: BooleanArray = table
            .text_column(&postcode_col)?
            .iter()
            .map(|value| Some(!value.as_deref().is_some_and(is_valid_postcode)))
            .collect();
        debug!(
            invalid = invalid.true_count(),
            rows = table.num_rows(),
            "Validated postcodes"
        );

        let projected = TabularTable::from_columns(vec![
            (id_col, id_values),
            (postcode_col.clone(), table.column(&postcode_col)?.clone()),
        ])?;
        Ok(MetricOutput::Table(projected.filter_rows(&invalid)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use std::sync::Arc;

    #[test]
    fn test_postcode_grammar() {
        for valid in ["SE21 0AA", "SE210AA", "RG44RF", "GIR 0AA", "W1A 1AA", "90210", "ec1a1bb"] {
            assert!(is_valid_postcode(valid), "{valid} should be valid");
        }
        for invalid in ["DDDDDD", "453", "@2BG", "", " SE21 0AA"] {
            assert!(!is_valid_postcode(invalid), "{invalid} should be invalid");
        }
        // Only the start of the value is checked.
        assert!(is_valid_postcode("RG44RF trailing text"));
    }

    #[tokio::test]
    async fn test_extracts_invalid_rows_in_order() {
        let table = TabularTable::from_columns(vec![
            ("id", Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5, 6])) as ArrayRef),
            (
                "postcode",
                Arc::new(StringArray::from(vec![
                    Some("DDDDDD"),
                    Some("SE210AA"),
                    Some("RG44RF"),
                    Some("453"),
                    Some("@2BG"),
                    None,
                ])) as ArrayRef,
            ),
            ("other", Arc::new(Int64Array::from(vec![0; 6])) as ArrayRef),
        ])
        .unwrap();

        let output = ExtractBadPostcode
            .calculate_in_memory(&table, &MetricParams::new())
            .await
            .unwrap();
        let bad = output.as_table().unwrap();
        assert_eq!(bad.column_names(), vec!["id", "postcode"]);
        assert_eq!(
            bad.float_column("id").unwrap(),
            vec![Some(1.0), Some(4.0), Some(5.0), Some(6.0)]
        );
    }

    #[tokio::test]
    async fn test_missing_column() {
        let table = TabularTable::from_columns(vec![(
            "id",
            Arc::new(Int64Array::from(vec![1])) as ArrayRef,
        )])
        .unwrap();
        let result = ExtractBadPostcode
            .calculate_in_memory(&table, &MetricParams::new().with("postcd_col", "zip"))
            .await;
        assert!(matches!(
            result,
            Err(crate::error::ProfilerError::ColumnNotFound { .. })
        ));
    }
}
