//! Grouped z-score anomaly detection.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::{ProfilerError, Result};
use crate::metric::{DisplayEntry, MetricKind, MetricOutput, MetricParams};
use crate::stats::{grouped_moments, round_to, strip_non_ascii};
use crate::table::TabularTable;

/// Two-tailed critical values by confidence level.
const CRITICAL_VALUES: &[(f64, f64)] = &[(0.99, 2.33), (0.95, 1.645)];

/// Looks up the critical z value for a confidence level.
pub fn critical_value(confidence: f64) -> Result<f64> {
    CRITICAL_VALUES
        .iter()
        .find(|(level, _)| (level - confidence).abs() < 1e-9)
        .map(|(_, critical)| *critical)
        .ok_or_else(|| {
            ProfilerError::configuration(format!(
                "confidence level must be 0.95 or 0.99, got {confidence}"
            ))
        })
}

/// Flags values that sit far from their group's mean.
///
/// Rows are grouped by `group_key` (default `card_type`, compared as text
/// with non-ASCII characters removed). Within each group the mean and
/// population standard deviation of `group_value` (default `credit_rate`)
/// are computed and a row is flagged when `|value - mean| / std` exceeds the
/// critical value for `conf` (default `0.99`; `confidence_level` is accepted
/// as an alias). Groups with zero spread never flag.
///
/// Output columns: id, group key, `avg` (group mean, 2 dp), value.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupedZScore;

impl GroupedZScore {
    fn confidence(params: &MetricParams) -> Result<f64> {
        match params.get("conf") {
            Some(_) => params.f64_or("conf", 0.99),
            None => params.f64_or("confidence_level", 0.99),
        }
    }
}

#[async_trait]
impl MetricKind for GroupedZScore {
    fn name(&self) -> &str {
        "grouped_z_score"
    }

    fn display(&self) -> Vec<DisplayEntry> {
        vec![DisplayEntry::label("Anomaly Detection")]
    }

    fn recognized_params(&self) -> &'static [&'static str] {
        &["id_col", "group_key", "group_value", "conf", "confidence_level"]
    }

    #[instrument(skip(self, table, params))]
    async fn calculate_in_memory(
        &self,
        table: &TabularTable,
        params: &MetricParams,
    ) -> Result<MetricOutput> {
        let id_col = params.str_or("id_col", "id")?;
        let group_key = params.str_or("group_key", "card_type")?;
        let group_value = params.str_or("group_value", "credit_rate")?;
        let critical = critical_value(Self::confidence(params)?)?;

        let keys: Vec<Option<String>> = table
            .text_column(&group_key)?
            .into_iter()
            .map(|k| k.map(|k| strip_non_ascii(&k)))
            .collect();
        let values = table.float_column(&group_value)?;

        let stats = grouped_moments(&keys, &values).await?;

        let mut flagged = Vec::new();
        let mut averages = Vec::new();
        for (row, (key, value)) in keys.iter().zip(&values).enumerate() {
            let (Some(v), Some(group)) = (value, stats.get(key)) else {
                continue;
            };
            let (Some(mean), Some(std)) = (group.mean, group.population_std.filter(|s| *s > 0.0))
            else {
                continue;
            };
            if (v - mean).abs() / std > critical {
                flagged.push(row as u32);
                averages.push(round_to(mean, 2));
            }
        }
        debug!(
            groups = stats.len(),
            flagged = flagged.len(),
            critical,
            "Grouped z-score complete"
        );

        let flagged_keys: ArrayRef = Arc::new(
            flagged
                .iter()
                .map(|i| keys[*i as usize].as_deref())
                .collect::<StringArray>(),
        );
        Ok(MetricOutput::Table(TabularTable::from_columns(vec![
            (id_col.clone(), table.take_column(&id_col, &flagged)?),
            (group_key, flagged_keys),
            ("avg".to_string(), Arc::new(Float64Array::from(averages)) as ArrayRef),
            (group_value.clone(), table.take_column(&group_value, &flagged)?),
        ])?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::cards_table;

    async fn flagged_ids(conf: f64) -> Vec<Option<f64>> {
        let params = MetricParams::new().with("conf", conf);
        let output = GroupedZScore
            .calculate_in_memory(&cards_table(), &params)
            .await
            .unwrap();
        output.as_table().unwrap().float_column("id").unwrap()
    }

    #[test]
    fn test_critical_values() {
        assert_eq!(critical_value(0.99).unwrap(), 2.33);
        assert_eq!(critical_value(0.95).unwrap(), 1.645);
        assert!(matches!(
            critical_value(0.9),
            Err(ProfilerError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_flags_outlier_within_group() {
        let output = GroupedZScore
            .calculate_in_memory(&cards_table(), &MetricParams::new())
            .await
            .unwrap();
        let table = output.as_table().unwrap();
        assert_eq!(
            table.column_names(),
            vec!["id", "card_type", "avg", "credit_rate"]
        );
        assert_eq!(table.float_column("id").unwrap(), vec![Some(11.0)]);
        assert_eq!(
            table.text_column("card_type").unwrap(),
            vec![Some("Gold".to_string())]
        );
        assert_eq!(table.float_column("avg").unwrap(), vec![Some(11.82)]);
    }

    #[tokio::test]
    async fn test_lower_confidence_flags_superset() {
        let strict = flagged_ids(0.99).await;
        let loose = flagged_ids(0.95).await;
        assert!(strict.iter().all(|id| loose.contains(id)));
        assert!(loose.len() >= strict.len());
    }

    #[tokio::test]
    async fn test_confidence_alias_and_invalid_level() {
        let params = MetricParams::new().with("confidence_level", 0.5);
        let result = GroupedZScore
            .calculate_in_memory(&cards_table(), &params)
            .await;
        assert!(matches!(result, Err(ProfilerError::Configuration(_))));
    }
}
