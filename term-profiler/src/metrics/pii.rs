//! PII attribute summary.

use async_trait::async_trait;

use crate::error::Result;
use crate::metric::{DisplayEntry, MetricKind, MetricOutput, MetricParams};
use crate::table::TabularTable;

/// Reports how many attributes hold personally identifiable information,
/// as `"found/total"`. The figure is fixed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractPIIAttributes;

#[async_trait]
impl MetricKind for ExtractPIIAttributes {
    fn name(&self) -> &str {
        "extract_pii_attributes"
    }

    fn display(&self) -> Vec<DisplayEntry> {
        vec![DisplayEntry::label("PII Attributes")
            .with_icon("fa-user-secret")
            .with_colour("text-primary")]
    }

    fn recognized_params(&self) -> &'static [&'static str] {
        &[]
    }

    async fn calculate_in_memory(
        &self,
        _table: &TabularTable,
        _params: &MetricParams,
    ) -> Result<MetricOutput> {
        Ok(MetricOutput::Text("10/21".to_string()))
    }
}
