//! The standard data quality dashboard.

use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::{CalculationReport, Dashboard, DashboardConfig, FailurePolicy};
use crate::error::{ProfilerError, Result};
use crate::metric::{Metric, MetricValue};
use crate::metrics::{DataRulesReport, ProfileView};
use crate::table::TabularTable;

const COLUMN_VIEWS: usize = 0;
const DATA_RULES: usize = 1;
const ANOMALY_DETECT: usize = 2;
const EXTRACT_BAD_POSTCODE: usize = 3;
const ML_ADDRESS: usize = 4;
const HEADLINE_START: usize = 5;

/// The metrics a [`StandardDashboard`] is built from.
#[derive(Debug, Clone)]
pub struct StandardMetrics {
    /// Column profile, usually [`BasicProfile`](crate::metrics::BasicProfile)
    pub column_views: Metric,
    pub data_rules: Metric,
    pub anomaly_detect: Metric,
    pub extract_bad_postcode: Metric,
    pub ml_address: Metric,
    /// Metrics summarised on the headline cards
    pub headline_metrics: Vec<Metric>,
    pub ml_client_notes: Metric,
}

/// Parallel lists of headline results and their display metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub results: Vec<MetricValue>,
    pub labels: Vec<String>,
    pub icons: Vec<Option<String>>,
    pub colours: Vec<Option<String>>,
}

impl HeadlineMetrics {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn push_metric(&mut self, metric: &Metric) -> Result<()> {
        let output = metric.result()?;
        for entry in metric.display() {
            self.labels.push(entry.label.clone());
            self.icons.push(entry.icon.clone());
            self.colours.push(entry.colour.clone());
        }
        self.results.extend(output.headline_values());
        Ok(())
    }

    fn ensure_aligned(&self) -> Result<()> {
        let lengths = [
            self.labels.len(),
            self.results.len(),
            self.icons.len(),
            self.colours.len(),
        ];
        if lengths.iter().any(|len| *len != lengths[0]) {
            return Err(ProfilerError::configuration(format!(
                "headline labels, results, icons and colours differ in length: {lengths:?}"
            )));
        }
        Ok(())
    }
}

/// A dashboard with a fixed composition and typed views.
///
/// Every metric must be bound to the same data source. After
/// [`calculate`](Self::calculate) the headline cards and the column name
/// snapshot are available alongside the per-metric views; reading any view
/// earlier fails with `NotCalculated`.
#[derive(Debug, Clone)]
pub struct StandardDashboard {
    dashboard: Dashboard,
    headline_count: usize,
    headline: Option<HeadlineMetrics>,
    column_names: Option<Vec<String>>,
}

impl StandardDashboard {
    pub fn new(metrics: StandardMetrics) -> Result<Self> {
        Self::with_config(metrics, DashboardConfig::default())
    }

    pub fn with_config(metrics: StandardMetrics, config: DashboardConfig) -> Result<Self> {
        let StandardMetrics {
            column_views,
            data_rules,
            anomaly_detect,
            extract_bad_postcode,
            ml_address,
            headline_metrics,
            ml_client_notes,
        } = metrics;
        let headline_count = headline_metrics.len();

        let mut ordered = vec![
            column_views,
            data_rules,
            anomaly_detect,
            extract_bad_postcode,
            ml_address,
        ];
        ordered.extend(headline_metrics);
        ordered.push(ml_client_notes);

        let source = ordered[COLUMN_VIEWS].data_source().clone();
        if let Some(other) = ordered
            .iter()
            .find(|metric| !metric.data_source().same_backend(&source))
        {
            return Err(ProfilerError::configuration(format!(
                "metric '{}' is bound to a different data source than the column profile",
                other.name()
            )));
        }

        let mut dashboard = Dashboard::with_config(config);
        dashboard.add(ordered);
        Ok(Self {
            dashboard,
            headline_count,
            headline: None,
            column_names: None,
        })
    }

    /// Calculates every metric, then aggregates the headline cards and
    /// snapshots the column names.
    #[instrument(skip(self), fields(headline_metrics = self.headline_count))]
    pub async fn calculate(&mut self) -> Result<CalculationReport> {
        let report = self.dashboard.calculate().await?;
        self.headline = Some(self.populate_headline_metrics()?);
        self.column_names = Some(self.metric(COLUMN_VIEWS)?.data_source().column_names());
        debug!(
            headline_entries = self.headline.as_ref().map_or(0, HeadlineMetrics::len),
            "Standard dashboard ready"
        );
        Ok(report)
    }

    fn populate_headline_metrics(&self) -> Result<HeadlineMetrics> {
        let mut headline = HeadlineMetrics::default();
        for metric in self.headline_members() {
            if !metric.is_calculated()
                && self.dashboard.config().failure_policy == FailurePolicy::ContinueOnFailure
            {
                warn!(metric = metric.name(), "Headline metric has no result, skipping");
                continue;
            }
            headline.push_metric(metric)?;
        }
        headline.ensure_aligned()?;
        Ok(headline)
    }

    fn metric(&self, position: usize) -> Result<&Metric> {
        self.dashboard
            .metric(position)
            .ok_or_else(|| ProfilerError::Internal(format!("no metric at position {position}")))
    }

    fn table_result(&self, position: usize) -> Result<&TabularTable> {
        let output = self.metric(position)?.result()?;
        output.as_table().ok_or_else(|| ProfilerError::TypeMismatch {
            expected: "table".to_string(),
            found: output.shape().to_string(),
        })
    }

    fn profile(&self) -> Result<ProfileView<'_>> {
        Ok(ProfileView::new(self.table_result(COLUMN_VIEWS)?))
    }

    fn decimals(&self) -> u32 {
        self.dashboard.config().round_decimals
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// The metrics feeding the headline cards, in the order they were supplied.
    pub fn headline_members(&self) -> &[Metric] {
        let metrics = self.dashboard.metrics();
        &metrics[HEADLINE_START..HEADLINE_START + self.headline_count]
    }

    /// Aggregated headline cards.
    pub fn headline_metrics(&self) -> Result<&HeadlineMetrics> {
        self.headline
            .as_ref()
            .ok_or_else(|| ProfilerError::not_calculated("headline_metrics"))
    }

    /// Column names of the bound data source at calculation time.
    pub fn column_names(&self) -> Result<&[String]> {
        self.column_names
            .as_deref()
            .ok_or_else(|| ProfilerError::not_calculated("column_names"))
    }

    /// One column's profile as a JSON records string.
    pub fn columnwise_view(&self, column: &str) -> Result<String> {
        self.profile()?.column_record(column, self.decimals())
    }

    /// The column profile without chart payloads.
    pub fn tabular_view(&self) -> Result<TabularTable> {
        self.profile()?.tabular(self.decimals())
    }

    pub fn anomaly_view(&self) -> Result<&TabularTable> {
        self.table_result(ANOMALY_DETECT)
    }

    pub fn ml_address_view(&self) -> Result<&TabularTable> {
        self.table_result(ML_ADDRESS)
    }

    pub fn postcode_view(&self) -> Result<&TabularTable> {
        self.table_result(EXTRACT_BAD_POSTCODE)
    }

    pub fn data_rules_view(&self) -> Result<&DataRulesReport> {
        let output = self.metric(DATA_RULES)?.result()?;
        output.as_rules().ok_or_else(|| ProfilerError::TypeMismatch {
            expected: "rules".to_string(),
            found: output.shape().to_string(),
        })
    }

    pub fn client_notes_view(&self) -> Result<&TabularTable> {
        self.table_result(HEADLINE_START + self.headline_count)
    }
}
