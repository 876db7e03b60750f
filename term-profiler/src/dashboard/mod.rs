//! Composition of metrics into dashboards.
//!
//! A [`Dashboard`] is an ordered list of [`Metric`]s that are calculated
//! together. [`StandardDashboard`] fixes the composition used by the data
//! quality overview and adds typed read accessors on top.
//!
//! ```rust
//! use std::sync::Arc;
//! use term_profiler::prelude::*;
//! use term_profiler::metrics::{TotalBlankCells, TotalRowsCols};
//!
//! # async fn example(table: TabularTable) -> term_profiler::error::Result<()> {
//! let source = DataSource::in_memory(table);
//! let mut dashboard = Dashboard::new();
//! dashboard
//!     .add(Metric::new(Arc::new(TotalRowsCols), &source))
//!     .add(vec![Metric::new(Arc::new(TotalBlankCells), &source)]);
//!
//! let report = dashboard.calculate().await?;
//! assert!(report.is_success());
//! for output in dashboard.results()? {
//!     println!("{output:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod standard;

pub use standard::{HeadlineMetrics, StandardDashboard, StandardMetrics};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::error::{ProfilerError, Result};
use crate::logging::{truncate_field, LogConfig};
use crate::metric::{Metric, MetricOutput};
use crate::{log_data_op, log_metric};

/// What `calculate` does when a metric fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Return the first error. In sequential mode later metrics do not run.
    #[default]
    StopOnFirstFailure,
    /// Run every metric and record failures in the report.
    ContinueOnFailure,
}

/// How metrics are scheduled during `calculate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One metric at a time, in insertion order.
    #[default]
    Sequential,
    /// All metrics polled together on the calling task.
    Concurrent,
}

/// Configuration for dashboard calculation.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub failure_policy: FailurePolicy,
    pub execution_mode: ExecutionMode,
    /// Decimal places used by rounded views
    pub round_decimals: u32,
    pub log: LogConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            execution_mode: ExecutionMode::default(),
            round_decimals: 2,
            log: LogConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    pub fn with_round_decimals(mut self, decimals: u32) -> Self {
        self.round_decimals = decimals;
        self
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }
}

/// One metric or a list of metrics, accepted by [`Dashboard::add`].
#[derive(Debug, Clone)]
pub enum MetricSet {
    One(Metric),
    Many(Vec<Metric>),
}

impl From<Metric> for MetricSet {
    fn from(metric: Metric) -> Self {
        MetricSet::One(metric)
    }
}

impl From<Vec<Metric>> for MetricSet {
    fn from(metrics: Vec<Metric>) -> Self {
        MetricSet::Many(metrics)
    }
}

impl IntoIterator for MetricSet {
    type Item = Metric;
    type IntoIter = std::vec::IntoIter<Metric>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            MetricSet::One(metric) => vec![metric].into_iter(),
            MetricSet::Many(metrics) => metrics.into_iter(),
        }
    }
}

/// A metric that failed during `calculate`.
#[derive(Debug)]
pub struct MetricFailure {
    /// Position of the metric in the dashboard
    pub position: usize,
    pub metric: String,
    pub error: ProfilerError,
}

/// Outcome of one `calculate` call.
#[derive(Debug)]
pub struct CalculationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of metrics that produced a result
    pub calculated: usize,
    pub failures: Vec<MetricFailure>,
}

impl CalculationReport {
    fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            calculated: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// An ordered collection of metrics.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    metrics: Vec<Metric>,
    config: DashboardConfig,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DashboardConfig) -> Self {
        Self {
            metrics: Vec::new(),
            config,
        }
    }

    /// Appends one metric, or every metric of a list, keeping order.
    pub fn add(&mut self, metrics: impl Into<MetricSet>) -> &mut Self {
        self.metrics.extend(metrics.into());
        self
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn metric(&self, position: usize) -> Option<&Metric> {
        self.metrics.get(position)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Invokes every metric once.
    ///
    /// Calling this again recalculates everything; each metric keeps only its
    /// latest result.
    #[instrument(skip(self), fields(
        dashboard.metrics = self.metrics.len(),
        dashboard.mode = ?self.config.execution_mode,
    ))]
    pub async fn calculate(&mut self) -> Result<CalculationReport> {
        let mut report = CalculationReport::start();
        match self.config.execution_mode {
            ExecutionMode::Sequential => self.calculate_sequential(&mut report).await?,
            ExecutionMode::Concurrent => self.calculate_concurrent(&mut report).await?,
        }
        report.finished_at = Utc::now();

        info!(
            calculated = report.calculated,
            failed = report.failures.len(),
            duration_ms = report.duration().num_milliseconds(),
            "Dashboard calculated"
        );
        Ok(report)
    }

    async fn calculate_sequential(&mut self, report: &mut CalculationReport) -> Result<()> {
        let config = self.config.clone();
        for (position, metric) in self.metrics.iter_mut().enumerate() {
            log_data_op!(config.log, metric = metric.name(), position, "Calculating metric");
            let outcome = metric.invoke().await.map(|output| output.shape());
            record_outcome(&config, report, position, metric.name(), outcome)?;
        }
        Ok(())
    }

    async fn calculate_concurrent(&mut self, report: &mut CalculationReport) -> Result<()> {
        let outcomes = join_all(self.metrics.iter_mut().map(|metric| async move {
            let outcome = metric.invoke().await.map(|output| output.shape());
            (metric.name().to_string(), outcome)
        }))
        .await;

        // Outcomes are recorded in insertion order once every metric settled.
        for (position, (name, outcome)) in outcomes.into_iter().enumerate() {
            record_outcome(&self.config, report, position, &name, outcome)?;
        }
        Ok(())
    }

    /// Every metric's result, in insertion order.
    pub fn results(&self) -> Result<Vec<&MetricOutput>> {
        self.metrics.iter().map(Metric::result).collect()
    }
}

fn record_outcome(
    config: &DashboardConfig,
    report: &mut CalculationReport,
    position: usize,
    name: &str,
    outcome: Result<&'static str>,
) -> Result<()> {
    match outcome {
        Ok(shape) => {
            log_metric!(config.log, metric = name, position, shape, "Metric result stored");
            report.calculated += 1;
            Ok(())
        }
        Err(error) => match config.failure_policy {
            FailurePolicy::StopOnFirstFailure => Err(error),
            FailurePolicy::ContinueOnFailure => {
                warn!(
                    metric = name,
                    position,
                    error = %truncate_field(&error.to_string(), config.log.max_field_length),
                    "Metric failed, continuing"
                );
                report.failures.push(MetricFailure {
                    position,
                    metric: name.to_string(),
                    error,
                });
                Ok(())
            }
        },
    }
}
