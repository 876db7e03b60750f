//! # term-profiler - data quality metrics and dashboards
//!
//! term-profiler computes data quality and anomaly metrics over a tabular
//! dataset and composes them into dashboards. The same named metric runs
//! against two backends: a table held in memory, or a queryable view that
//! pushes the work down to a DataFusion session as SQL.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use term_profiler::prelude::*;
//! use term_profiler::metrics::{DuplicateRows, TotalBlankCells, TotalRowsCols};
//! use term_profiler::sources::CsvSource;
//!
//! # async fn example() -> term_profiler::error::Result<()> {
//! let source = DataSource::from_source(&CsvSource::new("data/mortgages.csv")?).await?;
//!
//! let mut dashboard = Dashboard::new();
//! dashboard.add(vec![
//!     Metric::new(Arc::new(TotalRowsCols), &source),
//!     Metric::new(Arc::new(TotalBlankCells), &source)
//!         .with_params(MetricParams::new().with("pc", true).with("dp", 3))?,
//!     Metric::new(Arc::new(DuplicateRows), &source),
//! ]);
//! dashboard.calculate().await?;
//!
//! for metric in dashboard.metrics() {
//!     println!("{}: {:?}", metric.label().unwrap_or(metric.name()), metric.result()?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Backends
//!
//! A [`DataSource`](data_source::DataSource) is either in-memory or
//! queryable. In-memory sources are loaded through a
//! [`TabularSource`](sources::TabularSource) (CSV, JSON, Parquet, record
//! batches, or a materialised view). Queryable sources wrap a
//! [`QueryableView`](view::QueryableView), such as a
//! [`DataFusionView`](view::DataFusionView) over a named table or a
//! parameterised query. A metric that has no implementation for the selected
//! backend fails with `UnsupportedBackend`.
//!
//! ## Architecture
//!
//! - **`table`**: the [`TabularTable`](table::TabularTable) data model
//! - **`sources`**: readers producing tables
//! - **`view`**: queryable views and their parameters
//! - **`data_source`**: backend selection and dispatch
//! - **`metric`**: the `Metric` wrapper, parameters, outputs and display metadata
//! - **`metrics`**: the metric kinds (profiling, blanks, duplicates, postcodes,
//!   addresses, client notes, z-score and regression anomalies, rules)
//! - **`model`**: classifier and regressor traits with JSON-loadable models
//! - **`dashboard`**: `Dashboard` and `StandardDashboard`
//! - **`chart`**: plotly-compatible chart payloads
//! - **`logging`**: logging configuration and subscriber setup

pub mod chart;
pub mod context;
pub mod dashboard;
pub mod data_source;
pub mod error;
pub mod logging;
pub mod metric;
pub mod metrics;
pub mod model;
pub mod prelude;
pub mod security;
pub mod sources;
pub mod stats;
pub mod table;
pub mod view;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
