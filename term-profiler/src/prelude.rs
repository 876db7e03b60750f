//! Prelude for commonly used types and traits in term-profiler.

pub use crate::context::ProfilerContextConfig;
pub use crate::dashboard::{
    Dashboard, DashboardConfig, ExecutionMode, FailurePolicy, StandardDashboard, StandardMetrics,
};
pub use crate::data_source::{BackendKind, DataSource};
pub use crate::error::{ProfilerError, Result};
pub use crate::logging::LogConfig;
pub use crate::metric::{DisplayEntry, Metric, MetricKind, MetricOutput, MetricParams, MetricValue};
pub use crate::sources::TabularSource;
pub use crate::table::TabularTable;
pub use crate::view::{DataFusionView, QueryableView, TableIdentity};
