//! The trait every metric computation implements.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::data_source::BackendKind;
use crate::error::{ProfilerError, Result};
use crate::table::TabularTable;
use crate::view::QueryableView;

use super::{DisplayEntry, MetricOutput, MetricParams};

/// A named computation with one path per backend.
///
/// The in-memory path is required. The queryable-view path is optional and
/// fails with [`ProfilerError::UnsupportedBackend`] unless overridden.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use term_profiler::prelude::*;
///
/// #[derive(Debug)]
/// struct NonEmptyColumns;
///
/// #[async_trait]
/// impl MetricKind for NonEmptyColumns {
///     fn name(&self) -> &str {
///         "non_empty_columns"
///     }
///
///     fn display(&self) -> Vec<DisplayEntry> {
///         vec![DisplayEntry::label("Non-empty Columns")]
///     }
///
///     fn recognized_params(&self) -> &'static [&'static str] {
///         &[]
///     }
///
///     async fn calculate_in_memory(
///         &self,
///         table: &TabularTable,
///         _params: &MetricParams,
///     ) -> Result<MetricOutput> {
///         let count = table
///             .batch()
///             .columns()
///             .iter()
///             .filter(|c| c.null_count() < c.len())
///             .count();
///         Ok(MetricOutput::Count(count as u64))
///     }
/// }
/// ```
#[async_trait]
pub trait MetricKind: Send + Sync + Debug {
    /// Stable identifier used in logs and errors.
    fn name(&self) -> &str;

    /// Default display metadata for this kind.
    fn display(&self) -> Vec<DisplayEntry>;

    /// Parameter names this kind accepts.
    fn recognized_params(&self) -> &'static [&'static str];

    /// Computes the metric over a materialised table.
    async fn calculate_in_memory(
        &self,
        table: &TabularTable,
        params: &MetricParams,
    ) -> Result<MetricOutput>;

    /// Computes the metric by querying a view.
    async fn calculate_over_view(
        &self,
        _view: &dyn QueryableView,
        _params: &MetricParams,
    ) -> Result<MetricOutput> {
        Err(ProfilerError::unsupported_backend(
            self.name(),
            BackendKind::Queryable,
        ))
    }
}
