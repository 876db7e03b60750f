//! The backend a metric computes against.
//!
//! A [`DataSource`] owns exactly one backend: a materialised
//! [`TabularTable`] or a handle to a [`QueryableView`]. It is cheap to clone
//! and never changes after construction; metrics sharing a data source share
//! the same underlying `Arc`.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::Result;
use crate::metric::{MetricKind, MetricOutput, MetricParams};
use crate::sources::TabularSource;
use crate::table::TabularTable;
use crate::view::QueryableView;

/// Which computation path a data source selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    InMemory,
    Queryable,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::InMemory => write!(f, "in-memory"),
            BackendKind::Queryable => write!(f, "queryable"),
        }
    }
}

/// A fully materialised table.
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    table: Arc<TabularTable>,
}

impl InMemoryBackend {
    pub fn table(&self) -> &TabularTable {
        &self.table
    }
}

/// A remote view queried on demand.
#[derive(Debug, Clone)]
pub struct QueryableBackend {
    view: Arc<dyn QueryableView>,
}

impl QueryableBackend {
    pub fn view(&self) -> &dyn QueryableView {
        self.view.as_ref()
    }
}

/// The data a metric is bound to.
#[derive(Debug, Clone)]
pub enum DataSource {
    InMemory(InMemoryBackend),
    Queryable(QueryableBackend),
}

impl DataSource {
    /// Wraps a materialised table.
    pub fn in_memory(table: TabularTable) -> Self {
        DataSource::InMemory(InMemoryBackend {
            table: Arc::new(table),
        })
    }

    /// Loads a table from any [`TabularSource`] and wraps it.
    #[instrument(skip(source), fields(source = %source.description()))]
    pub async fn from_source(source: &dyn TabularSource) -> Result<Self> {
        let table = source.get_table().await?;
        debug!(
            rows = table.num_rows(),
            columns = table.num_columns(),
            "Loaded table for in-memory data source"
        );
        Ok(Self::in_memory(table))
    }

    /// Wraps a shared view handle.
    pub fn queryable(view: Arc<dyn QueryableView>) -> Self {
        DataSource::Queryable(QueryableBackend { view })
    }

    /// Wraps an owned view.
    pub fn from_view<V: QueryableView + 'static>(view: V) -> Self {
        Self::queryable(Arc::new(view))
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            DataSource::InMemory(_) => BackendKind::InMemory,
            DataSource::Queryable(_) => BackendKind::Queryable,
        }
    }

    /// Column names of the underlying data, in order.
    pub fn column_names(&self) -> Vec<String> {
        match self {
            DataSource::InMemory(backend) => backend.table.column_names(),
            DataSource::Queryable(backend) => backend.view.column_names().to_vec(),
        }
    }

    /// True when both data sources share the same backend instance.
    pub fn same_backend(&self, other: &DataSource) -> bool {
        match (self, other) {
            (DataSource::InMemory(a), DataSource::InMemory(b)) => Arc::ptr_eq(&a.table, &b.table),
            (DataSource::Queryable(a), DataSource::Queryable(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(&a.view), Arc::as_ptr(&b.view))
            }
            _ => false,
        }
    }

    /// Runs the backend-specific computation of `kind`.
    #[instrument(skip(self, kind, params), fields(metric = kind.name(), backend = %self.kind()))]
    pub async fn run(&self, kind: &dyn MetricKind, params: &MetricParams) -> Result<MetricOutput> {
        match self {
            DataSource::InMemory(backend) => kind.calculate_in_memory(&backend.table, params).await,
            DataSource::Queryable(backend) => {
                kind.calculate_over_view(backend.view.as_ref(), params).await
            }
        }
    }
}

impl From<TabularTable> for DataSource {
    fn from(table: TabularTable) -> Self {
        Self::in_memory(table)
    }
}
