//! The metric execution framework.
//!
//! A [`Metric`] binds a [`MetricKind`] to a [`DataSource`], stores default
//! parameters and display metadata, and memoizes the output of its last
//! invocation. Dispatch to the in-memory or queryable-view path is decided by
//! the data source, never by the caller.
//!
//! ```rust
//! use std::sync::Arc;
//! use term_profiler::prelude::*;
//! use term_profiler::metrics::TotalRowsCols;
//!
//! # async fn example(table: TabularTable) -> term_profiler::error::Result<()> {
//! let source = DataSource::in_memory(table);
//! let mut shape = Metric::new(Arc::new(TotalRowsCols), &source);
//! assert!(shape.result().is_err());
//!
//! let output = shape.invoke().await?;
//! if let MetricOutput::Dimensions { rows, columns } = output {
//!     println!("{rows} rows x {columns} columns");
//! }
//! assert_eq!(shape.label(), Some("Total Rows"));
//! # Ok(())
//! # }
//! ```

mod display;
mod kind;
mod output;
mod params;

pub use display::DisplayEntry;
pub use kind::MetricKind;
pub use output::{MetricOutput, MetricValue};
pub use params::MetricParams;

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::data_source::DataSource;
use crate::error::{ProfilerError, Result};

/// Memoized outcome of a metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResultSlot {
    #[default]
    Uncalculated,
    Calculated(MetricOutput),
}

/// A metric kind bound to a data source.
#[derive(Debug, Clone)]
pub struct Metric {
    kind: Arc<dyn MetricKind>,
    data_source: DataSource,
    params: MetricParams,
    display: Vec<DisplayEntry>,
    slot: ResultSlot,
}

impl Metric {
    /// Binds `kind` to `data_source` with the kind's default display metadata.
    pub fn new(kind: Arc<dyn MetricKind>, data_source: &DataSource) -> Self {
        let display = kind.display();
        Self {
            kind,
            data_source: data_source.clone(),
            params: MetricParams::new(),
            display,
            slot: ResultSlot::Uncalculated,
        }
    }

    /// Stores default parameters. Unknown names are rejected.
    pub fn with_params(mut self, params: MetricParams) -> Result<Self> {
        params.ensure_recognized(self.kind.name(), self.kind.recognized_params())?;
        self.params = params;
        Ok(self)
    }

    /// Replaces the display metadata.
    pub fn with_display(mut self, entries: Vec<DisplayEntry>) -> Self {
        self.display = entries;
        self
    }

    /// Replaces the display metadata from parallel lists of equal length.
    pub fn with_display_metadata(
        self,
        labels: Vec<String>,
        icons: Vec<String>,
        colours: Vec<String>,
    ) -> Result<Self> {
        let entries = DisplayEntry::zip_lists(labels, icons, colours)?;
        Ok(self.with_display(entries))
    }

    /// Computes the metric with its stored parameters.
    pub async fn invoke(&mut self) -> Result<&MetricOutput> {
        self.invoke_with(MetricParams::new()).await
    }

    /// Computes the metric with `overrides` merged over the stored parameters.
    ///
    /// The stored parameters are not modified. Every call overwrites the
    /// memoized result.
    #[instrument(skip(self, overrides), fields(metric = self.kind.name(), backend = %self.data_source.kind()))]
    pub async fn invoke_with(&mut self, overrides: MetricParams) -> Result<&MetricOutput> {
        overrides.ensure_recognized(self.kind.name(), self.kind.recognized_params())?;
        let params = self.params.merged_with(&overrides);

        let output = self.data_source.run(self.kind.as_ref(), &params).await?;
        debug!(shape = output.shape(), "Metric calculated");

        self.slot = ResultSlot::Calculated(output);
        self.result()
    }

    /// The memoized output of the last invocation.
    pub fn result(&self) -> Result<&MetricOutput> {
        match &self.slot {
            ResultSlot::Calculated(output) => Ok(output),
            ResultSlot::Uncalculated => Err(ProfilerError::not_calculated(self.kind.name())),
        }
    }

    pub fn slot(&self) -> &ResultSlot {
        &self.slot
    }

    pub fn is_calculated(&self) -> bool {
        matches!(self.slot, ResultSlot::Calculated(_))
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }

    pub fn kind(&self) -> &Arc<dyn MetricKind> {
        &self.kind
    }

    pub fn params(&self) -> &MetricParams {
        &self.params
    }

    pub fn data_source(&self) -> &DataSource {
        &self.data_source
    }

    /// Every display entry, in order.
    pub fn display(&self) -> &[DisplayEntry] {
        &self.display
    }

    /// Label of the primary display entry.
    pub fn label(&self) -> Option<&str> {
        self.display.first().map(|e| e.label.as_str())
    }

    /// Icon of the primary display entry.
    pub fn icon(&self) -> Option<&str> {
        self.display.first().and_then(|e| e.icon.as_deref())
    }

    /// Colour of the primary display entry.
    pub fn colour(&self) -> Option<&str> {
        self.display.first().and_then(|e| e.colour.as_deref())
    }
}
