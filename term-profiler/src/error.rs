//! Error types for the term-profiler library.
//!
//! All fallible operations return [`ProfilerError`] through the crate-wide
//! [`Result`] alias. The first four variants are the framework's own error
//! kinds; the rest wrap failures coming from DataFusion, Arrow, the file
//! system and model loading.

use thiserror::Error;

use crate::data_source::BackendKind;

/// The main error type for the term-profiler library.
#[derive(Error, Debug)]
pub enum ProfilerError {
    /// A metric result was read before the metric was invoked.
    #[error("Metric '{metric}' has not been calculated yet; invoke it at least once before reading its result")]
    NotCalculated {
        /// Name of the metric (or view) that was read
        metric: String,
    },

    /// The metric has no computation path for the bound data source.
    #[error("Metric '{metric}' is not implemented for the {backend} backend")]
    UnsupportedBackend {
        /// Name of the metric
        metric: String,
        /// Backend the metric was asked to run against
        backend: BackendKind,
    },

    /// Malformed metric parameters, metadata or dashboard composition.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Numeric failure inside a metric algorithm.
    #[error("Computation error: {0}")]
    Computation(String),

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from data source operations.
    #[error("Data source error: {message}")]
    DataSource {
        /// Type of data source (e.g., "CSV", "Parquet", "view")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A required column is not present in the table.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// Data types don't match what the metric expects.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Failure loading or scoring a model.
    #[error("Model error: {0}")]
    Model(String),

    /// An identifier could not be safely embedded in a query.
    #[error("Security error: {0}")]
    Security(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, ProfilerError>`.
pub type Result<T> = std::result::Result<T, ProfilerError>;

impl ProfilerError {
    /// Creates a not-calculated error for the named metric.
    pub fn not_calculated(metric: impl Into<String>) -> Self {
        Self::NotCalculated {
            metric: metric.into(),
        }
    }

    /// Creates an unsupported-backend error for the named metric.
    pub fn unsupported_backend(metric: impl Into<String>, backend: BackendKind) -> Self {
        Self::UnsupportedBackend {
            metric: metric.into(),
            backend,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a computation error.
    pub fn computation(message: impl Into<String>) -> Self {
        Self::Computation(message.into())
    }

    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with a source error.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates a column-not-found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }
}

impl From<serde_json::Error> for ProfilerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
