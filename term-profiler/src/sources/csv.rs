//! CSV file source implementation.

use std::sync::Arc;

use arrow::datatypes::Schema;
use async_trait::async_trait;
use datafusion::datasource::file_format::csv::CsvFormat;
use tracing::{info, instrument};

use super::{expand_globs, read_files, require_paths, TabularSource};
use crate::context::ProfilerContextConfig;
use crate::error::Result;
use crate::table::TabularTable;

/// Options for configuring CSV file reading.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Whether the CSV file has a header row
    pub has_header: bool,
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Quote character (default: '"')
    pub quote: u8,
    /// Escape character (default: None)
    pub escape: Option<u8>,
    /// Comment prefix (lines starting with this are ignored)
    pub comment: Option<u8>,
    /// Schema to use (if None, will be inferred)
    pub schema: Option<Arc<Schema>>,
    /// Maximum records to read for schema inference
    pub schema_infer_max_records: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            quote: b'"',
            escape: None,
            comment: None,
            schema: None,
            schema_infer_max_records: 1000,
        }
    }
}

impl CsvOptions {
    fn format(&self) -> CsvFormat {
        CsvFormat::default()
            .with_has_header(self.has_header)
            .with_delimiter(self.delimiter)
            .with_quote(self.quote)
            .with_escape(self.escape)
            .with_comment(self.comment)
            .with_schema_infer_max_rec(self.schema_infer_max_records)
    }
}

/// A delimited text file source with schema inference.
///
/// Any extension is accepted, so `.tsv` and `.txt` exports read the same way
/// as `.csv` once the delimiter is set.
///
/// # Examples
///
/// ```rust,no_run
/// use term_profiler::sources::{CsvOptions, CsvSource, TabularSource};
///
/// # async fn example() -> term_profiler::error::Result<()> {
/// // Simple CSV file
/// let source = CsvSource::new("data/users.csv")?;
///
/// // Tab separated without a header
/// let options = CsvOptions {
///     delimiter: b'\t',
///     has_header: false,
///     ..Default::default()
/// };
/// let source = CsvSource::with_options("data/users.tsv", options)?;
///
/// // Multiple files with glob pattern
/// let source = CsvSource::from_glob("data/*.csv").await?;
/// let table = source.get_table().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CsvSource {
    paths: Vec<String>,
    options: CsvOptions,
    context: ProfilerContextConfig,
}

impl CsvSource {
    /// Creates a new CSV source from a single file path.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        Self::with_options(path, CsvOptions::default())
    }

    /// Creates a new CSV source with custom options.
    pub fn with_options(path: impl Into<String>, options: CsvOptions) -> Result<Self> {
        Ok(Self {
            paths: vec![path.into()],
            options,
            context: ProfilerContextConfig::default(),
        })
    }

    /// Creates a CSV source from multiple file paths.
    pub fn from_paths(paths: Vec<String>) -> Result<Self> {
        Ok(Self {
            paths: require_paths(paths)?,
            options: CsvOptions::default(),
            context: ProfilerContextConfig::default(),
        })
    }

    /// Creates a CSV source from a glob pattern.
    pub async fn from_glob(pattern: impl Into<String>) -> Result<Self> {
        let patterns = vec![pattern.into()];
        let paths = expand_globs(&patterns).await?;
        Self::from_paths(paths)
    }

    /// Creates a CSV source from multiple glob patterns.
    pub async fn from_globs(patterns: Vec<String>) -> Result<Self> {
        let paths = expand_globs(&patterns).await?;
        Self::from_paths(paths)
    }

    /// Sets custom options for this CSV source.
    pub fn with_custom_options(mut self, options: CsvOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the session settings used while reading.
    pub fn with_context_config(mut self, context: ProfilerContextConfig) -> Self {
        self.context = context;
        self
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

#[async_trait]
impl TabularSource for CsvSource {
    #[instrument(skip(self), fields(source.type = "csv", source.files = self.paths.len()))]
    async fn get_table(&self) -> Result<TabularTable> {
        let ctx = self.context.build_session();
        let table = read_files(
            &ctx,
            "csv",
            &self.paths,
            Arc::new(self.options.format()),
            self.options.schema.clone(),
        )
        .await?;
        info!(
            rows = table.num_rows(),
            columns = table.num_columns(),
            "Loaded CSV source"
        );
        Ok(table)
    }

    fn description(&self) -> String {
        if self.paths.len() == 1 {
            format!("CSV file: {}", self.paths[0])
        } else {
            format!("CSV files: {} files", self.paths.len())
        }
    }
}
