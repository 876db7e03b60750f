//! Table readers.
//!
//! A [`TabularSource`] produces a [`TabularTable`] that an in-memory
//! [`DataSource`](crate::data_source::DataSource) can own. File sources read
//! through DataFusion listing tables, so any file DataFusion can list (local
//! paths, glob expansions) works.
//!
//! ```rust,no_run
//! use term_profiler::data_source::DataSource;
//! use term_profiler::sources::{CsvOptions, CsvSource};
//!
//! # async fn example() -> term_profiler::error::Result<()> {
//! let source = CsvSource::with_options(
//!     "data/mortgages.tsv",
//!     CsvOptions {
//!         delimiter: b'\t',
//!         ..Default::default()
//!     },
//! )?;
//! let data_source = DataSource::from_source(&source).await?;
//! # Ok(())
//! # }
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use async_trait::async_trait;
use datafusion::datasource::file_format::FileFormat;
use datafusion::datasource::listing::{
    ListingOptions, ListingTable, ListingTableConfig, ListingTableUrl,
};
use datafusion::prelude::SessionContext;
use tracing::{debug, instrument};

use crate::error::{ProfilerError, Result};
use crate::table::TabularTable;

mod csv;
mod json;
mod memory;
mod parquet;

pub use csv::{CsvOptions, CsvSource};
pub use json::{JsonOptions, JsonSource};
pub use memory::{BatchSource, ViewSource};
pub use parquet::{ParquetOptions, ParquetSource};

/// Anything that can produce a table.
///
/// Reading is deterministic: calling `get_table` twice on an unchanged
/// source yields equal tables.
#[async_trait]
pub trait TabularSource: Debug + Send + Sync {
    /// Reads the full table.
    async fn get_table(&self) -> Result<TabularTable>;

    /// Returns a human-readable description of this source.
    fn description(&self) -> String;
}

/// File extension of `path` including the leading dot, or `""` when the
/// path has none.
pub(crate) fn file_extension(path: &str) -> String {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

/// Reads each path as its own listing table and concatenates the rows.
///
/// Without an explicit schema, the schema inferred from the first file is
/// used for every file.
#[instrument(skip(ctx, format, schema), fields(files = paths.len()))]
pub(crate) async fn read_files(
    ctx: &SessionContext,
    source_type: &str,
    paths: &[String],
    format: Arc<dyn FileFormat>,
    mut schema: Option<SchemaRef>,
) -> Result<TabularTable> {
    let mut batches = Vec::new();
    for path in paths {
        let url = ListingTableUrl::parse(path).map_err(|e| {
            ProfilerError::data_source_with_source(
                source_type,
                format!("Invalid path '{path}'"),
                Box::new(e),
            )
        })?;
        let options = ListingOptions::new(format.clone()).with_file_extension(file_extension(path));
        let config = ListingTableConfig::new(url).with_listing_options(options);
        let config = match &schema {
            Some(schema) => config.with_schema(schema.clone()),
            None => config.infer_schema(&ctx.state()).await?,
        };
        let table = ListingTable::try_new(config)?;
        let df = ctx.read_table(Arc::new(table))?;
        if schema.is_none() {
            schema = Some(df.schema().inner().clone());
        }
        let collected = df.collect().await?;
        debug!(path = %path, batches = collected.len(), "Read file");
        batches.extend(collected);
    }

    let schema = schema.ok_or_else(|| {
        ProfilerError::data_source(source_type, "At least one path must be provided")
    })?;
    TabularTable::from_batches(schema, batches)
}

/// Utility function to expand glob patterns into file paths.
pub(crate) async fn expand_globs(patterns: &[String]) -> Result<Vec<String>> {
    use glob::glob;

    let mut paths = Vec::new();
    for pattern in patterns {
        let matches = glob(pattern).map_err(|e| {
            ProfilerError::configuration(format!("Invalid glob pattern '{pattern}': {e}"))
        })?;

        for entry in matches {
            let path = entry.map_err(|e| ProfilerError::Io(std::io::Error::other(e)))?;

            if path.is_file() {
                if let Some(path_str) = path.to_str() {
                    paths.push(path_str.to_string());
                }
            }
        }
    }

    if paths.is_empty() {
        return Err(ProfilerError::data_source(
            "file",
            "No files found matching glob patterns",
        ));
    }

    paths.sort();
    Ok(paths)
}

/// Rejects an empty path list.
pub(crate) fn require_paths(paths: Vec<String>) -> Result<Vec<String>> {
    if paths.is_empty() {
        return Err(ProfilerError::configuration(
            "At least one path must be provided",
        ));
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("data/users.csv"), ".csv");
        assert_eq!(file_extension("data/users.tsv"), ".tsv");
        assert_eq!(file_extension("logs/events.jsonl"), ".jsonl");
        assert_eq!(file_extension("README"), "");
    }

    #[tokio::test]
    async fn test_empty_glob() {
        let dir = tempfile::TempDir::new().unwrap();
        let pattern = format!("{}/*.csv", dir.path().display());
        let result = expand_globs(&[pattern]).await;
        match result {
            Err(ProfilerError::DataSource { message, .. }) => {
                assert!(message.contains("No files found"));
            }
            other => panic!("Expected DataSource error, got {other:?}"),
        }
    }

    #[test]
    fn test_require_paths() {
        assert!(require_paths(Vec::new()).is_err());
        assert_eq!(require_paths(vec!["a.csv".into()]).unwrap().len(), 1);
    }
}
