//! Parquet file source implementation.

use std::sync::Arc;

use arrow::datatypes::Schema;
use async_trait::async_trait;
use datafusion::datasource::file_format::parquet::ParquetFormat;
use tracing::{info, instrument};

use super::{expand_globs, read_files, require_paths, TabularSource};
use crate::context::ProfilerContextConfig;
use crate::error::Result;
use crate::table::TabularTable;

/// Options for configuring Parquet file reading.
#[derive(Debug, Clone)]
pub struct ParquetOptions {
    /// Schema to use (if None, read from the file footer)
    pub schema: Option<Arc<Schema>>,
    /// Whether to prune row groups using statistics
    pub enable_pruning: bool,
}

impl Default for ParquetOptions {
    fn default() -> Self {
        Self {
            schema: None,
            enable_pruning: true,
        }
    }
}

/// A Parquet file data source.
#[derive(Debug, Clone)]
pub struct ParquetSource {
    paths: Vec<String>,
    options: ParquetOptions,
    context: ProfilerContextConfig,
}

impl ParquetSource {
    pub fn new(path: impl Into<String>) -> Result<Self> {
        Self::with_options(path, ParquetOptions::default())
    }

    pub fn with_options(path: impl Into<String>, options: ParquetOptions) -> Result<Self> {
        Ok(Self {
            paths: vec![path.into()],
            options,
            context: ProfilerContextConfig::default(),
        })
    }

    pub fn from_paths(paths: Vec<String>) -> Result<Self> {
        Ok(Self {
            paths: require_paths(paths)?,
            options: ParquetOptions::default(),
            context: ProfilerContextConfig::default(),
        })
    }

    pub async fn from_glob(pattern: impl Into<String>) -> Result<Self> {
        let paths = expand_globs(&[pattern.into()]).await?;
        Self::from_paths(paths)
    }

    pub async fn from_globs(patterns: Vec<String>) -> Result<Self> {
        let paths = expand_globs(&patterns).await?;
        Self::from_paths(paths)
    }

    pub fn with_custom_options(mut self, options: ParquetOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_context_config(mut self, context: ProfilerContextConfig) -> Self {
        self.context = context;
        self
    }
}

#[async_trait]
impl TabularSource for ParquetSource {
    #[instrument(skip(self), fields(source.type = "parquet", source.files = self.paths.len()))]
    async fn get_table(&self) -> Result<TabularTable> {
        let ctx = self.context.build_session();
        let format = ParquetFormat::new().with_enable_pruning(self.options.enable_pruning);
        let table = read_files(
            &ctx,
            "parquet",
            &self.paths,
            Arc::new(format),
            self.options.schema.clone(),
        )
        .await?;
        info!(rows = table.num_rows(), "Loaded Parquet source");
        Ok(table)
    }

    fn description(&self) -> String {
        if self.paths.len() == 1 {
            format!("Parquet file: {}", self.paths[0])
        } else {
            format!("Parquet files: {} files", self.paths.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::people_table;
    use datafusion::dataframe::DataFrameWriteOptions;
    use datafusion::prelude::SessionContext;

    #[tokio::test]
    async fn test_reads_written_parquet() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("people.parquet");
        let path = path.to_str().unwrap();

        let ctx = SessionContext::new();
        ctx.read_batch(people_table().into_batch())
            .unwrap()
            .write_parquet(
                path,
                DataFrameWriteOptions::new().with_single_file_output(true),
                None,
            )
            .await
            .unwrap();

        let table = ParquetSource::new(path).unwrap().get_table().await.unwrap();
        assert_eq!(table.num_rows(), 5);
        assert_eq!(table.column_names(), vec!["id", "name", "age", "city"]);
        assert_eq!(table.text_column("name").unwrap()[1], None);
    }
}
