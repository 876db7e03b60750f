//! Line-delimited JSON file source.

use std::sync::Arc;

use arrow::datatypes::Schema;
use async_trait::async_trait;
use datafusion::datasource::file_format::json::JsonFormat;
use tracing::{info, instrument};

use super::{expand_globs, read_files, require_paths, TabularSource};
use crate::context::ProfilerContextConfig;
use crate::error::Result;
use crate::table::TabularTable;

/// Options for configuring JSON file reading.
#[derive(Debug, Clone)]
pub struct JsonOptions {
    /// Schema to use (if None, will be inferred)
    pub schema: Option<Arc<Schema>>,
    /// Maximum records to read for schema inference
    pub schema_infer_max_records: usize,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            schema: None,
            schema_infer_max_records: 1000,
        }
    }
}

/// Reads files holding one JSON object per line (`.json`, `.jsonl`,
/// `.ndjson`). Keys missing from a record read as null.
#[derive(Debug, Clone)]
pub struct JsonSource {
    paths: Vec<String>,
    options: JsonOptions,
    context: ProfilerContextConfig,
}

impl JsonSource {
    pub fn new(path: impl Into<String>) -> Result<Self> {
        Self::with_options(path, JsonOptions::default())
    }

    pub fn with_options(path: impl Into<String>, options: JsonOptions) -> Result<Self> {
        Ok(Self {
            paths: vec![path.into()],
            options,
            context: ProfilerContextConfig::default(),
        })
    }

    pub fn from_paths(paths: Vec<String>) -> Result<Self> {
        Ok(Self {
            paths: require_paths(paths)?,
            options: JsonOptions::default(),
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

    pub fn with_custom_options(mut self, options: JsonOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_context_config(mut self, context: ProfilerContextConfig) -> Self {
        self.context = context;
        self
    }
}

#[async_trait]
impl TabularSource for JsonSource {
    #[instrument(skip(self), fields(source.type = "json", source.files = self.paths.len()))]
    async fn get_table(&self) -> Result<TabularTable> {
        let ctx = self.context.build_session();
        let format =
            JsonFormat::default().with_schema_infer_max_rec(self.options.schema_infer_max_records);
        let table = read_files(
            &ctx,
            "json",
            &self.paths,
            Arc::new(format),
            self.options.schema.clone(),
        )
        .await?;
        info!(rows = table.num_rows(), "Loaded JSON source");
        Ok(table)
    }

    fn description(&self) -> String {
        if self.paths.len() == 1 {
            format!("JSON file: {}", self.paths[0])
        } else {
            format!("JSON files: {} files", self.paths.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_ndjson_missing_keys_read_as_null() {
        let mut file = tempfile::Builder::new()
            .suffix(".jsonl")
            .tempfile()
            .unwrap();
        writeln!(file, r#"{{"id": 1, "client_notes": "Called about card"}}"#).unwrap();
        writeln!(file, r#"{{"id": 2}}"#).unwrap();
        file.flush().unwrap();

        let source = JsonSource::new(file.path().to_str().unwrap()).unwrap();
        let table = source.get_table().await.unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(
            table.text_column("client_notes").unwrap(),
            vec![Some("Called about card".to_string()), None]
        );
    }

    #[test]
    fn test_json_source_description() {
        let source = JsonSource::new("notes.jsonl").unwrap();
        assert_eq!(source.description(), "JSON file: notes.jsonl");
        let source = JsonSource::from_paths(vec!["a.json".into(), "b.json".into()]).unwrap();
        assert_eq!(source.description(), "JSON files: 2 files");
    }
}
