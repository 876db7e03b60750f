//! Sources backed by data that is already loaded or queryable.

use std::fmt;
use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use tracing::instrument;

use super::TabularSource;
use crate::error::Result;
use crate::table::TabularTable;
use crate::view::QueryableView;

/// Record batches held in memory.
#[derive(Debug, Clone)]
pub struct BatchSource {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl BatchSource {
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }
}

impl From<TabularTable> for BatchSource {
    fn from(table: TabularTable) -> Self {
        Self {
            schema: table.schema(),
            batches: vec![table.into_batch()],
        }
    }
}

#[async_trait]
impl TabularSource for BatchSource {
    async fn get_table(&self) -> Result<TabularTable> {
        TabularTable::from_batches(self.schema.clone(), self.batches.clone())
    }

    fn description(&self) -> String {
        format!("In-memory batches: {}", self.batches.len())
    }
}

/// Materializes a queryable view's main query, which lets any view feed an
/// in-memory data source.
pub struct ViewSource {
    view: Arc<dyn QueryableView>,
}

impl ViewSource {
    pub fn new(view: Arc<dyn QueryableView>) -> Self {
        Self { view }
    }
}

impl fmt::Debug for ViewSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSource")
            .field("query", &self.view.main_query())
            .finish()
    }
}

#[async_trait]
impl TabularSource for ViewSource {
    #[instrument(skip(self), fields(source.type = "view"))]
    async fn get_table(&self) -> Result<TabularTable> {
        self.view
            .run_query(self.view.main_query(), self.view.main_params())
            .await
    }

    fn description(&self) -> String {
        match self.view.table_identity() {
            Some(identity) => format!("View: {identity}"),
            None => "View: custom query".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{people_table, people_view};

    #[tokio::test]
    async fn test_batch_source_round_trips_table() {
        let source = BatchSource::from(people_table());
        let table = source.get_table().await.unwrap();
        assert_eq!(table, people_table());
        assert_eq!(source.description(), "In-memory batches: 1");
    }

    #[tokio::test]
    async fn test_view_source_materializes_main_query() {
        let source = ViewSource::new(Arc::new(people_view().await));
        assert_eq!(source.description(), "View: public.people");

        let table = source.get_table().await.unwrap();
        assert_eq!(table.num_rows(), 5);
        assert_eq!(table.column_names(), vec!["id", "name", "age", "city"]);
    }
}
