//! Queryable views: a named table or an ad-hoc query against an external
//! tabular store.
//!
//! Metrics that run over a view only see the [`QueryableView`] trait. The
//! crate ships [`DataFusionView`], which resolves its columns once at
//! construction and executes queries through a DataFusion
//! [`SessionContext`]. Parameters are bound to `$name` placeholders.
//!
//! ```rust,no_run
//! use term_profiler::context::ProfilerContextConfig;
//! use term_profiler::view::{DataFusionView, QueryableView};
//!
//! # async fn example() -> term_profiler::error::Result<()> {
//! let ctx = ProfilerContextConfig::default().build_session();
//! // ... register a "mortgages" table in the default "public" schema ...
//! let view = DataFusionView::builder(ctx)
//!     .table("public", "mortgages")
//!     .build()
//!     .await?;
//! assert!(view.table_identity().is_some());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use datafusion::prelude::SessionContext;
use datafusion::scalar::ScalarValue;
use tracing::{debug, instrument, warn};

use crate::data_source::BackendKind;
use crate::error::{ProfilerError, Result};
use crate::logging::{truncate_field, LogConfig};
use crate::log_data_op;
use crate::security::SqlSecurity;
use crate::table::TabularTable;

/// Named query parameters, bound to `$name` placeholders.
pub type QueryParams = BTreeMap<String, ScalarValue>;

/// The `(database, table)` pair a table-backed view reads from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableIdentity {
    pub database: String,
    pub table: String,
}

impl TableIdentity {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

/// A remote (or remote-like) table that metrics can query.
#[async_trait]
pub trait QueryableView: fmt::Debug + Send + Sync {
    /// Column names of the view's main query, in order.
    fn column_names(&self) -> &[String];

    /// Where the view's rows come from; `None` for ad-hoc queries.
    fn table_identity(&self) -> Option<&TableIdentity>;

    /// The query that produces the view's rows.
    fn main_query(&self) -> &str;

    /// Parameters bound to the main query, if any.
    fn main_params(&self) -> Option<&QueryParams> {
        None
    }

    /// Executes a query and materialises the result.
    async fn run_query(&self, query: &str, params: Option<&QueryParams>) -> Result<TabularTable>;
}

/// Returns the view's table identity, or an unsupported-backend error for
/// metrics that need to introspect a concrete table.
pub fn require_table_identity<'a>(
    view: &'a dyn QueryableView,
    metric: &str,
) -> Result<&'a TableIdentity> {
    view.table_identity()
        .ok_or_else(|| ProfilerError::unsupported_backend(metric, BackendKind::Queryable))
}

/// A [`QueryableView`] backed by a DataFusion session.
pub struct DataFusionView {
    ctx: SessionContext,
    identity: Option<TableIdentity>,
    main_query: String,
    main_params: Option<QueryParams>,
    column_names: Vec<String>,
    log: LogConfig,
}

impl fmt::Debug for DataFusionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataFusionView")
            .field("identity", &self.identity)
            .field("main_query", &self.main_query)
            .field("column_names", &self.column_names)
            .finish()
    }
}

impl DataFusionView {
    /// Starts building a view over the given session.
    pub fn builder(ctx: SessionContext) -> DataFusionViewBuilder {
        DataFusionViewBuilder {
            ctx,
            table: None,
            custom_sql: None,
            custom_params: None,
            log: LogConfig::default(),
        }
    }

    /// Returns the underlying session context.
    pub fn session(&self) -> &SessionContext {
        &self.ctx
    }

    async fn execute(
        ctx: &SessionContext,
        query: &str,
        params: Option<&QueryParams>,
    ) -> Result<datafusion::dataframe::DataFrame> {
        let df = ctx.sql(query).await?;
        match params {
            Some(params) if !params.is_empty() => {
                let values: Vec<(String, ScalarValue)> = params
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Ok(df.with_param_values(values)?)
            }
            _ => Ok(df),
        }
    }
}

#[async_trait]
impl QueryableView for DataFusionView {
    fn column_names(&self) -> &[String] {
        &self.column_names
    }

    fn table_identity(&self) -> Option<&TableIdentity> {
        self.identity.as_ref()
    }

    fn main_query(&self) -> &str {
        &self.main_query
    }

    fn main_params(&self) -> Option<&QueryParams> {
        self.main_params.as_ref()
    }

    #[instrument(skip(self, params), fields(view = ?self.identity))]
    async fn run_query(&self, query: &str, params: Option<&QueryParams>) -> Result<TabularTable> {
        debug!(
            query = %truncate_field(query, self.log.max_field_length),
            "Running view query"
        );
        let df = Self::execute(&self.ctx, query, params).await?;
        let schema = df.schema().inner().clone();
        let batches = df.collect().await?;
        TabularTable::from_batches(schema, batches)
    }
}

/// Builder for [`DataFusionView`].
pub struct DataFusionViewBuilder {
    ctx: SessionContext,
    table: Option<TableIdentity>,
    custom_sql: Option<String>,
    custom_params: Option<QueryParams>,
    log: LogConfig,
}

impl DataFusionViewBuilder {
    /// Reads every row of `database.table`.
    pub fn table(mut self, database: impl Into<String>, table: impl Into<String>) -> Self {
        self.table = Some(TableIdentity::new(database, table));
        self
    }

    /// Reads the rows of an ad-hoc read-only query.
    pub fn custom_sql(mut self, sql: impl Into<String>) -> Self {
        self.custom_sql = Some(sql.into());
        self
    }

    /// Parameters for the ad-hoc query.
    pub fn custom_params(mut self, params: QueryParams) -> Self {
        self.custom_params = Some(params);
        self
    }

    /// Sets the logging knobs for the view's queries.
    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Resolves the main query's columns and builds the view.
    ///
    /// When both a table and custom SQL are given the table wins.
    #[instrument(skip(self))]
    pub async fn build(self) -> Result<DataFusionView> {
        let (identity, main_query, main_params) = match (self.table, self.custom_sql) {
            (Some(identity), custom) => {
                if custom.is_some() {
                    warn!(table = %identity, "Both table name and custom SQL provided; using the table");
                }
                let query = format!("SELECT * FROM {}", SqlSecurity::qualified_table(&identity)?);
                (Some(identity), query, None)
            }
            (None, Some(sql)) => {
                SqlSecurity::validate_read_only_query(&sql)?;
                // Metrics wrap the main query in a subquery, where a
                // statement terminator is a syntax error.
                let sql = sql.trim_end().trim_end_matches(';').trim_end().to_string();
                (None, sql, self.custom_params)
            }
            (None, None) => {
                return Err(ProfilerError::configuration(
                    "provide either a table name or custom SQL returning a table",
                ))
            }
        };

        let df = DataFusionView::execute(&self.ctx, &main_query, main_params.as_ref()).await?;
        let column_names: Vec<String> = df
            .schema()
            .inner()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        log_data_op!(
            self.log,
            query = %truncate_field(&main_query, self.log.max_field_length),
            columns = column_names.len(),
            "Resolved view columns"
        );

        Ok(DataFusionView {
            ctx: self.ctx,
            identity,
            main_query,
            main_params,
            column_names,
            log: self.log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProfilerContextConfig;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use std::sync::Arc;

    fn session_with_people() -> SessionContext {
        let ctx = ProfilerContextConfig::default().build_session();
        let table = TabularTable::from_columns(vec![
            ("id", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
            (
                "name",
                Arc::new(StringArray::from(vec!["ann", "bob", "cat"])) as ArrayRef,
            ),
        ])
        .unwrap();
        ctx.register_batch("people", table.into_batch()).unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_table_view_resolves_columns() {
        let view = DataFusionView::builder(session_with_people())
            .table("public", "people")
            .build()
            .await
            .unwrap();
        assert_eq!(view.column_names(), ["id", "name"]);
        assert_eq!(
            view.table_identity(),
            Some(&TableIdentity::new("public", "people"))
        );
        assert_eq!(view.main_query(), "SELECT * FROM \"public\".\"people\"");
    }

    #[tokio::test]
    async fn test_table_wins_over_custom_sql() {
        let view = DataFusionView::builder(session_with_people())
            .table("public", "people")
            .custom_sql("SELECT id FROM people")
            .build()
            .await
            .unwrap();
        assert_eq!(view.column_names().len(), 2);
    }

    #[tokio::test]
    async fn test_custom_sql_with_params() {
        let mut params = QueryParams::new();
        params.insert("min_id".to_string(), ScalarValue::from(2i64));
        let view = DataFusionView::builder(session_with_people())
            .custom_sql("SELECT name FROM people WHERE id >= $min_id")
            .custom_params(params.clone())
            .build()
            .await
            .unwrap();
        assert!(view.table_identity().is_none());
        assert_eq!(view.column_names(), ["name"]);

        let rows = view
            .run_query(view.main_query(), view.main_params())
            .await
            .unwrap();
        assert_eq!(rows.num_rows(), 2);
        assert!(require_table_identity(&view, "total_rows_cols").is_err());
    }

    #[tokio::test]
    async fn test_log_config_carried_to_view() {
        let view = DataFusionView::builder(session_with_people())
            .custom_sql("SELECT id FROM people")
            .with_log_config(LogConfig {
                max_field_length: 8,
                ..LogConfig::verbose()
            })
            .build()
            .await
            .unwrap();
        assert_eq!(view.log.max_field_length, 8);
        let rows = view.run_query(view.main_query(), None).await.unwrap();
        assert_eq!(rows.num_rows(), 3);
    }

    #[tokio::test]
    async fn test_missing_table_and_sql_rejected() {
        let result = DataFusionView::builder(session_with_people()).build().await;
        assert!(matches!(result, Err(ProfilerError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_write_query_rejected() {
        let result = DataFusionView::builder(session_with_people())
            .custom_sql("DROP TABLE people")
            .build()
            .await;
        assert!(matches!(result, Err(ProfilerError::Security(_))));
    }
}
