use crate::{error::DbError, sql::dialect::Dialect};
use async_trait::async_trait;
use model::{core::column::Column, records::row::Row};

/// The query surface the tail engine runs against.
///
/// Implementations acquire whatever connection they need per call and release
/// it before returning, on success and on error alike.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Columns of `table` in schema-declared order.
    async fn describe(&self, table: &str) -> Result<Vec<Column>, DbError>;

    /// Runs `sql` and returns its rows in result order, columns in select-list order.
    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError>;

    /// Identifier syntax used when building queries for this executor.
    fn dialect(&self) -> &dyn Dialect;
}
