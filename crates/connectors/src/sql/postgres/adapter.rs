use crate::{
    error::{ConnectorError, DbError},
    executor::QueryExecutor,
    params::ConnectionParams,
    sql::{
        dialect::{self, Dialect},
        postgres::{
            row::DbRow,
            utils::{config_from_params, config_from_url, connect_client, split_table_name},
        },
    },
};
use async_trait::async_trait;
use model::{core::column::Column, records::row::Row};
use std::sync::Arc;
use tokio_postgres::{Client, Config};
use tracing::{debug, info};

const QUERY_TABLE_COLUMNS_SQL: &str = "SELECT column_name::text, data_type::text \
     FROM information_schema.columns \
     WHERE table_schema::text = COALESCE($1::text, current_schema()::text) \
     AND table_name::text = $2::text \
     ORDER BY ordinal_position";

#[derive(Clone)]
pub struct PgAdapter {
    client: Arc<Client>,
    dialect: dialect::Postgres,
}

impl PgAdapter {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        Self::with_config(config_from_url(url)?).await
    }

    pub async fn connect_params(params: &ConnectionParams) -> Result<Self, ConnectorError> {
        Self::with_config(config_from_params(params)?).await
    }

    async fn with_config(config: Config) -> Result<Self, ConnectorError> {
        let client = connect_client(config).await?;
        info!("Connected to PostgreSQL");
        Ok(PgAdapter {
            client: Arc::new(client),
            dialect: dialect::Postgres,
        })
    }

    /// Drops this handle to the client; the connection task ends with the last one.
    pub async fn close(self) -> Result<(), DbError> {
        drop(self.client);
        Ok(())
    }
}

#[async_trait]
impl QueryExecutor for PgAdapter {
    async fn describe(&self, table: &str) -> Result<Vec<Column>, DbError> {
        let (schema, name) = split_table_name(table);
        let rows = self
            .client
            .query(QUERY_TABLE_COLUMNS_SQL, &[&schema, &name])
            .await?;

        let columns = rows
            .iter()
            .map(|row| {
                Ok(Column::new(
                    row.try_get::<_, String>(0)?,
                    row.try_get::<_, String>(1)?,
                ))
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        if columns.is_empty() {
            return Err(DbError::TableNotFound(table.to_string()));
        }
        Ok(columns)
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        debug!(sql, "Executing Postgres query");
        let rows = self.client.query(sql, &[]).await?;
        Ok(rows.iter().map(|row| DbRow(row).to_row()).collect())
    }

    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }
}
