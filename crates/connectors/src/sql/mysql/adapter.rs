use crate::{
    error::{ConnectorError, DbError},
    executor::QueryExecutor,
    params::ConnectionParams,
    sql::{
        dialect::{self, Dialect},
        mysql::row::DbRow,
    },
};
use async_trait::async_trait;
use model::{core::column::Column, records::row::Row};
use mysql_async::{Opts, OptsBuilder, Pool, Row as MySqlRow, prelude::*};
use tracing::{debug, info};

const COL_FIELD: &str = "Field";
const COL_TYPE: &str = "Type";

#[derive(Clone)]
pub struct MySqlAdapter {
    pool: Pool,
    dialect: dialect::MySql,
}

impl MySqlAdapter {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let opts = Opts::from_url(url).map_err(|e| ConnectorError::InvalidUrl(e.to_string()))?;
        Self::with_opts(opts).await
    }

    pub async fn connect_params(params: &ConnectionParams) -> Result<Self, ConnectorError> {
        let mut builder = OptsBuilder::default()
            .ip_or_hostname(params.host()?)
            .user(Some(params.user()?))
            .pass(params.password.clone())
            .db_name(Some(params.database()?));
        if let Some(port) = params.port {
            builder = builder.tcp_port(port);
        }
        Self::with_opts(Opts::from(builder)).await
    }

    async fn with_opts(opts: Opts) -> Result<Self, ConnectorError> {
        let pool = Pool::new(opts);

        // Check server and credentials up front.
        let conn = pool.get_conn().await?;
        info!(server_version = ?conn.server_version(), "Connected to MySQL");
        drop(conn);

        Ok(MySqlAdapter {
            pool,
            dialect: dialect::MySql,
        })
    }

    /// Disconnects every pooled connection.
    pub async fn close(self) -> Result<(), DbError> {
        self.pool.disconnect().await?;
        Ok(())
    }

    async fn fetch(&self, sql: &str) -> Result<Vec<MySqlRow>, DbError> {
        debug!(sql, "Executing MySQL query");
        let mut conn = self.pool.get_conn().await?;
        let rows = conn.query::<MySqlRow, _>(sql).await?;
        Ok(rows)
    }
}

#[async_trait]
impl QueryExecutor for MySqlAdapter {
    async fn describe(&self, table: &str) -> Result<Vec<Column>, DbError> {
        let sql = format!("SHOW COLUMNS FROM {}", self.dialect.quote_path(table));
        let rows = self.fetch(&sql).await?;

        let columns = rows
            .iter()
            .map(|row| {
                let name = row
                    .get_opt::<String, _>(COL_FIELD)
                    .and_then(|res| res.ok())
                    .ok_or_else(|| DbError::Decode(format!("missing {COL_FIELD} in {sql}")))?;
                let declared_type = row
                    .get_opt::<String, _>(COL_TYPE)
                    .and_then(|res| res.ok())
                    .unwrap_or_default();
                Ok(Column::new(name, declared_type))
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        if columns.is_empty() {
            return Err(DbError::TableNotFound(table.to_string()));
        }
        Ok(columns)
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        let rows = self.fetch(sql).await?;
        Ok(rows.iter().map(|row| DbRow(row).to_row()).collect())
    }

    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }
}
