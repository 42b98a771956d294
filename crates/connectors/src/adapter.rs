use crate::{
    error::{ConnectorError, DbError},
    executor::QueryExecutor,
    params::ConnectionTarget,
    sql::{dialect::Dialect, mysql::adapter::MySqlAdapter, postgres::adapter::PgAdapter},
};
use async_trait::async_trait;
use model::{core::column::Column, records::row::Row};
use std::{fmt, str::FromStr};

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseKind {
    #[default]
    MySql,
    Postgres,
}

impl FromStr for DatabaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DatabaseKind::MySql),
            "pg" | "postgres" | "postgresql" => Ok(DatabaseKind::Postgres),
            other => Err(format!("Unknown database kind: {other}")),
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseKind::MySql => write!(f, "mysql"),
            DatabaseKind::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Clone)]
pub enum Adapter {
    MySql(MySqlAdapter),
    Postgres(PgAdapter),
}

impl Adapter {
    pub async fn connect(
        kind: DatabaseKind,
        target: &ConnectionTarget,
    ) -> Result<Self, ConnectorError> {
        match (kind, target) {
            (DatabaseKind::MySql, ConnectionTarget::Url(url)) => {
                Ok(Adapter::MySql(MySqlAdapter::connect(url).await?))
            }
            (DatabaseKind::MySql, ConnectionTarget::Params(params)) => {
                Ok(Adapter::MySql(MySqlAdapter::connect_params(params).await?))
            }
            (DatabaseKind::Postgres, ConnectionTarget::Url(url)) => {
                Ok(Adapter::Postgres(PgAdapter::connect(url).await?))
            }
            (DatabaseKind::Postgres, ConnectionTarget::Params(params)) => {
                Ok(Adapter::Postgres(PgAdapter::connect_params(params).await?))
            }
        }
    }

    pub fn executor(&self) -> &(dyn QueryExecutor + Send + Sync) {
        match self {
            Adapter::MySql(adapter) => adapter,
            Adapter::Postgres(adapter) => adapter,
        }
    }

    pub async fn close(self) -> Result<(), DbError> {
        match self {
            Adapter::MySql(adapter) => adapter.close().await,
            Adapter::Postgres(adapter) => adapter.close().await,
        }
    }
}

#[async_trait]
impl QueryExecutor for Adapter {
    async fn describe(&self, table: &str) -> Result<Vec<Column>, DbError> {
        self.executor().describe(table).await
    }

    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        self.executor().query(sql).await
    }

    fn dialect(&self) -> &dyn Dialect {
        self.executor().dialect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!(DatabaseKind::from_str("MySQL"), Ok(DatabaseKind::MySql));
        assert_eq!(DatabaseKind::from_str("mariadb"), Ok(DatabaseKind::MySql));
        assert_eq!(DatabaseKind::from_str("pg"), Ok(DatabaseKind::Postgres));
        assert!(DatabaseKind::from_str("sqlite").is_err());
    }
}
