use crate::sink::SinkError;
use connectors::error::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TailError {
    #[error("Unknown field '{field}' in table '{table}'")]
    UnknownField { table: String, field: String },

    #[error("Unknown format '{format}' for field '{field}'")]
    UnknownFormat { field: String, format: String },

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("Invalid field template: {0}")]
    InvalidTemplate(String),

    #[error("Query failed: {0}")]
    Query(#[from] DbError),

    #[error("Output failed: {0}")]
    Output(#[from] SinkError),
}

impl TailError {
    /// Errors raised while resolving the table schema and field list, before
    /// any row has been polled.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TailError::UnknownField { .. }
                | TailError::UnknownFormat { .. }
                | TailError::UnknownTimezone(_)
                | TailError::InvalidTemplate(_)
        )
    }
}
