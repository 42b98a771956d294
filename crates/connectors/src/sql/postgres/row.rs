use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::{core::value::Value, records::row::Row};
use rust_decimal::Decimal;
use tokio_postgres::{
    Row as PgRow,
    types::{FromSql, Type},
};
use tracing::warn;
use uuid::Uuid;

pub struct DbRow<'a>(pub &'a PgRow);

impl DbRow<'_> {
    pub fn to_row(&self) -> Row {
        self.0
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, column)| (column.name().to_string(), self.get_value(idx)))
            .collect()
    }

    /// Decodes column `idx` by its Postgres type; anything unmapped is read as
    /// text when the driver allows it and as `NULL` otherwise.
    pub fn get_value(&self, idx: usize) -> Value {
        let ty = self.0.columns()[idx].type_();
        let decoded = match *ty {
            Type::INT2 => self.try_get::<i16>(idx).map(|v| v.map(|v| Value::Int(v.into()))),
            Type::INT4 => self.try_get::<i32>(idx).map(|v| v.map(|v| Value::Int(v.into()))),
            Type::INT8 => self.try_get::<i64>(idx).map(|v| v.map(Value::Int)),
            Type::OID => self.try_get::<u32>(idx).map(|v| v.map(|v| Value::Uint(v.into()))),
            Type::FLOAT4 => self
                .try_get::<f32>(idx)
                .map(|v| v.map(|v| Value::Float(v.into()))),
            Type::FLOAT8 => self.try_get::<f64>(idx).map(|v| v.map(Value::Float)),
            Type::NUMERIC => self
                .try_get::<Decimal>(idx)
                .map(|v| v.map(|v| Value::Decimal(v.to_string()))),
            Type::BOOL => self.try_get::<bool>(idx).map(|v| v.map(Value::Boolean)),
            Type::TIMESTAMP => self
                .try_get::<NaiveDateTime>(idx)
                .map(|v| v.map(Value::DateTime)),
            Type::TIMESTAMPTZ => self
                .try_get::<DateTime<Utc>>(idx)
                .map(|v| v.map(Value::Timestamp)),
            Type::DATE => self.try_get::<NaiveDate>(idx).map(|v| v.map(Value::Date)),
            Type::JSON | Type::JSONB => self
                .try_get::<serde_json::Value>(idx)
                .map(|v| v.map(Value::Json)),
            Type::UUID => self
                .try_get::<Uuid>(idx)
                .map(|v| v.map(|v| Value::String(v.to_string()))),
            Type::BYTEA => self.try_get::<Vec<u8>>(idx).map(|v| v.map(Value::Bytes)),
            _ => self.try_get::<String>(idx).map(|v| v.map(Value::String)),
        };

        match decoded {
            Ok(Some(value)) => value,
            Ok(None) => Value::Null,
            Err(err) => {
                warn!(
                    column = self.0.columns()[idx].name(),
                    column_type = %ty,
                    %err,
                    "Could not decode Postgres value"
                );
                Value::Null
            }
        }
    }

    fn try_get<'a, T: FromSql<'a>>(&'a self, idx: usize) -> Result<Option<T>, tokio_postgres::Error> {
        self.0.try_get::<_, Option<T>>(idx)
    }
}
