use chrono::{NaiveDate, NaiveDateTime};
use model::{core::value::Value, records::row::Row};
use mysql_async::{
    Column as MySqlColumn, FromValueError, Row as MySqlRow, Value as MySqlValue,
    consts::{ColumnFlags, ColumnType},
    from_value_opt,
};
use tracing::warn;

/// Character set id MySQL reports for binary strings and blobs.
const BINARY_CHARSET: u16 = 63;

pub struct DbRow<'a>(pub &'a MySqlRow);

impl DbRow<'_> {
    pub fn to_row(&self) -> Row {
        self.0
            .columns_ref()
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let value = match self.0.as_ref(idx) {
                    Some(raw) => decode(raw, column),
                    None => Value::Null,
                };
                (column.name_str().into_owned(), value)
            })
            .collect()
    }
}

/// Decodes one wire value using the result-set column type.
pub fn decode(raw: &MySqlValue, column: &MySqlColumn) -> Value {
    if matches!(raw, MySqlValue::NULL) {
        return Value::Null;
    }

    let decoded = match column.column_type() {
        ColumnType::MYSQL_TYPE_TINY
        | ColumnType::MYSQL_TYPE_SHORT
        | ColumnType::MYSQL_TYPE_LONG
        | ColumnType::MYSQL_TYPE_INT24
        | ColumnType::MYSQL_TYPE_LONGLONG
        | ColumnType::MYSQL_TYPE_YEAR => {
            if column.flags().contains(ColumnFlags::UNSIGNED_FLAG) {
                from_value_opt::<u64>(raw.clone()).map(Value::Uint)
            } else {
                from_value_opt::<i64>(raw.clone()).map(Value::Int)
            }
        }
        ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => {
            from_value_opt::<f64>(raw.clone()).map(Value::Float)
        }
        ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
            from_value_opt::<String>(raw.clone()).map(Value::Decimal)
        }
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE => {
            from_value_opt::<NaiveDate>(raw.clone()).map(Value::Date)
        }
        ColumnType::MYSQL_TYPE_DATETIME
        | ColumnType::MYSQL_TYPE_DATETIME2
        | ColumnType::MYSQL_TYPE_TIMESTAMP
        | ColumnType::MYSQL_TYPE_TIMESTAMP2 => {
            from_value_opt::<NaiveDateTime>(raw.clone()).map(Value::DateTime)
        }
        ColumnType::MYSQL_TYPE_JSON => from_value_opt::<String>(raw.clone()).map(|text| {
            serde_json::from_str(&text)
                .map(Value::Json)
                .unwrap_or(Value::String(text))
        }),
        ColumnType::MYSQL_TYPE_TINY_BLOB
        | ColumnType::MYSQL_TYPE_MEDIUM_BLOB
        | ColumnType::MYSQL_TYPE_LONG_BLOB
        | ColumnType::MYSQL_TYPE_BLOB
        | ColumnType::MYSQL_TYPE_VAR_STRING
        | ColumnType::MYSQL_TYPE_STRING
        | ColumnType::MYSQL_TYPE_VARCHAR
        | ColumnType::MYSQL_TYPE_BIT
        | ColumnType::MYSQL_TYPE_GEOMETRY
            if column.character_set() == BINARY_CHARSET =>
        {
            from_value_opt::<Vec<u8>>(raw.clone()).map(Value::Bytes)
        }
        _ => from_value_opt::<String>(raw.clone()).map(Value::String),
    };

    decoded.unwrap_or_else(|FromValueError(raw)| {
        warn!(
            column = %column.name_str(),
            column_type = ?column.column_type(),
            "Could not decode MySQL value, falling back to text"
        );
        text_fallback(&raw)
    })
}

fn text_fallback(raw: &MySqlValue) -> Value {
    match raw {
        MySqlValue::NULL => Value::Null,
        MySqlValue::Bytes(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        MySqlValue::Int(v) => Value::Int(*v),
        MySqlValue::UInt(v) => Value::Uint(*v),
        MySqlValue::Float(v) => Value::Float(f64::from(*v)),
        MySqlValue::Double(v) => Value::Float(*v),
        other => Value::String(other.as_sql(true).trim_matches('\'').to_string()),
    }
}
