use crate::core::value::Value;
use serde::Serialize;

/// One fetched record: column name to raw value, in select-list order.
///
/// Rows are read-only once built. Sinks and formatters only ever see shared
/// references, so nothing downstream of a fetch can alter the cursor column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Row { fields }
    }

    /// Case-insensitive lookup by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    pub fn get_or_null(&self, column: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.get(column).unwrap_or(&NULL)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Row::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
