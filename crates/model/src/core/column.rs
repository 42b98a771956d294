use serde::{Deserialize, Serialize};

/// Column names that are rendered as datetimes regardless of their declared type.
pub const DATETIME_COLUMN_NAMES: [&str; 3] = ["timestamp", "created", "updated"];

/// Schema metadata for one table column, as reported by introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub declared_type: String,
}

impl Column {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }

    /// Whether values of this column should get the datetime format by default.
    pub fn is_temporal(&self) -> bool {
        let declared = self.declared_type.trim().to_ascii_lowercase();
        declared.starts_with("datetime")
            || declared.starts_with("timestamp")
            || DATETIME_COLUMN_NAMES
                .iter()
                .any(|name| self.name.eq_ignore_ascii_case(name))
    }
}
