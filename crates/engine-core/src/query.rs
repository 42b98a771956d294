use crate::filter::{FilterSet, compose};
use connectors::sql::dialect::Dialect;
use model::pagination::cursor::Cursor;

/// Builds the two statements a tail issues against its table.
pub struct TailQuery<'a> {
    dialect: &'a dyn Dialect,
    table: String,
    key: String,
    /// Each caller fragment parenthesized, so an `OR` inside one cannot
    /// escape the cursor predicate.
    filters: Vec<String>,
}

impl<'a> TailQuery<'a> {
    pub fn new(dialect: &'a dyn Dialect, table: &str, key: &str, filters: &FilterSet) -> Self {
        Self {
            dialect,
            table: dialect.quote_path(table),
            key: dialect.quote_identifier(key),
            filters: filters
                .fragments()
                .iter()
                .map(|fragment| format!("({fragment})"))
                .collect(),
        }
    }

    /// Highest key currently matching the filters.
    pub fn last_key(&self) -> String {
        statement(&[
            format!("SELECT {} FROM {}", self.key, self.table).as_str(),
            compose(&self.filters, None).as_str(),
            format!("ORDER BY {} DESC LIMIT 1", self.key).as_str(),
        ])
    }

    /// Rows beyond `cursor` in key order. The key is always the first column.
    pub fn rows_after(&self, columns: &[&str], cursor: &Cursor, limit: Option<usize>) -> String {
        let mut select = vec![self.key.clone()];
        select.extend(
            columns
                .iter()
                .map(|column| self.dialect.quote_identifier(column))
                .filter(|quoted| *quoted != self.key),
        );

        let predicate = cursor.key().map(|key| format!("{} > {key}", self.key));
        let limit = limit.map(|n| format!("LIMIT {n}")).unwrap_or_default();

        statement(&[
            format!("SELECT {} FROM {}", select.join(", "), self.table).as_str(),
            compose(&self.filters, predicate.as_deref()).as_str(),
            format!("ORDER BY {} ASC", self.key).as_str(),
            limit.as_str(),
        ])
    }
}

fn statement(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}
