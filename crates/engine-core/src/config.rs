use crate::{backoff::PollSettings, error::TailError, registry::FieldSelection};
use chrono_tz::Tz;
use model::pagination::cursor::Cursor;

pub const DEFAULT_TABLE: &str = "log";
pub const DEFAULT_KEY_COLUMN: &str = "id";
pub const DEFAULT_DELIMITER: &str = " ";

/// Everything the tail engine needs besides its executor and sinks.
#[derive(Debug, Clone)]
pub struct TailConfig {
    pub table: String,
    /// Strictly increasing integer column the cursor follows.
    pub key_column: String,
    pub fields: FieldSelection,
    /// Raw SQL predicates, ANDed together.
    pub filters: Vec<String>,
    pub timezone: Tz,
    pub delimiter: String,
    pub poll: PollSettings,
    /// Upper bound on rows per poll. `None` fetches everything new.
    pub batch_limit: Option<usize>,
    /// Resume after this cursor instead of the table's current maximum.
    pub start_after: Option<Cursor>,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            fields: FieldSelection::All,
            filters: Vec::new(),
            timezone: Tz::UTC,
            delimiter: DEFAULT_DELIMITER.to_string(),
            poll: PollSettings::default(),
            batch_limit: None,
            start_after: None,
        }
    }
}

impl TailConfig {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = column.into();
        self
    }

    pub fn fields(mut self, fields: FieldSelection) -> Self {
        self.fields = fields;
        self
    }

    pub fn filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = filters.into_iter().map(Into::into).collect();
        self
    }

    pub fn timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn batch_limit(mut self, limit: Option<usize>) -> Self {
        self.batch_limit = limit.filter(|n| *n > 0);
        self
    }

    pub fn start_after(mut self, cursor: Cursor) -> Self {
        self.start_after = Some(cursor);
        self
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, TailError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| TailError::UnknownTimezone(name.to_string()))
}
