use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of the tail within the table's strictly increasing key.
///
/// `Start` sorts below every real key, so a tail that begins on an empty
/// table picks up the very first insert.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Cursor {
    #[default]
    Start,
    At(i128),
}

impl Cursor {
    pub fn key(&self) -> Option<i128> {
        match self {
            Cursor::Start => None,
            Cursor::At(key) => Some(*key),
        }
    }

    /// Whether a row with this key lies strictly beyond the cursor.
    pub fn admits(&self, key: i128) -> bool {
        match self {
            Cursor::Start => true,
            Cursor::At(last) => key > *last,
        }
    }

    /// Move forward to `key`. Never moves backwards.
    pub fn advance(&mut self, key: i128) {
        let next = Cursor::At(key);
        if next > *self {
            *self = next;
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Start => write!(f, "start"),
            Cursor::At(key) => write!(f, "{key}"),
        }
    }
}
