use crate::field::{Field, FormatPolicy};
use chrono_tz::Tz;
use model::core::value::Value;

const DATETIME_PATTERN: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Rendered datetimes are clipped to this many characters.
pub const DATETIME_WIDTH: usize = 24;

/// Renders one raw value for output. Never fails: anything the policy
/// cannot interpret is printed in its raw string form.
pub fn format(field: &Field, raw: &Value) -> String {
    match &field.policy {
        FormatPolicy::Datetime => format_datetime(raw, field.timezone),
        FormatPolicy::Custom(custom) => custom.apply(raw),
        FormatPolicy::Text => pad_and_truncate(raw.to_string(), field),
    }
}

fn format_datetime(raw: &Value, tz: Tz) -> String {
    match raw.as_timestamp() {
        Some(ts) => ts
            .with_timezone(&tz)
            .format(DATETIME_PATTERN)
            .to_string()
            .chars()
            .take(DATETIME_WIDTH)
            .collect(),
        None => raw.to_string(),
    }
}

// Left padding keeps the tail of the text, right padding and plain truncation
// keep the head.
fn pad_and_truncate(text: String, field: &Field) -> String {
    if field.left_pad > 0 {
        let padded = format!("{text:>width$}", width = field.left_pad);
        return keep_last(padded, field.truncate);
    }
    if field.right_pad > 0 {
        let padded = format!("{text:<width$}", width = field.right_pad);
        return keep_first(padded, field.truncate);
    }
    keep_first(text, field.truncate)
}

fn keep_first(text: String, limit: usize) -> String {
    if limit == 0 || text.chars().count() <= limit {
        return text;
    }
    text.chars().take(limit).collect()
}

fn keep_last(text: String, limit: usize) -> String {
    let len = text.chars().count();
    if limit == 0 || len <= limit {
        return text;
    }
    text.chars().skip(len - limit).collect()
}
