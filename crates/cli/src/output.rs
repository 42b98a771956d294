use crate::error::CliError;
use clap::ValueEnum;
use model::{core::column::Column, template::field_spec::FieldSpec};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

/// How an item prints in text mode.
pub trait TextLine {
    fn text_line(&self) -> String;
}

impl TextLine for Column {
    fn text_line(&self) -> String {
        format!("{} {}", self.name, self.declared_type)
    }
}

impl TextLine for FieldSpec {
    fn text_line(&self) -> String {
        format!(
            "{} format={} truncate={} left_pad={} right_pad={} tz={}",
            self.name,
            self.format.as_deref().unwrap_or("-"),
            self.truncate,
            self.left_pad,
            self.right_pad,
            self.tz.as_deref().unwrap_or("-"),
        )
    }
}

pub fn render<T: Serialize + TextLine>(items: &[T], format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => render_json(items),
        OutputFormat::Text => Ok(items
            .iter()
            .map(TextLine::text_line)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// A JSON array with one compact item per line, so templates stay easy to
/// edit and diff by hand.
fn render_json<T: Serialize>(items: &[T]) -> Result<String, CliError> {
    if items.is_empty() {
        return Ok("[]".to_string());
    }
    let lines = items
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("[\n  {}\n]", lines.join(",\n  ")))
}
