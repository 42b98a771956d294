use connectors::error::ConnectorError;
use engine_core::error::TailError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing connection parameter '{0}' (flag, environment or option file)")]
    MissingParameter(&'static str),

    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Failed to parse the field template: {0}")]
    TemplateParse(#[source] serde_json::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Failed to connect: {0}")]
    Connection(#[from] ConnectorError),

    #[error(transparent)]
    Tail(#[from] TailError),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
