use crate::error::ConnectorError;

/// Discrete connection parameters, as resolved from flags, environment and
/// option files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl ConnectionParams {
    pub fn host(&self) -> Result<&str, ConnectorError> {
        self.host
            .as_deref()
            .ok_or(ConnectorError::MissingParameter("host"))
    }

    pub fn user(&self) -> Result<&str, ConnectorError> {
        self.user
            .as_deref()
            .ok_or(ConnectorError::MissingParameter("user"))
    }

    pub fn database(&self) -> Result<&str, ConnectorError> {
        self.database
            .as_deref()
            .ok_or(ConnectorError::MissingParameter("database"))
    }
}

/// Where to connect: either a driver URL or individual parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    Url(String),
    Params(ConnectionParams),
}

impl ConnectionTarget {
    /// A printable description with the password left out.
    pub fn describe(&self) -> String {
        match self {
            ConnectionTarget::Url(url) => redact_url(url),
            ConnectionTarget::Params(p) => format!(
                "{}@{}:{}/{}",
                p.user.as_deref().unwrap_or(""),
                p.host.as_deref().unwrap_or(""),
                p.port.map(|port| port.to_string()).unwrap_or_default(),
                p.database.as_deref().unwrap_or("")
            ),
        }
    }
}

fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.split_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or("");
            format!("{scheme}://{user}@{host}")
        }
        None => url.to_string(),
    }
}
