use crate::error::CliError;
use connectors::{
    adapter::{Adapter, DatabaseKind},
    error::ConnectorError,
    params::ConnectionTarget,
};
use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tokio_postgres::error::SqlState;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const RETRY_INTERVAL: Duration = Duration::from_secs(3);

/// MySQL `ER_BAD_DB_ERROR`.
const MYSQL_UNKNOWN_DATABASE: u16 = 1049;

/// Why a connection attempt failed, coarse enough that a retry loop reports
/// each cause once rather than once per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Unreachable,
    DatabaseNotFound,
    Server(String),
    Fatal,
}

impl FailureKind {
    pub fn of(err: &ConnectorError) -> Self {
        match err {
            ConnectorError::MySql(mysql_async::Error::Server(server))
                if server.code == MYSQL_UNKNOWN_DATABASE =>
            {
                FailureKind::DatabaseNotFound
            }
            ConnectorError::MySql(mysql_async::Error::Server(server)) => {
                FailureKind::Server(server.code.to_string())
            }
            ConnectorError::MySql(_) => FailureKind::Unreachable,
            ConnectorError::Connection(err) => match err.code() {
                Some(state) if *state == SqlState::INVALID_CATALOG_NAME => {
                    FailureKind::DatabaseNotFound
                }
                Some(state) => FailureKind::Server(state.code().to_string()),
                None => FailureKind::Unreachable,
            },
            ConnectorError::InvalidUrl(_)
            | ConnectorError::TlsConfig(_)
            | ConnectorError::MissingParameter(_) => FailureKind::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, FailureKind::Fatal)
    }
}

pub async fn connect(
    kind: DatabaseKind,
    target: &ConnectionTarget,
    retry: bool,
    cancel: &CancellationToken,
) -> Result<Adapter, CliError> {
    info!(driver = %kind, target = %target.describe(), "Connecting");
    retry_connect(|| Adapter::connect(kind, target), retry, RETRY_INTERVAL, cancel).await
}

/// Runs `attempt` until it succeeds, a non-retryable error occurs, retrying
/// is disabled, or `cancel` fires.
pub async fn retry_connect<F, Fut, T>(
    mut attempt: F,
    retry: bool,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<T, CliError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ConnectorError>>,
{
    let mut reported: Option<FailureKind> = None;

    loop {
        let err = tokio::select! {
            _ = cancel.cancelled() => return Err(CliError::ShutdownRequested),
            result = attempt() => match result {
                Ok(connected) => {
                    if reported.is_some() {
                        info!("Connection established");
                    }
                    return Ok(connected);
                }
                Err(err) => err,
            },
        };

        let kind = FailureKind::of(&err);
        if !retry || !kind.is_retryable() {
            return Err(err.into());
        }

        if reported.as_ref() != Some(&kind) {
            warn!(%err, "Connection failed, retrying every {}s", interval.as_secs());
            reported = Some(kind);
        } else {
            debug!(%err, "Connection still failing");
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(CliError::ShutdownRequested),
            _ = sleep(interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    fn unknown_database() -> ConnectorError {
        ConnectorError::MySql(mysql_async::Error::Server(mysql_async::ServerError {
            code: MYSQL_UNKNOWN_DATABASE,
            message: "Unknown database 'app_log'".into(),
            state: "42000".into(),
        }))
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(FailureKind::of(&unknown_database()), FailureKind::DatabaseNotFound);
        assert_eq!(
            FailureKind::of(&ConnectorError::MissingParameter("host")),
            FailureKind::Fatal
        );
        assert!(!FailureKind::of(&ConnectorError::InvalidUrl("x".into())).is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_connected() {
        let attempts = AtomicUsize::new(0);
        let started = Instant::now();

        let result = retry_connect(
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move { if n < 2 { Err(unknown_database()) } else { Ok(n) } }
            },
            true,
            RETRY_INTERVAL,
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), RETRY_INTERVAL * 2);
    }

    #[tokio::test]
    async fn test_no_retry_fails_fast() {
        let attempts = AtomicUsize::new(0);

        let result: Result<(), _> = retry_connect(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(unknown_database()) }
            },
            false,
            RETRY_INTERVAL,
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(CliError::Connection(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fatal_errors_are_not_retried() {
        let result: Result<(), _> = retry_connect(
            || async { Err(ConnectorError::MissingParameter("user")) },
            true,
            RETRY_INTERVAL,
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(
            result,
            Err(CliError::Connection(ConnectorError::MissingParameter("user")))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_retrying() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(4)).await;
            canceller.cancel();
        });

        let result: Result<(), _> = retry_connect(
            || async { Err(unknown_database()) },
            true,
            RETRY_INTERVAL,
            &token,
        )
        .await;

        assert!(matches!(result, Err(CliError::ShutdownRequested)));
    }
}
