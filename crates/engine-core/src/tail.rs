use crate::{
    backoff::Backoff,
    config::TailConfig,
    error::TailError,
    field::FormatterCatalog,
    filter::FilterSet,
    query::TailQuery,
    registry::FieldRegistry,
    sink::OutputSink,
};
use connectors::executor::QueryExecutor;
use model::{
    core::{column::Column, value::Value},
    pagination::cursor::Cursor,
    records::row::Row,
    template::field_spec::FieldSpec,
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// This many rows went out to the sinks.
    Emitted(usize),
    /// Nothing new beyond the cursor.
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TailSummary {
    pub polls: u64,
    pub empty_polls: u64,
    pub rows_emitted: u64,
    pub cursor: Cursor,
}

/// Follows an append-only table by its increasing key and prints every new
/// row to the registered sinks.
///
/// Construction resolves the schema and the output fields and positions the
/// cursor; [`TailEngine::run`] then alternates polls with backoff sleeps until
/// the timeout passes or the cancellation token fires. One engine owns its
/// cursor and backoff exclusively.
pub struct TailEngine {
    executor: Arc<dyn QueryExecutor>,
    config: TailConfig,
    columns: Vec<Column>,
    registry: FieldRegistry,
    filters: FilterSet,
    cursor: Cursor,
    backoff: Backoff,
    sinks: Vec<Box<dyn OutputSink>>,
    cancel: CancellationToken,
    summary: TailSummary,
}

impl TailEngine {
    pub async fn new(
        executor: Arc<dyn QueryExecutor>,
        config: TailConfig,
    ) -> Result<Self, TailError> {
        Self::with_catalog(executor, config, &FormatterCatalog::new()).await
    }

    pub async fn with_catalog(
        executor: Arc<dyn QueryExecutor>,
        mut config: TailConfig,
        catalog: &FormatterCatalog,
    ) -> Result<Self, TailError> {
        let columns = executor.describe(&config.table).await?;

        // Queries quote the key, so it must carry the schema's spelling.
        let key = columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(&config.key_column))
            .ok_or_else(|| TailError::UnknownField {
                table: config.table.clone(),
                field: config.key_column.clone(),
            })?;
        config.key_column = key.name.clone();

        let registry = FieldRegistry::resolve(
            &config.table,
            &config.fields,
            &columns,
            catalog,
            config.timezone,
        )?;
        let filters = FilterSet::new(config.filters.iter().cloned());

        let cursor = match config.start_after {
            Some(cursor) => cursor,
            None => {
                let query = TailQuery::new(
                    executor.dialect(),
                    &config.table,
                    &config.key_column,
                    &filters,
                );
                let sql = query.last_key();
                let rows = executor.query(&sql).await?;
                rows.first()
                    .and_then(|row| row_key(row, &config.key_column))
                    .map_or(Cursor::Start, Cursor::At)
            }
        };

        let engine = Self {
            executor,
            columns,
            registry,
            filters,
            cursor,
            backoff: Backoff::new(config.poll),
            sinks: Vec::new(),
            cancel: CancellationToken::new(),
            summary: TailSummary::default(),
            config,
        };

        info!(
            table = %engine.config.table,
            dialect = %engine.executor.dialect().name(),
            cursor = %engine.cursor,
            fields = engine.registry.fields().len(),
            "Tail initialized"
        );
        Ok(engine)
    }

    pub fn with_sink(mut self, sink: impl OutputSink + 'static) -> Self {
        self.add_sink(sink);
        self
    }

    /// Sinks receive each line in registration order.
    pub fn add_sink(&mut self, sink: impl OutputSink + 'static) -> &mut Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn field_template(&self) -> Vec<FieldSpec> {
        self.registry.template()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn summary(&self) -> TailSummary {
        TailSummary {
            cursor: self.cursor,
            ..self.summary.clone()
        }
    }

    /// Polls until the deadline passes on an empty poll, or until cancelled.
    #[instrument(skip(self), fields(table = %self.config.table))]
    pub async fn run(&mut self, timeout: Option<Duration>) -> Result<TailSummary, TailError> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        info!(cursor = %self.cursor, "Tailing started");

        loop {
            if self.cancel.is_cancelled() {
                info!("Tail cancelled");
                break;
            }

            match self.poll_once().await? {
                PollOutcome::Emitted(rows) => {
                    debug!(rows, cursor = %self.cursor, "Rows emitted");
                }
                PollOutcome::Empty => {
                    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                        info!("Timeout reached");
                        break;
                    }

                    let delay = self.backoff.next_delay();
                    debug!(?delay, "No new rows, backing off");
                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            info!("Tail cancelled");
                            break;
                        }
                        _ = sleep(delay) => {}
                    }
                }
            }
        }

        let summary = self.summary();
        info!(
            polls = summary.polls,
            rows = summary.rows_emitted,
            cursor = %summary.cursor,
            "Tailing stopped"
        );
        Ok(summary)
    }

    /// One query beyond the cursor. Emitted rows reset the backoff.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, TailError> {
        let sql = {
            let columns = self.registry.column_names();
            self.query()
                .rows_after(&columns, &self.cursor, self.config.batch_limit)
        };

        self.summary.polls += 1;
        let rows = self.executor.query(&sql).await?;
        debug!(cursor = %self.cursor, rows = rows.len(), "Polled");

        let emitted = self.emit(&rows)?;
        if emitted == 0 {
            self.summary.empty_polls += 1;
            return Ok(PollOutcome::Empty);
        }

        self.backoff.reset();
        Ok(PollOutcome::Emitted(emitted))
    }

    // The cursor moves after every delivered row, so a failing sink leaves it
    // on the last row all sinks accepted.
    fn emit(&mut self, rows: &[Row]) -> Result<usize, TailError> {
        let mut emitted = 0;

        for row in rows {
            let Some(key) = row_key(row, &self.config.key_column) else {
                warn!(key_column = %self.config.key_column, "Row without an integer key, skipping");
                continue;
            };
            if !self.cursor.admits(key) {
                warn!(key = %key, cursor = %self.cursor, "Row at or behind the cursor, skipping");
                continue;
            }

            let line = self.registry.format_row(row, &self.config.delimiter);
            for sink in self.sinks.iter_mut() {
                sink.write_line(&line)?;
            }

            self.cursor.advance(key);
            self.summary.rows_emitted += 1;
            emitted += 1;
        }

        Ok(emitted)
    }

    fn query(&self) -> TailQuery<'_> {
        TailQuery::new(
            self.executor.dialect(),
            &self.config.table,
            &self.config.key_column,
            &self.filters,
        )
    }
}

fn row_key(row: &Row, key_column: &str) -> Option<i128> {
    row.get(key_column).and_then(Value::as_i128)
}
