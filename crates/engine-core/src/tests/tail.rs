#[cfg(test)]
mod tests {
    use crate::{
        backoff::PollSettings,
        config::TailConfig,
        error::TailError,
        field::FormatterCatalog,
        registry::FieldSelection,
        sink::{OutputSink, SinkError},
        tail::{PollOutcome, TailEngine},
        tests::mock::{MemoryTable, log_row},
    };
    use connectors::error::DbError;
    use model::{
        core::value::Value, pagination::cursor::Cursor, records::row::Row,
        template::field_spec::FieldSpec,
    };
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };
    use tokio::time::{Instant, sleep};
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    type Lines = Arc<Mutex<Vec<String>>>;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn collector() -> (Lines, impl OutputSink + 'static) {
        let lines: Lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = lines.clone();
        let sink = move |line: &str| sink_lines.lock().unwrap().push(line.to_string());
        (lines, sink)
    }

    fn fields(list: &str) -> TailConfig {
        TailConfig::default().fields(FieldSelection::from_list(list))
    }

    async fn tail(table: &Arc<MemoryTable>, config: TailConfig) -> TailEngine {
        TailEngine::new(table.clone(), config).await.unwrap()
    }

    struct FailingSink {
        accepted: usize,
        capacity: usize,
    }

    impl OutputSink for FailingSink {
        fn write_line(&mut self, _line: &str) -> Result<(), SinkError> {
            if self.accepted == self.capacity {
                return Err(SinkError::Closed);
            }
            self.accepted += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_initial_cursor_is_current_max() {
        let table = Arc::new(MemoryTable::with_ids(100));
        let engine = tail(&table, TailConfig::default()).await;

        assert_eq!(engine.cursor(), Cursor::At(100));
        assert_eq!(
            table.queries(),
            vec!["SELECT `id` FROM `log` ORDER BY `id` DESC LIMIT 1"]
        );
    }

    #[tokio::test]
    async fn test_empty_table_picks_up_first_insert() {
        let table = Arc::new(MemoryTable::new());
        let (lines, sink) = collector();
        let mut engine = tail(&table, fields("id,message")).await.with_sink(sink);
        assert_eq!(engine.cursor(), Cursor::Start);

        assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Empty);
        table.insert(1, 10, "first");
        assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Emitted(1));

        assert_eq!(*lines.lock().unwrap(), vec!["1 first"]);
        assert_eq!(engine.cursor(), Cursor::At(1));
        assert_eq!(
            table.queries()[1],
            "SELECT `id`, `message` FROM `log` ORDER BY `id` ASC"
        );
    }

    #[traced_test]
    #[tokio::test(start_paused = true)]
    async fn test_tail_new_rows_then_back_off() {
        let table = Arc::new(MemoryTable::with_ids(100));
        let (lines, sink) = collector();
        let mut engine = tail(&table, fields("id,level,message")).await.with_sink(sink);

        assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Empty);
        assert!(lines.lock().unwrap().is_empty());

        table.insert(101, 10, "first");
        table.insert(102, 20, "second");
        assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Emitted(2));
        assert_eq!(*lines.lock().unwrap(), vec!["101 10 first", "102 20 second"]);
        assert_eq!(engine.cursor(), Cursor::At(102));

        let summary = engine.run(Some(ms(50))).await.unwrap();
        let offsets = table.poll_offsets();
        let gap = offsets[offsets.len() - 1] - offsets[offsets.len() - 2];

        assert_eq!(gap, ms(100));
        assert_eq!(summary.cursor, Cursor::At(102));
        assert_eq!(summary.rows_emitted, 2);
        assert!(table.queries().last().unwrap().contains("WHERE `id` > 102"));
        assert!(logs_contain("Tailing stopped"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_to_ceiling() {
        let table = Arc::new(MemoryTable::new());
        let mut engine = tail(&table, TailConfig::default()).await;

        let summary = engine.run(Some(Duration::from_secs(3))).await.unwrap();

        assert_eq!(
            table.poll_offsets(),
            vec![ms(0), ms(100), ms(300), ms(700), ms(1500), ms(2500), ms(3500)]
        );
        assert_eq!(summary.polls, 7);
        assert_eq!(summary.empty_polls, 7);
        assert_eq!(summary.cursor, Cursor::Start);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_resets_after_rows() {
        let table = Arc::new(MemoryTable::with_ids(5));
        let mut engine = tail(&table, TailConfig::default()).await;

        let writer = table.clone();
        tokio::spawn(async move {
            sleep(ms(250)).await;
            writer.insert(6, 10, "late");
        });

        let summary = engine.run(Some(Duration::from_secs(1))).await.unwrap();

        assert_eq!(
            &table.poll_offsets()[..5],
            &[ms(0), ms(100), ms(300), ms(300), ms(400)]
        );
        assert_eq!(summary.rows_emitted, 1);
        assert_eq!(summary.cursor, Cursor::At(6));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_stale_rows_never_move_cursor_back() {
        let table = Arc::new(MemoryTable::with_ids(100));
        let (lines, sink) = collector();
        let mut engine = tail(&table, fields("id")).await.with_sink(sink);

        let keyless: Row = [("id", Value::Null)].into_iter().collect();
        table.script(vec![
            log_row(99, 10, "old"),
            log_row(101, 10, "new"),
            log_row(100, 10, "old"),
            keyless,
            log_row(103, 10, "newer"),
        ]);

        assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Emitted(2));
        assert_eq!(*lines.lock().unwrap(), vec!["101", "103"]);
        assert_eq!(engine.cursor(), Cursor::At(103));
        assert!(logs_contain("Row at or behind the cursor"));
        assert!(logs_contain("Row without an integer key"));
    }

    #[tokio::test]
    async fn test_stale_only_batch_is_empty() {
        let table = Arc::new(MemoryTable::with_ids(100));
        let mut engine = tail(&table, TailConfig::default()).await;

        table.script(vec![log_row(50, 10, "old")]);

        assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Empty);
        assert_eq!(engine.cursor(), Cursor::At(100));
    }

    #[tokio::test]
    async fn test_every_new_row_emitted_once_in_order() {
        let table = Arc::new(MemoryTable::with_ids(3));
        let (lines, sink) = collector();
        let mut engine = tail(&table, fields("id")).await.with_sink(sink);

        for batch in [vec![4, 5], vec![], vec![6], vec![7, 8, 9]] {
            for id in batch {
                table.insert(id, 10, "x");
            }
            engine.poll_once().await.unwrap();
        }
        engine.poll_once().await.unwrap();

        assert_eq!(
            *lines.lock().unwrap(),
            vec!["4", "5", "6", "7", "8", "9"]
        );
        assert_eq!(engine.cursor(), Cursor::At(9));
    }

    #[tokio::test]
    async fn test_query_error_propagates() {
        let table = Arc::new(MemoryTable::with_ids(10));
        let mut engine = tail(&table, TailConfig::default()).await;

        table.fail_next(DbError::Unknown("connection reset".into()));
        let err = engine.poll_once().await.unwrap_err();

        assert!(matches!(err, TailError::Query(DbError::Unknown(_))));
        assert_eq!(engine.cursor(), Cursor::At(10));
    }

    #[tokio::test]
    async fn test_init_error_propagates() {
        let table = Arc::new(MemoryTable::new());
        table.fail_next(DbError::Unknown("access denied".into()));

        let result = TailEngine::new(table.clone(), TailConfig::default()).await;
        assert!(matches!(result, Err(TailError::Query(_))));
    }

    #[tokio::test]
    async fn test_failing_sink_keeps_cursor_at_last_emitted() {
        let table = Arc::new(MemoryTable::with_ids(100));
        let mut engine = tail(&table, TailConfig::default()).await.with_sink(FailingSink {
            accepted: 0,
            capacity: 1,
        });

        for id in 101..=103 {
            table.insert(id, 10, "x");
        }
        let err = engine.poll_once().await.unwrap_err();

        assert!(matches!(err, TailError::Output(SinkError::Closed)));
        assert_eq!(engine.cursor(), Cursor::At(101));
    }

    #[tokio::test]
    async fn test_sinks_called_in_registration_order() {
        let table = Arc::new(MemoryTable::with_ids(1));
        let order: Lines = Arc::new(Mutex::new(Vec::new()));

        let mut engine = tail(&table, fields("id")).await;
        for name in ["first", "second"] {
            let order = order.clone();
            engine.add_sink(move |line: &str| order.lock().unwrap().push(format!("{name}:{line}")));
        }

        table.insert(2, 10, "x");
        engine.poll_once().await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["first:2", "second:2"]);
    }

    #[tokio::test]
    async fn test_batch_limit_pages_through_backlog() {
        let table = Arc::new(MemoryTable::with_ids(100));
        let config = TailConfig::default().batch_limit(Some(2));
        let mut engine = tail(&table, config).await;

        for id in 101..=105 {
            table.insert(id, 10, "x");
        }

        assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Emitted(2));
        assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Emitted(2));
        assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Emitted(1));
        assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Empty);
        assert_eq!(engine.cursor(), Cursor::At(105));

        let queries = table.queries();
        assert!(queries[1].ends_with("WHERE `id` > 100 ORDER BY `id` ASC LIMIT 2"));
        assert!(queries[2].contains("WHERE `id` > 102"));
    }

    #[tokio::test]
    async fn test_filters_apply_to_both_queries() {
        let table = Arc::new(MemoryTable::with_ids(100));
        let config = TailConfig::default().filters(["level >= 20", "message <> ''"]);
        let mut engine = tail(&table, config).await;
        engine.poll_once().await.unwrap();

        let queries = table.queries();
        assert_eq!(
            queries[0],
            "SELECT `id` FROM `log` WHERE (level >= 20) AND (message <> '') ORDER BY `id` DESC LIMIT 1"
        );
        assert!(queries[1].contains("WHERE (level >= 20) AND (message <> '') AND `id` > 100"));
    }

    #[tokio::test]
    async fn test_or_filter_keeps_cursor_bound() {
        let table = Arc::new(MemoryTable::with_ids(100));
        let (lines, sink) = collector();
        let config = fields("id")
            .filters(["level = 10 OR level = 20"])
            .batch_limit(Some(2));
        let mut engine = tail(&table, config).await.with_sink(sink);
        table.insert(101, 20, "new");

        assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Emitted(1));
        assert_eq!(*lines.lock().unwrap(), vec!["101"]);
        assert!(
            table.queries()[1]
                .contains("WHERE (level = 10 OR level = 20) AND `id` > 100 ORDER BY `id` ASC LIMIT 2")
        );
    }

    #[tokio::test]
    async fn test_start_after_skips_key_lookup() {
        let table = Arc::new(MemoryTable::with_ids(10));
        let (lines, sink) = collector();
        let config = fields("id").start_after(Cursor::At(8));
        let mut engine = tail(&table, config).await.with_sink(sink);

        assert!(table.queries().is_empty());
        engine.poll_once().await.unwrap();
        assert_eq!(*lines.lock().unwrap(), vec!["9", "10"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_backoff() {
        let table = Arc::new(MemoryTable::new());
        let token = CancellationToken::new();
        let mut engine = tail(&table, TailConfig::default())
            .await
            .with_cancellation(token.clone());

        let canceller = token.clone();
        tokio::spawn(async move {
            sleep(ms(150)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let summary = engine.run(None).await.unwrap();

        assert_eq!(summary.polls, 2);
        assert!(started.elapsed() < ms(300));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_does_not_poll() {
        let table = Arc::new(MemoryTable::new());
        let mut engine = tail(&table, TailConfig::default()).await;
        engine.cancellation_token().cancel();

        let summary = engine.run(None).await.unwrap();
        assert_eq!(summary.polls, 0);
    }

    #[tokio::test]
    async fn test_custom_poll_settings() {
        let table = Arc::new(MemoryTable::new());
        let poll = PollSettings::new(ms(1), ms(2), 2);
        let mut engine = tail(&table, TailConfig::default().poll(poll)).await;

        let summary = engine.run(Some(ms(5))).await.unwrap();
        assert!(summary.polls >= 3);
    }

    #[tokio::test]
    async fn test_unknown_key_column() {
        let table = Arc::new(MemoryTable::new());
        let result = TailEngine::new(table.clone(), TailConfig::default().key_column("seq")).await;

        assert!(matches!(
            result,
            Err(TailError::UnknownField { ref field, .. }) if field == "seq"
        ));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_key_column_takes_schema_spelling() {
        let table = Arc::new(MemoryTable::postgres());
        table.insert(7, 10, "old");
        let (lines, sink) = collector();
        let config = fields("id,message").key_column("ID");
        let mut engine = tail(&table, config).await.with_sink(sink);
        assert_eq!(engine.cursor(), Cursor::At(7));

        table.insert(8, 10, "new");
        assert_eq!(engine.poll_once().await.unwrap(), PollOutcome::Emitted(1));
        assert_eq!(*lines.lock().unwrap(), vec!["8 new"]);

        let queries = table.queries();
        assert_eq!(
            queries[0],
            r#"SELECT "id" FROM "log" ORDER BY "id" DESC LIMIT 1"#
        );
        assert_eq!(
            queries[1],
            r#"SELECT "id", "message" FROM "log" WHERE "id" > 7 ORDER BY "id" ASC"#
        );
        assert!(logs_contain("dialect=PostgreSQL"));
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let table = Arc::new(MemoryTable::new());
        let result = TailEngine::new(table.clone(), TailConfig::new("audit")).await;

        assert!(matches!(
            result,
            Err(TailError::Query(DbError::TableNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_template_and_columns() {
        let table = Arc::new(MemoryTable::with_ids(1));
        let engine = tail(&table, fields("timestamp,message")).await;

        let names: Vec<_> = engine.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "timestamp", "level", "message"]);

        let template = engine.field_template();
        assert_eq!(template.len(), 2);
        assert_eq!(template[0].format.as_deref(), Some("datetime"));
        assert_eq!(template[1].format.as_deref(), Some("string"));

        let config = TailConfig::default().fields(FieldSelection::Template(template.clone()));
        let again = tail(&table, config).await.field_template();
        assert_eq!(again, template);
    }

    #[tokio::test]
    async fn test_custom_formatter_from_catalog() {
        let table = Arc::new(MemoryTable::with_ids(1));
        let (lines, sink) = collector();

        let mut catalog = FormatterCatalog::new();
        catalog.register("level_name", |v: &Value| match v.as_i128() {
            Some(10) => "INFO".to_string(),
            Some(20) => "WARN".to_string(),
            _ => v.to_string(),
        });

        let template = vec![
            FieldSpec {
                format: Some("level_name".into()),
                ..FieldSpec::named("level")
            },
            FieldSpec::named("message"),
        ];
        let config = TailConfig::default()
            .fields(FieldSelection::Template(template))
            .delimiter(" | ");
        let mut engine = TailEngine::with_catalog(table.clone(), config, &catalog)
            .await
            .unwrap()
            .with_sink(sink);

        table.insert(2, 20, "disk almost full");
        engine.poll_once().await.unwrap();

        assert_eq!(*lines.lock().unwrap(), vec!["WARN | disk almost full"]);
    }
}
