//! End-to-end checks against file-backed SQLite.

use std::path::Path;
use std::sync::Arc;

use chrono::DateTime;
use dbsink_core::{LogEvent, LogLevel, PropertyValue};
use dbsink_sql::{
    ColumnDefinition, DataKind, Dialect, Schema, SinkOptions, StandardColumn, build_create_table,
};
use dbsink_writer::{
    AuditSink, BatchOptions, BatchSink, BatchWriteFailure, DbSinkLayer, PoolConfig,
    SqliteConnectionFactory, provision,
};
use parking_lot::Mutex;
use rusqlite::Connection;
use tracing_subscriber::layer::SubscriberExt;

fn age_options() -> SinkOptions {
    let mut opts = SinkOptions::default();
    opts.columns.store = vec![
        StandardColumn::Message,
        StandardColumn::Level,
        StandardColumn::TimeStamp,
        StandardColumn::Id,
    ];
    opts.columns.additional_columns = vec![ColumnDefinition::new("Age", DataKind::Int32)];
    opts
}

fn count(path: &Path) -> i64 {
    let conn = Connection::open(path).unwrap();
    conn.query_row("SELECT COUNT(*) FROM Logs", [], |r| r.get(0))
        .unwrap()
}

fn ts() -> chrono::DateTime<chrono::FixedOffset> {
    DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z").unwrap()
}

// ── provisioning ────────────────────────────────────────────────────

#[test]
fn ddl_runs_twice() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs.db");
    let mut opts = SinkOptions::default();
    opts.columns.level.column.non_clustered_index = true;
    let schema = Schema::build(&opts).unwrap();
    let strategy = Dialect::Sqlite.strategy();

    let sql = build_create_table(&strategy, &schema).unwrap();
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(&sql).unwrap();
    conn.execute_batch(&sql).unwrap();

    let factory = SqliteConnectionFactory::file(&path);
    provision(&strategy, &schema, &factory).unwrap();
    assert_eq!(count(&path), 0);
}

// ── audit ───────────────────────────────────────────────────────────

#[test]
fn audit_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.db");
    let sink = AuditSink::new(
        &age_options(),
        Dialect::Sqlite.strategy(),
        SqliteConnectionFactory::file(&path),
    )
    .unwrap();

    sink.emit(&LogEvent::new(ts(), LogLevel::Information, "User {Name} is {Age}")
        .with_property("Name", "ada")
        .with_property("Age", 30))
        .unwrap();
    sink.emit(&LogEvent::new(ts(), LogLevel::Error, "no age")
        .with_property("Age", PropertyValue::null()))
        .unwrap();
    sink.dispose();

    let conn = Connection::open(&path).unwrap();
    let rows: Vec<(i64, String, String, String, Option<i64>)> = conn
        .prepare("SELECT Id, Message, Level, TimeStamp, Age FROM Logs ORDER BY Id")
        .unwrap()
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, 1);
    assert_eq!(rows[0].1, "User \"ada\" is 30");
    assert_eq!(rows[0].2, "Information");
    assert_eq!(rows[0].3, "2024-01-15 12:00:00.000000");
    assert_eq!(rows[0].4, Some(30));
    assert_eq!(rows[1].4, None);
}

#[test]
fn level_as_enum_stores_ordinal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("enum.db");
    let mut opts = age_options();
    opts.columns.level.store_as_enum = true;
    let sink = AuditSink::new(&opts, Dialect::Sqlite.strategy(), SqliteConnectionFactory::file(&path))
        .unwrap();
    sink.emit(&LogEvent::new(ts(), LogLevel::Warning, "w")).unwrap();

    let conn = Connection::open(&path).unwrap();
    let level: i64 = conn
        .query_row("SELECT Level FROM Logs", [], |r| r.get(0))
        .unwrap();
    assert_eq!(level, 3);
}

// ── batch ───────────────────────────────────────────────────────────

#[test]
fn batch_round_trip_through_pool() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batch.db");
    let factory = SqliteConnectionFactory::pool_file(&path, &PoolConfig::default()).unwrap();
    let sink = BatchSink::new(
        &SinkOptions::default(),
        Dialect::Sqlite.strategy(),
        factory,
        BatchOptions::default(),
    )
    .unwrap();

    let events: Vec<LogEvent> = (0..25)
        .map(|i| LogEvent::new(ts(), LogLevel::Debug, "n={N}").with_property("N", i))
        .collect();
    assert_eq!(sink.emit_batch(&events), 25);
    assert_eq!(count(&path), 25);

    let conn = Connection::open(&path).unwrap();
    let props: String = conn
        .query_row("SELECT Properties FROM Logs WHERE Id = 3", [], |r| r.get(0))
        .unwrap();
    assert_eq!(props, "<properties><property key='N'>2</property></properties>");
}

#[test]
fn batch_failure_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fail.db");
    let mut opts = SinkOptions::default();
    opts.auto_create_table = false;
    let reports = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&reports);
    let sink = BatchSink::new(
        &opts,
        Dialect::Sqlite.strategy(),
        SqliteConnectionFactory::file(&path),
        BatchOptions::default(),
    )
    .unwrap()
    .with_diagnostics(Arc::new(move |f: &BatchWriteFailure| {
        seen.lock().push((f.attempted, f.written));
    }));

    let events = vec![LogEvent::new(ts(), LogLevel::Information, "x"); 3];
    assert_eq!(sink.emit_batch(&events), 0);
    assert_eq!(*reports.lock(), vec![(3, 0)]);
}

// ── tracing layer ───────────────────────────────────────────────────

#[test]
fn layer_writes_tracing_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layer.db");
    let mut opts = SinkOptions::default();
    opts.columns.additional_columns = vec![ColumnDefinition::new("attempt", DataKind::Int32)];
    let sink = BatchSink::new(
        &opts,
        Dialect::Sqlite.strategy(),
        SqliteConnectionFactory::file(&path),
        BatchOptions::default(),
    )
    .unwrap();
    let layer = DbSinkLayer::new(sink);
    let handle = layer.handle();

    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(target: "app", attempt = 2, "retrying");
        tracing::error!(target: "app", exception = "timeout", "gave up");
    });
    handle.flush();

    let conn = Connection::open(&path).unwrap();
    let (message, level, exception, attempt): (String, String, Option<String>, Option<i64>) = conn
        .query_row(
            "SELECT Message, Level, Exception, attempt FROM Logs ORDER BY Id DESC LIMIT 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .unwrap();
    assert_eq!(message, "gave up");
    assert_eq!(level, "Error");
    assert_eq!(exception.as_deref(), Some("timeout"));
    assert_eq!(attempt, None);
    assert_eq!(count(&path), 2);
}
