//! `tracing` host for the batch sink.
//!
//! [`DbSinkLayer`] implements [`tracing_subscriber::Layer`]: each event at or
//! above the minimum level becomes a [`LogEvent`] and is buffered.
//!
//! # Flushing
//!
//! - **Immediate** when the event is Warning or above.
//! - **Threshold** when the buffer reaches the batch posting limit.
//! - **Periodic** via [`spawn_flush_task`].
//!
//! The buffer is drained under its lock and written outside it; a second
//! mutex keeps at most one batch in flight.
//!
//! # Fields
//!
//! `message` becomes the template, `error` or `exception` the exception text,
//! everything else a scalar property. Span fields fill in properties the event
//! does not carry itself, innermost span first.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dbsink_core::{LogEvent, LogLevel, PropertyValue};
use parking_lot::Mutex;
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

use crate::batch::BatchSink;
use crate::connection::ConnectionFactory;

/// Events whose target starts with this prefix come from the sink itself.
const OWN_TARGET_PREFIX: &str = "dbsink_";

struct Shared<F: ConnectionFactory> {
    buffer: Mutex<Vec<LogEvent>>,
    flush_lock: Mutex<()>,
    sink: BatchSink<F>,
}

impl<F: ConnectionFactory> Shared<F> {
    fn flush(&self) {
        let _in_flight = self.flush_lock.lock();
        let events = std::mem::take(&mut *self.buffer.lock());
        if events.is_empty() {
            return;
        }
        let _ = self.sink.emit_batch(&events);
    }
}

/// Buffers `tracing` events and writes them through a [`BatchSink`].
pub struct DbSinkLayer<F: ConnectionFactory> {
    shared: Arc<Shared<F>>,
    min_level: LogLevel,
    limit: usize,
}

impl<F: ConnectionFactory> DbSinkLayer<F> {
    /// Wrap a batch sink. Every level is captured until [`Self::with_min_level`].
    pub fn new(sink: BatchSink<F>) -> Self {
        let limit = sink.options().batch_posting_limit.max(1);
        Self {
            shared: Arc::new(Shared {
                buffer: Mutex::new(Vec::with_capacity(limit)),
                flush_lock: Mutex::new(()),
                sink,
            }),
            min_level: LogLevel::Verbose,
            limit,
        }
    }

    /// Drop events below `level`.
    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Handle for flushing from outside the subscriber.
    pub fn handle(&self) -> LayerHandle<F> {
        LayerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    fn enqueue(&self, event: LogEvent) {
        let flush_now = event.level() >= LogLevel::Warning;
        let pending = {
            let mut buffer = self.shared.buffer.lock();
            buffer.push(event);
            buffer.len()
        };
        if flush_now || pending >= self.limit {
            self.shared.flush();
        }
    }
}

/// Flushes the layer's buffer.
pub struct LayerHandle<F: ConnectionFactory> {
    shared: Arc<Shared<F>>,
}

impl<F: ConnectionFactory> Clone for LayerHandle<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: ConnectionFactory> LayerHandle<F> {
    /// Write everything buffered so far.
    pub fn flush(&self) {
        self.shared.flush();
    }

    /// Number of buffered events.
    pub fn pending(&self) -> usize {
        self.shared.buffer.lock().len()
    }
}

/// Flush `handle` every `period` on the current Tokio runtime.
pub fn spawn_flush_task<F>(handle: LayerHandle<F>, period: Duration) -> tokio::task::JoinHandle<()>
where
    F: ConnectionFactory + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            let _ = interval.tick().await;
            handle.flush();
        }
    })
}

/// Span fields, stored in the span's extensions.
#[derive(Default)]
struct SpanFields(Vec<(String, PropertyValue)>);

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    exception: Option<String>,
    properties: Vec<(String, PropertyValue)>,
}

impl FieldVisitor {
    fn put(&mut self, field: &Field, value: PropertyValue) {
        let name = field.name();
        if let Some(slot) = self.properties.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.properties.push((name.to_string(), value));
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            "error" | "exception" => self.exception = Some(value.to_string()),
            _ => self.put(field, PropertyValue::from(value)),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, PropertyValue::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        let value = i64::try_from(value)
            .map_or_else(|_| PropertyValue::from(value.to_string()), PropertyValue::from);
        self.put(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, PropertyValue::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, PropertyValue::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.exception = Some(value.to_string());
        if !matches!(field.name(), "error" | "exception") {
            self.put(field, PropertyValue::from(value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let text = format!("{value:?}");
        match field.name() {
            "message" => self.message = Some(text),
            "error" | "exception" => self.exception = Some(text),
            _ => self.put(field, PropertyValue::from(text)),
        }
    }
}

impl<S, F> Layer<S> for DbSinkLayer<F>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    F: ConnectionFactory + 'static,
{
    fn on_event(&self, event: &tracing::Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target().starts_with(OWN_TARGET_PREFIX) {
            return;
        }
        let level = LogLevel::from_tracing(metadata.level());
        if level < self.min_level {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let template = visitor.message.unwrap_or_default();
        let mut log_event =
            LogEvent::new(chrono::Local::now().fixed_offset(), level, template.as_str());
        if let Some(exception) = visitor.exception {
            log_event = log_event.with_exception(exception);
        }
        for (name, value) in visitor.properties {
            log_event = log_event.with_property(name, value);
        }

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                let extensions = span.extensions();
                let Some(fields) = extensions.get::<SpanFields>() else {
                    continue;
                };
                for (name, value) in &fields.0 {
                    if log_event.property(name).is_none() {
                        log_event = log_event.with_property(name.clone(), value.clone());
                    }
                }
            }
        }

        self.enqueue(log_event);
    }

    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: Context<'_, S>,
    ) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        span.extensions_mut().insert(SpanFields(visitor.properties));
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        ctx: Context<'_, S>,
    ) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        let Some(fields) = extensions.get_mut::<SpanFields>() else {
            return;
        };
        let mut visitor = FieldVisitor {
            properties: std::mem::take(&mut fields.0),
            ..FieldVisitor::default()
        };
        values.record(&mut visitor);
        fields.0 = visitor.properties;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchOptions;
    use crate::connection::testing::RecordingFactory;
    use dbsink_sql::{ColumnValue, ColumnDefinition, DataKind, Dialect, SinkOptions, StandardColumn};
    use tracing_subscriber::layer::SubscriberExt;

    fn layer(factory: &RecordingFactory, limit: usize) -> DbSinkLayer<RecordingFactory> {
        let mut opts = SinkOptions::default();
        opts.auto_create_table = false;
        opts.columns.store = vec![StandardColumn::Message, StandardColumn::Level, StandardColumn::Exception];
        opts.columns.additional_columns = vec![
            ColumnDefinition::new("user", DataKind::Text),
            ColumnDefinition::new("request", DataKind::Int64),
        ];
        let batch = BatchOptions {
            batch_posting_limit: limit,
            ..BatchOptions::default()
        };
        let sink = BatchSink::new(&opts, Dialect::Sqlite.strategy(), factory.clone(), batch).unwrap();
        DbSinkLayer::new(sink)
    }

    fn executed(factory: &RecordingFactory) -> Vec<Vec<(String, ColumnValue)>> {
        factory
            .journal
            .lock()
            .executed
            .iter()
            .map(|(_, params)| params.clone())
            .collect()
    }

    // ── buffering ──

    #[test]
    fn info_buffers_until_flush() {
        let factory = RecordingFactory::default();
        let layer = layer(&factory, 10);
        let handle = layer.handle();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", user = "ada", "signed in");
        });
        assert_eq!(handle.pending(), 1);
        assert!(executed(&factory).is_empty());

        handle.flush();
        assert_eq!(handle.pending(), 0);
        let rows = executed(&factory);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0].1, ColumnValue::from("signed in"));
        assert_eq!(rows[0][3].1, ColumnValue::from("ada"));
    }

    #[test]
    fn warning_flushes_immediately() {
        let factory = RecordingFactory::default();
        let layer = layer(&factory, 10);
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", "first");
            tracing::warn!(target: "app", error = "disk full", "second");
        });
        let rows = executed(&factory);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1].1, ColumnValue::from("Warning"));
        assert_eq!(rows[1][2].1, ColumnValue::from("disk full"));
    }

    #[test]
    fn limit_triggers_flush() {
        let factory = RecordingFactory::default();
        let layer = layer(&factory, 2);
        let handle = layer.handle();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            for i in 0..5 {
                tracing::debug!(target: "app", request = i, "tick");
            }
        });
        assert_eq!(executed(&factory).len(), 4);
        assert_eq!(handle.pending(), 1);
    }

    #[test]
    fn min_level_and_own_targets_filtered() {
        let factory = RecordingFactory::default();
        let layer = layer(&factory, 10).with_min_level(LogLevel::Information);
        let handle = layer.handle();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "app", "too low");
            tracing::info!(target: "dbsink_writer::batch", "own event");
            tracing::info!(target: "app", "kept");
        });
        assert_eq!(handle.pending(), 1);
    }

    // ── spans ──

    #[test]
    fn span_fields_fill_missing_properties() {
        let factory = RecordingFactory::default();
        let layer = layer(&factory, 10);
        let handle = layer.handle();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!(target: "app", "req", user = "outer", request = tracing::field::Empty);
            let _guard = span.enter();
            span.record("request", 7_i64);
            tracing::info!(target: "app", "from span");
            tracing::info!(target: "app", user = "inner", "overridden");
        });
        handle.flush();
        let rows = executed(&factory);
        assert_eq!(rows[0][3].1, ColumnValue::from("outer"));
        assert_eq!(rows[0][4].1, ColumnValue::Int64(7));
        assert_eq!(rows[1][3].1, ColumnValue::from("inner"));
    }

    #[tokio::test(start_paused = true)]
    async fn flush_task_drains_periodically() {
        let factory = RecordingFactory::default();
        let layer = layer(&factory, 10);
        let handle = layer.handle();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "app", "queued");
        });
        let task = spawn_flush_task(handle.clone(), Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(handle.pending(), 0);
        assert_eq!(executed(&factory).len(), 1);
        task.abort();
    }
}
