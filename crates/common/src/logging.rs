//! Logging and tracing initialization.
//!
//! Besides the usual stdout formatter, a bounded [`LogBuffer`] can be
//! installed as an extra layer so a log view can show the most recent lines
//! without reaching into global state.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::{fmt as tfmt, EnvFilter, Registry};

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber with the given configuration.
///
/// Returns the log buffer handle when `buffer_lines > 0`.
pub fn init_logging(config: &LoggingConfig) -> Option<LogBuffer> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let buffer = (config.buffer_lines > 0).then(|| LogBuffer::new(config.buffer_lines));

    let json_layer = config.json.then(|| tfmt::layer().json());
    let text_layer = (!config.json).then(|| {
        tfmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
    });

    let subscriber = Registry::default()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(buffer.clone());
    tracing::subscriber::set_global_default(subscriber).ok();

    buffer
}

/// Initialize logging with defaults (useful for tests and quick scripts).
pub fn init_default_logging() -> Option<LogBuffer> {
    init_logging(&LoggingConfig::default())
}

/// Bounded in-memory ring of formatted log lines.
///
/// Cloning shares the same underlying buffer.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl LogBuffer {
    /// Create a buffer that keeps at most `capacity` lines.
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity: capacity.max(1),
        }
    }

    /// Append a line, evicting the oldest ones past capacity.
    pub fn push(&self, line: impl Into<String>) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push_back(line.into());
            while lines.len() > self.capacity {
                lines.pop_front();
            }
        }
    }

    /// Snapshot of the retained lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// All retained lines joined with newlines (for copying out).
    pub fn dump(&self) -> String {
        self.lines().join("\n")
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|lines| lines.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<S: Subscriber> Layer<S> for LogBuffer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        self.push(format!(
            "[{}] {} {}",
            chrono::Local::now().format("%H:%M:%S"),
            event.metadata().level(),
            visitor.finish()
        ));
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: Vec<String>,
}

impl LineVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}
