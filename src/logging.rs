//! Logging for the query layer
//!
//! Query code never talks to a global logger. It receives a [`QueryLogger`]
//! and reports through it: production wires in [`TracingLogger`], tests use
//! [`RecordingLogger`] and assert on what was logged.

use parking_lot::Mutex;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Severity of a query log message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Fire-and-forget sink for query log messages
pub trait QueryLogger: Send + Sync {
    /// Records a message with a free-form structured context
    fn log(&self, level: LogLevel, message: &str, context: &Value);

    fn info(&self, message: &str, context: &Value) {
        self.log(LogLevel::Info, message, context);
    }

    fn warn(&self, message: &str, context: &Value) {
        self.log(LogLevel::Warn, message, context);
    }

    fn error(&self, message: &str, context: &Value) {
        self.log(LogLevel::Error, message, context);
    }
}

/// Forwards query logs to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl QueryLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, context: &Value) {
        match level {
            LogLevel::Info => tracing::info!(context = %context, "{}", message),
            LogLevel::Warn => tracing::warn!(context = %context, "{}", message),
            LogLevel::Error => tracing::error!(context = %context, "{}", message),
        }
    }
}

/// A single captured log call
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub context: Value,
}

/// Keeps every log call in memory
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far, oldest first
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Number of records at the given level
    pub fn count(&self, level: LogLevel) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|record| record.level == level)
            .count()
    }
}

impl QueryLogger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str, context: &Value) {
        self.records.lock().push(LogRecord {
            level,
            message: message.to_string(),
            context: context.clone(),
        });
    }
}

/// Installs the global `tracing` subscriber for the CLI
///
/// `RUST_LOG` takes precedence; otherwise the crate logs at info (or debug when
/// `verbose`) and dependencies at warn. Output goes to stderr so stdout only
/// carries query results.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "folio=debug,warn"
    } else {
        "folio=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A second initialisation (e.g. in tests) is harmless, so the error is ignored.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
