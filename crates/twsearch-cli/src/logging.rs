//! Logging setup for the twsearch CLI
//!
//! This module provides:
//! - Run ID generation
//! - Sensitive data redaction
//! - Operation timing
//! - Subscriber setup (compact, full, JSON; console or file)

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Run ID for the current process
static RUN_ID: OnceLock<String> = OnceLock::new();

/// Logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    pub format: LogFormat,
    /// Optional file output path
    pub file: Option<PathBuf>,
    /// ANSI colours on console output
    pub ansi: bool,
    /// Include file and line numbers
    pub source_location: bool,
    pub thread_ids: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Full,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            file: None,
            ansi: true,
            source_location: false,
            thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging config from verbosity level
    pub fn from_verbosity(verbosity: u8) -> Self {
        let mut config = Self::default();

        match verbosity {
            0 => {}
            1 => config.level = "info".to_string(),
            2 => {
                config.level = "debug".to_string();
                config.source_location = true;
            }
            _ => {
                config.level = "trace".to_string();
                config.format = LogFormat::Full;
                config.source_location = true;
                config.thread_ids = true;
            }
        }

        config
    }

    /// Apply `RUST_LOG`, `TWSEARCH_LOG_FORMAT` and `TWSEARCH_LOG_FILE`
    pub fn merge_with_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(rust_log) = lookup("RUST_LOG") {
            self.level = rust_log;
        }

        if let Some(format) = lookup("TWSEARCH_LOG_FORMAT") {
            match format.to_lowercase().as_str() {
                "compact" => self.format = LogFormat::Compact,
                "full" => self.format = LogFormat::Full,
                "json" => self.format = LogFormat::Json,
                _ => eprintln!("Invalid log format: {}, using default", format),
            }
        }

        if let Some(file) = lookup("TWSEARCH_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
    }
}

/// Initialize the global logging system.
///
/// The returned guard must be kept alive for file output to be flushed.
pub fn init_logging(config: LoggingConfig) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::Logging(format!("invalid filter '{}': {}", config.level, e)))?;

    let (writer, guard) = match &config.file {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path
                .file_name()
                .ok_or_else(|| Error::Logging(format!("invalid log file: {}", path.display())))?;
            let appender = tracing_appender::rolling::never(directory.unwrap_or(std::path::Path::new(".")), file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (tracing_subscriber::fmt::writer::BoxMakeWriter::new(writer), Some(guard))
        }
        None => (tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stderr), None),
    };
    let ansi = config.ansi && config.file.is_none();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let installed = match config.format {
        LogFormat::Compact => tracing::subscriber::set_global_default(builder.with_ansi(ansi).compact().finish()),
        LogFormat::Full => tracing::subscriber::set_global_default(builder.with_ansi(ansi).finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish()),
    };
    installed.map_err(|e| Error::Logging(format!("Failed to initialize logging: {}", e)))?;

    let run_id = RUN_ID.get_or_init(generate_run_id);
    tracing::debug!(run_id = %run_id, config = ?config, "Logging system initialized");

    Ok(guard)
}

/// Generate a unique ID for this run
pub fn generate_run_id() -> String {
    format!("run_{}", Uuid::new_v4().simple())
}

/// Get the current run ID
pub fn current_run_id() -> &'static str {
    RUN_ID.get().map(|s| s.as_str()).unwrap_or("unknown")
}

/// Sensitive data redaction utilities
pub mod redaction {
    use regex::Regex;
    use std::sync::OnceLock;

    static SECRET_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

    fn secret_pattern() -> Option<&'static Regex> {
        SECRET_REGEX
            .get_or_init(|| {
                Regex::new(r#"(?i)(api[_-]?key|api[_-]?secret|secret|access_token|token|bearer)(["']?\s*[=:]\s*["']?|\s+)([A-Za-z0-9_.%+/=-]{6,})"#)
                    .ok()
            })
            .as_ref()
    }

    /// Redact sensitive information from a string
    pub fn redact_sensitive(input: &str) -> String {
        match secret_pattern() {
            Some(regex) => regex.replace_all(input, "$1$2***").into_owned(),
            None => input.to_string(),
        }
    }

    /// Redact sensitive information from JSON values
    pub fn redact_json_value(value: &mut serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    if is_sensitive_key(key) && !val.is_null() {
                        *val = serde_json::Value::String("***".to_string());
                    } else {
                        redact_json_value(val);
                    }
                }
            }
            serde_json::Value::Array(arr) => arr.iter_mut().for_each(redact_json_value),
            serde_json::Value::String(s) => *s = redact_sensitive(s),
            _ => {}
        }
    }

    fn is_sensitive_key(key: &str) -> bool {
        let key = key.to_lowercase();
        ["key", "secret", "token", "bearer"].iter().any(|k| key.contains(k))
    }
}

/// Performance timing utilities
pub mod timing {
    use std::time::Instant;

    /// Logs the duration of an operation when finished or dropped
    pub struct Timer {
        start: Instant,
        operation: &'static str,
        done: bool,
    }

    impl Timer {
        pub fn new(operation: &'static str) -> Self {
            Self {
                start: Instant::now(),
                operation,
                done: false,
            }
        }

        /// Finish the timer and log the duration
        pub fn finish(mut self) {
            self.done = true;
            tracing::info!(
                operation = self.operation,
                run_id = super::current_run_id(),
                duration_ms = self.start.elapsed().as_millis() as u64,
                "Operation completed"
            );
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            if !self.done {
                tracing::debug!(
                    operation = self.operation,
                    duration_ms = self.start.elapsed().as_millis() as u64,
                    "Operation ended"
                );
            }
        }
    }
}
