//! Logging initialization from the `[logging]` configuration section.

use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use super::config::{LogFormat, LoggingConfig};

// The fmt layer's builder type changes with every option, so the timestamp
// choice has to happen at each call site; this keeps that branch in one
// place.
macro_rules! install {
    ($filter:expr, $layer:expr, $timestamps:expr) => {
        if $timestamps {
            tracing_subscriber::registry()
                .with($filter)
                .with($layer)
                .init();
        } else {
            tracing_subscriber::registry()
                .with($filter)
                .with($layer.without_time())
                .init();
        }
    };
}

/// Initialize the tracing subscriber based on configuration.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| LoggingError::InvalidFilter(e.to_string()))?;
    let base = fmt::layer()
        .with_target(config.target)
        .with_span_events(FmtSpan::NONE);

    match (config.format, config.output.as_str()) {
        (LogFormat::Text, "stdout") => install!(
            filter,
            base.with_ansi(config.color && io::stdout().is_terminal())
                .with_writer(io::stdout),
            config.timestamps
        ),
        (LogFormat::Text, "stderr") => install!(
            filter,
            base.with_ansi(config.color && io::stderr().is_terminal())
                .with_writer(io::stderr),
            config.timestamps
        ),
        (LogFormat::Text, path) => install!(
            filter,
            base.with_ansi(false).with_writer(open_log_file(path)?),
            config.timestamps
        ),
        (LogFormat::Json, "stdout") => install!(
            filter,
            base.json().with_writer(io::stdout),
            config.timestamps
        ),
        (LogFormat::Json, "stderr") => install!(
            filter,
            base.json().with_writer(io::stderr),
            config.timestamps
        ),
        (LogFormat::Json, path) => install!(
            filter,
            base.json().with_writer(open_log_file(path)?),
            config.timestamps
        ),
    }

    Ok(())
}

fn open_log_file(path: &str) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LoggingError::FileOpen(path.to_string(), e))
}

/// Errors that can occur during logging initialization.
#[derive(Debug)]
pub enum LoggingError {
    /// Invalid log filter string.
    InvalidFilter(String),
    /// Failed to open log file.
    FileOpen(String, io::Error),
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggingError::InvalidFilter(msg) => write!(f, "Invalid log filter: {}", msg),
            LoggingError::FileOpen(path, e) => {
                write!(f, "Failed to open log file '{}': {}", path, e)
            }
        }
    }
}

impl std::error::Error for LoggingError {}
