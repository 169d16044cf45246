//! Logging setup for the shunt services
//!
//! Console output always uses the bracketed format. File output is optional
//! and rolls daily through `tracing-appender`.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::error::{Error, Result};

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Event formatter that outputs: `timestamp [LEVEL] message`
///
/// Example output: `2025-12-02T00:50:44.809000Z [INFO] Service started`
pub struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m",
                Level::DEBUG => "\x1b[34m",
                Level::INFO => "\x1b[32m",
                Level::WARN => "\x1b[33m",
                Level::ERROR => "\x1b[31m",
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

// File writer guards must outlive the subscriber
static GUARDS: OnceLock<Mutex<Vec<WorkerGuard>>> = OnceLock::new();

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Service name, used as the log file prefix
    pub service_name: String,
    /// Level applied when `RUST_LOG` is not set
    pub console_level: Level,
    /// Directory for daily log files; console only when `None`
    pub log_dir: Option<PathBuf>,
    /// Write JSON lines to the log file instead of the bracketed format
    pub enable_json: bool,
    /// Colored console levels
    pub enable_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".to_string(),
            console_level: Level::INFO,
            log_dir: None,
            enable_json: false,
            enable_ansi: true,
        }
    }
}

/// Parse a level name such as `debug` or `WARN`
pub fn parse_level(level: &str) -> Result<Level> {
    level
        .trim()
        .parse::<Level>()
        .map_err(|_| Error::Config(format!("Invalid log level: {}", level)))
}

/// Filter directive: a non-empty `RUST_LOG` wins over the configured level
fn filter_directive(level: Level, rust_log: Option<String>) -> String {
    match rust_log {
        Some(env_str) if !env_str.trim().is_empty() => env_str,
        _ => level.as_str().to_lowercase(),
    }
}

fn keep_guard(guard: WorkerGuard) {
    let guards = GUARDS.get_or_init(|| Mutex::new(Vec::new()));
    match guards.lock() {
        Ok(mut guards) => guards.push(guard),
        Err(poisoned) => poisoned.into_inner().push(guard),
    }
}

/// Initialize the global subscriber
///
/// Fails if a global subscriber is already installed.
pub fn init_with_config(config: LogConfig) -> Result<()> {
    let directive = filter_directive(config.console_level, std::env::var("RUST_LOG").ok());
    let env_filter = EnvFilter::try_new(&directive)
        .map_err(|e| Error::Logging(format!("Invalid log filter '{}': {}", directive, e)))?;

    let console_layer = fmt::layer()
        .with_ansi(config.enable_ansi)
        .event_format(BracketedLevelFormat)
        .boxed();

    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender =
                tracing_appender::rolling::daily(dir, format!("{}.log", config.service_name));
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            keep_guard(guard);

            let layer = if config.enable_json {
                fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_level(true)
                    .with_target(true)
                    .boxed()
            } else {
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .event_format(BracketedLevelFormat)
                    .boxed()
            };
            Some(layer)
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    match &config.log_dir {
        Some(dir) => tracing::info!("Logging: {} @ {:?}", config.service_name, dir),
        None => tracing::debug!("Logging: {} (console only)", config.service_name),
    }
    Ok(())
}
