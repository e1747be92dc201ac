// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging setup: `<sec>.<ms>|TAG|<message>` lines to the console and,
//! optionally, to a size-rotated file.
//!
//! Rotation happens at initialization: when the log file exceeds the
//! configured size limit the numbered copies are shifted up and the
//! current file becomes `.1`. Rotation failures are silently ignored so
//! the supervisor still starts.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

/// Smallest allowed log file size limit, in bytes.
pub const MIN_LOG_FILE_SIZE: u64 = 4096;

/// Largest (and default) log file size limit, in bytes.
pub const MAX_LOG_FILE_SIZE: u64 = i32::MAX as u64;

/// Largest allowed rotation file count.
pub const MAX_ROTATE_COUNT: u32 = 9;

/// Logging options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    /// Verbosity: 1 = error, 2 = warning, 3 = informational, 4 = debug.
    pub level: u8,
    /// Suppress console output.
    pub silent: bool,
    /// Mirror log lines into this file.
    pub file: Option<PathBuf>,
    /// Rotated copies to keep (1..=9).
    pub rotate_count: u32,
    /// Rotate once the file exceeds this many bytes.
    pub size_limit: u64,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: 1,
            silent: false,
            file: None,
            rotate_count: 1,
            size_limit: MAX_LOG_FILE_SIZE,
        }
    }
}

/// Logging setup errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log file name: \"{0}\"")]
    InvalidFileName(PathBuf),

    #[error("failed to install subscriber: {0}")]
    Init(String),
}

/// Event formatter producing `<sec>.<ms>|TAG|<message>` lines.
#[derive(Clone, Copy, Default)]
struct PipeFormat;

impl<S, N> FormatEvent<S, N> for PipeFormat
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
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        write!(
            writer,
            "{:8}.{:03}|{}|",
            now.as_secs(),
            now.subsec_millis(),
            level_tag(event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_tag(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERR",
        Level::WARN => "WRN",
        Level::INFO => "INF",
        _ => "DBG",
    }
}

fn level_filter(level: u8) -> LevelFilter {
    match level {
        0 => LevelFilter::OFF,
        1 => LevelFilter::ERROR,
        2 => LevelFilter::WARN,
        3 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

/// Install the global subscriber.
///
/// Returns the worker guard of the file appender, which must stay alive
/// for the process lifetime so buffered lines are flushed on exit.
pub fn init(
    options: &LogOptions,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, LoggingError> {
    let console_layer = (!options.silent).then(|| {
        tracing_subscriber::fmt::layer().event_format(PipeFormat).with_writer(std::io::stdout)
    });

    let (file_layer, guard) = match &options.file {
        Some(path) => {
            rotate_if_needed(path, options.size_limit, options.rotate_count);

            let directory = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let file_name =
                path.file_name().ok_or_else(|| LoggingError::InvalidFileName(path.clone()))?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer =
                tracing_subscriber::fmt::layer().event_format(PipeFormat).with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(level_filter(options.level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| LoggingError::Init(err.to_string()))?;

    Ok(guard)
}

/// Rotate the log file if it exceeds `size_limit`.
///
/// Shifts `<name>.1` → `<name>.2` → … up to `rotate_count` copies,
/// deleting the oldest, then moves the current file to `<name>.1`.
fn rotate_if_needed(log_path: &Path, size_limit: u64, rotate_count: u32) {
    let size = match std::fs::metadata(log_path) {
        Ok(metadata) => metadata.len(),
        Err(_) => return,
    };

    if size < size_limit {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..rotate_count).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
