//! Run log setup.
//!
//! Every event is written as a single line:
//!
//! ```text
//! 2024-03-09 07:05:01,123 - INFO - Moved a.csv to /srv/output - Status: OK
//! ```

use chrono::Local;
use std::fmt;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::{Event, Subscriber};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Formats events as `<timestamp> - <LEVEL> - <message>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} - {} - ",
            Local::now().format(TIMESTAMP_FORMAT),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Builds a subscriber that writes line-formatted events to `writer`.
pub fn line_subscriber<W>(writer: W, level: LevelFilter) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .event_format(LineFormat)
        .with_max_level(level)
        .with_writer(writer)
        .finish()
}

/// Installs the global subscriber appending to `log_path`.
///
/// The parent directory is created when missing.
pub fn init_file_logging(log_path: &Path, level: LevelFilter) -> Result<(), LoggingError> {
    let dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = log_path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(log_path.display().to_string()))?;

    std::fs::create_dir_all(dir).map_err(LoggingError::Io)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .map_err(LoggingError::Appender)?;

    line_subscriber(appender, level)
        .try_init()
        .map_err(LoggingError::Init)
}

/// Errors that can occur while installing the run log.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log file path: {0}")]
    InvalidPath(String),
    #[error("Failed to create log directory: {0}")]
    Io(std::io::Error),
    #[error("Failed to open log file: {0}")]
    Appender(InitError),
    #[error("Failed to install log subscriber: {0}")]
    Init(TryInitError),
}
