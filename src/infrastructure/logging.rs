//! Logging for the bridge
//!
//! Uses `tracing` with a `tracing-subscriber` registry. Output goes to stderr
//! or a daily-rolled file, never to stdout, which belongs to the host. The
//! `MPY_LOG` environment variable takes the usual filter directives and wins
//! over the configured level.

use super::config::{LogFormat, LogSettings};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::str::FromStr;
use tracing::Level;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable holding filter directives, e.g. `mpy=debug`.
pub const LOG_ENV: &str = "MPY_LOG";

/// Keeps the file appender flushing for the life of the process.
static GUARD: OnceCell<Option<WorkerGuard>> = OnceCell::new();

/// Log configuration resolved from [`LogSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    pub file: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Compact,
            file: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Unknown level names fall back to `warn`.
    pub fn from_settings(settings: &LogSettings) -> Self {
        let level = Level::from_str(&settings.level).unwrap_or(Level::WARN);
        Self {
            level,
            format: settings.format,
            file: settings.file.clone(),
        }
    }
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::default().add_directive(config.level.into()))
}

fn install<W>(writer: W, format: LogFormat, filter: EnvFilter) -> bool
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = match format {
        LogFormat::Compact => fmt::layer().with_writer(writer).with_ansi(false).compact().boxed(),
        LogFormat::Pretty => fmt::layer().with_writer(writer).pretty().boxed(),
        LogFormat::Json => fmt::layer().with_writer(writer).json().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .is_ok()
}

/// Install the global subscriber once per process.
///
/// Returns `false` when a subscriber was already installed, by an earlier
/// call or by the embedding process.
pub fn init_logging(config: &LogConfig) -> bool {
    let mut installed = false;
    GUARD.get_or_init(|| {
        let filter = build_filter(config);
        match &config.file {
            Some(path) => {
                let path = Path::new(path);
                let directory = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
                let prefix = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "mpy.log".to_string());
                let (writer, guard) = tracing_appender::non_blocking(rolling::daily(directory, prefix));
                installed = install(writer, config.format, filter);
                Some(guard)
            }
            None => {
                installed = install(std::io::stderr, config.format, filter);
                None
            }
        }
    });
    installed
}
