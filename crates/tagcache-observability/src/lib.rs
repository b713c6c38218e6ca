//! Tagcache Observability
//!
//! Console and file logging for tagcache binaries, built on
//! `tracing-subscriber`.
//!
//! # Examples
//!
//! ```no_run
//! use tagcache_observability::{LogConfig, init_logging};
//!
//! let _guard = init_logging(&LogConfig::from_env()).expect("logging");
//! tracing::info!("ready");
//! ```

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(anyhow::anyhow!("unknown log format: {other}")),
        }
    }
}

/// Logging configuration.
///
/// # Environment Variables
///
/// - `LOG_LEVEL`: Level for tagcache crates when `RUST_LOG` is unset (default: `info`)
/// - `LOG_FORMAT`: `compact` or `json` (default: `compact`)
/// - `LOG_DIR`: When set, also write a daily rolling JSON log file there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Compact,
            directory: None,
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: env::var("LOG_LEVEL").unwrap_or(defaults.level),
            format: env::var("LOG_FORMAT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.format),
            directory: env::var_os("LOG_DIR").map(PathBuf::from),
        }
    }

    /// Filter directives used when `RUST_LOG` is not set.
    pub fn default_directives(&self) -> String {
        format!(
            "tagcache={level},tagcache_cache={level},redis=warn",
            level = self.level
        )
    }
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// life of the program. It is `None` when no log directory is configured.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.default_directives()))
    };

    let console_layer = match config.format {
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter())
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter())
            .boxed(),
    };

    let (file_layer, guard) = match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "tagcache.json");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(env_filter())
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
