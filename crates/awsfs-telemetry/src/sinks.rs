//! Subscriber construction and the flushable sink handle.

use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive string, e.g. `"info"` or `"warn,awsfs_vfs=debug"`.
    pub filter: String,
    /// Directory for the log file. `None` disables the file sink.
    pub log_dir: Option<PathBuf>,
    /// File name inside `log_dir`.
    pub file_name: String,
    /// Also log to stderr.
    pub stderr: bool,
    /// Let `RUST_LOG`, when set, replace `filter`.
    pub env_override: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            log_dir: None,
            file_name: "awsfs.log".to_string(),
            stderr: true,
            env_override: true,
        }
    }
}

/// Errors building the sinks.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("cannot create log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open log file: {0}")]
    LogFile(#[from] InitError),
}

/// Explicit logging handle.
///
/// Owns the subscriber and the background writer guards of any file sinks.
/// Constructed once at startup and shared by `Arc`.
pub struct Telemetry {
    dispatch: Dispatch,
    guards: Mutex<Vec<WorkerGuard>>,
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("file_sinks", &self.guards.lock().len())
            .finish()
    }
}

impl Telemetry {
    /// Build sinks from configuration.
    pub fn init(config: &LogConfig) -> Result<Self, TelemetryError> {
        let filter = match config.env_override.then(EnvFilter::try_from_default_env) {
            Some(Ok(filter)) => filter,
            _ => EnvFilter::try_new(&config.filter)?,
        };

        let mut guards = Vec::new();
        let file_layer = match &config.log_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|source| TelemetryError::LogDir {
                    path: dir.clone(),
                    source,
                })?;
                let appender = RollingFileAppender::builder()
                    .rotation(Rotation::NEVER)
                    .filename_prefix(&config.file_name)
                    .build(dir)?;
                let (writer, guard) = tracing_appender::non_blocking(appender);
                guards.push(guard);
                Some(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_thread_names(true),
                )
            }
            None => None,
        };

        let stderr_layer = config.stderr.then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_names(true)
        });

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(stderr_layer);

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            guards: Mutex::new(guards),
        })
    }

    /// Build a handle that writes formatted events to `writer`.
    ///
    /// `RUST_LOG` is ignored here; the filter is taken as given.
    pub fn from_writer<W>(writer: W, filter: &str) -> Result<Self, TelemetryError>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let filter = EnvFilter::try_new(filter)?;
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(writer).with_ansi(false));
        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            guards: Mutex::new(Vec::new()),
        })
    }

    /// A handle that discards everything.
    pub fn disabled() -> Self {
        Self {
            dispatch: Dispatch::none(),
            guards: Mutex::new(Vec::new()),
        }
    }

    /// The subscriber to scope work under.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Drain every file sink synchronously.
    ///
    /// Dropping a worker guard blocks until the writer thread has written
    /// everything queued so far. File sinks stop accepting events afterwards,
    /// so this is meant for the shutdown and crash paths.
    pub fn flush(&self) {
        let guards = std::mem::take(&mut *self.guards.lock());
        drop(guards);
    }
}
