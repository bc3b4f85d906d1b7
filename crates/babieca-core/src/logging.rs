//! File logging setup.
//!
//! Logs go to `$BABIECA_HOME/logs/babieca.log` so command output on stdout
//! stays clean. The filter comes from `BABIECA_LOG` (default `warn`).

use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::paths;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "BABIECA_LOG";

const LOG_FILE: &str = "babieca.log";
const DEFAULT_FILTER: &str = "warn";

/// Keeps the background log writer alive; flushes on drop.
#[must_use = "logs are lost if the guard is dropped early"]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

/// Installs the global subscriber.
///
/// Logging is best-effort: if the log directory cannot be created or a
/// subscriber is already installed, the client runs without file logs.
pub fn init() -> LogGuard {
    let dir = paths::logs_dir();
    if fs::create_dir_all(&dir).is_err() {
        return LogGuard { _worker: None };
    }

    let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, worker) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .is_ok();

    LogGuard {
        _worker: installed.then_some(worker),
    }
}
