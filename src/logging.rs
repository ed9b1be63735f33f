//! Tracing setup.
//!
//! The terminal UI owns stdout and stderr, so log output goes to a file in the
//! configured log directory. `RUST_LOG` overrides the default filter.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_NAME: &str = "todo.log";
const DEFAULT_FILTER: &str = "warn,todo_list=info";

/// Install the global subscriber writing to `<log_dir>/todo.log`.
///
/// Returns the appender guard, which must stay alive for buffered lines to be flushed.
/// Returns `None` when the directory cannot be created or a subscriber is already set;
/// the program then runs without logging.
pub fn init(log_dir: &Path) -> Option<WorkerGuard> {
    if std::fs::create_dir_all(log_dir).is_err() {
        return None;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .ok()
        .map(|_| guard)
}
