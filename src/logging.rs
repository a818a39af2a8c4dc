//! Log setup. The terminal belongs to the TUI, so events go to a daily
//! rolling file under the state directory.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "info,liftlog=debug";
const LOG_FILE_PREFIX: &str = "liftlog.log";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// The returned guard flushes buffered lines on drop and must be held until
/// exit. Without a usable log directory, warnings and errors go to stderr.
pub fn init(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let Some(dir) = log_dir else {
        init_stderr_only();
        return None;
    };
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Failed to create log directory {}: {e}", dir.display());
        init_stderr_only();
        return None;
    }

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));
    let file_layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(true);

    if tracing_subscriber::registry().with(file_layer).with(filter()).try_init().is_err() {
        return None;
    }
    tracing::info!(log_dir = %dir.display(), "logging initialized");
    Some(guard)
}

fn init_stderr_only() {
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let _ = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(EnvFilter::new("warn"))
        .try_init();
}
