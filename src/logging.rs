use std::time::{SystemTime, UNIX_EPOCH};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber. Logs go to stderr, or to
/// `armscope-<timestamp>.log` in the temp directory when `to_file` is set.
///
/// The returned guard flushes pending records when dropped.
pub fn init(level: Option<&str>, to_file: bool) -> WorkerGuard {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .inspect_err(|error| eprintln!("ignoring --log-level {level}: {error}"))
            .ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    let (writer, guard) = if to_file {
        let directory = std::env::temp_dir();
        let name = log_file_name();
        eprintln!("logging to {}", directory.join(&name).display());
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, name))
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(!to_file)
        .init();

    guard
}

fn log_file_name() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs());
    format!("armscope-{timestamp}.log")
}
