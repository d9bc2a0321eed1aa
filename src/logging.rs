use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Prefix of the daily rolling log files
pub const LOG_FILE_NAME: &str = "anshist-sim.log";

/// Flushes buffered file logs when dropped
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Install the global subscriber: records go to stderr, and also to daily
/// files under `log_dir` when one is given. Keep the returned guard alive
/// until exit.
pub fn init_tracing(log_level: &str, log_dir: Option<&Path>) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let mut guard = None;
    let file_layer = match log_dir.map(|dir| std::fs::create_dir_all(dir).map(|()| dir)) {
        Some(Ok(dir)) => {
            let (writer, worker) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_NAME));
            guard = Some(FileLogGuard { _guard: worker });
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true),
            )
        }
        Some(Err(err)) => {
            eprintln!("file logging disabled, cannot create log directory: {err}");
            None
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}
