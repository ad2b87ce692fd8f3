//! Console and optional file logging.
//!
//! Every record goes to stdout; when a log file is configured it receives
//! the same records through a non-blocking appender. File writes are flushed
//! by a background worker, so the returned guard must stay alive for the
//! whole process.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global subscriber.
///
/// Level filtering follows `RUST_LOG`, defaulting to `info`. A log file that
/// cannot be opened is reported as a warning and the presenter keeps running
/// with console logging only.
pub fn init(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut file_layer = None;
    let mut guard = None;
    let mut open_error = None;

    if let Some(path) = log_file {
        match open_log_file(path) {
            Ok(file) => {
                let (writer, worker_guard) = non_blocking(file);
                file_layer = Some(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(false),
                );
                guard = Some(worker_guard);
            }
            Err(err) => open_error = Some(err),
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stdout))
        .with(file_layer)
        .init();

    if let Some(path) = log_file {
        match open_error {
            None => tracing::info!(path = %path.display(), "Logging to file"),
            Some(err) => tracing::warn!(
                error = %err,
                path = %path.display(),
                "Failed to open log file, logging to console only"
            ),
        }
    }

    guard
}

/// Open the log file in append mode, creating it if needed.
fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn open_log_file_creates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presenter.log");

        let mut file = open_log_file(&path).unwrap();
        writeln!(file, "first").unwrap();
        drop(file);

        let mut file = open_log_file(&path).unwrap();
        writeln!(file, "second").unwrap();
        drop(file);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn open_log_file_rejects_missing_directory() {
        assert!(open_log_file(Path::new("/nonexistent/dir/presenter.log")).is_err());
    }
}
