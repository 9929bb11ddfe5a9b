// Tracing setup shared by both binaries.
//
// Console output always; with a log directory, also `combined.log` (every
// event that passes the filter) and `error.log` (errors only).

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

pub const COMBINED_LOG: &str = "combined.log";
pub const ERROR_LOG: &str = "error.log";

/// Install the global subscriber. `RUST_LOG` overrides `default_filter`.
///
/// The returned guards flush the file writers on drop; keep them alive for
/// the life of the process.
pub fn init_tracing(
    default_filter: &str,
    log_dir: Option<&Path>,
) -> Result<Vec<WorkerGuard>, InitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let mut guards = Vec::new();

    let (combined_layer, error_layer) = match log_dir {
        Some(dir) => {
            let (combined, combined_guard) =
                tracing_appender::non_blocking(log_file(dir, COMBINED_LOG)?);
            let (errors, errors_guard) = tracing_appender::non_blocking(log_file(dir, ERROR_LOG)?);
            guards.push(combined_guard);
            guards.push(errors_guard);

            (
                Some(fmt::layer().with_ansi(false).with_writer(combined)),
                Some(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(errors)
                        .with_filter(LevelFilter::ERROR),
                ),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(combined_layer)
        .with(error_layer)
        .init();

    Ok(guards)
}

/// Append-only file that never rotates (creates `dir` if needed)
fn log_file(dir: &Path, name: &str) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_log_files_created_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs");

        let mut combined = log_file(&nested, COMBINED_LOG).unwrap();
        combined.write_all(b"started\n").unwrap();
        combined.flush().unwrap();

        let written = std::fs::read_to_string(nested.join(COMBINED_LOG)).unwrap();
        assert_eq!(written, "started\n");
    }
}
