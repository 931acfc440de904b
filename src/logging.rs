//! `tracing` subscriber setup for the CLI and embedding applications
//!
//! Human-readable events go to stderr so stdout stays free for results. When
//! `logging.file` is set, the same events are also appended (without ANSI
//! colors) to that file through a non-blocking writer, optionally rotated.

use crate::config::{LogRotation, LoggingOptions};
use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::OnceLock;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Flushes the file sink on drop; lives as long as the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber. A no-op when one is already installed.
pub fn init(options: &LoggingOptions) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let filter = EnvFilter::try_new(&options.level)
        .map_err(|e| Error::Config(format!("Invalid log level '{}': {e}", options.level)))?;

    let mut layers: Vec<BoxedLayer<Registry>> = vec![event_layer(io::stderr, options.color)];
    if let Some(path) = options.file.as_deref() {
        let (writer, guard) = file_writer(path, options.rotation)?;
        let _ = FILE_GUARD.set(guard);
        layers.push(event_layer(writer, false));
    }

    Registry::default()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {e}")))
}

fn event_layer<S, W>(writer: W, ansi: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .boxed()
}

/// Directory a log file lives in; bare file names resolve to the cwd.
fn log_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn file_writer(path: &Path, rotation: Option<LogRotation>) -> Result<(NonBlocking, WorkerGuard)> {
    let dir = log_dir(path);
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::Config(format!("Cannot create log directory {}: {e}", dir.display())))?;

    let builder = NonBlockingBuilder::default().lossy(false);
    let Some(rotation) = rotation else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::Config(format!("Cannot open log file {}: {e}", path.display())))?;
        return Ok(builder.finish(file));
    };

    let prefix = path.file_name().ok_or_else(|| {
        Error::Config(format!(
            "Rotated log path '{}' needs a file name",
            path.display()
        ))
    })?;
    let appender = match rotation {
        LogRotation::Hourly => rolling::hourly(dir, prefix),
        LogRotation::Daily => rolling::daily(dir, prefix),
    };
    Ok(builder.finish(appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_defaults_to_cwd() {
        assert_eq!(log_dir(Path::new("qrforge.log")), Path::new("."));
        assert_eq!(
            log_dir(Path::new("/var/log/qrforge/run.log")),
            Path::new("/var/log/qrforge")
        );
    }

    #[test]
    fn test_file_writer_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("qrforge.log");
        let (_writer, _guard) = file_writer(&path, None).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_invalid_level_is_config_error() {
        let options = LoggingOptions {
            level: "not=a=level".to_string(),
            ..LoggingOptions::default()
        };
        // Either rejected up front or skipped because a subscriber exists
        match init(&options) {
            Ok(()) => assert!(tracing::dispatcher::has_been_set()),
            Err(err) => assert!(matches!(err, Error::Config(_))),
        }
    }
}
