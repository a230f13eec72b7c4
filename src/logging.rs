use crate::models::LoggingSettings;
use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber for the command-line tool.
///
/// Console output goes to stderr, as plain text or JSON lines. When
/// `log_dir` is set, a daily rotating file is written there as well.
/// `RUST_LOG` overrides the level chosen by `debug`.
///
/// The library never calls this; embedders install their own subscriber.
///
/// # Returns
/// The file writer guard, which must be held until exit, or `None` when
/// logging to the console only
pub fn setup_logging(settings: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let console_layer = if settings.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    };

    let (file_layer, guard) = match settings.log_dir.as_deref() {
        Some(log_dir) => {
            let log_dir = Utf8Path::new(log_dir);
            prepare_log_dir(log_dir)?;
            let appender = rolling::daily(log_dir, &settings.log_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(build_filter(settings))
        .try_init()
        .context("Failed to install logging subscriber")?;

    tracing::debug!(
        "Logging initialized: debug={}, json={}, log_dir={:?}",
        settings.debug,
        settings.json,
        settings.log_dir
    );

    Ok(guard)
}

fn build_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(settings)))
}

fn default_level(settings: &LoggingSettings) -> &'static str {
    if settings.debug { "debug" } else { "info" }
}

fn prepare_log_dir(log_dir: &Utf8Path) -> Result<()> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_default_level_follows_debug_flag() {
        let mut settings = LoggingSettings::default();
        assert_eq!(default_level(&settings), "info");

        settings.debug = true;
        assert_eq!(default_level(&settings), "debug");
    }

    #[test]
    fn test_log_directory_created() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = Utf8PathBuf::try_from(temp_dir.path().join("logs/nested")).unwrap();

        prepare_log_dir(&log_dir).unwrap();
        assert!(log_dir.is_dir());

        // Existing directory is fine
        prepare_log_dir(&log_dir).unwrap();
    }
}
