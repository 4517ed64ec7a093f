use crate::error::ConfigError;
use crate::settings::LogSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber.
///
/// Events go to stdout and to a daily rolling file under `settings.directory`.
/// `RUST_LOG` takes precedence over the configured filter. The returned guard
/// flushes the file writer on drop and must be held for the process lifetime.
pub fn init_tracing(settings: &LogSettings) -> Result<WorkerGuard, ConfigError> {
    let file_appender = tracing_appender::rolling::daily(&settings.directory, "bovitrack.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    Ok(guard)
}
