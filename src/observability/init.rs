//! Tracing initialization and subscriber setup.

use super::file_writer::FileWriter;
use crate::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Name of the log file inside the data directory.
pub const LOG_FILE_NAME: &str = "miley.log";

/// Installs the global tracing subscriber, logging to `<data dir>/miley.log`.
///
/// The filter comes from `RUST_LOG` when set, otherwise from `config.log_level`,
/// otherwise `info`.
///
/// Logging is optional: if the data directory cannot be created or the filter does
/// not parse, nothing is installed. Only the first call in a process takes effect.
///
/// # Example
///
/// ```no_run
/// use miley::observability::init_tracing;
/// use miley::Config;
///
/// let config = Config {
///     log_level: Some("debug".to_string()),
///     ..Default::default()
/// };
///
/// init_tracing(&config);
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) {
    let level = config.log_level.as_deref().unwrap_or("info");
    let Ok(filter) = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))
    else {
        return;
    };

    if std::fs::create_dir_all(&config.data_dir).is_err() {
        return;
    }
    let writer = FileWriter::new(config.data_dir.join(LOG_FILE_NAME));

    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
