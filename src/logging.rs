//! Logger initialisation for binaries
//!
//! Sets up the global tracing subscriber with either console or
//! daily-rotated file output. Library code only emits through the
//! `tracing` macros; embedding applications that bring their own
//! subscriber should skip this entirely.

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use crate::error::{FxError, Result};

/// Initialize the global logger
///
/// `RUST_LOG` takes precedence over `level` when set. With `console` false,
/// output goes to a daily-rotated `<service_name>.log` under `log_dir`.
pub fn init_logger(
    log_dir: impl AsRef<Path>,
    service_name: &str,
    level: &str,
    console: bool,
) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    if console {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    } else {
        std::fs::create_dir_all(log_dir.as_ref())
            .map_err(|e| FxError::Config(format!("cannot create log directory: {e}")))?;

        let file_appender = RollingFileAppender::new(
            Rotation::DAILY,
            log_dir.as_ref(),
            format!("{service_name}.log"),
        );
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(file_appender)
            .with_ansi(false)
            .init();
    }

    tracing::info!("logger initialized for service: {service_name}");
    Ok(())
}
