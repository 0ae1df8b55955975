//! Logging configuration using tracing
//!
//! Diagnostics go to a rolling file, never to the terminal, so they cannot
//! interleave with the bundler output we render.

use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable holding the filter directives
pub const LOG_ENV: &str = "BDEMON_LOG";

/// Our crates at info, the bundler plumbing underneath (tokio, mio) at warn.
/// `bdemon` matches every `bdemon_*` crate target.
const DEFAULT_FILTER: &str = "bdemon=info,bundle_demon=info,warn";

const LOG_FILE_PREFIX: &str = "bdemon.log";

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/bundle-demon/logs/`
/// Log level is controlled by `BDEMON_LOG` environment variable.
///
/// # Examples
/// ```bash
/// BDEMON_LOG=debug bdemon
/// BDEMON_LOG=bdemon_stream=trace bdemon --stdin
/// ```
pub fn init() -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    let directives = std::env::var(LOG_ENV).ok();

    tracing_subscriber::registry()
        .with(env_filter(directives.as_deref()))
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("Bundle Demon {} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("Log directory: {}", log_dir.display());

    Ok(())
}

/// Filter from `BDEMON_LOG` directives, or the default when unset or invalid
fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Mark the start of a bundler session in the log file.
///
/// One log file collects every project run on that day, so each session
/// opens with the project it belongs to.
pub fn log_session(project_name: &str, root: &Path) {
    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!("Project: {} ({})", project_name, root.display());
    tracing::info!("═══════════════════════════════════════════════════════");
}

/// Directory holding the daily log files
pub fn log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("bundle-demon").join("logs")
}
