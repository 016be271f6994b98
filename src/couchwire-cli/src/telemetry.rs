//! Logging setup for the command-line tool
//!
//! - Human-readable output on stderr, so stdout stays pure JSON
//! - Optional JSON log file with size-based and daily rotation

use anyhow::Result;
use rolling_file::{RollingConditionBasic, RollingFileAppender};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing.
///
/// Returns a guard that must be kept alive while logging to a file so that
/// buffered entries are flushed on exit.
pub fn init_telemetry(verbose: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_filter = if verbose {
        "couchwire=debug,couchwire_rs=debug,couchwire_core=debug"
    } else {
        "couchwire=info,couchwire_rs=info,couchwire_core=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;

            // couchwire.log, rotated daily or at 10 MB
            let file_appender = RollingFileAppender::new(
                dir.join("couchwire.log"),
                RollingConditionBasic::new()
                    .daily()
                    .max_size(10 * 1024 * 1024),
                9,
            )?;
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_current_span(true)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    if let Some(dir) = log_dir {
        tracing::debug!("Logging to {:?}", dir);
    }

    Ok(guard)
}
