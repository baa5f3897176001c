use std::fs;
use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, registry};

use crate::exchange::config::Config;
use crate::exchange::error::{ExchangeError, Result};

// This is a helper struct to store the logger guards. When they are dropped, buffered log lines
// are flushed.
#[allow(dead_code)]
pub struct LogGuards {
    log_guard: Option<WorkerGuard>,
}

/// Installs the global subscriber of this process. `part` tells the log files of different
/// processes apart.
pub fn init_logging(config: &Config, part: u32) -> Result<LogGuards> {
    let output = config.output();
    let level = output.logging.level_filter();

    let (log_layer, log_guard) = match &output.output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let log_file_name = format!("log_process_{part}.txt");
            let log_file_appender = rolling::never(dir, log_file_name);
            let (log_file, log_guard) = non_blocking(log_file_appender);
            let layer = fmt::Layer::new()
                .with_writer(log_file)
                .json()
                .with_ansi(false)
                .with_filter(level);
            (Some(layer), Some(log_guard))
        }
        None => (None, None),
    };

    let console_layer = fmt::layer()
        .with_writer(io::stdout)
        .with_target(false)
        .with_filter(level);

    // Add `Optional`s. If None, then the corresponding layer is not added.
    let collector = registry().with(log_layer).with(console_layer);

    tracing::subscriber::set_global_default(collector)
        .map_err(|e| ExchangeError::Logging(e.to_string()))?;

    Ok(LogGuards { log_guard })
}
