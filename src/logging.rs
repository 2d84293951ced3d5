//! Tracing subscriber setup.
//!
//! Everything logs through `tracing`. [`init_logging`] installs a stderr
//! layer filtered by `CONFPOLL_LOG` and, when asked, a second layer that
//! writes only the `history` target to its own file.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::adapters::HISTORY_TARGET;

/// Environment variable holding the filter directives.
pub const LOG_ENV_VAR: &str = "CONFPOLL_LOG";

const DEFAULT_LOG_FILTER: &str = "confpoll=info";

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// File receiving history lines. `None` leaves them on stderr only.
    pub history_file: Option<PathBuf>,
    pub ansi: bool,
}

#[derive(Debug, Error)]
pub enum LogInitError {
    #[error("Failed to open history log: {0}")]
    HistoryFile(#[from] std::io::Error),

    #[error("Global subscriber already set: {0}")]
    AlreadySet(String),
}

/// Filter from `CONFPOLL_LOG`, falling back to `confpoll=info`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber.
pub fn init_logging(config: LogConfig) -> Result<(), LogInitError> {
    let history_layer = match &config.history_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .with_filter(Targets::new().with_target(HISTORY_TARGET, Level::INFO)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(config.ansi)
                .with_filter(env_filter()),
        )
        .with(history_layer)
        .try_init()
        .map_err(|e| LogInitError::AlreadySet(e.to_string()))
}
