//! History sinks.
//!
//! [`TracingHistory`] routes lines through the `history` tracing target, which
//! `logging::init_logging` can send to its own file. [`FileHistory`] appends
//! timestamped lines to a file directly.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::traits::HistorySink;

/// Tracing target used for history lines.
pub const HISTORY_TARGET: &str = "history";

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHistory;

impl HistorySink for TracingHistory {
    fn write(&self, message: &str) {
        info!(target: HISTORY_TARGET, "{}", message);
    }
}

#[derive(Debug)]
pub struct FileHistory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, message: &str) -> std::io::Result<()> {
        let _guard = self.write_lock.lock();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "{} {}", timestamp, message)
    }
}

impl HistorySink for FileHistory {
    fn write(&self, message: &str) {
        if let Err(e) = self.append(message) {
            warn!("Failed to write history to {}: {}", self.path.display(), e);
        }
    }
}
