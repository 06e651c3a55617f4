use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::error::{BackupError, Result};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where new entries land in the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogOrder {
    /// Rewrite the whole file with the new entry on top.
    NewestFirst,
    /// Append to the end of the file.
    NewestLast,
}

/// Plain-text run log shared by every app in a run.
///
/// Each entry is one `<timestamp> <message>` line, echoed to stdout as it is
/// written.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
    order: LogOrder,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>, order: LogOrder) -> Self {
        Self {
            path: path.into(),
            order,
        }
    }

    #[cfg(test)]
    fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn write(&self, message: &str) -> Result<()> {
        let entry = format!("{} {}", Local::now().format(TIMESTAMP_FORMAT), message);
        println!("{entry}");

        let written = match self.order {
            LogOrder::NewestLast => self.append(&entry),
            LogOrder::NewestFirst => self.prepend(&entry),
        };
        written.map_err(|e| BackupError::io(&self.path, e))
    }

    fn append(&self, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{entry}")
    }

    fn prepend(&self, entry: &str) -> std::io::Result<()> {
        let existing = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };
        std::fs::write(&self.path, format!("{entry}\n{existing}"))
    }
}
