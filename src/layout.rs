use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use tracing::info;

use crate::error::{BackupError, Result};

pub const MONTHLY_ROOT: &str = "Monthly Backups";
pub const ROLLING_ROOT: &str = "Last 30 Days Backups";

const INVALID_PATH_CHARS: [char; 11] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*', '[', ']'];

/// Destination folder for an app's backup taken on `date`.
///
/// The first of the month goes under the monthly root with a two-digit day
/// folder; every other day goes under the rolling root with the full date.
pub fn backup_folder(root: &Path, app_name: &str, date: NaiveDate) -> PathBuf {
    if date.day() == 1 {
        root.join(MONTHLY_ROOT)
            .join(app_name)
            .join(date.format("%d").to_string())
    } else {
        root.join(ROLLING_ROOT)
            .join(app_name)
            .join(date.format("%Y-%m-%d").to_string())
    }
}

pub fn sanitize_object_name(name: &str, replacement: char) -> String {
    name.chars()
        .map(|c| {
            if INVALID_PATH_CHARS.contains(&c) {
                replacement
            } else {
                c
            }
        })
        .collect()
}

pub fn page_file_name(app_name: &str, object_name: &str, object_key: &str, page: u64) -> String {
    format!("{app_name}- {object_name} -{object_key}-page {page}.json")
}

/// Writes raw page bodies into the dated folder hierarchy under `root`.
#[derive(Debug, Clone)]
pub struct PageWriter {
    root: PathBuf,
}

impl PageWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes one page, replacing any file already at the same path.
    pub fn write_page(
        &self,
        date: NaiveDate,
        app_name: &str,
        object_name: &str,
        object_key: &str,
        page: u64,
        body: &[u8],
    ) -> Result<PathBuf> {
        let folder = backup_folder(&self.root, app_name, date);
        std::fs::create_dir_all(&folder).map_err(|e| BackupError::io(&folder, e))?;

        let path = folder.join(page_file_name(app_name, object_name, object_key, page));
        std::fs::write(&path, body).map_err(|e| BackupError::io(&path, e))?;

        info!("COMPLETED: {}", path.display());
        Ok(path)
    }
}
