use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{BackupError, Result};
use crate::runlog::LogOrder;

pub const DEFAULT_API_BASE_URL: &str = "https://api.knack.com/v1";
pub const DEFAULT_KEYS_FILE: &str = "../Knack API Keys.json";
pub const DEFAULT_LOG_FILE: &str = "../Log.txt";
pub const DEFAULT_OUTPUT_ROOT: &str = "..";
pub const DEFAULT_NAME_REPLACEMENT: char = '_';

/// Credentials for one Knack app, as stored under `API_KEYS`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppCredential {
    #[serde(rename = "appName")]
    pub name: String,
    #[serde(rename = "appId")]
    pub app_id: String,
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

#[derive(Deserialize)]
struct KeysFile {
    #[serde(rename = "API_KEYS")]
    api_keys: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub keys_file: PathBuf,
    pub log_file: PathBuf,
    pub output_root: PathBuf,
    pub api_base_url: String,
    pub http_timeout: Option<Duration>,
    pub http_user_agent: String,
    pub log_order: LogOrder,
    pub name_replacement: char,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keys_file: PathBuf::from(DEFAULT_KEYS_FILE),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            http_timeout: None,
            http_user_agent: concat!("knack-backup/", env!("CARGO_PKG_VERSION")).to_string(),
            log_order: LogOrder::NewestFirst,
            name_replacement: DEFAULT_NAME_REPLACEMENT,
        }
    }
}

/// Loads every configured app, in file order.
pub fn load_credentials(path: &Path) -> Result<Vec<AppCredential>> {
    let raw = std::fs::read_to_string(path).map_err(|e| BackupError::io(path, e))?;
    parse_credentials(&raw)
}

pub fn parse_credentials(raw: &str) -> Result<Vec<AppCredential>> {
    let keys: KeysFile = serde_json::from_str(raw)
        .map_err(|e| BackupError::Config(format!("invalid API keys file: {e}")))?;

    keys.api_keys
        .into_iter()
        .map(|(entry, value)| {
            serde_json::from_value(value)
                .map_err(|e| BackupError::Config(format!("invalid entry `{entry}`: {e}")))
        })
        .collect()
}
