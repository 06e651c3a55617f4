use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use knack_backup::config::{
    DEFAULT_API_BASE_URL, DEFAULT_KEYS_FILE, DEFAULT_LOG_FILE, DEFAULT_NAME_REPLACEMENT,
    DEFAULT_OUTPUT_ROOT,
};
use knack_backup::{BackupRun, Settings, runlog::LogOrder};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file holding the `API_KEYS` map of apps to back up
    #[arg(long, default_value = DEFAULT_KEYS_FILE)]
    keys_file: PathBuf,

    /// Shared run log
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Directory holding the monthly and rolling backup folders
    #[arg(long, default_value = DEFAULT_OUTPUT_ROOT)]
    output_root: PathBuf,

    /// Knack REST API base URL
    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// HTTP request timeout in seconds (no timeout when unset)
    #[arg(long)]
    http_timeout_secs: Option<u64>,

    /// Where new entries go in the run log
    #[arg(long, value_enum, default_value_t = LogOrder::NewestFirst)]
    log_order: LogOrder,

    /// Character substituted for path-unsafe characters in object names
    #[arg(long, default_value_t = DEFAULT_NAME_REPLACEMENT)]
    name_replacement: char,
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Settings {
            keys_file: args.keys_file,
            log_file: args.log_file,
            output_root: args.output_root,
            api_base_url: args.api_base_url,
            http_timeout: args.http_timeout_secs.map(Duration::from_secs),
            log_order: args.log_order,
            name_replacement: args.name_replacement,
            ..Settings::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings: Settings = Args::parse().into();
    info!(
        keys_file = %settings.keys_file.display(),
        output_root = %settings.output_root.display(),
        "Starting Knack backup"
    );

    let run = BackupRun::new(settings).context("Failed to set up backup run")?;
    let today = chrono::Local::now().date_naive();
    let summary = run.run(today).await.context("Backup run failed")?;

    info!(
        completed = summary.completed.len(),
        failed = summary.failed.len(),
        "Backup run finished"
    );

    Ok(())
}
