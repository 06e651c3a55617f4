pub mod backup;
pub mod client;
pub mod config;
pub mod error;
pub mod layout;
pub mod runlog;

// Re-export main components for easier testing
pub use backup::{BackupRun, RunSummary};
pub use config::{AppCredential, Settings};
pub use error::BackupError;
