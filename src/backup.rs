use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::client::{KnackClient, ObjectDescriptor};
use crate::config::{AppCredential, Settings, load_credentials};
use crate::error::{BackupError, Result};
use crate::layout::{PageWriter, sanitize_object_name};
use crate::runlog::RunLog;

pub const RUN_STARTED: &str = "*********** Daily Backup Initiated";
pub const RUN_COMPLETED: &str = "*********** Daily Backup Completed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppReport {
    pub app: String,
    pub objects: usize,
    pub pages: u64,
}

#[derive(Debug)]
pub struct AppFailure {
    pub app: String,
    pub error: BackupError,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub completed: Vec<AppReport>,
    pub failed: Vec<AppFailure>,
}

/// One full backup pass over every configured app.
pub struct BackupRun {
    settings: Settings,
    client: KnackClient,
    writer: PageWriter,
    log: RunLog,
}

impl BackupRun {
    pub fn new(settings: Settings) -> Result<Self> {
        let client = KnackClient::new(&settings)?;
        let writer = PageWriter::new(&settings.output_root);
        let log = RunLog::new(&settings.log_file, settings.log_order);

        Ok(Self {
            settings,
            client,
            writer,
            log,
        })
    }

    /// Backs up every app, writing into folders for `today`.
    ///
    /// A failing app is logged and skipped. The end-of-run line is written even
    /// when the credentials cannot be loaded, in which case that error is
    /// returned.
    pub async fn run(&self, today: NaiveDate) -> Result<RunSummary> {
        self.log.write(RUN_STARTED)?;
        let summary = self.run_apps(today).await;
        self.log.write(RUN_COMPLETED)?;
        summary
    }

    async fn run_apps(&self, today: NaiveDate) -> Result<RunSummary> {
        let apps = match load_credentials(&self.settings.keys_file) {
            Ok(apps) => apps,
            Err(e) => {
                self.log.write(&format!("Error loading API keys: {e}"))?;
                return Err(e);
            }
        };
        info!(app_count = apps.len(), "Loaded API keys");

        let mut summary = RunSummary::default();
        for app in &apps {
            match self.backup_app(app, today).await {
                Ok(report) => {
                    self.log.write(&format!("Backup for {} Completed", app.name))?;
                    summary.completed.push(report);
                }
                Err(e) => {
                    error!(app = %app.name, error = %e, "Backup failed");
                    self.log
                        .write(&format!("Error during backup for {}: {e}", app.name))?;
                    summary.failed.push(AppFailure {
                        app: app.name.clone(),
                        error: e,
                    });
                }
            }
        }

        Ok(summary)
    }

    pub async fn backup_app(&self, app: &AppCredential, today: NaiveDate) -> Result<AppReport> {
        info!("Starting export for {} (app ID: {})", app.name, app.app_id);

        let objects = self.checked(self.client.list_objects(app).await)?;
        let mut pages = 0;
        for object in &objects {
            pages += self.export_object(app, object, today).await?;
        }

        Ok(AppReport {
            app: app.name.clone(),
            objects: objects.len(),
            pages,
        })
    }

    /// Fetches and writes every page of one object, returning the page count.
    ///
    /// The bound comes from the latest response's `total_pages`, so page 1 is
    /// always requested.
    pub async fn export_object(
        &self,
        app: &AppCredential,
        object: &ObjectDescriptor,
        today: NaiveDate,
    ) -> Result<u64> {
        let object_name = sanitize_object_name(&object.name, self.settings.name_replacement);

        let mut page = 1;
        let mut total_pages = 1;
        while page <= total_pages {
            let record_page = self.checked(self.client.fetch_page(app, &object.key, page).await)?;
            self.writer.write_page(
                today,
                &app.name,
                &object_name,
                &object.key,
                record_page.page,
                &record_page.body,
            )?;
            total_pages = record_page.total_pages;
            page += 1;
        }

        Ok(page - 1)
    }

    /// Records a failed API call and its URL in the run log before passing the
    /// error on.
    fn checked<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if let Some(url) = e.url() {
                let logged = self
                    .log
                    .write(&format!("Error during API call: {e}"))
                    .and_then(|_| self.log.write(&format!("Failed URL: {url}")));
                if let Err(log_err) = logged {
                    warn!(error = %log_err, "Failed to record API error in run log");
                }
            }
        }
        result
    }
}
