use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{AppCredential, Settings};
use crate::error::{BackupError, Result};

pub const ROWS_PER_PAGE: u32 = 1000;

const APP_ID_HEADER: &str = "X-Knack-Application-Id";
const API_KEY_HEADER: &str = "X-Knack-REST-API-Key";

/// A data object (table) of a Knack app.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectDescriptor {
    pub name: String,
    pub key: String,
}

#[derive(Deserialize)]
struct ObjectList {
    objects: Vec<ObjectDescriptor>,
}

/// One page of an object's records, kept as the exact bytes the API returned.
#[derive(Debug, Clone)]
pub struct RecordPage {
    pub page: u64,
    pub total_pages: u64,
    pub body: Vec<u8>,
}

pub struct KnackClient {
    client: Client,
    base_url: String,
}

impl KnackClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut builder = Client::builder().user_agent(settings.http_user_agent.as_str());
        if let Some(timeout) = settings.http_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BackupError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn objects_url(&self) -> String {
        format!("{}/objects", self.base_url)
    }

    pub fn records_url(&self, object_key: &str, page: u64) -> String {
        format!(
            "{}/objects/{}/records?page={}&rows_per_page={}&format=raw",
            self.base_url, object_key, page, ROWS_PER_PAGE
        )
    }

    pub async fn list_objects(&self, app: &AppCredential) -> Result<Vec<ObjectDescriptor>> {
        let url = self.objects_url();
        let body = self.get(&url, app).await?;
        let list: ObjectList = serde_json::from_slice(&body).map_err(|e| {
            BackupError::MalformedResponse {
                url: url.clone(),
                reason: e.to_string(),
            }
        })?;

        tracing::debug!(app = %app.name, object_count = list.objects.len(), "Listed objects");
        Ok(list.objects)
    }

    pub async fn fetch_page(
        &self,
        app: &AppCredential,
        object_key: &str,
        page: u64,
    ) -> Result<RecordPage> {
        let url = self.records_url(object_key, page);
        let body = self.get(&url, app).await?;
        let total_pages = total_pages(&url, &body)?;

        Ok(RecordPage {
            page,
            total_pages,
            body,
        })
    }

    async fn get(&self, url: &str, app: &AppCredential) -> Result<Vec<u8>> {
        tracing::debug!(url, app = %app.name, "Sending API request");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(APP_ID_HEADER, &app.app_id)
            .header(API_KEY_HEADER, &app.api_key)
            .send()
            .await
            .map_err(|source| BackupError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackupError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|source| BackupError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(bytes.to_vec())
    }
}

fn total_pages(url: &str, body: &[u8]) -> Result<u64> {
    let malformed = |reason: String| BackupError::MalformedResponse {
        url: url.to_string(),
        reason,
    };

    let value: Value = serde_json::from_slice(body).map_err(|e| malformed(e.to_string()))?;
    match value.get("total_pages") {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| malformed(format!("total_pages is not a page count: {n}"))),
        Some(other) => Err(malformed(format!("total_pages is not a number: {other}"))),
        None => Err(malformed("missing total_pages".to_string())),
    }
}
