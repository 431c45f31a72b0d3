use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{parse_csv, SourceError, TradeSource};
use crate::types::RawTable;

const SHEETS_EXPORT_BASE: &str = "https://docs.google.com/spreadsheets/d";

/// A spreadsheet published to the web, read through its CSV export.
#[derive(Debug, Clone)]
pub struct SheetSource {
    client: Client,
    sheet_id: String,
    gid: String,
    base_url: String,
}

impl SheetSource {
    pub fn new(sheet_id: String, gid: String, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            sheet_id,
            gid,
            base_url: SHEETS_EXPORT_BASE.to_string(),
        })
    }

    /// Point the source at another host serving the same export path.
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn export_url(&self) -> String {
        format!(
            "{}/{}/export?format=csv&gid={}",
            self.base_url.trim_end_matches('/'),
            self.sheet_id,
            self.gid
        )
    }
}

/// A private sheet answers the export URL with a sign-in page, not an error.
fn looks_like_html(body: &str) -> bool {
    let lower: String = body
        .trim_start()
        .chars()
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    lower.starts_with("<!doctype html") || lower.starts_with("<html")
}

#[async_trait]
impl TradeSource for SheetSource {
    fn describe(&self) -> String {
        format!("sheet {} (gid {})", self.sheet_id, self.gid)
    }

    async fn fetch(&self) -> Result<RawTable, SourceError> {
        let url = self.export_url();
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status { status: status.as_u16() });
        }

        let body = resp.text().await?;
        if looks_like_html(&body) {
            return Err(SourceError::NotCsv);
        }

        debug!("Fetched {} bytes from {}", body.len(), url);
        parse_csv(&body)
    }
}
