pub mod csv_table;
pub mod file;
pub mod sheet;

pub use csv_table::*;
pub use file::*;
pub use sheet::*;

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::SourceConfig;
use crate::types::RawTable;

/// Failures reaching or reading the trade log. None of these are fatal to
/// the monitor: the cycle reports them and the next poll tries again.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("trade log `{}` not found yet", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("spreadsheet request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("spreadsheet export returned HTTP {status}")]
    Status { status: u16 },

    #[error("spreadsheet export is not CSV (is the sheet published to the web?)")]
    NotCsv,

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Where the trade log comes from. Each call to `fetch` reads the whole
/// table afresh.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TradeSource: Send + Sync {
    /// Human-readable location, used in logs and on the dashboard.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<RawTable, SourceError>;
}

pub fn source_from_config(config: &SourceConfig, timeout: Duration) -> anyhow::Result<Box<dyn TradeSource>> {
    let source: Box<dyn TradeSource> = match config {
        SourceConfig::File { path } => Box::new(FileSource::new(path.clone())),
        SourceConfig::Sheet { sheet_id, gid } => {
            Box::new(SheetSource::new(sheet_id.clone(), gid.clone(), timeout)?)
        }
    };
    Ok(source)
}
