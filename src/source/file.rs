use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

use super::{parse_csv, SourceError, TradeSource};
use crate::types::RawTable;

/// A CSV trade log on local disk, typically written by the trading bot.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TradeSource for FileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn fetch(&self) -> Result<RawTable, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SourceError::NotFound { path: self.path.clone() },
                _ => SourceError::Io { path: self.path.clone(), source: e },
            })?;

        debug!("Read {} bytes from {}", text.len(), self.path.display());
        parse_csv(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_csv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "PnL,Running").unwrap();
        writeln!(file, "10,10").unwrap();
        writeln!(file, "-5,5").unwrap();

        let source = FileSource::new(file.path());
        let table = source.fetch().await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1], vec!["-5", "5"]);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("Brain Nursery - Sheet4.csv"));

        let err = tokio_test::block_on(source.fetch()).unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
        assert!(err.to_string().contains("Brain Nursery - Sheet4.csv"));
    }
}
