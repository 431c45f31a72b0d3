use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::analytics::SnapshotOptions;
use crate::types::Column;

pub const ENV_PREFIX: &str = "MONITOR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub source: SourceConfig,
    pub filter: FilterSettings,
    pub display: DisplaySettings,
    pub polling: PollingSettings,
    pub server: ServerSettings,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            filter: FilterSettings::default(),
            display: DisplaySettings::default(),
            polling: PollingSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl MonitorConfig {
    /// Layer defaults, the optional TOML file at `path`, then `MONITOR__*`
    /// environment variables (a `.env` file is honoured).
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let settings = ::config::Config::builder()
            .add_source(::config::Config::try_from(&MonitorConfig::default())?)
            .add_source(::config::File::with_name(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: MonitorConfig = settings.try_deserialize()?;
        debug!("Loaded configuration from {} (+ environment)", path);
        Ok(loaded)
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        match &self.source {
            SourceConfig::File { path } => {
                if path.as_os_str().is_empty() {
                    errors.push("source.path must not be empty".to_string());
                }
            }
            SourceConfig::Sheet { sheet_id, gid } => {
                if sheet_id.trim().is_empty() {
                    errors.push("source.sheet_id must not be empty".to_string());
                }
                if gid.trim().is_empty() {
                    errors.push("source.gid must not be empty".to_string());
                }
            }
        }

        if let Some(label) = &self.filter.strategy {
            if label.is_empty() {
                errors.push("filter.strategy must not be empty (omit it to keep all rows)".to_string());
            }
        }

        if self.display.recent_rows == 0 || self.display.recent_rows > 100 {
            errors.push("display.recent_rows must be between 1 and 100".to_string());
        }
        if self.display.histogram_bins == 0 || self.display.histogram_bins > 200 {
            errors.push("display.histogram_bins must be between 1 and 200".to_string());
        }
        let mut seen = Vec::new();
        for column in &self.display.columns {
            if seen.contains(column) {
                errors.push(format!("display.columns lists `{}` twice", column));
            }
            seen.push(*column);
        }

        if self.polling.interval_secs == 0 {
            errors.push("polling.interval_secs must be > 0".to_string());
        }
        if self.polling.fetch_timeout_secs == 0 {
            errors.push("polling.fetch_timeout_secs must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn snapshot_options(&self) -> SnapshotOptions {
        SnapshotOptions {
            strategy: self.filter.strategy.clone(),
            recent_rows: self.display.recent_rows,
            display_columns: self.display.columns.clone(),
            histogram_bins: self.display.histogram_bins,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Local CSV written by the trading bot.
    File { path: PathBuf },
    /// Spreadsheet published to the web, read via its CSV export.
    Sheet { sheet_id: String, gid: String },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::File {
            path: PathBuf::from("Brain Nursery - Sheet4.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Exact, case-sensitive `Strategy` label. `None` keeps every row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            strategy: Some("Darwin_2.0".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub title: String,
    pub recent_rows: usize,
    pub columns: Vec<Column>,
    pub histogram_bins: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            title: "Darwin 2.0 | Nursery Monitor".to_string(),
            recent_rows: 8,
            columns: vec![Column::Symbol, Column::Type, Column::PnL, Column::Reason],
            histogram_bins: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub interval_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl PollingSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            fetch_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.snapshot_options(), SnapshotOptions::default());
    }

    #[test]
    fn test_validation_collects_every_error() {
        let config = MonitorConfig {
            source: SourceConfig::Sheet { sheet_id: " ".into(), gid: "0".into() },
            display: DisplaySettings {
                recent_rows: 0,
                columns: vec![Column::PnL, Column::PnL],
                ..DisplaySettings::default()
            },
            polling: PollingSettings { interval_secs: 0, fetch_timeout_secs: 10 },
            ..MonitorConfig::default()
        };

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("sheet_id")));
        assert!(errors.iter().any(|e| e.contains("`PnL` twice")));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = MonitorConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("kind = \"file\""));

        let parsed: MonitorConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: MonitorConfig = toml::from_str(
            r#"
            [source]
            kind = "sheet"
            sheet_id = "1AbC"
            gid = "0"

            [display]
            columns = ["Open Time", "Pair", "PnL"]
            "#,
        )
        .unwrap();

        assert_eq!(parsed.source, SourceConfig::Sheet { sheet_id: "1AbC".into(), gid: "0".into() });
        assert_eq!(parsed.display.columns, vec![Column::OpenTime, Column::Pair, Column::PnL]);
        assert_eq!(parsed.display.recent_rows, 8);
        assert_eq!(parsed.polling.interval_secs, 30);
    }

    #[test]
    fn test_load_reads_file_over_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[polling]\ninterval_secs = 60\n\n[filter]\nstrategy = \"Manual\"").unwrap();

        let loaded = MonitorConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded.polling.interval_secs, 60);
        assert_eq!(loaded.filter.strategy.as_deref(), Some("Manual"));
        assert_eq!(loaded.display.histogram_bins, 20);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        let loaded = MonitorConfig::load(missing.to_str().unwrap()).unwrap();
        assert_eq!(loaded.server.port, 3000);
    }
}
