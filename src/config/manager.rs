use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use serde::Serialize;
use tracing::info;

use super::runtime::{DisplaySettings, FilterSettings, MonitorConfig};

#[derive(Debug, Clone, Serialize)]
pub enum ConfigChangeEvent {
    FilterUpdated(FilterSettings),
    DisplayUpdated(DisplaySettings),
}

/// Live configuration shared between the poller and the dashboard API.
/// Changes are validated first and rolled back when invalid.
pub struct ConfigManager {
    config: Arc<RwLock<MonitorConfig>>,
    change_tx: broadcast::Sender<ConfigChangeEvent>,
}

impl ConfigManager {
    pub fn new(initial: MonitorConfig) -> Self {
        let (change_tx, _) = broadcast::channel(32);
        Self {
            config: Arc::new(RwLock::new(initial)),
            change_tx,
        }
    }

    pub async fn get_config(&self) -> MonitorConfig {
        self.config.read().await.clone()
    }

    /// Apply `edit` to the live config. An edit that fails validation is
    /// undone and its errors returned; a valid one is broadcast as `event`.
    async fn update<F>(&self, edit: F, event: ConfigChangeEvent) -> Result<(), String>
    where
        F: FnOnce(&mut MonitorConfig),
    {
        let mut config = self.config.write().await;
        let previous = config.clone();
        edit(&mut config);

        if let Err(errors) = config.validate() {
            *config = previous;
            return Err(errors.join(", "));
        }
        drop(config);

        info!("Configuration updated: {:?}", event);
        let _ = self.change_tx.send(event);
        Ok(())
    }

    pub async fn update_filter(&self, settings: FilterSettings) -> Result<(), String> {
        let event = ConfigChangeEvent::FilterUpdated(settings.clone());
        self.update(|config| config.filter = settings, event).await
    }

    pub async fn update_display(&self, settings: DisplaySettings) -> Result<(), String> {
        let event = ConfigChangeEvent::DisplayUpdated(settings.clone());
        self.update(|config| config.display = settings, event).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChangeEvent> {
        self.change_tx.subscribe()
    }
}

impl Clone for ConfigManager {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            change_tx: self.change_tx.clone(),
        }
    }
}
