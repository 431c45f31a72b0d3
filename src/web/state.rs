use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::analytics::AggregateSnapshot;
use crate::config::{ConfigChangeEvent, ConfigManager};

/// What the viewer should see after a refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DashboardView {
    /// No refresh has finished yet.
    Starting,
    /// The source answered but holds no rows.
    Waiting { source: String },
    Ready { snapshot: Box<AggregateSnapshot> },
    /// The source could not be read; retried on the next poll.
    Unavailable { source: String, message: String },
}

impl DashboardView {
    pub fn label(&self) -> &'static str {
        match self {
            DashboardView::Starting => "starting",
            DashboardView::Waiting { .. } => "waiting",
            DashboardView::Ready { .. } => "ready",
            DashboardView::Unavailable { .. } => "unavailable",
        }
    }

    /// Print the view to the console
    pub fn print(&self) {
        match self {
            DashboardView::Starting => println!("Starting up..."),
            DashboardView::Waiting { source } => {
                println!("Waiting for data... {} has no trades yet.", source)
            }
            DashboardView::Ready { snapshot } => snapshot.print_summary(),
            DashboardView::Unavailable { source, message } => {
                println!("Cannot read {}: {}", source, message)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub title: String,
    pub view: DashboardView,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub cycles: u64,
    pub consecutive_failures: u32,
}

impl DashboardData {
    fn new(title: String) -> Self {
        Self {
            title,
            view: DashboardView::Starting,
            refreshed_at: None,
            cycles: 0,
            consecutive_failures: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum DashboardEvent {
    Refresh(DashboardData),
    ConfigChange { change: ConfigChangeEvent },
}

/// The most recent view, shared read-only with the web handlers.
#[derive(Clone)]
pub struct DashboardState {
    inner: Arc<RwLock<DashboardData>>,
    pub tx: broadcast::Sender<DashboardEvent>,
}

impl DashboardState {
    pub fn new(title: impl Into<String>) -> Self {
        let (tx, _) = broadcast::channel(100);
        Self {
            inner: Arc::new(RwLock::new(DashboardData::new(title.into()))),
            tx,
        }
    }

    /// Replace the current view with the outcome of one refresh cycle.
    pub async fn publish(&self, view: DashboardView) -> DashboardData {
        let mut data = self.inner.write().await;

        data.cycles += 1;
        data.refreshed_at = Some(Utc::now());
        data.consecutive_failures = match view {
            DashboardView::Unavailable { .. } => data.consecutive_failures + 1,
            _ => 0,
        };
        data.view = view;

        let published = data.clone();
        let _ = self.tx.send(DashboardEvent::Refresh(published.clone()));
        published
    }

    pub async fn set_title(&self, title: String) {
        self.inner.write().await.title = title;
    }

    pub fn notify_config_change(&self, change: ConfigChangeEvent) {
        let _ = self.tx.send(DashboardEvent::ConfigChange { change });
    }

    pub async fn get_data(&self) -> DashboardData {
        self.inner.read().await.clone()
    }
}

/// Combined application state for the web server
#[derive(Clone)]
pub struct AppState {
    pub dashboard: DashboardState,
    pub config_manager: Arc<ConfigManager>,
}
