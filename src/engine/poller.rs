use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::analytics::{compute_snapshot, normalize, SnapshotOptions};
use crate::config::ConfigManager;
use crate::source::{SourceError, TradeSource};
use crate::types::RawTable;
use crate::web::{DashboardData, DashboardState, DashboardView};

/// Turn the outcome of one fetch into the view the viewer should see.
pub fn build_view(
    source: &str,
    fetched: Result<RawTable, SourceError>,
    options: &SnapshotOptions,
) -> DashboardView {
    match fetched {
        Ok(table) if table.is_empty() => DashboardView::Waiting {
            source: source.to_string(),
        },
        Ok(table) => {
            let normalized = normalize(&table);
            DashboardView::Ready {
                snapshot: Box::new(compute_snapshot(&normalized, options)),
            }
        }
        Err(e) => DashboardView::Unavailable {
            source: source.to_string(),
            message: e.to_string(),
        },
    }
}

/// Drives the fetch-compute-publish cycle. Refreshes never overlap: one
/// task owns the loop and awaits each cycle before the next tick.
pub struct Poller {
    source: Arc<dyn TradeSource>,
    config: Arc<ConfigManager>,
    dashboard: DashboardState,
}

impl Poller {
    pub fn new(source: Arc<dyn TradeSource>, config: Arc<ConfigManager>, dashboard: DashboardState) -> Self {
        Self {
            source,
            config,
            dashboard,
        }
    }

    /// One refresh cycle. Source errors end up in the published view, never
    /// in the return value.
    pub async fn refresh(&self) -> DashboardData {
        let options = self.config.get_config().await.snapshot_options();
        let description = self.source.describe();

        let fetched = self.source.fetch().await;
        if let Err(e) = &fetched {
            warn!("Refresh failed for {}: {}", description, e);
        }

        let view = build_view(&description, fetched, &options);
        match &view {
            DashboardView::Ready { snapshot } => debug!(
                "Refreshed {}: {} rows, {} closed trades",
                description,
                snapshot.row_count,
                snapshot.total_trades()
            ),
            DashboardView::Waiting { .. } => debug!("{} has no rows yet", description),
            _ => {}
        }

        self.dashboard.publish(view).await
    }

    /// Refresh every `polling.interval_secs` until the process is stopped.
    /// A config change triggers an immediate refresh.
    pub async fn run(self) {
        let polling = self.config.get_config().await.polling;
        let mut ticker = interval(polling.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut changes = self.config.subscribe();

        info!(
            "Polling {} every {}s",
            self.source.describe(),
            polling.interval_secs
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                change = changes.recv() => match change {
                    Ok(change) => {
                        info!("Configuration changed, refreshing now");
                        self.dashboard.notify_config_change(change);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Skipped {} config change events", skipped);
                    }
                    Err(RecvError::Closed) => {}
                },
            }
            self.refresh().await;
        }
    }
}
