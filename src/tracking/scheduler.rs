use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::deals::repository::{DealStateStore, WatchListStore};
use crate::tracking::chain_sync::ChainStateSync;
use crate::tracking::index_sync::IndexSync;

/// Re-runs deal tracking for every watched account on a fixed delay.
pub struct DealTracker {
    watch_list: Arc<dyn WatchListStore>,
    store: Arc<dyn DealStateStore>,
    index_sync: IndexSync,
    chain_sync: ChainStateSync,
    interval: Duration,
}

impl DealTracker {
    pub fn new(
        watch_list: Arc<dyn WatchListStore>,
        store: Arc<dyn DealStateStore>,
        index_sync: IndexSync,
        chain_sync: ChainStateSync,
        interval: Duration,
    ) -> Self {
        Self {
            watch_list,
            store,
            index_sync,
            chain_sync,
            interval,
        }
    }

    /// Start the tracking loop (runs in background). The delay is measured
    /// from the end of one cycle to the start of the next, so a slow cycle
    /// pushes out its successor instead of overlapping it.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                self.run_cycle().await;
                tokio::time::sleep(self.interval).await;
            }
        })
    }

    /// One pass over the watch list. Each sync runs inside its own failure
    /// boundary: an account whose index import fails still gets its chain
    /// pass, and never blocks the accounts after it.
    pub async fn run_cycle(&self) {
        info!("🔄 Starting deal tracking cycle");
        let clients = match self.watch_list.tracked_clients().await {
            Ok(clients) => clients,
            Err(e) => {
                error!("Failed to read the watch list: {:?}", e);
                return;
            }
        };

        for client in clients {
            // The cursor is re-derived from the store every cycle rather than
            // kept in memory, so external writes between cycles are picked up.
            match self.store.max_deal_id(&client).await {
                Ok(last_deal_id) => {
                    if let Err(e) = self.index_sync.run(&client, last_deal_id).await {
                        error!(
                            "Encountered an error when importing deals from the index for {}: {:?}",
                            client, e
                        );
                    }
                }
                Err(e) => {
                    error!("Failed to read the deal high-water mark for {}: {:?}", client, e);
                }
            }

            if let Err(e) = self.chain_sync.run(&client).await {
                error!(
                    "Encountered an error when updating deals from chain for {}: {:?}",
                    client, e
                );
            }
        }
        info!("✓ Deal tracking cycle completed");
    }
}
