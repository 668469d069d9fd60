use std::sync::Arc;
use tracing::debug;

use crate::chain::DealIndexApi;
use crate::deals::models::ProposedDealKey;
use crate::deals::repository::DealStateStore;
use crate::error::AppResult;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Deals per index page; a short page marks the end of the index's history.
pub const PAGE_SIZE: u64 = 25;

/// Imports newly published deals for one account from the market-deal index,
/// promoting the matching proposed records.
pub struct IndexSync {
    store: Arc<dyn DealStateStore>,
    index: Arc<dyn DealIndexApi>,
    retry: RetryPolicy,
}

impl IndexSync {
    pub fn new(
        store: Arc<dyn DealStateStore>,
        index: Arc<dyn DealIndexApi>,
        retry: RetryPolicy,
    ) -> Self {
        Self { store, index, retry }
    }

    /// Walk index pages newest-first until the high-water mark or a short
    /// page is reached. `last_deal_id` is the largest on-chain deal id
    /// already recorded for this client, 0 when there is none.
    pub async fn run(&self, client: &str, last_deal_id: i64) -> AppResult<()> {
        debug!("Importing deals from the index: client={} last_deal_id={}", client, last_deal_id);
        let mut page: u64 = 0;
        loop {
            // The index can throttle us; each page fetch gets its own retry budget.
            let fetched = retry_with_backoff(&self.retry, "filscan.GetMarketDeal", || {
                self.index.market_deals(client, page, PAGE_SIZE)
            })
            .await?;

            let result = match fetched {
                Some(result) => result,
                None => {
                    debug!("No result from the deal index for {}", client);
                    return Ok(());
                }
            };
            debug!("Received {} out of {} deal entries", result.deals.len(), result.total);

            let short_page = result.deals.len() < PAGE_SIZE as usize;
            let mut reached_boundary = false;
            for entry in &result.deals {
                // Entries at or below the high-water mark were seen in an
                // earlier cycle, and a short page is the end of history.
                // Either one ends the walk here.
                if entry.deal_id <= last_deal_id || short_page {
                    reached_boundary = true;
                    break;
                }
                let key = ProposedDealKey {
                    piece_cid: entry.piece_cid.clone(),
                    provider: entry.provider.clone(),
                    client: entry.client.clone(),
                };
                // No matching proposed record is a silent no-op: deals this
                // service did not originate are not imported.
                self.store.mark_published(&key, entry.deal_id).await?;
            }

            if reached_boundary || result.deals.is_empty() {
                return Ok(());
            }
            page += 1;
        }
    }
}
