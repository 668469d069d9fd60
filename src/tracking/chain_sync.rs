use std::sync::Arc;
use tracing::{debug, warn};

use crate::chain::ChainStateApi;
use crate::deals::models::DealStatus;
use crate::deals::repository::DealStateStore;
use crate::error::AppResult;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Advances every published deal of one account toward `active` or `slashed`
/// using authoritative chain state.
pub struct ChainStateSync {
    store: Arc<dyn DealStateStore>,
    chain: Arc<dyn ChainStateApi>,
    retry: RetryPolicy,
    skip_missing: bool,
}

impl ChainStateSync {
    pub fn new(
        store: Arc<dyn DealStateStore>,
        chain: Arc<dyn ChainStateApi>,
        retry: RetryPolicy,
        skip_missing: bool,
    ) -> Self {
        Self {
            store,
            chain,
            retry,
            skip_missing,
        }
    }

    /// One pass over the account's published records. A failed chain query
    /// aborts the pass; the scheduler logs it and moves on.
    pub async fn run(&self, client: &str) -> AppResult<()> {
        debug!("Updating deal states from chain for {}", client);
        for deal in self.store.find_published(client).await? {
            let looked_up = retry_with_backoff(&self.retry, "Filecoin.StateMarketStorageDeal", || {
                self.chain.market_storage_deal(deal.deal_id)
            })
            .await?;

            let on_chain = match looked_up {
                Some(on_chain) => on_chain,
                None => {
                    warn!("Deal {} unknown to chain, marking slashed", deal.deal_id);
                    self.store.mark_slashed(deal.id).await?;
                    if self.skip_missing {
                        continue;
                    }
                    // Leave the rest of this account's records for the next cycle.
                    return Ok(());
                }
            };

            let expiration = on_chain.end_epoch;
            if on_chain.slash_epoch > 0 {
                self.store
                    .record_chain_state(deal.id, &on_chain.piece_cid, expiration, DealStatus::Slashed)
                    .await?;
            } else if expiration > 0 {
                self.store
                    .record_chain_state(deal.id, &on_chain.piece_cid, expiration, DealStatus::Active)
                    .await?;
            }
            // No end epoch yet: the deal is awaiting activation, leave it published.
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::OnChainDeal;
    use crate::deals::memory::InMemoryDealStore;
    use crate::deals::models::{DealState, DealStatus};
    use crate::error::AppResult;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;
    use uuid::Uuid;

    const CLIENT: &str = "f1client";
    const PROVIDER: &str = "f01000";

    /// Serves canned chain state per deal id and logs the query order.
    struct StaticChain {
        deals: HashMap<i64, OnChainDeal>,
        queried: tokio::sync::Mutex<Vec<i64>>,
    }

    impl StaticChain {
        fn new(deals: Vec<(i64, OnChainDeal)>) -> Self {
            Self {
                deals: deals.into_iter().collect(),
                queried: tokio::sync::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChainStateApi for StaticChain {
        async fn market_storage_deal(&self, deal_id: i64) -> AppResult<Option<OnChainDeal>> {
            self.queried.lock().await.push(deal_id);
            Ok(self.deals.get(&deal_id).cloned())
        }
    }

    fn on_chain(end_epoch: i64, slash_epoch: i64) -> OnChainDeal {
        OnChainDeal {
            end_epoch,
            slash_epoch,
            piece_cid: "bagachain".to_string(),
        }
    }

    fn quick_retry() -> RetryPolicy {
        RetryPolicy {
            retries: 0,
            min_delay: Duration::from_millis(1),
        }
    }

    async fn seed_published(store: &InMemoryDealStore, deal_id: i64) -> Uuid {
        let mut deal = DealState::proposed(CLIENT, PROVIDER, &format!("baga{}", deal_id));
        deal.state = DealStatus::Published;
        deal.deal_id = deal_id;
        store.insert(deal).await.unwrap().id
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let store = Arc::new(InMemoryDealStore::new());
        let pending = seed_published(&store, 1).await;
        let activated = seed_published(&store, 2).await;
        let slashed = seed_published(&store, 3).await;

        let chain = Arc::new(StaticChain::new(vec![
            (1, on_chain(0, 0)),
            (2, on_chain(500, 0)),
            (3, on_chain(400, 300)),
        ]));

        let sync = ChainStateSync::new(store.clone(), chain, quick_retry(), false);
        sync.run(CLIENT).await.unwrap();

        // No end epoch assigned yet: unchanged, picked up again next cycle.
        let deal = store.get(pending).await.unwrap();
        assert_eq!(deal.state, DealStatus::Published);
        assert_eq!(deal.expiration, 0);

        let deal = store.get(activated).await.unwrap();
        assert_eq!(deal.state, DealStatus::Active);
        assert_eq!(deal.expiration, 500);
        assert_eq!(deal.piece_cid, "bagachain");

        // A positive slash epoch wins over the end epoch.
        let deal = store.get(slashed).await.unwrap();
        assert_eq!(deal.state, DealStatus::Slashed);
        assert_eq!(deal.expiration, 400);
    }

    #[tokio::test]
    async fn test_not_found_short_circuits_the_pass() {
        let store = Arc::new(InMemoryDealStore::new());
        let missing = seed_published(&store, 1).await;
        let remaining = seed_published(&store, 2).await;

        let chain = Arc::new(StaticChain::new(vec![(2, on_chain(500, 0))]));

        let sync = ChainStateSync::new(store.clone(), chain.clone(), quick_retry(), false);
        sync.run(CLIENT).await.unwrap();

        assert_eq!(store.get(missing).await.unwrap().state, DealStatus::Slashed);
        // The second record is never queried this cycle.
        assert_eq!(*chain.queried.lock().await, vec![1]);
        assert_eq!(store.get(remaining).await.unwrap().state, DealStatus::Published);
    }

    #[tokio::test]
    async fn test_skip_missing_continues_the_pass() {
        let store = Arc::new(InMemoryDealStore::new());
        let missing = seed_published(&store, 1).await;
        let remaining = seed_published(&store, 2).await;

        let chain = Arc::new(StaticChain::new(vec![(2, on_chain(500, 0))]));

        let sync = ChainStateSync::new(store.clone(), chain.clone(), quick_retry(), true);
        sync.run(CLIENT).await.unwrap();

        assert_eq!(store.get(missing).await.unwrap().state, DealStatus::Slashed);
        assert_eq!(*chain.queried.lock().await, vec![1, 2]);
        assert_eq!(store.get(remaining).await.unwrap().state, DealStatus::Active);
    }
}
