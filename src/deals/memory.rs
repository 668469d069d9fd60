use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::deals::models::{
    DealState, DealStatus, ProposedDealKey, TrackingState, STATE_TYPE_CLIENT, STATE_VALUE_TRACK,
};
use crate::deals::repository::{DealStateStore, WatchListStore};
use crate::error::AppResult;

/// In-memory store backing unit tests and ephemeral runs.
pub struct InMemoryDealStore {
    deals: tokio::sync::RwLock<HashMap<Uuid, DealState>>,
    tracking: tokio::sync::RwLock<Vec<TrackingState>>,
}

impl InMemoryDealStore {
    pub fn new() -> Self {
        Self {
            deals: tokio::sync::RwLock::new(HashMap::new()),
            tracking: tokio::sync::RwLock::new(Vec::new()),
        }
    }

    /// Flag an account for tracking.
    pub async fn track_client(&self, address: &str) {
        self.tracking
            .write()
            .await
            .push(TrackingState::track_client(address));
    }

    pub async fn get(&self, id: Uuid) -> Option<DealState> {
        self.deals.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl DealStateStore for InMemoryDealStore {
    async fn insert(&self, deal: DealState) -> AppResult<DealState> {
        let mut deals = self.deals.write().await;
        deals.insert(deal.id, deal.clone());
        Ok(deal)
    }

    async fn max_deal_id(&self, client: &str) -> AppResult<i64> {
        let deals = self.deals.read().await;
        Ok(deals
            .values()
            .filter(|d| d.client == client)
            .map(|d| d.deal_id)
            .max()
            .unwrap_or(0))
    }

    async fn find_published(&self, client: &str) -> AppResult<Vec<DealState>> {
        let deals = self.deals.read().await;
        let mut published: Vec<DealState> = deals
            .values()
            .filter(|d| d.client == client && d.state == DealStatus::Published)
            .cloned()
            .collect();
        // Deterministic iteration order
        published.sort_by_key(|d| d.deal_id);
        Ok(published)
    }

    async fn mark_published(&self, key: &ProposedDealKey, deal_id: i64) -> AppResult<bool> {
        let mut deals = self.deals.write().await;
        let matched = deals.values_mut().find(|d| {
            d.state == DealStatus::Proposed
                && d.piece_cid == key.piece_cid
                && d.provider == key.provider
                && d.client == key.client
        });
        match matched {
            Some(deal) => {
                deal.deal_id = deal_id;
                deal.state = DealStatus::Published;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_chain_state(
        &self,
        id: Uuid,
        piece_cid: &str,
        expiration: i64,
        state: DealStatus,
    ) -> AppResult<()> {
        let mut deals = self.deals.write().await;
        if let Some(deal) = deals.get_mut(&id) {
            deal.piece_cid = piece_cid.to_string();
            deal.expiration = expiration;
            deal.state = state;
        }
        Ok(())
    }

    async fn mark_slashed(&self, id: Uuid) -> AppResult<()> {
        let mut deals = self.deals.write().await;
        if let Some(deal) = deals.get_mut(&id) {
            deal.state = DealStatus::Slashed;
        }
        Ok(())
    }
}

#[async_trait]
impl WatchListStore for InMemoryDealStore {
    async fn tracked_clients(&self) -> AppResult<Vec<String>> {
        let tracking = self.tracking.read().await;
        Ok(tracking
            .iter()
            .filter(|s| s.state_type == STATE_TYPE_CLIENT && s.state_value == STATE_VALUE_TRACK)
            .map(|s| s.state_key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_max_deal_id_defaults_to_zero() {
        let store = InMemoryDealStore::new();
        assert_eq!(store.max_deal_id("f1client").await.unwrap(), 0);

        let mut deal = DealState::proposed("f1client", "f01000", "baga6ea4sea");
        deal.deal_id = 42;
        store.insert(deal).await.unwrap();
        assert_eq!(store.max_deal_id("f1client").await.unwrap(), 42);
        assert_eq!(store.max_deal_id("f1other").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_published_requires_proposed_state() {
        let store = InMemoryDealStore::new();
        let deal = store
            .insert(DealState::proposed("f1client", "f01000", "baga6ea4sea"))
            .await
            .unwrap();

        let key = ProposedDealKey {
            piece_cid: "baga6ea4sea".to_string(),
            provider: "f01000".to_string(),
            client: "f1client".to_string(),
        };
        assert!(store.mark_published(&key, 7).await.unwrap());

        let updated = store.get(deal.id).await.unwrap();
        assert_eq!(updated.state, DealStatus::Published);
        assert_eq!(updated.deal_id, 7);

        // Already published; the same key no longer matches.
        assert!(!store.mark_published(&key, 8).await.unwrap());
        assert_eq!(store.get(deal.id).await.unwrap().deal_id, 7);
    }

    #[tokio::test]
    async fn test_tracked_clients_filters_on_type_and_value() {
        let store = InMemoryDealStore::new();
        store.track_client("f1client").await;
        store.tracking.write().await.push(TrackingState {
            state_value: "ignore".to_string(),
            ..TrackingState::track_client("f1untracked")
        });

        assert_eq!(
            store.tracked_clients().await.unwrap(),
            vec!["f1client".to_string()]
        );
    }
}
