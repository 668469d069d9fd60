use async_trait::async_trait;
use uuid::Uuid;

use crate::deals::models::{DealState, DealStatus, ProposedDealKey};
use crate::error::AppResult;

/// Keyed store of deal records. The tracker holds no copy of this data;
/// every read goes to the store at point of use.
#[async_trait]
pub trait DealStateStore: Send + Sync {
    /// Insert a freshly originated record. Called by the deal originator and
    /// by tests; the tracker itself never fabricates deal history.
    async fn insert(&self, deal: DealState) -> AppResult<DealState>;

    /// Highest on-chain deal id recorded for a client, 0 when the client has
    /// no records yet. This is the pagination cursor for the index sync.
    async fn max_deal_id(&self, client: &str) -> AppResult<i64>;

    /// All records for a client awaiting activation.
    async fn find_published(&self, client: &str) -> AppResult<Vec<DealState>>;

    /// Assign an on-chain deal id to the first proposed record matching the
    /// key, moving it to `published`. Returns whether any record matched;
    /// no match is a silent no-op, not an error.
    async fn mark_published(&self, key: &ProposedDealKey, deal_id: i64) -> AppResult<bool>;

    /// Record the authoritative chain-side piece cid and end epoch along with
    /// the new state (`active` or `slashed`).
    async fn record_chain_state(
        &self,
        id: Uuid,
        piece_cid: &str,
        expiration: i64,
        state: DealStatus,
    ) -> AppResult<()>;

    /// Mark a record slashed without chain data, for deals the chain no
    /// longer knows.
    async fn mark_slashed(&self, id: Uuid) -> AppResult<()>;
}

/// The operator-managed list of accounts to track.
#[async_trait]
pub trait WatchListStore: Send + Sync {
    async fn tracked_clients(&self) -> AppResult<Vec<String>>;
}
