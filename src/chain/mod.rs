pub mod filscan;
pub mod lotus;
pub mod network;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

pub use filscan::FilscanClient;
pub use lotus::LotusClient;
pub use network::Network;

pub(crate) const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC request envelope shared by both upstream APIs.
#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<P> {
    pub id: u32,
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: P,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorBody {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// One row from the market-deal index, newest first within a page.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketDealEntry {
    #[serde(rename = "dealid")]
    pub deal_id: i64,
    pub piece_cid: String,
    pub provider: String,
    pub client: String,
}

#[derive(Debug, Clone)]
pub struct MarketDealPage {
    pub deals: Vec<MarketDealEntry>,
    pub total: i64,
}

/// Authoritative chain-side view of one published deal.
#[derive(Debug, Clone)]
pub struct OnChainDeal {
    pub end_epoch: i64,
    pub slash_epoch: i64,
    pub piece_cid: String,
}

/// Paginated index of finalized market deals per client.
#[async_trait]
pub trait DealIndexApi: Send + Sync {
    /// Fetch one page of deals for a client, newest first. `Ok(None)` means
    /// the response carried no result array: nothing indexed for this client,
    /// which ends pagination without being an error.
    async fn market_deals(
        &self,
        client: &str,
        page: u64,
        page_size: u64,
    ) -> AppResult<Option<MarketDealPage>>;
}

/// Point lookup of a deal's current chain state.
#[async_trait]
pub trait ChainStateApi: Send + Sync {
    /// `Ok(None)` when the chain does not know the deal id.
    async fn market_storage_deal(&self, deal_id: i64) -> AppResult<Option<OnChainDeal>>;
}
