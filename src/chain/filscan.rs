use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::chain::network::Network;
use crate::chain::{
    DealIndexApi, MarketDealEntry, MarketDealPage, RpcRequest, RpcResponse, JSONRPC_VERSION,
};
use crate::error::{AppError, AppResult};

/// Client for the filscan market-deal index. Each network has its own host;
/// the address prefix decides which one a call goes to.
pub struct FilscanClient {
    mainnet_url: String,
    calibration_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GetMarketDealResult {
    // Absent or null when the index has nothing for the client.
    deals: Option<Vec<MarketDealEntry>>,
    #[serde(default)]
    total: i64,
}

impl FilscanClient {
    pub fn new(mainnet_url: String, calibration_url: String) -> Self {
        Self {
            mainnet_url,
            calibration_url,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, network: Network) -> &str {
        match network {
            Network::Mainnet => &self.mainnet_url,
            Network::Calibration => &self.calibration_url,
        }
    }
}

#[async_trait]
impl DealIndexApi for FilscanClient {
    async fn market_deals(
        &self,
        client: &str,
        page: u64,
        page_size: u64,
    ) -> AppResult<Option<MarketDealPage>> {
        let url = self.endpoint(Network::for_address(client));
        debug!("Fetching market deals from {} (page {})", url, page);

        let request = RpcRequest {
            id: 1,
            jsonrpc: JSONRPC_VERSION,
            method: "filscan.GetMarketDeal",
            params: (client, page, page_size),
        };

        let response = self.client.post(url).json(&request).send().await?;
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::DealIndex(format!(
                "filscan returned an error: {}",
                error_text
            )));
        }

        let body: RpcResponse<GetMarketDealResult> = response.json().await?;
        Ok(body
            .result
            .and_then(|result| {
                result
                    .deals
                    .map(|deals| MarketDealPage { deals, total: result.total })
            }))
    }
}
