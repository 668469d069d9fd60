use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::chain::{ChainStateApi, OnChainDeal, RpcRequest, RpcResponse, JSONRPC_VERSION};
use crate::error::{AppError, AppResult};

/// Error code Lotus returns for a deal id the chain does not know.
const DEAL_NOT_FOUND_CODE: i64 = 1;

/// Client for the Lotus chain-state API.
pub struct LotusClient {
    api_url: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct StorageDealResult {
    #[serde(rename = "Proposal")]
    proposal: DealProposal,
    #[serde(rename = "State")]
    state: DealOnChainState,
}

#[derive(Debug, Deserialize)]
struct DealProposal {
    #[serde(rename = "EndEpoch")]
    end_epoch: i64,
    #[serde(rename = "PieceCID")]
    piece_cid: CidRef,
}

#[derive(Debug, Deserialize)]
struct CidRef {
    #[serde(rename = "/")]
    cid: String,
}

#[derive(Debug, Deserialize)]
struct DealOnChainState {
    #[serde(rename = "SlashEpoch")]
    slash_epoch: i64,
}

impl LotusClient {
    pub fn new(api_url: String, token: String) -> Self {
        Self {
            api_url,
            token,
            client: reqwest::Client::new(),
        }
    }

    fn interpret(body: RpcResponse<StorageDealResult>) -> AppResult<Option<OnChainDeal>> {
        if let Some(error) = body.error {
            if error.code == DEAL_NOT_FOUND_CODE {
                return Ok(None);
            }
            return Err(AppError::ChainRpc {
                code: error.code,
                message: error.message,
            });
        }

        let result = body.result.ok_or_else(|| AppError::ChainRpc {
            code: 0,
            message: "response carried neither result nor error".to_string(),
        })?;

        Ok(Some(OnChainDeal {
            end_epoch: result.proposal.end_epoch,
            slash_epoch: result.state.slash_epoch,
            piece_cid: result.proposal.piece_cid.cid,
        }))
    }
}

#[async_trait]
impl ChainStateApi for LotusClient {
    async fn market_storage_deal(&self, deal_id: i64) -> AppResult<Option<OnChainDeal>> {
        debug!("Fetching storage deal {} from {}", deal_id, self.api_url);

        let request = RpcRequest {
            id: 1,
            jsonrpc: JSONRPC_VERSION,
            method: "Filecoin.StateMarketStorageDeal",
            params: (deal_id, None::<u8>),
        };

        let mut builder = self.client.post(&self.api_url).json(&request);
        if !self.token.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {}", self.token));
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalError(format!(
                "Lotus API error: {}",
                error_text
            )));
        }

        let body: RpcResponse<StorageDealResult> = response.json().await?;
        Self::interpret(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: serde_json::Value) -> RpcResponse<StorageDealResult> {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_interpret_found_deal() {
        let body = parse(serde_json::json!({
            "id": 1,
            "jsonrpc": "2.0",
            "result": {
                "Proposal": {"EndEpoch": 500, "PieceCID": {"/": "baga6ea4sea"}},
                "State": {"SlashEpoch": -1}
            }
        }));

        let deal = LotusClient::interpret(body).unwrap().unwrap();
        assert_eq!(deal.end_epoch, 500);
        assert_eq!(deal.slash_epoch, -1);
        assert_eq!(deal.piece_cid, "baga6ea4sea");
    }

    #[test]
    fn test_interpret_not_found() {
        let body = parse(serde_json::json!({
            "id": 1,
            "jsonrpc": "2.0",
            "error": {"code": 1, "message": "deal 99 not found"}
        }));

        assert!(LotusClient::interpret(body).unwrap().is_none());
    }

    #[test]
    fn test_interpret_other_error_code() {
        let body = parse(serde_json::json!({
            "id": 1,
            "jsonrpc": "2.0",
            "error": {"code": -32603, "message": "internal error"}
        }));

        match LotusClient::interpret(body) {
            Err(AppError::ChainRpc { code, .. }) => assert_eq!(code, -32603),
            other => panic!("expected ChainRpc error, got {:?}", other),
        }
    }
}
