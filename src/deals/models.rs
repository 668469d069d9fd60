use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, Type};
use std::fmt;
use uuid::Uuid;

/// Watch-list entries carrying this type/value pair flag an account for tracking.
pub const STATE_TYPE_CLIENT: &str = "client";
pub const STATE_VALUE_TRACK: &str = "track";

/// Lifecycle state of one storage deal.
///
/// `Reserved` and `Proposed` are written by the deal originator; the tracker
/// only ever moves records forward along `Proposed -> Published -> Active`
/// or sideways to `Slashed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "deal_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    Reserved,
    Proposed,
    Published,
    Active,
    Slashed,
    Error,
}

impl DealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealStatus::Reserved => "reserved",
            DealStatus::Proposed => "proposed",
            DealStatus::Published => "published",
            DealStatus::Active => "active",
            DealStatus::Slashed => "slashed",
            DealStatus::Error => "error",
        }
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One deal sent out by this system.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DealState {
    pub id: Uuid,
    pub client: String,
    pub provider: String,
    pub deal_cid: String,
    pub data_cid: String,
    pub piece_cid: String,
    /// End epoch on chain; 0 until the deal activates.
    pub expiration: i64,
    pub duration: i64,
    /// Unit is FIL
    pub price: Decimal,
    pub verified: bool,
    pub state: DealStatus,
    pub replication_request_id: String,
    pub dataset_id: String,
    /// On-chain deal id; 0 means not yet assigned by the chain.
    pub deal_id: i64,
    /// Any useful info returned by boost / lotus
    pub error_message: Option<String>,
}

impl DealState {
    /// A freshly proposed deal, before the chain has assigned a deal id.
    pub fn proposed(client: &str, provider: &str, piece_cid: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            client: client.to_string(),
            provider: provider.to_string(),
            deal_cid: String::new(),
            data_cid: String::new(),
            piece_cid: piece_cid.to_string(),
            expiration: 0,
            duration: 0,
            price: Decimal::ZERO,
            verified: false,
            state: DealStatus::Proposed,
            replication_request_id: String::new(),
            dataset_id: String::new(),
            deal_id: 0,
            error_message: None,
        }
    }
}

/// Matching key that locates a proposed record once the chain assigns its
/// deal id. The local record predates chain confirmation, so the deal id
/// itself cannot be part of the match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProposedDealKey {
    pub piece_cid: String,
    pub provider: String,
    pub client: String,
}

/// One watch-list row. Created and removed by an operator; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrackingState {
    pub state_type: String,
    pub state_key: String,
    pub state_value: String,
    pub created_at: DateTime<Utc>,
}

impl TrackingState {
    pub fn track_client(address: &str) -> Self {
        Self {
            state_type: STATE_TYPE_CLIENT.to_string(),
            state_key: address.to_string(),
            state_value: STATE_VALUE_TRACK.to_string(),
            created_at: Utc::now(),
        }
    }
}
