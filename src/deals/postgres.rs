use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::deals::models::{
    DealState, DealStatus, ProposedDealKey, STATE_TYPE_CLIENT, STATE_VALUE_TRACK,
};
use crate::deals::repository::{DealStateStore, WatchListStore};
use crate::error::AppResult;

const DEAL_COLUMNS: &str = "id, client, provider, deal_cid, data_cid, piece_cid, expiration, \
     duration, price, verified, state, replication_request_id, dataset_id, deal_id, error_message";

/// Postgres-backed deal record store. The database is the source of truth;
/// nothing is cached between calls.
pub struct PgDealStore {
    pool: PgPool,
}

impl PgDealStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DealStateStore for PgDealStore {
    async fn insert(&self, deal: DealState) -> AppResult<DealState> {
        let inserted = sqlx::query_as::<_, DealState>(&format!(
            r#"
            INSERT INTO deal_states ({DEAL_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {DEAL_COLUMNS}
            "#
        ))
        .bind(deal.id)
        .bind(&deal.client)
        .bind(&deal.provider)
        .bind(&deal.deal_cid)
        .bind(&deal.data_cid)
        .bind(&deal.piece_cid)
        .bind(deal.expiration)
        .bind(deal.duration)
        .bind(deal.price)
        .bind(deal.verified)
        .bind(deal.state)
        .bind(&deal.replication_request_id)
        .bind(&deal.dataset_id)
        .bind(deal.deal_id)
        .bind(&deal.error_message)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn max_deal_id(&self, client: &str) -> AppResult<i64> {
        let newest: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT deal_id FROM deal_states
            WHERE client = $1
            ORDER BY deal_id DESC
            LIMIT 1
            "#,
        )
        .bind(client)
        .fetch_optional(&self.pool)
        .await?;

        Ok(newest.map(|row| row.0).unwrap_or(0))
    }

    async fn find_published(&self, client: &str) -> AppResult<Vec<DealState>> {
        let deals = sqlx::query_as::<_, DealState>(&format!(
            r#"
            SELECT {DEAL_COLUMNS} FROM deal_states
            WHERE client = $1 AND state = $2
            ORDER BY deal_id
            "#
        ))
        .bind(client)
        .bind(DealStatus::Published)
        .fetch_all(&self.pool)
        .await?;

        Ok(deals)
    }

    async fn mark_published(&self, key: &ProposedDealKey, deal_id: i64) -> AppResult<bool> {
        // Update-one semantics: at most a single matching record is promoted.
        let result = sqlx::query(
            r#"
            UPDATE deal_states
            SET deal_id = $1, state = $2
            WHERE id = (
                SELECT id FROM deal_states
                WHERE piece_cid = $3 AND provider = $4 AND client = $5 AND state = $6
                LIMIT 1
            )
            "#,
        )
        .bind(deal_id)
        .bind(DealStatus::Published)
        .bind(&key.piece_cid)
        .bind(&key.provider)
        .bind(&key.client)
        .bind(DealStatus::Proposed)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_chain_state(
        &self,
        id: Uuid,
        piece_cid: &str,
        expiration: i64,
        state: DealStatus,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE deal_states
            SET piece_cid = $2, expiration = $3, state = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(piece_cid)
        .bind(expiration)
        .bind(state)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_slashed(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE deal_states SET state = $2 WHERE id = $1")
            .bind(id)
            .bind(DealStatus::Slashed)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl WatchListStore for PgDealStore {
    async fn tracked_clients(&self) -> AppResult<Vec<String>> {
        let clients = sqlx::query_scalar(
            r#"
            SELECT state_key FROM tracking_states
            WHERE state_type = $1 AND state_value = $2
            "#,
        )
        .bind(STATE_TYPE_CLIENT)
        .bind(STATE_VALUE_TRACK)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }
}
