use std::sync::Arc;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::chain::{FilscanClient, LotusClient};
use crate::config::Config;
use crate::deals::PgDealStore;
use crate::error::AppResult;
use crate::retry::RetryPolicy;
use crate::tracking::{ChainStateSync, DealTracker, IndexSync};

pub async fn initialize_tracker(config: &Config) -> AppResult<Arc<DealTracker>> {
    info!("Initializing deal tracking components ...");

    let pool = initialize_database(&config.database_url).await?;
    let store = Arc::new(PgDealStore::new(pool));

    let filscan = Arc::new(FilscanClient::new(
        config.filscan_mainnet_url.clone(),
        config.filscan_calibration_url.clone(),
    ));
    let lotus = Arc::new(LotusClient::new(
        config.lotus_api_url.clone(),
        config.lotus_token.clone(),
    ));

    let retry = RetryPolicy::default();
    let index_sync = IndexSync::new(store.clone(), filscan, retry.clone());
    let chain_sync = ChainStateSync::new(
        store.clone(),
        lotus,
        retry,
        config.skip_missing_deals,
    );

    let tracker = DealTracker::new(
        store.clone(),
        store,
        index_sync,
        chain_sync,
        Duration::from_secs(config.tracking_interval_secs),
    );

    info!("✅ Deal tracker initialized");
    Ok(Arc::new(tracker))
}

async fn initialize_database(database_url: &str) -> AppResult<PgPool> {
    info!("📊 Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;

    info!("🔄 Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
