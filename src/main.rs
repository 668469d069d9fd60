use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deal_tracker::bootstrap;
use deal_tracker::config::Config;

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,deal_tracker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("🚀 Starting storage deal tracker");

    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    if !config.tracking_enabled {
        warn!("Deal tracking is not enabled. Exit now...");
        return Ok(());
    }

    let tracker = bootstrap::initialize_tracker(&config).await?;
    tracker.start().await?;

    Ok(())
}
