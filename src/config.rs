use config::ConfigError;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: String,
    pub lotus_api_url: String,
    pub lotus_token: String,
    pub filscan_mainnet_url: String,
    pub filscan_calibration_url: String,
    pub tracking_enabled: bool,
    pub tracking_interval_secs: u64,
    /// Continue past deals the chain no longer knows instead of ending the
    /// per-account pass at the first one.
    pub skip_missing_deals: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/deal_tracker".to_string()),
            lotus_api_url: std::env::var("LOTUS_API_URL")
                .unwrap_or_else(|_| "https://api.node.glif.io/rpc/v0".to_string()),
            lotus_token: std::env::var("LOTUS_TOKEN").unwrap_or_default(),
            filscan_mainnet_url: std::env::var("FILSCAN_MAINNET_URL")
                .unwrap_or_else(|_| "https://api.filscan.io:8700/rpc/v1".to_string()),
            filscan_calibration_url: std::env::var("FILSCAN_CALIBRATION_URL")
                .unwrap_or_else(|_| "https://calibration.filscan.io:8700/rpc/v1".to_string()),
            tracking_enabled: env_flag("TRACKING_ENABLED", true)?,
            tracking_interval_secs: env_u64("TRACKING_INTERVAL_SECS", 600)?,
            skip_missing_deals: env_flag("SKIP_MISSING_DEALS", false)?,
        })
    }
}

fn env_flag(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => parse_flag(&raw)
            .ok_or_else(|| ConfigError::Message(format!("{} must be a boolean, got '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Message(format!("{} must be an integer, got '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
