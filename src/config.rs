//! Runtime configuration from environment variables

use crate::scoreboard::{Round, ScoreboardMetadata};
use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Configuration for the placement monitor runtime
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// SQLite database holding the subscription registry
    pub db_path: String,

    /// Base URL of the scoreboard JSON service
    pub scoreboard_api_url: String,

    pub discord_token: String,

    pub discord_api_base: String,

    pub round: Round,

    pub poll_interval: Duration,

    pub status_interval: Duration,

    /// Timeout for every outbound HTTP request
    pub http_timeout: Duration,

    pub status_summary_line: Option<String>,

    /// Scores are live (status line shows the current leader)
    pub scoreboard_is_live: bool,

    /// Master enable flag for the placement monitor
    pub enabled: bool,
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

impl MonitorConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `SCOREBOARD_DB_PATH` (default: scoreboard_monitor.db)
    /// - `SCOREBOARD_API_URL` (required, http:// or https://)
    /// - `DISCORD_TOKEN` (required)
    /// - `DISCORD_API_BASE` (default: https://discord.com/api/v10)
    /// - `COMPETITION_ROUND` (default: unknown)
    /// - `PLACEMENT_POLL_INTERVAL_SECS` (default: 300)
    /// - `STATUS_REFRESH_INTERVAL_SECS` (default: 60)
    /// - `HTTP_TIMEOUT_SECS` (default: 10)
    /// - `STATUS_SUMMARY_LINE` (optional)
    /// - `SCOREBOARD_IS_LIVE` (default: false)
    /// - `ENABLE_PLACEMENT_MONITOR` (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        let scoreboard_api_url = env::var("SCOREBOARD_API_URL")
            .map_err(|_| ConfigError::MissingVariable("SCOREBOARD_API_URL".to_string()))?;

        if !scoreboard_api_url.starts_with("http://") && !scoreboard_api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "SCOREBOARD_API_URL must start with http:// or https://".to_string(),
            ));
        }

        let discord_token = env::var("DISCORD_TOKEN")
            .map_err(|_| ConfigError::MissingVariable("DISCORD_TOKEN".to_string()))?;

        let round_str = env::var("COMPETITION_ROUND").unwrap_or_default();
        let round = round_str
            .parse::<Round>()
            .map_err(|e| ConfigError::InvalidValue(format!("COMPETITION_ROUND: {}", e)))?;

        Ok(Self {
            db_path: env::var("SCOREBOARD_DB_PATH").unwrap_or_else(|_| "scoreboard_monitor.db".to_string()),
            scoreboard_api_url,
            discord_token,
            discord_api_base: env::var("DISCORD_API_BASE")
                .unwrap_or_else(|_| "https://discord.com/api/v10".to_string()),
            round,
            poll_interval: Duration::from_secs(parse_or("PLACEMENT_POLL_INTERVAL_SECS", 300)),
            status_interval: Duration::from_secs(parse_or("STATUS_REFRESH_INTERVAL_SECS", 60)),
            http_timeout: Duration::from_secs(parse_or("HTTP_TIMEOUT_SECS", 10)),
            status_summary_line: env::var("STATUS_SUMMARY_LINE").ok().filter(|s| !s.trim().is_empty()),
            scoreboard_is_live: parse_or("SCOREBOARD_IS_LIVE", false),
            enabled: parse_or("ENABLE_PLACEMENT_MONITOR", true),
        })
    }

    pub fn scoreboard_metadata(&self) -> ScoreboardMetadata {
        ScoreboardMetadata {
            static_summary_line: self.status_summary_line.clone(),
            is_dynamic: self.scoreboard_is_live,
            score_decimals: 0,
        }
    }
}
