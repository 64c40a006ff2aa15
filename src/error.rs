//! Error taxonomy for the monitor core
//!
//! Nothing here is fatal to the process. Fetch and registry failures end the
//! current tick with the carried state untouched, delivery failures are
//! logged per destination, and configuration failures skip a single team.

use crate::registry::ChannelId;
use crate::scoreboard::{Round, TeamId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    /// Scoreboard snapshot or team detail could not be fetched
    #[error("Scoreboard fetch failed: {0}")]
    Fetch(String),

    /// Subscription registry read failed
    #[error("Registry error: {0}")]
    Registry(#[from] rusqlite::Error),

    #[error("Delivery to channel {channel} failed: {reason}")]
    Delivery { channel: ChannelId, reason: String },

    /// Peer group could not be resolved for a team in the current round
    #[error("No peer filter for {team} in {round}: {reason}")]
    Configuration {
        team: TeamId,
        round: Round,
        reason: String,
    },

    /// Schema file could not be read or applied
    #[error("Migration {file} failed: {reason}")]
    Migration { file: String, reason: String },

    #[error("Tick panicked: {0}")]
    Panicked(String),
}

impl MonitorError {
    /// True when retrying on the next tick is expected to help
    pub fn is_transient(&self) -> bool {
        matches!(self, MonitorError::Fetch(_) | MonitorError::Registry(_))
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        MonitorError::Fetch(err.to_string())
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::Fetch(format!("invalid JSON: {}", err))
    }
}
