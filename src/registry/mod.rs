//! Subscription registry (read path)
//!
//! Persisted mapping guild → channel → watched teams. Writers live in the
//! admin command surface; the monitor only enumerates.

pub mod sqlite;

use crate::error::MonitorError;
use crate::scoreboard::TeamId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One notification target and the teams it watches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub teams: BTreeSet<TeamId>,
}

impl Destination {
    pub fn new(guild_id: GuildId, channel_id: ChannelId) -> Self {
        Self {
            guild_id,
            channel_id,
            teams: BTreeSet::new(),
        }
    }

    pub fn is_monitoring(&self) -> bool {
        !self.teams.is_empty()
    }
}

#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    /// Owned copy of every destination, so later registry writes cannot
    /// disturb an iteration in progress
    async fn enumerate(&self) -> Result<Vec<Destination>, MonitorError>;

    async fn is_watching(&self, channel: ChannelId, team: &TeamId) -> Result<bool, MonitorError>;

    /// Teams watched by one channel (empty set when none)
    async fn monitored_teams(&self, channel: ChannelId) -> Result<BTreeSet<TeamId>, MonitorError>;
}

pub use sqlite::{run_schema_migrations, SqliteSubscriptionRegistry};
