//! Status line refresh
//!
//! Second periodic task: summarises the board in one line ("Round 2 -
//! Top: 12-0001, 300pts") for the bot's presence. Presence transport is
//! outside this crate; lines go to a [`StatusSink`].

use crate::error::MonitorError;
use crate::scheduler::TickTask;
use crate::scoreboard::{ScoreboardFilter, ScoreboardMetadata, ScoreboardProvider, ScoreboardSnapshot};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait StatusSink: Send + Sync {
    /// `None` clears the status
    async fn set_status(&self, status: Option<String>) -> Result<(), MonitorError>;
}

/// Sink that only logs status changes
#[derive(Debug, Default)]
pub struct LogStatusSink;

#[async_trait]
impl StatusSink for LogStatusSink {
    async fn set_status(&self, status: Option<String>) -> Result<(), MonitorError> {
        match status {
            Some(line) => log::info!("🎮 Status: {}", line),
            None => log::info!("🎮 Status cleared"),
        }
        Ok(())
    }
}

/// Build the status line from metadata and (for dynamic boards) the full board
pub fn summary_line(metadata: &ScoreboardMetadata, snapshot: Option<&ScoreboardSnapshot>) -> Option<String> {
    let mut line = metadata.static_summary_line.clone()?;

    if metadata.is_dynamic {
        line.push_str(" - ");
        match snapshot.and_then(|s| s.entries().first()) {
            Some(top) => line.push_str(&format!(
                "Top: {}, {}pts",
                top.team_id,
                metadata.format_score(top.total_score)
            )),
            None => line.push_str("No teams!"),
        }
    }

    Some(line)
}

pub struct StatusRefreshTask {
    provider: Arc<dyn ScoreboardProvider>,
    sink: Arc<dyn StatusSink>,
}

impl StatusRefreshTask {
    pub fn new(provider: Arc<dyn ScoreboardProvider>, sink: Arc<dyn StatusSink>) -> Self {
        Self { provider, sink }
    }

    pub async fn refresh(&self) -> Result<Option<String>, MonitorError> {
        let metadata = self.provider.metadata();

        let snapshot = if metadata.static_summary_line.is_some() && metadata.is_dynamic {
            Some(self.provider.snapshot(&ScoreboardFilter::NO_FILTER).await?)
        } else {
            None
        };

        let line = summary_line(&metadata, snapshot.as_ref());
        self.sink.set_status(line.clone()).await?;
        Ok(line)
    }
}

#[async_trait]
impl TickTask for StatusRefreshTask {
    type State = ();

    async fn tick(&mut self, _state: &()) -> Result<(), MonitorError> {
        self.refresh().await.map(|_| ())
    }
}
