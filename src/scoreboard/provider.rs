//! Scoreboard origin
//!
//! The monitor only reads through [`ScoreboardProvider`]. The HTTP
//! implementation talks to a JSON scoreboard service:
//!
//! - `GET {base}/scoreboard?division=Open&tier=Gold` → `{"teams": [ScoreboardEntry, ...]}`
//! - `GET {base}/teams/{team_id}` → `TeamDetail`

use super::types::{
    Round, ScoreboardEntry, ScoreboardFilter, ScoreboardMetadata, ScoreboardSnapshot, TeamDetail, TeamId,
};
use crate::error::MonitorError;
use async_trait::async_trait;
use serde::Deserialize;
use std::cmp::Ordering;
use std::time::Duration;

#[async_trait]
pub trait ScoreboardProvider: Send + Sync {
    /// Fetch a full, rank-ordered board (`ScoreboardFilter::NO_FILTER`) or a slice of it
    async fn snapshot(&self, filter: &ScoreboardFilter) -> Result<ScoreboardSnapshot, MonitorError>;

    async fn detail(&self, team: &TeamId) -> Result<TeamDetail, MonitorError>;

    fn current_round(&self) -> Round;

    fn metadata(&self) -> ScoreboardMetadata;
}

#[derive(Debug, Deserialize)]
struct ScoreboardResponse {
    teams: Vec<ScoreboardEntry>,
}

/// Sort by total score, highest first; ties keep origin order
pub fn sort_by_score(entries: &mut [ScoreboardEntry]) {
    entries.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(Ordering::Equal)
    });
}

/// JSON-over-HTTP scoreboard provider
pub struct HttpScoreboardProvider {
    client: reqwest::Client,
    base_url: String,
    round: Round,
    metadata: ScoreboardMetadata,
}

impl HttpScoreboardProvider {
    /// Create a provider for the scoreboard service at `base_url`
    ///
    /// Arguments:
    /// - `base_url`: service root; `/scoreboard` and `/teams/{id}` are appended
    /// - `round`: reported by `current_round()` for peer grouping
    /// - `metadata`: returned by `metadata()`; `is_dynamic` also sets `is_live` on snapshots
    /// - `timeout`: applied to every request
    pub fn new(
        base_url: &str,
        round: Round,
        metadata: ScoreboardMetadata,
        timeout: Duration,
    ) -> Result<Self, MonitorError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            round,
            metadata,
        })
    }

    fn filter_query(filter: &ScoreboardFilter) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(division) = filter.division {
            query.push(("division", division.to_string()));
        }
        if let Some(tier) = filter.tier {
            query.push(("tier", tier.to_string()));
        }
        query
    }
}

#[async_trait]
impl ScoreboardProvider for HttpScoreboardProvider {
    async fn snapshot(&self, filter: &ScoreboardFilter) -> Result<ScoreboardSnapshot, MonitorError> {
        let url = format!("{}/scoreboard", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&Self::filter_query(filter))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MonitorError::Fetch(format!(
                "scoreboard API error: {}",
                response.status()
            )));
        }

        let body: ScoreboardResponse = response.json().await?;
        let mut teams: Vec<ScoreboardEntry> = body.teams.into_iter().filter(|e| filter.matches(e)).collect();
        sort_by_score(&mut teams);

        log::debug!("📥 Fetched scoreboard: {} teams", teams.len());

        Ok(ScoreboardSnapshot::new(teams, self.round, self.metadata.is_dynamic))
    }

    async fn detail(&self, team: &TeamId) -> Result<TeamDetail, MonitorError> {
        let url = format!("{}/teams/{}", self.base_url, team);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(MonitorError::Fetch(format!(
                "team detail API error for {}: {}",
                team,
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    fn current_round(&self) -> Round {
        self.round
    }

    fn metadata(&self) -> ScoreboardMetadata {
        self.metadata.clone()
    }
}
