//! Placement change monitor
//!
//! Task body for the placement scheduler. Each tick:
//! 1. Copies every destination out of the subscription registry
//! 2. Fetches one full scoreboard snapshot, shared by all destinations
//! 3. Ranks each watched team within its peer group
//! 4. Compares against the rank carried in from the previous tick and
//!    notifies the destination when the rank moved
//! 5. Returns a freshly built [`TickState`] for the next tick
//!
//! The carried-in state is only read. The driver swaps in the returned
//! state once the whole tick has finished, so a failed tick leaves the
//! previous generation in place.

mod state;

pub use state::TickState;

use crate::error::MonitorError;
use crate::notify::{Notifier, PlacementChange};
use crate::registry::{Destination, SubscriptionRegistry};
use crate::scheduler::TickTask;
use crate::scoreboard::{
    CompetitionRules, PeerRankCache, ScoreboardFilter, ScoreboardProvider, TeamDetail, TeamId,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Counters for one tick, logged as a summary line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub destinations: usize,
    pub idle_destinations: usize,
    pub teams_ranked: usize,
    pub teams_skipped: usize,
    pub peer_groups: usize,
    pub notifications_sent: usize,
    pub delivery_failures: usize,
    pub detail_failures: usize,
}

pub struct PlacementMonitor {
    registry: Arc<dyn SubscriptionRegistry>,
    provider: Arc<dyn ScoreboardProvider>,
    rules: Arc<dyn CompetitionRules>,
    notifier: Arc<dyn Notifier>,
}

impl PlacementMonitor {
    pub fn new(
        registry: Arc<dyn SubscriptionRegistry>,
        provider: Arc<dyn ScoreboardProvider>,
        rules: Arc<dyn CompetitionRules>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            provider,
            rules,
            notifier,
        }
    }

    /// Run one tick against `previous`, returning the next generation
    ///
    /// Arguments:
    /// - `previous`: ranks recorded by the last successful tick. Only read.
    ///
    /// Returns:
    /// - `Ok((next, report))`: `next` holds a rank for every team that was
    ///   watched and placed this tick. Teams nobody watches any more are
    ///   absent, so an empty registry yields an empty state.
    /// - `Err`: the registry or the snapshot could not be read. The caller
    ///   keeps `previous`.
    ///
    /// Per-team and per-destination problems are logged and counted in the
    /// report instead of failing the tick.
    pub async fn run_tick(&self, previous: &TickState) -> Result<(TickState, TickReport), MonitorError> {
        let destinations = self.registry.enumerate().await?;
        let mut report = TickReport::default();
        let mut next = TickState::new();

        // No snapshot fetch unless some destination needs it
        if !destinations.iter().any(Destination::is_monitoring) {
            report.idle_destinations = destinations.len();
            log::debug!("{} destinations, none monitoring any team", destinations.len());
            return Ok((next, report));
        }

        let round = self.provider.current_round();
        let snapshot = self.provider.snapshot(&ScoreboardFilter::NO_FILTER).await?;
        let mut ranks = PeerRankCache::new(&snapshot);
        // None = fetch failed this tick
        let mut details: HashMap<TeamId, Option<TeamDetail>> = HashMap::new();

        for destination in &destinations {
            if !destination.is_monitoring() {
                report.idle_destinations += 1;
                continue;
            }
            report.destinations += 1;

            for team in &destination.teams {
                let Some(entry) = snapshot.find(team) else {
                    log::debug!("⚠️  {} not on the scoreboard, skipping", team);
                    report.teams_skipped += 1;
                    continue;
                };

                let filter = match self.rules.peer_filter(round, entry) {
                    Ok(filter) => filter,
                    Err(e) => {
                        log::warn!("⚠️  {}", e);
                        report.teams_skipped += 1;
                        continue;
                    }
                };

                let Some(new_rank) = ranks.rank(&filter, team) else {
                    log::warn!("⚠️  {} missing from its own peer group ({})", team, filter);
                    report.teams_skipped += 1;
                    continue;
                };
                report.teams_ranked += 1;

                let change = previous
                    .rank_of(team)
                    .and_then(|previous_rank| PlacementChange::between(team.clone(), previous_rank, new_rank));

                let Some(change) = change else {
                    next.record(team.clone(), new_rank);
                    continue;
                };

                if !details.contains_key(team) {
                    let fetched = match self.provider.detail(team).await {
                        Ok(detail) => Some(detail),
                        Err(e) => {
                            log::warn!("⚠️  Failed to fetch details for {}: {}", team, e);
                            None
                        }
                    };
                    details.insert(team.clone(), fetched);
                }

                let Some(detail) = details.get(team).and_then(Option::as_ref) else {
                    // Keep the old baseline so the change is reported next tick
                    report.detail_failures += 1;
                    if let Some(previous_rank) = previous.rank_of(team) {
                        next.record(team.clone(), previous_rank);
                    }
                    continue;
                };

                next.record(team.clone(), new_rank);

                match self
                    .notifier
                    .notify(destination, &change, detail, &snapshot, &filter)
                    .await
                {
                    Ok(()) => {
                        report.notifications_sent += 1;
                        log::info!(
                            "📣 {} {} {} (now {}) → channel {}",
                            change.team_id,
                            change.direction.verb(),
                            change.magnitude,
                            change.new_place,
                            destination.channel_id
                        );
                    }
                    Err(e) => {
                        report.delivery_failures += 1;
                        log::error!("❌ {}", e);
                    }
                }
            }
        }

        report.peer_groups = ranks.distinct_groups();

        Ok((next, report))
    }
}

#[async_trait]
impl TickTask for PlacementMonitor {
    type State = TickState;

    async fn tick(&mut self, state: &TickState) -> Result<TickState, MonitorError> {
        let (next, report) = self.run_tick(state).await?;

        log::info!(
            "📊 Placement tick: {} destinations ({} idle), {} teams ranked in {} groups, {} skipped | {} notified, {} delivery failures, {} detail failures",
            report.destinations,
            report.idle_destinations,
            report.teams_ranked,
            report.peer_groups,
            report.teams_skipped,
            report.notifications_sent,
            report.delivery_failures,
            report.detail_failures
        );

        Ok(next)
    }
}
