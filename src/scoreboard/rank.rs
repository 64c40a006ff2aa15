//! Peer-relative rank computation

use super::peer_filter::PeerFilter;
use super::types::{ScoreboardSnapshot, TeamId};
use std::collections::HashMap;

/// Zero-based rank of `target` among entries matching `filter`
///
/// Returns `None` when the team is not in the filtered view, including the
/// case where the team fails its own filter.
pub fn rank_within(snapshot: &ScoreboardSnapshot, filter: &PeerFilter, target: &TeamId) -> Option<usize> {
    snapshot
        .entries()
        .iter()
        .filter(|e| filter.matches(e))
        .position(|e| &e.team_id == target)
}

/// Filtered peer orders for one snapshot, computed once per distinct filter
///
/// Gives the same answers as [`rank_within`]. Must not outlive the tick that
/// owns the snapshot.
pub struct PeerRankCache<'a> {
    snapshot: &'a ScoreboardSnapshot,
    views: HashMap<PeerFilter, Vec<TeamId>>,
}

impl<'a> PeerRankCache<'a> {
    pub fn new(snapshot: &'a ScoreboardSnapshot) -> Self {
        Self {
            snapshot,
            views: HashMap::new(),
        }
    }

    fn view(&mut self, filter: &PeerFilter) -> &[TeamId] {
        let snapshot = self.snapshot;
        self.views.entry(filter.clone()).or_insert_with(|| {
            snapshot
                .entries()
                .iter()
                .filter(|e| filter.matches(e))
                .map(|e| e.team_id.clone())
                .collect()
        })
    }

    pub fn rank(&mut self, filter: &PeerFilter, target: &TeamId) -> Option<usize> {
        self.view(filter).iter().position(|id| id == target)
    }

    /// Number of teams in the peer group
    pub fn group_size(&mut self, filter: &PeerFilter) -> usize {
        self.view(filter).len()
    }

    pub fn distinct_groups(&self) -> usize {
        self.views.len()
    }
}
