//! Ranks carried from one tick to the next

use crate::scoreboard::TeamId;
use std::collections::HashMap;

/// Last observed peer-relative rank per team
///
/// Rebuilt from scratch every tick: teams no longer monitored simply do not
/// appear in the next generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickState {
    ranks: HashMap<TeamId, usize>,
}

impl TickState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rank_of(&self, team: &TeamId) -> Option<usize> {
        self.ranks.get(team).copied()
    }

    pub fn record(&mut self, team: TeamId, rank: usize) {
        self.ranks.insert(team, rank);
    }

    pub fn contains(&self, team: &TeamId) -> bool {
        self.ranks.contains_key(team)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

impl FromIterator<(TeamId, usize)> for TickState {
    fn from_iter<I: IntoIterator<Item = (TeamId, usize)>>(iter: I) -> Self {
        Self {
            ranks: iter.into_iter().collect(),
        }
    }
}
