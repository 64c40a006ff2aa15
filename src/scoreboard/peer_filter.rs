//! Peer group resolution
//!
//! A team is ranked only against its peers. Which attribute defines the
//! peer group depends on the round, so the rule lives behind
//! [`CompetitionRules`]. The resolved [`PeerFilter`] is a plain value: it
//! can be compared, hashed and reused for every team in the same group.

use super::types::{Division, Round, ScoreboardEntry, Tier};
use crate::error::MonitorError;
use std::fmt;

/// Predicate describing one peer group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerFilter {
    pub division: Division,
    pub tier: Option<Tier>,
    pub category: Option<String>,
}

impl PeerFilter {
    pub fn division(division: Division) -> Self {
        Self {
            division,
            tier: None,
            category: None,
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn matches(&self, entry: &ScoreboardEntry) -> bool {
        if entry.division != self.division {
            return false;
        }
        if let Some(tier) = self.tier {
            if entry.tier != Some(tier) {
                return false;
            }
        }
        match &self.category {
            Some(category) => entry.category.as_deref() == Some(category.as_str()),
            None => true,
        }
    }
}

impl fmt::Display for PeerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.division)?;
        if let Some(tier) = self.tier {
            write!(f, " {}", tier)?;
        }
        if let Some(category) = &self.category {
            write!(f, " ({})", category)?;
        }
        Ok(())
    }
}

/// Round-specific grouping rules
///
/// Implementations must be pure: same inputs, same filter, no I/O. The
/// returned filter must match `entry` itself.
pub trait CompetitionRules: Send + Sync {
    fn peer_filter(&self, round: Round, entry: &ScoreboardEntry) -> Result<PeerFilter, MonitorError>;
}

/// Default grouping
///
/// - Unknown, Round 1, Round 2: same division (All Service teams also
///   share their category when they have one)
/// - Round 3, Semifinals: same division and tier
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCompetitionRules;

impl CompetitionRules for DefaultCompetitionRules {
    fn peer_filter(&self, round: Round, entry: &ScoreboardEntry) -> Result<PeerFilter, MonitorError> {
        let filter = PeerFilter::division(entry.division);

        if round.is_tiered() {
            let tier = entry.tier.ok_or_else(|| MonitorError::Configuration {
                team: entry.team_id.clone(),
                round,
                reason: "team has no tier assignment".to_string(),
            })?;
            return Ok(filter.with_tier(tier));
        }

        match (&entry.division, &entry.category) {
            (Division::AllService, Some(category)) => Ok(filter.with_category(category.clone())),
            _ => Ok(filter),
        }
    }
}
