//! Scoreboard data model
//!
//! A snapshot is an ordered, immutable list of entries. Order is rank:
//! index 0 is first place. Filtering always produces a new snapshot.

use super::peer_filter::PeerFilter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Competition team identifier (e.g. `12-3456`)
///
/// Opaque to the monitor: only equality, hashing and the string form matter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TeamId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("team id cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Serialized as the display name; any spelling `FromStr` accepts is read back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Division {
    Open,
    AllService,
    MiddleSchool,
}

impl TryFrom<String> for Division {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Division> for String {
    fn from(division: Division) -> Self {
        division.display_name().to_string()
    }
}

impl Division {
    pub fn display_name(&self) -> &'static str {
        match self {
            Division::Open => "Open",
            Division::AllService => "All Service",
            Division::MiddleSchool => "Middle School",
        }
    }
}

impl FromStr for Division {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "open" => Ok(Division::Open),
            "allservice" | "as" => Ok(Division::AllService),
            "middleschool" | "ms" => Ok(Division::MiddleSchool),
            _ => Err(format!("unknown division '{}'", s)),
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Platinum,
    Gold,
    Silver,
    Middle,
    High,
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "platinum" => Ok(Tier::Platinum),
            "gold" => Ok(Tier::Gold),
            "silver" => Ok(Tier::Silver),
            "middle" => Ok(Tier::Middle),
            "high" => Ok(Tier::High),
            _ => Err(format!("unknown tier '{}'", s)),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Platinum => "Platinum",
            Tier::Gold => "Gold",
            Tier::Silver => "Silver",
            Tier::Middle => "Middle",
            Tier::High => "High",
        };
        f.write_str(name)
    }
}

/// Competition round, which decides how peer groups are formed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Round {
    #[default]
    Unknown,
    Round1,
    Round2,
    Round3,
    Semifinals,
}

impl Round {
    /// Rounds where teams are ranked within their tier
    pub fn is_tiered(&self) -> bool {
        matches!(self, Round::Round3 | Round::Semifinals)
    }
}

impl FromStr for Round {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "" | "unknown" => Ok(Round::Unknown),
            "1" | "round1" | "r1" => Ok(Round::Round1),
            "2" | "round2" | "r2" => Ok(Round::Round2),
            "3" | "round3" | "r3" | "state" => Ok(Round::Round3),
            "semifinals" | "semis" | "sf" => Ok(Round::Semifinals),
            _ => Err(format!("unknown round '{}'", s)),
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Round::Unknown => "unknown round",
            Round::Round1 => "Round 1",
            Round::Round2 => "Round 2",
            Round::Round3 => "Round 3",
            Round::Semifinals => "Semifinals",
        };
        f.write_str(name)
    }
}

/// One team's summary row on the scoreboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardEntry {
    pub team_id: TeamId,
    pub division: Division,
    /// All Service branch category, if any
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub image_count: u32,
    /// Play time in seconds
    #[serde(default)]
    pub play_time_secs: Option<u64>,
    pub total_score: f64,
}

/// Server-side filter for a scoreboard fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreboardFilter {
    pub division: Option<Division>,
    pub tier: Option<Tier>,
}

impl ScoreboardFilter {
    pub const NO_FILTER: ScoreboardFilter = ScoreboardFilter {
        division: None,
        tier: None,
    };

    pub fn matches(&self, entry: &ScoreboardEntry) -> bool {
        self.division.map_or(true, |d| entry.division == d)
            && self.tier.map_or(true, |t| entry.tier == Some(t))
    }
}

/// Immutable point-in-time scoreboard
#[derive(Debug, Clone)]
pub struct ScoreboardSnapshot {
    entries: Vec<ScoreboardEntry>,
    pub round: Round,
    /// Scores are still changing (competition window open)
    pub is_live: bool,
    pub fetched_at: DateTime<Utc>,
}

impl ScoreboardSnapshot {
    /// Build a snapshot from entries already in rank order
    pub fn new(entries: Vec<ScoreboardEntry>, round: Round, is_live: bool) -> Self {
        Self {
            entries,
            round,
            is_live,
            fetched_at: Utc::now(),
        }
    }

    pub fn entries(&self) -> &[ScoreboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, team: &TeamId) -> Option<&ScoreboardEntry> {
        self.entries.iter().find(|e| &e.team_id == team)
    }

    pub fn position_of(&self, team: &TeamId) -> Option<usize> {
        self.entries.iter().position(|e| &e.team_id == team)
    }

    /// Peer view: a new snapshot holding only entries matching `filter`,
    /// relative order preserved
    pub fn with_filter(&self, filter: &PeerFilter) -> ScoreboardSnapshot {
        ScoreboardSnapshot {
            entries: self
                .entries
                .iter()
                .filter(|e| filter.matches(e))
                .cloned()
                .collect(),
            round: self.round,
            is_live: self.is_live,
            fetched_at: self.fetched_at,
        }
    }
}

/// Per-image scoring record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDetail {
    pub name: String,
    pub score: f64,
    #[serde(default)]
    pub penalties: u32,
    #[serde(default)]
    pub play_time_secs: Option<u64>,
}

/// Full team record, fetched only when a placement change is confirmed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    pub summary: ScoreboardEntry,
    #[serde(default)]
    pub images: Vec<ImageDetail>,
}

/// Provider-level facts about the scoreboard being served
#[derive(Debug, Clone, Default)]
pub struct ScoreboardMetadata {
    /// Fixed status prefix, e.g. "CyberPatriot XVIII Round 2"
    pub static_summary_line: Option<String>,
    pub is_dynamic: bool,
    pub score_decimals: usize,
}

impl ScoreboardMetadata {
    pub fn format_score(&self, score: f64) -> String {
        format!("{:.*}", self.score_decimals, score)
    }
}
