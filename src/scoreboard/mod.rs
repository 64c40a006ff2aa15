//! Scoreboard model, peer grouping and rank computation

pub mod peer_filter;
pub mod provider;
pub mod rank;
pub mod types;

pub use peer_filter::{CompetitionRules, DefaultCompetitionRules, PeerFilter};
pub use provider::{HttpScoreboardProvider, ScoreboardProvider};
pub use rank::{rank_within, PeerRankCache};
pub use types::{
    Division, ImageDetail, Round, ScoreboardEntry, ScoreboardFilter, ScoreboardMetadata, ScoreboardSnapshot,
    TeamDetail, TeamId, Tier,
};
