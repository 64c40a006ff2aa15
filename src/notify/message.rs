//! Announcement text and structured detail payload

use crate::scoreboard::{PeerFilter, PeerRankCache, ScoreboardMetadata, ScoreboardSnapshot, TeamDetail, TeamId};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    /// Lower rank index than before (closer to first place)
    Rose,
    Fell,
}

impl Direction {
    pub fn verb(&self) -> &'static str {
        match self {
            Direction::Rose => "rose",
            Direction::Fell => "fell",
        }
    }
}

/// A confirmed change in peer-relative placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementChange {
    pub team_id: TeamId,
    pub direction: Direction,
    /// Places moved, always > 0
    pub magnitude: usize,
    /// 1-based place after the change
    pub new_place: usize,
}

impl PlacementChange {
    /// Compare two zero-based ranks. `None` when nothing moved.
    pub fn between(team_id: TeamId, previous_rank: usize, new_rank: usize) -> Option<Self> {
        if previous_rank == new_rank {
            return None;
        }
        let direction = if new_rank < previous_rank {
            Direction::Rose
        } else {
            Direction::Fell
        };
        Some(Self {
            team_id,
            direction,
            magnitude: previous_rank.abs_diff(new_rank),
            new_place: new_rank + 1,
        })
    }
}

/// `1st`, `2nd`, `3rd`, `4th`, `11th`, `21st`, ...
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// `1 place`, `3 places`
pub fn pluralize(noun: &str, count: usize) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

/// `**T-1234** rose 3 places to **5th place**.`
pub fn format_announcement(change: &PlacementChange) -> String {
    format!(
        "**{}** {} {} to **{} place**.",
        change.team_id,
        change.direction.verb(),
        pluralize("place", change.magnitude),
        ordinal(change.new_place)
    )
}

fn format_play_time(secs: u64) -> String {
    format!("{}:{:02}", secs / 3600, (secs % 3600) / 60)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl PayloadField {
    fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

/// Structured team detail sent alongside the announcement
///
/// Shaped like a chat embed so delivery can forward it unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPayload {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<PayloadField>,
    pub timestamp: DateTime<Utc>,
}

impl NotificationPayload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.value.as_str())
    }
}

/// Build the detail payload with peer-relative and overall context
///
/// Arguments:
/// - `detail`: full record for the team that moved
/// - `snapshot`: the unfiltered board the new rank was computed from
/// - `peer_filter`: the team's peer group for the current round
/// - `metadata`: score formatting
///
/// Fields appear in this order: Peer Group, Location (if known), Total
/// Score, Peer Place ("2nd of 30"), Overall Place, Images, Play Time (if
/// known), then one non-inline field per image. Place fields are omitted
/// when the team is not on `snapshot`. The timestamp is the snapshot's
/// fetch time.
pub fn build_payload(
    detail: &TeamDetail,
    snapshot: &ScoreboardSnapshot,
    peer_filter: &PeerFilter,
    metadata: &ScoreboardMetadata,
) -> NotificationPayload {
    let summary = &detail.summary;
    let mut fields = Vec::new();

    fields.push(PayloadField::new("Peer Group", peer_filter.to_string(), true));

    if let Some(location) = &summary.location {
        fields.push(PayloadField::new("Location", location.clone(), true));
    }

    fields.push(PayloadField::new(
        "Total Score",
        format!("{}pts", metadata.format_score(summary.total_score)),
        true,
    ));

    let mut peers = PeerRankCache::new(snapshot);
    if let Some(rank) = peers.rank(peer_filter, &summary.team_id) {
        fields.push(PayloadField::new(
            "Peer Place",
            format!("{} of {}", ordinal(rank + 1), peers.group_size(peer_filter)),
            true,
        ));
    }

    if let Some(position) = snapshot.position_of(&summary.team_id) {
        fields.push(PayloadField::new(
            "Overall Place",
            format!("{} of {}", ordinal(position + 1), snapshot.len()),
            true,
        ));
    }

    fields.push(PayloadField::new("Images", summary.image_count.to_string(), true));

    if let Some(secs) = summary.play_time_secs {
        fields.push(PayloadField::new("Play Time", format_play_time(secs), true));
    }

    for image in &detail.images {
        let mut line = format!("{}pts", metadata.format_score(image.score));
        if image.penalties > 0 {
            let noun = if image.penalties == 1 { "penalty" } else { "penalties" };
            line.push_str(&format!(", {} {}", image.penalties, noun));
        }
        if let Some(secs) = image.play_time_secs {
            line.push_str(&format!(" in {}", format_play_time(secs)));
        }
        fields.push(PayloadField::new(image.name.clone(), line, false));
    }

    let description = summary
        .category
        .as_ref()
        .map(|category| format!("{} ({})", summary.division, category));

    NotificationPayload {
        title: format!("Team {}", summary.team_id),
        description,
        fields,
        timestamp: snapshot.fetched_at,
    }
}
