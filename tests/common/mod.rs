//! In-memory collaborators for monitor tests

#![allow(dead_code)]

use async_trait::async_trait;
use scoreboard_monitor::notify::{Notifier, PlacementChange};
use scoreboard_monitor::registry::{ChannelId, Destination, GuildId, SubscriptionRegistry};
use scoreboard_monitor::scoreboard::{
    Division, PeerFilter, Round, ScoreboardEntry, ScoreboardFilter, ScoreboardMetadata, ScoreboardProvider,
    ScoreboardSnapshot, TeamDetail, TeamId, Tier,
};
use scoreboard_monitor::MonitorError;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn team(id: &str) -> TeamId {
    TeamId::new(id)
}

pub fn entry(id: &str, division: Division, score: f64) -> ScoreboardEntry {
    ScoreboardEntry {
        team_id: TeamId::new(id),
        division,
        category: None,
        location: Some("VA".to_string()),
        tier: None,
        image_count: 3,
        play_time_secs: Some(4 * 3600),
        total_score: score,
    }
}

pub fn tiered(id: &str, tier: Option<Tier>, score: f64) -> ScoreboardEntry {
    ScoreboardEntry {
        tier,
        ..entry(id, Division::Open, score)
    }
}

pub fn open(scores: &[(&str, f64)]) -> Vec<ScoreboardEntry> {
    scores.iter().map(|(id, s)| entry(id, Division::Open, *s)).collect()
}

/// Scoreboard whose board can be swapped between ticks
pub struct FakeProvider {
    board: Mutex<Vec<ScoreboardEntry>>,
    round: Round,
    pub fail_snapshot: AtomicBool,
    failing_details: Mutex<HashSet<TeamId>>,
    pub snapshot_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub metadata: ScoreboardMetadata,
}

impl FakeProvider {
    pub fn new(round: Round, board: Vec<ScoreboardEntry>) -> Self {
        Self {
            board: Mutex::new(board),
            round,
            fail_snapshot: AtomicBool::new(false),
            failing_details: Mutex::new(HashSet::new()),
            snapshot_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            metadata: ScoreboardMetadata::default(),
        }
    }

    /// Replace the board; entries are ranked by score, highest first
    pub fn set_board(&self, mut board: Vec<ScoreboardEntry>) {
        scoreboard_monitor::scoreboard::provider::sort_by_score(&mut board);
        *self.board.lock().unwrap() = board;
    }

    pub fn fail_detail(&self, team: &TeamId, fail: bool) {
        let mut failing = self.failing_details.lock().unwrap();
        if fail {
            failing.insert(team.clone());
        } else {
            failing.remove(team);
        }
    }

    pub fn snapshots(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoreboardProvider for FakeProvider {
    async fn snapshot(&self, filter: &ScoreboardFilter) -> Result<ScoreboardSnapshot, MonitorError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_snapshot.load(Ordering::SeqCst) {
            return Err(MonitorError::Fetch("scoreboard unavailable".to_string()));
        }
        let mut board = self.board.lock().unwrap().clone();
        scoreboard_monitor::scoreboard::provider::sort_by_score(&mut board);
        let entries = board.into_iter().filter(|e| filter.matches(e)).collect();
        Ok(ScoreboardSnapshot::new(entries, self.round, true))
    }

    async fn detail(&self, team: &TeamId) -> Result<TeamDetail, MonitorError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_details.lock().unwrap().contains(team) {
            return Err(MonitorError::Fetch(format!("no details for {}", team)));
        }
        let board = self.board.lock().unwrap();
        let summary = board
            .iter()
            .find(|e| &e.team_id == team)
            .cloned()
            .ok_or_else(|| MonitorError::Fetch(format!("unknown team {}", team)))?;
        Ok(TeamDetail {
            summary,
            images: Vec::new(),
        })
    }

    fn current_round(&self) -> Round {
        self.round
    }

    fn metadata(&self) -> ScoreboardMetadata {
        self.metadata.clone()
    }
}

#[derive(Default)]
pub struct MemoryRegistry {
    destinations: Mutex<Vec<Destination>>,
    pub unreachable: AtomicBool,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watch(&self, guild: u64, channel: u64, team_id: &str) {
        let mut destinations = self.destinations.lock().unwrap();
        let channel = ChannelId(channel);
        match destinations.iter_mut().find(|d| d.channel_id == channel) {
            Some(d) => {
                d.teams.insert(team(team_id));
            }
            None => {
                let mut d = Destination::new(GuildId(guild), channel);
                d.teams.insert(team(team_id));
                destinations.push(d);
            }
        }
    }

    pub fn unwatch(&self, channel: u64, team_id: &str) {
        let mut destinations = self.destinations.lock().unwrap();
        for d in destinations.iter_mut().filter(|d| d.channel_id == ChannelId(channel)) {
            d.teams.remove(&team(team_id));
        }
    }

    /// Channel present in settings but watching nothing
    pub fn add_idle_channel(&self, guild: u64, channel: u64) {
        self.destinations
            .lock()
            .unwrap()
            .push(Destination::new(GuildId(guild), ChannelId(channel)));
    }
}

#[async_trait]
impl SubscriptionRegistry for MemoryRegistry {
    async fn enumerate(&self) -> Result<Vec<Destination>, MonitorError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(MonitorError::Fetch("registry unreachable".to_string()));
        }
        Ok(self.destinations.lock().unwrap().clone())
    }

    async fn is_watching(&self, channel: ChannelId, team: &TeamId) -> Result<bool, MonitorError> {
        Ok(self.monitored_teams(channel).await?.contains(team))
    }

    async fn monitored_teams(&self, channel: ChannelId) -> Result<BTreeSet<TeamId>, MonitorError> {
        Ok(self
            .destinations
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.channel_id == channel)
            .map(|d| d.teams.clone())
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct Sent {
    pub channel: ChannelId,
    pub change: PlacementChange,
    pub peer_filter: PeerFilter,
    pub peers_in_view: usize,
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Sent>>,
    failing_channels: Mutex<HashSet<ChannelId>>,
    pub attempts: AtomicUsize,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_channel(&self, channel: u64) {
        self.failing_channels.lock().unwrap().insert(ChannelId(channel));
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        destination: &Destination,
        change: &PlacementChange,
        _detail: &TeamDetail,
        snapshot: &ScoreboardSnapshot,
        peer_filter: &PeerFilter,
    ) -> Result<(), MonitorError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing_channels.lock().unwrap().contains(&destination.channel_id) {
            return Err(MonitorError::Delivery {
                channel: destination.channel_id,
                reason: "missing permissions".to_string(),
            });
        }
        self.sent.lock().unwrap().push(Sent {
            channel: destination.channel_id,
            change: change.clone(),
            peer_filter: peer_filter.clone(),
            peers_in_view: snapshot.with_filter(peer_filter).len(),
        });
        Ok(())
    }
}
