//! Placement monitor behaviour across ticks
//!
//! Drives `PlacementMonitor::run_tick` directly with in-memory collaborators,
//! threading the returned state the way the scheduler does.

mod common;

use common::{entry, open, team, tiered, FakeProvider, MemoryRegistry, RecordingNotifier};
use scoreboard_monitor::notify::{format_announcement, Direction};
use scoreboard_monitor::registry::ChannelId;
use scoreboard_monitor::scoreboard::{DefaultCompetitionRules, Division, Round, Tier};
use scoreboard_monitor::{PlacementMonitor, TickReport, TickState};
use std::sync::atomic::Ordering;
use std::sync::Arc;

struct Harness {
    provider: Arc<FakeProvider>,
    registry: Arc<MemoryRegistry>,
    notifier: Arc<RecordingNotifier>,
    monitor: PlacementMonitor,
    state: TickState,
}

impl Harness {
    fn new(round: Round, board: Vec<scoreboard_monitor::scoreboard::ScoreboardEntry>) -> Self {
        let provider = Arc::new(FakeProvider::new(round, Vec::new()));
        provider.set_board(board);
        let registry = Arc::new(MemoryRegistry::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let monitor = PlacementMonitor::new(
            registry.clone(),
            provider.clone(),
            Arc::new(DefaultCompetitionRules),
            notifier.clone(),
        );
        Self {
            provider,
            registry,
            notifier,
            monitor,
            state: TickState::new(),
        }
    }

    /// One tick; on error the previous state is kept, as the scheduler does
    async fn tick(&mut self) -> bool {
        match self.monitor.run_tick(&self.state).await {
            Ok((next, _report)) => {
                self.state = next;
                true
            }
            Err(_) => false,
        }
    }
}

#[tokio::test]
async fn test_example_scenario_fell_one_place() {
    let mut h = Harness::new(Round::Round1, open(&[("T-001", 100.0), ("T-002", 90.0), ("T-003", 80.0)]));
    h.registry.watch(1, 10, "T-002");

    // Tick 1: baseline only
    assert!(h.tick().await);
    assert!(h.notifier.sent().is_empty());
    assert_eq!(h.state.rank_of(&team("T-002")), Some(1));

    // Tick 2: T-003 overtakes T-002
    h.provider.set_board(open(&[("T-001", 100.0), ("T-002", 90.0), ("T-003", 95.0)]));
    assert!(h.tick().await);

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel, ChannelId(10));
    assert_eq!(sent[0].change.direction, Direction::Fell);
    assert_eq!(sent[0].change.magnitude, 1);
    assert_eq!(sent[0].change.new_place, 3);
    assert_eq!(
        format_announcement(&sent[0].change),
        "**T-002** fell 1 place to **3rd place**."
    );
    assert_eq!(h.state.rank_of(&team("T-002")), Some(2));
}

#[tokio::test]
async fn test_rise_reports_magnitude_and_place() {
    let mut h = Harness::new(
        Round::Round2,
        open(&[("A", 500.0), ("B", 400.0), ("C", 300.0), ("D", 200.0), ("E", 100.0)]),
    );
    h.registry.watch(1, 10, "E");
    h.tick().await;

    h.provider
        .set_board(open(&[("A", 500.0), ("B", 400.0), ("C", 300.0), ("D", 200.0), ("E", 450.0)]));
    h.tick().await;

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].change.direction, Direction::Rose);
    assert_eq!(sent[0].change.magnitude, 3);
    assert_eq!(sent[0].change.new_place, 2);
    assert_eq!(format_announcement(&sent[0].change), "**E** rose 3 places to **2nd place**.");
}

#[tokio::test]
async fn test_unchanged_rank_never_notifies_but_state_advances() {
    let mut h = Harness::new(Round::Round1, open(&[("A", 100.0), ("B", 90.0)]));
    h.registry.watch(1, 10, "B");

    for _ in 0..3 {
        assert!(h.tick().await);
        assert_eq!(h.state.rank_of(&team("B")), Some(1));
    }
    // Scores move but the order does not
    h.provider.set_board(open(&[("A", 150.0), ("B", 140.0)]));
    h.tick().await;

    assert!(h.notifier.sent().is_empty());
    assert_eq!(h.provider.detail_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.state.rank_of(&team("B")), Some(1));
}

#[tokio::test]
async fn test_unwatched_team_is_forgotten() {
    let mut h = Harness::new(Round::Round1, open(&[("A", 100.0), ("B", 90.0), ("C", 80.0)]));
    h.registry.watch(1, 10, "A");
    h.registry.watch(1, 10, "C");
    h.tick().await;
    assert!(h.state.contains(&team("C")));

    h.registry.unwatch(10, "C");
    h.tick().await;
    assert!(!h.state.contains(&team("C")));
    assert!(h.state.contains(&team("A")));

    // Rewatched after a big move: no baseline, so no stale notification
    h.provider.set_board(open(&[("A", 100.0), ("B", 90.0), ("C", 200.0)]));
    h.registry.watch(1, 10, "C");
    h.tick().await;

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1, "only A moved relative to its baseline");
    assert_eq!(sent[0].change.team_id, team("A"));
    assert_eq!(h.state.rank_of(&team("C")), Some(0));
}

#[tokio::test]
async fn test_rank_is_relative_to_peer_group() {
    let mut board = open(&[("O-1", 200.0), ("O-2", 150.0)]);
    board.push(entry("MS-1", Division::MiddleSchool, 300.0));
    board.push(entry("MS-2", Division::MiddleSchool, 250.0));

    let mut h = Harness::new(Round::Round1, board);
    h.registry.watch(1, 10, "O-1");
    h.registry.watch(1, 10, "MS-2");
    h.tick().await;

    // O-1 is third overall but first among Open teams
    assert_eq!(h.state.rank_of(&team("O-1")), Some(0));
    assert_eq!(h.state.rank_of(&team("MS-2")), Some(1));

    // Another Middle School team jumps above O-1's score: O-1 unaffected
    let mut board = open(&[("O-1", 200.0), ("O-2", 150.0)]);
    board.push(entry("MS-1", Division::MiddleSchool, 300.0));
    board.push(entry("MS-2", Division::MiddleSchool, 250.0));
    board.push(entry("MS-3", Division::MiddleSchool, 275.0));
    h.provider.set_board(board);
    h.tick().await;

    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].change.team_id, team("MS-2"));
    assert_eq!(sent[0].change.new_place, 3);
    assert_eq!(sent[0].peers_in_view, 3);
    assert_eq!(h.state.rank_of(&team("O-1")), Some(0));
}

#[tokio::test]
async fn test_tiered_round_ranks_within_tier() {
    let board = vec![
        tiered("P-1", Some(Tier::Platinum), 300.0),
        tiered("G-1", Some(Tier::Gold), 250.0),
        tiered("P-2", Some(Tier::Platinum), 200.0),
        tiered("G-2", Some(Tier::Gold), 150.0),
    ];
    let mut h = Harness::new(Round::Semifinals, board);
    h.registry.watch(1, 10, "G-2");
    h.registry.watch(1, 10, "P-2");
    h.tick().await;

    assert_eq!(h.state.rank_of(&team("G-2")), Some(1));
    assert_eq!(h.state.rank_of(&team("P-2")), Some(1));
}

#[tokio::test]
async fn test_unresolvable_peer_group_is_skipped() {
    let board = vec![
        tiered("P-1", Some(Tier::Platinum), 300.0),
        tiered("NOTIER", None, 250.0),
    ];
    let h = Harness::new(Round::Round3, board);
    h.registry.watch(1, 10, "NOTIER");
    h.registry.watch(1, 10, "P-1");

    let (next, report) = h.monitor.run_tick(&h.state).await.unwrap();
    assert!(!next.contains(&team("NOTIER")));
    assert_eq!(next.rank_of(&team("P-1")), Some(0));
    assert_eq!(report.teams_skipped, 1);
}

#[tokio::test]
async fn test_team_missing_from_board_is_skipped_not_ranked_zero() {
    let mut h = Harness::new(Round::Round1, open(&[("A", 100.0), ("B", 90.0)]));
    h.registry.watch(1, 10, "B");
    h.tick().await;
    assert_eq!(h.state.rank_of(&team("B")), Some(1));

    h.provider.set_board(open(&[("A", 100.0)]));
    h.tick().await;

    assert!(h.notifier.sent().is_empty());
    assert!(!h.state.contains(&team("B")));
}

#[tokio::test]
async fn test_delivery_failure_does_not_block_other_destinations() {
    let mut h = Harness::new(Round::Round1, open(&[("A", 100.0), ("B", 90.0)]));
    h.registry.watch(1, 10, "B");
    h.registry.watch(2, 20, "B");
    h.notifier.fail_channel(10);
    h.tick().await;

    h.provider.set_board(open(&[("A", 100.0), ("B", 110.0)]));
    let (next, report) = h.monitor.run_tick(&h.state).await.unwrap();

    assert_eq!(h.notifier.attempts.load(Ordering::SeqCst), 2);
    let sent = h.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel, ChannelId(20));
    assert_eq!(report.delivery_failures, 1);
    assert_eq!(report.notifications_sent, 1);
    // Baseline advances despite the failed delivery
    assert_eq!(next.rank_of(&team("B")), Some(0));
    // Details fetched once for both destinations
    assert_eq!(h.provider.detail_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_idle_destination_does_not_end_tick() {
    let mut h = Harness::new(Round::Round1, open(&[("A", 100.0), ("B", 90.0)]));
    h.registry.add_idle_channel(1, 10);
    h.registry.watch(2, 20, "B");
    h.tick().await;
    assert_eq!(h.state.rank_of(&team("B")), Some(1));

    h.provider.set_board(open(&[("A", 100.0), ("B", 120.0)]));
    h.tick().await;
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_snapshot_fetched_once_per_tick_and_only_when_needed() {
    let mut h = Harness::new(Round::Round1, open(&[("A", 100.0), ("B", 90.0), ("C", 80.0)]));
    h.registry.add_idle_channel(1, 10);
    h.tick().await;
    assert_eq!(h.provider.snapshots(), 0);

    h.registry.watch(1, 11, "A");
    h.registry.watch(2, 20, "A");
    h.registry.watch(2, 21, "C");
    h.tick().await;
    assert_eq!(h.provider.snapshots(), 1);
    h.tick().await;
    assert_eq!(h.provider.snapshots(), 2);
}

#[tokio::test]
async fn test_fetch_failures_keep_previous_state() {
    let mut h = Harness::new(Round::Round1, open(&[("A", 100.0), ("B", 90.0)]));
    h.registry.watch(1, 10, "B");
    h.tick().await;
    let baseline = h.state.clone();

    h.provider.fail_snapshot.store(true, Ordering::SeqCst);
    assert!(!h.tick().await);
    assert_eq!(h.state, baseline);

    h.provider.fail_snapshot.store(false, Ordering::SeqCst);
    h.registry.unreachable.store(true, Ordering::SeqCst);
    assert!(!h.tick().await);
    assert_eq!(h.state, baseline);

    // Recovery: the change since the baseline is still detected
    h.registry.unreachable.store(false, Ordering::SeqCst);
    h.provider.set_board(open(&[("A", 100.0), ("B", 120.0)]));
    assert!(h.tick().await);
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_empty_registry_clears_state() {
    let mut h = Harness::new(Round::Round1, open(&[("A", 100.0)]));
    h.state = [(team("A"), 0)].into_iter().collect();

    let (next, report) = h.monitor.run_tick(&h.state).await.unwrap();
    assert!(next.is_empty(), "nobody watches A any more");
    assert_eq!(report, TickReport::default());
    assert_eq!(h.provider.snapshots(), 0);
}

#[tokio::test]
async fn test_detail_failure_retries_change_next_tick() {
    let mut h = Harness::new(Round::Round1, open(&[("A", 100.0), ("B", 90.0)]));
    h.registry.watch(1, 10, "B");
    h.tick().await;

    h.provider.set_board(open(&[("A", 100.0), ("B", 120.0)]));
    h.provider.fail_detail(&team("B"), true);
    h.tick().await;
    assert!(h.notifier.sent().is_empty());
    assert_eq!(h.state.rank_of(&team("B")), Some(1), "old baseline kept");

    h.provider.fail_detail(&team("B"), false);
    h.tick().await;
    let sent = h.notifier.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].change.direction, Direction::Rose);
    assert_eq!(h.state.rank_of(&team("B")), Some(0));
}
