//! Placement Monitor Runtime
//!
//! Orchestrates the two periodic tasks:
//! - Placement change monitor (default every 5 minutes)
//! - Status line refresh (default every 60 seconds)
//!
//! Usage:
//!   cargo run --release --bin placement_monitor
//!
//! Environment variables:
//!   SCOREBOARD_API_URL - Scoreboard JSON service (required)
//!   DISCORD_TOKEN - Bot token for channel messages (required)
//!   SCOREBOARD_DB_PATH - SQLite registry path (default: scoreboard_monitor.db)
//!   COMPETITION_ROUND - Round used for peer grouping (default: unknown)
//!   PLACEMENT_POLL_INTERVAL_SECS - Placement poll interval (default: 300)

use dotenv::dotenv;
use log::{error, info};
use rusqlite::Connection;
use scoreboard_monitor::config::MonitorConfig;
use scoreboard_monitor::notify::{DiscordRestDelivery, NotificationDispatcher};
use scoreboard_monitor::registry::{run_schema_migrations, SqliteSubscriptionRegistry};
use scoreboard_monitor::scoreboard::{DefaultCompetitionRules, HttpScoreboardProvider, ScoreboardProvider};
use scoreboard_monitor::status::{LogStatusSink, StatusRefreshTask};
use scoreboard_monitor::{PeriodicTask, PlacementMonitor, Shutdown, TickState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    info!("🚀 Placement Monitor Runtime");

    let config = MonitorConfig::from_env()?;

    info!("   ├─ Database: {}", config.db_path);
    info!("   ├─ Scoreboard: {}", config.scoreboard_api_url);
    info!("   ├─ Round: {}", config.round);
    info!("   ├─ Placement interval: {}s", config.poll_interval.as_secs());
    info!("   └─ Status interval: {}s", config.status_interval.as_secs());

    info!("🔧 Initializing database...");
    let mut conn = Connection::open(&config.db_path)?;
    run_schema_migrations(&mut conn, "sql")?;
    drop(conn);

    let registry = Arc::new(SqliteSubscriptionRegistry::new(&config.db_path)?);
    info!("✅ Subscription registry ready");

    let provider: Arc<dyn ScoreboardProvider> = Arc::new(HttpScoreboardProvider::new(
        &config.scoreboard_api_url,
        config.round,
        config.scoreboard_metadata(),
        config.http_timeout,
    )?);

    let delivery = Arc::new(DiscordRestDelivery::new(
        &config.discord_api_base,
        &config.discord_token,
        config.http_timeout,
    )?);
    let dispatcher = Arc::new(NotificationDispatcher::new(delivery, config.scoreboard_metadata()));

    let shutdown = Shutdown::new();

    let status_handle = PeriodicTask::new("status refresh", config.status_interval).spawn(
        StatusRefreshTask::new(provider.clone(), Arc::new(LogStatusSink)),
        (),
        shutdown.subscribe(),
    );

    let placement_handle = if config.enabled {
        let monitor = PlacementMonitor::new(registry, provider, Arc::new(DefaultCompetitionRules), dispatcher);
        Some(PeriodicTask::new("placement monitor", config.poll_interval).spawn(
            monitor,
            TickState::new(),
            shutdown.subscribe(),
        ))
    } else {
        info!("⚠️  Placement monitor is DISABLED (set ENABLE_PLACEMENT_MONITOR=true to activate)");
        None
    };

    info!("🔄 Press CTRL+C to shutdown gracefully");

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("⚠️  Received CTRL+C, shutting down..."),
        Err(err) => error!("❌ Failed to listen for CTRL+C: {}", err),
    }

    // In-flight ticks finish before the loops exit
    shutdown.trigger();

    if let Some(handle) = placement_handle {
        let name = handle.name().to_string();
        let stats = handle.stats();
        match handle.join().await {
            Ok(state) => info!(
                "✅ {} stopped: {} ticks ({} failed), {} teams tracked",
                name,
                stats.tick_count(),
                stats.failure_count(),
                state.len()
            ),
            Err(e) => error!("❌ {} task failed: {}", name, e),
        }
    }

    let name = status_handle.name().to_string();
    if let Err(e) = status_handle.join().await {
        error!("❌ {} task failed: {}", name, e);
    }

    info!("✅ Placement monitor runtime stopped");
    Ok(())
}
