//! SQLite-backed subscription registry
//!
//! Schema lives in `sql/*.sql` and is applied by [`run_schema_migrations`].

use super::{ChannelId, Destination, GuildId, SubscriptionRegistry};
use crate::error::MonitorError;
use crate::scoreboard::TeamId;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Apply every `.sql` file in `schema_dir` to `conn`
///
/// Arguments:
/// - `conn`: registry database, switched to WAL journaling before any file runs
/// - `schema_dir`: directory of numbered migration files (`01_*.sql`, `02_*.sql`, ...)
///
/// Returns:
/// - `Ok(n)`: number of files applied, in file-name order
/// - `Err(MonitorError::Migration)`: names the directory or file that could
///   not be read or executed. Files applied before it stay applied.
///
/// Every start reapplies all files, so each must be idempotent (`IF NOT EXISTS`).
pub fn run_schema_migrations(conn: &mut Connection, schema_dir: impl AsRef<Path>) -> Result<usize, MonitorError> {
    let dir = schema_dir.as_ref();

    let listing = fs::read_dir(dir).map_err(|e| migration_error(dir, e))?;
    let mut files: Vec<PathBuf> = listing
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "sql"))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(migration_error(dir, "no .sql files found"));
    }

    conn.pragma_update(None, "journal_mode", "WAL")?;
    log::info!("🔧 Applying {} registry migrations from {}", files.len(), dir.display());

    for path in &files {
        let sql = fs::read_to_string(path).map_err(|e| migration_error(path, e))?;
        conn.execute_batch(&sql).map_err(|e| migration_error(path, e))?;
        log::debug!("   ├─ applied {}", path.display());
    }

    log::info!("✅ Registry schema up to date");
    Ok(files.len())
}

fn migration_error(file: &Path, reason: impl std::fmt::Display) -> MonitorError {
    MonitorError::Migration {
        file: file.display().to_string(),
        reason: reason.to_string(),
    }
}

pub struct SqliteSubscriptionRegistry {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSubscriptionRegistry {
    /// Open a registry over an existing database
    ///
    /// Does NOT create the schema; run [`run_schema_migrations`] first.
    pub fn new(db_path: &str) -> Result<Self, MonitorError> {
        let conn = Connection::open(db_path)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, MonitorError> {
        self.conn
            .lock()
            .map_err(|_| MonitorError::Fetch("registry connection lock poisoned".to_string()))
    }

    /// Add `team` to a channel's watch list. Returns false if already watched.
    ///
    /// Seeding helper for the admin surface and tests.
    pub fn watch(&self, guild: GuildId, channel: ChannelId, team: &TeamId) -> Result<bool, MonitorError> {
        let conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "INSERT INTO guild_settings (guild_id, created_at, updated_at) VALUES (?1, ?2, ?2)
             ON CONFLICT(guild_id) DO UPDATE SET updated_at = excluded.updated_at",
            params![guild.0 as i64, now],
        )?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO monitored_teams (guild_id, channel_id, team_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![guild.0 as i64, channel.0 as i64, team.as_str(), now],
        )?;

        Ok(inserted > 0)
    }

    /// Remove `team` from a channel's watch list. Returns false if it was not watched.
    pub fn unwatch(&self, channel: ChannelId, team: &TeamId) -> Result<bool, MonitorError> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM monitored_teams WHERE channel_id = ?1 AND team_id = ?2",
            params![channel.0 as i64, team.as_str()],
        )?;
        Ok(removed > 0)
    }
}

#[async_trait]
impl SubscriptionRegistry for SqliteSubscriptionRegistry {
    async fn enumerate(&self) -> Result<Vec<Destination>, MonitorError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT guild_id, channel_id, team_id FROM monitored_teams
             ORDER BY guild_id, channel_id, team_id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut destinations: Vec<Destination> = Vec::new();
        for row in rows {
            let (guild_id, channel_id, team_id) = row?;
            let guild = GuildId(guild_id as u64);
            let channel = ChannelId(channel_id as u64);

            match destinations.last_mut() {
                Some(last) if last.guild_id == guild && last.channel_id == channel => {
                    last.teams.insert(TeamId::new(team_id));
                }
                _ => {
                    let mut destination = Destination::new(guild, channel);
                    destination.teams.insert(TeamId::new(team_id));
                    destinations.push(destination);
                }
            }
        }

        Ok(destinations)
    }

    async fn is_watching(&self, channel: ChannelId, team: &TeamId) -> Result<bool, MonitorError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT 1 FROM monitored_teams WHERE channel_id = ?1 AND team_id = ?2")?;
        Ok(stmt.exists(params![channel.0 as i64, team.as_str()])?)
    }

    async fn monitored_teams(&self, channel: ChannelId) -> Result<BTreeSet<TeamId>, MonitorError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT team_id FROM monitored_teams WHERE channel_id = ?1")?;
        let teams = stmt
            .query_map(params![channel.0 as i64], |row| row.get::<_, String>(0))?
            .map(|r| r.map(TeamId::new))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(teams)
    }
}
