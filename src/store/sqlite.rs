use std::{
    path::PathBuf,
    sync::{Mutex, MutexGuard},
};

use anyhow::{bail, Context, Result};
use log::{error, info};
use rusqlite::{params, Connection};

use super::{LastTriggerLookup, TriggerRecorder};

const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Persistent trigger history backed by SQLite: one row per
/// `(schedule_id, window_id)`, overwritten on every recorded trigger.
pub struct SqliteTriggerStore {
    conn: Mutex<Connection>,
}

impl SqliteTriggerStore {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create trigger store directory {}", parent.display())
            })?;
        }

        let mut conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open trigger store at {}", db_path.display()))?;

        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            error!("Failed to enable WAL mode: {err}");
        }

        run_migrations(&mut conn)?;

        info!("Trigger store initialized at {}", db_path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// A throwaway store for tests and short-lived embedders.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn =
            Connection::open_in_memory().context("failed to open in-memory trigger store")?;

        run_migrations(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Forgets every recorded trigger for the given schedule.
    pub fn clear_schedule(&self, schedule_id: &str) -> Result<()> {
        self.lock_conn()
            .execute(
                "DELETE FROM window_triggers WHERE schedule_id = ?1",
                params![schedule_id],
            )
            .with_context(|| format!("failed to clear triggers for schedule {schedule_id}"))?;
        Ok(())
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl LastTriggerLookup for SqliteTriggerStore {
    fn last_trigger_epoch_ms(&self, schedule_id: &str, window_id: u32) -> Option<i64> {
        let result = self.lock_conn().query_row(
            "SELECT last_trigger_ms FROM window_triggers
             WHERE schedule_id = ?1 AND window_id = ?2",
            params![schedule_id, window_id],
            |row| row.get(0),
        );

        match result {
            Ok(epoch_ms) => Some(epoch_ms),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(err) => {
                error!("Failed to read last trigger for {schedule_id}/{window_id}: {err}");
                None
            }
        }
    }
}

impl TriggerRecorder for SqliteTriggerStore {
    fn record_trigger(&self, schedule_id: &str, window_id: u32, epoch_ms: i64) -> Result<()> {
        self.lock_conn()
            .execute(
                "INSERT OR REPLACE INTO window_triggers (schedule_id, window_id, last_trigger_ms)
                 VALUES (?1, ?2, ?3)",
                params![schedule_id, window_id, epoch_ms],
            )
            .with_context(|| format!("failed to record trigger for {schedule_id}/{window_id}"))?;
        Ok(())
    }
}

fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mut version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    if version > CURRENT_SCHEMA_VERSION {
        bail!(
            "trigger store version ({}) is newer than supported schema ({})",
            version,
            CURRENT_SCHEMA_VERSION
        );
    }

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;

    while version < CURRENT_SCHEMA_VERSION {
        let next_version = version + 1;
        apply_migration(&tx, next_version)
            .with_context(|| format!("migration to version {next_version} failed"))?;
        version = next_version;
    }

    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")?;

    Ok(())
}

fn apply_migration(tx: &rusqlite::Transaction<'_>, version: i32) -> Result<()> {
    match version {
        1 => {
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS window_triggers (
                     schedule_id     TEXT NOT NULL,
                     window_id       INTEGER NOT NULL,
                     last_trigger_ms INTEGER NOT NULL,
                     PRIMARY KEY (schedule_id, window_id)
                 )",
            )
            .context("failed to create window_triggers table")?;
            Ok(())
        }
        other => bail!("no migration registered for version {other}"),
    }
}
