//! # matti-db
//!
//! The points ledger: participants, categories ("matti"), sightings and
//! suggestions in a single SQLite database.
//!
//! Every mutation runs inside one transaction while holding the connection
//! lock, so point adjustments and the ledger rows that justify them commit
//! together or not at all. `total_points` is a cached aggregate of the
//! surviving sightings' effects (see [`points`]), re-based only by
//! [`Ledger::set_points_absolute`].

pub mod migrations;
mod models;
pub mod points;
pub mod queries;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Ledger error types.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("SQLite error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("ledger lock poisoned")]
    LockPoisoned,

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("points total of participant {0} out of range")]
    PointsOverflow(matti_types::ChatId),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

pub struct Ledger {
    conn: Mutex<Connection>,
}

impl Ledger {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent readers outside this process
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let ledger = Self::configure(conn)?;

        info!("Ledger opened at {}", path.display());
        Ok(ledger)
    }

    /// Open a private in-memory ledger. Each call is fully isolated.
    pub fn open_in_memory() -> Result<Self> {
        Self::configure(Connection::open_in_memory()?)
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        migrations::run(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Flush and close the underlying connection.
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().map_err(|_| LedgerError::LockPoisoned)?;
        conn.close().map_err(|(_, e)| LedgerError::Storage(e))?;
        info!("Ledger closed");
        Ok(())
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| LedgerError::LockPoisoned)?;
        f(&conn)
    }

    /// Exclusive access for mutations; callers open a transaction on it.
    pub(crate) fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| LedgerError::LockPoisoned)?;
        f(&mut conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_memory_runs_migrations() {
        let ledger = Ledger::open_in_memory().expect("open");
        let version: i64 = ledger
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))?)
            })
            .expect("version");
        assert_eq!(version, migrations::SCHEMA_VERSION);
    }

    #[test]
    fn foreign_keys_enabled() {
        let ledger = Ledger::open_in_memory().expect("open");
        let fk: i64 = ledger
            .with_conn(|conn| Ok(conn.pragma_query_value(None, "foreign_keys", |r| r.get(0))?))
            .expect("pragma");
        assert_eq!(fk, 1);
    }

    #[test]
    fn file_ledger_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("matti_ledger_reopen_{}", std::process::id()));
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("ledger.db");
        let _ = std::fs::remove_file(&path);

        let ledger = Ledger::open(&path).expect("open");
        ledger.register_participant(1, Some("anna"), Some("Anna")).expect("register");
        ledger.close().expect("close");

        let ledger = Ledger::open(&path).expect("reopen");
        let anna = ledger.participant(1).expect("query").expect("persisted");
        assert_eq!(anna.handle.as_deref(), Some("anna"));
        ledger.close().expect("close");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
