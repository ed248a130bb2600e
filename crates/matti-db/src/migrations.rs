use rusqlite::Connection;
use tracing::info;

use crate::{LedgerError, Result};

pub const SCHEMA_VERSION: i64 = 1;

/// Apply every migration newer than the stored version. Safe to call on
/// each open.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version > SCHEMA_VERSION {
        return Err(LedgerError::Migration(format!(
            "ledger schema v{version} is newer than supported v{SCHEMA_VERSION}"
        )));
    }

    if version < 1 {
        info!("Ledger: running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE participants (
                chat_id         INTEGER PRIMARY KEY,
                handle          TEXT,
                first_name      TEXT,
                registered      INTEGER NOT NULL DEFAULT 0 CHECK (registered IN (0, 1)),
                total_points    INTEGER NOT NULL DEFAULT 0 CHECK (typeof(total_points) = 'integer'),
                created_at      TEXT NOT NULL
            );

            CREATE TABLE categories (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL UNIQUE,
                points          INTEGER NOT NULL
            );

            -- Category cascade is a backstop only: removal deletes and
            -- reverses sightings explicitly before the category row goes.
            CREATE TABLE sightings (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                reporter_id     INTEGER NOT NULL REFERENCES participants(chat_id) ON DELETE CASCADE,
                category_id     INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                target_id       INTEGER REFERENCES participants(chat_id) ON DELETE SET NULL,
                points_awarded  INTEGER NOT NULL,
                media_ref       TEXT NOT NULL,
                media_kind      TEXT NOT NULL DEFAULT 'photo' CHECK (media_kind IN ('photo', 'video')),
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_sightings_reporter ON sightings(reporter_id, created_at);
            CREATE INDEX idx_sightings_category ON sightings(category_id, created_at);
            CREATE INDEX idx_sightings_target ON sightings(target_id);

            CREATE TABLE suggestions (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                submitter_id    INTEGER NOT NULL REFERENCES participants(chat_id) ON DELETE CASCADE,
                name            TEXT NOT NULL,
                points          INTEGER NOT NULL,
                status          TEXT NOT NULL DEFAULT 'pending'
                                CHECK (status IN ('pending', 'approved', 'rejected')),
                admin_notes     TEXT,
                created_at      TEXT NOT NULL,
                reviewed_at     TEXT
            );

            CREATE INDEX idx_suggestions_status ON suggestions(status, created_at);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    Ok(())
}
