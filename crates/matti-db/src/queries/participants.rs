use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use matti_types::{ChatId, LeaderboardEntry, Participant, ParticipantLabel, Standing};

use crate::models::{self, PARTICIPANT_COLUMNS};
use crate::{Ledger, Result};

impl Ledger {
    /// Insert a participant on first contact. Identity fields are
    /// first-write-wins: a repeat call for a known id changes nothing.
    /// Returns whether a row was inserted.
    pub fn register_participant(
        &self,
        chat_id: ChatId,
        handle: Option<&str>,
        first_name: Option<&str>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO participants (chat_id, handle, first_name, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![chat_id, handle, first_name, Utc::now()],
            )?;
            if inserted > 0 {
                debug!("Participant {} created", chat_id);
            }
            Ok(inserted > 0)
        })
    }

    /// Toggle gameplay eligibility. History and points are kept either way.
    pub fn set_registered(&self, chat_id: ChatId, registered: bool) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE participants SET registered = ?1 WHERE chat_id = ?2",
                params![registered, chat_id],
            )?;
            debug!("Participant {} registered={}", chat_id, registered);
            Ok(updated > 0)
        })
    }

    pub fn unregister(&self, chat_id: ChatId) -> Result<bool> {
        self.set_registered(chat_id, false)
    }

    pub fn participant(&self, chat_id: ChatId) -> Result<Option<Participant>> {
        self.with_conn(|conn| query_participant(conn, chat_id))
    }

    /// Registered participants ordered by handle, then id.
    pub fn registered_participants(&self) -> Result<Vec<ParticipantLabel>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT chat_id, handle, first_name FROM participants
                 WHERE registered = 1
                 ORDER BY handle, chat_id",
            )?;
            let rows = stmt
                .query_map([], |row| models::label(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn registered_ids(&self) -> Result<Vec<ChatId>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT chat_id FROM participants WHERE registered = 1 ORDER BY chat_id")?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// Moderator override. Re-bases the total without touching sightings;
    /// later sightings and deletions apply relative to the new value.
    pub fn set_points_absolute(&self, chat_id: ChatId, total_points: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE participants SET total_points = ?1 WHERE chat_id = ?2",
                params![total_points, chat_id],
            )?;
            debug!("Participant {} points overridden to {}", chat_id, total_points);
            Ok(updated > 0)
        })
    }

    /// Rank among registered participants by total, descending.
    /// Rank = 1 + number of registered participants with a strictly greater
    /// total, so ties share a rank. `None` if unknown or unregistered.
    pub fn rank_and_points(&self, chat_id: ChatId) -> Result<Option<Standing>> {
        self.with_conn(|conn| {
            let standing = conn
                .query_row(
                    "SELECT p.chat_id, p.total_points,
                            (SELECT COUNT(*) + 1 FROM participants o
                             WHERE o.registered = 1 AND o.total_points > p.total_points)
                     FROM participants p
                     WHERE p.chat_id = ?1 AND p.registered = 1",
                    [chat_id],
                    |row| {
                        Ok(Standing {
                            chat_id: row.get(0)?,
                            total_points: row.get(1)?,
                            rank: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(standing)
        })
    }

    /// Registered participants by total descending, ties broken by id.
    pub fn leaderboard(&self, limit: Option<u32>) -> Result<Vec<LeaderboardEntry>> {
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map_or(-1, i64::from);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT chat_id, handle, first_name, total_points FROM participants
                 WHERE registered = 1
                 ORDER BY total_points DESC, chat_id ASC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], |row| {
                    Ok(LeaderboardEntry {
                        participant: models::label(row, 0)?,
                        total_points: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

pub(crate) fn query_participant(conn: &Connection, chat_id: ChatId) -> Result<Option<Participant>> {
    let row = conn
        .query_row(
            &format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE chat_id = ?1"),
            [chat_id],
            models::participant,
        )
        .optional()?;
    Ok(row)
}

pub(crate) fn participant_exists(conn: &Connection, chat_id: ChatId) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM participants WHERE chat_id = ?1", [chat_id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}
