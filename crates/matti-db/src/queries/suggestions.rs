use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use matti_types::{CategorySeed, ChatId, SubmittedSuggestion, Suggestion, SuggestionId, SuggestionStatus};

use crate::models::{self, SUGGESTION_COLUMNS};
use crate::queries::categories;
use crate::{Ledger, Result};

/// Suggestion columns prefixed with `s.` followed by the submitter label.
const SUBMITTED_SELECT: &str =
    "SELECT s.id, s.submitter_id, s.name, s.points, s.status, s.admin_notes, s.created_at, s.reviewed_at,
            u.chat_id, u.handle, u.first_name
     FROM suggestions s
     JOIN participants u ON s.submitter_id = u.chat_id";

impl Ledger {
    pub fn add_suggestion(&self, submitter: ChatId, name: &str, points: i64) -> Result<SuggestionId> {
        self.with_conn_mut(|conn| {
            let id = insert_suggestion(conn, submitter, name, points)?;
            debug!("Suggestion {} '{}' ({} points) from {}", id, name, points, submitter);
            Ok(id)
        })
    }

    /// Store a batch of suggestions from one submitter in one transaction:
    /// either every seed becomes a pending suggestion or none does.
    pub fn add_suggestions(&self, submitter: ChatId, seeds: &[CategorySeed]) -> Result<Vec<SuggestionId>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let ids = seeds
                .iter()
                .map(|seed| insert_suggestion(&tx, submitter, &seed.name, seed.points))
                .collect::<Result<Vec<_>>>()?;
            tx.commit()?;
            info!("{} suggestions stored from {}", ids.len(), submitter);
            Ok(ids)
        })
    }

    /// Pending suggestions, oldest first.
    pub fn pending_suggestions(&self) -> Result<Vec<SubmittedSuggestion>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SUBMITTED_SELECT} WHERE s.status = 'pending' ORDER BY s.created_at ASC, s.id ASC"
            ))?;
            let rows = stmt
                .query_map([], submitted_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn suggestion(&self, id: SuggestionId) -> Result<Option<SubmittedSuggestion>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(&format!("{SUBMITTED_SELECT} WHERE s.id = ?1"), [id], submitted_from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// A participant's own suggestions, newest first.
    pub fn suggestions_by(&self, submitter: ChatId) -> Result<Vec<Suggestion>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SUGGESTION_COLUMNS} FROM suggestions
                 WHERE submitter_id = ?1
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map([submitter], models::suggestion)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Upsert the suggested category and mark the suggestion approved.
    /// Returns `false` unless the suggestion exists and is still pending.
    pub fn approve_suggestion(&self, id: SuggestionId, notes: Option<&str>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let pending: Option<(String, i64)> = tx
                .query_row(
                    "SELECT name, points FROM suggestions WHERE id = ?1 AND status = 'pending'",
                    [id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((name, points)) = pending else {
                return Ok(false);
            };

            let category = categories::upsert_category(&tx, &name, points)?;
            close_review(&tx, id, SuggestionStatus::Approved, notes)?;
            tx.commit()?;

            info!("Suggestion {} approved as category {} '{}'", id, category, name);
            Ok(true)
        })
    }

    /// Mark a pending suggestion rejected. Categories are untouched.
    pub fn reject_suggestion(&self, id: SuggestionId, notes: Option<&str>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let rejected = close_review(conn, id, SuggestionStatus::Rejected, notes)?;
            if rejected {
                info!("Suggestion {} rejected", id);
            }
            Ok(rejected)
        })
    }
}

fn insert_suggestion(conn: &Connection, submitter: ChatId, name: &str, points: i64) -> Result<SuggestionId> {
    conn.execute(
        "INSERT INTO suggestions (submitter_id, name, points, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![submitter, name, points, Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Move a pending suggestion to a terminal status. Only rows still pending
/// are touched.
fn close_review(
    conn: &Connection,
    id: SuggestionId,
    status: SuggestionStatus,
    notes: Option<&str>,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE suggestions SET status = ?1, admin_notes = ?2, reviewed_at = ?3
         WHERE id = ?4 AND status = 'pending'",
        params![status.as_str(), notes, Utc::now(), id],
    )?;
    Ok(updated > 0)
}

fn submitted_from_row(row: &rusqlite::Row) -> rusqlite::Result<SubmittedSuggestion> {
    Ok(SubmittedSuggestion {
        suggestion: models::suggestion(row)?,
        submitter: models::label(row, 8)?,
    })
}
