use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use matti_types::{
    CategoryId, CategorySighting, CategoryTally, ChatId, Media, ParticipantGalleryEntry, Sighting,
    SightingId,
};

use crate::models::{self, SIGHTING_COLUMNS};
use crate::points::{self, PointDelta};
use crate::queries::{categories, participants};
use crate::{Ledger, LedgerError, Result};

/// The fields of a stored sighting that determine its point effect.
pub(crate) struct Footprint {
    pub id: SightingId,
    pub reporter: ChatId,
    pub points: i64,
    pub target: Option<ChatId>,
}

impl Footprint {
    /// Maps `id, reporter_id, points_awarded, target_id`.
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            reporter: row.get(1)?,
            points: row.get(2)?,
            target: row.get(3)?,
        })
    }

    pub(crate) fn reversal(&self) -> Vec<PointDelta> {
        points::reversal_effects(self.reporter, self.points, self.target)
    }
}

impl Ledger {
    /// Persist a sighting and apply its point effect atomically.
    ///
    /// `points` is the category's value at call time and is frozen on the
    /// row. Fails with [`LedgerError::NotFound`] before writing anything if
    /// the reporter, category or target does not exist.
    pub fn record_sighting(
        &self,
        reporter: ChatId,
        category: CategoryId,
        points: i64,
        media: &Media,
        target: Option<ChatId>,
    ) -> Result<SightingId> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if !participants::participant_exists(&tx, reporter)? {
                return Err(LedgerError::NotFound(format!("participant {reporter}")));
            }
            if categories::query_category(&tx, category)?.is_none() {
                return Err(LedgerError::NotFound(format!("category {category}")));
            }
            if let Some(target) = target {
                if !participants::participant_exists(&tx, target)? {
                    return Err(LedgerError::NotFound(format!("participant {target}")));
                }
            }

            tx.execute(
                "INSERT INTO sightings
                    (reporter_id, category_id, target_id, points_awarded, media_ref, media_kind, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    reporter,
                    category,
                    target,
                    points,
                    media.file_ref,
                    media.kind.as_str(),
                    Utc::now(),
                ],
            )?;
            let id = tx.last_insert_rowid();

            points::apply(&tx, &points::sighting_effects(reporter, points, target))?;
            tx.commit()?;

            debug!(
                "Sighting {} recorded: reporter={} category={} points={} target={:?}",
                id, reporter, category, points, target
            );
            Ok(id)
        })
    }

    /// Remove a sighting and undo exactly the effect it had when recorded.
    /// Returns `false` if no such sighting exists.
    pub fn delete_sighting(&self, id: SightingId) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let footprint = tx
                .query_row(
                    "SELECT id, reporter_id, points_awarded, target_id FROM sightings WHERE id = ?1",
                    [id],
                    Footprint::from_row,
                )
                .optional()?;
            let Some(footprint) = footprint else {
                return Ok(false);
            };

            tx.execute("DELETE FROM sightings WHERE id = ?1", [footprint.id])?;
            points::apply(&tx, &footprint.reversal())?;
            tx.commit()?;

            debug!("Sighting {} deleted and reversed", id);
            Ok(true)
        })
    }

    pub fn sighting(&self, id: SightingId) -> Result<Option<Sighting>> {
        self.with_conn(|conn| query_sighting(conn, id))
    }

    /// A participant's sightings grouped per category. Groups and entries
    /// are ordered newest first.
    pub fn gallery_by_participant(&self, chat_id: ChatId) -> Result<Vec<CategoryTally>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.category_id, c.name, s.points_awarded, s.media_ref, s.media_kind,
                        s.created_at, t.chat_id, t.handle, t.first_name
                 FROM sightings s
                 JOIN categories c ON s.category_id = c.id
                 LEFT JOIN participants t ON s.target_id = t.chat_id
                 WHERE s.reporter_id = ?1
                 ORDER BY s.created_at DESC, s.id DESC",
            )?;

            let rows = stmt
                .query_map([chat_id], |row| {
                    let category_id: CategoryId = row.get(1)?;
                    let category_name: String = row.get(2)?;
                    let entry = ParticipantGalleryEntry {
                        sighting_id: row.get(0)?,
                        points_awarded: row.get(3)?,
                        media: models::media(row, 4, 5)?,
                        created_at: row.get(6)?,
                        target: models::optional_label(row, 7)?,
                    };
                    Ok((category_id, category_name, entry))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut tallies: Vec<CategoryTally> = Vec::new();
            for (category_id, category_name, entry) in rows {
                let idx = match tallies.iter().position(|t| t.category_id == category_id) {
                    Some(idx) => idx,
                    None => {
                        tallies.push(CategoryTally {
                            category_id,
                            category_name,
                            count: 0,
                            points: 0,
                            entries: Vec::new(),
                        });
                        tallies.len() - 1
                    }
                };
                let tally = &mut tallies[idx];
                tally.count += 1;
                tally.points += entry.points_awarded;
                tally.entries.push(entry);
            }

            Ok(tallies)
        })
    }

    /// Every sighting of a category, newest first, with reporter and victim.
    pub fn gallery_by_category(&self, category: CategoryId) -> Result<Vec<CategorySighting>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.points_awarded, s.media_ref, s.media_kind, s.created_at,
                        u.chat_id, u.handle, u.first_name,
                        t.chat_id, t.handle, t.first_name
                 FROM sightings s
                 JOIN participants u ON s.reporter_id = u.chat_id
                 LEFT JOIN participants t ON s.target_id = t.chat_id
                 WHERE s.category_id = ?1
                 ORDER BY s.created_at DESC, s.id DESC",
            )?;

            let rows = stmt
                .query_map([category], |row| {
                    Ok(CategorySighting {
                        sighting_id: row.get(0)?,
                        points_awarded: row.get(1)?,
                        media: models::media(row, 2, 3)?,
                        created_at: row.get(4)?,
                        reporter: models::label(row, 5)?,
                        target: models::optional_label(row, 8)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_sighting(conn: &Connection, id: SightingId) -> Result<Option<Sighting>> {
    let row = conn
        .query_row(
            &format!("SELECT {SIGHTING_COLUMNS} FROM sightings WHERE id = ?1"),
            [id],
            models::sighting,
        )
        .optional()?;
    Ok(row)
}
