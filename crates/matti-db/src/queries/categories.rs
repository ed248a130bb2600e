use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use matti_types::{Category, CategoryId, CategorySeed};

use crate::models::{self, CATEGORY_COLUMNS};
use crate::points;
use crate::queries::sightings::Footprint;
use crate::{Ledger, Result};

impl Ledger {
    /// Insert or update a category by name; returns its id. The id is stable
    /// across re-adds, and past sightings keep the points they were awarded.
    pub fn add_category(&self, name: &str, points: i64) -> Result<CategoryId> {
        self.with_conn_mut(|conn| {
            let id = upsert_category(conn, name, points)?;
            debug!("Category {} '{}' set to {} points", id, name, points);
            Ok(id)
        })
    }

    /// Upsert a batch of categories in one transaction; returns how many
    /// seeds were applied.
    pub fn load_categories(&self, seeds: &[CategorySeed]) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for seed in seeds {
                upsert_category(&tx, &seed.name, seed.points)?;
            }
            tx.commit()?;
            info!("Loaded {} categories", seeds.len());
            Ok(seeds.len())
        })
    }

    /// Delete a category together with all of its sightings, reversing each
    /// sighting's point effect first. Returns `false` if the id is unknown.
    pub fn remove_category(&self, id: CategoryId) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_category(&tx, id)?.is_none() {
                return Ok(false);
            }

            let footprints = {
                let mut stmt = tx.prepare(
                    "SELECT id, reporter_id, points_awarded, target_id FROM sightings
                     WHERE category_id = ?1",
                )?;
                stmt.query_map([id], Footprint::from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?
            };

            for footprint in &footprints {
                points::apply(&tx, &footprint.reversal())?;
            }
            tx.execute("DELETE FROM sightings WHERE category_id = ?1", [id])?;
            tx.execute("DELETE FROM categories WHERE id = ?1", [id])?;
            tx.commit()?;

            info!(
                "Category {} removed with {} sightings reversed",
                id,
                footprints.len()
            );
            Ok(true)
        })
    }

    /// All categories, highest points first, then by name.
    pub fn categories(&self) -> Result<Vec<Category>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY points DESC, name"
            ))?;
            let rows = stmt
                .query_map([], models::category)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn category(&self, id: CategoryId) -> Result<Option<Category>> {
        self.with_conn(|conn| query_category(conn, id))
    }
}

pub(crate) fn upsert_category(conn: &Connection, name: &str, points: i64) -> Result<CategoryId> {
    let id = conn.query_row(
        "INSERT INTO categories (name, points) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET points = excluded.points
         RETURNING id",
        params![name, points],
        |row| row.get(0),
    )?;
    Ok(id)
}

pub(crate) fn query_category(conn: &Connection, id: CategoryId) -> Result<Option<Category>> {
    let row = conn
        .query_row(
            &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
            [id],
            models::category,
        )
        .optional()?;
    Ok(row)
}
