//! Point arithmetic for sightings.
//!
//! A sighting's effect on `total_points` depends only on its reporter, its
//! frozen `points_awarded` and its target:
//!
//! - `points > 0`: the reporter is credited `points`. A target, if any, is
//!   left alone.
//! - `points <= 0` (weapon): the reporter is untouched and the target, if
//!   any, is debited `|points|`.
//!
//! Deleting a sighting applies the same effects negated.

use rusqlite::{Connection, OptionalExtension, params};

use matti_types::ChatId;

use crate::{LedgerError, Result};

/// A signed adjustment to one participant's `total_points`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointDelta {
    pub chat_id: ChatId,
    pub delta: i64,
}

/// Adjustments applied when a sighting with these fields is recorded.
pub fn sighting_effects(reporter: ChatId, points: i64, target: Option<ChatId>) -> Vec<PointDelta> {
    let mut effects = Vec::with_capacity(1);
    if points > 0 {
        effects.push(PointDelta { chat_id: reporter, delta: points });
    } else if let Some(target) = target {
        // points <= 0, so -|points| == points
        effects.push(PointDelta { chat_id: target, delta: points });
    }
    effects
}

/// Adjustments that undo [`sighting_effects`] for the same fields.
pub fn reversal_effects(reporter: ChatId, points: i64, target: Option<ChatId>) -> Vec<PointDelta> {
    sighting_effects(reporter, points, target)
        .into_iter()
        .map(|d| PointDelta { chat_id: d.chat_id, delta: -d.delta })
        .collect()
}

/// Apply deltas inside the caller's transaction. A total that would leave
/// the `i64` range fails with [`LedgerError::PointsOverflow`], which rolls the
/// caller's transaction back.
pub(crate) fn apply(conn: &Connection, effects: &[PointDelta]) -> Result<()> {
    let mut read = conn.prepare_cached("SELECT total_points FROM participants WHERE chat_id = ?1")?;
    let mut write = conn.prepare_cached("UPDATE participants SET total_points = ?1 WHERE chat_id = ?2")?;
    for effect in effects {
        let current: Option<i64> = read.query_row([effect.chat_id], |row| row.get(0)).optional()?;
        let Some(current) = current else {
            continue;
        };
        let updated = current
            .checked_add(effect.delta)
            .ok_or(LedgerError::PointsOverflow(effect.chat_id))?;
        write.execute(params![updated, effect.chat_id])?;
    }
    Ok(())
}
