//! Row mappers from SQLite rows to `matti-types` records.
//! Column order of each mapper is fixed by the matching `*_COLUMNS` constant.

use rusqlite::Row;
use rusqlite::types::Type;

use matti_types::{
    Category, Media, MediaKind, Participant, ParticipantLabel, Sighting, Suggestion,
    SuggestionStatus,
};

pub(crate) const PARTICIPANT_COLUMNS: &str =
    "chat_id, handle, first_name, registered, total_points, created_at";

pub(crate) const CATEGORY_COLUMNS: &str = "id, name, points";

pub(crate) const SIGHTING_COLUMNS: &str =
    "id, reporter_id, category_id, points_awarded, media_ref, media_kind, target_id, created_at";

pub(crate) const SUGGESTION_COLUMNS: &str =
    "id, submitter_id, name, points, status, admin_notes, created_at, reviewed_at";

pub(crate) fn participant(row: &Row) -> rusqlite::Result<Participant> {
    Ok(Participant {
        chat_id: row.get(0)?,
        handle: row.get(1)?,
        first_name: row.get(2)?,
        registered: row.get(3)?,
        total_points: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub(crate) fn category(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        points: row.get(2)?,
    })
}

pub(crate) fn sighting(row: &Row) -> rusqlite::Result<Sighting> {
    Ok(Sighting {
        id: row.get(0)?,
        reporter_id: row.get(1)?,
        category_id: row.get(2)?,
        points_awarded: row.get(3)?,
        media: media(row, 4, 5)?,
        target_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub(crate) fn suggestion(row: &Row) -> rusqlite::Result<Suggestion> {
    let status: String = row.get(4)?;
    Ok(Suggestion {
        id: row.get(0)?,
        submitter_id: row.get(1)?,
        name: row.get(2)?,
        points: row.get(3)?,
        status: SuggestionStatus::from_tag(&status)
            .ok_or_else(|| unknown_tag(4, "suggestion status", &status))?,
        admin_notes: row.get(5)?,
        created_at: row.get(6)?,
        reviewed_at: row.get(7)?,
    })
}

pub(crate) fn media(row: &Row, ref_idx: usize, kind_idx: usize) -> rusqlite::Result<Media> {
    let kind: String = row.get(kind_idx)?;
    Ok(Media {
        file_ref: row.get(ref_idx)?,
        kind: MediaKind::from_tag(&kind).ok_or_else(|| unknown_tag(kind_idx, "media kind", &kind))?,
    })
}

/// Label from three consecutive columns: chat_id, handle, first_name.
pub(crate) fn label(row: &Row, start: usize) -> rusqlite::Result<ParticipantLabel> {
    Ok(ParticipantLabel {
        chat_id: row.get(start)?,
        handle: row.get(start + 1)?,
        first_name: row.get(start + 2)?,
    })
}

/// Like [`label`], but `None` when the LEFT JOIN found no participant.
pub(crate) fn optional_label(row: &Row, start: usize) -> rusqlite::Result<Option<ParticipantLabel>> {
    let chat_id: Option<i64> = row.get(start)?;
    match chat_id {
        Some(_) => label(row, start).map(Some),
        None => Ok(None),
    }
}

fn unknown_tag(idx: usize, what: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("unknown {what}: {value}").into(),
    )
}
