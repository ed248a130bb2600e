use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CategoryId, Media, ParticipantLabel, SightingId};

/// One sighting in a participant's gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantGalleryEntry {
    pub sighting_id: SightingId,
    pub points_awarded: i64,
    pub media: Media,
    /// Victim of a weapon use. `None` for ordinary finds, or when the victim
    /// row no longer exists.
    pub target: Option<ParticipantLabel>,
    pub created_at: DateTime<Utc>,
}

/// A participant's sightings of a single category, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub category_id: CategoryId,
    pub category_name: String,
    pub count: usize,
    /// Sum of `points_awarded` over `entries`.
    pub points: i64,
    pub entries: Vec<ParticipantGalleryEntry>,
}

/// One sighting in a category's gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySighting {
    pub sighting_id: SightingId,
    pub points_awarded: i64,
    pub media: Media,
    pub reporter: ParticipantLabel,
    pub target: Option<ParticipantLabel>,
    pub created_at: DateTime<Utc>,
}
