use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable chat identifier of a participant (or of the moderator).
pub type ChatId = i64;
pub type CategoryId = i64;
pub type SightingId = i64;
pub type SuggestionId = i64;

// -- Participants --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub chat_id: ChatId,
    pub handle: Option<String>,
    pub first_name: Option<String>,
    pub registered: bool,
    pub total_points: i64,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    pub fn label(&self) -> ParticipantLabel {
        ParticipantLabel {
            chat_id: self.chat_id,
            handle: self.handle.clone(),
            first_name: self.first_name.clone(),
        }
    }
}

/// Identity fields joined into gallery, leaderboard and suggestion records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantLabel {
    pub chat_id: ChatId,
    pub handle: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub chat_id: ChatId,
    /// 1-based; tied totals share a rank.
    pub rank: u32,
    pub total_points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub participant: ParticipantLabel,
    pub total_points: i64,
}

// -- Categories --

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub points: i64,
}

impl Category {
    /// Negative categories are weapons: their sightings debit a victim
    /// instead of crediting the finder. A zero-point category is an ordinary
    /// find worth nothing.
    pub fn is_weapon(&self) -> bool {
        self.points < 0
    }
}

/// A (name, points) pair waiting to be upserted as a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub points: i64,
}

impl CategorySeed {
    pub fn new(name: impl Into<String>, points: i64) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

// -- Sightings --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "photo" => Some(Self::Photo),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

/// Opaque transport token for an attached photo or video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub file_ref: String,
    pub kind: MediaKind,
}

impl Media {
    pub fn photo(file_ref: impl Into<String>) -> Self {
        Self {
            file_ref: file_ref.into(),
            kind: MediaKind::Photo,
        }
    }

    pub fn video(file_ref: impl Into<String>) -> Self {
        Self {
            file_ref: file_ref.into(),
            kind: MediaKind::Video,
        }
    }
}

/// Immutable record of one reported find. `points_awarded` is frozen at
/// creation and is the only input to point reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sighting {
    pub id: SightingId,
    pub reporter_id: ChatId,
    pub category_id: CategoryId,
    pub points_awarded: i64,
    pub media: Media,
    pub target_id: Option<ChatId>,
    pub created_at: DateTime<Utc>,
}

// -- Suggestions --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SuggestionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub submitter_id: ChatId,
    pub name: String,
    pub points: i64,
    pub status: SuggestionStatus,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// A suggestion joined with who sent it, as shown to the moderator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedSuggestion {
    pub suggestion: Suggestion,
    pub submitter: ParticipantLabel,
}
