use serde::{Deserialize, Serialize};

use matti_types::{Category, CategoryId, ChatId, Media, SuggestionId};

/// Independent slots per chat. A chat holds at most one flow per lane, so
/// the moderator can be mid-way through a player flow and a moderation flow
/// at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    Player,
    Moderator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// What input a chat is expected to send next, with the context collected
/// so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "flow", content = "data")]
pub enum Flow {
    /// Next text is the registration secret.
    Password,
    /// Category chosen; next photo or video is the sighting.
    ReportMedia { category: Category },
    /// Weapon media received; next choice is the victim.
    WeaponTarget { category: Category, media: Media },
    /// Gallery of this participant awaits a display choice.
    GalleryParticipant { participant: ChatId },
    /// Gallery of this category awaits a display choice.
    GalleryCategory { category: CategoryId },
    /// Next text is a suggested category name.
    SuggestionName,
    /// Next text is the point value for the suggested name.
    SuggestionPoints { name: String },
    /// Next document is a "name,points" suggestion list.
    SuggestionUpload,

    /// Next text is a new absolute total for this participant.
    PointEdit { participant: ChatId },
    /// Moderator is reviewing this participant's sightings.
    ManageParticipant { participant: ChatId },
    /// Next text is the note for this review decision.
    ReviewNotes {
        suggestion: SuggestionId,
        decision: ReviewDecision,
    },
    /// Next document is a "name,points" category list.
    BulkUpload,
}

/// Payload-free name of a [`Flow`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Password,
    ReportMedia,
    WeaponTarget,
    GalleryParticipant,
    GalleryCategory,
    SuggestionName,
    SuggestionPoints,
    SuggestionUpload,
    PointEdit,
    ManageParticipant,
    ReviewNotes,
    BulkUpload,
}

impl FlowKind {
    pub fn lane(self) -> Lane {
        match self {
            Self::PointEdit | Self::ManageParticipant | Self::ReviewNotes | Self::BulkUpload => {
                Lane::Moderator
            }
            _ => Lane::Player,
        }
    }
}

impl Flow {
    pub fn kind(&self) -> FlowKind {
        match self {
            Self::Password => FlowKind::Password,
            Self::ReportMedia { .. } => FlowKind::ReportMedia,
            Self::WeaponTarget { .. } => FlowKind::WeaponTarget,
            Self::GalleryParticipant { .. } => FlowKind::GalleryParticipant,
            Self::GalleryCategory { .. } => FlowKind::GalleryCategory,
            Self::SuggestionName => FlowKind::SuggestionName,
            Self::SuggestionPoints { .. } => FlowKind::SuggestionPoints,
            Self::SuggestionUpload => FlowKind::SuggestionUpload,
            Self::PointEdit { .. } => FlowKind::PointEdit,
            Self::ManageParticipant { .. } => FlowKind::ManageParticipant,
            Self::ReviewNotes { .. } => FlowKind::ReviewNotes,
            Self::BulkUpload => FlowKind::BulkUpload,
        }
    }

    pub fn lane(&self) -> Lane {
        self.kind().lane()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderation_flows_use_moderator_lane() {
        let moderation = [
            Flow::PointEdit { participant: 1 },
            Flow::ManageParticipant { participant: 1 },
            Flow::ReviewNotes { suggestion: 1, decision: ReviewDecision::Reject },
            Flow::BulkUpload,
        ];
        for flow in &moderation {
            assert_eq!(flow.lane(), Lane::Moderator, "{:?}", flow.kind());
        }

        let play = [
            Flow::Password,
            Flow::SuggestionName,
            Flow::SuggestionPoints { name: "Troll".into() },
            Flow::SuggestionUpload,
            Flow::GalleryCategory { category: 2 },
            Flow::GalleryParticipant { participant: 2 },
        ];
        for flow in &play {
            assert_eq!(flow.lane(), Lane::Player, "{:?}", flow.kind());
        }
    }
}
