use serde::Serialize;

use matti_state::ReviewDecision;
use matti_types::{
    Category, CategoryId, CategorySighting, CategoryTally, ChatId, LeaderboardEntry,
    ParticipantLabel, SightingId, Standing, SubmittedSuggestion, Suggestion, SuggestionId,
};

/// Result of one inbound interaction, for the transport to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Outcome {
    /// No pending flow wanted this input.
    Ignored,
    /// Moderator-only action from another chat.
    Forbidden,
    /// Action requires a registered participant.
    NotRegistered,
    /// The pending flow this input answers is gone (already consumed).
    Expired,

    // -- Registration --
    AlreadyRegistered,
    AwaitingSecret,
    Registered { standing: Option<Standing> },
    WrongSecret,
    Unregistered,

    // -- Reporting --
    ChooseCategory { categories: Vec<Category>, standing: Option<Standing> },
    NoCategories,
    UnknownCategory { category: CategoryId },
    AwaitingMedia { category: Category },
    SightingRecorded {
        sighting: SightingId,
        category: Category,
        standing: Option<Standing>,
        /// Registered chats to broadcast the find to.
        recipients: Vec<ChatId>,
    },
    ChooseTarget { category: Category, candidates: Vec<ParticipantLabel> },
    NoTargets { category: Category },
    WeaponUsed {
        sighting: SightingId,
        category: Category,
        wielder: ChatId,
        target: ParticipantLabel,
        damage: i64,
        recipients: Vec<ChatId>,
    },
    UnknownParticipant { participant: ChatId },

    // -- Standings and galleries --
    Standing { standing: Standing },
    Leaderboard { entries: Vec<LeaderboardEntry> },
    AwaitingGalleryMode,
    ParticipantGallery { participant: ChatId, tallies: Vec<CategoryTally> },
    CategoryGallery { category: Category, sightings: Vec<CategorySighting> },

    // -- Suggestions --
    AwaitingSuggestionName,
    AwaitingSuggestionPoints { name: String },
    InvalidSuggestionName,
    InvalidSuggestionPoints { name: String },
    SuggestionSubmitted {
        suggestion: SuggestionId,
        name: String,
        points: i64,
        /// Moderator chat to notify.
        notify: ChatId,
    },
    AwaitingSuggestionFile,
    SuggestionsSubmitted { suggestions: Vec<SuggestionId>, notify: ChatId },
    NothingParsed,
    MySuggestions { suggestions: Vec<Suggestion> },

    // -- Moderation --
    PendingSuggestions { suggestions: Vec<SubmittedSuggestion> },
    AwaitingReviewNotes { suggestion: SuggestionId, decision: ReviewDecision },
    SuggestionReviewed { suggestion: SubmittedSuggestion, decision: ReviewDecision },
    SuggestionNotPending { suggestion: SuggestionId },
    AwaitingPoints { participant: ChatId },
    InvalidPoints { participant: ChatId },
    PointsSet { participant: ChatId, total_points: i64 },
    ManagingParticipant { participant: ChatId, tallies: Vec<CategoryTally> },
    SightingDeleted { sighting: SightingId, remaining: Option<Vec<CategoryTally>> },
    UnknownSighting { sighting: SightingId },
    CategoryAdded { category: Category },
    InvalidCategoryName,
    CategoryRemoved { category: CategoryId },
    AwaitingUpload,
    CategoriesLoaded { count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(Outcome::PointsSet { participant: 7, total_points: -3 }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "PointsSet", "data": { "participant": 7, "total_points": -3 } })
        );
        let json = serde_json::to_value(Outcome::Forbidden).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "Forbidden" }));
    }

    #[test]
    fn review_decision_is_snake_case() {
        let json = serde_json::to_value(Outcome::AwaitingReviewNotes {
            suggestion: 2,
            decision: ReviewDecision::Reject,
        })
        .unwrap();
        assert_eq!(json["data"]["decision"], "reject");
    }
}
