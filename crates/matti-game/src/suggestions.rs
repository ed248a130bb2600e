use std::ops::RangeInclusive;

use tracing::{info, warn};

use matti_db::Result;
use matti_state::{Flow, FlowKind, ReviewDecision};
use matti_types::{ChatId, SuggestionId};

use crate::game::Game;
use crate::outcome::Outcome;
use crate::upload::parse_category_lines;

const MAX_NAME_CHARS: usize = 100;
const POINTS_RANGE: RangeInclusive<i64> = -100..=100;

/// Notes reply meaning "no notes".
const NO_NOTES: &str = ".";

fn valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().count() <= MAX_NAME_CHARS
}

impl Game {
    pub fn begin_suggestion(&self, chat: ChatId) -> Result<Outcome> {
        if !self.is_registered(chat)? {
            return Ok(Outcome::NotRegistered);
        }
        self.states.set(chat, Flow::SuggestionName);
        Ok(Outcome::AwaitingSuggestionName)
    }

    pub(crate) fn submit_suggestion_name(&self, chat: ChatId, text: &str) -> Result<Outcome> {
        let Some(flow) = self.states.take(FlowKind::SuggestionName, chat) else {
            return Ok(Outcome::Expired);
        };
        let name = text.trim();
        if !valid_name(name) {
            self.states.set(chat, flow);
            return Ok(Outcome::InvalidSuggestionName);
        }
        self.states.set(chat, Flow::SuggestionPoints { name: name.to_string() });
        Ok(Outcome::AwaitingSuggestionPoints { name: name.to_string() })
    }

    pub(crate) fn submit_suggestion_points(&self, chat: ChatId, text: &str) -> Result<Outcome> {
        let Some(flow) = self.states.take(FlowKind::SuggestionPoints, chat) else {
            return Ok(Outcome::Expired);
        };
        let Flow::SuggestionPoints { name } = &flow else {
            return Ok(Outcome::Expired);
        };
        let name = name.clone();

        let points = match text.trim().parse::<i64>() {
            Ok(points) if POINTS_RANGE.contains(&points) => points,
            _ => {
                self.states.set(chat, flow);
                return Ok(Outcome::InvalidSuggestionPoints { name });
            }
        };

        let suggestion = self.rearm_on_err(chat, &flow, self.ledger.add_suggestion(chat, &name, points))?;
        info!("{} suggested '{}' ({}) as #{}", chat, name, points, suggestion);
        Ok(Outcome::SuggestionSubmitted {
            suggestion,
            name,
            points,
            notify: self.config.moderator_id,
        })
    }

    pub fn begin_suggestion_upload(&self, chat: ChatId) -> Result<Outcome> {
        if !self.is_registered(chat)? {
            return Ok(Outcome::NotRegistered);
        }
        self.states.set(chat, Flow::SuggestionUpload);
        Ok(Outcome::AwaitingSuggestionFile)
    }

    /// Every well-formed line of the file becomes its own pending suggestion.
    pub(crate) fn submit_suggestion_file(&self, chat: ChatId, content: &str) -> Result<Outcome> {
        let Some(flow) = self.states.take(FlowKind::SuggestionUpload, chat) else {
            return Ok(Outcome::Expired);
        };

        let seeds: Vec<_> = parse_category_lines(content)
            .into_iter()
            .filter(|seed| {
                let ok = valid_name(&seed.name) && POINTS_RANGE.contains(&seed.points);
                if !ok {
                    warn!("Suggestion line out of bounds skipped: {}", seed.name);
                }
                ok
            })
            .collect();
        if seeds.is_empty() {
            return Ok(Outcome::NothingParsed);
        }

        let suggestions = self.rearm_on_err(chat, &flow, self.ledger.add_suggestions(chat, &seeds))?;
        info!("{} uploaded {} suggestions", chat, suggestions.len());
        Ok(Outcome::SuggestionsSubmitted {
            suggestions,
            notify: self.config.moderator_id,
        })
    }

    pub fn my_suggestions(&self, chat: ChatId) -> Result<Outcome> {
        Ok(Outcome::MySuggestions {
            suggestions: self.ledger.suggestions_by(chat)?,
        })
    }

    // -- Review --

    pub fn pending_suggestions(&self, chat: ChatId) -> Result<Outcome> {
        if !self.is_moderator(chat) {
            return Ok(Outcome::Forbidden);
        }
        Ok(Outcome::PendingSuggestions {
            suggestions: self.ledger.pending_suggestions()?,
        })
    }

    /// Ask the moderator for notes before applying `decision`.
    pub fn begin_review(&self, chat: ChatId, suggestion: SuggestionId, decision: ReviewDecision) -> Result<Outcome> {
        if !self.is_moderator(chat) {
            return Ok(Outcome::Forbidden);
        }
        let pending = self
            .ledger
            .suggestion(suggestion)?
            .is_some_and(|s| !s.suggestion.status.is_terminal());
        if !pending {
            return Ok(Outcome::SuggestionNotPending { suggestion });
        }
        self.states.set(chat, Flow::ReviewNotes { suggestion, decision });
        Ok(Outcome::AwaitingReviewNotes { suggestion, decision })
    }

    pub(crate) fn submit_review_notes(&self, chat: ChatId, text: &str) -> Result<Outcome> {
        let Some(flow) = self.states.take(FlowKind::ReviewNotes, chat) else {
            return Ok(Outcome::Expired);
        };
        let Flow::ReviewNotes { suggestion, decision } = flow else {
            return Ok(Outcome::Expired);
        };
        let notes = match text.trim() {
            NO_NOTES | "" => None,
            notes => Some(notes),
        };
        let applied = self.rearm_on_err(chat, &flow, self.apply_review(suggestion, decision, notes))?;
        self.reviewed(suggestion, decision, applied)
    }

    /// Approve without asking for notes.
    pub fn approve_now(&self, chat: ChatId, suggestion: SuggestionId) -> Result<Outcome> {
        if !self.is_moderator(chat) {
            return Ok(Outcome::Forbidden);
        }
        let applied = self.apply_review(suggestion, ReviewDecision::Approve, None)?;
        self.reviewed(suggestion, ReviewDecision::Approve, applied)
    }

    /// Reject without asking for notes.
    pub fn reject_now(&self, chat: ChatId, suggestion: SuggestionId) -> Result<Outcome> {
        if !self.is_moderator(chat) {
            return Ok(Outcome::Forbidden);
        }
        let applied = self.apply_review(suggestion, ReviewDecision::Reject, None)?;
        self.reviewed(suggestion, ReviewDecision::Reject, applied)
    }

    fn apply_review(&self, suggestion: SuggestionId, decision: ReviewDecision, notes: Option<&str>) -> Result<bool> {
        match decision {
            ReviewDecision::Approve => self.ledger.approve_suggestion(suggestion, notes),
            ReviewDecision::Reject => self.ledger.reject_suggestion(suggestion, notes),
        }
    }

    fn reviewed(&self, suggestion: SuggestionId, decision: ReviewDecision, applied: bool) -> Result<Outcome> {
        if !applied {
            return Ok(Outcome::SuggestionNotPending { suggestion });
        }
        let Some(record) = self.ledger.suggestion(suggestion)? else {
            return Ok(Outcome::SuggestionNotPending { suggestion });
        };
        info!("Suggestion #{} ({}) closed: {:?}", suggestion, record.suggestion.name, decision);
        Ok(Outcome::SuggestionReviewed {
            suggestion: record,
            decision,
        })
    }
}
