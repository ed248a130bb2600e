use std::sync::Arc;

use tracing::{debug, info, warn};

use matti_db::{Ledger, LedgerError, Result};
use matti_state::{Flow, FlowKind, StateStore};
use matti_types::ChatId;

use crate::outcome::Outcome;

#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Chat allowed to run moderation flows.
    pub moderator_id: ChatId,
    /// Shared secret a new participant must send to register.
    pub registration_secret: String,
}

/// Handler context shared by every request. Cheap to clone.
#[derive(Clone)]
pub struct Game {
    pub(crate) ledger: Arc<Ledger>,
    pub(crate) states: StateStore,
    pub(crate) config: Arc<GameConfig>,
}

impl Game {
    pub fn new(ledger: Arc<Ledger>, states: StateStore, config: GameConfig) -> Self {
        Self {
            ledger,
            states,
            config: Arc::new(config),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn states(&self) -> &StateStore {
        &self.states
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub(crate) fn is_moderator(&self, chat: ChatId) -> bool {
        chat == self.config.moderator_id
    }

    pub(crate) fn is_registered(&self, chat: ChatId) -> Result<bool> {
        Ok(self
            .ledger
            .participant(chat)?
            .is_some_and(|p| p.registered))
    }

    /// Pass through the result of a ledger call made after `flow` was taken.
    /// A failed call puts the flow back so the chat can resend the same
    /// input. `NotFound` is passed through as is: the row the flow points at
    /// is gone, so retrying cannot succeed.
    pub(crate) fn rearm_on_err<T>(&self, chat: ChatId, flow: &Flow, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if !matches!(e, LedgerError::NotFound(_)) {
                warn!("Chat {} {:?} kept after ledger error: {}", chat, flow.kind(), e);
                self.states.set(chat, flow.clone());
            }
        }
        result
    }

    /// Route free text to whichever flow is waiting for it. Checked in a
    /// fixed order: secret, point edit, suggestion name, suggestion points,
    /// review notes.
    pub fn handle_text(&self, chat: ChatId, text: &str) -> Result<Outcome> {
        if self.states.has(FlowKind::Password, chat) {
            return self.submit_secret(chat, text);
        }
        if self.states.has(FlowKind::PointEdit, chat) {
            return self.submit_point_edit(chat, text);
        }
        if self.states.has(FlowKind::SuggestionName, chat) {
            return self.submit_suggestion_name(chat, text);
        }
        if self.states.has(FlowKind::SuggestionPoints, chat) {
            return self.submit_suggestion_points(chat, text);
        }
        if self.states.has(FlowKind::ReviewNotes, chat) {
            return self.submit_review_notes(chat, text);
        }
        debug!("Text from {} matched no pending flow", chat);
        Ok(Outcome::Ignored)
    }

    /// Route an uploaded text document: the moderator's category upload
    /// takes precedence over a player's suggestion upload.
    pub fn submit_document(&self, chat: ChatId, content: &str) -> Result<Outcome> {
        if self.is_moderator(chat) && self.states.has(FlowKind::BulkUpload, chat) {
            return self.submit_bulk_upload(chat, content);
        }
        if self.states.has(FlowKind::SuggestionUpload, chat) {
            return self.submit_suggestion_file(chat, content);
        }
        Ok(Outcome::Ignored)
    }

    /// Drop all pending conversations. The ledger is closed by its owner.
    pub fn shutdown(&self) {
        let dropped = self.states.clear_all();
        info!("Game shut down, {} pending flows abandoned", dropped);
    }
}
