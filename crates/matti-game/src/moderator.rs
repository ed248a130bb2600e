use tracing::{info, warn};

use matti_db::Result;
use matti_state::{Flow, FlowKind};
use matti_types::{CategoryId, ChatId, SightingId};

use crate::game::Game;
use crate::outcome::Outcome;
use crate::upload::parse_category_lines;

impl Game {
    // -- Points --

    pub fn begin_point_edit(&self, chat: ChatId, participant: ChatId) -> Result<Outcome> {
        if !self.is_moderator(chat) {
            return Ok(Outcome::Forbidden);
        }
        if self.ledger.participant(participant)?.is_none() {
            return Ok(Outcome::UnknownParticipant { participant });
        }
        self.states.set(chat, Flow::PointEdit { participant });
        Ok(Outcome::AwaitingPoints { participant })
    }

    /// Overwrite a total. The flow is consumed even when the reply is not a
    /// number; the moderator starts over from the participant menu.
    pub(crate) fn submit_point_edit(&self, chat: ChatId, text: &str) -> Result<Outcome> {
        let Some(flow) = self.states.take(FlowKind::PointEdit, chat) else {
            return Ok(Outcome::Expired);
        };
        let Flow::PointEdit { participant } = flow else {
            return Ok(Outcome::Expired);
        };
        let Ok(total_points) = text.trim().parse::<i64>() else {
            return Ok(Outcome::InvalidPoints { participant });
        };
        let updated = self.ledger.set_points_absolute(participant, total_points);
        if !self.rearm_on_err(chat, &flow, updated)? {
            return Ok(Outcome::UnknownParticipant { participant });
        }
        warn!("Moderator set {} to {} points", participant, total_points);
        Ok(Outcome::PointsSet {
            participant,
            total_points,
        })
    }

    // -- Sightings --

    /// Open a participant's record for deletion. Stays active until the
    /// moderator moves on, so successive deletes refresh the same view.
    pub fn manage_participant(&self, chat: ChatId, participant: ChatId) -> Result<Outcome> {
        if !self.is_moderator(chat) {
            return Ok(Outcome::Forbidden);
        }
        if self.ledger.participant(participant)?.is_none() {
            return Ok(Outcome::UnknownParticipant { participant });
        }
        self.states.set(chat, Flow::ManageParticipant { participant });
        Ok(Outcome::ManagingParticipant {
            participant,
            tallies: self.ledger.gallery_by_participant(participant)?,
        })
    }

    pub fn delete_sighting(&self, chat: ChatId, sighting: SightingId) -> Result<Outcome> {
        if !self.is_moderator(chat) {
            return Ok(Outcome::Forbidden);
        }
        if !self.ledger.delete_sighting(sighting)? {
            return Ok(Outcome::UnknownSighting { sighting });
        }
        info!("Moderator deleted sighting #{}", sighting);

        let remaining = match self.states.get(FlowKind::ManageParticipant, chat) {
            Some(Flow::ManageParticipant { participant }) => {
                Some(self.ledger.gallery_by_participant(participant)?)
            }
            _ => None,
        };
        Ok(Outcome::SightingDeleted { sighting, remaining })
    }

    // -- Categories --

    pub fn add_category(&self, chat: ChatId, name: &str, points: i64) -> Result<Outcome> {
        if !self.is_moderator(chat) {
            return Ok(Outcome::Forbidden);
        }
        let name = name.trim();
        if name.is_empty() {
            return Ok(Outcome::InvalidCategoryName);
        }
        let id = self.ledger.add_category(name, points)?;
        match self.ledger.category(id)? {
            Some(category) => Ok(Outcome::CategoryAdded { category }),
            None => Ok(Outcome::UnknownCategory { category: id }),
        }
    }

    /// Drops the category and every sighting of it, reversing their points.
    pub fn remove_category(&self, chat: ChatId, category: CategoryId) -> Result<Outcome> {
        if !self.is_moderator(chat) {
            return Ok(Outcome::Forbidden);
        }
        if !self.ledger.remove_category(category)? {
            return Ok(Outcome::UnknownCategory { category });
        }
        Ok(Outcome::CategoryRemoved { category })
    }

    pub fn begin_bulk_upload(&self, chat: ChatId) -> Result<Outcome> {
        if !self.is_moderator(chat) {
            return Ok(Outcome::Forbidden);
        }
        self.states.set(chat, Flow::BulkUpload);
        Ok(Outcome::AwaitingUpload)
    }

    pub(crate) fn submit_bulk_upload(&self, chat: ChatId, content: &str) -> Result<Outcome> {
        let Some(flow) = self.states.take(FlowKind::BulkUpload, chat) else {
            return Ok(Outcome::Expired);
        };
        let seeds = parse_category_lines(content);
        if seeds.is_empty() {
            return Ok(Outcome::NothingParsed);
        }
        let count = self.rearm_on_err(chat, &flow, self.ledger.load_categories(&seeds))?;
        info!("Bulk upload loaded {} categories", count);
        Ok(Outcome::CategoriesLoaded { count })
    }
}
