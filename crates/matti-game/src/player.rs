use tracing::{info, warn};

use matti_db::{LedgerError, Result};
use matti_state::{Flow, FlowKind};
use matti_types::{CategoryId, ChatId, Media};

use crate::game::Game;
use crate::outcome::Outcome;

impl Game {
    // -- Registration --

    /// First contact (or a repeat `/start`). Records identity once, then asks
    /// for the secret unless the chat is already registered.
    pub fn start(&self, chat: ChatId, handle: Option<&str>, first_name: Option<&str>) -> Result<Outcome> {
        self.ledger.register_participant(chat, handle, first_name)?;
        if self.is_registered(chat)? {
            return Ok(Outcome::AlreadyRegistered);
        }
        self.states.set(chat, Flow::Password);
        Ok(Outcome::AwaitingSecret)
    }

    pub(crate) fn submit_secret(&self, chat: ChatId, text: &str) -> Result<Outcome> {
        let Some(flow) = self.states.take(FlowKind::Password, chat) else {
            return Ok(Outcome::Expired);
        };

        if text.trim() != self.config.registration_secret {
            // Wrong secret keeps the chat waiting for another try
            self.states.set(chat, flow);
            return Ok(Outcome::WrongSecret);
        }

        self.rearm_on_err(chat, &flow, self.ledger.set_registered(chat, true))?;
        info!("Participant {} registered", chat);
        Ok(Outcome::Registered {
            standing: self.ledger.rank_and_points(chat)?,
        })
    }

    pub fn unregister(&self, chat: ChatId) -> Result<Outcome> {
        self.ledger.unregister(chat)?;
        Ok(Outcome::Unregistered)
    }

    pub fn standing(&self, chat: ChatId) -> Result<Outcome> {
        Ok(match self.ledger.rank_and_points(chat)? {
            Some(standing) => Outcome::Standing { standing },
            None => Outcome::NotRegistered,
        })
    }

    pub fn leaderboard(&self, limit: Option<u32>) -> Result<Outcome> {
        Ok(Outcome::Leaderboard {
            entries: self.ledger.leaderboard(limit)?,
        })
    }

    // -- Reporting --

    pub fn begin_report(&self, chat: ChatId) -> Result<Outcome> {
        let Some(standing) = self.ledger.rank_and_points(chat)? else {
            return Ok(Outcome::NotRegistered);
        };
        let categories = self.ledger.categories()?;
        if categories.is_empty() {
            return Ok(Outcome::NoCategories);
        }
        Ok(Outcome::ChooseCategory {
            categories,
            standing: Some(standing),
        })
    }

    pub fn choose_category(&self, chat: ChatId, category: CategoryId) -> Result<Outcome> {
        if !self.is_registered(chat)? {
            return Ok(Outcome::NotRegistered);
        }
        let Some(category) = self.ledger.category(category)? else {
            return Ok(Outcome::UnknownCategory { category });
        };
        self.states.set(chat, Flow::ReportMedia { category: category.clone() });
        Ok(Outcome::AwaitingMedia { category })
    }

    /// A photo or video arrived. Only meaningful while a category is pending:
    /// a find is recorded at once, a weapon waits for its victim.
    pub fn submit_media(&self, chat: ChatId, media: Media) -> Result<Outcome> {
        let Some(flow) = self.states.take(FlowKind::ReportMedia, chat) else {
            return Ok(Outcome::Ignored);
        };
        let Flow::ReportMedia { category } = &flow else {
            return Ok(Outcome::Ignored);
        };

        if category.is_weapon() {
            let registered = self.rearm_on_err(chat, &flow, self.ledger.registered_participants())?;
            let candidates: Vec<_> = registered.into_iter().filter(|p| p.chat_id != chat).collect();
            if candidates.is_empty() {
                return Ok(Outcome::NoTargets { category: category.clone() });
            }
            self.states.set(
                chat,
                Flow::WeaponTarget {
                    category: category.clone(),
                    media,
                },
            );
            return Ok(Outcome::ChooseTarget {
                category: category.clone(),
                candidates,
            });
        }

        let recorded = self.ledger.record_sighting(chat, category.id, category.points, &media, None);
        let sighting = match self.rearm_on_err(chat, &flow, recorded) {
            Ok(id) => id,
            Err(LedgerError::NotFound(what)) => {
                warn!("Sighting from {} dropped: {} vanished", chat, what);
                return Ok(Outcome::UnknownCategory { category: category.id });
            }
            Err(e) => return Err(e),
        };

        info!("{} found '{}' (+{})", chat, category.name, category.points);
        Ok(Outcome::SightingRecorded {
            sighting,
            standing: self.ledger.rank_and_points(chat)?,
            recipients: self.ledger.registered_ids()?,
            category: category.clone(),
        })
    }

    pub fn choose_weapon_target(&self, chat: ChatId, target: ChatId) -> Result<Outcome> {
        let Some(flow) = self.states.take(FlowKind::WeaponTarget, chat) else {
            return Ok(Outcome::Expired);
        };
        let Flow::WeaponTarget { category, media } = &flow else {
            return Ok(Outcome::Expired);
        };

        let victim = self
            .rearm_on_err(chat, &flow, self.ledger.participant(target))?
            .filter(|p| p.registered && p.chat_id != chat);
        let Some(victim) = victim else {
            // Let the wielder pick someone else
            self.states.set(chat, flow);
            return Ok(Outcome::UnknownParticipant { participant: target });
        };

        let recorded = self
            .ledger
            .record_sighting(chat, category.id, category.points, media, Some(target));
        let sighting = match self.rearm_on_err(chat, &flow, recorded) {
            Ok(id) => id,
            Err(LedgerError::NotFound(what)) => {
                warn!("Weapon use by {} dropped: {} vanished", chat, what);
                return Ok(Outcome::UnknownCategory { category: category.id });
            }
            Err(e) => return Err(e),
        };

        info!("{} used '{}' against {}", chat, category.name, target);
        Ok(Outcome::WeaponUsed {
            sighting,
            category: category.clone(),
            wielder: chat,
            target: victim.label(),
            damage: category.points.abs(),
            recipients: self.ledger.registered_ids()?,
        })
    }

    // -- Galleries --

    pub fn select_gallery_participant(&self, chat: ChatId, participant: ChatId) -> Result<Outcome> {
        if self.ledger.participant(participant)?.is_none() {
            return Ok(Outcome::UnknownParticipant { participant });
        }
        self.states.set(chat, Flow::GalleryParticipant { participant });
        Ok(Outcome::AwaitingGalleryMode)
    }

    pub fn select_gallery_category(&self, chat: ChatId, category: CategoryId) -> Result<Outcome> {
        if self.ledger.category(category)?.is_none() {
            return Ok(Outcome::UnknownCategory { category });
        }
        self.states.set(chat, Flow::GalleryCategory { category });
        Ok(Outcome::AwaitingGalleryMode)
    }

    pub fn show_participant_gallery(&self, chat: ChatId) -> Result<Outcome> {
        let Some(flow) = self.states.take(FlowKind::GalleryParticipant, chat) else {
            return Ok(Outcome::Expired);
        };
        let Flow::GalleryParticipant { participant } = flow else {
            return Ok(Outcome::Expired);
        };
        Ok(Outcome::ParticipantGallery {
            participant,
            tallies: self.rearm_on_err(chat, &flow, self.ledger.gallery_by_participant(participant))?,
        })
    }

    pub fn show_category_gallery(&self, chat: ChatId) -> Result<Outcome> {
        let Some(flow) = self.states.take(FlowKind::GalleryCategory, chat) else {
            return Ok(Outcome::Expired);
        };
        let Flow::GalleryCategory { category } = flow else {
            return Ok(Outcome::Expired);
        };
        let Some(record) = self.rearm_on_err(chat, &flow, self.ledger.category(category))? else {
            return Ok(Outcome::UnknownCategory { category });
        };
        Ok(Outcome::CategoryGallery {
            sightings: self.rearm_on_err(chat, &flow, self.ledger.gallery_by_category(category))?,
            category: record,
        })
    }
}
