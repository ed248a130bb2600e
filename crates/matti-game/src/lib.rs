//! Transport-agnostic handler layer.
//!
//! [`Game`] composes the ledger and the conversation store: it decides what
//! an inbound input is for by consulting pending flows, then persists the
//! effect. Results are structured [`Outcome`]s; turning them into chat
//! messages belongs to the transport.

mod game;
mod moderator;
mod outcome;
mod player;
mod suggestions;
pub mod upload;

pub use game::{Game, GameConfig};
pub use outcome::Outcome;
