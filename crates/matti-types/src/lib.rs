//! Plain records shared by the ledger, the conversation store and the
//! handler layer. Nothing in here formats text for display.

pub mod gallery;
pub mod models;

pub use gallery::{CategorySighting, CategoryTally, ParticipantGalleryEntry};
pub use models::*;
