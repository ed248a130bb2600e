//! Ledger operations organized by table.

pub mod categories;
pub mod participants;
pub mod sightings;
pub mod suggestions;
