//! In-memory conversation state: which multi-step flow, if any, each chat is
//! in the middle of, and what has been collected so far.
//!
//! Nothing here is persisted. Entries live until a handler takes them or the
//! process shuts down.

pub mod flow;
pub mod store;

pub use flow::{Flow, FlowKind, Lane, ReviewDecision};
pub use store::StateStore;
