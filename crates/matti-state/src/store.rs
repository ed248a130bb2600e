use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use matti_types::ChatId;

use crate::flow::{Flow, FlowKind, Lane};

/// Process-wide pending-flow store. Cheap to clone; clones share entries.
///
/// Every operation runs under one exclusive lock, so a [`take`] racing
/// another `take`, `get` or `set` on the same chat observes either the
/// whole entry or nothing.
///
/// [`take`]: StateStore::take
#[derive(Clone, Default)]
pub struct StateStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    /// (lane, chat) -> the single active flow in that lane
    entries: Mutex<HashMap<(Lane, ChatId), Flow>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<(Lane, ChatId), Flow>> {
        // Each operation is a single map call, so a panicking holder cannot
        // leave the map half-updated.
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start `flow` for `chat`, replacing whatever flow was active in the
    /// same lane. Returns the superseded flow.
    pub fn set(&self, chat: ChatId, flow: Flow) -> Option<Flow> {
        let kind = flow.kind();
        let previous = self.entries().insert((kind.lane(), chat), flow);
        match &previous {
            Some(old) if old.kind() != kind => {
                debug!("Chat {} flow {:?} superseded by {:?}", chat, old.kind(), kind)
            }
            _ => debug!("Chat {} awaiting {:?}", chat, kind),
        }
        previous
    }

    /// Copy of the pending flow if `chat` is currently in `kind`.
    pub fn get(&self, kind: FlowKind, chat: ChatId) -> Option<Flow> {
        self.entries()
            .get(&(kind.lane(), chat))
            .filter(|flow| flow.kind() == kind)
            .cloned()
    }

    pub fn has(&self, kind: FlowKind, chat: ChatId) -> bool {
        self.entries()
            .get(&(kind.lane(), chat))
            .is_some_and(|flow| flow.kind() == kind)
    }

    /// Remove and return the pending flow if `chat` is in `kind`. A flow of
    /// a different kind is left in place. Exactly one of any number of
    /// concurrent callers receives a given entry.
    pub fn take(&self, kind: FlowKind, chat: ChatId) -> Option<Flow> {
        let mut entries = self.entries();
        let key = (kind.lane(), chat);
        match entries.get(&key) {
            Some(flow) if flow.kind() == kind => entries.remove(&key),
            _ => None,
        }
    }

    /// Kind of the flow active in `lane` for `chat`, if any.
    pub fn active(&self, lane: Lane, chat: ChatId) -> Option<FlowKind> {
        self.entries().get(&(lane, chat)).map(Flow::kind)
    }

    /// Abandon whatever flow `chat` has in `lane`.
    pub fn clear(&self, lane: Lane, chat: ChatId) -> Option<Flow> {
        self.entries().remove(&(lane, chat))
    }

    /// Drop every entry for every chat; returns how many were dropped.
    pub fn clear_all(&self) -> usize {
        let mut entries = self.entries();
        let dropped = entries.len();
        entries.clear();
        info!("Conversation state cleared ({} pending flows dropped)", dropped);
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
