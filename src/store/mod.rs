use crate::error::StoreError;
use crate::models::Poll;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

const SAMPLE_POLLS: &str = include_str!("../../data/polls.json");

/// Read-only poll lookup used by the poll page.
pub trait PollStore: Send + Sync {
    fn lookup(&self, poll_id: &str) -> Option<Poll>;
}

/// Poll snapshots held in memory, keyed by id.
#[derive(Default)]
pub struct MemoryPollStore {
    polls: RwLock<HashMap<String, Poll>>,
    // Ids in insertion order, for listing.
    order: RwLock<Vec<String>>,
}

impl MemoryPollStore {
    pub fn from_polls(polls: Vec<Poll>) -> Self {
        let store = Self::default();
        for poll in polls {
            store.upsert(poll);
        }
        store
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let polls: Vec<Poll> = serde_json::from_str(json)?;
        Ok(Self::from_polls(polls))
    }

    /// The bundled sample polls.
    pub fn sample() -> Result<Self, StoreError> {
        Self::from_json(SAMPLE_POLLS)
    }

    pub fn upsert(&self, poll: Poll) {
        let mut polls = self.polls.write().unwrap_or_else(PoisonError::into_inner);
        if !polls.contains_key(&poll.id) {
            self.order
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(poll.id.clone());
        }
        polls.insert(poll.id.clone(), poll);
    }

    pub fn all(&self) -> Vec<Poll> {
        let polls = self.polls.read().unwrap_or_else(PoisonError::into_inner);
        self.order
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|id| polls.get(id).cloned())
            .collect()
    }
}

impl PollStore for MemoryPollStore {
    fn lookup(&self, poll_id: &str) -> Option<Poll> {
        self.polls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(poll_id)
            .cloned()
    }
}
