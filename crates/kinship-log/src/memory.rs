//! In-memory event log.
//!
//! Keeps every event in append order behind a [`RwLock`]. Readers never
//! block each other; an append takes the write lock only for the duration of
//! the unique-key check and the push, so the check and the insert are one
//! atomic step.
//!
//! Used by tests and local runs; it has the same query semantics as the
//! `PostgreSQL` store.

use std::collections::HashMap;

use kinship_types::{Event, EventType, NewEvent};
use tokio::sync::RwLock;

use crate::error::LogError;
use crate::predicate::Predicate;

/// Append-only event log held in process memory.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    events: Vec<Event>,
    /// Unique key -> index into `events`.
    unique_keys: HashMap<String, usize>,
}

impl MemoryEventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and assign its log position.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Conflict`] if the event carries a unique key that
    /// is already taken. Nothing is written in that case.
    pub async fn append(&self, event: NewEvent) -> Result<Event, LogError> {
        let mut state = self.state.write().await;

        if let Some(key) = &event.unique_key
            && state.unique_keys.contains_key(key)
        {
            return Err(LogError::Conflict { key: key.clone() });
        }

        let index = state.events.len();
        let seq = i64::try_from(index)
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| LogError::Unavailable {
                operation: "append",
                message: "log position overflow".to_owned(),
            })?;

        let stored = Event {
            seq,
            id: event.id,
            event_type: event.event_type,
            payload: event.payload,
            occurred_at: event.occurred_at,
            unique_key: event.unique_key,
        };

        if let Some(key) = &stored.unique_key {
            state.unique_keys.insert(key.clone(), index);
        }
        state.events.push(stored.clone());

        tracing::debug!(seq, event_type = %stored.event_type, "Appended event (memory)");
        Ok(stored)
    }

    /// The matching event with the greatest `(occurred_at, seq)`.
    pub async fn latest_matching(
        &self,
        types: &[EventType],
        predicate: &Predicate,
    ) -> Result<Option<Event>, LogError> {
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .filter(|e| types.contains(&e.event_type) && predicate.matches(&e.payload))
            .max_by_key(|e| (e.occurred_at, e.seq))
            .cloned())
    }

    /// Every matching event, ascending by `(occurred_at, seq)`.
    pub async fn all_matching(
        &self,
        types: &[EventType],
        predicate: &Predicate,
    ) -> Result<Vec<Event>, LogError> {
        let state = self.state.read().await;
        let mut matching: Vec<Event> = state
            .events
            .iter()
            .filter(|e| types.contains(&e.event_type) && predicate.matches(&e.payload))
            .cloned()
            .collect();
        matching.sort_by_key(|e| (e.occurred_at, e.seq));
        Ok(matching)
    }

    /// The event holding `key`, if any.
    pub async fn find_by_unique_key(&self, key: &str) -> Result<Option<Event>, LogError> {
        let state = self.state.read().await;
        Ok(state
            .unique_keys
            .get(key)
            .and_then(|&index| state.events.get(index))
            .cloned())
    }

    /// Number of events in the log.
    pub async fn len(&self) -> Result<u64, LogError> {
        let state = self.state.read().await;
        Ok(u64::try_from(state.events.len()).unwrap_or(u64::MAX))
    }
}
