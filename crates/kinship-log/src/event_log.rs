//! The event log handle passed through every component.
//!
//! [`EventLog`] dispatches to one of the concrete stores. It uses enum
//! dispatch rather than a trait object because async methods are not
//! dyn-compatible; callers hold a plain `&EventLog` (or `Arc<EventLog>`).

use kinship_types::{Event, EventType, NewEvent};

use crate::error::LogError;
use crate::event_store::EventStore;
use crate::memory::MemoryEventLog;
use crate::postgres::PostgresPool;
use crate::predicate::Predicate;

/// An append-only, queryable event log.
pub enum EventLog {
    /// Events held in process memory.
    Memory(MemoryEventLog),
    /// Events held in `PostgreSQL`.
    Postgres(EventStore),
}

impl EventLog {
    /// An empty in-memory log.
    pub fn in_memory() -> Self {
        Self::Memory(MemoryEventLog::new())
    }

    /// A log backed by the `events` table reachable through `pool`.
    pub fn postgres(pool: &PostgresPool) -> Self {
        Self::Postgres(EventStore::new(pool))
    }

    /// Human-readable backend name for logging.
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Append an event. The log assigns its position.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Conflict`] if the event's unique key is taken,
    /// or [`LogError::Unavailable`] if the store cannot be reached.
    pub async fn append(&self, event: NewEvent) -> Result<Event, LogError> {
        match self {
            Self::Memory(log) => log.append(event).await,
            Self::Postgres(store) => store.append(event).await,
        }
    }

    /// The event with the greatest `(occurred_at, seq)` whose tag is in
    /// `types` and whose payload satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Unavailable`] if the store cannot be reached.
    pub async fn latest_matching(
        &self,
        types: &[EventType],
        predicate: &Predicate,
    ) -> Result<Option<Event>, LogError> {
        match self {
            Self::Memory(log) => log.latest_matching(types, predicate).await,
            Self::Postgres(store) => store.latest_matching(types, predicate).await,
        }
    }

    /// Every event whose tag is in `types` and whose payload satisfies
    /// `predicate`, ascending by `(occurred_at, seq)`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Unavailable`] if the store cannot be reached.
    pub async fn all_matching(
        &self,
        types: &[EventType],
        predicate: &Predicate,
    ) -> Result<Vec<Event>, LogError> {
        match self {
            Self::Memory(log) => log.all_matching(types, predicate).await,
            Self::Postgres(store) => store.all_matching(types, predicate).await,
        }
    }

    /// The event holding unique key `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Unavailable`] if the store cannot be reached.
    pub async fn find_by_unique_key(&self, key: &str) -> Result<Option<Event>, LogError> {
        match self {
            Self::Memory(log) => log.find_by_unique_key(key).await,
            Self::Postgres(store) => store.find_by_unique_key(key).await,
        }
    }

    /// Number of events in the log.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Unavailable`] if the store cannot be reached.
    pub async fn len(&self) -> Result<u64, LogError> {
        match self {
            Self::Memory(log) => log.len().await,
            Self::Postgres(store) => store.count().await,
        }
    }
}
