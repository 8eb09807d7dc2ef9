//! `PostgreSQL` event store.
//!
//! Events live in a single insert-only `events` table. Predicate queries are
//! answered with one JSONB containment test (`payload @> $2`) backed by a
//! GIN index; the containment document is built by
//! [`Predicate::to_containment`] and bound as a parameter, as are the event
//! tags. Ordering is `(occurred_at, seq)`, so ties on the timestamp go to the
//! most recently appended row.
//!
//! Every call is bounded by the pool's query timeout.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kinship_types::{Event, EventId, EventType, NewEvent};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::LogError;
use crate::postgres::PostgresPool;
use crate::predicate::Predicate;

/// Name of the unique constraint on `events.unique_key`.
const UNIQUE_KEY_CONSTRAINT: &str = "events_unique_key";

/// Columns selected for every event read.
const EVENT_COLUMNS: &str = "seq, id, event_type, payload, occurred_at, unique_key";

/// Operations on the `events` table.
#[derive(Clone)]
pub struct EventStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl EventStore {
    /// Create a new event store bound to a connection pool.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool().clone(),
            query_timeout: pool.query_timeout(),
        }
    }

    /// Run `fut` under the query deadline.
    ///
    /// The outer result reports the deadline; the inner one is the query's
    /// own outcome, kept raw so callers can inspect constraint violations.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<Result<T, sqlx::Error>, LogError> {
        tokio::time::timeout(self.query_timeout, fut)
            .await
            .map_err(|_elapsed| {
                tracing::warn!(
                    operation,
                    timeout_ms = self.query_timeout.as_millis(),
                    "Event log query timed out"
                );
                LogError::timed_out(operation, self.query_timeout)
            })
    }

    /// Insert one event and return it with its assigned position.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Conflict`] if `unique_key` is already taken.
    /// Returns [`LogError::Unavailable`] on transport failure or timeout.
    pub async fn append(&self, event: NewEvent) -> Result<Event, LogError> {
        let result = self
            .bounded(
                "append",
                sqlx::query_as::<_, (i64, DateTime<Utc>)>(
                    r"INSERT INTO events (id, event_type, payload, occurred_at, unique_key)
                      VALUES ($1, $2, $3, $4, $5)
                      RETURNING seq, occurred_at",
                )
                .bind(event.id.into_inner())
                .bind(event.event_type.as_str())
                .bind(&event.payload)
                .bind(event.occurred_at)
                .bind(event.unique_key.as_deref())
                .fetch_one(&self.pool),
            )
            .await?;

        let (seq, occurred_at) = match result {
            Ok(row) => row,
            Err(sqlx::Error::Database(db))
                if db.is_unique_violation() && db.constraint() == Some(UNIQUE_KEY_CONSTRAINT) =>
            {
                return Err(LogError::Conflict {
                    key: event.unique_key.unwrap_or_default(),
                });
            }
            Err(e) => return Err(LogError::from_sqlx("append", e)),
        };

        tracing::debug!(seq, event_type = %event.event_type, "Appended event");

        Ok(Event {
            seq,
            id: event.id,
            event_type: event.event_type,
            payload: event.payload,
            occurred_at,
            unique_key: event.unique_key,
        })
    }

    /// The matching event with the greatest `(occurred_at, seq)`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Unavailable`] on transport failure or timeout.
    pub async fn latest_matching(
        &self,
        types: &[EventType],
        predicate: &Predicate,
    ) -> Result<Option<Event>, LogError> {
        let Some(containment) = predicate.to_containment() else {
            return Ok(None);
        };
        if types.is_empty() {
            return Ok(None);
        }

        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events
             WHERE event_type = ANY($1::TEXT[]) AND payload @> $2::JSONB
             ORDER BY occurred_at DESC, seq DESC
             LIMIT 1"
        );
        let row = self
            .bounded(
                "latest_matching",
                sqlx::query_as::<_, EventRow>(&sql)
                    .bind(type_names(types))
                    .bind(&containment)
                    .fetch_optional(&self.pool),
            )
            .await?
            .map_err(|e| LogError::from_sqlx("latest_matching", e))?;

        row.map(Event::try_from).transpose()
    }

    /// Every matching event, ascending by `(occurred_at, seq)`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Unavailable`] on transport failure or timeout.
    pub async fn all_matching(
        &self,
        types: &[EventType],
        predicate: &Predicate,
    ) -> Result<Vec<Event>, LogError> {
        let Some(containment) = predicate.to_containment() else {
            return Ok(Vec::new());
        };
        if types.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events
             WHERE event_type = ANY($1::TEXT[]) AND payload @> $2::JSONB
             ORDER BY occurred_at, seq"
        );
        let rows = self
            .bounded(
                "all_matching",
                sqlx::query_as::<_, EventRow>(&sql)
                    .bind(type_names(types))
                    .bind(&containment)
                    .fetch_all(&self.pool),
            )
            .await?
            .map_err(|e| LogError::from_sqlx("all_matching", e))?;

        rows.into_iter().map(Event::try_from).collect()
    }

    /// The event holding `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Unavailable`] on transport failure or timeout.
    pub async fn find_by_unique_key(&self, key: &str) -> Result<Option<Event>, LogError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE unique_key = $1");
        let row = self
            .bounded(
                "find_by_unique_key",
                sqlx::query_as::<_, EventRow>(&sql)
                    .bind(key)
                    .fetch_optional(&self.pool),
            )
            .await?
            .map_err(|e| LogError::from_sqlx("find_by_unique_key", e))?;

        row.map(Event::try_from).transpose()
    }

    /// Number of events in the log.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Unavailable`] on transport failure or timeout.
    pub async fn count(&self) -> Result<u64, LogError> {
        let (count,): (i64,) = self
            .bounded(
                "count",
                sqlx::query_as("SELECT COUNT(*) FROM events").fetch_one(&self.pool),
            )
            .await?
            .map_err(|e| LogError::from_sqlx("count", e))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

/// Tags as the `TEXT[]` bound to `$1`.
fn type_names(types: &[EventType]) -> Vec<String> {
    types.iter().map(|t| t.as_str().to_owned()).collect()
}

/// A row from the `events` table.
///
/// Uses runtime types rather than compile-time checked types to
/// avoid requiring a live database during builds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Log position.
    pub seq: i64,
    /// Event identifier.
    pub id: Uuid,
    /// Event tag.
    pub event_type: String,
    /// Type-specific payload.
    pub payload: serde_json::Value,
    /// When the fact happened.
    pub occurred_at: DateTime<Utc>,
    /// Uniqueness key, if any.
    pub unique_key: Option<String>,
}

impl TryFrom<EventRow> for Event {
    type Error = LogError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            seq: row.seq,
            id: EventId::from(row.id),
            event_type: row.event_type.parse()?,
            payload: row.payload,
            occurred_at: row.occurred_at,
            unique_key: row.unique_key,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(event_type: &str) -> EventRow {
        EventRow {
            seq: 3,
            id: Uuid::now_v7(),
            event_type: event_type.to_owned(),
            payload: serde_json::json!({ "threadId": "t" }),
            occurred_at: Utc::now(),
            unique_key: None,
        }
    }

    #[test]
    fn row_converts_known_tag() {
        let event = Event::try_from(row("ThreadStarted")).unwrap();
        assert_eq!(event.event_type, EventType::ThreadStarted);
        assert_eq!(event.seq, 3);
    }

    #[test]
    fn row_with_unknown_tag_is_corrupt() {
        let err = Event::try_from(row("ThreadArchived")).unwrap_err();
        assert!(matches!(err, LogError::UnknownEventType(_)));
    }

    #[test]
    fn type_names_use_stored_tags() {
        assert_eq!(
            type_names(&[EventType::PersonAdded, EventType::PersonClonedForSharing]),
            vec!["PersonAdded".to_owned(), "PersonClonedForSharing".to_owned()]
        );
    }
}
