//! Error types for the event log.
//!
//! All errors are propagated via [`LogError`] which wraps the underlying
//! [`sqlx`] errors with additional context about which operation failed.
//! Transport failures and timeouts are folded into [`LogError::Unavailable`]
//! so callers can tell retryable errors apart from data errors.

use kinship_types::UnknownEventType;

/// Errors that can occur in the event log.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The store could not be reached or did not answer in time.
    #[error("event log unavailable during {operation}: {message}")]
    Unavailable {
        /// The log operation that failed.
        operation: &'static str,
        /// What went wrong.
        message: String,
    },

    /// An event with the same unique key is already in the log.
    #[error("unique key already present in the event log: {key}")]
    Conflict {
        /// The conflicting key.
        key: String,
    },

    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row carries a tag that is not in the event catalogue.
    #[error("corrupt event row: {0}")]
    UnknownEventType(#[from] UnknownEventType),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LogError {
    /// Whether the caller may retry the operation unchanged.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Classify a [`sqlx::Error`] raised by `operation`.
    ///
    /// Connection-level failures become [`LogError::Unavailable`]; everything
    /// else is kept as [`LogError::Postgres`].
    pub fn from_sqlx(operation: &'static str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Unavailable {
                operation,
                message: err.to_string(),
            },
            other => Self::Postgres(other),
        }
    }

    /// Build the error for a store call that exceeded its deadline.
    pub fn timed_out(operation: &'static str, timeout: std::time::Duration) -> Self {
        Self::Unavailable {
            operation,
            message: format!("timed out after {}ms", timeout.as_millis()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn pool_timeout_is_retryable() {
        let err = LogError::from_sqlx("latest_matching", sqlx::Error::PoolTimedOut);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("latest_matching"));
    }

    #[test]
    fn row_not_found_is_not_retryable() {
        let err = LogError::from_sqlx("append", sqlx::Error::RowNotFound);
        assert!(!err.is_retryable());
    }

    #[test]
    fn timeout_message_names_deadline() {
        let err = LogError::timed_out("all_matching", Duration::from_millis(250));
        assert_eq!(
            err.to_string(),
            "event log unavailable during all_matching: timed out after 250ms"
        );
    }
}
