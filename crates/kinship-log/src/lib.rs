//! Event log for the Kinship family archive.
//!
//! The log is the sole source of truth: every fact about people, photos,
//! threads, and families is an immutable event appended here, and every
//! current value is derived by querying it. This crate provides the append
//! contract and the predicate query engine on top of two stores.
//!
//! # Architecture
//!
//! ```text
//! Projections / Clone resolver
//!     |
//!     +-- latest_matching / all_matching / append --> EventLog
//!         |-- MemoryEventLog   (tests, local runs)
//!         +-- EventStore       (PostgreSQL `events` table, JSONB containment)
//! ```
//!
//! # Modules
//!
//! - [`event_log`] -- The [`EventLog`] handle (enum dispatch over stores)
//! - [`predicate`] -- Typed payload equality predicates
//! - [`memory`] -- In-memory store
//! - [`event_store`] -- `PostgreSQL` store
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`error`] -- Shared error types

pub mod error;
pub mod event_log;
pub mod event_store;
pub mod memory;
pub mod postgres;
pub mod predicate;

// Re-export primary types for convenience.
pub use error::LogError;
pub use event_log::EventLog;
pub use event_store::{EventRow, EventStore};
pub use memory::MemoryEventLog;
pub use postgres::{PostgresConfig, PostgresPool};
pub use predicate::{JsonPath, Literal, Predicate};
