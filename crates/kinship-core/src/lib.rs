//! Projections and clone-graph identity resolution for the Kinship family
//! archive.
//!
//! Every answer is derived from the event log at read time:
//!
//! - [`projection`] -- family membership and current field values
//! - [`resolver`] -- originals, clone sets, and on-demand clone creation
//! - [`clone_graph`] -- arena tree built during clone traversal
//! - [`visibility`] -- search index contract notified of new clones
//! - [`faces`] -- profile picture lookup used when cloning people
//! - [`config`] -- YAML configuration with environment overrides
//! - [`error`] -- Resolution errors

pub mod clone_graph;
pub mod config;
pub mod error;
pub mod faces;
pub mod projection;
pub mod resolver;
pub mod visibility;

pub use clone_graph::{CloneGraph, CloneNode, CloneSet};
pub use config::{
    ConfigError, KinshipConfig, LogFormat, LoggingConfig, ResolverConfig, StorageBackend,
    StorageConfig,
};
pub use error::ResolveError;
pub use faces::{LogProfilePictureLookup, ProfilePictureLookup};
pub use projection::Projector;
pub use resolver::{CloneResolver, DEFAULT_MAX_CLONE_DEPTH, clone_key};
pub use visibility::{
    InMemoryVisibilityIndex, NoopVisibilityIndex, Registration, SearchableAttributes,
    VisibilityError, VisibilityIndex,
};
