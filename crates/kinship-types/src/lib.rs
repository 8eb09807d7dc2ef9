//! Shared type definitions for the Kinship family archive.
//!
//! This crate is the single source of truth for identifiers, the event
//! catalogue, and projection values used across the workspace. Types defined
//! here flow downstream to `TypeScript` via `ts-rs` for the page layer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers and the [`Shareable`] marker
//! - [`enums`] -- Event tags and entity kinds
//! - [`events`] -- Typed payload structs and the [`EventPayload`] union
//! - [`structs`] -- Stored event shape, clone references, projections

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EntityKind, EventRole, EventType, UnknownEventType};
pub use events::{
    CloneLink, EventPayload, FamilyCreated, FamilyRenamed, Membership, PersonAdded,
    PersonClonedForSharing, PersonCreatedFromFace, PersonNameChanged,
    PersonProfilePictureChanged, PersonSource, PhotoCaptionEdited, PhotoClonedForSharing,
    PhotoDateChanged, PhotoSource, PhotoUploaded, PhotoUploadedToThread, ProfilePicture,
    ThreadClonedForSharing, ThreadSource, ThreadStarted, ThreadTitleSet, UserRegistered,
};
pub use ids::{EventId, FaceId, FamilyId, PersonId, PhotoId, Shareable, ThreadId, UserId};
pub use structs::{
    EntityRef, Event, FamilyDetails, NewEvent, PersonProfile, PhotoDetails, ThreadDetails,
};
