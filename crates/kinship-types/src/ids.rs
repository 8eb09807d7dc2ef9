//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the archive has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. All IDs use UUID v7
//! (time-ordered) so that freshly minted clones sort after their sources.
//!
//! On the wire (event payloads, page props) every ID is a plain string.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::EntityKind;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a person (a node in a family tree).
    PersonId
}

define_id! {
    /// Unique identifier for a photo.
    PhotoId
}

define_id! {
    /// Unique identifier for a discussion thread.
    ThreadId
}

define_id! {
    /// Unique identifier for a family (the sharing scope).
    ///
    /// A user's personal space reuses the user's own ID value, see
    /// [`FamilyId::personal`].
    FamilyId
}

define_id! {
    /// Unique identifier for a registered user account.
    UserId
}

define_id! {
    /// Unique identifier for a detected face inside a photo.
    FaceId
}

define_id! {
    /// Unique identifier for an event in the event log.
    EventId
}

impl FamilyId {
    /// The personal space of `user`, which shares the user's ID value.
    pub const fn personal(user: UserId) -> Self {
        Self(user.0)
    }
}

/// An identifier of an entity that can be cloned across families.
///
/// Implemented by [`PersonId`], [`PhotoId`], and [`ThreadId`]. The associated
/// [`EntityKind`] selects the payload field names and event tags used to
/// query the log for this kind.
pub trait Shareable:
    Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug + core::fmt::Display + From<Uuid> + Into<Uuid> + Send + Sync
{
    /// The entity kind this identifier belongs to.
    const KIND: EntityKind;
}

impl Shareable for PersonId {
    const KIND: EntityKind = EntityKind::Person;
}

impl Shareable for PhotoId {
    const KIND: EntityKind = EntityKind::Photo;
}

impl Shareable for ThreadId {
    const KIND: EntityKind = EntityKind::Thread;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personal_family_shares_user_id() {
        let user = UserId::new();
        assert_eq!(FamilyId::personal(user).into_inner(), user.into_inner());
    }

    #[test]
    fn id_serializes_as_plain_string() {
        let id = PersonId::new();
        let json = serde_json::to_value(id).ok();
        assert_eq!(json, Some(serde_json::Value::String(id.to_string())));
    }

    #[test]
    fn shareable_kinds() {
        assert_eq!(PersonId::KIND, EntityKind::Person);
        assert_eq!(PhotoId::KIND, EntityKind::Photo);
        assert_eq!(ThreadId::KIND, EntityKind::Thread);
    }
}
