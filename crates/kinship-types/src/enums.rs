//! Enumeration types for the event catalogue.
//!
//! [`EventType`] is the closed set of tags stored alongside every event.
//! Its [`EventType::role`] mapping is the single place that says which tags
//! create, clone, or mutate an entity, and it is an exhaustive `match`:
//! a new tag does not compile until it has been classified.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

/// The kind of entity an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EntityKind {
    /// A person in a family tree.
    Person,
    /// An uploaded photo.
    Photo,
    /// A discussion thread.
    Thread,
    /// A family (sharing scope).
    Family,
}

impl EntityKind {
    /// Lower-case name used in logs and unique keys.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Photo => "photo",
            Self::Thread => "thread",
            Self::Family => "family",
        }
    }

    /// The payload field holding this kind's entity ID.
    pub const fn id_field(self) -> &'static str {
        match self {
            Self::Person => "personId",
            Self::Photo => "photoId",
            Self::Thread => "threadId",
            Self::Family => "familyId",
        }
    }

    /// The dotted payload path of the source ID on this kind's clone event.
    pub const fn cloned_from_field(self) -> &'static str {
        match self {
            Self::Person => "clonedFrom.personId",
            Self::Photo => "clonedFrom.photoId",
            Self::Thread => "clonedFrom.threadId",
            Self::Family => "clonedFrom.familyId",
        }
    }

    /// The clone event tag for this kind. Families are never cloned.
    pub const fn clone_event(self) -> Option<EventType> {
        match self {
            Self::Person => Some(EventType::PersonClonedForSharing),
            Self::Photo => Some(EventType::PhotoClonedForSharing),
            Self::Thread => Some(EventType::ThreadClonedForSharing),
            Self::Family => None,
        }
    }

    /// Every tag whose payload carries this kind's ID field as its subject.
    pub const fn event_types(self) -> &'static [EventType] {
        match self {
            Self::Person => &[
                EventType::PersonAdded,
                EventType::UserRegistered,
                EventType::PersonCreatedFromFace,
                EventType::PersonNameChanged,
                EventType::PersonProfilePictureChanged,
                EventType::PersonClonedForSharing,
            ],
            Self::Photo => &[
                EventType::PhotoUploaded,
                EventType::PhotoUploadedToThread,
                EventType::PhotoCaptionEdited,
                EventType::PhotoDateChanged,
                EventType::PhotoClonedForSharing,
            ],
            Self::Thread => &[
                EventType::ThreadStarted,
                EventType::ThreadTitleSet,
                EventType::ThreadClonedForSharing,
            ],
            Self::Family => &[EventType::FamilyCreated, EventType::FamilyRenamed],
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Event tags
// ---------------------------------------------------------------------------

/// A type of event recorded in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EventType {
    // --- Person ---
    /// A family member added a person to a family tree.
    PersonAdded,
    /// A new user account was created together with its own person.
    UserRegistered,
    /// Face tagging promoted an unknown face to a new person.
    PersonCreatedFromFace,
    /// A person's name was edited.
    PersonNameChanged,
    /// A person's profile picture was set to a face in a photo.
    PersonProfilePictureChanged,
    /// A person was copied into another family.
    PersonClonedForSharing,

    // --- Photo ---
    /// A photo was uploaded to a family.
    PhotoUploaded,
    /// A photo was uploaded as an attachment to a thread.
    PhotoUploadedToThread,
    /// A photo caption was edited.
    PhotoCaptionEdited,
    /// The date a photo was taken was edited.
    PhotoDateChanged,
    /// A photo was copied into another family.
    PhotoClonedForSharing,

    // --- Thread ---
    /// A discussion thread was started.
    ThreadStarted,
    /// A thread title was edited.
    ThreadTitleSet,
    /// A thread was copied into another family.
    ThreadClonedForSharing,

    // --- Family ---
    /// A family was created.
    FamilyCreated,
    /// A family was renamed.
    FamilyRenamed,

    // --- Membership ---
    /// A user joined a family.
    UserJoinedFamily,
    /// A user left a family.
    UserLeftFamily,
    /// A user switched the family their pages are scoped to.
    UserSwitchedFamily,
}

/// What an event does to the entity it is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventRole {
    /// Brings an original entity of the given kind into existence.
    Creation(EntityKind),
    /// Brings a clone of the given kind into existence.
    Clone(EntityKind),
    /// Changes fields of an existing entity of the given kind.
    Mutation(EntityKind),
    /// Changes a user's family membership or current family.
    Membership,
}

impl EventType {
    /// Every tag, in declaration order.
    pub const ALL: [Self; 19] = [
        Self::PersonAdded,
        Self::UserRegistered,
        Self::PersonCreatedFromFace,
        Self::PersonNameChanged,
        Self::PersonProfilePictureChanged,
        Self::PersonClonedForSharing,
        Self::PhotoUploaded,
        Self::PhotoUploadedToThread,
        Self::PhotoCaptionEdited,
        Self::PhotoDateChanged,
        Self::PhotoClonedForSharing,
        Self::ThreadStarted,
        Self::ThreadTitleSet,
        Self::ThreadClonedForSharing,
        Self::FamilyCreated,
        Self::FamilyRenamed,
        Self::UserJoinedFamily,
        Self::UserLeftFamily,
        Self::UserSwitchedFamily,
    ];

    /// The tag as stored in the `event_type` column and the JSON `type` field.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PersonAdded => "PersonAdded",
            Self::UserRegistered => "UserRegistered",
            Self::PersonCreatedFromFace => "PersonCreatedFromFace",
            Self::PersonNameChanged => "PersonNameChanged",
            Self::PersonProfilePictureChanged => "PersonProfilePictureChanged",
            Self::PersonClonedForSharing => "PersonClonedForSharing",
            Self::PhotoUploaded => "PhotoUploaded",
            Self::PhotoUploadedToThread => "PhotoUploadedToThread",
            Self::PhotoCaptionEdited => "PhotoCaptionEdited",
            Self::PhotoDateChanged => "PhotoDateChanged",
            Self::PhotoClonedForSharing => "PhotoClonedForSharing",
            Self::ThreadStarted => "ThreadStarted",
            Self::ThreadTitleSet => "ThreadTitleSet",
            Self::ThreadClonedForSharing => "ThreadClonedForSharing",
            Self::FamilyCreated => "FamilyCreated",
            Self::FamilyRenamed => "FamilyRenamed",
            Self::UserJoinedFamily => "UserJoinedFamily",
            Self::UserLeftFamily => "UserLeftFamily",
            Self::UserSwitchedFamily => "UserSwitchedFamily",
        }
    }

    /// Classify the tag.
    pub const fn role(self) -> EventRole {
        match self {
            Self::PersonAdded | Self::UserRegistered | Self::PersonCreatedFromFace => {
                EventRole::Creation(EntityKind::Person)
            }
            Self::PersonNameChanged | Self::PersonProfilePictureChanged => {
                EventRole::Mutation(EntityKind::Person)
            }
            Self::PersonClonedForSharing => EventRole::Clone(EntityKind::Person),
            Self::PhotoUploaded | Self::PhotoUploadedToThread => {
                EventRole::Creation(EntityKind::Photo)
            }
            Self::PhotoCaptionEdited | Self::PhotoDateChanged => {
                EventRole::Mutation(EntityKind::Photo)
            }
            Self::PhotoClonedForSharing => EventRole::Clone(EntityKind::Photo),
            Self::ThreadStarted => EventRole::Creation(EntityKind::Thread),
            Self::ThreadTitleSet => EventRole::Mutation(EntityKind::Thread),
            Self::ThreadClonedForSharing => EventRole::Clone(EntityKind::Thread),
            Self::FamilyCreated => EventRole::Creation(EntityKind::Family),
            Self::FamilyRenamed => EventRole::Mutation(EntityKind::Family),
            Self::UserJoinedFamily | Self::UserLeftFamily | Self::UserSwitchedFamily => {
                EventRole::Membership
            }
        }
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored tag is not part of the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl core::str::FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_strings_match_serde_names() {
        for t in EventType::ALL {
            let json = serde_json::to_value(t).ok();
            assert_eq!(json, Some(serde_json::Value::String(t.as_str().to_owned())));
        }
    }

    #[test]
    fn tags_parse_back() {
        for t in EventType::ALL {
            assert_eq!(t.as_str().parse::<EventType>().ok(), Some(t));
        }
        assert!("PersonDeleted".parse::<EventType>().is_err());
    }

    #[test]
    fn kind_event_types_agree_with_roles() {
        for kind in [
            EntityKind::Person,
            EntityKind::Photo,
            EntityKind::Thread,
            EntityKind::Family,
        ] {
            for t in kind.event_types() {
                let role_kind = match t.role() {
                    EventRole::Creation(k) | EventRole::Clone(k) | EventRole::Mutation(k) => {
                        Some(k)
                    }
                    EventRole::Membership => None,
                };
                assert_eq!(role_kind, Some(kind), "{t} listed under {kind}");
            }
        }
    }

    #[test]
    fn clone_events_are_clone_roles() {
        for kind in [EntityKind::Person, EntityKind::Photo, EntityKind::Thread] {
            let clone = kind.clone_event();
            assert!(clone.is_some());
            assert_eq!(clone.map(EventType::role), Some(EventRole::Clone(kind)));
        }
        assert_eq!(EntityKind::Family.clone_event(), None);
    }
}
