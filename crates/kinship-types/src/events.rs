//! Typed event payloads.
//!
//! Each event tag in [`EventType`] has one payload struct here. Payloads are
//! stored as JSON objects with camelCase field names; [`EventPayload`] is the
//! adjacently tagged union of all of them and converts to and from the
//! stored `(type, payload)` pair.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::{EntityKind, EventType};
use crate::ids::{FaceId, FamilyId, PersonId, PhotoId, ThreadId, UserId};

// ---------------------------------------------------------------------------
// Shared payload pieces
// ---------------------------------------------------------------------------

/// A face inside a photo used as a person's profile picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ProfilePicture {
    /// The detected face.
    pub face_id: FaceId,
    /// The photo containing the face.
    pub photo_id: PhotoId,
}

/// Source pointer of a person clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PersonSource {
    /// The person that was copied.
    pub person_id: PersonId,
    /// The family that person belongs to.
    pub family_id: FamilyId,
}

/// Source pointer of a photo clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PhotoSource {
    /// The photo that was copied.
    pub photo_id: PhotoId,
    /// The family that photo belongs to.
    pub family_id: FamilyId,
}

/// Source pointer of a thread clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ThreadSource {
    /// The thread that was copied.
    pub thread_id: ThreadId,
    /// The family that thread belongs to.
    pub family_id: FamilyId,
}

// ---------------------------------------------------------------------------
// Person
// ---------------------------------------------------------------------------

/// Payload of [`EventType::PersonAdded`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PersonAdded {
    /// The new person.
    pub person_id: PersonId,
    /// The family tree the person was added to.
    pub family_id: FamilyId,
    /// Display name.
    pub name: String,
    /// The user who added the person.
    pub added_by: UserId,
}

/// Payload of [`EventType::UserRegistered`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct UserRegistered {
    /// The new account.
    pub user_id: UserId,
    /// The person representing the account holder.
    pub person_id: PersonId,
    /// Family the person starts in, usually the personal space.
    pub family_id: FamilyId,
    /// Display name.
    pub name: String,
    /// Login e-mail.
    pub email: String,
}

/// Payload of [`EventType::PersonCreatedFromFace`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PersonCreatedFromFace {
    /// The new person.
    pub person_id: PersonId,
    /// Family of the photo the face was found in.
    pub family_id: FamilyId,
    /// Name typed while tagging.
    pub name: String,
    /// The tagged face.
    pub face_id: FaceId,
    /// The photo containing the face.
    pub photo_id: PhotoId,
    /// The user who tagged the face.
    pub user_id: UserId,
}

/// Payload of [`EventType::PersonNameChanged`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PersonNameChanged {
    /// The renamed person.
    pub person_id: PersonId,
    /// The new name.
    pub name: String,
    /// The user who made the change.
    pub user_id: UserId,
}

/// Payload of [`EventType::PersonProfilePictureChanged`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PersonProfilePictureChanged {
    /// The person.
    pub person_id: PersonId,
    /// The chosen face.
    pub face_id: FaceId,
    /// The photo containing the face.
    pub photo_id: PhotoId,
    /// The user who made the change.
    pub user_id: UserId,
}

/// Payload of [`EventType::PersonClonedForSharing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PersonClonedForSharing {
    /// The clone's own ID.
    pub person_id: PersonId,
    /// The family the clone lives in.
    pub family_id: FamilyId,
    /// Name copied from the original.
    pub name: String,
    /// Profile picture copied from the original, if it had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub profile_picture: Option<ProfilePicture>,
    /// Where the clone was copied from.
    pub cloned_from: PersonSource,
    /// The user whose action caused the clone.
    pub user_id: UserId,
}

// ---------------------------------------------------------------------------
// Photo
// ---------------------------------------------------------------------------

/// Payload of [`EventType::PhotoUploaded`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PhotoUploaded {
    /// The new photo.
    pub photo_id: PhotoId,
    /// Family the photo was uploaded to.
    pub family_id: FamilyId,
    /// Storage key of the image file.
    pub location: String,
    /// The uploader.
    pub uploaded_by: UserId,
}

/// Payload of [`EventType::PhotoUploadedToThread`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PhotoUploadedToThread {
    /// The new photo.
    pub photo_id: PhotoId,
    /// The thread it was attached to.
    pub thread_id: ThreadId,
    /// Family of the thread.
    pub family_id: FamilyId,
    /// Storage key of the image file.
    pub location: String,
    /// The uploader.
    pub uploaded_by: UserId,
}

/// Payload of [`EventType::PhotoCaptionEdited`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PhotoCaptionEdited {
    /// The photo.
    pub photo_id: PhotoId,
    /// The new caption.
    pub caption: String,
    /// The user who made the change.
    pub user_id: UserId,
}

/// Payload of [`EventType::PhotoDateChanged`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PhotoDateChanged {
    /// The photo.
    pub photo_id: PhotoId,
    /// When the picture was taken.
    pub date_taken: NaiveDate,
    /// The user who made the change.
    pub user_id: UserId,
}

/// Payload of [`EventType::PhotoClonedForSharing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PhotoClonedForSharing {
    /// The clone's own ID.
    pub photo_id: PhotoId,
    /// The family the clone lives in.
    pub family_id: FamilyId,
    /// Storage key shared with the original (files are not copied).
    pub location: String,
    /// Caption copied from the original.
    pub caption: String,
    /// Date copied from the original, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub date_taken: Option<NaiveDate>,
    /// Where the clone was copied from.
    pub cloned_from: PhotoSource,
    /// The user whose action caused the clone.
    pub user_id: UserId,
}

// ---------------------------------------------------------------------------
// Thread
// ---------------------------------------------------------------------------

/// Payload of [`EventType::ThreadStarted`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ThreadStarted {
    /// The new thread.
    pub thread_id: ThreadId,
    /// Family the thread was started in.
    pub family_id: FamilyId,
    /// Initial title.
    pub title: String,
    /// The author.
    pub started_by: UserId,
}

/// Payload of [`EventType::ThreadTitleSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ThreadTitleSet {
    /// The thread.
    pub thread_id: ThreadId,
    /// The new title.
    pub title: String,
    /// The user who made the change.
    pub user_id: UserId,
}

/// Payload of [`EventType::ThreadClonedForSharing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ThreadClonedForSharing {
    /// The clone's own ID.
    pub thread_id: ThreadId,
    /// The family the clone lives in.
    pub family_id: FamilyId,
    /// Title copied from the original.
    pub title: String,
    /// Where the clone was copied from.
    pub cloned_from: ThreadSource,
    /// The user whose action caused the clone.
    pub user_id: UserId,
}

// ---------------------------------------------------------------------------
// Family and membership
// ---------------------------------------------------------------------------

/// Payload of [`EventType::FamilyCreated`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct FamilyCreated {
    /// The new family.
    pub family_id: FamilyId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub about: String,
    /// The founding user.
    pub created_by: UserId,
}

/// Payload of [`EventType::FamilyRenamed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct FamilyRenamed {
    /// The family.
    pub family_id: FamilyId,
    /// The new name.
    pub name: String,
    /// The user who made the change.
    pub user_id: UserId,
}

/// Payload of the membership tags ([`EventType::UserJoinedFamily`],
/// [`EventType::UserLeftFamily`], [`EventType::UserSwitchedFamily`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Membership {
    /// The user.
    pub user_id: UserId,
    /// The family.
    pub family_id: FamilyId,
}

// ---------------------------------------------------------------------------
// Tagged union
// ---------------------------------------------------------------------------

/// Any event payload, tagged with its [`EventType`].
///
/// Serialized adjacently tagged: `{"type": "PhotoUploaded", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload")]
#[ts(export, export_to = "bindings/")]
pub enum EventPayload {
    /// See [`PersonAdded`].
    PersonAdded(PersonAdded),
    /// See [`UserRegistered`].
    UserRegistered(UserRegistered),
    /// See [`PersonCreatedFromFace`].
    PersonCreatedFromFace(PersonCreatedFromFace),
    /// See [`PersonNameChanged`].
    PersonNameChanged(PersonNameChanged),
    /// See [`PersonProfilePictureChanged`].
    PersonProfilePictureChanged(PersonProfilePictureChanged),
    /// See [`PersonClonedForSharing`].
    PersonClonedForSharing(PersonClonedForSharing),
    /// See [`PhotoUploaded`].
    PhotoUploaded(PhotoUploaded),
    /// See [`PhotoUploadedToThread`].
    PhotoUploadedToThread(PhotoUploadedToThread),
    /// See [`PhotoCaptionEdited`].
    PhotoCaptionEdited(PhotoCaptionEdited),
    /// See [`PhotoDateChanged`].
    PhotoDateChanged(PhotoDateChanged),
    /// See [`PhotoClonedForSharing`].
    PhotoClonedForSharing(PhotoClonedForSharing),
    /// See [`ThreadStarted`].
    ThreadStarted(ThreadStarted),
    /// See [`ThreadTitleSet`].
    ThreadTitleSet(ThreadTitleSet),
    /// See [`ThreadClonedForSharing`].
    ThreadClonedForSharing(ThreadClonedForSharing),
    /// See [`FamilyCreated`].
    FamilyCreated(FamilyCreated),
    /// See [`FamilyRenamed`].
    FamilyRenamed(FamilyRenamed),
    /// A user joined a family.
    UserJoinedFamily(Membership),
    /// A user left a family.
    UserLeftFamily(Membership),
    /// A user switched their current family.
    UserSwitchedFamily(Membership),
}

/// The provenance link recorded by a clone event, with IDs erased to [`Uuid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloneLink {
    /// Kind of the cloned entity.
    pub kind: EntityKind,
    /// The clone's own ID.
    pub id: Uuid,
    /// The family the clone lives in.
    pub family_id: FamilyId,
    /// The entity the clone was copied from.
    pub source_id: Uuid,
    /// The family of the source entity.
    pub source_family_id: FamilyId,
}

impl EventPayload {
    /// The tag of this payload.
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::PersonAdded(_) => EventType::PersonAdded,
            Self::UserRegistered(_) => EventType::UserRegistered,
            Self::PersonCreatedFromFace(_) => EventType::PersonCreatedFromFace,
            Self::PersonNameChanged(_) => EventType::PersonNameChanged,
            Self::PersonProfilePictureChanged(_) => EventType::PersonProfilePictureChanged,
            Self::PersonClonedForSharing(_) => EventType::PersonClonedForSharing,
            Self::PhotoUploaded(_) => EventType::PhotoUploaded,
            Self::PhotoUploadedToThread(_) => EventType::PhotoUploadedToThread,
            Self::PhotoCaptionEdited(_) => EventType::PhotoCaptionEdited,
            Self::PhotoDateChanged(_) => EventType::PhotoDateChanged,
            Self::PhotoClonedForSharing(_) => EventType::PhotoClonedForSharing,
            Self::ThreadStarted(_) => EventType::ThreadStarted,
            Self::ThreadTitleSet(_) => EventType::ThreadTitleSet,
            Self::ThreadClonedForSharing(_) => EventType::ThreadClonedForSharing,
            Self::FamilyCreated(_) => EventType::FamilyCreated,
            Self::FamilyRenamed(_) => EventType::FamilyRenamed,
            Self::UserJoinedFamily(_) => EventType::UserJoinedFamily,
            Self::UserLeftFamily(_) => EventType::UserLeftFamily,
            Self::UserSwitchedFamily(_) => EventType::UserSwitchedFamily,
        }
    }

    /// Rebuild a payload from a stored tag and JSON object.
    pub fn decode(
        event_type: EventType,
        payload: &serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::json!({
            "type": event_type.as_str(),
            "payload": payload,
        }))
    }

    /// Split into the stored tag and JSON object.
    pub fn encode(&self) -> Result<(EventType, serde_json::Value), serde_json::Error> {
        let value = serde_json::to_value(self)?;
        let payload = match value {
            serde_json::Value::Object(mut map) => map
                .remove("payload")
                .unwrap_or(serde_json::Value::Null),
            other => other,
        };
        Ok((self.event_type(), payload))
    }

    /// The provenance link if this is a clone event.
    pub const fn clone_link(&self) -> Option<CloneLink> {
        match self {
            Self::PersonClonedForSharing(e) => Some(CloneLink {
                kind: EntityKind::Person,
                id: e.person_id.0,
                family_id: e.family_id,
                source_id: e.cloned_from.person_id.0,
                source_family_id: e.cloned_from.family_id,
            }),
            Self::PhotoClonedForSharing(e) => Some(CloneLink {
                kind: EntityKind::Photo,
                id: e.photo_id.0,
                family_id: e.family_id,
                source_id: e.cloned_from.photo_id.0,
                source_family_id: e.cloned_from.family_id,
            }),
            Self::ThreadClonedForSharing(e) => Some(CloneLink {
                kind: EntityKind::Thread,
                id: e.thread_id.0,
                family_id: e.family_id,
                source_id: e.cloned_from.thread_id.0,
                source_family_id: e.cloned_from.family_id,
            }),
            Self::PersonAdded(_)
            | Self::UserRegistered(_)
            | Self::PersonCreatedFromFace(_)
            | Self::PersonNameChanged(_)
            | Self::PersonProfilePictureChanged(_)
            | Self::PhotoUploaded(_)
            | Self::PhotoUploadedToThread(_)
            | Self::PhotoCaptionEdited(_)
            | Self::PhotoDateChanged(_)
            | Self::ThreadStarted(_)
            | Self::ThreadTitleSet(_)
            | Self::FamilyCreated(_)
            | Self::FamilyRenamed(_)
            | Self::UserJoinedFamily(_)
            | Self::UserLeftFamily(_)
            | Self::UserSwitchedFamily(_) => None,
        }
    }
}
