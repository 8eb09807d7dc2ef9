//! Stored event shape and derived projection values.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::EventType;
use crate::events::{EventPayload, ProfilePicture};
use crate::ids::{EventId, FamilyId, Shareable};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// An immutable fact as stored in the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Position in the log, assigned on append. Strictly increasing.
    pub seq: i64,
    /// Unique event identifier.
    pub id: EventId,
    /// The event tag.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Type-specific payload (camelCase JSON object).
    pub payload: serde_json::Value,
    /// When the fact happened.
    pub occurred_at: DateTime<Utc>,
    /// Store-enforced uniqueness key, if the writer requested one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub unique_key: Option<String>,
}

impl Event {
    /// Decode the payload into its typed form.
    pub fn decode(&self) -> Result<EventPayload, serde_json::Error> {
        EventPayload::decode(self.event_type, &self.payload)
    }
}

/// An event that has not been appended yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    /// Unique event identifier.
    pub id: EventId,
    /// The event tag.
    pub event_type: EventType,
    /// Type-specific payload.
    pub payload: serde_json::Value,
    /// When the fact happened.
    pub occurred_at: DateTime<Utc>,
    /// Uniqueness key; a second append with the same key is rejected.
    pub unique_key: Option<String>,
}

impl NewEvent {
    /// Build an event for `payload` occurring now.
    pub fn from_payload(payload: &EventPayload) -> Result<Self, serde_json::Error> {
        let (event_type, payload) = payload.encode()?;
        Ok(Self {
            id: EventId::new(),
            event_type,
            payload,
            occurred_at: Utc::now(),
            unique_key: None,
        })
    }

    /// Override the occurrence timestamp.
    #[must_use]
    pub const fn occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_at = at;
        self
    }

    /// Require that no other event with `key` exists in the log.
    #[must_use]
    pub fn with_unique_key(mut self, key: impl Into<String>) -> Self {
        self.unique_key = Some(key.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Clone graph references
// ---------------------------------------------------------------------------

/// An entity instance together with the family it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef<I> {
    /// The entity's own ID.
    pub id: I,
    /// The family it belongs to.
    pub family_id: FamilyId,
}

impl<I: Shareable> EntityRef<I> {
    /// Pair an ID with its family.
    pub const fn new(id: I, family_id: FamilyId) -> Self {
        Self { id, family_id }
    }
}

impl<I: Shareable> core::fmt::Display for EntityRef<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {} in family {}", I::KIND, self.id, self.family_id)
    }
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// Current state of a person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PersonProfile {
    /// Current name.
    pub name: String,
    /// Current profile picture, if one was ever set.
    #[ts(optional)]
    pub profile_picture: Option<ProfilePicture>,
}

/// Current state of a photo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PhotoDetails {
    /// Storage key of the image file.
    pub location: String,
    /// Current caption, empty if never set.
    pub caption: String,
    /// When the picture was taken, if known.
    #[ts(optional)]
    pub date_taken: Option<NaiveDate>,
}

/// Current state of a thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ThreadDetails {
    /// Current title.
    pub title: String,
}

/// Current state of a family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct FamilyDetails {
    /// Current name.
    pub name: String,
    /// Free-text description.
    pub about: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::PhotoUploaded;
    use crate::ids::{PhotoId, UserId};

    #[test]
    fn new_event_carries_encoded_payload() {
        let photo = PhotoId::new();
        let payload = EventPayload::PhotoUploaded(PhotoUploaded {
            photo_id: photo,
            family_id: FamilyId::new(),
            location: "photos/abc.jpg".to_owned(),
            uploaded_by: UserId::new(),
        });
        let event = NewEvent::from_payload(&payload)
            .unwrap()
            .with_unique_key("photo:upload:abc");
        assert_eq!(event.event_type, EventType::PhotoUploaded);
        assert_eq!(event.payload["photoId"], photo.to_string());
        assert_eq!(event.unique_key.as_deref(), Some("photo:upload:abc"));
    }

    #[test]
    fn stored_event_serializes_type_field() {
        let event = Event {
            seq: 7,
            id: EventId::new(),
            event_type: EventType::ThreadStarted,
            payload: serde_json::json!({}),
            occurred_at: Utc::now(),
            unique_key: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ThreadStarted");
        assert_eq!(json["seq"], 7);
        assert!(json.get("uniqueKey").is_none());
    }

    #[test]
    fn entity_ref_display_names_kind() {
        let r = EntityRef::new(PhotoId::new(), FamilyId::new());
        assert!(r.to_string().starts_with("photo "));
    }
}
