//! Profile picture lookup used when cloning a person.

use std::future::Future;

use kinship_log::EventLog;
use kinship_types::{PersonId, ProfilePicture, UserId};

use crate::error::ResolveError;
use crate::projection::Projector;

/// Finds the face and photo shown as a person's profile picture.
pub trait ProfilePictureLookup: Send + Sync {
    /// The profile picture `user` sees for `person`, if any.
    fn resolve_face_and_photo_for_person(
        &self,
        user: UserId,
        person: PersonId,
    ) -> impl Future<Output = Result<Option<ProfilePicture>, ResolveError>> + Send;
}

/// Lookup that reads the person's profile projection from the log.
#[derive(Clone, Copy)]
pub struct LogProfilePictureLookup<'a> {
    log: &'a EventLog,
}

impl<'a> LogProfilePictureLookup<'a> {
    /// Create a lookup reading from `log`.
    pub const fn new(log: &'a EventLog) -> Self {
        Self { log }
    }
}

impl ProfilePictureLookup for LogProfilePictureLookup<'_> {
    async fn resolve_face_and_photo_for_person(
        &self,
        _user: UserId,
        person: PersonId,
    ) -> Result<Option<ProfilePicture>, ResolveError> {
        let profile = Projector::new(self.log)
            .person_profile(person)
            .await
            .map_err(|e| ResolveError::Collaborator {
                message: format!("profile picture lookup for person {person}: {e}"),
            })?;
        Ok(profile.profile_picture)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kinship_types::{
        EventPayload, FaceId, FamilyId, NewEvent, PersonAdded, PersonProfilePictureChanged,
        PhotoId,
    };

    use super::*;

    #[tokio::test]
    async fn reads_latest_picture_from_log() {
        let log = EventLog::in_memory();
        let person = PersonId::new();
        let added = EventPayload::PersonAdded(PersonAdded {
            person_id: person,
            family_id: FamilyId::new(),
            name: "Ada".to_owned(),
            added_by: UserId::new(),
        });
        log.append(NewEvent::from_payload(&added).unwrap())
            .await
            .unwrap();

        let lookup = LogProfilePictureLookup::new(&log);
        assert_eq!(
            lookup
                .resolve_face_and_photo_for_person(UserId::new(), person)
                .await
                .unwrap(),
            None
        );

        let picture = ProfilePicture {
            face_id: FaceId::new(),
            photo_id: PhotoId::new(),
        };
        let changed = EventPayload::PersonProfilePictureChanged(PersonProfilePictureChanged {
            person_id: person,
            face_id: picture.face_id,
            photo_id: picture.photo_id,
            user_id: UserId::new(),
        });
        log.append(NewEvent::from_payload(&changed).unwrap())
            .await
            .unwrap();

        assert_eq!(
            lookup
                .resolve_face_and_photo_for_person(UserId::new(), person)
                .await
                .unwrap(),
            Some(picture)
        );
    }

    #[tokio::test]
    async fn unknown_person_is_a_collaborator_error() {
        let log = EventLog::in_memory();
        let err = LogProfilePictureLookup::new(&log)
            .resolve_face_and_photo_for_person(UserId::new(), PersonId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Collaborator { .. }));
    }
}
