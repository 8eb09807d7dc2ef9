//! Derived current state, recomputed from the event log on every read.
//!
//! Nothing here is cached or stored. Each projection loads the ordered
//! history of one entity (or one user / family for membership) and folds it.

use kinship_log::{EventLog, Predicate};
use kinship_types::{
    EntityKind, EventPayload, EventType, FamilyDetails, FamilyId, PersonId, PersonProfile,
    PhotoDetails, PhotoId, ProfilePicture, Shareable, ThreadDetails, ThreadId, UserId,
};
use tracing::debug;
use uuid::Uuid;

use crate::error::ResolveError;

/// Tags that change which families a user belongs to.
const MEMBERSHIP_CHANGES: &[EventType] = &[EventType::UserJoinedFamily, EventType::UserLeftFamily];

/// What a single event says about its subject's family.
enum Fact {
    /// The subject was created in this family.
    Created(FamilyId),
    /// The subject is a clone living in this family.
    Cloned(FamilyId),
    /// The subject was edited; the family is not stated.
    Mutated,
    /// A membership change; says nothing about entities.
    Membership,
}

fn classify(payload: &EventPayload) -> Fact {
    match payload {
        EventPayload::PersonAdded(e) => Fact::Created(e.family_id),
        EventPayload::UserRegistered(e) => Fact::Created(e.family_id),
        EventPayload::PersonCreatedFromFace(e) => Fact::Created(e.family_id),
        EventPayload::PhotoUploaded(e) => Fact::Created(e.family_id),
        EventPayload::PhotoUploadedToThread(e) => Fact::Created(e.family_id),
        EventPayload::ThreadStarted(e) => Fact::Created(e.family_id),
        EventPayload::FamilyCreated(e) => Fact::Created(e.family_id),
        EventPayload::PersonClonedForSharing(e) => Fact::Cloned(e.family_id),
        EventPayload::PhotoClonedForSharing(e) => Fact::Cloned(e.family_id),
        EventPayload::ThreadClonedForSharing(e) => Fact::Cloned(e.family_id),
        EventPayload::PersonNameChanged(_)
        | EventPayload::PersonProfilePictureChanged(_)
        | EventPayload::PhotoCaptionEdited(_)
        | EventPayload::PhotoDateChanged(_)
        | EventPayload::ThreadTitleSet(_)
        | EventPayload::FamilyRenamed(_) => Fact::Mutated,
        EventPayload::UserJoinedFamily(_)
        | EventPayload::UserLeftFamily(_)
        | EventPayload::UserSwitchedFamily(_) => Fact::Membership,
    }
}

/// Read-side view over an [`EventLog`].
#[derive(Clone, Copy)]
pub struct Projector<'a> {
    log: &'a EventLog,
}

impl<'a> Projector<'a> {
    /// Create a projector reading from `log`.
    pub const fn new(log: &'a EventLog) -> Self {
        Self { log }
    }

    /// Decoded history of one entity, ascending by `(occurred_at, seq)`.
    async fn history(
        &self,
        kind: EntityKind,
        id: Uuid,
        operation: &'static str,
    ) -> Result<Vec<EventPayload>, ResolveError> {
        let predicate = Predicate::new().eq(kind.id_field(), id);
        let events = self
            .log
            .all_matching(kind.event_types(), &predicate)
            .await
            .map_err(ResolveError::storage(operation))?;

        debug!(kind = %kind, id = %id, events = events.len(), "Loaded history");

        events
            .iter()
            .map(|event| {
                event.decode().map_err(|source| ResolveError::Payload {
                    seq: event.seq,
                    source,
                })
            })
            .collect()
    }

    /// Like [`Projector::history`] but an empty history is
    /// [`ResolveError::NotFound`].
    async fn existing_history(
        &self,
        kind: EntityKind,
        id: Uuid,
        operation: &'static str,
    ) -> Result<Vec<EventPayload>, ResolveError> {
        let history = self.history(kind, id, operation).await?;
        if history.is_empty() {
            return Err(ResolveError::NotFound { kind, id });
        }
        Ok(history)
    }

    // =========================================================================
    // Family resolution
    // =========================================================================

    /// The family an entity belongs to.
    ///
    /// A clone event is authoritative over creation events. Otherwise the
    /// earliest creation event decides.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NotFound`] if no event mentions the entity
    /// - [`ResolveError::InconsistentHistory`] if the history holds only
    ///   mutations, or clone events that disagree on the family
    pub async fn family_of(&self, kind: EntityKind, id: Uuid) -> Result<FamilyId, ResolveError> {
        let history = self.existing_history(kind, id, "family_of").await?;

        let mut created: Option<FamilyId> = None;
        let mut cloned: Option<FamilyId> = None;
        for payload in &history {
            match classify(payload) {
                Fact::Created(family) => {
                    created.get_or_insert(family);
                }
                Fact::Cloned(family) => match cloned {
                    Some(previous) if previous != family => {
                        return Err(ResolveError::inconsistent(
                            kind,
                            id,
                            format!("clone events place it in both {previous} and {family}"),
                        ));
                    }
                    _ => cloned = Some(family),
                },
                Fact::Mutated | Fact::Membership => {}
            }
        }

        cloned.or(created).ok_or_else(|| {
            ResolveError::inconsistent(kind, id, "mutation events without a creation event")
        })
    }

    /// Typed form of [`Projector::family_of`].
    ///
    /// # Errors
    ///
    /// Same as [`Projector::family_of`].
    pub async fn family_of_entity<I: Shareable>(&self, id: I) -> Result<FamilyId, ResolveError> {
        self.family_of(I::KIND, id.into()).await
    }

    // =========================================================================
    // Field projections
    // =========================================================================

    /// Current name and profile picture of a person.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NotFound`] if the person has no events.
    pub async fn person_profile(&self, id: PersonId) -> Result<PersonProfile, ResolveError> {
        let history = self
            .existing_history(EntityKind::Person, id.into(), "person_profile")
            .await?;

        let mut profile = PersonProfile::default();
        for payload in history {
            match payload {
                EventPayload::PersonAdded(e) => profile.name = e.name,
                EventPayload::UserRegistered(e) => profile.name = e.name,
                EventPayload::PersonCreatedFromFace(e) => {
                    profile.name = e.name;
                    profile.profile_picture = Some(ProfilePicture {
                        face_id: e.face_id,
                        photo_id: e.photo_id,
                    });
                }
                EventPayload::PersonNameChanged(e) => profile.name = e.name,
                EventPayload::PersonProfilePictureChanged(e) => {
                    profile.profile_picture = Some(ProfilePicture {
                        face_id: e.face_id,
                        photo_id: e.photo_id,
                    });
                }
                EventPayload::PersonClonedForSharing(e) => {
                    profile.name = e.name;
                    profile.profile_picture = e.profile_picture;
                }
                _ => {}
            }
        }
        Ok(profile)
    }

    /// Current location, caption and date of a photo.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NotFound`] if the photo has no events.
    pub async fn photo_details(&self, id: PhotoId) -> Result<PhotoDetails, ResolveError> {
        let history = self
            .existing_history(EntityKind::Photo, id.into(), "photo_details")
            .await?;

        let mut details = PhotoDetails::default();
        for payload in history {
            match payload {
                EventPayload::PhotoUploaded(e) => details.location = e.location,
                EventPayload::PhotoUploadedToThread(e) => details.location = e.location,
                EventPayload::PhotoCaptionEdited(e) => details.caption = e.caption,
                EventPayload::PhotoDateChanged(e) => details.date_taken = Some(e.date_taken),
                EventPayload::PhotoClonedForSharing(e) => {
                    details.location = e.location;
                    details.caption = e.caption;
                    details.date_taken = e.date_taken;
                }
                _ => {}
            }
        }
        Ok(details)
    }

    /// Current title of a thread.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NotFound`] if the thread has no events.
    pub async fn thread_details(&self, id: ThreadId) -> Result<ThreadDetails, ResolveError> {
        let history = self
            .existing_history(EntityKind::Thread, id.into(), "thread_details")
            .await?;

        let mut details = ThreadDetails::default();
        for payload in history {
            match payload {
                EventPayload::ThreadStarted(e) => details.title = e.title,
                EventPayload::ThreadTitleSet(e) => details.title = e.title,
                EventPayload::ThreadClonedForSharing(e) => details.title = e.title,
                _ => {}
            }
        }
        Ok(details)
    }

    /// Current name and description of a family.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NotFound`] if the family has no events.
    pub async fn family_details(&self, id: FamilyId) -> Result<FamilyDetails, ResolveError> {
        let history = self
            .existing_history(EntityKind::Family, id.into(), "family_details")
            .await?;

        let mut details = FamilyDetails::default();
        for payload in history {
            match payload {
                EventPayload::FamilyCreated(e) => {
                    details.name = e.name;
                    details.about = e.about;
                }
                EventPayload::FamilyRenamed(e) => details.name = e.name,
                _ => {}
            }
        }
        Ok(details)
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Families a user can see: their personal family first, then every
    /// family joined and not since left, in join order.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Storage`] or [`ResolveError::Payload`].
    pub async fn families_of_user(&self, user: UserId) -> Result<Vec<FamilyId>, ResolveError> {
        let predicate = Predicate::new().eq("userId", user);
        let changes = self
            .membership_changes(&predicate, "families_of_user")
            .await?;

        let personal = FamilyId::personal(user);
        let mut families = vec![personal];
        for (joined, family, _) in changes {
            if family == personal {
                continue;
            }
            families.retain(|f| *f != family);
            if joined {
                families.push(family);
            }
        }
        Ok(families)
    }

    /// Users currently in a family, in join order.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Storage`] or [`ResolveError::Payload`].
    pub async fn members_of_family(&self, family: FamilyId) -> Result<Vec<UserId>, ResolveError> {
        let predicate = Predicate::new().eq("familyId", family);
        let changes = self
            .membership_changes(&predicate, "members_of_family")
            .await?;

        let mut members: Vec<UserId> = Vec::new();
        for (joined, _, user) in changes {
            members.retain(|u| *u != user);
            if joined {
                members.push(user);
            }
        }
        Ok(members)
    }

    /// The family a user last switched to, or their personal family.
    ///
    /// # Errors
    ///
    /// [`ResolveError::Storage`] or [`ResolveError::Payload`].
    pub async fn current_family_of_user(&self, user: UserId) -> Result<FamilyId, ResolveError> {
        let predicate = Predicate::new().eq("userId", user);
        let latest = self
            .log
            .latest_matching(&[EventType::UserSwitchedFamily], &predicate)
            .await
            .map_err(ResolveError::storage("current_family_of_user"))?;

        let Some(event) = latest else {
            return Ok(FamilyId::personal(user));
        };
        match event.decode() {
            Ok(EventPayload::UserSwitchedFamily(m)) => Ok(m.family_id),
            Ok(_) => Ok(FamilyId::personal(user)),
            Err(source) => Err(ResolveError::Payload {
                seq: event.seq,
                source,
            }),
        }
    }

    /// Ordered `(joined, family, user)` triples matching `predicate`.
    async fn membership_changes(
        &self,
        predicate: &Predicate,
        operation: &'static str,
    ) -> Result<Vec<(bool, FamilyId, UserId)>, ResolveError> {
        let events = self
            .log
            .all_matching(MEMBERSHIP_CHANGES, predicate)
            .await
            .map_err(ResolveError::storage(operation))?;

        let mut changes = Vec::with_capacity(events.len());
        for event in &events {
            let payload = event.decode().map_err(|source| ResolveError::Payload {
                seq: event.seq,
                source,
            })?;
            match payload {
                EventPayload::UserJoinedFamily(m) => changes.push((true, m.family_id, m.user_id)),
                EventPayload::UserLeftFamily(m) => changes.push((false, m.family_id, m.user_id)),
                _ => {}
            }
        }
        Ok(changes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use kinship_types::{
        FaceId, FamilyCreated, FamilyRenamed, Membership, NewEvent, PersonAdded,
        PersonCreatedFromFace, PersonNameChanged, PhotoCaptionEdited, PhotoUploaded,
        ThreadStarted, ThreadTitleSet,
    };

    use super::*;

    async fn append(log: &EventLog, payload: EventPayload, offset_secs: i64) {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let event = NewEvent::from_payload(&payload)
            .unwrap()
            .occurred_at(base + Duration::seconds(offset_secs));
        log.append(event).await.unwrap();
    }

    #[tokio::test]
    async fn earliest_creation_decides_family() {
        let log = EventLog::in_memory();
        let person = PersonId::new();
        let first = FamilyId::new();
        let second = FamilyId::new();
        for (family, offset) in [(second, 20), (first, 10)] {
            append(
                &log,
                EventPayload::PersonAdded(PersonAdded {
                    person_id: person,
                    family_id: family,
                    name: "Ada".to_owned(),
                    added_by: UserId::new(),
                }),
                offset,
            )
            .await;
        }

        let family = Projector::new(&log)
            .family_of_entity(person)
            .await
            .unwrap();
        assert_eq!(family, first);
    }

    #[tokio::test]
    async fn unknown_entity_is_not_found() {
        let log = EventLog::in_memory();
        let err = Projector::new(&log)
            .family_of(EntityKind::Thread, Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound {
                kind: EntityKind::Thread,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn mutations_only_is_inconsistent() {
        let log = EventLog::in_memory();
        let thread = ThreadId::new();
        append(
            &log,
            EventPayload::ThreadTitleSet(ThreadTitleSet {
                thread_id: thread,
                title: "orphan".to_owned(),
                user_id: UserId::new(),
            }),
            0,
        )
        .await;

        let err = Projector::new(&log)
            .family_of_entity(thread)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InconsistentHistory { .. }));
    }

    #[tokio::test]
    async fn person_profile_folds_name_and_face() {
        let log = EventLog::in_memory();
        let person = PersonId::new();
        let face = FaceId::new();
        let photo = PhotoId::new();
        append(
            &log,
            EventPayload::PersonCreatedFromFace(PersonCreatedFromFace {
                person_id: person,
                family_id: FamilyId::new(),
                name: "Grandma".to_owned(),
                face_id: face,
                photo_id: photo,
                user_id: UserId::new(),
            }),
            0,
        )
        .await;
        append(
            &log,
            EventPayload::PersonNameChanged(PersonNameChanged {
                person_id: person,
                name: "Rose Martin".to_owned(),
                user_id: UserId::new(),
            }),
            5,
        )
        .await;

        let profile = Projector::new(&log).person_profile(person).await.unwrap();
        assert_eq!(profile.name, "Rose Martin");
        assert_eq!(
            profile.profile_picture,
            Some(ProfilePicture {
                face_id: face,
                photo_id: photo
            })
        );
    }

    #[tokio::test]
    async fn photo_caption_defaults_to_empty() {
        let log = EventLog::in_memory();
        let photo = PhotoId::new();
        append(
            &log,
            EventPayload::PhotoUploaded(PhotoUploaded {
                photo_id: photo,
                family_id: FamilyId::new(),
                location: "photos/1.jpg".to_owned(),
                uploaded_by: UserId::new(),
            }),
            0,
        )
        .await;

        let projector = Projector::new(&log);
        let details = projector.photo_details(photo).await.unwrap();
        assert_eq!(details.caption, "");
        assert_eq!(details.location, "photos/1.jpg");
        assert_eq!(details.date_taken, None);

        append(
            &log,
            EventPayload::PhotoCaptionEdited(PhotoCaptionEdited {
                photo_id: photo,
                caption: "Beach, 1962".to_owned(),
                user_id: UserId::new(),
            }),
            1,
        )
        .await;
        let details = projector.photo_details(photo).await.unwrap();
        assert_eq!(details.caption, "Beach, 1962");
    }

    #[tokio::test]
    async fn latest_title_wins() {
        let log = EventLog::in_memory();
        let thread = ThreadId::new();
        append(
            &log,
            EventPayload::ThreadStarted(ThreadStarted {
                thread_id: thread,
                family_id: FamilyId::new(),
                title: "Summer".to_owned(),
                started_by: UserId::new(),
            }),
            0,
        )
        .await;
        for (title, offset) in [("Summer 1970", 10), ("Summer '70", 5)] {
            append(
                &log,
                EventPayload::ThreadTitleSet(ThreadTitleSet {
                    thread_id: thread,
                    title: title.to_owned(),
                    user_id: UserId::new(),
                }),
                offset,
            )
            .await;
        }

        let details = Projector::new(&log).thread_details(thread).await.unwrap();
        assert_eq!(details.title, "Summer 1970");
    }

    #[tokio::test]
    async fn family_details_follow_renames() {
        let log = EventLog::in_memory();
        let family = FamilyId::new();
        append(
            &log,
            EventPayload::FamilyCreated(FamilyCreated {
                family_id: family,
                name: "Martins".to_owned(),
                about: "Lyon branch".to_owned(),
                created_by: UserId::new(),
            }),
            0,
        )
        .await;
        append(
            &log,
            EventPayload::FamilyRenamed(FamilyRenamed {
                family_id: family,
                name: "Martin-Dubois".to_owned(),
                user_id: UserId::new(),
            }),
            1,
        )
        .await;

        let projector = Projector::new(&log);
        let details = projector.family_details(family).await.unwrap();
        assert_eq!(details.name, "Martin-Dubois");
        assert_eq!(details.about, "Lyon branch");
        assert_eq!(
            projector
                .family_of(EntityKind::Family, family.into())
                .await
                .unwrap(),
            family
        );
    }

    #[tokio::test]
    async fn membership_tracks_joins_and_leaves() {
        let log = EventLog::in_memory();
        let user = UserId::new();
        let other = UserId::new();
        let a = FamilyId::new();
        let b = FamilyId::new();

        let joined = |user_id, family_id| EventPayload::UserJoinedFamily(Membership { user_id, family_id });
        let left = |user_id, family_id| EventPayload::UserLeftFamily(Membership { user_id, family_id });

        append(&log, joined(user, a), 0).await;
        append(&log, joined(other, a), 1).await;
        append(&log, joined(user, b), 2).await;
        append(&log, left(user, a), 3).await;

        let projector = Projector::new(&log);
        assert_eq!(
            projector.families_of_user(user).await.unwrap(),
            vec![FamilyId::personal(user), b]
        );
        assert_eq!(projector.members_of_family(a).await.unwrap(), vec![other]);

        append(&log, joined(user, a), 4).await;
        assert_eq!(
            projector.families_of_user(user).await.unwrap(),
            vec![FamilyId::personal(user), b, a]
        );
        assert_eq!(
            projector.members_of_family(a).await.unwrap(),
            vec![other, user]
        );
    }

    #[tokio::test]
    async fn current_family_defaults_to_personal() {
        let log = EventLog::in_memory();
        let user = UserId::new();
        let projector = Projector::new(&log);
        assert_eq!(
            projector.current_family_of_user(user).await.unwrap(),
            FamilyId::personal(user)
        );

        let family = FamilyId::new();
        append(
            &log,
            EventPayload::UserSwitchedFamily(Membership {
                user_id: user,
                family_id: family,
            }),
            0,
        )
        .await;
        assert_eq!(
            projector.current_family_of_user(user).await.unwrap(),
            family
        );
    }
}
