//! Clone graph resolution.
//!
//! When content crosses a sharing boundary it is copied into the target
//! family as a clone with its own ID and a `clonedFrom` link back to its
//! source. The [`CloneResolver`] walks those links:
//!
//! ```text
//!   original_of:   C3 -> C2 -> C1 -> O        (follow clonedFrom upwards)
//!   all_clones_of: O  -> {C1, C2} -> {C3}     (breadth-first over children)
//!   ensure_clone_in_family: lookup, else append a clone event
//! ```
//!
//! Traversal is iterative and bounded by `max_clone_depth`. A revisited
//! node or an over-deep chain is [`ResolveError::CycleDetected`].
//!
//! Concurrent `ensure_clone_in_family` calls for the same original and
//! family are serialised by the event log's unique key
//! `"<kind>:<originalId>:<familyId>"`: exactly one append succeeds and every
//! other caller re-reads the clone set and returns the winner's ID.

use std::collections::{HashSet, VecDeque};

use kinship_log::{EventLog, LogError, Predicate};
use kinship_types::{
    CloneLink, EntityKind, EntityRef, Event, EventPayload, EventType, FamilyId, NewEvent,
    PersonClonedForSharing, PersonId, PersonSource, PhotoClonedForSharing, PhotoId, PhotoSource,
    Shareable, ThreadClonedForSharing, ThreadId, ThreadSource, UserId,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clone_graph::{CloneGraph, CloneSet};
use crate::error::ResolveError;
use crate::faces::ProfilePictureLookup;
use crate::projection::Projector;
use crate::visibility::{SearchableAttributes, VisibilityIndex};

/// Default bound on the number of clone links followed.
pub const DEFAULT_MAX_CLONE_DEPTH: usize = 64;

/// Resolves originals and clones over an [`EventLog`].
pub struct CloneResolver<'a, F, V> {
    log: &'a EventLog,
    faces: &'a F,
    visibility: &'a V,
    max_depth: usize,
}

impl<'a, F: ProfilePictureLookup, V: VisibilityIndex> CloneResolver<'a, F, V> {
    /// Create a resolver with the default depth bound.
    pub const fn new(log: &'a EventLog, faces: &'a F, visibility: &'a V) -> Self {
        Self {
            log,
            faces,
            visibility,
            max_depth: DEFAULT_MAX_CLONE_DEPTH,
        }
    }

    /// Override the depth bound.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The configured depth bound.
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// A projector over the same log.
    pub const fn projector(&self) -> Projector<'a> {
        Projector::new(self.log)
    }

    /// The canonical original of `id` and its family.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NotFound`] if the chain ends at an entity with no
    ///   history
    /// - [`ResolveError::CycleDetected`] if a node repeats or the chain is
    ///   longer than the depth bound
    pub async fn original_of<I: Shareable>(&self, id: I) -> Result<EntityRef<I>, ResolveError> {
        let kind = I::KIND;
        let start: Uuid = id.into();
        let clone_event = clone_event_of(kind, start)?;

        let mut node = start;
        let mut visited = HashSet::from([node]);
        let mut hops: usize = 0;
        loop {
            let predicate = Predicate::new().eq(kind.id_field(), node);
            let found = self
                .log
                .latest_matching(&[clone_event], &predicate)
                .await
                .map_err(ResolveError::storage("original_of"))?;

            let Some(event) = found else {
                let family = self.projector().family_of(kind, node).await?;
                debug!(kind = %kind, id = %start, original = %node, hops, "Resolved original");
                return Ok(EntityRef::new(I::from(node), family));
            };

            let link = clone_link(&event, kind, node)?;
            hops = hops.checked_add(1).ok_or(ResolveError::CycleDetected {
                kind,
                id: start,
                depth: hops,
            })?;
            if hops > self.max_depth || !visited.insert(link.source_id) {
                return Err(ResolveError::CycleDetected {
                    kind,
                    id: start,
                    depth: hops,
                });
            }
            node = link.source_id;
        }
    }

    /// Every entity reachable from `original` by following clone links
    /// downwards, `original` included.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NotFound`] if `original` has no history
    /// - [`ResolveError::CycleDetected`] if the tree is deeper than the
    ///   depth bound
    pub async fn all_clones_of<I: Shareable>(&self, original: I) -> Result<CloneSet<I>, ResolveError> {
        let kind = I::KIND;
        let root: Uuid = original.into();
        let clone_event = clone_event_of(kind, root)?;

        let family = self.projector().family_of(kind, root).await?;
        let mut graph = CloneGraph::with_root(kind, root, family);
        let mut queue = VecDeque::from([0_usize]);

        while let Some(slot) = queue.pop_front() {
            let Some(node) = graph.node(slot).copied() else {
                continue;
            };

            let predicate = Predicate::new().eq(kind.cloned_from_field(), node.id);
            let children = self
                .log
                .all_matching(&[clone_event], &predicate)
                .await
                .map_err(ResolveError::storage("all_clones_of"))?;

            for event in &children {
                let link = clone_link(event, kind, node.id)?;
                if graph.contains(link.id) {
                    continue;
                }
                if node.depth >= self.max_depth {
                    return Err(ResolveError::CycleDetected {
                        kind,
                        id: root,
                        depth: node.depth.saturating_add(1),
                    });
                }
                if let Some(child) = graph.insert_child(slot, link.id, link.family_id) {
                    queue.push_back(child);
                }
            }
        }

        debug!(kind = %kind, original = %root, members = graph.len(), "Collected clone set");

        CloneSet::from_graph(&graph).ok_or(ResolveError::NotFound { kind, id: root })
    }

    /// Every entity sharing an original with `id`, the original first.
    ///
    /// # Errors
    ///
    /// Same as [`CloneResolver::original_of`] and
    /// [`CloneResolver::all_clones_of`].
    pub async fn clones_of<I: Shareable>(&self, id: I) -> Result<CloneSet<I>, ResolveError> {
        let original = self.original_of(id).await?;
        self.all_clones_of(original.id).await
    }

    /// The ID under which `id` is visible in `family`, creating a clone if
    /// none exists yet.
    ///
    /// Returns `id` itself if it already lives in `family`, or the existing
    /// clone there. Otherwise appends a clone of the original carrying its
    /// current attributes and registers it with the visibility index.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::NotFound`] if `id` has no history
    /// - [`ResolveError::InconsistentHistory`] if the clone key is taken but
    ///   no clone in `family` can be found
    /// - [`ResolveError::Storage`] if the log fails
    pub async fn ensure_clone_in_family<I: Shareable>(
        &self,
        id: I,
        family: FamilyId,
        user: UserId,
    ) -> Result<I, ResolveError> {
        let kind = I::KIND;
        if self.projector().family_of_entity(id).await? == family {
            return Ok(id);
        }

        let original = self.original_of(id).await?;
        if let Some(existing) = self.all_clones_of(original.id).await?.in_family(family) {
            debug!(kind = %kind, id = %id, clone = %existing.id, family_id = %family, "Clone already exists");
            return Ok(existing.id);
        }

        let clone_id = Uuid::now_v7();
        let draft = self
            .draft_clone(kind, original.id.into(), original.family_id, clone_id, family, user)
            .await?;
        let unique_key = clone_key(kind, original.id.into(), family);
        let event = NewEvent::from_payload(&draft.payload)
            .map_err(|e| ResolveError::storage("ensure_clone_in_family")(LogError::from(e)))?
            .with_unique_key(unique_key);

        match self.log.append(event).await {
            Ok(stored) => {
                info!(
                    kind = %kind,
                    original = %original.id,
                    clone = %clone_id,
                    family_id = %family,
                    seq = stored.seq,
                    "Created clone"
                );
                self.register_visibility(clone_id, kind, draft.title, family).await;
                Ok(I::from(clone_id))
            }
            Err(LogError::Conflict { key }) => {
                debug!(kind = %kind, key = %key, "Clone key taken, reading winner");
                let winner = self.all_clones_of(original.id).await?.in_family(family);
                winner.map(|m| m.id).ok_or_else(|| {
                    ResolveError::inconsistent(
                        kind,
                        original.id.into(),
                        format!("clone key {key} is taken but no clone in family {family} is reachable"),
                    )
                })
            }
            Err(source) => Err(ResolveError::Storage {
                operation: "ensure_clone_in_family",
                source,
            }),
        }
    }

    /// The unique key a clone event described by `link` must carry. The key
    /// names the original behind the link's source, so clones of clones
    /// share a key with direct clones in the same family.
    ///
    /// # Errors
    ///
    /// Same as [`CloneResolver::original_of`].
    pub async fn clone_key_of(&self, link: &CloneLink) -> Result<String, ResolveError> {
        let original: Uuid = match link.kind {
            EntityKind::Person => self.original_of(PersonId::from(link.source_id)).await?.id.into(),
            EntityKind::Photo => self.original_of(PhotoId::from(link.source_id)).await?.id.into(),
            EntityKind::Thread => self.original_of(ThreadId::from(link.source_id)).await?.id.into(),
            EntityKind::Family => {
                return Err(ResolveError::inconsistent(
                    link.kind,
                    link.id,
                    "families are never cloned",
                ));
            }
        };
        Ok(clone_key(link.kind, original, link.family_id))
    }

    /// Build the clone event for `original` from its current projection.
    async fn draft_clone(
        &self,
        kind: EntityKind,
        original: Uuid,
        original_family: FamilyId,
        clone_id: Uuid,
        family: FamilyId,
        user: UserId,
    ) -> Result<CloneDraft, ResolveError> {
        let projector = self.projector();
        match kind {
            EntityKind::Person => {
                let person = PersonId::from(original);
                let profile = projector.person_profile(person).await?;
                let profile_picture = self
                    .faces
                    .resolve_face_and_photo_for_person(user, person)
                    .await?;
                Ok(CloneDraft {
                    title: profile.name.clone(),
                    payload: EventPayload::PersonClonedForSharing(PersonClonedForSharing {
                        person_id: PersonId::from(clone_id),
                        family_id: family,
                        name: profile.name,
                        profile_picture,
                        cloned_from: PersonSource {
                            person_id: person,
                            family_id: original_family,
                        },
                        user_id: user,
                    }),
                })
            }
            EntityKind::Photo => {
                let photo = PhotoId::from(original);
                let details = projector.photo_details(photo).await?;
                Ok(CloneDraft {
                    title: details.caption.clone(),
                    payload: EventPayload::PhotoClonedForSharing(PhotoClonedForSharing {
                        photo_id: PhotoId::from(clone_id),
                        family_id: family,
                        location: details.location,
                        caption: details.caption,
                        date_taken: details.date_taken,
                        cloned_from: PhotoSource {
                            photo_id: photo,
                            family_id: original_family,
                        },
                        user_id: user,
                    }),
                })
            }
            EntityKind::Thread => {
                let thread = ThreadId::from(original);
                let details = projector.thread_details(thread).await?;
                Ok(CloneDraft {
                    title: details.title.clone(),
                    payload: EventPayload::ThreadClonedForSharing(ThreadClonedForSharing {
                        thread_id: ThreadId::from(clone_id),
                        family_id: family,
                        title: details.title,
                        cloned_from: ThreadSource {
                            thread_id: thread,
                            family_id: original_family,
                        },
                        user_id: user,
                    }),
                })
            }
            EntityKind::Family => Err(ResolveError::inconsistent(
                kind,
                original,
                "families are never cloned",
            )),
        }
    }

    async fn register_visibility(&self, clone_id: Uuid, kind: EntityKind, title: String, family: FamilyId) {
        let attributes = SearchableAttributes { kind, title };
        if let Err(err) = self
            .visibility
            .register_visibility(clone_id, family, &attributes)
            .await
        {
            warn!(
                kind = %kind,
                clone = %clone_id,
                family_id = %family,
                error = %err,
                "Visibility registration failed, clone kept"
            );
        }
    }
}

/// Key held by the single clone of `original` allowed in `family`.
pub fn clone_key(kind: EntityKind, original: Uuid, family: FamilyId) -> String {
    format!("{}:{}:{}", kind.name(), original, family)
}

/// A clone event ready to append, with the text to index.
struct CloneDraft {
    payload: EventPayload,
    title: String,
}

fn clone_event_of(kind: EntityKind, id: Uuid) -> Result<EventType, ResolveError> {
    kind.clone_event()
        .ok_or_else(|| ResolveError::inconsistent(kind, id, "families are never cloned"))
}

fn clone_link(event: &Event, kind: EntityKind, id: Uuid) -> Result<CloneLink, ResolveError> {
    let payload = event.decode().map_err(|source| ResolveError::Payload {
        seq: event.seq,
        source,
    })?;
    payload.clone_link().ok_or_else(|| {
        ResolveError::inconsistent(
            kind,
            id,
            format!("event {} at {} is not a clone event", event.event_type, event.seq),
        )
    })
}
