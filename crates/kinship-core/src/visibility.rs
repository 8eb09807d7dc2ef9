//! Search visibility for newly created clones.
//!
//! After a clone is appended, the resolver tells the search index that the
//! clone may be found by members of its family. Failures here are logged and
//! never undo the clone.

use std::future::Future;

use kinship_types::{EntityKind, FamilyId};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Attributes indexed for a clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchableAttributes {
    /// Kind of the entity.
    pub kind: EntityKind,
    /// Person name, photo caption, or thread title.
    pub title: String,
}

/// Error reported by a [`VisibilityIndex`].
#[derive(Debug, thiserror::Error)]
#[error("visibility registration failed for {entity_id}: {message}")]
pub struct VisibilityError {
    /// The entity being registered.
    pub entity_id: Uuid,
    /// Description of the failure.
    pub message: String,
}

/// A search index that can be told about new entities.
pub trait VisibilityIndex: Send + Sync {
    /// Make `entity_id` findable by members of `family_id`.
    fn register_visibility(
        &self,
        entity_id: Uuid,
        family_id: FamilyId,
        attributes: &SearchableAttributes,
    ) -> impl Future<Output = Result<(), VisibilityError>> + Send;
}

/// Index used when no search backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopVisibilityIndex;

impl VisibilityIndex for NoopVisibilityIndex {
    async fn register_visibility(
        &self,
        entity_id: Uuid,
        family_id: FamilyId,
        attributes: &SearchableAttributes,
    ) -> Result<(), VisibilityError> {
        debug!(
            entity_id = %entity_id,
            kind = %attributes.kind,
            family_id = %family_id,
            "No visibility index configured, skipping registration"
        );
        Ok(())
    }
}

/// A registration recorded by [`InMemoryVisibilityIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// The registered entity.
    pub entity_id: Uuid,
    /// The family whose members may find it.
    pub family_id: FamilyId,
    /// What was indexed.
    pub attributes: SearchableAttributes,
}

/// Index that keeps registrations in memory.
#[derive(Debug, Default)]
pub struct InMemoryVisibilityIndex {
    registrations: Mutex<Vec<Registration>>,
}

impl InMemoryVisibilityIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every registration so far, in call order.
    pub async fn registrations(&self) -> Vec<Registration> {
        self.registrations.lock().await.clone()
    }

    /// Registrations that members of `family` can see.
    pub async fn visible_to(&self, family: FamilyId) -> Vec<Registration> {
        self.registrations
            .lock()
            .await
            .iter()
            .filter(|r| r.family_id == family)
            .cloned()
            .collect()
    }
}

impl VisibilityIndex for InMemoryVisibilityIndex {
    async fn register_visibility(
        &self,
        entity_id: Uuid,
        family_id: FamilyId,
        attributes: &SearchableAttributes,
    ) -> Result<(), VisibilityError> {
        self.registrations.lock().await.push(Registration {
            entity_id,
            family_id,
            attributes: attributes.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_index_filters_by_family() {
        let index = InMemoryVisibilityIndex::new();
        let family = FamilyId::new();
        let attrs = SearchableAttributes {
            kind: EntityKind::Thread,
            title: "Reunion 1988".to_owned(),
        };
        let id = Uuid::now_v7();
        index.register_visibility(id, family, &attrs).await.unwrap();
        index
            .register_visibility(Uuid::now_v7(), FamilyId::new(), &attrs)
            .await
            .unwrap();

        assert_eq!(index.registrations().await.len(), 2);
        let visible = index.visible_to(family).await;
        assert_eq!(visible.len(), 1);
        assert_eq!(visible.first().unwrap().entity_id, id);
    }

    #[tokio::test]
    async fn noop_index_accepts_everything() {
        let attrs = SearchableAttributes {
            kind: EntityKind::Person,
            title: "Ada".to_owned(),
        };
        assert!(
            NoopVisibilityIndex
                .register_visibility(Uuid::now_v7(), FamilyId::new(), &attrs)
                .await
                .is_ok()
        );
    }
}
