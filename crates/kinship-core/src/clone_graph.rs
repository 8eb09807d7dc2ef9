//! Arena representation of one clone tree.
//!
//! Nodes live in a `Vec` and refer to their parent by index; an id-to-index
//! map deduplicates. The tree is rebuilt from the log for every query.

use std::collections::HashMap;

use kinship_types::{EntityKind, EntityRef, FamilyId, Shareable};
use uuid::Uuid;

/// One entity in a clone tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloneNode {
    /// The entity's ID.
    pub id: Uuid,
    /// The family it lives in.
    pub family_id: FamilyId,
    /// Arena index of the entity it was cloned from. `None` for the original.
    pub parent: Option<usize>,
    /// Number of clone links between this node and the original.
    pub depth: usize,
}

/// A clone tree rooted at an original.
#[derive(Debug, Clone)]
pub struct CloneGraph {
    kind: EntityKind,
    nodes: Vec<CloneNode>,
    index: HashMap<Uuid, usize>,
}

impl CloneGraph {
    /// A graph holding only the original.
    pub fn with_root(kind: EntityKind, id: Uuid, family_id: FamilyId) -> Self {
        let root = CloneNode {
            id,
            family_id,
            parent: None,
            depth: 0,
        };
        Self {
            kind,
            nodes: vec![root],
            index: HashMap::from([(id, 0)]),
        }
    }

    /// Kind of every entity in the graph.
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Attach `id` as a clone of the node at `parent`.
    ///
    /// Returns the new node's index, or `None` if `id` is already in the
    /// graph or `parent` is out of range.
    pub fn insert_child(&mut self, parent: usize, id: Uuid, family_id: FamilyId) -> Option<usize> {
        if self.index.contains_key(&id) {
            return None;
        }
        let depth = self.nodes.get(parent)?.depth.checked_add(1)?;
        let slot = self.nodes.len();
        self.nodes.push(CloneNode {
            id,
            family_id,
            parent: Some(parent),
            depth,
        });
        self.index.insert(id, slot);
        Some(slot)
    }

    /// The node at `slot`.
    pub fn node(&self, slot: usize) -> Option<&CloneNode> {
        self.nodes.get(slot)
    }

    /// Whether `id` is in the graph.
    pub fn contains(&self, id: Uuid) -> bool {
        self.index.contains_key(&id)
    }

    /// Number of nodes, original included.
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a graph holds at least its root.
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The first node (in discovery order) living in `family`.
    pub fn find_in_family(&self, family: FamilyId) -> Option<&CloneNode> {
        self.nodes.iter().find(|n| n.family_id == family)
    }

    /// All nodes in discovery order, the original first.
    pub const fn nodes(&self) -> &[CloneNode] {
        self.nodes.as_slice()
    }
}

/// Every entity sharing one original, with typed IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneSet<I> {
    original: EntityRef<I>,
    members: Vec<EntityRef<I>>,
}

impl<I: Shareable> CloneSet<I> {
    /// Type the nodes of `graph`.
    pub fn from_graph(graph: &CloneGraph) -> Option<Self> {
        let members: Vec<EntityRef<I>> = graph
            .nodes()
            .iter()
            .map(|n| EntityRef::new(I::from(n.id), n.family_id))
            .collect();
        let original = *members.first()?;
        Some(Self { original, members })
    }

    /// The canonical original.
    pub const fn original(&self) -> EntityRef<I> {
        self.original
    }

    /// All members, the original first, then clones in breadth-first order.
    pub const fn members(&self) -> &[EntityRef<I>] {
        self.members.as_slice()
    }

    /// Number of members, original included.
    pub const fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false: a set holds at least its original.
    pub const fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: I) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    /// The member living in `family`, if any.
    pub fn in_family(&self, family: FamilyId) -> Option<EntityRef<I>> {
        self.members.iter().find(|m| m.family_id == family).copied()
    }

    /// Member IDs in sorted order, for set comparisons.
    pub fn sorted_ids(&self) -> Vec<I> {
        let mut ids: Vec<I> = self.members.iter().map(|m| m.id).collect();
        ids.sort_unstable();
        ids
    }
}
