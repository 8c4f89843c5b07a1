//! Relationship graph: indexed storage of parent/child edges.
//!
//! DESIGN
//! ======
//! Records live in one id-keyed map. Three inverted indices (parent → ids,
//! child → ids, type → ids) give constant-time lookup in every direction.
//! All containers are insertion-ordered so traversal and propagation order is
//! deterministic. The graph only stores; it never refuses an edge. Callers that
//! need acyclicity ask [`RelationshipGraph::would_create_cycle`] before
//! inserting.

#[cfg(test)]
#[path = "graph_test.rs"]
mod graph_test;

use std::collections::BTreeMap;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::debug;

use crate::relationship::{RelationType, RelationshipId, ShapeRelationship};
use crate::shape::ShapeId;

/// Summary counts over the whole graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub total_relationships: usize,
    pub by_type: BTreeMap<RelationType, usize>,
    /// Relationships per distinct parent; 0 when the graph is empty.
    pub avg_children_per_parent: f64,
}

#[derive(Debug, Default)]
pub struct RelationshipGraph {
    relationships: IndexMap<RelationshipId, ShapeRelationship>,
    by_parent: IndexMap<ShapeId, IndexSet<RelationshipId>>,
    by_child: IndexMap<ShapeId, IndexSet<RelationshipId>>,
    by_type: IndexMap<RelationType, IndexSet<RelationshipId>>,
}

impl RelationshipGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Insert a relationship and index it. An existing record with the same id
    /// is replaced.
    pub fn add_relationship(&mut self, rel: ShapeRelationship) {
        if self.relationships.contains_key(&rel.id) {
            self.remove_relationship(&rel.id);
        }
        debug!(id = %rel.id, parent = %rel.parent_id, child = %rel.child_id, kind = ?rel.kind, "relationship added");
        self.by_parent.entry(rel.parent_id).or_default().insert(rel.id);
        self.by_child.entry(rel.child_id).or_default().insert(rel.id);
        self.by_type.entry(rel.kind).or_default().insert(rel.id);
        self.relationships.insert(rel.id, rel);
    }

    /// Remove a relationship from the map and every index. Returns `false` if
    /// the id is unknown.
    pub fn remove_relationship(&mut self, id: &RelationshipId) -> bool {
        let Some(rel) = self.relationships.shift_remove(id) else {
            return false;
        };
        unindex(&mut self.by_parent, &rel.parent_id, id);
        unindex(&mut self.by_child, &rel.child_id, id);
        unindex(&mut self.by_type, &rel.kind, id);
        debug!(%id, "relationship removed");
        true
    }

    pub fn clear(&mut self) {
        self.relationships.clear();
        self.by_parent.clear();
        self.by_child.clear();
        self.by_type.clear();
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    #[must_use]
    pub fn get(&self, id: &RelationshipId) -> Option<&ShapeRelationship> {
        self.relationships.get(id)
    }

    /// Relationships where `parent_id` is the parent, in insertion order.
    #[must_use]
    pub fn get_child_relationships(&self, parent_id: &ShapeId) -> Vec<&ShapeRelationship> {
        self.materialize(self.by_parent.get(parent_id))
    }

    /// Relationships where `child_id` is the child, in insertion order.
    #[must_use]
    pub fn get_parent_relationships(&self, child_id: &ShapeId) -> Vec<&ShapeRelationship> {
        self.materialize(self.by_child.get(child_id))
    }

    #[must_use]
    pub fn get_relationships_by_type(&self, kind: RelationType) -> Vec<&ShapeRelationship> {
        self.materialize(self.by_type.get(&kind))
    }

    /// Whether any edge `parent_id -> child_id` exists, optionally of one type.
    #[must_use]
    pub fn has_relationship(&self, parent_id: &ShapeId, child_id: &ShapeId, kind: Option<RelationType>) -> bool {
        self.get_child_relationships(parent_id)
            .iter()
            .any(|rel| rel.child_id == *child_id && kind.is_none_or(|k| rel.kind == k))
    }

    fn materialize(&self, ids: Option<&IndexSet<RelationshipId>>) -> Vec<&ShapeRelationship> {
        ids.map(|ids| ids.iter().filter_map(|id| self.relationships.get(id)).collect())
            .unwrap_or_default()
    }

    // =========================================================================
    // TRAVERSAL
    // =========================================================================

    /// Would adding `parent_id -> child_id` close a loop?
    ///
    /// True when `parent_id` is already reachable from `child_id` along child
    /// edges, including the trivial case `parent_id == child_id`.
    #[must_use]
    pub fn would_create_cycle(&self, parent_id: &ShapeId, child_id: &ShapeId) -> bool {
        let mut stack = vec![*child_id];
        let mut visited: IndexSet<ShapeId> = IndexSet::new();
        while let Some(current) = stack.pop() {
            if current == *parent_id {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for rel in self.get_child_relationships(&current) {
                if !visited.contains(&rel.child_id) {
                    stack.push(rel.child_id);
                }
            }
        }
        false
    }

    /// Walk up the first matching parent of each shape, nearest first.
    ///
    /// Follows a single chain, not every parent. Stops when no parent matches
    /// or a shape repeats.
    #[must_use]
    pub fn get_ancestors(&self, id: &ShapeId, kind: Option<RelationType>) -> Vec<ShapeId> {
        let mut out = Vec::new();
        let mut seen: IndexSet<ShapeId> = IndexSet::from([*id]);
        let mut current = *id;
        loop {
            let next = self
                .get_parent_relationships(&current)
                .into_iter()
                .find(|rel| kind.is_none_or(|k| rel.kind == k))
                .map(|rel| rel.parent_id);
            let Some(parent) = next else {
                break;
            };
            if !seen.insert(parent) {
                break;
            }
            out.push(parent);
            current = parent;
        }
        out
    }

    /// Every shape reachable along child edges, each once, in discovery order.
    ///
    /// Never includes `id` itself, even when a cycle leads back to it.
    #[must_use]
    pub fn get_descendants(&self, id: &ShapeId, kind: Option<RelationType>) -> Vec<ShapeId> {
        let mut found: IndexSet<ShapeId> = IndexSet::new();
        let mut stack = vec![*id];
        while let Some(current) = stack.pop() {
            for rel in self.get_child_relationships(&current) {
                if kind.is_some_and(|k| rel.kind != k) || rel.child_id == *id {
                    continue;
                }
                if found.insert(rel.child_id) {
                    stack.push(rel.child_id);
                }
            }
        }
        found.into_iter().collect()
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    #[must_use]
    pub fn get_stats(&self) -> GraphStats {
        let by_type = self
            .by_type
            .iter()
            .map(|(kind, ids)| (*kind, ids.len()))
            .collect();
        let parents = self.by_parent.len();
        #[allow(clippy::cast_precision_loss)]
        let avg_children_per_parent = if parents == 0 { 0.0 } else { self.relationships.len() as f64 / parents as f64 };
        GraphStats { total_relationships: self.relationships.len(), by_type, avg_children_per_parent }
    }

    /// All relationships in insertion order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<ShapeRelationship> {
        self.relationships.values().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}

/// Drop `id` from the set under `key`, removing the set once it is empty.
fn unindex<K: Hash + Eq>(index: &mut IndexMap<K, IndexSet<RelationshipId>>, key: &K, id: &RelationshipId) {
    if let Some(ids) = index.get_mut(key) {
        ids.shift_remove(id);
        if ids.is_empty() {
            index.shift_remove(key);
        }
    }
}
