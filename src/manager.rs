//! Relationship manager: the store-facing entry point.
//!
//! DESIGN
//! ======
//! The graph and rule engine are permissive: the graph accepts
//! any edge and the engine only answers questions. This module is the caller
//! side that the host store talks to. It checks shape ids against the current
//! snapshot, consults the rules when shapes overlap, guards against cycles
//! when configured to, and turns one parent mutation into the full set of
//! dependent shape updates. It never writes shapes itself; every operation
//! returns the updates for the store to apply (and to record for undo).

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::config::RelationsConfig;
use crate::consts::GROUP_CONTAINMENT_RULE;
use crate::effects::ChangeContext;
use crate::graph::RelationshipGraph;
use crate::overlap;
use crate::relationship::{ChangeType, EffectType, RelationType, RelationshipEffect, ShapeRelationship};
use crate::rules::{RelationshipAction, RuleEngine};
use crate::shape::{Extent, Shape, ShapeId, ShapeMap};
use crate::standard_rules::standard_rules;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RelationError {
    #[error("shape not found: {0}")]
    UnknownShape(ShapeId),
    #[error("relationship {parent} -> {child} would create a cycle")]
    Cycle { parent: ShapeId, child: ShapeId },
    #[error("shape {child} is already contained by {parent}")]
    AlreadyContained { child: ShapeId, parent: ShapeId },
}

/// A relationship that was just recorded, plus the child updates its
/// effects produced on first application.
#[derive(Debug, Clone)]
pub struct LinkOutcome {
    pub relationship: ShapeRelationship,
    pub updates: Vec<Shape>,
}

#[derive(Debug)]
pub struct RelationshipManager {
    config: RelationsConfig,
    graph: RelationshipGraph,
    engine: RuleEngine,
}

impl Default for RelationshipManager {
    fn default() -> Self {
        Self::new(RelationsConfig::default())
    }
}

impl RelationshipManager {
    #[must_use]
    pub fn new(config: RelationsConfig) -> Self {
        let mut engine = RuleEngine::new();
        if config.standard_rules {
            engine.register_rules(standard_rules());
        }
        Self { config, graph: RelationshipGraph::new(), engine }
    }

    #[must_use]
    pub fn config(&self) -> &RelationsConfig {
        &self.config
    }

    #[must_use]
    pub fn graph(&self) -> &RelationshipGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut RelationshipGraph {
        &mut self.graph
    }

    #[must_use]
    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut RuleEngine {
        &mut self.engine
    }

    // =========================================================================
    // LINKING
    // =========================================================================

    /// Record an explicit relationship between two existing shapes.
    ///
    /// # Errors
    ///
    /// Returns `UnknownShape` if either id is missing from `shapes`, and
    /// `Cycle` if acyclicity is enforced and the edge would close a loop.
    pub fn link(
        &mut self,
        parent_id: ShapeId,
        child_id: ShapeId,
        kind: RelationType,
        effects: Vec<RelationshipEffect>,
        shapes: &ShapeMap,
    ) -> Result<LinkOutcome, RelationError> {
        require(shapes, parent_id)?;
        require(shapes, child_id)?;
        self.insert(ShapeRelationship::new(kind, parent_id, child_id, effects), shapes)
    }

    /// Form a relationship from overlap alone, if a rule allows it.
    ///
    /// Declines (returns `Ok(None)`) when auto-linking is off, the shapes do
    /// not overlap, no rule matches, the same relationship already exists, or
    /// the edge would close a cycle.
    ///
    /// # Errors
    ///
    /// Returns `UnknownShape` if either id is missing from `shapes`.
    pub fn try_auto_link(
        &mut self,
        parent_id: ShapeId,
        child_id: ShapeId,
        shapes: &ShapeMap,
    ) -> Result<Option<LinkOutcome>, RelationError> {
        let parent = require(shapes, parent_id)?;
        let child = require(shapes, child_id)?;
        if !self.config.auto_link {
            return Ok(None);
        }
        let Some(overlap) = overlap::classify(parent, child) else {
            return Ok(None);
        };
        let existing: Vec<ShapeRelationship> =
            self.graph.get_parent_relationships(&child_id).into_iter().cloned().collect();
        let Some(rule) = self.engine.check_overlap(parent, child, overlap, &existing) else {
            return Ok(None);
        };
        if self.graph.has_relationship(&parent_id, &child_id, Some(rule.kind)) {
            return Ok(None);
        }
        if self.config.enforce_acyclic && self.graph.would_create_cycle(&parent_id, &child_id) {
            debug!(parent = %parent_id, child = %child_id, rule = %rule.id, "auto-link declined: cycle");
            return Ok(None);
        }
        let rel = self.engine.create_relationship(parent_id, child_id, rule, None);
        Ok(Some(self.record(rel, shapes)))
    }

    fn insert(&mut self, rel: ShapeRelationship, shapes: &ShapeMap) -> Result<LinkOutcome, RelationError> {
        if self.config.enforce_acyclic && self.graph.would_create_cycle(&rel.parent_id, &rel.child_id) {
            warn!(parent = %rel.parent_id, child = %rel.child_id, kind = ?rel.kind, "relationship rejected: cycle");
            return Err(RelationError::Cycle { parent: rel.parent_id, child: rel.child_id });
        }
        Ok(self.record(rel, shapes))
    }

    fn record(&mut self, rel: ShapeRelationship, shapes: &ShapeMap) -> LinkOutcome {
        let updates = self.engine.on_relationship_changed(&rel, RelationshipAction::Added, shapes);
        self.graph.add_relationship(rel.clone());
        LinkOutcome { relationship: rel, updates }
    }

    // =========================================================================
    // GROUPING
    // =========================================================================

    /// Make `group_id` the container of every member. Members already in the
    /// group are skipped. Nothing is recorded unless every member is valid.
    ///
    /// Effects and the parent limit come from the `group-containment` rule
    /// when registered. Without it, members move and rotate with the group and
    /// may belong to one group only.
    ///
    /// # Errors
    ///
    /// Returns `UnknownShape` for a missing group or member, `AlreadyContained`
    /// if a member sits in another group and the containment rule allows a
    /// single parent, and `Cycle` if a member already (transitively) contains
    /// the group.
    pub fn group(
        &mut self,
        group_id: ShapeId,
        member_ids: &[ShapeId],
        shapes: &ShapeMap,
    ) -> Result<Vec<LinkOutcome>, RelationError> {
        require(shapes, group_id)?;
        let template = self.engine.get_rule(GROUP_CONTAINMENT_RULE);
        let single_parent = template.is_none_or(|rule| !rule.allow_multiple_parents);
        let effects = template.map_or_else(
            || {
                vec![
                    RelationshipEffect::new(EffectType::MoveWithParent),
                    RelationshipEffect::new(EffectType::RotateWithParent),
                ]
            },
            |rule| rule.effects.clone(),
        );

        let mut pending = Vec::new();
        for member in member_ids {
            require(shapes, *member)?;
            if pending.contains(member) || self.graph.has_relationship(&group_id, member, Some(RelationType::Containment)) {
                continue;
            }
            if single_parent {
                let other = self
                    .graph
                    .get_parent_relationships(member)
                    .into_iter()
                    .find(|rel| rel.kind == RelationType::Containment)
                    .map(|rel| rel.parent_id);
                if let Some(current) = other {
                    warn!(group = %group_id, member = %member, %current, "grouping rejected: member already contained");
                    return Err(RelationError::AlreadyContained { child: *member, parent: current });
                }
            }
            if self.config.enforce_acyclic && self.graph.would_create_cycle(&group_id, member) {
                return Err(RelationError::Cycle { parent: group_id, child: *member });
            }
            pending.push(*member);
        }

        let outcomes: Vec<LinkOutcome> = pending
            .into_iter()
            .map(|member| {
                let rel = ShapeRelationship::new(RelationType::Containment, group_id, member, effects.clone());
                self.record(rel, shapes)
            })
            .collect();
        info!(group = %group_id, members = outcomes.len(), "shapes grouped");
        Ok(outcomes)
    }

    /// Dissolve a group, returning the containment relationships removed.
    pub fn ungroup(&mut self, group_id: &ShapeId) -> Vec<ShapeRelationship> {
        let doomed: Vec<ShapeRelationship> = self
            .graph
            .get_child_relationships(group_id)
            .into_iter()
            .filter(|rel| rel.kind == RelationType::Containment)
            .cloned()
            .collect();
        for rel in &doomed {
            self.graph.remove_relationship(&rel.id);
        }
        info!(group = %group_id, members = doomed.len(), "group dissolved");
        doomed
    }

    /// Forget every relationship touching a deleted shape. Returns how many
    /// were removed.
    pub fn remove_shape(&mut self, shape_id: &ShapeId) -> usize {
        let mut ids: Vec<_> = self.graph.get_child_relationships(shape_id).iter().map(|rel| rel.id).collect();
        ids.extend(self.graph.get_parent_relationships(shape_id).iter().map(|rel| rel.id));
        let removed = ids.iter().filter(|id| self.graph.remove_relationship(id)).count();
        info!(shape = %shape_id, removed, "relationships dropped for shape");
        removed
    }

    // =========================================================================
    // PROPAGATION
    // =========================================================================

    /// Turn one shape mutation into every dependent update, cascading through
    /// children of children up to the configured depth.
    ///
    /// Each shape is re-derived at most once per call, so cycles terminate.
    /// Within one cascade level the first parent to reach a child owns it; a
    /// later parent in the same level leaves that child alone. Successive
    /// change types from the same parent build on each other. Returned shapes
    /// are in first-touched order and carry their final state.
    #[must_use]
    pub fn propagate_change(&self, before: &Shape, after: &Shape, shapes: &ShapeMap) -> Vec<Shape> {
        let mut working = shapes.clone();
        working.insert(after.id, after.clone());
        let mut updated: IndexMap<ShapeId, Shape> = IndexMap::new();
        let mut visited: HashSet<ShapeId> = HashSet::from([after.id]);
        let mut frontier = vec![(before.clone(), after.clone())];

        for _ in 0..self.config.max_cascade_depth {
            if frontier.is_empty() {
                break;
            }
            let mut touched: IndexMap<ShapeId, Shape> = IndexMap::new();
            let mut claimed: HashSet<ShapeId> = HashSet::new();
            for (old, new) in &frontier {
                let context = ChangeContext::between(old, new);
                let mut derived: Vec<ShapeId> = Vec::new();
                for change in detect_changes(old, new) {
                    let children = self.engine.apply_effects_to_children(&self.graph, &new.id, change, &context, &working);
                    for child in children {
                        if visited.contains(&child.id) || claimed.contains(&child.id) {
                            continue;
                        }
                        if let Some(prior) = working.insert(child.id, child.clone()) {
                            touched.entry(child.id).or_insert(prior);
                        }
                        derived.push(child.id);
                        updated.insert(child.id, child);
                    }
                }
                claimed.extend(derived);
            }
            frontier = touched
                .into_iter()
                .filter_map(|(id, prior)| {
                    visited.insert(id);
                    working.get(&id).map(|current| (prior, current.clone()))
                })
                .collect();
        }

        debug!(shape = %after.id, updates = updated.len(), "change propagated");
        updated.into_values().collect()
    }
}

/// Which kinds of change separate two versions of a shape, in the order they
/// should be propagated.
#[must_use]
pub fn detect_changes(before: &Shape, after: &Shape) -> Vec<ChangeType> {
    let mut changes = Vec::new();
    if before.x != after.x || before.y != after.y {
        changes.push(ChangeType::Position);
    }
    if span(before) != span(after) {
        changes.push(ChangeType::Size);
    }
    if before.rotation != after.rotation {
        changes.push(ChangeType::Rotation);
    }
    if before.props != after.props {
        changes.push(ChangeType::Style);
    }
    changes
}

/// Box size, or a segment's end offset from its start. Translation leaves it
/// unchanged; moving only one end of a line does not.
fn span(shape: &Shape) -> Option<(f64, f64)> {
    match shape.extent {
        Extent::Box { width, height } => Some((width, height)),
        Extent::Segment { x2, y2 } => Some((x2 - shape.x, y2 - shape.y)),
        Extent::Point => None,
    }
}

fn require(shapes: &ShapeMap, id: ShapeId) -> Result<&Shape, RelationError> {
    shapes.get(&id).ok_or(RelationError::UnknownShape(id))
}
