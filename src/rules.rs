//! Rule engine: decides when relationships form and which effects fire.
//!
//! DESIGN
//! ======
//! Rules are held in one list sorted by descending priority; equal priorities
//! keep registration order. Matching walks the list and the first rule whose
//! every condition holds wins, so priority is the only tie-break. Propagation
//! asks the graph for a parent's child relationships and runs each effect that
//! reacts to the change type through its handler.

#[cfg(test)]
#[path = "rules_test.rs"]
mod rules_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::effects::{ChangeContext, handler_for};
use crate::graph::RelationshipGraph;
use crate::relationship::{ChangeType, OverlapType, RelationshipMetadata, RelationshipRule, ShapeRelationship};
use crate::shape::{Shape, ShapeId, ShapeMap};

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("malformed rule table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Lifecycle event reported to [`RuleEngine::on_relationship_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipAction {
    Added,
    Removed,
}

#[derive(Debug, Default)]
pub struct RuleEngine {
    rules: Vec<RelationshipRule>,
}

impl RuleEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Insert a rule behind every rule of equal or higher priority.
    pub fn register_rule(&mut self, rule: RelationshipRule) {
        let at = self.rules.partition_point(|r| r.priority >= rule.priority);
        debug!(rule = %rule.id, priority = rule.priority, position = at, "rule registered");
        self.rules.insert(at, rule);
    }

    pub fn register_rules(&mut self, rules: impl IntoIterator<Item = RelationshipRule>) {
        for rule in rules {
            self.register_rule(rule);
        }
    }

    /// Register every rule in a JSON array. Returns how many were added.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Parse`] if the input is not an array of rules;
    /// nothing is registered in that case.
    pub fn register_rules_json(&mut self, json: &str) -> Result<usize, RuleError> {
        let rules: Vec<RelationshipRule> = serde_json::from_str(json)?;
        let count = rules.len();
        self.register_rules(rules);
        Ok(count)
    }

    /// Remove a rule by id, returning it if it was registered.
    pub fn unregister_rule(&mut self, id: &str) -> Option<RelationshipRule> {
        let at = self.rules.iter().position(|r| r.id == id)?;
        Some(self.rules.remove(at))
    }

    /// Rules in matching order.
    #[must_use]
    pub fn get_rules(&self) -> &[RelationshipRule] {
        &self.rules
    }

    #[must_use]
    pub fn get_rule(&self, id: &str) -> Option<&RelationshipRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    // =========================================================================
    // MATCHING
    // =========================================================================

    /// Highest-priority rule that would relate `parent` to `child` given how
    /// they overlap and the relationships already recorded for the child.
    #[must_use]
    pub fn check_overlap(
        &self,
        parent: &Shape,
        child: &Shape,
        overlap: OverlapType,
        existing: &[ShapeRelationship],
    ) -> Option<&RelationshipRule> {
        let found = self.rules.iter().find(|rule| {
            rule.can_form_on_overlap
                && rule.parent_type.matches(parent.kind)
                && rule.child_type.matches(child.kind)
                && rule.overlap_condition == overlap
                && (rule.allow_multiple_parents || !existing.iter().any(|rel| rel.child_id == child.id))
                && rule.validate.is_none_or(|validate| validate(parent, child, existing))
        });
        if let Some(rule) = found {
            debug!(rule = %rule.id, parent = %parent.id, child = %child.id, ?overlap, "rule matched");
        }
        found
    }

    /// Build a relationship from a rule's template.
    #[must_use]
    pub fn create_relationship(
        &self,
        parent_id: ShapeId,
        child_id: ShapeId,
        rule: &RelationshipRule,
        metadata: Option<RelationshipMetadata>,
    ) -> ShapeRelationship {
        let mut rel = ShapeRelationship::new(rule.kind, parent_id, child_id, rule.effects.clone());
        rel.constraints.clone_from(&rule.constraints);
        rel.metadata = metadata;
        rel
    }

    // =========================================================================
    // PROPAGATION
    // =========================================================================

    /// Run every effect under `parent_id` that reacts to `change`.
    ///
    /// Results are collected per (relationship, effect) pair in index order;
    /// each handler sees the child as it is in `shapes`. Returns nothing when
    /// the parent is not in `shapes`.
    #[must_use]
    pub fn apply_effects_to_children(
        &self,
        graph: &RelationshipGraph,
        parent_id: &ShapeId,
        change: ChangeType,
        context: &ChangeContext,
        shapes: &ShapeMap,
    ) -> Vec<Shape> {
        let Some(parent) = shapes.get(parent_id) else {
            return Vec::new();
        };
        let mut updates = Vec::new();
        for rel in graph.get_child_relationships(parent_id) {
            let Some(child) = shapes.get(&rel.child_id) else {
                continue;
            };
            for effect in rel.effects.iter().filter(|e| e.kind.applies_to(change)) {
                let config = context.overlay(effect.config.as_ref());
                let handler = handler_for(effect.kind);
                if let Some(updated) = handler(parent, child, config.as_ref(), shapes) {
                    debug!(relationship = %rel.id, effect = ?effect.kind, ?change, child = %child.id, "effect applied");
                    updates.push(updated);
                }
            }
        }
        updates
    }

    /// React to a relationship being added or removed.
    ///
    /// A new relationship gets one pass of all its effects with their stored
    /// settings. Removal undoes nothing; the child simply stops following.
    #[must_use]
    pub fn on_relationship_changed(
        &self,
        relation: &ShapeRelationship,
        action: RelationshipAction,
        shapes: &ShapeMap,
    ) -> Vec<Shape> {
        if action == RelationshipAction::Removed {
            return Vec::new();
        }
        let (Some(parent), Some(child)) = (shapes.get(&relation.parent_id), shapes.get(&relation.child_id)) else {
            return Vec::new();
        };
        relation
            .effects
            .iter()
            .filter_map(|effect| handler_for(effect.kind)(parent, child, effect.config.as_ref(), shapes))
            .collect()
    }
}
