//! Default rule table: group membership, shape labels, connectors.

#[cfg(test)]
#[path = "standard_rules_test.rs"]
mod standard_rules_test;

use serde_json::json;

use crate::consts::{GROUP_CONTAINMENT_RULE, LINE_CONNECTION_RULE, SHAPE_LABEL_RULE};
use crate::relationship::{EffectType, OverlapType, RelationType, RelationshipEffect, RelationshipRule, ShapeMatcher};
use crate::shape::ShapeKind;

/// Kinds that can carry a label or anchor a connector.
const BOX_KINDS: [ShapeKind; 7] = [
    ShapeKind::Rectangle,
    ShapeKind::Ellipse,
    ShapeKind::Diamond,
    ShapeKind::Star,
    ShapeKind::Sticky,
    ShapeKind::Frame,
    ShapeKind::Image,
];

/// A group adopts any shape dropped fully inside it.
#[must_use]
pub fn group_containment() -> RelationshipRule {
    RelationshipRule {
        id: GROUP_CONTAINMENT_RULE.to_owned(),
        kind: RelationType::Containment,
        parent_type: ShapeMatcher::Kind(ShapeKind::Group),
        child_type: ShapeMatcher::Any,
        can_form_on_overlap: true,
        overlap_condition: OverlapType::Contains,
        effects: vec![
            RelationshipEffect::new(EffectType::MoveWithParent),
            RelationshipEffect::new(EffectType::RotateWithParent),
        ],
        constraints: None,
        priority: 100,
        allow_multiple_parents: false,
        allow_multiple_children: true,
        validate: None,
    }
}

/// A text whose center lands on a shape becomes that shape's label.
#[must_use]
pub fn shape_label_attachment() -> RelationshipRule {
    RelationshipRule {
        id: SHAPE_LABEL_RULE.to_owned(),
        kind: RelationType::Attachment,
        parent_type: ShapeMatcher::OneOf(BOX_KINDS.to_vec()),
        child_type: ShapeMatcher::Kind(ShapeKind::Text),
        can_form_on_overlap: true,
        overlap_condition: OverlapType::CenterInside,
        effects: vec![
            RelationshipEffect::new(EffectType::MoveWithParent),
            RelationshipEffect::new(EffectType::RotateWithParent),
        ],
        constraints: None,
        priority: 90,
        allow_multiple_parents: false,
        allow_multiple_children: true,
        validate: None,
    }
}

/// A line touching a shape stays glued to its nearest edge. One line may
/// connect several shapes.
#[must_use]
pub fn line_shape_connection() -> RelationshipRule {
    RelationshipRule {
        id: LINE_CONNECTION_RULE.to_owned(),
        kind: RelationType::Connection,
        parent_type: ShapeMatcher::OneOf(BOX_KINDS.to_vec()),
        child_type: ShapeMatcher::OneOf(vec![ShapeKind::Line, ShapeKind::Arrow]),
        can_form_on_overlap: true,
        overlap_condition: OverlapType::Intersects,
        effects: vec![RelationshipEffect::with_config(EffectType::MaintainDistance, json!({ "snap_to_edge": true }))],
        constraints: None,
        priority: 50,
        allow_multiple_parents: true,
        allow_multiple_children: true,
        validate: None,
    }
}

/// All standard rules, highest priority first.
#[must_use]
pub fn standard_rules() -> Vec<RelationshipRule> {
    vec![group_containment(), shape_label_attachment(), line_shape_connection()]
}
