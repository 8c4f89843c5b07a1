//! Relationship records, effect descriptors and rule templates.
//!
//! Everything here is plain data that round-trips through the host document
//! (JSON). Behavior lives in [`crate::graph`], [`crate::rules`] and
//! [`crate::effects`]. The one exception is a rule's optional validator, which
//! is a function pointer and is skipped during serialization.

#[cfg(test)]
#[path = "relationship_test.rs"]
mod relationship_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::shape::{Point, Shape, ShapeId, ShapeKind};

/// Unique identifier for a relationship.
pub type RelationshipId = Uuid;

/// Handler-specific key/value settings attached to an effect.
pub type EffectConfig = Map<String, Value>;

/// Custom admission check run after a rule's declarative conditions match.
pub type RuleValidator = fn(parent: &Shape, child: &Shape, existing: &[ShapeRelationship]) -> bool;

// =============================================================================
// ENUMS
// =============================================================================

/// What a relationship means structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    Containment,
    Attachment,
    Connection,
    Clip,
    Mask,
    Instance,
    Layout,
}

/// A transform applied to a child when its parent changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectType {
    MoveWithParent,
    ResizeWithParent,
    RotateWithParent,
    ClipByParent,
    InheritStyle,
    AutoLayout,
    MaintainDistance,
}

impl EffectType {
    /// Whether this effect reacts to the given kind of parent change.
    #[must_use]
    pub fn applies_to(self, change: ChangeType) -> bool {
        use ChangeType::{Position, Rotation, Size, Style};
        match self {
            Self::MoveWithParent | Self::MaintainDistance => change == Position,
            Self::ResizeWithParent => change == Size,
            Self::RotateWithParent => change == Rotation,
            Self::ClipByParent | Self::AutoLayout => matches!(change, Position | Size),
            Self::InheritStyle => change == Style,
        }
    }
}

/// The kind of mutation a parent went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Position,
    Size,
    Rotation,
    Style,
}

/// Spatial relationship between two bounding boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapType {
    Contains,
    Intersects,
    CenterInside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintType {
    Position,
    Size,
    Style,
    Visibility,
    Lock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintMode {
    Inherit,
    Constrain,
    Sync,
}

// =============================================================================
// RECORDS
// =============================================================================

/// One effect on a relationship, with its handler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEffect {
    #[serde(rename = "type")]
    pub kind: EffectType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EffectConfig>,
}

impl RelationshipEffect {
    /// An effect with no settings; the handler uses its defaults.
    #[must_use]
    pub fn new(kind: EffectType) -> Self {
        Self { kind, config: None }
    }

    /// An effect with settings taken from a JSON object. Non-object values
    /// produce an effect without settings.
    #[must_use]
    pub fn with_config(kind: EffectType, config: Value) -> Self {
        match config {
            Value::Object(map) => Self { kind, config: Some(map) },
            _ => Self::new(kind),
        }
    }
}

/// Rendering constraint carried on a relationship. Not interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipConstraint {
    #[serde(rename = "type")]
    pub kind: ConstraintType,
    pub mode: ConstraintMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
}

/// Optional extras recorded when a relationship forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipMetadata {
    /// Where a connector meets its parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_point: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_hints: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_overrides: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom: Map<String, Value>,
}

/// A directed, typed edge from a parent shape to a child shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRelationship {
    pub id: RelationshipId,
    #[serde(rename = "type")]
    pub kind: RelationType,
    pub parent_id: ShapeId,
    pub child_id: ShapeId,
    #[serde(default)]
    pub effects: Vec<RelationshipEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<RelationshipConstraint>>,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RelationshipMetadata>,
}

impl ShapeRelationship {
    /// A fresh relationship stamped with the current time.
    #[must_use]
    pub fn new(kind: RelationType, parent_id: ShapeId, child_id: ShapeId, effects: Vec<RelationshipEffect>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            parent_id,
            child_id,
            effects,
            constraints: None,
            created_at: now_ms(),
            updated_at: None,
            metadata: None,
        }
    }
}

// =============================================================================
// RULES
// =============================================================================

/// Which shape kinds a rule accepts on one side of the relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeMatcher {
    /// Wildcard.
    Any,
    Kind(ShapeKind),
    OneOf(Vec<ShapeKind>),
}

impl ShapeMatcher {
    #[must_use]
    pub fn matches(&self, kind: ShapeKind) -> bool {
        match self {
            Self::Any => true,
            Self::Kind(k) => *k == kind,
            Self::OneOf(kinds) => kinds.contains(&kind),
        }
    }
}

/// Declarative template that can produce relationships.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipRule {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RelationType,
    pub parent_type: ShapeMatcher,
    pub child_type: ShapeMatcher,
    /// Whether the rule takes part in automatic formation at all.
    pub can_form_on_overlap: bool,
    pub overlap_condition: OverlapType,
    #[serde(default)]
    pub effects: Vec<RelationshipEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<RelationshipConstraint>>,
    /// Higher wins.
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub allow_multiple_parents: bool,
    #[serde(default = "default_true")]
    pub allow_multiple_children: bool,
    #[serde(skip)]
    pub validate: Option<RuleValidator>,
}

fn default_true() -> bool {
    true
}

fn now_ms() -> i64 {
    let Ok(dur) = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}
