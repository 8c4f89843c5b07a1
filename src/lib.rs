//! Structural relationships between shapes on the collaborative canvas.
//!
//! This crate tracks which shapes depend on which ("this group contains that
//! rectangle", "this label is attached to that ellipse") and pushes parent
//! changes down to dependents as shape updates. It also decides, from the
//! overlap of two bounding boxes, whether a relationship should form on its
//! own. The host store owns the shapes; it hands this crate a snapshot and
//! writes back whatever updated shapes come out.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`shape`] | Shape model consumed from the host store |
//! | [`overlap`] | Bounding boxes and overlap classification |
//! | [`relationship`] | Relationship, effect, constraint and rule records |
//! | [`graph`] | Indexed relationship graph with cycle checks and traversal |
//! | [`effects`] | The seven effect handlers and their dispatch table |
//! | [`rules`] | Priority-ordered rule engine and effect propagation |
//! | [`standard_rules`] | Default rule table (groups, labels, connectors) |
//! | [`manager`] | Caller-side orchestration: linking, grouping, cascading changes |
//! | [`config`] | Environment-driven settings for the manager |
//! | [`consts`] | Shared defaults (layout padding, cascade depth, etc.) |

pub mod config;
pub mod consts;
pub mod effects;
pub mod graph;
pub mod manager;
pub mod overlap;
pub mod relationship;
pub mod rules;
pub mod shape;
pub mod standard_rules;

pub use config::RelationsConfig;
pub use graph::RelationshipGraph;
pub use manager::{LinkOutcome, RelationError, RelationshipManager};
pub use relationship::{
    ChangeType, EffectType, OverlapType, RelationType, RelationshipEffect, RelationshipRule, ShapeRelationship,
};
pub use rules::RuleEngine;
pub use shape::{Extent, Shape, ShapeId, ShapeKind, ShapeMap};
