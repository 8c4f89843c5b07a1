//! Shape model: the canvas objects this crate reasons about.
//!
//! Shapes are owned by the host store. This crate only ever receives a
//! snapshot (`ShapeMap`) and returns modified copies; it never keeps a shape
//! between calls. The fields mirror what the store serializes: a position, a
//! rotation, a kind-specific extent, and an open-ended `props` bag holding
//! style and content (fill, stroke, text, child ids, ...).

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Unique identifier for a shape.
pub type ShapeId = Uuid;

/// Snapshot of the store's shapes keyed by id.
pub type ShapeMap = HashMap<ShapeId, Shape>;

/// A point in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The kind of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
    Diamond,
    Star,
    Text,
    Sticky,
    Frame,
    Image,
    /// Container whose members are tracked through containment relationships.
    Group,
    /// Straight segment between `(x, y)` and `(x2, y2)`.
    Line,
    /// Directed segment; geometrically identical to a line.
    Arrow,
}

impl ShapeKind {
    /// Segment kinds whose geometry is a start point and an end point.
    #[must_use]
    pub fn is_line(self) -> bool {
        matches!(self, Self::Line | Self::Arrow)
    }
}

/// Kind-specific geometry beyond the `(x, y)` anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "lowercase")]
pub enum Extent {
    /// Axis-aligned box with its top-left corner at `(x, y)`.
    Box { width: f64, height: f64 },
    /// Segment ending at the absolute point `(x2, y2)`.
    Segment { x2: f64, y2: f64 },
    /// No size at all; the shape is the point `(x, y)`.
    Point,
}

/// A shape as supplied by the host store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    /// Left edge (boxes) or start point (segments) in world coordinates.
    pub x: f64,
    pub y: f64,
    /// Rotation in radians.
    pub rotation: f64,
    pub extent: Extent,
    /// Open-ended style and content properties.
    #[serde(default)]
    pub props: Map<String, Value>,
}

impl Shape {
    /// Create a shape with a fresh id, no rotation and empty props.
    #[must_use]
    pub fn new(kind: ShapeKind, x: f64, y: f64, extent: Extent) -> Self {
        Self { id: Uuid::new_v4(), kind, x, y, rotation: 0.0, extent, props: Map::new() }
    }

    /// Box-extent shape of the given kind.
    #[must_use]
    pub fn boxed(kind: ShapeKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(kind, x, y, Extent::Box { width, height })
    }

    /// Line from `(x, y)` to `(x2, y2)`.
    #[must_use]
    pub fn line(x: f64, y: f64, x2: f64, y2: f64) -> Self {
        Self::new(ShapeKind::Line, x, y, Extent::Segment { x2, y2 })
    }

    /// Builder-style props replacement. Non-object values leave props empty.
    #[must_use]
    pub fn with_props(mut self, props: Value) -> Self {
        if let Value::Object(map) = props {
            self.props = map;
        }
        self
    }

    /// Width and height when the shape has a box extent.
    #[must_use]
    pub fn size(&self) -> Option<(f64, f64)> {
        match self.extent {
            Extent::Box { width, height } => Some((width, height)),
            Extent::Segment { .. } | Extent::Point => None,
        }
    }

    /// Translate the whole shape, end point included.
    #[must_use]
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let mut out = self.clone();
        out.x += dx;
        out.y += dy;
        if let Extent::Segment { x2, y2 } = self.extent {
            out.extent = Extent::Segment { x2: x2 + dx, y2: y2 + dy };
        }
        out
    }

    /// Move the anchor to `(x, y)`, carrying a segment's end point along.
    #[must_use]
    pub fn moved_to(&self, x: f64, y: f64) -> Self {
        self.translated(x - self.x, y - self.y)
    }
}
