//! Bounding boxes and overlap classification between two shapes.
//!
//! All tests are inclusive of edges and work on axis-aligned boxes only;
//! rotation is ignored. Segments and points become degenerate boxes, which the
//! comparisons handle without special cases.

#[cfg(test)]
#[path = "overlap_test.rs"]
mod overlap_test;

use serde::{Deserialize, Serialize};

use crate::relationship::OverlapType;
use crate::shape::{Extent, Point, Shape};

/// Axis-aligned bounding box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive point-in-box test.
    #[must_use]
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Bounding box of a shape: its box extent, the span of its segment, or a
/// zero-size box at its anchor.
#[must_use]
pub fn bounds(shape: &Shape) -> Bounds {
    match shape.extent {
        Extent::Box { width, height } => Bounds { x: shape.x, y: shape.y, width, height },
        Extent::Segment { x2, y2 } => {
            let min_x = shape.x.min(x2);
            let min_y = shape.y.min(y2);
            Bounds { x: min_x, y: min_y, width: shape.x.max(x2) - min_x, height: shape.y.max(y2) - min_y }
        }
        Extent::Point => Bounds { x: shape.x, y: shape.y, width: 0.0, height: 0.0 },
    }
}

/// `child` lies entirely inside `parent`.
#[must_use]
pub fn contains(parent: &Shape, child: &Shape) -> bool {
    let p = bounds(parent);
    let c = bounds(child);
    c.x >= p.x && c.y >= p.y && c.right() <= p.right() && c.bottom() <= p.bottom()
}

/// The two boxes share at least one point.
#[must_use]
pub fn intersects(parent: &Shape, child: &Shape) -> bool {
    let p = bounds(parent);
    let c = bounds(child);
    !(c.x > p.right() || c.right() < p.x || c.y > p.bottom() || c.bottom() < p.y)
}

/// The center of `child` lies inside `parent`.
#[must_use]
pub fn center_inside(parent: &Shape, child: &Shape) -> bool {
    bounds(parent).contains_point(bounds(child).center())
}

/// Classify how `child` overlaps `parent`.
///
/// Checked from strongest to weakest: a contained child also has its center
/// inside and intersects, so the order decides the answer.
#[must_use]
pub fn classify(parent: &Shape, child: &Shape) -> Option<OverlapType> {
    if contains(parent, child) {
        Some(OverlapType::Contains)
    } else if center_inside(parent, child) {
        Some(OverlapType::CenterInside)
    } else if intersects(parent, child) {
        Some(OverlapType::Intersects)
    } else {
        None
    }
}
