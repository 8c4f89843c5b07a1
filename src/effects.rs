//! Effect handlers: pure transforms from a parent change to a child update.
//!
//! Every handler has the same shape, [`EffectHandler`]: it reads its settings
//! from the effect config, looks at the parent and child, and returns the
//! updated child or `None` when nothing should be written back. Handlers keep
//! no state and never fail. Missing or mistyped config values fall back to the
//! handler's defaults.

#[cfg(test)]
#[path = "effects_test.rs"]
mod effects_test;

use serde_json::Value;

use crate::consts::{DEFAULT_LAYOUT_PADDING, DEFAULT_LAYOUT_TYPE};
use crate::overlap::bounds;
use crate::relationship::{EffectConfig, EffectType};
use crate::shape::{Extent, Point, Shape, ShapeMap};

/// Signature shared by all effect handlers.
pub type EffectHandler = fn(parent: &Shape, child: &Shape, config: Option<&EffectConfig>, shapes: &ShapeMap) -> Option<Shape>;

/// Look up the handler for an effect type.
#[must_use]
pub fn handler_for(kind: EffectType) -> EffectHandler {
    match kind {
        EffectType::MoveWithParent => move_with_parent,
        EffectType::ResizeWithParent => resize_with_parent,
        EffectType::RotateWithParent => rotate_with_parent,
        EffectType::ClipByParent => clip_by_parent,
        EffectType::InheritStyle => inherit_style,
        EffectType::AutoLayout => auto_layout,
        EffectType::MaintainDistance => maintain_distance,
    }
}

// =============================================================================
// CONFIG ACCESS
// =============================================================================

/// Typed access to an optional effect config.
pub struct EffectParams<'a> {
    config: Option<&'a EffectConfig>,
}

impl<'a> EffectParams<'a> {
    #[must_use]
    pub fn new(config: Option<&'a EffectConfig>) -> Self {
        Self { config }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.config.and_then(|c| c.get(key))
    }

    /// Numeric value for `key`, or `default` when absent or not a number.
    #[must_use]
    pub fn number(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(Value::as_f64).unwrap_or(default)
    }

    #[must_use]
    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    #[must_use]
    pub fn text(&self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(Value::as_str).unwrap_or(default)
    }

    /// String entries of a list value; non-string entries are skipped.
    #[must_use]
    pub fn names(&self, key: &str) -> Vec<&'a str> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

// =============================================================================
// CHANGE CONTEXT
// =============================================================================

/// How much the parent changed, overlaid on stored effect configs at
/// propagation time. Absent fields leave the stored value in place.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChangeContext {
    pub delta_x: Option<f64>,
    pub delta_y: Option<f64>,
    pub delta_rotation: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
}

impl ChangeContext {
    /// Context for a plain translation.
    #[must_use]
    pub fn translation(dx: f64, dy: f64) -> Self {
        Self { delta_x: Some(dx), delta_y: Some(dy), ..Self::default() }
    }

    /// Derive every magnitude from a before/after pair of the same shape.
    ///
    /// Scale factors are 1 when the old size is zero or the shape has no box.
    #[must_use]
    pub fn between(before: &Shape, after: &Shape) -> Self {
        let (scale_x, scale_y) = match (before.size(), after.size()) {
            (Some((w0, h0)), Some((w1, h1))) => (ratio(w1, w0), ratio(h1, h0)),
            _ => (1.0, 1.0),
        };
        Self {
            delta_x: Some(after.x - before.x),
            delta_y: Some(after.y - before.y),
            delta_rotation: Some(after.rotation - before.rotation),
            scale_x: Some(scale_x),
            scale_y: Some(scale_y),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Stored config with this context's values written over it.
    #[must_use]
    pub fn overlay(&self, base: Option<&EffectConfig>) -> Option<EffectConfig> {
        if self.is_empty() {
            return base.cloned();
        }
        let mut merged = base.cloned().unwrap_or_default();
        let fields = [
            ("delta_x", self.delta_x),
            ("delta_y", self.delta_y),
            ("delta_rotation", self.delta_rotation),
            ("scale_x", self.scale_x),
            ("scale_y", self.scale_y),
        ];
        for (key, value) in fields {
            if let Some(v) = value {
                merged.insert(key.to_owned(), Value::from(v));
            }
        }
        Some(merged)
    }
}

fn ratio(new: f64, old: f64) -> f64 {
    if old == 0.0 { 1.0 } else { new / old }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Translate the child by `delta_x`/`delta_y`.
#[must_use]
pub fn move_with_parent(_parent: &Shape, child: &Shape, config: Option<&EffectConfig>, _shapes: &ShapeMap) -> Option<Shape> {
    let params = EffectParams::new(config);
    let dx = params.number("delta_x", 0.0);
    let dy = params.number("delta_y", 0.0);
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    Some(child.translated(dx, dy))
}

/// Orbit the child around the parent's center by `delta_rotation` radians and
/// add the same angle to the child's own rotation.
#[must_use]
pub fn rotate_with_parent(parent: &Shape, child: &Shape, config: Option<&EffectConfig>, _shapes: &ShapeMap) -> Option<Shape> {
    let delta = EffectParams::new(config).number("delta_rotation", 0.0);
    if delta == 0.0 {
        return None;
    }
    let (pw, ph) = parent.size().unwrap_or((0.0, 0.0));
    let pivot = Point::new(parent.x + pw / 2.0, parent.y + ph / 2.0);
    let (cos, sin) = (delta.cos(), delta.sin());
    let rotate = |p: Point| {
        let (dx, dy) = (p.x - pivot.x, p.y - pivot.y);
        Point::new(pivot.x + dx * cos - dy * sin, pivot.y + dx * sin + dy * cos)
    };

    let mut out = child.clone();
    match child.extent {
        Extent::Segment { x2, y2 } => {
            let start = rotate(Point::new(child.x, child.y));
            let end = rotate(Point::new(x2, y2));
            out.x = start.x;
            out.y = start.y;
            out.extent = Extent::Segment { x2: end.x, y2: end.y };
        }
        Extent::Box { .. } | Extent::Point => {
            let (cw, ch) = child.size().unwrap_or((0.0, 0.0));
            let center = rotate(Point::new(child.x + cw / 2.0, child.y + ch / 2.0));
            out.x = center.x - cw / 2.0;
            out.y = center.y - ch / 2.0;
        }
    }
    out.rotation += delta;
    Some(out)
}

/// Scale the child's offset from the parent's origin, and its size, by
/// `scale_x`/`scale_y`. Axes scale independently.
#[must_use]
pub fn resize_with_parent(parent: &Shape, child: &Shape, config: Option<&EffectConfig>, _shapes: &ShapeMap) -> Option<Shape> {
    let params = EffectParams::new(config);
    let sx = params.number("scale_x", 1.0);
    let sy = params.number("scale_y", 1.0);
    if sx == 1.0 && sy == 1.0 {
        return None;
    }
    let mut out = child.clone();
    out.x = parent.x + (child.x - parent.x) * sx;
    out.y = parent.y + (child.y - parent.y) * sy;
    out.extent = match child.extent {
        Extent::Box { width, height } => Extent::Box { width: width * sx, height: height * sy },
        Extent::Segment { x2, y2 } => {
            Extent::Segment { x2: parent.x + (x2 - parent.x) * sx, y2: parent.y + (y2 - parent.y) * sy }
        }
        Extent::Point => Extent::Point,
    };
    Some(out)
}

/// Clipping happens at render time; there is never anything to write back.
#[must_use]
pub fn clip_by_parent(_parent: &Shape, _child: &Shape, _config: Option<&EffectConfig>, _shapes: &ShapeMap) -> Option<Shape> {
    None
}

/// Copy the props named in `properties` from parent to child, where both
/// already carry them.
#[must_use]
pub fn inherit_style(parent: &Shape, child: &Shape, config: Option<&EffectConfig>, _shapes: &ShapeMap) -> Option<Shape> {
    let names = EffectParams::new(config).names("properties");
    if names.is_empty() {
        return None;
    }
    let mut out = child.clone();
    let mut copied = 0_usize;
    for name in names {
        let Some(value) = parent.props.get(name) else {
            continue;
        };
        if let Some(slot) = out.props.get_mut(name) {
            slot.clone_from(value);
            copied += 1;
        }
    }
    (copied > 0).then_some(out)
}

/// Place the child inside the parent's padded origin.
///
/// Only the `flex` layout exists. `direction` is accepted but row and column
/// currently land on the same spot.
#[must_use]
pub fn auto_layout(parent: &Shape, child: &Shape, config: Option<&EffectConfig>, _shapes: &ShapeMap) -> Option<Shape> {
    let params = EffectParams::new(config);
    if params.text("layout_type", DEFAULT_LAYOUT_TYPE) != "flex" {
        return None;
    }
    let padding = params.number("padding", DEFAULT_LAYOUT_PADDING);
    Some(child.moved_to(parent.x + padding, parent.y + padding))
}

/// Snap a line's start point onto the nearest edge of the parent's box.
#[must_use]
pub fn maintain_distance(parent: &Shape, child: &Shape, config: Option<&EffectConfig>, _shapes: &ShapeMap) -> Option<Shape> {
    if !child.kind.is_line() || !EffectParams::new(config).flag("snap_to_edge", false) {
        return None;
    }
    let b = bounds(parent);
    let start = Point::new(child.x, child.y);
    let cx = start.x.clamp(b.x, b.right());
    let cy = start.y.clamp(b.y, b.bottom());
    let candidates = [
        Point::new(cx, b.y),
        Point::new(b.right(), cy),
        Point::new(cx, b.bottom()),
        Point::new(b.x, cy),
    ];
    let nearest = candidates
        .into_iter()
        .min_by(|a, b| start.distance_to(*a).total_cmp(&start.distance_to(*b)))?;
    if nearest == start {
        return None;
    }
    let mut out = child.clone();
    out.x = nearest.x;
    out.y = nearest.y;
    Some(out)
}
