//! Shared defaults for the relations crate.

// ── Effects ─────────────────────────────────────────────────────

/// Inset applied by the flex auto-layout when the effect config has no `padding`.
pub const DEFAULT_LAYOUT_PADDING: f64 = 16.0;

/// Layout type assumed when the auto-layout config has no `layout_type`.
pub const DEFAULT_LAYOUT_TYPE: &str = "flex";

// ── Manager ─────────────────────────────────────────────────────

/// How many relationship hops a single parent change may cascade through.
pub const DEFAULT_MAX_CASCADE_DEPTH: usize = 32;

// ── Standard rule ids ───────────────────────────────────────────

pub const GROUP_CONTAINMENT_RULE: &str = "group-containment";
pub const SHAPE_LABEL_RULE: &str = "shape-label-attachment";
pub const LINE_CONNECTION_RULE: &str = "line-shape-connection";
