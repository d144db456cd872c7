//! Shared numeric constants for the canvas crate.

// ── Camera ──────────────────────────────────────────────────────

/// Smallest zoom factor reachable through `zoom_at`.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest zoom factor reachable through `zoom_at`.
pub const MAX_ZOOM: f64 = 5.0;

// ── Smoothing ───────────────────────────────────────────────────

/// Moving-average window, in raw samples.
pub const SMOOTH_WINDOW: usize = 3;

/// Gaps longer than this (canvas units) get synthetic points.
pub const INTERPOLATE_THRESHOLD: f64 = 3.0;

/// Roughly one synthetic point per this many canvas units.
pub const INTERPOLATE_SPACING: f64 = 2.0;

/// Sub-steps sampled per quadratic Bezier segment.
pub const BEZIER_STEPS: usize = 3;

/// Bezier smoothing runs only when a stroke has more points than this.
pub const BEZIER_MIN_POINTS: usize = 5;

// ── Hit-testing ─────────────────────────────────────────────────

/// Absorbs rounding in the clamped projection so on-path points always hit.
pub const HIT_EPSILON: f64 = 1e-9;

// ── History ─────────────────────────────────────────────────────

/// Maximum snapshots retained; the oldest is dropped on overflow.
pub const HISTORY_LIMIT: usize = 50;

// ── Rendering ───────────────────────────────────────────────────

/// Color used for strokes under the stroke eraser.
pub const HIGHLIGHT_COLOR: &str = "#ff0000";

/// Alpha used for strokes under the stroke eraser.
pub const HIGHLIGHT_ALPHA: f64 = 0.5;

// ── Session ─────────────────────────────────────────────────────

/// Local colors used until the server assigns one.
pub const SESSION_PALETTE: [&str; 8] =
    ["#e74c3c", "#3498db", "#2ecc71", "#f39c12", "#9b59b6", "#1abc9c", "#e67e22", "#34495e"];

/// Default stroke color.
pub const DEFAULT_COLOR: &str = "#000000";

// ── Input ───────────────────────────────────────────────────────

/// Zoom multiplier per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;
