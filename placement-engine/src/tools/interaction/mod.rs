//! Gesture-to-transform interaction controller.
//!
//! Owns the touch recognizers and turns overlapping multi-touch input into
//! object selection, threshold-gated drags and in-plane rotation.
//!
//! ## Gesture lifecycle
//!
//! Per ongoing gesture the controller moves `Idle → Tracking(object) → Idle`:
//!
//! - Pan began: every touch location (and the centroid as last resort) is
//!   hit-tested against object bounding volumes; the first object under any
//!   of them is tracked.
//! - Pan changed: translation accumulates until the per-touch-count threshold
//!   is crossed, then the 2D anchor point follows the fingers.
//! - Every frame while tracking, the anchor point is re-resolved through the
//!   hit-test cascade (infinite plane allowed), so the object follows device
//!   motion as well as finger motion.
//! - Rotation changed: the twist delta spins the object about its own up
//!   axis, concurrently with the pan.
//! - Tap: selects the object under the touch, or teleports the current
//!   selection to empty space.

/// Drag association, threshold gating and per-frame re-projection.
pub mod manipulation;

/// Raw touch events folded into pan/rotation/tap gestures.
pub mod recognizers;

/// Tap selection and teleportation.
pub mod selection;

/// Gesture session state and tuning.
pub mod state;

pub use recognizers::{GesturePhase, PanGesture, RotationGesture, TapGesture, TouchArena};
pub use state::{GestureSession, InteractionSettings};
