/// Gesture recognizers and the gesture-to-transform controller.
pub mod interaction;

/// The surface acquisition indicator state machine.
pub mod surface_indicator;
