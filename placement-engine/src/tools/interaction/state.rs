use bevy::prelude::*;

use constants::interaction::{PAN_THRESHOLD_MULTI_TOUCH, PAN_THRESHOLD_SINGLE_TOUCH};

/// State for the gesture currently in progress. Lives for the duration of
/// one gesture and is reset on end or cancel.
#[derive(Resource, Debug, Default)]
pub struct GestureSession {
    /// Object the pan gesture latched onto, if any.
    pub tracked_object: Option<Entity>,
    /// Last 2D point the drag is anchored to. Re-projection resolves this
    /// against the world every frame, so the object keeps following even
    /// when only the device moves.
    pub last_touch_location: Option<Vec2>,
    /// Whether the pan threshold has been crossed for this gesture.
    pub threshold_exceeded: bool,
    /// Translation accumulated below the threshold; reset to zero at the
    /// crossing so the object does not jump by the pre-threshold distance.
    pub accumulated_translation: Vec2,
}

impl GestureSession {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_tracking(&self) -> bool {
        self.tracked_object.is_some()
    }
}

/// Empirical gesture tuning, overridable at runtime.
#[derive(Resource, Debug, Clone, Copy)]
pub struct InteractionSettings {
    pub pan_threshold_single_touch: f32,
    pub pan_threshold_multi_touch: f32,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            pan_threshold_single_touch: PAN_THRESHOLD_SINGLE_TOUCH,
            pan_threshold_multi_touch: PAN_THRESHOLD_MULTI_TOUCH,
        }
    }
}

impl InteractionSettings {
    /// Multi-touch drags defer to the simultaneous rotation gesture, hence
    /// the higher bar.
    pub fn pan_threshold(&self, touch_count: usize) -> f32 {
        if touch_count >= 2 {
            self.pan_threshold_multi_touch
        } else {
            self.pan_threshold_single_touch
        }
    }
}
