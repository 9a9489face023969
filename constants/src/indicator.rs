/// Distance below which the indicator shrinks proportionally so it does not
/// dominate the view close up (meters). Scale is exactly 1.0 here.
pub const SCALE_NEAR_DISTANCE: f32 = 0.7;

/// Gradient of the gentle scale growth beyond [`SCALE_NEAR_DISTANCE`].
pub const SCALE_FAR_GRADIENT: f32 = 0.25;

/// Offset of the scale growth beyond [`SCALE_NEAR_DISTANCE`]; together with
/// the gradient this yields scale 1.2 at 1.5 m.
pub const SCALE_FAR_OFFSET: f32 = 0.825;

/// Camera tilt below this fraction of a quarter turn uses the raw camera yaw.
pub const TILT_BLEND_START: f32 = 0.65;

/// Camera tilt above this fraction of a quarter turn uses the
/// minimal-rotation-normalized yaw; in between the two are blended linearly.
pub const TILT_BLEND_END: f32 = 0.75;

/// Horizontal alignment commits once more than this many of the last
/// [`crate::history::ALIGNMENT_HISTORY_CAPACITY`] observations agree.
pub const HORIZONTAL_COMMIT_COUNT: usize = 15;

/// Vertical surfaces are observed less consistently (smaller, farther), so a
/// lower confirmation bar applies.
pub const VERTICAL_COMMIT_COUNT: usize = 10;

/// Duration of the eased rotation when the committed alignment changes.
pub const ALIGNMENT_ANIMATION_SECS: f32 = 0.5;

/// Forward offset of the billboard placement while no surface is detected
/// (meters in front of the camera).
pub const BILLBOARD_FORWARD_OFFSET: f32 = 0.8;
