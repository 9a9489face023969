/// Camera-relative placement offsets are clamped to this length (meters),
/// preventing runaway placement from bad hit tests.
pub const MAX_PLACEMENT_DISTANCE: f32 = 10.0;

/// Vertical offsets below this are imperceptible and never corrected (meters).
pub const SNAP_EPSILON: f32 = 0.001;

/// Vertical offsets above this mean the object rests on a different surface
/// and must not be snapped (meters).
pub const SNAP_MAX_OFFSET: f32 = 0.05;

/// Fractional expansion of a plane's measured extent when testing the object
/// footprint; plane growth lags slightly behind the true resting surface.
pub const FOOTPRINT_TOLERANCE: f32 = 0.1;

/// Snap animation duration per meter of vertical offset (about 2 mm/s).
pub const SNAP_DURATION_PER_METER: f32 = 500.0;

/// Near-zero yaw applied when an object enters vertical alignment; avoids
/// exact-zero degeneracies in orientation interpolation.
pub const VERTICAL_ENTRY_YAW: f32 = 0.001;
