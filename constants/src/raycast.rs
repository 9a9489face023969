/// Half-angle of the search cone around the hit-test ray for feature points,
/// in degrees (opening angle is twice this).
pub const FEATURE_CONE_HALF_ANGLE_DEG: f32 = 9.0;

/// Feature hits closer to the camera than this are discarded (meters).
pub const FEATURE_MIN_DISTANCE: f32 = 0.2;

/// Feature hits farther from the camera than this are discarded (meters).
pub const FEATURE_MAX_DISTANCE: f32 = 2.0;

/// Rays with a vertical direction component above this never intersect the
/// infinite fallback plane (near-parallel or pointing upward).
pub const INFINITE_PLANE_MAX_RAY_SLOPE: f32 = -0.03;
