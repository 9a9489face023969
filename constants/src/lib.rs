/// Bounded-buffer capacities for jitter smoothing and hysteresis.
pub mod history;

/// Surface indicator scale, tilt blending and alignment hysteresis tuning.
pub mod indicator;

/// Touch gesture thresholds.
pub mod interaction;

/// Placement distance limits and plane snap allowances.
pub mod placement;

/// Hit-test ray cascade tuning.
pub mod raycast;

/// Session lifecycle tuning.
pub mod session;
