/// Number of recent world positions averaged to damp frame-to-frame jitter.
/// At 30-60 fps this covers roughly a 150-300 ms window.
pub const POSITION_HISTORY_CAPACITY: usize = 10;

/// Number of recent alignment observations kept for hysteresis filtering.
pub const ALIGNMENT_HISTORY_CAPACITY: usize = 20;
