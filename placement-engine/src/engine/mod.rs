/// Eased transform animation requests and the default tween driver.
pub mod animation;

/// Bounded FIFO smoothing and hysteresis buffers.
pub mod history;

/// Transform, ray and angle helpers shared by every other module.
pub mod math;

/// Placed virtual objects, their registry and asynchronous loading.
pub mod objects;

/// The screen-point to world-position hit-test cascade.
pub mod raycast;

/// Session lifecycle: quality monitoring, interruption, restart.
pub mod session;

/// Host-fed tracking data: camera pose, plane anchors, feature cloud.
pub mod tracking;
