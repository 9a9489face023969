/// Cumulative pan translation (screen points) a one-finger drag must exceed
/// before the tracked object starts moving.
pub const PAN_THRESHOLD_SINGLE_TOUCH: f32 = 30.0;

/// Threshold for drags with two or more fingers. Higher so that a gesture the
/// user intends as a rotation does not trigger an accidental drag.
pub const PAN_THRESHOLD_MULTI_TOUCH: f32 = 60.0;

/// A touch that travels less than this (screen points) between down and up
/// counts as a tap.
pub const TAP_MOVEMENT_TOLERANCE: f32 = 12.0;
