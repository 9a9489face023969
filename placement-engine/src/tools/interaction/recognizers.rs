//! Touch gesture recognition.
//!
//! Raw [`TouchInput`] events are folded into pan, rotation and tap gestures.
//! Pan and rotation are recognized simultaneously from the same touches so a
//! single two-finger gesture can blend translation and rotation without the
//! user lifting their fingers.

use bevy::input::touch::{TouchInput, TouchPhase};
use bevy::prelude::*;
use std::collections::BTreeMap;
use std::f32::consts::{PI, TAU};

use constants::interaction::TAP_MOVEMENT_TOLERANCE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
    Canceled,
}

/// One-or-more-finger drag. `translation_delta` is the centroid movement
/// since the previous sample.
#[derive(Event, Debug, Clone)]
pub struct PanGesture {
    pub phase: GesturePhase,
    pub touches: Vec<Vec2>,
    pub translation_delta: Vec2,
}

/// Two-finger twist; `delta` is the angle change in radians since the
/// previous sample.
#[derive(Event, Debug, Clone, Copy)]
pub struct RotationGesture {
    pub phase: GesturePhase,
    pub delta: f32,
}

/// A touch that went down and up without travelling.
#[derive(Event, Debug, Clone, Copy)]
pub struct TapGesture {
    pub location: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct TouchRecord {
    position: Vec2,
    start: Vec2,
}

/// Active touches, ordered by id so the two-finger angle is stable.
#[derive(Resource, Debug, Default)]
pub struct TouchArena {
    touches: BTreeMap<u64, TouchRecord>,
    last_centroid: Option<Vec2>,
    last_angle: Option<f32>,
}

impl TouchArena {
    fn positions(&self) -> Vec<Vec2> {
        self.touches.values().map(|t| t.position).collect()
    }

    fn centroid(&self) -> Option<Vec2> {
        if self.touches.is_empty() {
            return None;
        }
        let sum: Vec2 = self.touches.values().map(|t| t.position).sum();
        Some(sum / self.touches.len() as f32)
    }

    fn two_finger_angle(&self) -> Option<f32> {
        let mut iter = self.touches.values();
        let a = iter.next()?.position;
        let b = iter.next()?.position;
        let v = b - a;
        Some(v.y.atan2(v.x))
    }
}

fn wrap_angle(angle: f32) -> f32 {
    let mut wrapped = angle % TAU;
    if wrapped > PI {
        wrapped -= TAU;
    }
    if wrapped < -PI {
        wrapped += TAU;
    }
    wrapped
}

/// Folds raw touch events into gesture events.
pub fn recognize_touch_gestures(
    mut inputs: EventReader<TouchInput>,
    mut arena: ResMut<TouchArena>,
    mut pans: EventWriter<PanGesture>,
    mut rotations: EventWriter<RotationGesture>,
    mut taps: EventWriter<TapGesture>,
) {
    for input in inputs.read() {
        match input.phase {
            TouchPhase::Started => {
                let was_empty = arena.touches.is_empty();
                arena.touches.insert(
                    input.id,
                    TouchRecord { position: input.position, start: input.position },
                );
                // A finger-count change re-baselines the centroid and angle
                // so neither gesture jumps.
                arena.last_centroid = arena.centroid();
                arena.last_angle = arena.two_finger_angle();
                if was_empty {
                    pans.write(PanGesture {
                        phase: GesturePhase::Began,
                        touches: arena.positions(),
                        translation_delta: Vec2::ZERO,
                    });
                }
            }
            TouchPhase::Moved => {
                let Some(record) = arena.touches.get_mut(&input.id) else { continue };
                record.position = input.position;

                if let Some(centroid) = arena.centroid() {
                    let delta = arena
                        .last_centroid
                        .map_or(Vec2::ZERO, |last| centroid - last);
                    arena.last_centroid = Some(centroid);
                    pans.write(PanGesture {
                        phase: GesturePhase::Changed,
                        touches: arena.positions(),
                        translation_delta: delta,
                    });
                }
                if let Some(angle) = arena.two_finger_angle() {
                    if let Some(last) = arena.last_angle {
                        rotations.write(RotationGesture {
                            phase: GesturePhase::Changed,
                            delta: wrap_angle(angle - last),
                        });
                    }
                    arena.last_angle = Some(angle);
                }
            }
            TouchPhase::Ended | TouchPhase::Canceled => {
                let canceled = matches!(input.phase, TouchPhase::Canceled);
                let record = arena.touches.remove(&input.id);
                arena.last_centroid = arena.centroid();
                arena.last_angle = arena.two_finger_angle();

                if arena.touches.is_empty() {
                    if let Some(record) = record {
                        if !canceled
                            && record.position.distance(record.start) < TAP_MOVEMENT_TOLERANCE
                        {
                            taps.write(TapGesture { location: record.position });
                        }
                    }
                    let phase = if canceled { GesturePhase::Canceled } else { GesturePhase::Ended };
                    pans.write(PanGesture {
                        phase,
                        touches: Vec::new(),
                        translation_delta: Vec2::ZERO,
                    });
                    rotations.write(RotationGesture { phase, delta: 0.0 });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wrap_keeps_deltas_small() {
        assert_relative_eq!(wrap_angle(0.1), 0.1);
        assert_relative_eq!(wrap_angle(PI + 0.1), -PI + 0.1, epsilon = 1e-6);
        assert_relative_eq!(wrap_angle(-PI - 0.1), PI - 0.1, epsilon = 1e-6);
    }

    #[test]
    fn two_finger_angle_uses_id_order() {
        let mut arena = TouchArena::default();
        arena.touches.insert(
            2,
            TouchRecord { position: Vec2::new(10.0, 0.0), start: Vec2::ZERO },
        );
        arena.touches.insert(
            1,
            TouchRecord { position: Vec2::new(0.0, 0.0), start: Vec2::ZERO },
        );
        // Vector from touch 1 to touch 2 points along +x.
        assert_relative_eq!(arena.two_finger_angle().unwrap(), 0.0);
    }
}
