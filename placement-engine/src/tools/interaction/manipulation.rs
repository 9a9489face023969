//! Drag and rotation semantics for placed objects.

use bevy::prelude::*;

use crate::engine::animation::{AnimationRequest, Easing};
use crate::engine::math::ray_hits_obb;
use crate::engine::objects::{BoundsSize, Selected, VirtualObject};
use crate::engine::raycast::resolve_world_position;
use crate::engine::tracking::TrackingFrame;
use crate::engine::tracking::anchors::PlaneAnchors;
use crate::tools::interaction::recognizers::{GesturePhase, PanGesture, RotationGesture};
use crate::tools::interaction::state::{GestureSession, InteractionSettings};

fn centroid(points: &[Vec2]) -> Option<Vec2> {
    if points.is_empty() {
        return None;
    }
    let sum: Vec2 = points.iter().copied().sum();
    Some(sum / points.len() as f32)
}

/// Associates pan gestures with an object and gates movement behind the
/// per-touch-count threshold.
pub fn handle_pan_gestures(
    mut pans: EventReader<PanGesture>,
    settings: Res<InteractionSettings>,
    frame: Res<TrackingFrame>,
    mut session: ResMut<GestureSession>,
    objects: Query<(Entity, &Transform, &BoundsSize), With<VirtualObject>>,
) {
    for pan in pans.read() {
        match pan.phase {
            GesturePhase::Began => {
                session.reset();
                let Some(camera) = frame.camera else { continue };
                // Every touch location, then the centroid as last resort; the
                // first object found under any of them wins. Reachability is
                // deliberately favored over occlusion correctness here.
                let mut probes = pan.touches.clone();
                if let Some(c) = centroid(&pan.touches) {
                    probes.push(c);
                }
                'probe: for point in probes {
                    let Some(ray) = camera.screen_ray(point) else { continue };
                    for (entity, transform, BoundsSize(size)) in &objects {
                        if ray_hits_obb(ray.origin, ray.direction.as_vec3(), transform, *size)
                            .is_some()
                        {
                            session.tracked_object = Some(entity);
                            session.last_touch_location = centroid(&pan.touches);
                            debug!("pan latched onto {entity:?}");
                            break 'probe;
                        }
                    }
                }
            }
            GesturePhase::Changed => {
                if !session.is_tracking() {
                    continue;
                }
                let Some(point) = centroid(&pan.touches) else { continue };
                if session.threshold_exceeded {
                    session.last_touch_location = Some(point);
                    continue;
                }
                session.accumulated_translation += pan.translation_delta;
                if session.accumulated_translation.length()
                    > settings.pan_threshold(pan.touches.len())
                {
                    session.threshold_exceeded = true;
                    // Zero the accumulator so the object does not jump by
                    // the pre-threshold distance.
                    session.accumulated_translation = Vec2::ZERO;
                    session.last_touch_location = Some(point);
                }
            }
            GesturePhase::Ended | GesturePhase::Canceled => {
                session.reset();
            }
        }
    }
}

/// Per-frame re-projection of the tracked object, independent of new touch
/// events. The 2D anchor point stays fixed while the resolved 3D result moves
/// with the device, which is what makes "hold the finger still, move the
/// device" dragging work.
pub fn reproject_tracked_object(
    frame: Res<TrackingFrame>,
    anchors: Res<PlaneAnchors>,
    session: Res<GestureSession>,
    mut objects: Query<(&mut Transform, &mut VirtualObject)>,
    mut requests: EventWriter<AnimationRequest>,
) {
    if !session.threshold_exceeded {
        return;
    }
    let (Some(entity), Some(point)) = (session.tracked_object, session.last_touch_location) else {
        return;
    };
    let Ok((mut transform, mut object)) = objects.get_mut(entity) else { return };
    let Some(camera) = frame.camera else { return };
    // Infinite-plane fallback is always allowed mid-drag for continuity.
    let Some(candidate) = resolve_world_position(
        point,
        &frame,
        &anchors,
        Some(transform.translation),
        true,
    ) else {
        return;
    };

    let observed = candidate.observed_alignment(&anchors);
    let alignment = if object.allowed_alignments.contains(&observed) {
        observed
    } else {
        object.current_alignment()
    };
    // Plane hits apply directly; feature and infinite-plane fallbacks are
    // noisier and run through the object's smoothing buffer.
    let smooth = !candidate.is_on_plane;
    if let Some(target) = object.set_transform(
        &mut transform,
        candidate.position,
        candidate.surface_rotation(&anchors),
        &camera,
        smooth,
        alignment,
        true,
    ) {
        requests.write(AnimationRequest {
            target: entity,
            translation: target.translation,
            rotation: target.rotation,
            duration: target.duration,
            easing: Easing::EaseInOut,
        });
    }
    object.anchor = candidate.anchor;
}

/// Applies two-finger rotation to the tracked object, or the selection when
/// no drag is in progress.
pub fn handle_rotation_gestures(
    mut rotations: EventReader<RotationGesture>,
    session: Res<GestureSession>,
    selected: Query<Entity, With<Selected>>,
    mut objects: Query<(&mut Transform, &mut VirtualObject)>,
) {
    for rotation in rotations.read() {
        if rotation.phase != GesturePhase::Changed {
            continue;
        }
        let target = session
            .tracked_object
            .or_else(|| selected.iter().next());
        let Some(entity) = target else { continue };
        let Ok((mut transform, mut object)) = objects.get_mut(entity) else { continue };
        // Subtracted, not added: the camera normally looks down at the
        // object. The sign convention breaks for extreme look-up angles;
        // known limitation, left uncorrected.
        object.apply_yaw_delta(&mut transform, -rotation.delta);
    }
}
