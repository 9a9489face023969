//! Tap handling: selecting objects and teleporting the selection.

use bevy::prelude::*;

use crate::engine::animation::{AnimationRequest, Easing};
use crate::engine::objects::{BoundsSize, Selected, VirtualObject, topmost_object_at};
use crate::engine::raycast::resolve_world_position;
use crate::engine::tracking::TrackingFrame;
use crate::engine::tracking::anchors::PlaneAnchors;
use crate::tools::interaction::recognizers::TapGesture;

/// A tap on an object selects it without moving it; a tap on empty space
/// while something is selected teleports the selection there.
pub fn handle_tap_gestures(
    mut taps: EventReader<TapGesture>,
    frame: Res<TrackingFrame>,
    anchors: Res<PlaneAnchors>,
    mut objects: Query<(
        Entity,
        &mut Transform,
        &mut VirtualObject,
        &BoundsSize,
        Option<&Selected>,
    )>,
    mut requests: EventWriter<AnimationRequest>,
    mut commands: Commands,
) {
    for tap in taps.read() {
        let Some(camera) = frame.camera else { continue };
        let Some(ray) = camera.screen_ray(tap.location) else { continue };
        let origin = ray.origin;
        let direction = ray.direction.as_vec3();

        let best = topmost_object_at(
            origin,
            direction,
            objects.iter().map(|(entity, transform, _, bounds, _)| (entity, transform, bounds)),
        );

        if let Some(hit) = best {
            for (entity, _, object, _, selected) in objects.iter() {
                if selected.is_some() && entity != hit {
                    commands.entity(entity).remove::<Selected>();
                }
                if entity == hit {
                    info!("selected '{}'", object.asset_name);
                }
            }
            commands.entity(hit).insert(Selected);
            continue;
        }

        // Empty space: relocate the current selection to the tapped point.
        let selected_entity = objects
            .iter()
            .find(|(_, _, _, _, selected)| selected.is_some())
            .map(|(entity, ..)| entity);
        let Some(entity) = selected_entity else { continue };
        let Ok((_, mut transform, mut object, _, _)) = objects.get_mut(entity) else { continue };

        let Some(candidate) = resolve_world_position(
            tap.location,
            &frame,
            &anchors,
            Some(transform.translation),
            false,
        ) else {
            continue;
        };
        let observed = candidate.observed_alignment(&anchors);
        let alignment = if object.allowed_alignments.contains(&observed) {
            observed
        } else {
            object.current_alignment()
        };
        // Plane hits are already stable; noisier sources run through the
        // object's smoothing buffer.
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
}
