//! Placed virtual objects and their lifecycle.
//!
//! Each placed object is an ECS entity carrying a [`VirtualObject`] plus its
//! `Transform` and [`BoundsSize`]; the [`PlacedObjects`] registry is the
//! authoritative list of live placements. The scene/rendering collaborator
//! owns the drawables and is told what to show through entity ids and
//! animation requests.

use bevy::prelude::*;

pub mod loader;
pub mod virtual_object;

pub use virtual_object::{AnimationTarget, VirtualObject};

use crate::engine::animation::{AnimationCompleted, AnimationRequest, Easing};
use crate::engine::math;
use crate::engine::tracking::anchors::AnchorEvent;

/// Full extents of an object's bounding volume, for touch picking.
#[derive(Component, Debug, Clone, Copy)]
pub struct BoundsSize(pub Vec3);

/// Marker for the object current gestures operate on.
#[derive(Component)]
pub struct Selected;

/// Registry of live placed objects. Only the update schedule mutates it.
#[derive(Resource, Debug, Default)]
pub struct PlacedObjects {
    entities: Vec<Entity>,
}

impl PlacedObjects {
    pub fn register(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Removes `entity` from the registry. Removing an entity that was never
    /// registered indicates a synchronization bug between the gesture layer
    /// and the placement layer and is unrecoverable.
    pub fn unregister(&mut self, entity: Entity) {
        let index = self
            .entities
            .iter()
            .position(|e| *e == entity)
            .unwrap_or_else(|| panic!("removing untracked object {entity:?}"));
        self.entities.remove(index);
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

/// Ask for one placed object to be removed.
#[derive(Event, Debug, Clone, Copy)]
pub struct RemoveObjectRequest {
    pub entity: Entity,
}

/// Ask the rendering collaborator to show or hide one entity's drawables.
#[derive(Event, Debug, Clone, Copy)]
pub struct VisibilityRequest {
    pub target: Entity,
    pub visible: bool,
}

/// Topmost entity whose bounding volume contains the ray. Bounding boxes
/// only, for performance and touch forgiveness.
pub fn topmost_object_at<'a>(
    origin: Vec3,
    direction: Vec3,
    objects: impl Iterator<Item = (Entity, &'a Transform, &'a BoundsSize)>,
) -> Option<Entity> {
    let mut best: Option<(Entity, f32)> = None;
    for (entity, transform, BoundsSize(size)) in objects {
        if let Some(t) = math::ray_hits_obb(origin, direction, transform, *size) {
            if t > 0.0 && best.is_none_or(|(_, best_t)| t < best_t) {
                best = Some((entity, t));
            }
        }
    }
    best.map(|(entity, _)| entity)
}

/// Clears the re-entrancy guard once an object's alignment animation played
/// out.
pub fn clear_alignment_animation_flags(
    mut completed: EventReader<AnimationCompleted>,
    mut objects: Query<&mut VirtualObject>,
) {
    for event in completed.read() {
        if let Ok(mut object) = objects.get_mut(event.target) {
            object.finish_alignment_animation();
        }
    }
}

/// Re-snaps placed objects whenever the tracking engine reports a new or
/// refined plane, producing the illusion that the original placement was
/// always exactly on the refined surface.
pub fn adjust_objects_onto_updated_anchors(
    mut events: EventReader<AnchorEvent>,
    mut objects: Query<(Entity, &mut Transform, &mut VirtualObject)>,
    mut requests: EventWriter<AnimationRequest>,
) {
    for event in events.read() {
        let anchor = match event {
            AnchorEvent::Added(anchor) | AnchorEvent::Updated(anchor) => anchor,
            AnchorEvent::Removed(_) => continue,
        };
        for (entity, mut transform, mut object) in &mut objects {
            if let Some(target) = object.adjust_onto_plane_anchor(&mut transform, anchor) {
                requests.write(AnimationRequest {
                    target: entity,
                    translation: target.translation,
                    rotation: target.rotation,
                    duration: target.duration,
                    easing: Easing::EaseInOut,
                });
            }
        }
    }
}

/// Despawns objects on request and keeps the registry consistent.
pub fn handle_remove_requests(
    mut events: EventReader<RemoveObjectRequest>,
    mut registry: ResMut<PlacedObjects>,
    objects: Query<&VirtualObject>,
    mut commands: Commands,
) {
    for event in events.read() {
        registry.unregister(event.entity);
        if let Ok(object) = objects.get(event.entity) {
            info!("removing placed object '{}'", object.asset_name);
        }
        commands.entity(event.entity).despawn();
    }
}
