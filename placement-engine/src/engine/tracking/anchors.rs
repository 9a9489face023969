use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::engine::math;

/// Whether a detected surface is horizontal or vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaneAlignment {
    Horizontal,
    Vertical,
}

/// Stable identity handed out by the tracking engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

/// Snapshot of one detected plane. The plane lies in the anchor's local XZ
/// plane (local +Y is the surface normal), offset by `center` and bounded by
/// `extent`.
#[derive(Debug, Clone, Copy)]
pub struct PlaneAnchor {
    pub id: AnchorId,
    pub alignment: PlaneAlignment,
    /// Plane-local offset of the measured extent, XZ.
    pub center: Vec2,
    /// Measured width (x) and depth (z).
    pub extent: Vec2,
    pub transform: Transform,
}

impl PlaneAnchor {
    pub fn world_to_local(&self, point: Vec3) -> Vec3 {
        self.transform.rotation.inverse() * (point - self.transform.translation)
    }

    pub fn local_to_world(&self, point: Vec3) -> Vec3 {
        self.transform.rotation * point + self.transform.translation
    }

    /// Whether a plane-local point falls within the measured extent expanded
    /// by `tolerance` as a fraction of the extent in each planar axis.
    pub fn footprint_contains(&self, local: Vec3, tolerance: f32) -> bool {
        let allow_x = self.extent.x * (0.5 + tolerance);
        let allow_z = self.extent.y * (0.5 + tolerance);
        (local.x - self.center.x).abs() <= allow_x && (local.z - self.center.y).abs() <= allow_z
    }

    /// Intersect a world-space ray with the plane, bounded by the measured
    /// extent. Returns the world hit point and the distance along the ray.
    pub fn ray_intersection(&self, ray: &Ray3d) -> Option<(Vec3, f32)> {
        let origin = self.world_to_local(ray.origin);
        let direction = self.transform.rotation.inverse() * ray.direction.as_vec3();
        let t = math::ray_horizontal_plane_t(origin, direction, 0.0)?;
        let local = origin + direction * t;
        if !self.footprint_contains(local, 0.0) {
            return None;
        }
        Some((self.local_to_world(local), t))
    }
}

/// Live set of detected planes, keyed by anchor id. Maintained from
/// [`AnchorEvent`]s on the update schedule; the tracking engine owns the
/// source data.
#[derive(Resource, Debug, Default)]
pub struct PlaneAnchors {
    anchors: BTreeMap<AnchorId, PlaneAnchor>,
}

impl PlaneAnchors {
    pub fn get(&self, id: AnchorId) -> Option<&PlaneAnchor> {
        self.anchors.get(&id)
    }

    pub fn insert(&mut self, anchor: PlaneAnchor) {
        self.anchors.insert(anchor.id, anchor);
    }

    pub fn remove(&mut self, id: AnchorId) -> Option<PlaneAnchor> {
        self.anchors.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaneAnchor> {
        self.anchors.values()
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn clear(&mut self) {
        self.anchors.clear();
    }
}

/// Plane lifecycle notifications from the tracking engine.
#[derive(Event, Debug, Clone)]
pub enum AnchorEvent {
    Added(PlaneAnchor),
    Updated(PlaneAnchor),
    Removed(AnchorId),
}

/// Folds anchor notifications into the [`PlaneAnchors`] store.
pub fn apply_anchor_events(
    mut events: EventReader<AnchorEvent>,
    mut anchors: ResMut<PlaneAnchors>,
) {
    for event in events.read() {
        match event {
            AnchorEvent::Added(anchor) | AnchorEvent::Updated(anchor) => anchors.insert(*anchor),
            AnchorEvent::Removed(id) => {
                anchors.remove(*id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn floor_anchor() -> PlaneAnchor {
        PlaneAnchor {
            id: AnchorId(1),
            alignment: PlaneAlignment::Horizontal,
            center: Vec2::ZERO,
            extent: Vec2::new(2.0, 2.0),
            transform: Transform::from_translation(Vec3::new(0.0, -1.0, 0.0)),
        }
    }

    #[test]
    fn ray_hits_within_extent() {
        let anchor = floor_anchor();
        let ray = Ray3d {
            origin: Vec3::new(0.5, 1.0, 0.0),
            direction: Dir3::new(Vec3::new(0.0, -1.0, 0.0)).unwrap(),
        };
        let (hit, t) = anchor.ray_intersection(&ray).unwrap();
        assert_relative_eq!(hit.y, -1.0);
        assert_relative_eq!(hit.x, 0.5);
        assert_relative_eq!(t, 2.0);
    }

    #[test]
    fn ray_misses_outside_extent() {
        let anchor = floor_anchor();
        let ray = Ray3d {
            origin: Vec3::new(3.0, 1.0, 0.0),
            direction: Dir3::new(Vec3::new(0.0, -1.0, 0.0)).unwrap(),
        };
        assert!(anchor.ray_intersection(&ray).is_none());
    }

    #[test]
    fn footprint_edge_is_inside_expanded_tolerance() {
        let anchor = floor_anchor();
        let half = anchor.extent.x * 0.5;
        let expansion = anchor.extent.x * 0.1;
        assert!(anchor.footprint_contains(Vec3::new(half, 0.0, 0.0), 0.1));
        assert!(anchor.footprint_contains(Vec3::new(half + expansion, 0.0, 0.0), 0.1));
        assert!(!anchor.footprint_contains(Vec3::new(half + expansion + 0.001, 0.0, 0.0), 0.1));
    }

    #[test]
    fn events_maintain_the_store() {
        let mut store = PlaneAnchors::default();
        let anchor = floor_anchor();
        store.insert(anchor);
        assert_eq!(store.len(), 1);
        let mut updated = anchor;
        updated.extent = Vec2::new(4.0, 4.0);
        store.insert(updated);
        assert_eq!(store.len(), 1);
        assert_relative_eq!(store.get(AnchorId(1)).unwrap().extent.x, 4.0);
        store.remove(AnchorId(1));
        assert!(store.is_empty());
    }
}
