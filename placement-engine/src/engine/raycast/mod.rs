//! Screen-point to world-position resolution.
//!
//! A tap or drag sample is resolved against the best spatial data available
//! this frame, in quality order: plane anchors bounded by their measured
//! extents, cone-filtered feature points, an infinite horizontal fallback
//! plane through a reference object, and finally the nearest raw feature.
//! `None` means "cannot place now", never an error.

use bevy::prelude::*;

use constants::raycast::{
    FEATURE_CONE_HALF_ANGLE_DEG, FEATURE_MAX_DISTANCE, FEATURE_MIN_DISTANCE,
    INFINITE_PLANE_MAX_RAY_SLOPE,
};

use crate::engine::math;
use crate::engine::tracking::TrackingFrame;
use crate::engine::tracking::anchors::{AnchorId, PlaneAlignment, PlaneAnchors};

/// Which data source produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSource {
    ExistingPlane,
    FeaturePoint,
    InfinitePlane,
}

/// One resolved world position for a screen point. Transient; ranked by
/// `distance` from the ray origin where several compete.
#[derive(Debug, Clone, Copy)]
pub struct HitTestCandidate {
    pub position: Vec3,
    pub source: HitSource,
    pub anchor: Option<AnchorId>,
    pub is_on_plane: bool,
    pub distance: f32,
}

impl HitTestCandidate {
    /// Surface alignment this candidate implies. Anchor-less sources read as
    /// horizontal; confirmed planes report their own alignment.
    pub fn observed_alignment(&self, anchors: &PlaneAnchors) -> PlaneAlignment {
        self.anchor
            .and_then(|id| anchors.get(id))
            .map(|a| a.alignment)
            .unwrap_or(PlaneAlignment::Horizontal)
    }

    /// Orientation of the surface under the candidate, identity when no
    /// confirmed plane backs it.
    pub fn surface_rotation(&self, anchors: &PlaneAnchors) -> Quat {
        self.anchor
            .and_then(|id| anchors.get(id))
            .map(|a| a.transform.rotation)
            .unwrap_or(Quat::IDENTITY)
    }
}

/// Resolve `screen_point` into the best available world position.
///
/// `object_position` is the reference height for the infinite-plane fallback
/// (typically the object being dragged). `allow_infinite_plane` forces that
/// fallback to outrank feature hits, which keeps drags continuous while the
/// device moves.
pub fn resolve_world_position(
    screen_point: Vec2,
    frame: &TrackingFrame,
    anchors: &PlaneAnchors,
    object_position: Option<Vec3>,
    allow_infinite_plane: bool,
) -> Option<HitTestCandidate> {
    let camera = frame.camera.as_ref()?;
    let ray = camera.screen_ray(screen_point)?;

    // 1. A plane hit bounded by measured extents is the best quality result
    //    and short-circuits the cascade.
    if let Some(candidate) = hit_existing_planes(&ray, anchors) {
        return Some(candidate);
    }

    // 2. Gather the cone/window-filtered feature hit without returning yet.
    let feature_hit = hit_features_filtered(&ray, &frame.feature_points);

    // 3. Infinite horizontal plane through the reference object's height.
    if allow_infinite_plane || feature_hit.is_none() {
        if let Some(reference) = object_position {
            if let Some(candidate) = hit_infinite_plane(&ray, reference.y) {
                return Some(candidate);
            }
        }
    }

    // 4. The filtered feature hit, if any.
    if let Some(candidate) = feature_hit {
        return Some(candidate);
    }

    // 5. Last resort: nearest raw feature, ignoring cone and window.
    hit_features_unfiltered(&ray, &frame.feature_points)
}

fn hit_existing_planes(ray: &Ray3d, anchors: &PlaneAnchors) -> Option<HitTestCandidate> {
    let mut best: Option<(Vec3, f32, AnchorId)> = None;
    for anchor in anchors.iter() {
        if let Some((position, t)) = anchor.ray_intersection(ray) {
            if best.is_none_or(|(_, best_t, _)| t < best_t) {
                best = Some((position, t, anchor.id));
            }
        }
    }
    best.map(|(position, distance, id)| HitTestCandidate {
        position,
        source: HitSource::ExistingPlane,
        anchor: Some(id),
        is_on_plane: true,
        distance,
    })
}

fn hit_features_filtered(ray: &Ray3d, features: &[Vec3]) -> Option<HitTestCandidate> {
    let direction = ray.direction.as_vec3();
    let max_slope = FEATURE_CONE_HALF_ANGLE_DEG.to_radians().tan();

    let mut best: Option<(f32, f32)> = None; // (perpendicular, along-ray)
    for feature in features {
        let (t, perpendicular) = math::project_onto_ray(ray.origin, direction, *feature);
        if t < FEATURE_MIN_DISTANCE || t > FEATURE_MAX_DISTANCE {
            continue;
        }
        if perpendicular > t * max_slope {
            continue;
        }
        let closer = match best {
            None => true,
            Some((best_perp, best_t)) => {
                perpendicular < best_perp || (perpendicular == best_perp && t < best_t)
            }
        };
        if closer {
            best = Some((perpendicular, t));
        }
    }

    best.map(|(_, t)| HitTestCandidate {
        position: ray.origin + direction * t,
        source: HitSource::FeaturePoint,
        anchor: None,
        is_on_plane: false,
        distance: t,
    })
}

fn hit_infinite_plane(ray: &Ray3d, plane_y: f32) -> Option<HitTestCandidate> {
    let direction = ray.direction.as_vec3();
    // Near-parallel or upward rays produce hits kilometres out or behind the
    // camera; reject them outright.
    if direction.y > INFINITE_PLANE_MAX_RAY_SLOPE {
        return None;
    }
    let t = math::ray_horizontal_plane_t(ray.origin, direction, plane_y)?;
    Some(HitTestCandidate {
        position: ray.origin + direction * t,
        source: HitSource::InfinitePlane,
        anchor: None,
        is_on_plane: true,
        distance: t,
    })
}

fn hit_features_unfiltered(ray: &Ray3d, features: &[Vec3]) -> Option<HitTestCandidate> {
    let direction = ray.direction.as_vec3();
    let mut best: Option<(f32, f32)> = None;
    for feature in features {
        let (t, perpendicular) = math::project_onto_ray(ray.origin, direction, *feature);
        if t <= 0.0 {
            continue;
        }
        if best.is_none_or(|(best_perp, _)| perpendicular < best_perp) {
            best = Some((perpendicular, t));
        }
    }
    best.map(|(_, t)| HitTestCandidate {
        position: ray.origin + direction * t,
        source: HitSource::FeaturePoint,
        anchor: None,
        is_on_plane: false,
        distance: t,
    })
}
