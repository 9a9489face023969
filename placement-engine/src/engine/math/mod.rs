use bevy::prelude::*;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

/// Threshold for considering vectors as parallel or zero-length.
pub const EPSILON: f32 = 1e-6;

/// Threshold for parallel plane/ray detection.
const PLANE_EPSILON: f32 = 1e-5;

/// Intersect a ray with a plane. Returns the intersection point, if any.
pub fn ray_plane_intersection(ray: &Ray3d, plane_origin: Vec3, plane_normal: Vec3) -> Option<Vec3> {
    let denom = plane_normal.dot(ray.direction.as_vec3());
    if denom.abs() < PLANE_EPSILON {
        return None;
    }
    let t = (plane_origin - ray.origin).dot(plane_normal) / denom;
    if t < 0.0 {
        None
    } else {
        Some(ray.origin + ray.direction.as_vec3() * t)
    }
}

/// Distance along the ray to the horizontal plane at `plane_y`, or `None`
/// when the ray never reaches it.
pub fn ray_horizontal_plane_t(origin: Vec3, direction: Vec3, plane_y: f32) -> Option<f32> {
    if direction.y.abs() < PLANE_EPSILON {
        return None;
    }
    let t = (plane_y - origin.y) / direction.y;
    if t > 0.0 { Some(t) } else { None }
}

/// Ray against an oriented bounding box centred on `transform` with full
/// extents `size`. Returns the hit distance along the ray.
pub fn ray_hits_obb(origin: Vec3, dir: Vec3, transform: &Transform, size: Vec3) -> Option<f32> {
    let inv_rot = transform.rotation.inverse();
    let o_local = inv_rot * (origin - transform.translation);
    let d_local = inv_rot * dir;
    let he = size * 0.5;
    ray_aabb_hit_t(o_local, d_local, -he, he)
}

/// Slab-method ray-AABB intersection, returns Some(t) or None.
pub fn ray_aabb_hit_t(ray_origin: Vec3, ray_direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = Vec3::new(
        if ray_direction.x != 0.0 { 1.0 / ray_direction.x } else { f32::INFINITY },
        if ray_direction.y != 0.0 { 1.0 / ray_direction.y } else { f32::INFINITY },
        if ray_direction.z != 0.0 { 1.0 / ray_direction.z } else { f32::INFINITY },
    );

    let (mut tmin, mut tmax) = ((min.x - ray_origin.x) * inv.x, (max.x - ray_origin.x) * inv.x);
    if tmin > tmax { std::mem::swap(&mut tmin, &mut tmax); }

    let (mut tymin, mut tymax) = ((min.y - ray_origin.y) * inv.y, (max.y - ray_origin.y) * inv.y);
    if tymin > tymax { std::mem::swap(&mut tymin, &mut tymax); }

    if (tmin > tymax) || (tymin > tmax) { return None; }
    if tymin > tmin { tmin = tymin; }
    if tymax < tmax { tmax = tymax; }

    let (mut tzmin, mut tzmax) = ((min.z - ray_origin.z) * inv.z, (max.z - ray_origin.z) * inv.z);
    if tzmin > tzmax { std::mem::swap(&mut tzmin, &mut tzmax); }

    if (tmin > tzmax) || (tzmin > tmax) { return None; }
    if tzmin > tmin { tmin = tzmin; }
    if tzmax < tmax { tmax = tzmax; }

    if tmax < 0.0 { return None; }
    Some(if tmin >= 0.0 { tmin } else { tmax })
}

/// Project `point` onto the ray, returning the distance along the ray and the
/// perpendicular distance from the ray to the point.
pub fn project_onto_ray(origin: Vec3, direction: Vec3, point: Vec3) -> (f32, f32) {
    let v = point - origin;
    let t = v.dot(direction);
    let closest = origin + direction * t;
    (t, point.distance(closest))
}

/// Snap `angle` to the nearest quarter-turn multiple relative to `reference`
/// by repeated ±90° adjustment until the two are within 45° of each other.
pub fn normalized_for_minimal_rotation(angle: f32, reference: f32) -> f32 {
    let mut normalized = angle;
    while normalized - reference > FRAC_PI_4 {
        normalized -= FRAC_PI_2;
    }
    while reference - normalized > FRAC_PI_4 {
        normalized += FRAC_PI_2;
    }
    normalized
}

/// Yaw and pitch of an orientation, in the same YXZ convention the camera
/// controller uses.
pub fn yaw_pitch(rotation: Quat) -> (f32, f32) {
    let (yaw, pitch, _roll) = rotation.to_euler(EulerRot::YXZ);
    (yaw, pitch)
}
