//! Host-fed world tracking data.
//!
//! The tracking engine lives outside this crate; each frame the host writes
//! its latest estimates into [`TrackingFrame`] and delivers plane changes as
//! [`anchors::AnchorEvent`]s. Nothing in here is ever mutated by the core.

use bevy::prelude::*;

pub mod anchors;

use crate::engine::math;

/// Tracking confidence reported by the external engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingQuality {
    Normal,
    Limited(LimitedReason),
    #[default]
    Unavailable,
}

/// Why tracking is degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitedReason {
    Initializing,
    ExcessiveMotion,
    InsufficientFeatures,
    Relocalizing,
}

/// Camera state for one frame, with enough projection information to turn a
/// screen point back into a world-space ray.
#[derive(Debug, Clone, Copy)]
pub struct CameraPose {
    pub transform: Transform,
    /// Viewport size in screen points.
    pub viewport: Vec2,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl CameraPose {
    pub fn new(transform: Transform, viewport: Vec2, fov_y: f32) -> Self {
        Self { transform, viewport, fov_y }
    }

    pub fn translation(&self) -> Vec3 {
        self.transform.translation
    }

    pub fn yaw(&self) -> f32 {
        math::yaw_pitch(self.transform.rotation).0
    }

    pub fn pitch(&self) -> f32 {
        math::yaw_pitch(self.transform.rotation).1
    }

    /// How far the camera looks away from the horizon, regardless of whether
    /// it tilts up or down.
    pub fn tilt(&self) -> f32 {
        self.pitch().abs()
    }

    pub fn screen_center(&self) -> Vec2 {
        self.viewport * 0.5
    }

    /// World-space ray through `screen_point` (origin top-left, y down),
    /// using a pinhole model. The camera looks along its local -Z.
    pub fn screen_ray(&self, screen_point: Vec2) -> Option<Ray3d> {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return None;
        }
        let half_extent = (self.fov_y * 0.5).tan();
        let aspect = self.viewport.x / self.viewport.y;
        let ndc_x = (screen_point.x / self.viewport.x) * 2.0 - 1.0;
        let ndc_y = 1.0 - (screen_point.y / self.viewport.y) * 2.0;
        let local = Vec3::new(ndc_x * half_extent * aspect, ndc_y * half_extent, -1.0);
        let direction = Dir3::new(self.transform.rotation * local).ok()?;
        Some(Ray3d { origin: self.transform.translation, direction })
    }
}

/// Per-frame snapshot written by the host before the update schedule runs.
#[derive(Resource, Debug, Default)]
pub struct TrackingFrame {
    pub camera: Option<CameraPose>,
    pub quality: TrackingQuality,
    /// Sparse environment feature cloud, world space.
    pub feature_points: Vec<Vec3>,
    /// Ambient light estimate in lumens, forwarded to the renderer untouched.
    pub ambient_intensity: Option<f32>,
}

impl TrackingFrame {
    /// True when the frame carries usable pose data.
    pub fn has_tracking(&self) -> bool {
        self.camera.is_some() && self.quality != TrackingQuality::Unavailable
    }
}
