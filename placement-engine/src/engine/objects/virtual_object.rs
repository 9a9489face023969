use bevy::prelude::*;

use constants::indicator::ALIGNMENT_ANIMATION_SECS;
use constants::placement::{
    FOOTPRINT_TOLERANCE, MAX_PLACEMENT_DISTANCE, SNAP_DURATION_PER_METER, SNAP_EPSILON,
    SNAP_MAX_OFFSET, VERTICAL_ENTRY_YAW,
};

use crate::engine::history::PositionHistory;
use crate::engine::objects::loader::AssetDefinition;
use crate::engine::tracking::CameraPose;
use crate::engine::tracking::anchors::{AnchorId, PlaneAlignment, PlaneAnchor};

/// Where a mutating operation wants the entity to end up, and over how long.
/// The caller wraps this into an animation request for the renderer.
#[derive(Debug, Clone, Copy)]
pub struct AnimationTarget {
    pub translation: Vec3,
    pub rotation: Quat,
    pub duration: f32,
}

/// State of one placed object.
///
/// Orientation is composed from a base rotation given by the surface the
/// object sits on and a user-controlled spin about the object's own up axis,
/// so objects on tilted or vertical surfaces rotate in their own plane rather
/// than the world's.
#[derive(Component, Debug, Clone)]
pub struct VirtualObject {
    pub asset_name: String,
    pub allowed_alignments: Vec<PlaneAlignment>,
    current_alignment: PlaneAlignment,
    /// Yaw remembered across a stay on a vertical surface, restored when the
    /// object returns to a horizontal one.
    rotation_when_horizontal: f32,
    /// Spin about the object's local up axis.
    yaw: f32,
    base_rotation: Quat,
    pub anchor: Option<AnchorId>,
    position_history: PositionHistory,
    is_changing_alignment: bool,
}

/// Outcome of an alignment update: the pose to commit and whether it should
/// be eased. `animated` set means the guard flag is armed and the caller must
/// play an animation that ends in [`VirtualObject::finish_alignment_animation`].
#[derive(Debug, Clone, Copy)]
pub struct AlignmentOutcome {
    pub translation: Vec3,
    pub rotation: Quat,
    pub animated: bool,
}

impl VirtualObject {
    pub fn new(asset_name: impl Into<String>, allowed_alignments: Vec<PlaneAlignment>) -> Self {
        let current_alignment = if allowed_alignments.contains(&PlaneAlignment::Horizontal) {
            PlaneAlignment::Horizontal
        } else {
            PlaneAlignment::Vertical
        };
        Self {
            asset_name: asset_name.into(),
            allowed_alignments,
            current_alignment,
            rotation_when_horizontal: 0.0,
            yaw: 0.0,
            base_rotation: Quat::IDENTITY,
            anchor: None,
            position_history: PositionHistory::default(),
            is_changing_alignment: false,
        }
    }

    pub fn from_definition(definition: &AssetDefinition) -> Self {
        Self::new(definition.name.clone(), definition.allowed_alignments.clone())
    }

    pub fn current_alignment(&self) -> PlaneAlignment {
        self.current_alignment
    }

    pub fn is_changing_alignment(&self) -> bool {
        self.is_changing_alignment
    }

    pub fn finish_alignment_animation(&mut self) {
        self.is_changing_alignment = false;
    }

    /// Unconstrained placements (mid-drag over feature points) are always
    /// valid; a confirmed plane must match the asset's allowed alignments.
    pub fn is_placement_valid(&self, anchor: Option<&PlaneAnchor>) -> bool {
        anchor.is_none_or(|a| self.allowed_alignments.contains(&a.alignment))
    }

    pub fn composed_rotation(&self) -> Quat {
        self.base_rotation * Quat::from_rotation_y(self.yaw)
    }

    /// Spin the object in its own plane.
    pub fn apply_yaw_delta(&mut self, transform: &mut Transform, delta: f32) {
        self.yaw += delta;
        transform.rotation = self.composed_rotation();
    }

    /// Move the object to a resolved world position.
    ///
    /// The camera-relative offset is clamped to 10 m so a degenerate hit test
    /// cannot fling the object out of the scene. With `smooth_movement` the
    /// position runs through the object's own history buffer; direct
    /// application clears the buffer so later smoothing starts fresh.
    ///
    /// Returns an [`AnimationTarget`] when the embedded alignment change
    /// wants easing; otherwise the transform is updated in place.
    #[allow(clippy::too_many_arguments)]
    pub fn set_transform(
        &mut self,
        transform: &mut Transform,
        new_translation: Vec3,
        surface_rotation: Quat,
        camera: &CameraPose,
        smooth_movement: bool,
        alignment: PlaneAlignment,
        allow_animation: bool,
    ) -> Option<AnimationTarget> {
        let camera_translation = camera.translation();
        let offset = (new_translation - camera_translation).clamp_length_max(MAX_PLACEMENT_DISTANCE);
        let target = camera_translation + offset;
        let position = if smooth_movement {
            self.position_history.smoothed(target)
        } else {
            self.position_history.clear();
            target
        };

        match self.update_alignment(position, surface_rotation, alignment, allow_animation) {
            Some(outcome) if outcome.animated => Some(AnimationTarget {
                translation: outcome.translation,
                rotation: outcome.rotation,
                duration: ALIGNMENT_ANIMATION_SECS,
            }),
            Some(outcome) => {
                transform.translation = outcome.translation;
                transform.rotation = outcome.rotation;
                None
            }
            None => None,
        }
    }

    /// Commit a new alignment, deriving the orientation for it.
    ///
    /// No-op while an alignment animation is in flight. Staying horizontal
    /// only moves the object; any path through vertical re-derives the base
    /// rotation from the surface. Yaw is remembered across vertical stays and
    /// restored on the way back.
    pub fn update_alignment(
        &mut self,
        position: Vec3,
        surface_rotation: Quat,
        alignment: PlaneAlignment,
        allow_animation: bool,
    ) -> Option<AlignmentOutcome> {
        if self.is_changing_alignment {
            return None;
        }
        let changed = alignment != self.current_alignment;
        if !changed && alignment == PlaneAlignment::Horizontal {
            return Some(AlignmentOutcome {
                translation: position,
                rotation: self.composed_rotation(),
                animated: false,
            });
        }

        match (self.current_alignment, alignment) {
            (PlaneAlignment::Vertical, PlaneAlignment::Horizontal) => {
                self.yaw = self.rotation_when_horizontal;
            }
            (PlaneAlignment::Horizontal, PlaneAlignment::Vertical) => {
                self.rotation_when_horizontal = self.yaw;
                self.yaw = VERTICAL_ENTRY_YAW;
            }
            _ => {}
        }
        self.current_alignment = alignment;
        self.base_rotation = match alignment {
            PlaneAlignment::Horizontal => Quat::IDENTITY,
            PlaneAlignment::Vertical => surface_rotation,
        };

        let animated = changed && allow_animation;
        if animated {
            self.is_changing_alignment = true;
        }
        Some(AlignmentOutcome {
            translation: position,
            rotation: self.composed_rotation(),
            animated,
        })
    }

    /// Snap the object onto a freshly reported or refined plane.
    ///
    /// Rejects planes the asset does not allow, positions outside the 10 %
    /// expanded footprint, offsets too small to perceive, and offsets large
    /// enough that the object must rest on a different surface. A successful
    /// snap binds the anchor and yields a height-correction animation whose
    /// duration grows with the offset; an alignment change folds in at the
    /// standard alignment easing.
    pub fn adjust_onto_plane_anchor(
        &mut self,
        transform: &mut Transform,
        anchor: &PlaneAnchor,
    ) -> Option<AnimationTarget> {
        if !self.is_placement_valid(Some(anchor)) {
            return None;
        }
        let local = anchor.world_to_local(transform.translation);
        if local.y == 0.0 {
            // Already exactly on the plane.
            return None;
        }
        if !anchor.footprint_contains(local, FOOTPRINT_TOLERANCE) {
            return None;
        }
        let offset = local.y.abs();
        if offset < SNAP_EPSILON || offset > SNAP_MAX_OFFSET {
            return None;
        }

        self.anchor = Some(anchor.id);
        let snapped = anchor.local_to_world(Vec3::new(local.x, 0.0, local.z));
        let outcome =
            self.update_alignment(snapped, anchor.transform.rotation, anchor.alignment, true);
        let (rotation, duration) = match outcome {
            Some(o) if o.animated => (o.rotation, ALIGNMENT_ANIMATION_SECS),
            Some(o) => (o.rotation, offset * SNAP_DURATION_PER_METER),
            None => (transform.rotation, offset * SNAP_DURATION_PER_METER),
        };
        Some(AnimationTarget {
            translation: snapped,
            rotation,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_3;

    fn camera() -> CameraPose {
        CameraPose::new(Transform::IDENTITY, Vec2::new(800.0, 600.0), FRAC_PI_3)
    }

    fn horizontal_object() -> VirtualObject {
        VirtualObject::new("lamp", vec![PlaneAlignment::Horizontal, PlaneAlignment::Vertical])
    }

    fn floor_anchor() -> PlaneAnchor {
        PlaneAnchor {
            id: AnchorId(3),
            alignment: PlaneAlignment::Horizontal,
            center: Vec2::ZERO,
            extent: Vec2::new(2.0, 2.0),
            transform: Transform::IDENTITY,
        }
    }

    #[test]
    fn runaway_offsets_clamp_to_ten_meters() {
        let mut object = horizontal_object();
        let mut transform = Transform::IDENTITY;
        object.set_transform(
            &mut transform,
            Vec3::new(0.0, 0.0, -15.0),
            Quat::IDENTITY,
            &camera(),
            false,
            PlaneAlignment::Horizontal,
            false,
        );
        assert_relative_eq!(transform.translation.length(), 10.0, epsilon = 1e-5);
        assert_relative_eq!(transform.translation.z, -10.0, epsilon = 1e-5);
    }

    #[test]
    fn smoothing_runs_through_the_history_buffer() {
        let mut object = horizontal_object();
        let mut transform = Transform::IDENTITY;
        object.set_transform(
            &mut transform,
            Vec3::new(1.0, 0.0, -1.0),
            Quat::IDENTITY,
            &camera(),
            true,
            PlaneAlignment::Horizontal,
            false,
        );
        object.set_transform(
            &mut transform,
            Vec3::new(3.0, 0.0, -1.0),
            Quat::IDENTITY,
            &camera(),
            true,
            PlaneAlignment::Horizontal,
            false,
        );
        // Mean of the two samples.
        assert_relative_eq!(transform.translation.x, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn vertical_stay_remembers_horizontal_yaw() {
        let mut object = horizontal_object();
        let mut transform = Transform::IDENTITY;
        object.apply_yaw_delta(&mut transform, 1.2);

        let wall_rotation = Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);
        let outcome = object
            .update_alignment(Vec3::ZERO, wall_rotation, PlaneAlignment::Vertical, false)
            .unwrap();
        assert!(!outcome.animated);
        assert_relative_eq!(object.yaw, VERTICAL_ENTRY_YAW);

        object
            .update_alignment(Vec3::ZERO, Quat::IDENTITY, PlaneAlignment::Horizontal, false)
            .unwrap();
        assert_relative_eq!(object.yaw, 1.2);
    }

    #[test]
    fn alignment_guard_blocks_reentrant_updates() {
        let mut object = horizontal_object();
        let outcome = object
            .update_alignment(
                Vec3::ZERO,
                Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
                PlaneAlignment::Vertical,
                true,
            )
            .unwrap();
        assert!(outcome.animated);
        assert!(object.is_changing_alignment());
        assert!(
            object
                .update_alignment(Vec3::ZERO, Quat::IDENTITY, PlaneAlignment::Horizontal, true)
                .is_none()
        );
        object.finish_alignment_animation();
        assert!(
            object
                .update_alignment(Vec3::ZERO, Quat::IDENTITY, PlaneAlignment::Horizontal, true)
                .is_some()
        );
    }

    #[test]
    fn snap_animates_in_proportion_to_the_offset() {
        let mut object = horizontal_object();
        let mut transform = Transform::from_translation(Vec3::new(0.2, 0.03, 0.0));
        let target = object
            .adjust_onto_plane_anchor(&mut transform, &floor_anchor())
            .unwrap();
        assert_relative_eq!(target.translation.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(target.duration, 15.0, epsilon = 1e-3);
        assert_eq!(object.anchor, Some(AnchorId(3)));
    }

    #[test]
    fn imperceptible_offsets_are_left_alone() {
        let mut object = horizontal_object();
        let mut transform = Transform::from_translation(Vec3::new(0.0, 0.0005, 0.0));
        assert!(
            object
                .adjust_onto_plane_anchor(&mut transform, &floor_anchor())
                .is_none()
        );
    }

    #[test]
    fn distant_surfaces_are_not_snapped_to() {
        let mut object = horizontal_object();
        let mut transform = Transform::from_translation(Vec3::new(0.0, 0.10, 0.0));
        assert!(
            object
                .adjust_onto_plane_anchor(&mut transform, &floor_anchor())
                .is_none()
        );
    }

    #[test]
    fn footprint_tolerance_bounds_the_snap() {
        let mut object = horizontal_object();
        let anchor = floor_anchor();
        let edge = anchor.extent.x * 0.5 + anchor.extent.x * 0.1;
        let mut on_edge = Transform::from_translation(Vec3::new(edge, 0.03, 0.0));
        assert!(object.adjust_onto_plane_anchor(&mut on_edge, &anchor).is_some());

        let mut object = horizontal_object();
        let mut past_edge = Transform::from_translation(Vec3::new(edge + 0.001, 0.03, 0.0));
        assert!(object.adjust_onto_plane_anchor(&mut past_edge, &anchor).is_none());
    }

    #[test]
    fn wall_only_assets_reject_horizontal_planes() {
        let object = VirtualObject::new("poster", vec![PlaneAlignment::Vertical]);
        assert!(!object.is_placement_valid(Some(&floor_anchor())));
        assert!(object.is_placement_valid(None));
    }
}
