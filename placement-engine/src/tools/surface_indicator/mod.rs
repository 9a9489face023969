//! Surface acquisition indicator.
//!
//! Runs once per frame against the screen center and fuses the noisy
//! per-frame hit-test results into a stable, jitter-free pose for the
//! indicator entity. Visual transitions (segments opening, closing, the
//! first-visit flash) are emitted as [`IndicatorVisual`] events for the
//! rendering collaborator; position, scale and orientation are written to the
//! indicator entity's `Transform` directly.
//!
//! ## State machine
//!
//! `Initializing` — no usable surface this frame. The indicator billboards a
//! fixed small offset in front of the camera.
//!
//! `Detecting` — a hit-test candidate exists. With a confirmed plane anchor
//! the segments close (plus a flash the first time each anchor is visited);
//! without one they open, signalling "surface approximate".
//!
//! Transitions are suppressed when the new state is value-equal to the old
//! one, so redundant animations never fire.

use bevy::prelude::*;
use std::collections::HashSet;
use std::f32::consts::FRAC_PI_2;

use constants::indicator::{
    BILLBOARD_FORWARD_OFFSET, HORIZONTAL_COMMIT_COUNT, SCALE_FAR_GRADIENT, SCALE_FAR_OFFSET,
    SCALE_NEAR_DISTANCE, TILT_BLEND_END, TILT_BLEND_START, VERTICAL_COMMIT_COUNT,
};
use constants::indicator::ALIGNMENT_ANIMATION_SECS;

use crate::engine::animation::Easing;
use crate::engine::history::{AlignmentHistory, PositionHistory};
use crate::engine::math::normalized_for_minimal_rotation;
use crate::engine::objects::loader::{ObjectLoader, PlacementCatalog};
use crate::engine::raycast::{HitTestCandidate, resolve_world_position};
use crate::engine::tracking::anchors::{AnchorId, PlaneAlignment, PlaneAnchors};
use crate::engine::tracking::{CameraPose, TrackingFrame};

/// Marker for the indicator's scene entity.
#[derive(Component)]
pub struct FocusIndicator;

/// Current acquisition state. `Detecting` carries the candidate and the
/// camera it was resolved against.
#[derive(Debug, Clone, Copy)]
pub enum IndicatorState {
    Initializing,
    Detecting {
        candidate: HitTestCandidate,
        camera: CameraPose,
    },
}

impl IndicatorState {
    /// Value comparison over the semantic fields (position and anchor
    /// identity), used for transition suppression.
    pub fn value_eq(&self, other: &IndicatorState) -> bool {
        match (self, other) {
            (IndicatorState::Initializing, IndicatorState::Initializing) => true,
            (
                IndicatorState::Detecting { candidate: a, .. },
                IndicatorState::Detecting { candidate: b, .. },
            ) => a.position == b.position && a.anchor == b.anchor,
            _ => false,
        }
    }
}

/// Visual transitions for the rendering collaborator.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorVisual {
    /// Segments separate: surface approximate, not confirmed.
    Open,
    /// Segments join into a solid square: confirmed plane under the center.
    Close,
    /// Brief highlight on the first visit to a plane anchor.
    FlashFill,
    /// Reverted to the camera-parallel default placement.
    Billboard,
    FadeIn,
    FadeOut,
}

struct AlignmentAnimation {
    from: Quat,
    to: Quat,
    elapsed: f32,
}

/// The indicator state machine and its smoothing/hysteresis buffers.
#[derive(Resource)]
pub struct SurfaceIndicator {
    state: IndicatorState,
    entity: Option<Entity>,
    position_history: PositionHistory,
    alignment_history: AlignmentHistory,
    committed_alignment: PlaneAlignment,
    last_known_position: Option<Vec3>,
    visited_anchors: HashSet<AnchorId>,
    hidden: bool,
    /// Reference yaw for minimal-rotation normalization.
    current_yaw: f32,
    alignment_animation: Option<AlignmentAnimation>,
}

impl Default for SurfaceIndicator {
    fn default() -> Self {
        Self {
            state: IndicatorState::Initializing,
            entity: None,
            position_history: PositionHistory::default(),
            alignment_history: AlignmentHistory::default(),
            committed_alignment: PlaneAlignment::Horizontal,
            last_known_position: None,
            visited_anchors: HashSet::new(),
            hidden: false,
            current_yaw: 0.0,
            alignment_animation: None,
        }
    }
}

impl SurfaceIndicator {
    pub fn state(&self) -> &IndicatorState {
        &self.state
    }

    pub fn is_initializing(&self) -> bool {
        matches!(self.state, IndicatorState::Initializing)
    }

    pub fn last_known_position(&self) -> Option<Vec3> {
        self.last_known_position
    }

    pub fn committed_alignment(&self) -> PlaneAlignment {
        self.committed_alignment
    }

    /// Anchor currently under the screen center, if the plane is confirmed.
    pub fn focused_anchor(&self) -> Option<AnchorId> {
        match self.state {
            IndicatorState::Detecting { candidate, .. } => candidate.anchor,
            IndicatorState::Initializing => None,
        }
    }

    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Hide or unhide the indicator. A no-op when already in the requested
    /// visual state, so interruption and recovery paths may call it freely.
    pub fn set_hidden(&mut self, hidden: bool) -> Option<IndicatorVisual> {
        if self.hidden == hidden {
            return None;
        }
        self.hidden = hidden;
        Some(if hidden { IndicatorVisual::FadeOut } else { IndicatorVisual::FadeIn })
    }

    /// Back to square one: state, buffers and anchor memory all clear.
    pub fn reset(&mut self) {
        self.state = IndicatorState::Initializing;
        self.position_history.clear();
        self.alignment_history.clear();
        self.committed_alignment = PlaneAlignment::Horizontal;
        self.last_known_position = None;
        self.visited_anchors.clear();
        self.current_yaw = 0.0;
        self.alignment_animation = None;
    }

    /// Record one alignment observation and decide whether the committed
    /// alignment changes. A confirmed anchor commits immediately; feature
    /// observations must dominate the rolling window first, with a lower bar
    /// for vertical (vertical surfaces are observed less consistently).
    /// Suppressed entirely while an alignment animation is in flight.
    fn observe_alignment(&mut self, observed: PlaneAlignment, confirmed_anchor: bool) -> bool {
        if self.alignment_animation.is_some() {
            return false;
        }
        self.alignment_history.push(observed);
        let new = if confirmed_anchor {
            observed
        } else if self.alignment_history.count(PlaneAlignment::Horizontal) > HORIZONTAL_COMMIT_COUNT
        {
            PlaneAlignment::Horizontal
        } else if self.alignment_history.count(PlaneAlignment::Vertical) > VERTICAL_COMMIT_COUNT {
            PlaneAlignment::Vertical
        } else {
            self.committed_alignment
        };
        let changed = new != self.committed_alignment;
        self.committed_alignment = new;
        changed
    }

    /// Yaw the indicator should face: the camera's own yaw while it looks
    /// roughly at the horizon, snapping toward the nearest quarter turn as it
    /// tilts down at the surface, with a linear blend in between so the
    /// transition never pops.
    fn blended_yaw(&mut self, camera: &CameraPose) -> f32 {
        let tilt = camera.tilt();
        let blend_start = TILT_BLEND_START * FRAC_PI_2;
        let blend_end = TILT_BLEND_END * FRAC_PI_2;
        let raw = camera.yaw();
        let normalized = normalized_for_minimal_rotation(raw, self.current_yaw);
        let yaw = if tilt < blend_start {
            raw
        } else if tilt >= blend_end {
            normalized
        } else {
            let fraction = (tilt - blend_start) / (blend_end - blend_start);
            raw * (1.0 - fraction) + normalized * fraction
        };
        self.current_yaw = yaw;
        yaw
    }
}

/// Displayed scale as a function of camera distance: shrinks proportionally
/// close up, grows gently at range. Exactly 1.0 at the near distance.
pub fn displayed_scale(distance: f32) -> f32 {
    if distance < SCALE_NEAR_DISTANCE {
        distance / SCALE_NEAR_DISTANCE
    } else {
        SCALE_FAR_GRADIENT * distance + SCALE_FAR_OFFSET
    }
}

/// Spawns the indicator's scene entity.
pub fn spawn_surface_indicator(
    mut commands: Commands,
    mut indicator: ResMut<SurfaceIndicator>,
) {
    let entity = commands
        .spawn((FocusIndicator, Transform::IDENTITY, Name::new("SurfaceIndicator")))
        .id();
    indicator.entity = Some(entity);
}

/// Per-frame indicator refresh: resolve the screen center, run the state
/// machine, and write the smoothed pose.
pub fn update_surface_indicator(
    time: Res<Time>,
    frame: Res<TrackingFrame>,
    anchors: Res<PlaneAnchors>,
    mut indicator: ResMut<SurfaceIndicator>,
    mut transforms: Query<&mut Transform, With<FocusIndicator>>,
    mut visuals: EventWriter<IndicatorVisual>,
) {
    let Some(entity) = indicator.entity else { return };
    let Ok(mut transform) = transforms.get_mut(entity) else { return };

    // Advance an in-flight alignment rotation; it owns the rotation channel
    // until it completes.
    if let Some(animation) = indicator.alignment_animation.as_mut() {
        animation.elapsed += time.delta_secs();
        let fraction = (animation.elapsed / ALIGNMENT_ANIMATION_SECS).min(1.0);
        transform.rotation = animation
            .from
            .slerp(animation.to, Easing::EaseInOut.apply(fraction));
        if fraction >= 1.0 {
            indicator.alignment_animation = None;
        }
    }

    if indicator.hidden {
        return;
    }

    let candidate = match frame.camera {
        Some(camera) if frame.has_tracking() => {
            resolve_world_position(camera.screen_center(), &frame, &anchors, None, false)
        }
        _ => None,
    };

    let (Some(camera), Some(candidate)) = (frame.camera, candidate) else {
        become_initializing(&mut indicator, frame.camera.as_ref(), &mut transform, &mut visuals);
        return;
    };

    let new_state = IndicatorState::Detecting { candidate, camera };
    if !indicator.state.value_eq(&new_state) {
        match candidate.anchor {
            Some(id) => {
                visuals.write(IndicatorVisual::Close);
                if indicator.visited_anchors.insert(id) {
                    debug!("new plane visited: {id:?}");
                    visuals.write(IndicatorVisual::FlashFill);
                }
            }
            None => {
                visuals.write(IndicatorVisual::Open);
            }
        }
        indicator.state = new_state;
    }
    indicator.last_known_position = Some(candidate.position);

    // Smoothed position and distance-dependent scale, every frame.
    let displayed = indicator.position_history.smoothed(candidate.position);
    transform.translation = displayed;
    let distance = camera.translation().distance(displayed);
    transform.scale = Vec3::splat(displayed_scale(distance));

    // Orientation: blend the yaw, then ease any committed alignment change.
    let observed = candidate.observed_alignment(&anchors);
    let changed = indicator.observe_alignment(observed, candidate.anchor.is_some());
    let yaw = indicator.blended_yaw(&camera);
    let target_rotation = match indicator.committed_alignment {
        PlaneAlignment::Horizontal => Quat::from_rotation_y(yaw),
        PlaneAlignment::Vertical => candidate.surface_rotation(&anchors) * Quat::from_rotation_y(yaw),
    };
    if changed {
        indicator.alignment_animation = Some(AlignmentAnimation {
            from: transform.rotation,
            to: target_rotation,
            elapsed: 0.0,
        });
    } else if indicator.alignment_animation.is_none() {
        transform.rotation = target_rotation;
    }
}

fn become_initializing(
    indicator: &mut SurfaceIndicator,
    camera: Option<&CameraPose>,
    transform: &mut Transform,
    visuals: &mut EventWriter<IndicatorVisual>,
) {
    if !indicator.is_initializing() {
        indicator.state = IndicatorState::Initializing;
        indicator.last_known_position = None;
        indicator.position_history.clear();
        indicator.alignment_animation = None;
        visuals.write(IndicatorVisual::Open);
        visuals.write(IndicatorVisual::Billboard);
    }
    // Billboard: parallel to the camera, a fixed small offset in front,
    // following it every frame.
    if let Some(camera) = camera {
        transform.translation = camera.translation()
            + camera.transform.rotation * Vec3::new(0.0, 0.0, -BILLBOARD_FORWARD_OFFSET);
        transform.rotation = camera.transform.rotation;
        transform.scale = Vec3::ONE;
    }
}

/// Which catalog assets may be placed on the currently focused plane, for
/// enabling and disabling picker rows.
#[derive(Resource, Debug, Default)]
pub struct PlacementValidity {
    pub rows: Vec<(String, bool)>,
}

pub fn refresh_placement_validity(
    indicator: Res<SurfaceIndicator>,
    anchors: Res<PlaneAnchors>,
    loader: Res<ObjectLoader>,
    catalogs: Res<Assets<PlacementCatalog>>,
    mut validity: ResMut<PlacementValidity>,
) {
    let Some(catalog) = loader.catalog().and_then(|handle| catalogs.get(handle)) else {
        validity.rows.clear();
        return;
    };
    let focused = indicator.focused_anchor().and_then(|id| anchors.get(id));
    validity.rows = catalog
        .assets
        .iter()
        .map(|definition| {
            let valid = focused.is_none_or(|anchor| {
                definition.allowed_alignments.contains(&anchor.alignment)
            });
            (definition.name.clone(), valid)
        })
        .collect();
}
