//! Surface placement engine.
//!
//! Places and manipulates virtual 3D objects on surfaces detected in a live,
//! noisy 3D reconstruction of the physical world, with continuous visual
//! feedback about tracking quality. The world-tracking engine, the renderer
//! and the UI chrome are external collaborators reached only through narrow
//! resource/event interfaces.
//!
//! ## Architecture
//!
//! The host feeds tracking data in and applies animation out:
//!
//! ```text
//! TrackingFrame (Resource)          AnchorEvent / SessionEvent (Events)
//!   └─> written by the host            └─> from the tracking engine
//!          each frame
//!
//! Hit-Test Resolver (engine::raycast)
//!   └─> screen point -> best world position, per query
//!
//! SurfaceIndicator (tools::surface_indicator)
//!   └─> continuous screen-center acquisition, smoothing, hysteresis
//!   └─> IndicatorVisual events for the renderer
//!
//! VirtualObject entities (engine::objects)
//!   └─> alignment memory, smoothing history, anchor binding
//!   └─> AnimationRequest events; the built-in driver tweens Transforms
//!
//! Interaction controller (tools::interaction)
//!   └─> TouchInput -> pan/rotation/tap -> object mutations
//! ```
//!
//! All mutation funnels through the `Update` schedule: touch input, anchor
//! callbacks and load completions arrive as events or polled tasks and are
//! drained there, giving a single-writer discipline with no locks. The async
//! compute pool only prepares models; nothing per-frame ever blocks.

use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;

pub mod engine;
pub mod tools;

pub use engine::animation::{ActiveAnimation, AnimationCompleted, AnimationRequest, Easing};
pub use engine::history::{AlignmentHistory, PositionHistory};
pub use engine::objects::loader::{
    AssetDefinition, ObjectLoader, ObjectPlaced, PlaceObjectRequest, PlacementCatalog,
    PlacementRejected,
};
pub use engine::objects::{
    BoundsSize, PlacedObjects, RemoveObjectRequest, Selected, VirtualObject, VisibilityRequest,
    topmost_object_at,
};
pub use engine::raycast::{HitSource, HitTestCandidate, resolve_world_position};
pub use engine::session::{
    RestartRequest, SessionError, SessionEvent, SessionReset, SessionStatus, Severity,
    StatusMessage,
};
pub use engine::tracking::anchors::{AnchorEvent, AnchorId, PlaneAlignment, PlaneAnchor, PlaneAnchors};
pub use engine::tracking::{CameraPose, LimitedReason, TrackingFrame, TrackingQuality};
pub use tools::interaction::{
    GesturePhase, GestureSession, InteractionSettings, PanGesture, RotationGesture, TapGesture,
};
pub use tools::surface_indicator::{
    FocusIndicator, IndicatorState, IndicatorVisual, PlacementValidity, SurfaceIndicator,
};

/// Registers every resource, event and system of the placement core.
///
/// Requires Bevy's `AssetPlugin` (for the placement catalog) and the task
/// pool plugins; `DefaultPlugins` or `MinimalPlugins + AssetPlugin` both
/// satisfy that.
pub struct PlacementEnginePlugin;

impl Plugin for PlacementEnginePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(JsonAssetPlugin::<PlacementCatalog>::new(&["catalog.json"]))
            // init resources
            .init_resource::<TrackingFrame>()
            .init_resource::<PlaneAnchors>()
            .init_resource::<PlacedObjects>()
            .init_resource::<ObjectLoader>()
            .init_resource::<SessionStatus>()
            .init_resource::<SurfaceIndicator>()
            .init_resource::<PlacementValidity>()
            .init_resource::<GestureSession>()
            .init_resource::<InteractionSettings>()
            .init_resource::<tools::interaction::TouchArena>()
            // events consumed from the host
            .add_event::<bevy::input::touch::TouchInput>()
            .add_event::<AnchorEvent>()
            .add_event::<SessionEvent>()
            .add_event::<RestartRequest>()
            // events exposed to the host
            .add_event::<SessionReset>()
            .add_event::<StatusMessage>()
            .add_event::<IndicatorVisual>()
            .add_event::<AnimationRequest>()
            .add_event::<AnimationCompleted>()
            .add_event::<PlaceObjectRequest>()
            .add_event::<PlacementRejected>()
            .add_event::<ObjectPlaced>()
            .add_event::<RemoveObjectRequest>()
            .add_event::<VisibilityRequest>()
            // gestures
            .add_event::<PanGesture>()
            .add_event::<RotationGesture>()
            .add_event::<TapGesture>()
            .add_systems(Startup, tools::surface_indicator::spawn_surface_indicator)
            .add_systems(
                Update,
                (
                    // Session and tracking bookkeeping first.
                    (
                        engine::tracking::anchors::apply_anchor_events,
                        engine::session::monitor_tracking_quality,
                        engine::session::handle_session_events,
                        engine::session::handle_restart_requests,
                    )
                        .chain(),
                    // Raw input into gestures.
                    tools::interaction::recognizers::recognize_touch_gestures,
                    // Gestures into object mutations.
                    (
                        tools::interaction::selection::handle_tap_gestures,
                        tools::interaction::manipulation::handle_pan_gestures,
                        tools::interaction::manipulation::handle_rotation_gestures,
                    )
                        .chain(),
                    // Per-frame object upkeep.
                    (
                        tools::interaction::manipulation::reproject_tracked_object,
                        engine::objects::loader::start_requested_loads,
                        engine::objects::loader::poll_pending_loads,
                        engine::objects::adjust_objects_onto_updated_anchors,
                        engine::objects::handle_remove_requests,
                        engine::objects::clear_alignment_animation_flags,
                    )
                        .chain(),
                    // Indicator refresh and UI feeds.
                    (
                        tools::surface_indicator::update_surface_indicator,
                        tools::surface_indicator::refresh_placement_validity,
                    )
                        .chain(),
                    // Animation last, so requests from this frame start now.
                    (
                        engine::animation::start_requested_animations,
                        engine::animation::drive_animations,
                    )
                        .chain(),
                )
                    .chain(),
            );
    }
}
