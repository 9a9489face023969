//! Session lifecycle: tracking quality interpretation, interruption and
//! relocalization handling, fatal failure surfacing, and the restart path.

use bevy::prelude::*;
use thiserror::Error;

use constants::session::RESTART_COOLDOWN_SECS;

use crate::engine::objects::loader::ObjectLoader;
use crate::engine::objects::{PlacedObjects, VirtualObject, VisibilityRequest};
use crate::engine::tracking::anchors::PlaneAnchors;
use crate::engine::tracking::{LimitedReason, TrackingFrame, TrackingQuality};
use crate::tools::surface_indicator::{IndicatorVisual, SurfaceIndicator};

/// Non-recoverable tracking failure. The expected remediation is a full
/// restart, not retry-in-place.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("world tracking failed: {0}")]
    TrackingFailed(String),
}

/// Lifecycle notifications from the tracking engine.
#[derive(Event, Debug, Clone)]
pub enum SessionEvent {
    Interrupted,
    /// The interruption ended; relocalization will be attempted.
    Resumed,
    Failed(String),
}

/// Ask for the whole experience to restart.
#[derive(Event, Debug, Clone, Copy)]
pub struct RestartRequest;

/// Emitted once per accepted restart; the host reinitializes its tracking
/// session on this.
#[derive(Event, Debug, Clone, Copy)]
pub struct SessionReset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Blocking,
}

/// User-facing status feed; the banner itself is external chrome.
#[derive(Event, Debug, Clone)]
pub struct StatusMessage {
    pub severity: Severity,
    pub text: String,
}

/// Session-level bookkeeping.
#[derive(Resource, Debug, Default)]
pub struct SessionStatus {
    pub interrupted: bool,
    pub failure: Option<SessionError>,
    last_quality: Option<TrackingQuality>,
    last_restart: Option<f64>,
}

impl SessionStatus {
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Whether a restart may run `now`, given when the previous one ran. The
/// cooldown covers the time the tracking session needs to reinitialize.
pub fn restart_allowed(last_restart: Option<f64>, now: f64) -> bool {
    last_restart.is_none_or(|last| now - last >= RESTART_COOLDOWN_SECS)
}

fn quality_message(quality: TrackingQuality) -> Option<(Severity, &'static str)> {
    match quality {
        TrackingQuality::Normal => None,
        TrackingQuality::Limited(LimitedReason::Initializing) => {
            Some((Severity::Info, "Initializing session."))
        }
        TrackingQuality::Limited(LimitedReason::ExcessiveMotion) => {
            Some((Severity::Warning, "Tracking limited: move the device more slowly."))
        }
        TrackingQuality::Limited(LimitedReason::InsufficientFeatures) => Some((
            Severity::Warning,
            "Tracking limited: point the device at an area with visible surface detail.",
        )),
        TrackingQuality::Limited(LimitedReason::Relocalizing) => {
            Some((Severity::Info, "Resuming session: move the device to where it was before."))
        }
        TrackingQuality::Unavailable => Some((Severity::Warning, "Tracking unavailable.")),
    }
}

/// Reacts to tracking-quality changes: status feed plus indicator
/// visibility.
pub fn monitor_tracking_quality(
    frame: Res<TrackingFrame>,
    mut status: ResMut<SessionStatus>,
    mut indicator: ResMut<SurfaceIndicator>,
    mut visuals: EventWriter<IndicatorVisual>,
    mut messages: EventWriter<StatusMessage>,
) {
    if status.last_quality == Some(frame.quality) {
        return;
    }
    status.last_quality = Some(frame.quality);
    info!("tracking quality changed: {:?}", frame.quality);

    if let Some((severity, text)) = quality_message(frame.quality) {
        messages.write(StatusMessage { severity, text: text.into() });
    }

    let should_hide = status.interrupted
        || matches!(
            frame.quality,
            TrackingQuality::Unavailable | TrackingQuality::Limited(LimitedReason::Relocalizing)
        );
    if let Some(visual) = indicator.set_hidden(should_hide) {
        visuals.write(visual);
    }
}

/// Handles interruption, recovery and fatal failure notifications.
pub fn handle_session_events(
    mut events: EventReader<SessionEvent>,
    mut status: ResMut<SessionStatus>,
    mut indicator: ResMut<SurfaceIndicator>,
    objects: Query<Entity, With<VirtualObject>>,
    mut visuals: EventWriter<IndicatorVisual>,
    mut visibility: EventWriter<VisibilityRequest>,
    mut messages: EventWriter<StatusMessage>,
) {
    for event in events.read() {
        match event {
            SessionEvent::Interrupted => {
                status.interrupted = true;
                if let Some(visual) = indicator.set_hidden(true) {
                    visuals.write(visual);
                }
                for entity in &objects {
                    visibility.write(VisibilityRequest { target: entity, visible: false });
                }
                messages.write(StatusMessage {
                    severity: Severity::Warning,
                    text: "Session interrupted. It will resume shortly.".into(),
                });
            }
            SessionEvent::Resumed => {
                status.interrupted = false;
                // Indicator visibility comes back through the quality monitor
                // once relocalization reaches normal tracking again.
                status.last_quality = None;
                for entity in &objects {
                    visibility.write(VisibilityRequest { target: entity, visible: true });
                }
                messages.write(StatusMessage {
                    severity: Severity::Info,
                    text: "Session resumed.".into(),
                });
            }
            SessionEvent::Failed(reason) => {
                // Surfaced exactly once; a restart clears it.
                if status.failure.is_none() {
                    let error = SessionError::TrackingFailed(reason.clone());
                    error!("{error}");
                    messages.write(StatusMessage {
                        severity: Severity::Blocking,
                        text: format!("{error}. Restart the experience."),
                    });
                    status.failure = Some(error);
                }
            }
        }
    }
}

/// Tears the experience down and asks the host to reinitialize tracking.
/// Idempotent under rapid repeated invocation thanks to the cooldown gate.
#[allow(clippy::too_many_arguments)]
pub fn handle_restart_requests(
    time: Res<Time>,
    mut requests: EventReader<RestartRequest>,
    mut status: ResMut<SessionStatus>,
    mut indicator: ResMut<SurfaceIndicator>,
    mut anchors: ResMut<PlaneAnchors>,
    mut loader: ResMut<ObjectLoader>,
    mut registry: ResMut<PlacedObjects>,
    objects: Query<Entity, With<VirtualObject>>,
    mut resets: EventWriter<SessionReset>,
    mut visuals: EventWriter<IndicatorVisual>,
    mut messages: EventWriter<StatusMessage>,
    mut commands: Commands,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();
    let now = time.elapsed_secs_f64();
    if !restart_allowed(status.last_restart, now) {
        debug!("restart ignored: cooldown active");
        return;
    }
    status.last_restart = Some(now);
    status.interrupted = false;
    status.failure = None;
    status.last_quality = None;

    for entity in &objects {
        commands.entity(entity).despawn();
    }
    registry.clear();
    anchors.clear();
    loader.invalidate_pending();
    indicator.reset();
    visuals.write(IndicatorVisual::Open);

    info!("restarting the experience");
    messages.write(StatusMessage {
        severity: Severity::Info,
        text: "Restarting session.".into(),
    });
    resets.write(SessionReset);
}
