//! End-to-end tests driving a headless app through synthetic tracking
//! frames, anchor events and touch input.

use bevy::asset::AssetPlugin;
use bevy::input::touch::{TouchInput, TouchPhase};
use bevy::prelude::*;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_3};
use std::time::Duration;

use placement_engine::*;

fn test_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, AssetPlugin::default(), PlacementEnginePlugin));
    app
}

/// Camera 1.5 m above the origin, looking straight down at the floor.
fn looking_down_camera() -> CameraPose {
    let transform = Transform::from_translation(Vec3::new(0.0, 1.5, 0.0))
        .with_rotation(Quat::from_rotation_x(-FRAC_PI_2));
    CameraPose::new(transform, Vec2::new(800.0, 600.0), FRAC_PI_3)
}

fn floor_anchor() -> PlaneAnchor {
    PlaneAnchor {
        id: AnchorId(1),
        alignment: PlaneAlignment::Horizontal,
        center: Vec2::ZERO,
        extent: Vec2::new(6.0, 6.0),
        transform: Transform::IDENTITY,
    }
}

fn set_frame(app: &mut App, camera: Option<CameraPose>, quality: TrackingQuality) {
    let mut frame = app.world_mut().resource_mut::<TrackingFrame>();
    frame.camera = camera;
    frame.quality = quality;
}

fn install_catalog(app: &mut App) {
    let catalog = PlacementCatalog {
        assets: vec![
            AssetDefinition {
                name: "lamp".into(),
                extent: [0.3, 0.6, 0.3],
                allowed_alignments: vec![PlaneAlignment::Horizontal],
            },
            AssetDefinition {
                name: "poster".into(),
                extent: [0.5, 0.7, 0.02],
                allowed_alignments: vec![PlaneAlignment::Vertical],
            },
        ],
    };
    let handle = app
        .world_mut()
        .resource_mut::<Assets<PlacementCatalog>>()
        .add(catalog);
    app.world_mut()
        .resource_mut::<ObjectLoader>()
        .set_catalog(handle);
}

fn touch(app: &mut App, phase: TouchPhase, position: Vec2, id: u64) {
    app.world_mut().send_event(TouchInput {
        phase,
        position,
        window: Entity::PLACEHOLDER,
        force: None,
        id,
    });
}

/// Spawn a placed object directly, bypassing the async loader.
fn spawn_object(app: &mut App, translation: Vec3) -> Entity {
    let entity = app
        .world_mut()
        .spawn((
            VirtualObject::new("lamp", vec![PlaneAlignment::Horizontal]),
            Transform::from_translation(translation),
            BoundsSize(Vec3::new(0.4, 0.4, 0.4)),
        ))
        .id();
    app.world_mut()
        .resource_mut::<PlacedObjects>()
        .register(entity);
    entity
}

#[test]
fn indicator_acquires_a_confirmed_plane() {
    let mut app = test_app();
    set_frame(&mut app, Some(looking_down_camera()), TrackingQuality::Normal);
    app.world_mut().send_event(AnchorEvent::Added(floor_anchor()));
    app.update();

    let indicator = app.world().resource::<SurfaceIndicator>();
    assert!(!indicator.is_initializing());
    assert_eq!(indicator.focused_anchor(), Some(AnchorId(1)));
    let position = indicator.last_known_position().unwrap();
    assert!(position.y.abs() < 1e-4);
}

#[test]
fn indicator_reverts_to_billboard_without_surfaces() {
    let mut app = test_app();
    set_frame(&mut app, Some(looking_down_camera()), TrackingQuality::Normal);
    app.world_mut().send_event(AnchorEvent::Added(floor_anchor()));
    app.update();
    assert!(!app.world().resource::<SurfaceIndicator>().is_initializing());

    // The plane disappears and no features exist: back to Initializing.
    app.world_mut().send_event(AnchorEvent::Removed(AnchorId(1)));
    app.update();
    let indicator = app.world().resource::<SurfaceIndicator>();
    assert!(indicator.is_initializing());
    assert!(indicator.last_known_position().is_none());
}

#[test]
fn placement_flows_from_request_to_live_object() {
    let mut app = test_app();
    set_frame(&mut app, Some(looking_down_camera()), TrackingQuality::Normal);
    app.world_mut().send_event(AnchorEvent::Added(floor_anchor()));
    install_catalog(&mut app);
    app.update();

    app.world_mut().send_event(PlaceObjectRequest {
        asset_name: "lamp".into(),
        screen_point: None,
    });
    for _ in 0..50 {
        app.update();
        if !app.world().resource::<PlacedObjects>().is_empty() {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }

    let registry = app.world().resource::<PlacedObjects>();
    assert_eq!(registry.len(), 1);
    let entity = registry.iter().next().unwrap();
    let object = app.world().get::<VirtualObject>(entity).unwrap();
    assert_eq!(object.asset_name, "lamp");
    assert_eq!(object.anchor, Some(AnchorId(1)));
    let transform = app.world().get::<Transform>(entity).unwrap();
    assert!(transform.translation.y.abs() < 1e-4);
}

#[test]
fn placement_is_rejected_while_initializing() {
    let mut app = test_app();
    install_catalog(&mut app);
    app.update();

    let mut cursor = app
        .world()
        .resource::<Events<PlacementRejected>>()
        .get_cursor();
    app.world_mut().send_event(PlaceObjectRequest {
        asset_name: "lamp".into(),
        screen_point: None,
    });
    app.update();

    let events = app.world().resource::<Events<PlacementRejected>>();
    assert_eq!(cursor.read(events).count(), 1);
    assert!(app.world().resource::<PlacedObjects>().is_empty());
}

#[test]
fn restart_runs_once_within_the_cooldown() {
    let mut app = test_app();
    set_frame(&mut app, Some(looking_down_camera()), TrackingQuality::Normal);
    app.world_mut().send_event(AnchorEvent::Added(floor_anchor()));
    app.update();
    spawn_object(&mut app, Vec3::ZERO);

    let mut cursor = app.world().resource::<Events<SessionReset>>().get_cursor();

    app.world_mut().send_event(RestartRequest);
    app.update();
    assert!(app.world().resource::<PlacedObjects>().is_empty());
    assert!(app.world().resource::<PlaneAnchors>().is_empty());

    // Second request inside the 5 s window is a no-op.
    app.world_mut().send_event(RestartRequest);
    app.update();

    let mut resets = 0;
    let events = app.world().resource::<Events<SessionReset>>();
    resets += cursor.read(events).count();
    assert_eq!(resets, 1);
}

#[test]
fn pan_threshold_gates_movement_and_resets_the_accumulator() {
    let mut app = test_app();
    set_frame(&mut app, Some(looking_down_camera()), TrackingQuality::Normal);
    app.world_mut().send_event(AnchorEvent::Added(floor_anchor()));
    app.update();
    let entity = spawn_object(&mut app, Vec3::ZERO);

    // Finger down over the object (screen center), then a sub-threshold move.
    touch(&mut app, TouchPhase::Started, Vec2::new(400.0, 300.0), 1);
    app.update();
    assert!(app.world().resource::<GestureSession>().is_tracking());

    touch(&mut app, TouchPhase::Moved, Vec2::new(420.0, 300.0), 1);
    app.update();
    let transform = app.world().get::<Transform>(entity).unwrap();
    assert_eq!(transform.translation.x, 0.0);
    assert!(!app.world().resource::<GestureSession>().threshold_exceeded);

    // Another 20 points crosses the 30 point bar; the accumulator resets and
    // movement starts from here.
    touch(&mut app, TouchPhase::Moved, Vec2::new(440.0, 300.0), 1);
    app.update();
    let session = app.world().resource::<GestureSession>();
    assert!(session.threshold_exceeded);
    assert_eq!(session.accumulated_translation, Vec2::ZERO);
    let transform = app.world().get::<Transform>(entity).unwrap();
    assert!(transform.translation.x > 0.0);

    // Lift the finger: session resets.
    touch(&mut app, TouchPhase::Ended, Vec2::new(440.0, 300.0), 1);
    app.update();
    assert!(!app.world().resource::<GestureSession>().is_tracking());
}

#[test]
fn drag_follows_the_device_with_a_still_finger() {
    let mut app = test_app();
    set_frame(&mut app, Some(looking_down_camera()), TrackingQuality::Normal);
    app.world_mut().send_event(AnchorEvent::Added(floor_anchor()));
    app.update();
    let entity = spawn_object(&mut app, Vec3::ZERO);

    touch(&mut app, TouchPhase::Started, Vec2::new(400.0, 300.0), 1);
    app.update();
    // Cross the threshold, then hold still.
    touch(&mut app, TouchPhase::Moved, Vec2::new(435.0, 300.0), 1);
    app.update();
    let x_after_drag = app.world().get::<Transform>(entity).unwrap().translation.x;

    // The finger stays put while the camera strafes sideways.
    let mut camera = looking_down_camera();
    camera.transform.translation.x = 0.5;
    set_frame(&mut app, Some(camera), TrackingQuality::Normal);
    app.update();

    let x_after_device_move = app.world().get::<Transform>(entity).unwrap().translation.x;
    assert!(x_after_device_move > x_after_drag + 0.3);
}

#[test]
fn tap_selects_then_teleports() {
    let mut app = test_app();
    set_frame(&mut app, Some(looking_down_camera()), TrackingQuality::Normal);
    app.world_mut().send_event(AnchorEvent::Added(floor_anchor()));
    app.update();
    let entity = spawn_object(&mut app, Vec3::ZERO);

    // Tap on the object: selected, not moved.
    touch(&mut app, TouchPhase::Started, Vec2::new(400.0, 300.0), 1);
    touch(&mut app, TouchPhase::Ended, Vec2::new(400.0, 300.0), 1);
    app.update();
    assert!(app.world().get::<Selected>(entity).is_some());
    assert_eq!(app.world().get::<Transform>(entity).unwrap().translation.x, 0.0);

    // Tap empty space: the selection teleports there.
    touch(&mut app, TouchPhase::Started, Vec2::new(600.0, 300.0), 2);
    touch(&mut app, TouchPhase::Ended, Vec2::new(600.0, 300.0), 2);
    app.update();
    let translation = app.world().get::<Transform>(entity).unwrap().translation;
    assert!(translation.x > 0.1);
    assert!(translation.y.abs() < 1e-4);
}

#[test]
fn two_finger_twist_spins_the_selection() {
    let mut app = test_app();
    set_frame(&mut app, Some(looking_down_camera()), TrackingQuality::Normal);
    app.world_mut().send_event(AnchorEvent::Added(floor_anchor()));
    app.update();
    let entity = spawn_object(&mut app, Vec3::ZERO);
    app.world_mut().entity_mut(entity).insert(Selected);

    touch(&mut app, TouchPhase::Started, Vec2::new(380.0, 300.0), 1);
    touch(&mut app, TouchPhase::Started, Vec2::new(420.0, 300.0), 2);
    app.update();
    let before = app.world().get::<Transform>(entity).unwrap().rotation;

    // Rotate the second finger a quarter turn around the first.
    touch(&mut app, TouchPhase::Moved, Vec2::new(380.0, 340.0), 2);
    app.update();
    let after = app.world().get::<Transform>(entity).unwrap().rotation;
    assert!(before.angle_between(after) > 0.1);
}

#[test]
fn refined_planes_pull_nearby_objects_onto_the_surface() {
    let mut app = test_app();
    set_frame(&mut app, Some(looking_down_camera()), TrackingQuality::Normal);
    app.world_mut().send_event(AnchorEvent::Added(floor_anchor()));
    app.update();
    // 3 cm above the plane: within the snap allowance.
    let entity = spawn_object(&mut app, Vec3::new(0.2, 0.03, 0.0));

    app.world_mut()
        .send_event(AnchorEvent::Updated(floor_anchor()));
    app.update();

    assert!(app.world().get::<ActiveAnimation>(entity).is_some());
    let object = app.world().get::<VirtualObject>(entity).unwrap();
    assert_eq!(object.anchor, Some(AnchorId(1)));
}

#[test]
fn interruption_hides_the_indicator_until_recovery() {
    let mut app = test_app();
    set_frame(&mut app, Some(looking_down_camera()), TrackingQuality::Normal);
    app.world_mut().send_event(AnchorEvent::Added(floor_anchor()));
    app.update();
    assert!(!app.world().resource::<SurfaceIndicator>().is_hidden());

    app.world_mut().send_event(SessionEvent::Interrupted);
    app.update();
    assert!(app.world().resource::<SurfaceIndicator>().is_hidden());

    app.world_mut().send_event(SessionEvent::Resumed);
    app.update();
    app.update();
    assert!(!app.world().resource::<SurfaceIndicator>().is_hidden());
}

#[test]
fn fatal_failures_surface_once_as_blocking() {
    let mut app = test_app();
    set_frame(&mut app, Some(looking_down_camera()), TrackingQuality::Normal);
    app.update();

    let mut cursor = app.world().resource::<Events<StatusMessage>>().get_cursor();
    app.world_mut()
        .send_event(SessionEvent::Failed("sensor unavailable".into()));
    app.world_mut()
        .send_event(SessionEvent::Failed("sensor unavailable".into()));
    app.update();

    let events = app.world().resource::<Events<StatusMessage>>();
    let blocking: Vec<_> = cursor
        .read(events)
        .filter(|m| m.severity == Severity::Blocking)
        .collect();
    assert_eq!(blocking.len(), 1);
    assert!(app.world().resource::<SessionStatus>().is_failed());
}

#[test]
fn validity_rows_follow_the_focused_plane() {
    let mut app = test_app();
    set_frame(&mut app, Some(looking_down_camera()), TrackingQuality::Normal);
    app.world_mut().send_event(AnchorEvent::Added(floor_anchor()));
    install_catalog(&mut app);
    app.update();

    let validity = app.world().resource::<PlacementValidity>();
    let rows: std::collections::HashMap<_, _> = validity.rows.iter().cloned().collect();
    // Horizontal floor under the center: lamps yes, wall posters no.
    assert_eq!(rows.get("lamp"), Some(&true));
    assert_eq!(rows.get("poster"), Some(&false));
}
