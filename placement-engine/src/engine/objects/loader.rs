//! Asynchronous load/unload bookkeeping for placed objects.
//!
//! Asset metadata comes from a JSON placement catalog; preparing a model for
//! the scene runs on the async compute pool so a slow deserialization never
//! blocks interaction. Completions are polled on the update schedule, and a
//! completion that arrives after a reset discarded the request is dropped
//! before it can touch live scene state.

use bevy::prelude::*;
use bevy::tasks::futures_lite::future;
use bevy::tasks::{AsyncComputeTaskPool, Task};
use serde::{Deserialize, Serialize};

use crate::engine::objects::{BoundsSize, PlacedObjects, Selected, VirtualObject};
use crate::engine::raycast::resolve_world_position;
use crate::engine::tracking::TrackingFrame;
use crate::engine::tracking::anchors::{PlaneAlignment, PlaneAnchors};
use crate::tools::surface_indicator::SurfaceIndicator;

/// Catalog metadata for one placeable asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDefinition {
    pub name: String,
    /// Full extents of the model's bounding volume, meters.
    pub extent: [f32; 3],
    pub allowed_alignments: Vec<PlaneAlignment>,
}

impl AssetDefinition {
    pub fn bounds(&self) -> Vec3 {
        Vec3::from_array(self.extent).max(Vec3::splat(0.001))
    }
}

/// The set of placeable assets, loaded from `*.catalog.json`.
#[derive(Asset, TypePath, Debug, Clone, Serialize, Deserialize)]
pub struct PlacementCatalog {
    pub assets: Vec<AssetDefinition>,
}

impl PlacementCatalog {
    pub fn find(&self, name: &str) -> Option<&AssetDefinition> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// A model readied off-thread, waiting to enter the scene.
#[derive(Debug)]
pub struct PreparedObject {
    pub definition: AssetDefinition,
    pub bounds: Vec3,
}

struct PendingLoad {
    task: Task<PreparedObject>,
    generation: u64,
    asset_name: String,
    screen_point: Option<Vec2>,
}

/// Load bookkeeping: the active catalog, in-flight preparations, and a
/// generation counter that invalidates them all on reset.
#[derive(Resource, Default)]
pub struct ObjectLoader {
    catalog: Option<Handle<PlacementCatalog>>,
    pending: Vec<PendingLoad>,
    generation: u64,
}

impl ObjectLoader {
    pub fn set_catalog(&mut self, handle: Handle<PlacementCatalog>) {
        self.catalog = Some(handle);
    }

    pub fn catalog(&self) -> Option<&Handle<PlacementCatalog>> {
        self.catalog.as_ref()
    }

    pub fn is_loading(&self, asset_name: &str) -> bool {
        self.pending
            .iter()
            .any(|p| p.generation == self.generation && p.asset_name == asset_name)
    }

    /// Invalidate every in-flight load; their completions will be dropped.
    pub fn invalidate_pending(&mut self) {
        self.generation += 1;
    }
}

/// Ask for an asset to be placed. `screen_point` of `None` targets the
/// screen center (the surface indicator's position).
#[derive(Event, Debug, Clone)]
pub struct PlaceObjectRequest {
    pub asset_name: String,
    pub screen_point: Option<Vec2>,
}

/// Placement could not happen; the UI shows `reason` and moves on.
#[derive(Event, Debug, Clone)]
pub struct PlacementRejected {
    pub asset_name: String,
    pub reason: String,
}

/// A placement finished and the object is live.
#[derive(Event, Debug, Clone)]
pub struct ObjectPlaced {
    pub entity: Entity,
    pub asset_name: String,
}

/// Validates placement requests and kicks off asynchronous preparation.
pub fn start_requested_loads(
    mut requests: EventReader<PlaceObjectRequest>,
    mut loader: ResMut<ObjectLoader>,
    catalogs: Res<Assets<PlacementCatalog>>,
    indicator: Res<SurfaceIndicator>,
    selected: Query<Entity, With<Selected>>,
    mut rejected: EventWriter<PlacementRejected>,
    mut commands: Commands,
) {
    for request in requests.read() {
        if indicator.is_initializing() {
            // No surface yet: refuse and roll the pending selection back.
            warn!("cannot place '{}': still looking for a surface", request.asset_name);
            for entity in &selected {
                commands.entity(entity).remove::<Selected>();
            }
            rejected.write(PlacementRejected {
                asset_name: request.asset_name.clone(),
                reason: "Still looking for a surface. Move the device around slowly.".into(),
            });
            continue;
        }
        if loader.is_loading(&request.asset_name) {
            debug!("'{}' already loading, ignoring duplicate request", request.asset_name);
            continue;
        }
        let definition = loader
            .catalog()
            .and_then(|handle| catalogs.get(handle))
            .and_then(|catalog| catalog.find(&request.asset_name).cloned());
        let Some(definition) = definition else {
            rejected.write(PlacementRejected {
                asset_name: request.asset_name.clone(),
                reason: "Unknown asset or catalog not loaded yet.".into(),
            });
            continue;
        };

        let generation = loader.generation;
        let task = AsyncComputeTaskPool::get().spawn(async move {
            let bounds = definition.bounds();
            PreparedObject { definition, bounds }
        });
        info!("loading '{}'", request.asset_name);
        loader.pending.push(PendingLoad {
            task,
            generation,
            asset_name: request.asset_name.clone(),
            screen_point: request.screen_point,
        });
    }
}

/// Polls preparations and inserts finished objects into the scene.
pub fn poll_pending_loads(
    mut loader: ResMut<ObjectLoader>,
    frame: Res<TrackingFrame>,
    anchors: Res<PlaneAnchors>,
    mut registry: ResMut<PlacedObjects>,
    mut placed: EventWriter<ObjectPlaced>,
    mut rejected: EventWriter<PlacementRejected>,
    mut commands: Commands,
) {
    let current_generation = loader.generation;
    let pending = std::mem::take(&mut loader.pending);
    for mut load in pending {
        let Some(prepared) = future::block_on(future::poll_once(&mut load.task)) else {
            loader.pending.push(load);
            continue;
        };
        if load.generation != current_generation {
            // The experience restarted while this was loading.
            debug!("dropping stale load of '{}'", load.asset_name);
            continue;
        }

        let Some(camera) = frame.camera else {
            rejected.write(PlacementRejected {
                asset_name: load.asset_name,
                reason: "Cannot place right now. Try again.".into(),
            });
            continue;
        };
        let screen_point = load.screen_point.unwrap_or_else(|| camera.screen_center());
        let Some(candidate) = resolve_world_position(screen_point, &frame, &anchors, None, false)
        else {
            rejected.write(PlacementRejected {
                asset_name: load.asset_name,
                reason: "Cannot place right now. Try again.".into(),
            });
            continue;
        };

        let mut object = VirtualObject::from_definition(&prepared.definition);
        let anchor = candidate.anchor.and_then(|id| anchors.get(id));
        if !object.is_placement_valid(anchor) {
            rejected.write(PlacementRejected {
                asset_name: load.asset_name,
                reason: "This asset cannot rest on that surface.".into(),
            });
            continue;
        }

        let observed = candidate.observed_alignment(&anchors);
        let alignment = if object.allowed_alignments.contains(&observed) {
            observed
        } else {
            object.current_alignment()
        };
        let mut transform = Transform::IDENTITY;
        object.set_transform(
            &mut transform,
            candidate.position,
            candidate.surface_rotation(&anchors),
            &camera,
            false,
            alignment,
            false,
        );
        object.anchor = candidate.anchor;

        let asset_name = object.asset_name.clone();
        let entity = commands
            .spawn((object, transform, BoundsSize(prepared.bounds)))
            .id();
        registry.register(entity);
        info!("placed '{asset_name}' at {:?}", transform.translation);
        placed.write(ObjectPlaced { entity, asset_name });
    }
}
