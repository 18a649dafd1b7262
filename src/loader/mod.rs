//! Model loading: asks the asset server for the building scene, watches the
//! load, and once the scene is in the world sorts its meshes into ground,
//! doors and destination anchors.
//!
//! The load is an explicit state machine (`LoadPhase`). It leaves `NotLoaded`
//! exactly once, on success or failure, and whatever arrives afterwards
//! (a late failure, a second ready event, anything after teardown) is
//! ignored.
//!
//! # Example
//!
//! ```ignore
//! app.init_resource::<ModelLoad>()
//!     .add_systems(Startup, start_model_load)
//!     .add_systems(Update, (poll_model_load, classify_model));
//! ```
pub mod naming;

use bevy::asset::{LoadState, UntypedAssetId};
use bevy::gltf::Gltf;
use bevy::log::{debug, error, info, warn};
use bevy::prelude::*;
use bevy::scene::SceneInstanceReady;

use crate::door::Door;
use crate::error::{NavError, NavResult};
use crate::navigation::{TargetRegistry, load_destinations};
use crate::player::{Player, PlayerCamera, PlayerLook};
use crate::scene::{GroundSet, SceneBounds, SurfaceMesh, bake_world_triangles, node_name};
use crate::settings::Settings;

use naming::classify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    NotLoaded,
    Loaded,
    Failed,
}

/// Marks the entity the building scene is spawned under.
#[derive(Component, Debug)]
pub struct ModelRoot;

#[derive(Resource, Debug, Default)]
pub struct ModelLoad {
    pub path: String,
    pub scene: Option<Handle<Scene>>,
    pub gltf: Option<Handle<Gltf>>,
    pub root: Option<Entity>,
    phase: LoadPhase,
    pub error: Option<String>,
    pub spawn_point: Option<Vec3>,
    pub torn_down: bool,
}

impl ModelLoad {
    #[must_use]
    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// True until the load completes either way.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::NotLoaded && !self.torn_down
    }

    /// Leave `NotLoaded`. Returns false and changes nothing if the load
    /// already completed or the session is gone.
    pub fn complete(&mut self, outcome: NavResult<Vec3>) -> bool {
        if !self.is_loading() {
            debug!("ignoring late load completion for '{}': {:?}", self.path, outcome.err());
            return false;
        }
        match outcome {
            Ok(spawn) => {
                self.phase = LoadPhase::Loaded;
                self.spawn_point = Some(spawn);
            }
            Err(e) => {
                self.phase = LoadPhase::Failed;
                self.error = Some(e.to_string());
            }
        }
        true
    }
}

/// Run condition: the model finished loading successfully.
pub fn model_loaded(load: Res<ModelLoad>) -> bool {
    load.phase() == LoadPhase::Loaded && !load.torn_down
}

/// Run condition: the session is live and the load has settled either way.
pub fn session_ready(load: Res<ModelLoad>) -> bool {
    load.phase() != LoadPhase::NotLoaded && !load.torn_down
}

/// Run condition: the session has not been torn down.
pub fn session_live(load: Res<ModelLoad>) -> bool {
    !load.torn_down
}

/// Run condition: still waiting on the asset server.
pub fn model_loading(load: Res<ModelLoad>) -> bool {
    load.is_loading()
}

#[allow(clippy::needless_pass_by_value)]
pub fn start_model_load(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Res<Settings>,
    mut load: ResMut<ModelLoad>,
) {
    let path = settings.model.path.clone();
    info!("loading building model {path}");
    let scene: Handle<Scene> = asset_server.load(format!("{path}#Scene0"));
    let gltf: Handle<Gltf> = asset_server.load(path.clone());
    let root = commands
        .spawn((
            SceneBundle { scene: scene.clone(), ..default() },
            ModelRoot,
            Name::new("model-root"),
        ))
        .id();
    *load = ModelLoad { path, scene: Some(scene), gltf: Some(gltf), root: Some(root), ..default() };
}

/// Move the camera to `spawn` and make it the player.
fn place_player(commands: &mut Commands, camera: &mut Query<(Entity, &mut Transform), With<PlayerCamera>>, spawn: Vec3) {
    let Ok((entity, mut tf)) = camera.get_single_mut() else {
        warn!("no player camera to place at {spawn}");
        return;
    };
    tf.translation = spawn;
    tf.rotation = Quat::IDENTITY;
    commands.entity(entity).insert((Player::default(), PlayerLook::default()));
}

fn failed_state(server: &AssetServer, id: impl Into<UntypedAssetId>) -> Option<String> {
    match server.get_load_state(id) {
        Some(LoadState::Failed(err)) => Some(err.to_string()),
        _ => None,
    }
}

/// Watch the asset server for a failed load. Success is handled by
/// `classify_model` once the scene instance is ready.
#[allow(clippy::needless_pass_by_value)]
pub fn poll_model_load(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Res<Settings>,
    mut load: ResMut<ModelLoad>,
    mut camera: Query<(Entity, &mut Transform), With<PlayerCamera>>,
    mut registry: ResMut<TargetRegistry>,
) {
    let reason = load
        .gltf
        .as_ref()
        .and_then(|h| failed_state(&asset_server, h.id()))
        .or_else(|| load.scene.as_ref().and_then(|h| failed_state(&asset_server, h.id())));
    let Some(reason) = reason else { return };

    let err = NavError::ModelLoad { path: load.path.clone(), reason };
    fail_model_load(&mut commands, &mut load, &settings, &mut camera, &mut registry, err);
}

/// Settle the load as failed: keep only the fixed destinations and put the
/// player at the origin. Does nothing if the load already settled.
pub fn fail_model_load(
    commands: &mut Commands,
    load: &mut ModelLoad,
    settings: &Settings,
    camera: &mut Query<(Entity, &mut Transform), With<PlayerCamera>>,
    registry: &mut TargetRegistry,
    err: NavError,
) {
    error!("{err}");
    if !load.complete(Err(err)) {
        return;
    }
    // The building is gone but fixed destinations still make sense.
    *registry = TargetRegistry::build(Vec::new(), &load_destinations(&settings.model.destinations_dir));
    let spawn = Vec3::new(0.0, settings.player.eye_height, 0.0);
    place_player(commands, camera, spawn);
}

/// A mesh entity inside the loaded scene, with its world-space triangles.
#[derive(Debug, Clone)]
pub struct MeshNode {
    pub mesh_entity: Entity,
    /// Named node the mesh belongs to, if any.
    pub node: Option<(Entity, String)>,
    pub triangles: Vec<[Vec3; 3]>,
}

/// What a model contains, sorted by role.
#[derive(Debug, Default)]
pub struct Classification {
    pub surfaces: Vec<SurfaceMesh>,
    /// Door node entities with their world-space centres.
    pub doors: Vec<(Entity, Vec3)>,
    /// Labels in scene order; duplicates are left for the registry to drop.
    pub anchors: Vec<(String, Entity)>,
    pub bounds: SceneBounds,
}

impl Classification {
    /// Eye-height spawn over the model's footprint, or `fallback` for an
    /// empty model.
    #[must_use]
    pub fn spawn_point(&self, eye_height: f32, fallback: Vec3) -> Vec3 {
        if self.bounds.is_valid() { self.bounds.spawn_point(eye_height) } else { fallback }
    }
}

#[must_use]
pub fn classify_nodes(nodes: Vec<MeshNode>) -> Classification {
    let mut out = Classification::default();
    let mut door_bounds: Vec<(Entity, SceneBounds)> = Vec::new();

    for node in nodes {
        let surface = SurfaceMesh::new(node.mesh_entity, node.triangles);
        if surface.bounds.is_valid() {
            out.bounds.union(&surface.bounds);
        }

        if let Some((node_entity, name)) = &node.node {
            let roles = classify(name);
            if roles.door {
                match door_bounds.iter_mut().find(|(e, _)| e == node_entity) {
                    Some((_, b)) => b.union(&surface.bounds),
                    None => door_bounds.push((*node_entity, surface.bounds)),
                }
            }
            if let Some(label) = roles.anchor_label {
                out.anchors.push((label, node.mesh_entity));
            }
        }

        if !surface.triangles.is_empty() {
            out.surfaces.push(surface);
        }
    }

    out.doors = door_bounds
        .into_iter()
        .filter(|(_, b)| b.is_valid())
        .map(|(e, b)| (e, b.center()))
        .collect();
    out
}

/// Sort the freshly spawned scene into ground, doors and anchors, build the
/// destination list and put the player in the building.
#[allow(clippy::too_many_arguments, clippy::needless_pass_by_value)]
pub fn classify_model(
    mut commands: Commands,
    mut ready: EventReader<SceneInstanceReady>,
    mut load: ResMut<ModelLoad>,
    settings: Res<Settings>,
    meshes: Res<Assets<Mesh>>,
    children: Query<&Children>,
    mesh_nodes: Query<(&Handle<Mesh>, &GlobalTransform)>,
    names: Query<&Name>,
    parents: Query<&Parent>,
    mut ground: ResMut<GroundSet>,
    mut registry: ResMut<TargetRegistry>,
    mut camera: Query<(Entity, &mut Transform), With<PlayerCamera>>,
) {
    let Some(root) = load.root else {
        ready.clear();
        return;
    };
    let spawned = ready.read().fold(false, |seen, ev| seen || ev.parent == root);
    if !spawned {
        return;
    }

    let nodes: Vec<MeshNode> = children
        .iter_descendants(root)
        .filter_map(|entity| {
            let (handle, transform) = mesh_nodes.get(entity).ok()?;
            let mesh = meshes.get(handle)?;
            Some(MeshNode {
                mesh_entity: entity,
                node: node_name(entity, &names, &parents),
                triangles: bake_world_triangles(mesh, transform),
            })
        })
        .collect();
    let mesh_count = nodes.len();
    let classified = classify_nodes(nodes);

    let spawn = classified.spawn_point(settings.player.eye_height, Vec3::new(0.0, settings.player.eye_height, 0.0));
    if !load.complete(Ok(spawn)) {
        return;
    }

    ground.clear();
    for surface in classified.surfaces {
        ground.insert(surface);
    }
    for (entity, center) in &classified.doors {
        commands.entity(*entity).insert(Door::new(*center));
    }
    let fixed = load_destinations(&settings.model.destinations_dir);
    *registry = TargetRegistry::build(classified.anchors, &fixed);
    place_player(&mut commands, &mut camera, spawn);

    info!(
        "model ready: {mesh_count} meshes, {} ground triangles, {} doors, {} destinations, spawn {spawn}",
        ground.triangle_count(),
        classified.doors.len(),
        registry.len(),
    );
}
