//! Startup scene: the camera that becomes the player, lights, and the
//! navigator arrow parented to the camera.
//!
//! The building itself is spawned by the model loader; until it settles the
//! camera just sits at eye height above the origin.
use bevy::prelude::*;
use waypoint::navigation::hud::spawn_navigator_arrow;
use waypoint::player::PlayerCamera;
use waypoint::settings::Settings;

/// Spawn the camera, a sun, ambient light and the (hidden) arrow.
#[allow(clippy::needless_pass_by_value)]
pub fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<Settings>,
) {
    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            shadows_enabled: false,
            illuminance: 8000.0,
            ..default()
        },
        transform: Transform::from_xyz(4.0, 10.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 400.0,
    });

    let camera = commands
        .spawn((
            Camera3dBundle {
                transform: Transform::from_xyz(0.0, settings.player.eye_height, 0.0),
                ..default()
            },
            PlayerCamera,
            Name::new("player-camera"),
        ))
        .id();

    spawn_navigator_arrow(&mut commands, &mut meshes, &mut materials, camera, &settings.navigator);
}
