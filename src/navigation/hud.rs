//! Navigator HUD: a camera-attached arrow that turns toward the selected
//! destination and changes colour and pulse rate with distance.
//!
//! The arrow is parented to the camera, so its `Transform` is camera-local.
//! Each tick the target is moved into camera space, the bearing is taken
//! from its lateral and forward components, and the arrow yaw closes a fixed
//! fraction of the remaining (shortest-arc) angle.
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use bevy::log::warn;
use bevy::prelude::*;
use bevy::render::primitives::Aabb;

use super::{ActiveGuidance, SelectedDestination};
use super::targets::TargetRegistry;
use crate::player::Player;
use crate::settings::{NavigatorSettings, Settings};

pub const NEAR_COLOR: Color = Color::srgb(0.15, 0.85, 0.35);
pub const MID_COLOR: Color = Color::srgb(0.95, 0.75, 0.1);
pub const FAR_COLOR: Color = Color::srgb(0.9, 0.25, 0.2);

/// Coarse distance classes driving the arrow's look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityBand {
    Near,
    Mid,
    Far,
}

impl ProximityBand {
    #[must_use]
    pub fn from_distance(distance: f32, near: f32, mid: f32) -> Self {
        if distance < near {
            ProximityBand::Near
        } else if distance < mid {
            ProximityBand::Mid
        } else {
            ProximityBand::Far
        }
    }

    #[must_use]
    pub fn color(self) -> Color {
        match self {
            ProximityBand::Near => NEAR_COLOR,
            ProximityBand::Mid => MID_COLOR,
            ProximityBand::Far => FAR_COLOR,
        }
    }

    /// Pulse rate in radians per second.
    #[must_use]
    pub fn pulse_frequency(self) -> f32 {
        match self {
            ProximityBand::Near => 9.0,
            ProximityBand::Mid => 5.0,
            ProximityBand::Far => 2.5,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ProximityBand::Near => "near",
            ProximityBand::Mid => "mid",
            ProximityBand::Far => "far",
        }
    }
}

/// Where the destination is relative to the viewpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guidance {
    /// Radians; positive means the target is to the right.
    pub bearing: f32,
    pub distance: f32,
    pub band: ProximityBand,
}

/// Bearing and distance from a camera pose to a world point.
#[must_use]
pub fn compute_guidance(camera: &GlobalTransform, target: Vec3, settings: &NavigatorSettings) -> Guidance {
    let (_, rotation, position) = camera.to_scale_rotation_translation();
    let to_target = target - position;
    let local = rotation.inverse() * to_target;
    let distance = to_target.length();
    Guidance {
        bearing: local.x.atan2(-local.z),
        distance,
        band: ProximityBand::from_distance(distance, settings.near_distance, settings.mid_distance),
    }
}

/// Wrap an angle into `(-PI, PI]`.
#[must_use]
pub fn wrap_angle(a: f32) -> f32 {
    let w = (a + PI).rem_euclid(TAU) - PI;
    if w <= -PI { w + TAU } else { w }
}

/// One step of single-pole smoothing along the shortest arc.
#[must_use]
pub fn smooth_angle(current: f32, target: f32, factor: f32) -> f32 {
    wrap_angle(current + wrap_angle(target - current) * factor.clamp(0.0, 1.0))
}

/// Arrow scale: grows slightly when close, pulses faster the nearer it is.
#[must_use]
pub fn pulse_scale(elapsed: f32, guidance: &Guidance, amplitude: f32) -> f32 {
    let proximity_boost = match guidance.band {
        ProximityBand::Near => 1.15,
        ProximityBand::Mid => 1.05,
        ProximityBand::Far => 1.0,
    };
    proximity_boost * (1.0 + amplitude * (elapsed * guidance.band.pulse_frequency()).sin())
}

/// The arrow entity.
#[derive(Component, Debug)]
pub struct NavigatorArrow {
    /// Smoothed yaw in camera space (radians, same sign as bearing).
    pub yaw: f32,
    pub material: Handle<StandardMaterial>,
    /// Label last reported missing, so the warning is logged once.
    pub missing: Option<String>,
}

/// Cone tip is +Y; lay it down so it points along camera -Z.
fn arrow_rotation(yaw: f32) -> Quat {
    Quat::from_rotation_y(-yaw) * Quat::from_rotation_x(-FRAC_PI_2)
}

/// Spawn the arrow under the camera, hidden until something is selected.
pub fn spawn_navigator_arrow(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    camera: Entity,
    settings: &NavigatorSettings,
) -> Entity {
    let material = materials.add(StandardMaterial {
        base_color: FAR_COLOR,
        emissive: LinearRgba::from(FAR_COLOR) * 0.6,
        unlit: true,
        ..default()
    });
    let arrow = commands
        .spawn((
            PbrBundle {
                mesh: meshes.add(Cone { radius: 0.06, height: 0.22 }),
                material: material.clone(),
                transform: Transform::from_translation(settings.hud_offset).with_rotation(arrow_rotation(0.0)),
                visibility: Visibility::Hidden,
                ..default()
            },
            NavigatorArrow { yaw: 0.0, material, missing: None },
            Name::new("navigator-arrow"),
        ))
        .id();
    commands.entity(camera).add_child(arrow);
    arrow
}

/// Live world position of a mesh anchor: its bounds centre if known,
/// otherwise its origin.
#[must_use]
pub fn anchor_world_position(transform: &GlobalTransform, aabb: Option<&Aabb>) -> Vec3 {
    match aabb {
        Some(b) => transform.transform_point(Vec3::from(b.center)),
        None => transform.translation(),
    }
}

/// Per-tick HUD update. Hides the arrow when nothing resolves.
#[allow(clippy::needless_pass_by_value, clippy::too_many_arguments)]
pub fn update_navigator_hud(
    time: Res<Time>,
    settings: Res<Settings>,
    registry: Res<TargetRegistry>,
    selected: Res<SelectedDestination>,
    mut guidance_out: ResMut<ActiveGuidance>,
    camera: Query<&GlobalTransform, With<Player>>,
    anchors: Query<(&GlobalTransform, Option<&Aabb>)>,
    mut arrows: Query<(&mut NavigatorArrow, &mut Transform, &mut Visibility)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Ok((mut arrow, mut transform, mut visibility)) = arrows.get_single_mut() else {
        return;
    };

    let target = selected.0.as_deref().and_then(|label| {
        let Some(target) = registry.get(label) else {
            return Some(Err(label.to_string()));
        };
        let resolved = target.resolve(|e| anchors.get(e).ok().map(|(gt, aabb)| anchor_world_position(gt, aabb)));
        Some(resolved.map_err(|_| label.to_string()))
    });

    let (Ok(camera_tf), Some(Ok(target_pos))) = (camera.get_single(), target.clone()) else {
        if let Some(Err(label)) = target
            && arrow.missing.as_deref() != Some(label.as_str())
        {
            warn!("destination '{label}' cannot be resolved, hiding navigator");
            arrow.missing = Some(label);
        }
        *visibility = Visibility::Hidden;
        guidance_out.0 = None;
        return;
    };
    arrow.missing = None;

    let nav = &settings.navigator;
    let guidance = compute_guidance(camera_tf, target_pos, nav);
    arrow.yaw = smooth_angle(arrow.yaw, guidance.bearing, nav.smoothing);

    transform.translation = nav.hud_offset;
    transform.rotation = arrow_rotation(arrow.yaw);
    transform.scale = Vec3::splat(pulse_scale(time.elapsed_seconds(), &guidance, nav.pulse_amplitude));
    *visibility = Visibility::Visible;

    if let Some(mat) = materials.get_mut(&arrow.material) {
        let color = guidance.band.color();
        if mat.base_color != color {
            mat.base_color = color;
            mat.emissive = LinearRgba::from(color) * 0.6;
        }
    }
    guidance_out.0 = Some(guidance);
}
