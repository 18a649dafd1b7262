//! Horizontal movement: input axes turned into a world-space velocity.
//!
//! No collision and no inertia; the velocity is integrated straight into the
//! camera position. Vertical motion belongs to `physics`.

use bevy::prelude::*;

use crate::input::{CurrentInput, InputFrame};
use crate::player::{Player, PlayerLook};
use crate::settings::{PlayerSettings, Settings};

/// World-space horizontal velocity for one input frame.
///
/// Axes are clamped to `[-1, 1]` and diagonals normalized, then each axis is
/// weighted from the speed table (forward or backward, strafe).
#[must_use]
pub fn horizontal_velocity(frame: &InputFrame, look: &PlayerLook, cfg: &PlayerSettings) -> Vec3 {
    let mut axes = Vec2::new(frame.right_axis.clamp(-1.0, 1.0), frame.forward_axis.clamp(-1.0, 1.0));
    if !axes.is_finite() || axes == Vec2::ZERO {
        return Vec3::ZERO;
    }
    if axes.length_squared() > 1.0 {
        axes = axes.normalize();
    }
    let forward_weight = if axes.y >= 0.0 { cfg.speed.forward } else { cfg.speed.backward };
    let sprint = if frame.sprint { cfg.sprint_multiplier } else { 1.0 };
    let dir = look.forward_flat() * axes.y * forward_weight + look.right_flat() * axes.x * cfg.speed.strafe;
    dir * cfg.base_speed * sprint
}

#[allow(clippy::needless_pass_by_value)]
pub fn player_movement(
    time: Res<Time>,
    input: Res<CurrentInput>,
    settings: Res<Settings>,
    mut query: Query<(&mut Transform, &PlayerLook), With<Player>>,
) {
    let dt = time.delta_seconds();
    if dt <= 0.0 {
        return;
    }
    for (mut transform, look) in &mut query {
        let v = horizontal_velocity(&input.0, look, &settings.player);
        transform.translation += v * dt;
    }
}
