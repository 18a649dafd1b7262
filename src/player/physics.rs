//! Player physics: gravity, jumping and ground snap.
//!
//! One step runs in a fixed order: jump, integrate gravity, then query the
//! ground from the new tentative position. A miss means free fall. The
//! player is only put back at `last_safe_y` when the numbers go bad or it
//! has dropped far below the last floor while the model has floors at all.

use bevy::log::warn;
use bevy::prelude::*;

use crate::input::CurrentInput;
use crate::player::{Player, PlayerPhase};
use crate::scene::{GroundQuery, GroundSet};
use crate::settings::{PlayerSettings, Settings};

/// Snap the camera onto the floor below it if one is within reach.
///
/// The ray starts at `from_y` (the height before this tick's fall, so a
/// fast fall cannot tunnel through a floor) and reaches `eye_height +
/// ground_tolerance` below the current position. Rising players never snap.
/// Calling it twice in a row gives the same result as calling it once.
pub fn ground_snap(tf: &mut Transform, player: &mut Player, ground: &impl GroundQuery, from_y: f32, cfg: &PlayerSettings) -> bool {
    if player.vertical_velocity > 0.0 {
        player.phase = PlayerPhase::Airborne;
        return false;
    }
    let pos = tf.translation;
    let origin_y = from_y.max(pos.y);
    let reach = (origin_y - pos.y) + cfg.eye_height + cfg.ground_tolerance;
    match ground.cast_down(Vec3::new(pos.x, origin_y, pos.z), reach) {
        Some(hit) => {
            tf.translation.y = hit.point.y + cfg.eye_height;
            player.vertical_velocity = 0.0;
            player.phase = PlayerPhase::Grounded;
            player.last_safe_y = Some(tf.translation.y);
            true
        }
        None => {
            player.phase = PlayerPhase::Airborne;
            false
        }
    }
}

/// Put the player back on its last floor if the step produced garbage or a
/// runaway fall. Returns whether it did.
fn recover(tf: &mut Transform, before: Vec3, player: &mut Player, ground: &impl GroundQuery, cfg: &PlayerSettings) -> bool {
    let pos = tf.translation;
    let broken = !pos.is_finite() || !player.vertical_velocity.is_finite();
    let runaway = ground.has_ground()
        && player.last_safe_y.is_some_and(|safe| pos.y < safe - cfg.recover_fall_distance);
    if !broken && !runaway {
        return false;
    }

    let fallback = if before.is_finite() { before } else { Vec3::new(0.0, cfg.eye_height, 0.0) };
    if !pos.x.is_finite() || !pos.z.is_finite() {
        tf.translation.x = fallback.x;
        tf.translation.z = fallback.z;
    }
    tf.translation.y = player.last_safe_y.unwrap_or(fallback.y);
    player.vertical_velocity = 0.0;
    player.phase = PlayerPhase::Airborne;
    true
}

/// Step the vertical physics for one frame.
///
/// Pure over its inputs so the system, tests and benches share it. Returns
/// whether the safety fallback fired.
pub fn physics_step(
    tf: &mut Transform,
    player: &mut Player,
    ground: &impl GroundQuery,
    dt: f32,
    jump_requested: bool,
    cfg: &PlayerSettings,
) -> bool {
    if !dt.is_finite() {
        return false;
    }
    let dt = dt.max(0.0);
    let before = tf.translation;

    if jump_requested && player.on_ground() {
        player.vertical_velocity = cfg.jump_impulse;
        player.phase = PlayerPhase::Airborne;
    }

    player.vertical_velocity += cfg.gravity * dt;
    tf.translation.y += player.vertical_velocity * dt;

    if recover(tf, before, player, ground, cfg) {
        return true;
    }
    ground_snap(tf, player, ground, before.y, cfg);
    false
}

#[allow(clippy::needless_pass_by_value)]
pub fn player_physics(
    time: Res<Time>,
    input: Res<CurrentInput>,
    ground: Res<GroundSet>,
    settings: Res<Settings>,
    mut q: Query<(&mut Transform, &mut Player)>,
) {
    let dt = time.delta_seconds();
    for (mut tf, mut player) in &mut q {
        if physics_step(&mut tf, &mut player, &*ground, dt, input.0.jump_requested, &settings.player) {
            warn!("player fell out of the model, restored to y={:.2}", tf.translation.y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SurfaceMesh, floor_quad};

    const DT: f32 = 1.0 / 60.0;

    fn floor_at(y: f32) -> GroundSet {
        let mut set = GroundSet::default();
        set.insert(SurfaceMesh::new(Entity::from_raw(1), floor_quad(-10.0, 10.0, -10.0, 10.0, y)));
        set
    }

    fn standing(cfg: &PlayerSettings) -> (Transform, Player) {
        let y = cfg.eye_height;
        (
            Transform::from_xyz(0.0, y, 0.0),
            Player { vertical_velocity: 0.0, phase: PlayerPhase::Grounded, last_safe_y: Some(y) },
        )
    }

    #[test]
    fn airborne_velocity_integrates_gravity() {
        let cfg = PlayerSettings::default();
        let ground = GroundSet::default();
        for dt in [0.0, 0.001, DT, 0.1, 0.5] {
            let mut tf = Transform::from_xyz(0.0, 100.0, 0.0);
            let mut p = Player { vertical_velocity: 2.0, ..Default::default() };
            physics_step(&mut tf, &mut p, &ground, dt, false, &cfg);
            assert!((p.vertical_velocity - (2.0 + cfg.gravity * dt)).abs() < 1e-5);
            assert_eq!(p.phase, PlayerPhase::Airborne);
        }
    }

    #[test]
    fn snap_is_idempotent() {
        let cfg = PlayerSettings::default();
        let ground = floor_at(0.0);
        let mut tf = Transform::from_xyz(1.0, 1.5, 1.0);
        let mut p = Player::default();
        let y = tf.translation.y;
        assert!(ground_snap(&mut tf, &mut p, &ground, y, &cfg));
        let once = (tf.translation, p.clone());
        let y = tf.translation.y;
        assert!(ground_snap(&mut tf, &mut p, &ground, y, &cfg));
        assert!(tf.translation.distance(once.0) < 1e-6);
        assert_eq!(p.phase, once.1.phase);
        assert_eq!(p.vertical_velocity, 0.0);
        assert!((tf.translation.y - cfg.eye_height).abs() < 1e-5);
    }

    #[test]
    fn standing_player_stays_put() {
        let cfg = PlayerSettings::default();
        let ground = floor_at(0.0);
        let (mut tf, mut p) = standing(&cfg);
        for _ in 0..120 {
            physics_step(&mut tf, &mut p, &ground, DT, false, &cfg);
            assert!(p.on_ground());
            assert_eq!(p.vertical_velocity, 0.0);
        }
        assert!((tf.translation.y - cfg.eye_height).abs() < 1e-4);
    }

    #[test]
    fn jump_leaves_and_lands() {
        let cfg = PlayerSettings::default();
        let ground = floor_at(0.0);
        let (mut tf, mut p) = standing(&cfg);
        physics_step(&mut tf, &mut p, &ground, DT, true, &cfg);
        assert_eq!(p.phase, PlayerPhase::Airborne);
        assert!(tf.translation.y > cfg.eye_height);
        let mut peak = tf.translation.y;
        let mut landed = false;
        for _ in 0..240 {
            physics_step(&mut tf, &mut p, &ground, DT, false, &cfg);
            peak = peak.max(tf.translation.y);
            if p.on_ground() {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert!(peak > cfg.eye_height + 0.5);
        assert!((tf.translation.y - cfg.eye_height).abs() < 1e-4);
    }

    #[test]
    fn jump_needs_ground() {
        let cfg = PlayerSettings::default();
        let ground = GroundSet::default();
        let mut tf = Transform::from_xyz(0.0, 10.0, 0.0);
        let mut p = Player::default();
        physics_step(&mut tf, &mut p, &ground, DT, true, &cfg);
        assert!(p.vertical_velocity < 0.0);
    }

    #[test]
    fn no_ground_means_free_fall() {
        let cfg = PlayerSettings::default();
        let ground = GroundSet::default();
        let mut tf = Transform::from_xyz(0.0, cfg.eye_height, 0.0);
        let mut p = Player::default();
        let mut last = tf.translation.y;
        for _ in 0..60 {
            physics_step(&mut tf, &mut p, &ground, DT, false, &cfg);
            assert!(tf.translation.y < last);
            last = tf.translation.y;
        }
        assert!(tf.translation.y < cfg.eye_height);
        assert_eq!(p.phase, PlayerPhase::Airborne);
    }

    #[test]
    fn large_step_does_not_tunnel() {
        let cfg = PlayerSettings::default();
        let ground = floor_at(0.0);
        let mut tf = Transform::from_xyz(0.0, 3.0, 0.0);
        let mut p = Player { vertical_velocity: -30.0, ..Default::default() };
        physics_step(&mut tf, &mut p, &ground, 0.25, false, &cfg);
        assert!(p.on_ground());
        assert!((tf.translation.y - cfg.eye_height).abs() < 1e-4);
    }

    #[test]
    fn walking_off_an_edge_falls() {
        let cfg = PlayerSettings::default();
        let ground = floor_at(0.0);
        let (mut tf, mut p) = standing(&cfg);
        tf.translation.x = 15.0;
        physics_step(&mut tf, &mut p, &ground, DT, false, &cfg);
        assert_eq!(p.phase, PlayerPhase::Airborne);
    }

    #[test]
    fn runaway_fall_returns_to_last_floor() {
        let cfg = PlayerSettings::default();
        let ground = floor_at(0.0);
        let mut tf = Transform::from_xyz(50.0, cfg.eye_height - cfg.recover_fall_distance - 1.0, 50.0);
        let mut p = Player { vertical_velocity: -20.0, phase: PlayerPhase::Airborne, last_safe_y: Some(cfg.eye_height) };
        assert!(physics_step(&mut tf, &mut p, &ground, DT, false, &cfg));
        assert_eq!(tf.translation.y, cfg.eye_height);
        assert_eq!(p.vertical_velocity, 0.0);
    }

    #[test]
    fn non_finite_position_is_restored() {
        let cfg = PlayerSettings::default();
        let ground = GroundSet::default();
        let mut tf = Transform::from_xyz(1.0, 5.0, 2.0);
        let mut p = Player { vertical_velocity: f32::NAN, phase: PlayerPhase::Airborne, last_safe_y: Some(3.0) };
        assert!(physics_step(&mut tf, &mut p, &ground, DT, false, &cfg));
        assert!(tf.translation.is_finite());
        assert_eq!(tf.translation.y, 3.0);
        assert_eq!(p.vertical_velocity, 0.0);
    }

    #[test]
    fn non_finite_dt_is_ignored() {
        let cfg = PlayerSettings::default();
        let ground = GroundSet::default();
        let mut tf = Transform::from_xyz(0.0, 5.0, 0.0);
        let mut p = Player::default();
        physics_step(&mut tf, &mut p, &ground, f32::INFINITY, false, &cfg);
        assert_eq!(tf.translation.y, 5.0);
    }
}
