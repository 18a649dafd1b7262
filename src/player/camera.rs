//! View orientation and pointer lock.
//!
//! `apply_look` turns the sampled look delta into yaw/pitch on the camera.
//! `cursor_grab` engages pointer lock on a left click and releases it on the
//! pause key, desktop mode only.

use std::f32::consts::FRAC_PI_2;

use bevy::math::EulerRot;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

use crate::input::{CurrentInput, InputMode, InputRouter};
use crate::player::Player;
use crate::settings::{ControlsSettings, Settings};

/// Radians per pixel of mouse motion at sensitivity 1.0.
pub const MOUSE_RADIANS_PER_PIXEL: f32 = 0.002;

/// Player view orientation in radians.
///
/// - `yaw`: around +Y, zero looks down -Z.
/// - `pitch`: around the camera X axis, clamped to straight up / down.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerLook {
    pub yaw: f32,
    pub pitch: f32,
}

impl PlayerLook {
    /// Apply a look delta in pixels. `radians_per_pixel` comes from the
    /// active input mode. Shared by the system and the benches.
    pub fn apply_delta(&mut self, delta: Vec2, radians_per_pixel: f32, controls: &ControlsSettings) {
        let mut d = delta;
        if controls.invert_x {
            d.x = -d.x;
        }
        if controls.invert_y {
            d.y = -d.y;
        }
        self.yaw -= d.x * radians_per_pixel;
        self.pitch = (self.pitch - d.y * radians_per_pixel).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Horizontal forward unit vector.
    #[must_use]
    pub fn forward_flat(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Horizontal right unit vector.
    #[must_use]
    pub fn right_flat(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }
}

#[must_use]
pub fn look_scale(mode: InputMode, controls: &ControlsSettings) -> f32 {
    match mode {
        InputMode::Desktop => controls.mouse_sensitivity * MOUSE_RADIANS_PER_PIXEL,
        InputMode::Mobile => controls.touch_look_sensitivity,
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn apply_look(
    input: Res<CurrentInput>,
    router: Res<InputRouter>,
    settings: Res<Settings>,
    mut query: Query<(&mut Transform, &mut PlayerLook), With<Player>>,
) {
    let delta = input.0.look_delta;
    if delta == Vec2::ZERO {
        return;
    }
    let scale = look_scale(router.mode(), &settings.controls);
    for (mut transform, mut look) in &mut query {
        look.apply_delta(delta, scale, &settings.controls);
        transform.rotation = look.rotation();
    }
}

/// Engage or release pointer lock. Lock state is mirrored into the router
/// so mouse motion only counts while locked.
#[allow(clippy::needless_pass_by_value)]
pub fn cursor_grab(
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mb: Res<ButtonInput<MouseButton>>,
    kb: Res<ButtonInput<KeyCode>>,
    settings: Res<Settings>,
    mut router: ResMut<InputRouter>,
) {
    let Ok(mut window) = windows.get_single_mut() else { return };
    if mb.just_pressed(MouseButton::Left) {
        set_cursor_lock(&mut window, true);
        router.set_pointer_lock(true);
    }
    if kb.just_pressed(settings.key_for("pause", KeyCode::Escape)) {
        set_cursor_lock(&mut window, false);
        router.set_pointer_lock(false);
    }
}

pub fn set_cursor_lock(window: &mut Window, locked: bool) {
    if locked {
        window.cursor.grab_mode = CursorGrabMode::Locked;
        window.cursor.visible = false;
    } else {
        window.cursor.grab_mode = CursorGrabMode::None;
        window.cursor.visible = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_clamps_at_vertical() {
        let mut look = PlayerLook::default();
        let controls = ControlsSettings::default();
        look.apply_delta(Vec2::new(0.0, -100_000.0), 0.002, &controls);
        assert!((look.pitch - FRAC_PI_2).abs() < 1e-6);
        look.apply_delta(Vec2::new(0.0, 100_000.0), 0.002, &controls);
        assert!((look.pitch + FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn moving_mouse_right_turns_right() {
        let mut look = PlayerLook::default();
        look.apply_delta(Vec2::new(100.0, 0.0), 0.002, &ControlsSettings::default());
        assert!(look.yaw < 0.0);
        // Forward swings toward +X.
        assert!(look.forward_flat().x > 0.0);
    }

    #[test]
    fn invert_flips_axes() {
        let mut controls = ControlsSettings::default();
        controls.invert_x = true;
        controls.invert_y = true;
        let mut look = PlayerLook::default();
        look.apply_delta(Vec2::new(10.0, 10.0), 0.01, &controls);
        assert!(look.yaw > 0.0);
        assert!(look.pitch > 0.0);
    }

    #[test]
    fn flat_vectors_match_rotation() {
        let look = PlayerLook { yaw: 0.7, pitch: 0.4 };
        let fwd = look.rotation() * Vec3::NEG_Z;
        let flat = Vec3::new(fwd.x, 0.0, fwd.z).normalize();
        assert!(flat.distance(look.forward_flat()) < 1e-5);
        let right = look.rotation() * Vec3::X;
        assert!(right.distance(look.right_flat()) < 1e-5);
    }

    #[test]
    fn scale_depends_on_mode() {
        let c = ControlsSettings::default();
        assert!((look_scale(InputMode::Desktop, &c) - 0.002).abs() < 1e-7);
        assert!((look_scale(InputMode::Mobile, &c) - 0.005).abs() < 1e-7);
    }
}
