//! Input routing: one active source (desktop or mobile) feeds the player.
//!
//! Both sources keep their own state; the router forwards raw events only to
//! the active one and samples only the active one each tick. Switching modes
//! resets both so nothing held on one side leaks into the other.
pub mod desktop;
pub mod mobile;

use bevy::input::mouse::MouseMotion;
use bevy::input::touch::{TouchInput, TouchPhase};
use bevy::log::info;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

pub use desktop::{DesktopInput, HeldKey};
pub use mobile::{JoystickZone, MobileInput, VirtualJoystick, clamp_drag};

use crate::settings::{MobileSettings, Settings};

/// One tick's worth of intent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputFrame {
    pub forward_axis: f32,
    pub right_axis: f32,
    pub jump_requested: bool,
    pub interact_requested: bool,
    pub sprint: bool,
    /// Raw pixels since the last sample; scaled by the look system.
    pub look_delta: Vec2,
}

impl InputFrame {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.forward_axis == 0.0
            && self.right_axis == 0.0
            && !self.jump_requested
            && !self.interact_requested
            && !self.sprint
            && self.look_delta == Vec2::ZERO
    }
}

pub trait InputSource {
    /// Current intent. Edge-triggered flags and look deltas are consumed.
    fn sample(&mut self) -> InputFrame;
    fn reset(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputMode {
    #[default]
    Desktop,
    Mobile,
}

impl InputMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            InputMode::Desktop => InputMode::Mobile,
            InputMode::Mobile => InputMode::Desktop,
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct InputRouter {
    mode: InputMode,
    pub desktop: DesktopInput,
    pub mobile: MobileInput,
}

impl InputRouter {
    #[must_use]
    pub fn new(mode: InputMode, viewport: Vec2, cfg: &MobileSettings) -> Self {
        Self { mode, desktop: DesktopInput::default(), mobile: MobileInput::new(viewport, cfg) }
    }

    #[must_use]
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Returns whether the mode actually changed.
    pub fn set_mode(&mut self, mode: InputMode) -> bool {
        if mode == self.mode {
            return false;
        }
        self.reset();
        self.mode = mode;
        info!("input mode -> {mode:?}");
        true
    }

    pub fn reset(&mut self) {
        self.desktop.reset();
        self.mobile.reset();
    }

    fn active(&mut self) -> &mut dyn InputSource {
        match self.mode {
            InputMode::Desktop => &mut self.desktop,
            InputMode::Mobile => &mut self.mobile,
        }
    }

    pub fn sample(&mut self) -> InputFrame {
        self.active().sample()
    }

    pub fn key(&mut self, key: HeldKey, pressed: bool) {
        if self.mode == InputMode::Desktop {
            self.desktop.set_held(key, pressed);
        }
    }

    pub fn mouse_motion(&mut self, delta: Vec2) {
        if self.mode == InputMode::Desktop {
            self.desktop.add_mouse_motion(delta);
        }
    }

    pub fn set_pointer_lock(&mut self, locked: bool) {
        if self.mode == InputMode::Desktop {
            self.desktop.set_pointer_lock(locked);
        }
    }

    pub fn touch_start(&mut self, id: u64, at: Vec2) {
        if self.mode == InputMode::Mobile {
            self.mobile.touch_start(id, at);
        }
    }

    pub fn touch_move(&mut self, id: u64, to: Vec2) {
        if self.mode == InputMode::Mobile {
            self.mobile.touch_move(id, to);
        }
    }

    pub fn touch_end(&mut self, id: u64) {
        if self.mode == InputMode::Mobile {
            self.mobile.touch_end(id);
        }
    }

    /// Jump from a key, a button or the host; goes to whichever source is active.
    pub fn request_jump(&mut self) {
        match self.mode {
            InputMode::Desktop => self.desktop.press_jump(),
            InputMode::Mobile => self.mobile.press_jump(),
        }
    }

    pub fn request_interact(&mut self) {
        match self.mode {
            InputMode::Desktop => self.desktop.press_interact(),
            InputMode::Mobile => self.mobile.press_interact(),
        }
    }

    pub fn resize(&mut self, viewport: Vec2, cfg: &MobileSettings) {
        self.mobile.resize(viewport, cfg);
    }
}

/// Frame sampled at the start of the tick, read by the player systems.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct CurrentInput(pub InputFrame);

/// Run condition: the router is in `mode`.
pub fn input_mode_is(mode: InputMode) -> impl Fn(Res<InputRouter>) -> bool + Clone {
    move |router: Res<InputRouter>| router.mode() == mode
}

#[allow(clippy::needless_pass_by_value)]
pub fn feed_desktop_input(
    keys: Res<ButtonInput<KeyCode>>,
    mut motion: EventReader<MouseMotion>,
    settings: Res<Settings>,
    mut router: ResMut<InputRouter>,
) {
    for (held, action, default) in [
        (HeldKey::Forward, "forward", KeyCode::KeyW),
        (HeldKey::Back, "back", KeyCode::KeyS),
        (HeldKey::Left, "left", KeyCode::KeyA),
        (HeldKey::Right, "right", KeyCode::KeyD),
        (HeldKey::Sprint, "sprint", KeyCode::ShiftLeft),
    ] {
        router.key(held, keys.pressed(settings.key_for(action, default)));
    }
    if keys.just_pressed(settings.key_for("jump", KeyCode::Space)) {
        router.request_jump();
    }
    if keys.just_pressed(settings.key_for("interact", KeyCode::KeyE)) {
        router.request_interact();
    }
    for ev in motion.read() {
        router.mouse_motion(ev.delta);
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn feed_mobile_input(mut touches: EventReader<TouchInput>, mut router: ResMut<InputRouter>) {
    for touch in touches.read() {
        match touch.phase {
            TouchPhase::Started => router.touch_start(touch.id, touch.position),
            TouchPhase::Moved => router.touch_move(touch.id, touch.position),
            TouchPhase::Ended | TouchPhase::Canceled => router.touch_end(touch.id),
        }
    }
}

pub fn sample_input(mut router: ResMut<InputRouter>, mut current: ResMut<CurrentInput>) {
    current.0 = router.sample();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> InputRouter {
        InputRouter::new(InputMode::Desktop, Vec2::new(800.0, 600.0), &MobileSettings::default())
    }

    #[test]
    fn inactive_source_ignores_events() {
        let mut r = router();
        r.touch_start(1, Vec2::new(120.0, 480.0));
        r.touch_move(1, Vec2::new(120.0, 420.0));
        assert!(!r.mobile.joystick.is_active());
        assert!(r.sample().is_idle());
    }

    #[test]
    fn desktop_to_mobile_toggle() {
        let mut r = router();
        r.key(HeldKey::Forward, true);
        assert_eq!(r.sample().forward_axis, 1.0);

        assert!(r.set_mode(InputMode::Mobile));
        assert!(!r.desktop.is_held(HeldKey::Forward));
        // Desktop keys now do nothing.
        r.key(HeldKey::Forward, true);
        assert!(r.sample().is_idle());

        r.touch_start(4, Vec2::new(120.0, 480.0));
        r.touch_move(4, Vec2::new(120.0, 450.0));
        let f = r.sample();
        assert!((f.forward_axis - 0.5).abs() < 1e-5);
    }

    #[test]
    fn switching_back_clears_joystick() {
        let mut r = router();
        r.set_mode(InputMode::Mobile);
        r.touch_start(4, Vec2::new(120.0, 480.0));
        r.touch_move(4, Vec2::new(180.0, 480.0));
        r.set_mode(InputMode::Desktop);
        assert!(!r.mobile.joystick.is_active());
        assert!(r.sample().is_idle());
    }

    #[test]
    fn same_mode_is_a_noop() {
        let mut r = router();
        r.key(HeldKey::Left, true);
        assert!(!r.set_mode(InputMode::Desktop));
        assert_eq!(r.sample().right_axis, -1.0);
    }

    #[test]
    fn jump_goes_to_active_source() {
        let mut r = router();
        r.set_mode(InputMode::Mobile);
        r.request_jump();
        assert!(r.sample().jump_requested);
        assert!(!r.sample().jump_requested);
    }
}
