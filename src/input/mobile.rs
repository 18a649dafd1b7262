//! Touch input: a virtual joystick for movement and free drags for look.
//!
//! Screen coordinates are logical pixels with the origin at the top-left, so
//! dragging the stick up (negative y) means forward.
use bevy::prelude::Vec2;

use super::{InputFrame, InputSource};
use crate::settings::MobileSettings;

/// Circle in which a new touch grabs the joystick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoystickZone {
    pub center: Vec2,
    pub radius: f32,
}

impl JoystickZone {
    /// Zone anchored to the bottom-left corner of a viewport.
    #[must_use]
    pub fn for_viewport(size: Vec2, cfg: &MobileSettings) -> Self {
        Self {
            center: Vec2::new(cfg.zone_margin, (size.y - cfg.zone_margin).max(0.0)),
            radius: cfg.zone_radius,
        }
    }

    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        p.distance_squared(self.center) <= self.radius * self.radius
    }
}

/// Drag vector limited to the stick's travel.
#[must_use]
pub fn clamp_drag(delta: Vec2, max_radius: f32) -> Vec2 {
    delta.clamp_length_max(max_radius.max(0.0))
}

#[derive(Debug, Clone, Default)]
pub struct VirtualJoystick {
    touch: Option<u64>,
    anchor: Vec2,
    offset: Vec2,
    max_radius: f32,
}

impl VirtualJoystick {
    #[must_use]
    pub fn new(max_radius: f32) -> Self {
        Self { max_radius, ..Default::default() }
    }

    pub fn begin(&mut self, id: u64, at: Vec2) {
        self.touch = Some(id);
        self.anchor = at;
        self.offset = Vec2::ZERO;
    }

    /// Returns false if `id` is not the stick's touch.
    pub fn drag(&mut self, id: u64, to: Vec2) -> bool {
        if self.touch != Some(id) {
            return false;
        }
        self.offset = clamp_drag(to - self.anchor, self.max_radius);
        true
    }

    pub fn release(&mut self, id: u64) -> bool {
        if self.touch != Some(id) {
            return false;
        }
        self.touch = None;
        self.offset = Vec2::ZERO;
        true
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.touch.is_some()
    }

    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    #[must_use]
    pub fn anchor(&self) -> Option<Vec2> {
        self.touch.map(|_| self.anchor)
    }

    /// `(forward, right)` in `[-1, 1]`.
    #[must_use]
    pub fn axes(&self) -> (f32, f32) {
        if self.max_radius <= 0.0 {
            return (0.0, 0.0);
        }
        let n = self.offset / self.max_radius;
        (-n.y, n.x)
    }
}

/// A look drag; deltas accumulate until the next sample.
#[derive(Debug, Clone, Default)]
struct TouchLook {
    touch: Option<u64>,
    last: Vec2,
    accum: Vec2,
}

#[derive(Debug, Clone)]
pub struct MobileInput {
    pub zone: JoystickZone,
    pub joystick: VirtualJoystick,
    look: TouchLook,
    jump_pending: bool,
    interact_pending: bool,
}

impl MobileInput {
    #[must_use]
    pub fn new(viewport: Vec2, cfg: &MobileSettings) -> Self {
        Self {
            zone: JoystickZone::for_viewport(viewport, cfg),
            joystick: VirtualJoystick::new(cfg.joystick_radius),
            look: TouchLook::default(),
            jump_pending: false,
            interact_pending: false,
        }
    }

    pub fn resize(&mut self, viewport: Vec2, cfg: &MobileSettings) {
        self.zone = JoystickZone::for_viewport(viewport, cfg);
        self.joystick.max_radius = cfg.joystick_radius;
    }

    pub fn touch_start(&mut self, id: u64, at: Vec2) {
        if !self.joystick.is_active() && self.zone.contains(at) {
            self.joystick.begin(id, at);
        } else if self.look.touch.is_none() {
            self.look = TouchLook { touch: Some(id), last: at, accum: self.look.accum };
        }
    }

    pub fn touch_move(&mut self, id: u64, to: Vec2) {
        if self.joystick.drag(id, to) {
            return;
        }
        if self.look.touch == Some(id) {
            self.look.accum += to - self.look.last;
            self.look.last = to;
        }
    }

    pub fn touch_end(&mut self, id: u64) {
        if self.joystick.release(id) {
            return;
        }
        if self.look.touch == Some(id) {
            self.look.touch = None;
        }
    }

    pub fn press_jump(&mut self) {
        self.jump_pending = true;
    }

    pub fn press_interact(&mut self) {
        self.interact_pending = true;
    }
}

impl InputSource for MobileInput {
    fn sample(&mut self) -> InputFrame {
        let (forward_axis, right_axis) = self.joystick.axes();
        InputFrame {
            forward_axis,
            right_axis,
            jump_requested: std::mem::take(&mut self.jump_pending),
            interact_requested: std::mem::take(&mut self.interact_pending),
            sprint: false,
            look_delta: std::mem::take(&mut self.look.accum),
        }
    }

    fn reset(&mut self) {
        let max_radius = self.joystick.max_radius;
        self.joystick = VirtualJoystick::new(max_radius);
        self.look = TouchLook::default();
        self.jump_pending = false;
        self.interact_pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mobile() -> MobileInput {
        MobileInput::new(Vec2::new(800.0, 600.0), &MobileSettings::default())
    }

    #[test]
    fn zone_sits_bottom_left() {
        let m = mobile();
        assert_eq!(m.zone.center, Vec2::new(120.0, 480.0));
        assert!(m.zone.contains(Vec2::new(150.0, 500.0)));
        assert!(!m.zone.contains(Vec2::new(600.0, 100.0)));
    }

    #[test]
    fn drag_is_clamped_to_radius() {
        let mut m = mobile();
        m.touch_start(1, Vec2::new(120.0, 480.0));
        for far in [Vec2::new(120.0, -5000.0), Vec2::new(9000.0, 9000.0), Vec2::new(121.0, 480.0)] {
            m.touch_move(1, far);
            assert!(m.joystick.offset().length() <= 60.0 + 1e-4);
        }
        m.touch_move(1, Vec2::new(120.0, 0.0));
        let f = m.sample();
        assert!((f.forward_axis - 1.0).abs() < 1e-5);
        assert!(f.right_axis.abs() < 1e-5);
    }

    #[test]
    fn release_zeroes_axes_immediately() {
        let mut m = mobile();
        m.touch_start(3, Vec2::new(100.0, 500.0));
        m.touch_move(3, Vec2::new(160.0, 500.0));
        assert!((m.sample().right_axis - 1.0).abs() < 1e-5);
        m.touch_end(3);
        let f = m.sample();
        assert_eq!((f.forward_axis, f.right_axis), (0.0, 0.0));
    }

    #[test]
    fn touches_outside_zone_drive_look() {
        let mut m = mobile();
        m.touch_start(7, Vec2::new(600.0, 200.0));
        m.touch_move(7, Vec2::new(610.0, 195.0));
        m.touch_move(7, Vec2::new(620.0, 190.0));
        let f = m.sample();
        assert_eq!(f.look_delta, Vec2::new(20.0, -10.0));
        assert_eq!((f.forward_axis, f.right_axis), (0.0, 0.0));
        assert_eq!(m.sample().look_delta, Vec2::ZERO);
    }

    #[test]
    fn joystick_and_look_are_independent() {
        let mut m = mobile();
        m.touch_start(1, Vec2::new(120.0, 480.0));
        m.touch_start(2, Vec2::new(600.0, 200.0));
        m.touch_move(1, Vec2::new(120.0, 450.0));
        m.touch_move(2, Vec2::new(640.0, 200.0));
        let f = m.sample();
        assert!((f.forward_axis - 0.5).abs() < 1e-5);
        assert_eq!(f.look_delta, Vec2::new(40.0, 0.0));
    }

    #[test]
    fn second_touch_in_zone_does_not_steal_stick() {
        let mut m = mobile();
        m.touch_start(1, Vec2::new(120.0, 480.0));
        m.touch_start(2, Vec2::new(130.0, 490.0));
        m.touch_move(2, Vec2::new(130.0, 300.0));
        assert_eq!(m.joystick.offset(), Vec2::ZERO);
    }
}
