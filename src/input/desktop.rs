//! Keyboard + pointer-lock input.
use bevy::prelude::Vec2;

use super::{InputFrame, InputSource};

/// Movement keys tracked as held state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeldKey {
    Forward,
    Back,
    Left,
    Right,
    Sprint,
}

impl HeldKey {
    fn index(self) -> usize {
        self as usize
    }
}

/// Desktop input state between samples.
///
/// Mouse motion only counts while the pointer is locked; jump and interact
/// are edges consumed by the next sample.
#[derive(Debug, Clone, Default)]
pub struct DesktopInput {
    held: [bool; 5],
    jump_pending: bool,
    interact_pending: bool,
    look_accum: Vec2,
    pointer_locked: bool,
}

impl DesktopInput {
    pub fn set_held(&mut self, key: HeldKey, pressed: bool) {
        self.held[key.index()] = pressed;
    }

    #[must_use]
    pub fn is_held(&self, key: HeldKey) -> bool {
        self.held[key.index()]
    }

    pub fn press_jump(&mut self) {
        self.jump_pending = true;
    }

    pub fn press_interact(&mut self) {
        self.interact_pending = true;
    }

    pub fn add_mouse_motion(&mut self, delta: Vec2) {
        if self.pointer_locked {
            self.look_accum += delta;
        }
    }

    pub fn set_pointer_lock(&mut self, locked: bool) {
        self.pointer_locked = locked;
        if !locked {
            self.look_accum = Vec2::ZERO;
        }
    }

    #[must_use]
    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    fn axis(&self, positive: HeldKey, negative: HeldKey) -> f32 {
        f32::from(u8::from(self.is_held(positive))) - f32::from(u8::from(self.is_held(negative)))
    }
}

impl InputSource for DesktopInput {
    fn sample(&mut self) -> InputFrame {
        InputFrame {
            forward_axis: self.axis(HeldKey::Forward, HeldKey::Back),
            right_axis: self.axis(HeldKey::Right, HeldKey::Left),
            jump_requested: std::mem::take(&mut self.jump_pending),
            interact_requested: std::mem::take(&mut self.interact_pending),
            sprint: self.is_held(HeldKey::Sprint),
            look_delta: std::mem::take(&mut self.look_accum),
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposing_keys_cancel() {
        let mut d = DesktopInput::default();
        d.set_held(HeldKey::Forward, true);
        d.set_held(HeldKey::Back, true);
        d.set_held(HeldKey::Left, true);
        let f = d.sample();
        assert_eq!(f.forward_axis, 0.0);
        assert_eq!(f.right_axis, -1.0);
    }

    #[test]
    fn jump_is_edge_triggered() {
        let mut d = DesktopInput::default();
        d.press_jump();
        assert!(d.sample().jump_requested);
        assert!(!d.sample().jump_requested);
    }

    #[test]
    fn mouse_motion_needs_pointer_lock() {
        let mut d = DesktopInput::default();
        d.add_mouse_motion(Vec2::new(5.0, 0.0));
        assert_eq!(d.sample().look_delta, Vec2::ZERO);

        d.set_pointer_lock(true);
        d.add_mouse_motion(Vec2::new(5.0, 1.0));
        d.add_mouse_motion(Vec2::new(2.0, 1.0));
        assert_eq!(d.sample().look_delta, Vec2::new(7.0, 2.0));
        assert_eq!(d.sample().look_delta, Vec2::ZERO);
    }

    #[test]
    fn reset_clears_everything() {
        let mut d = DesktopInput::default();
        d.set_held(HeldKey::Forward, true);
        d.set_pointer_lock(true);
        d.press_interact();
        d.reset();
        assert!(!d.pointer_locked());
        assert!(d.sample().is_idle());
    }
}
