//! Player components and systems (look, movement, physics).
//!
//! The player is the camera: position lives in the camera's `Transform`,
//! and the `Player` component carries the vertical state. It is inserted
//! when the model load completes, whether or not it succeeded.
//!
//! # Example:
//!
//! ```ignore
//! commands.entity(camera).insert((
//!     Player::default(),
//!     PlayerLook::default(),
//!     Transform::from_translation(spawn),
//! ));
//! app.add_systems(Update, (apply_look, player_movement, player_physics).chain());
//! ```
pub mod camera;
pub mod movement;
pub mod physics;

use bevy::prelude::*;

pub use camera::*;
pub use movement::*;
pub use physics::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerPhase {
    Grounded,
    #[default]
    Airborne,
}

/// Vertical state of the player.
#[derive(Component, Debug, Clone, Default)]
pub struct Player {
    /// Units per second, positive is up. Zero whenever Grounded after a tick.
    pub vertical_velocity: f32,
    pub phase: PlayerPhase,
    /// Camera height the last time the player stood on something.
    pub last_safe_y: Option<f32>,
}

impl Player {
    #[must_use]
    pub fn on_ground(&self) -> bool {
        self.phase == PlayerPhase::Grounded
    }
}

/// Marks the camera that becomes the player once the model settles.
#[derive(Component, Debug, Default)]
pub struct PlayerCamera;
