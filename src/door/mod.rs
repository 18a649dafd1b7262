//! Doors found in the model: proximity tracking and one-shot opening.
//!
//! Proximity is refreshed on a throttled clock rather than every frame. An
//! interact opens every door currently near the player; an opened door
//! swings once and stays open for the rest of the session.

use std::f32::consts::FRAC_PI_2;

use bevy::log::info;
use bevy::prelude::*;

use crate::input::CurrentInput;
use crate::player::Player;
use crate::settings::Settings;

/// Rotation applied about the door's vertical axis when it opens.
pub const DOOR_SWING: f32 = FRAC_PI_2;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Door {
    pub opened: bool,
    pub near: bool,
    /// World-space centre, baked when the model was classified.
    pub center: Vec3,
}

impl Door {
    #[must_use]
    pub fn new(center: Vec3) -> Self {
        Self { opened: false, near: false, center }
    }

    /// Recompute `near`. Opened doors are never near.
    pub fn refresh_proximity(&mut self, viewer: Vec3, radius: f32) {
        self.near = !self.opened && viewer.distance_squared(self.center) <= radius * radius;
    }

    /// Open the door if it is near and still closed. Returns whether it
    /// opened; the caller swings the node only then.
    pub fn try_open(&mut self) -> bool {
        if self.opened || !self.near {
            return false;
        }
        self.opened = true;
        self.near = false;
        true
    }
}

/// Swing a door node open.
pub fn swing_open(transform: &mut Transform) {
    transform.rotate_local_y(DOOR_SWING);
}

/// Accumulates frame time and fires once per interval.
#[derive(Resource, Debug, Default)]
pub struct DoorProximityClock {
    elapsed: f32,
}

impl DoorProximityClock {
    pub fn tick(&mut self, dt: f32, interval: f32) -> bool {
        self.elapsed += dt.max(0.0);
        if self.elapsed < interval {
            return false;
        }
        self.elapsed = 0.0;
        true
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn update_door_proximity(
    time: Res<Time>,
    settings: Res<Settings>,
    mut clock: ResMut<DoorProximityClock>,
    camera: Query<&Transform, With<Player>>,
    mut doors: Query<&mut Door>,
) {
    if !clock.tick(time.delta_seconds(), settings.doors.check_interval) {
        return;
    }
    let Ok(camera) = camera.get_single() else { return };
    let radius = settings.doors.interaction_radius;
    for mut door in &mut doors {
        // Avoid tripping change detection on every refresh.
        let mut next = *door;
        next.refresh_proximity(camera.translation, radius);
        if next != *door {
            *door = next;
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn interact_with_doors(input: Res<CurrentInput>, mut doors: Query<(&mut Door, &mut Transform, Option<&Name>)>) {
    if !input.0.interact_requested {
        return;
    }
    for (mut door, mut transform, name) in &mut doors {
        if door.try_open() {
            swing_open(&mut transform);
            info!("opened door {}", name.map_or("<unnamed>", Name::as_str));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputFrame;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn open_is_one_shot() {
        let mut door = Door::new(Vec3::ZERO);
        let mut tf = Transform::default();
        door.refresh_proximity(Vec3::new(1.0, 0.0, 0.0), 2.0);
        assert!(door.near);

        assert!(door.try_open());
        swing_open(&mut tf);
        let after_first = tf.rotation;

        door.refresh_proximity(Vec3::new(1.0, 0.0, 0.0), 2.0);
        assert!(!door.near);
        assert!(!door.try_open());
        assert_eq!(tf.rotation, after_first);
        assert!(door.opened);
    }

    #[test]
    fn far_door_does_not_open() {
        let mut door = Door::new(Vec3::new(10.0, 0.0, 0.0));
        door.refresh_proximity(Vec3::ZERO, 2.0);
        assert!(!door.try_open());
        assert!(!door.opened);
    }

    #[test]
    fn swing_is_quarter_turn_about_y() {
        let mut tf = Transform::default();
        swing_open(&mut tf);
        let x = tf.rotation * Vec3::X;
        assert!(x.distance(Vec3::NEG_Z) < 1e-5);
    }

    #[test]
    fn clock_fires_on_interval() {
        let mut clock = DoorProximityClock::default();
        let fired: Vec<bool> = (0..7).map(|_| clock.tick(0.04, 0.1)).collect();
        assert_eq!(fired, vec![false, false, true, false, false, true, false]);
    }

    #[test]
    fn interact_opens_every_near_door() {
        let mut world = World::new();
        world.insert_resource(CurrentInput(InputFrame { interact_requested: true, ..Default::default() }));
        let near = |x: f32| Door { opened: false, near: true, center: Vec3::new(x, 0.0, 0.0) };
        let a = world.spawn((near(1.0), Transform::default())).id();
        let b = world.spawn((near(-1.0), Transform::default())).id();
        let far = world.spawn((Door::new(Vec3::splat(50.0)), Transform::default())).id();

        world.run_system_once(interact_with_doors);
        for e in [a, b] {
            assert!(world.get::<Door>(e).is_some_and(|d| d.opened && !d.near));
            assert_ne!(world.get::<Transform>(e).map(|t| t.rotation), Some(Quat::IDENTITY));
        }
        assert!(world.get::<Door>(far).is_some_and(|d| !d.opened));

        // Second interact leaves the opened doors alone.
        let rot = world.get::<Transform>(a).map(|t| t.rotation);
        world.run_system_once(interact_with_doors);
        assert_eq!(world.get::<Transform>(a).map(|t| t.rotation), rot);
    }
}
