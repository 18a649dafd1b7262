//! Frame loop and session lifecycle.
//!
//! Every navigation system runs inside one chained sequence of sets in
//! `Update`: load, commands, input, player, doors, HUD, UI, teardown. The
//! simulation sets only run once the load has settled, so ticks that arrive
//! before the model is ready are no-ops.
//!
//! The presentation layer talks to the session through `NavigatorCommand`
//! events and reads `NavigatorStatus` back.
//!
//! # Example
//!
//! ```ignore
//! app.insert_resource(settings)
//!     .add_plugins(NavigatorPlugin);
//! // from a UI button:
//! commands.send_event(NavigatorCommand::Select(Some("Reception".into())));
//! ```
use bevy::app::AppExit;
use bevy::log::{debug, info, warn};
use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};

use crate::door::{DoorProximityClock, interact_with_doors, update_door_proximity};
use crate::input::{
    CurrentInput, InputMode, InputRouter, feed_desktop_input, feed_mobile_input, input_mode_is, sample_input,
};
use crate::loader::{LoadPhase, ModelLoad, ModelRoot, classify_model, model_loading, poll_model_load, session_live, session_ready, start_model_load};
use crate::navigation::{ActiveGuidance, NavigatorArrow, ProximityBand, SelectedDestination, TargetRegistry, update_navigator_hud};
use crate::player::{Player, apply_look, cursor_grab, player_movement, player_physics, set_cursor_lock};
use crate::scene::GroundSet;
use crate::settings::Settings;
use crate::ui::OverlayUi;

/// Window size assumed until the primary window reports its own.
const DEFAULT_VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum NavSet {
    Load,
    Commands,
    Input,
    Player,
    Doors,
    Hud,
    Ui,
    Teardown,
}

/// Requests from the presentation layer.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum NavigatorCommand {
    Select(Option<String>),
    SetInputMode(InputMode),
    Jump,
    Interact,
    Teardown,
}

/// Everything the presentation layer shows.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct NavigatorStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub destinations: Vec<String>,
    pub selected: Option<String>,
    pub mode: InputMode,
    pub distance: Option<f32>,
    pub band: Option<ProximityBand>,
}

/// A session starts out loading; `sync_status` clears the flag once the
/// load settles.
impl Default for NavigatorStatus {
    fn default() -> Self {
        Self {
            loading: true,
            error: None,
            destinations: Vec::new(),
            selected: None,
            mode: InputMode::default(),
            distance: None,
            band: None,
        }
    }
}

/// Logical size of the primary window.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Viewport(pub Vec2);

impl Default for Viewport {
    fn default() -> Self {
        Self(DEFAULT_VIEWPORT)
    }
}

/// Set when a teardown command arrives; acted on at the end of the tick.
#[derive(Resource, Debug, Default)]
pub struct TeardownRequested(pub bool);

pub struct NavigatorPlugin;

impl Plugin for NavigatorPlugin {
    fn build(&self, app: &mut App) {
        let settings = app.world().get_resource::<Settings>().cloned().unwrap_or_default();
        if !app.world().contains_resource::<Settings>() {
            app.insert_resource(settings.clone());
        }

        app.add_event::<NavigatorCommand>()
            .insert_resource(InputRouter::new(settings.controls.input_mode, DEFAULT_VIEWPORT, &settings.mobile))
            .init_resource::<ModelLoad>()
            .init_resource::<GroundSet>()
            .init_resource::<TargetRegistry>()
            .init_resource::<SelectedDestination>()
            .init_resource::<ActiveGuidance>()
            .init_resource::<CurrentInput>()
            .init_resource::<DoorProximityClock>()
            .init_resource::<NavigatorStatus>()
            .init_resource::<Viewport>()
            .init_resource::<TeardownRequested>();

        app.configure_sets(
            Update,
            (
                NavSet::Load,
                NavSet::Commands,
                NavSet::Input,
                NavSet::Player,
                NavSet::Doors,
                NavSet::Hud,
                NavSet::Ui,
                NavSet::Teardown,
            )
                .chain(),
        )
        .configure_sets(Update, NavSet::Load.run_if(model_loading))
        .configure_sets(Update, NavSet::Commands.run_if(session_live))
        .configure_sets(
            Update,
            (NavSet::Input, NavSet::Player, NavSet::Doors, NavSet::Hud).run_if(session_ready),
        );

        app.add_systems(Startup, (init_viewport, start_model_load))
            .add_systems(Update, (poll_model_load, classify_model).chain().in_set(NavSet::Load))
            .add_systems(
                Update,
                (handle_resize, desktop_shortcuts, apply_navigator_commands).chain().in_set(NavSet::Commands),
            )
            .add_systems(
                Update,
                (
                    cursor_grab.run_if(input_mode_is(InputMode::Desktop)),
                    feed_desktop_input.run_if(input_mode_is(InputMode::Desktop)),
                    feed_mobile_input.run_if(input_mode_is(InputMode::Mobile)),
                    sample_input,
                )
                    .chain()
                    .in_set(NavSet::Input),
            )
            .add_systems(Update, (apply_look, player_movement, player_physics).chain().in_set(NavSet::Player))
            .add_systems(Update, (update_door_proximity, interact_with_doors).chain().in_set(NavSet::Doors))
            .add_systems(Update, update_navigator_hud.in_set(NavSet::Hud))
            .add_systems(Update, sync_status.in_set(NavSet::Ui))
            .add_systems(Update, teardown_session.in_set(NavSet::Teardown));
    }
}

#[allow(clippy::needless_pass_by_value)]
fn init_viewport(
    windows: Query<&Window, With<PrimaryWindow>>,
    settings: Res<Settings>,
    mut viewport: ResMut<Viewport>,
    mut router: ResMut<InputRouter>,
) {
    if let Ok(window) = windows.get_single() {
        viewport.0 = Vec2::new(window.width(), window.height());
    }
    router.resize(viewport.0, &settings.mobile);
}

/// Keep the viewport and joystick zone in step with the window. Bevy
/// updates the camera projection itself.
#[allow(clippy::needless_pass_by_value)]
pub fn handle_resize(
    mut resized: EventReader<WindowResized>,
    windows: Query<Entity, With<PrimaryWindow>>,
    settings: Res<Settings>,
    mut viewport: ResMut<Viewport>,
    mut router: ResMut<InputRouter>,
) {
    let primary = windows.get_single().ok();
    let mut changed = settings.is_changed();
    for ev in resized.read() {
        if primary.is_some_and(|w| w != ev.window) {
            continue;
        }
        viewport.0 = Vec2::new(ev.width, ev.height);
        changed = true;
    }
    if changed {
        router.resize(viewport.0, &settings.mobile);
        debug!("viewport {}x{}", viewport.0.x, viewport.0.y);
    }
}

/// Keyboard stand-ins for the external destination picker and mode toggle.
#[allow(clippy::needless_pass_by_value)]
pub fn desktop_shortcuts(
    keys: Res<ButtonInput<KeyCode>>,
    settings: Res<Settings>,
    registry: Res<TargetRegistry>,
    selected: Res<SelectedDestination>,
    router: Res<InputRouter>,
    mut out: EventWriter<NavigatorCommand>,
) {
    for (action, default, step) in [
        ("next_destination", KeyCode::BracketRight, 1),
        ("prev_destination", KeyCode::BracketLeft, -1),
    ] {
        if keys.just_pressed(settings.key_for(action, default))
            && let Some(label) = registry.cycle(selected.0.as_deref(), step)
        {
            out.send(NavigatorCommand::Select(Some(label)));
        }
    }
    if keys.just_pressed(settings.key_for("toggle_mode", KeyCode::KeyM)) {
        out.send(NavigatorCommand::SetInputMode(router.mode().toggled()));
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn apply_navigator_commands(
    mut events: EventReader<NavigatorCommand>,
    registry: Res<TargetRegistry>,
    mut selected: ResMut<SelectedDestination>,
    mut router: ResMut<InputRouter>,
    mut teardown: ResMut<TeardownRequested>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    for cmd in events.read() {
        match cmd {
            NavigatorCommand::Select(None) => selected.0 = None,
            NavigatorCommand::Select(Some(label)) => {
                let canonical = registry.get(label).map(|t| t.label.clone());
                if canonical.is_none() {
                    warn!("selected unknown destination '{label}'");
                }
                info!("destination -> {}", canonical.as_deref().unwrap_or(label));
                selected.0 = Some(canonical.unwrap_or_else(|| label.clone()));
            }
            NavigatorCommand::SetInputMode(mode) => {
                if router.set_mode(*mode)
                    && let Ok(mut window) = windows.get_single_mut()
                {
                    set_cursor_lock(&mut window, false);
                }
            }
            NavigatorCommand::Jump => router.request_jump(),
            NavigatorCommand::Interact => router.request_interact(),
            NavigatorCommand::Teardown => teardown.0 = true,
        }
    }
}

/// Rebuild the status snapshot; only writes when something changed so UI
/// change detection stays quiet.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_status(
    load: Res<ModelLoad>,
    registry: Res<TargetRegistry>,
    selected: Res<SelectedDestination>,
    guidance: Res<ActiveGuidance>,
    router: Res<InputRouter>,
    mut status: ResMut<NavigatorStatus>,
) {
    let next = NavigatorStatus {
        loading: load.is_loading(),
        error: load.error.clone(),
        destinations: registry.labels(),
        selected: selected.0.clone(),
        mode: router.mode(),
        distance: guidance.0.map(|g| g.distance),
        band: guidance.0.map(|g| g.band),
    };
    if *status != next {
        *status = next;
    }
}

/// Release everything the session created. Runs on a teardown command or
/// when the app exits; a second run does nothing.
#[allow(clippy::needless_pass_by_value, clippy::too_many_arguments)]
pub fn teardown_session(
    mut commands: Commands,
    mut exit: EventReader<AppExit>,
    mut requested: ResMut<TeardownRequested>,
    mut load: ResMut<ModelLoad>,
    mut router: ResMut<InputRouter>,
    mut registry: ResMut<TargetRegistry>,
    mut ground: ResMut<GroundSet>,
    mut selected: ResMut<SelectedDestination>,
    owned: Query<Entity, Or<(With<OverlayUi>, With<NavigatorArrow>, With<ModelRoot>)>>,
    players: Query<Entity, With<Player>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let exiting = exit.read().count() > 0;
    if !(exiting || std::mem::take(&mut requested.0)) || load.torn_down {
        return;
    }

    for entity in &owned {
        commands.entity(entity).despawn_recursive();
    }
    for entity in &players {
        commands.entity(entity).remove::<Player>();
    }
    if let Ok(mut window) = windows.get_single_mut() {
        set_cursor_lock(&mut window, false);
    }
    router.reset();
    registry.clear();
    ground.clear();
    selected.0 = None;

    let was = load.phase();
    load.torn_down = true;
    load.root = None;
    info!("navigation session torn down (load phase was {was:?})");
    if was == LoadPhase::NotLoaded {
        debug!("teardown before the model finished loading");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use crate::navigation::destinations::FixedDestination;
    use crate::settings::MobileSettings;

    fn session_world() -> World {
        let mut world = World::new();
        world.init_resource::<Events<NavigatorCommand>>();
        world.init_resource::<Events<AppExit>>();
        world.insert_resource(InputRouter::new(InputMode::Desktop, DEFAULT_VIEWPORT, &MobileSettings::default()));
        world.insert_resource(TargetRegistry::build(
            Vec::new(),
            &[FixedDestination { label: "Reception".into(), position: Vec3::X }],
        ));
        world.init_resource::<SelectedDestination>();
        world.init_resource::<TeardownRequested>();
        world.init_resource::<ModelLoad>();
        world.init_resource::<GroundSet>();
        world
    }

    fn send(world: &mut World, cmd: NavigatorCommand) {
        world.resource_mut::<Events<NavigatorCommand>>().send(cmd);
    }

    #[test]
    fn select_uses_registry_spelling() {
        let mut world = session_world();
        send(&mut world, NavigatorCommand::Select(Some("reception".into())));
        world.run_system_once(apply_navigator_commands);
        assert_eq!(world.resource::<SelectedDestination>().0.as_deref(), Some("Reception"));

        send(&mut world, NavigatorCommand::Select(None));
        world.run_system_once(apply_navigator_commands);
        assert_eq!(world.resource::<SelectedDestination>().0, None);
    }

    #[test]
    fn mode_command_switches_router() {
        let mut world = session_world();
        send(&mut world, NavigatorCommand::SetInputMode(InputMode::Mobile));
        world.run_system_once(apply_navigator_commands);
        assert_eq!(world.resource::<InputRouter>().mode(), InputMode::Mobile);
    }

    #[test]
    fn teardown_is_idempotent() {
        let mut world = session_world();
        let root = world.spawn(ModelRoot).id();
        let overlay = world.spawn(OverlayUi).id();
        let player = world.spawn(Player::default()).id();
        world.resource_mut::<ModelLoad>().root = Some(root);

        send(&mut world, NavigatorCommand::Teardown);
        world.run_system_once(apply_navigator_commands);
        world.run_system_once(teardown_session);

        assert!(world.get_entity(root).is_none());
        assert!(world.get_entity(overlay).is_none());
        assert!(world.get::<Player>(player).is_none());
        assert!(world.resource::<ModelLoad>().torn_down);
        assert!(world.resource::<TargetRegistry>().is_empty());

        // Again, and via app exit: nothing left to do, nothing breaks.
        world.resource_mut::<TeardownRequested>().0 = true;
        world.resource_mut::<Events<AppExit>>().send(AppExit::Success);
        world.run_system_once(teardown_session);
        assert!(world.resource::<ModelLoad>().torn_down);
    }

    #[test]
    fn no_teardown_without_request() {
        let mut world = session_world();
        let root = world.spawn(ModelRoot).id();
        world.run_system_once(teardown_session);
        assert!(world.get_entity(root).is_some());
        assert!(!world.resource::<ModelLoad>().torn_down);
    }

    #[test]
    fn loading_flag_goes_from_true_to_false_once() {
        let mut world = session_world();
        world.init_resource::<ActiveGuidance>();
        world.init_resource::<NavigatorStatus>();

        let mut seen = vec![world.resource::<NavigatorStatus>().loading];
        world.run_system_once(sync_status);
        seen.push(world.resource::<NavigatorStatus>().loading);
        world.resource_mut::<ModelLoad>().complete(Ok(Vec3::new(0.0, 1.6, 0.0)));
        world.run_system_once(sync_status);
        seen.push(world.resource::<NavigatorStatus>().loading);
        world.run_system_once(sync_status);
        seen.push(world.resource::<NavigatorStatus>().loading);

        assert_eq!(seen, vec![true, true, false, false]);
    }

    #[test]
    fn commands_stop_after_teardown() {
        let mut world = session_world();
        let mut schedule = Schedule::default();
        schedule.add_systems((apply_navigator_commands, teardown_session).chain().run_if(session_live));

        send(&mut world, NavigatorCommand::Teardown);
        schedule.run(&mut world);
        assert!(world.resource::<ModelLoad>().torn_down);

        send(&mut world, NavigatorCommand::SetInputMode(InputMode::Mobile));
        send(&mut world, NavigatorCommand::Select(Some("Reception".into())));
        schedule.run(&mut world);
        assert_eq!(world.resource::<InputRouter>().mode(), InputMode::Desktop);
        assert_eq!(world.resource::<SelectedDestination>().0, None);
    }

    #[test]
    fn late_failure_after_teardown_is_ignored() {
        let mut world = session_world();
        send(&mut world, NavigatorCommand::Teardown);
        world.run_system_once(apply_navigator_commands);
        world.run_system_once(teardown_session);

        let mut load = world.resource_mut::<ModelLoad>();
        let late = crate::error::NavError::ModelLoad { path: "x".into(), reason: "timeout".into() };
        assert!(!load.complete(Err(late)));
        assert!(load.error.is_none());
    }
}
