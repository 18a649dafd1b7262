//! Built-in overlay: crosshair, load status banner, destination readout,
//! mobile action buttons, the F1 debug overlay and F2 navigation gizmos.
//!
//! The real destination picker lives outside this crate; this overlay only
//! reads `NavigatorStatus` and sends `NavigatorCommand`s, so it can be
//! dropped without touching the simulation. Every root node it spawns is
//! tagged `OverlayUi` so teardown can find it.

use bevy::diagnostic::{Diagnostic, DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy::render::primitives::Aabb;

use crate::door::Door;
use crate::input::{InputMode, InputRouter};
use crate::navigation::hud::anchor_world_position;
use crate::navigation::{SelectedDestination, TargetRegistry};
use crate::player::{Player, PlayerPhase};
use crate::session::{NavSet, NavigatorCommand, NavigatorStatus, apply_navigator_commands};
use crate::settings::Settings;

const TEXT_COLOR: Color = Color::srgb(0.95, 0.95, 0.95);
const ERROR_COLOR: Color = Color::srgb(1.0, 0.4, 0.35);
const DEBUG_COLOR: Color = Color::srgb(1.0, 1.0, 0.0);
const BUTTON_IDLE: Color = Color::srgba(0.1, 0.1, 0.1, 0.55);
const BUTTON_PRESSED: Color = Color::srgba(0.3, 0.3, 0.3, 0.8);

/// Root of anything the overlay spawned.
#[derive(Component, Debug, Default)]
pub struct OverlayUi;

#[derive(Component)]
pub struct StatusBanner;

#[derive(Component)]
pub struct DestinationReadout;

#[derive(Component)]
pub struct DebugOverlayText;

#[derive(Component)]
pub struct MobileControls;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobileButton {
    Jump,
    Interact,
}

/// State for the debug overlay visibility.
#[derive(Resource, Default)]
pub struct DebugOverlayState {
    pub visible: bool,
}

#[derive(Resource)]
pub struct DebugOverlayTimer(pub Timer);

impl Default for DebugOverlayTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(0.5, TimerMode::Repeating))
    }
}

#[derive(Resource, Default)]
pub struct NavGizmosVisible(pub bool);

pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DebugOverlayState>()
            .init_resource::<DebugOverlayTimer>()
            .init_resource::<NavGizmosVisible>()
            .add_systems(Startup, spawn_overlay)
            .add_systems(
                Update,
                mobile_button_presses.in_set(NavSet::Commands).before(apply_navigator_commands),
            )
            .add_systems(
                Update,
                (
                    toggle_debug_overlay,
                    toggle_nav_gizmos,
                    update_status_banner,
                    update_destination_readout,
                    show_mobile_controls,
                    update_debug_overlay,
                    draw_nav_gizmos,
                )
                    .in_set(NavSet::Ui),
            );
    }
}

fn text(value: &str, size: f32, color: Color) -> Text {
    Text::from_section(value, TextStyle { font_size: size, color, ..default() })
}

/// Spawn the overlay nodes. Everything starts empty and is filled in by the
/// update systems.
pub fn spawn_overlay(mut commands: Commands) {
    spawn_crosshair(&mut commands);

    commands.spawn((
        TextBundle {
            text: text("", 16.0, DEBUG_COLOR),
            style: Style { position_type: PositionType::Absolute, left: Val::Px(10.0), top: Val::Px(10.0), ..default() },
            ..default()
        },
        DebugOverlayText,
        OverlayUi,
    ));

    commands
        .spawn((
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    width: Val::Percent(100.0),
                    top: Val::Px(16.0),
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::Center,
                    row_gap: Val::Px(6.0),
                    ..default()
                },
                ..default()
            },
            OverlayUi,
        ))
        .with_children(|p| {
            p.spawn((TextBundle { text: text("", 22.0, TEXT_COLOR), ..default() }, StatusBanner));
            p.spawn((TextBundle { text: text("", 18.0, TEXT_COLOR), ..default() }, DestinationReadout));
        });

    commands
        .spawn((
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    right: Val::Px(24.0),
                    bottom: Val::Px(24.0),
                    flex_direction: FlexDirection::Column,
                    row_gap: Val::Px(12.0),
                    ..default()
                },
                visibility: Visibility::Hidden,
                ..default()
            },
            MobileControls,
            OverlayUi,
        ))
        .with_children(|p| {
            for (button, label) in [(MobileButton::Jump, "Jump"), (MobileButton::Interact, "Use")] {
                p.spawn((
                    ButtonBundle {
                        style: Style {
                            width: Val::Px(88.0),
                            height: Val::Px(88.0),
                            justify_content: JustifyContent::Center,
                            align_items: AlignItems::Center,
                            ..default()
                        },
                        border_radius: BorderRadius::MAX,
                        background_color: BUTTON_IDLE.into(),
                        ..default()
                    },
                    button,
                ))
                .with_children(|b| {
                    b.spawn(TextBundle { text: text(label, 18.0, TEXT_COLOR), ..default() });
                });
            }
        });
}

/// Spawn a crosshair UI element centered on the screen.
pub fn spawn_crosshair(commands: &mut Commands) {
    commands
        .spawn((
            NodeBundle {
                style: Style {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    justify_content: JustifyContent::Center,
                    align_items: AlignItems::Center,
                    ..default()
                },
                ..default()
            },
            OverlayUi,
        ))
        .with_children(|p| {
            for (w, h) in [(16.0, 2.0), (2.0, 16.0)] {
                p.spawn(NodeBundle {
                    style: Style { position_type: PositionType::Absolute, width: Val::Px(w), height: Val::Px(h), ..default() },
                    background_color: Color::srgba(1.0, 1.0, 1.0, 0.8).into(),
                    ..default()
                });
            }
        });
}

/// Banner text for the load state; `None` hides the banner.
#[must_use]
pub fn status_line(status: &NavigatorStatus) -> Option<String> {
    if let Some(err) = &status.error {
        return Some(format!("Could not load the building: {err}"));
    }
    status.loading.then(|| "Loading building...".to_string())
}

/// "Reception - 12.4 m", or a hint when nothing is selected.
#[must_use]
pub fn readout_line(status: &NavigatorStatus) -> String {
    match (&status.selected, status.distance) {
        (Some(label), Some(d)) => format!("{label} - {d:.1} m"),
        (Some(label), None) => format!("{label} - not reachable"),
        (None, _) if status.destinations.is_empty() => String::new(),
        (None, _) => format!("{} destinations - [ / ] to choose", status.destinations.len()),
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn update_status_banner(status: Res<NavigatorStatus>, mut q: Query<&mut Text, With<StatusBanner>>) {
    if !status.is_changed() {
        return;
    }
    let Ok(mut text) = q.get_single_mut() else { return };
    let line = status_line(&status);
    text.sections[0].style.color = if status.error.is_some() { ERROR_COLOR } else { TEXT_COLOR };
    text.sections[0].value = line.unwrap_or_default();
}

#[allow(clippy::needless_pass_by_value)]
pub fn update_destination_readout(status: Res<NavigatorStatus>, mut q: Query<&mut Text, With<DestinationReadout>>) {
    if !status.is_changed() {
        return;
    }
    if let Ok(mut text) = q.get_single_mut() {
        text.sections[0].value = readout_line(&status);
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn show_mobile_controls(router: Res<InputRouter>, mut q: Query<&mut Visibility, With<MobileControls>>) {
    let want = if router.mode() == InputMode::Mobile { Visibility::Inherited } else { Visibility::Hidden };
    for mut vis in &mut q {
        if *vis != want {
            *vis = want;
        }
    }
}

#[allow(clippy::type_complexity)]
pub fn mobile_button_presses(
    mut buttons: Query<(&Interaction, &MobileButton, &mut BackgroundColor), Changed<Interaction>>,
    mut out: EventWriter<NavigatorCommand>,
) {
    for (interaction, button, mut bg) in &mut buttons {
        match interaction {
            Interaction::Pressed => {
                *bg = BUTTON_PRESSED.into();
                out.send(match button {
                    MobileButton::Jump => NavigatorCommand::Jump,
                    MobileButton::Interact => NavigatorCommand::Interact,
                });
            }
            _ => *bg = BUTTON_IDLE.into(),
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn toggle_debug_overlay(
    mut state: ResMut<DebugOverlayState>,
    input: Res<ButtonInput<KeyCode>>,
    settings: Res<Settings>,
) {
    if input.just_pressed(settings.key_for("toggle_debug", KeyCode::F1)) {
        state.visible = !state.visible;
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn toggle_nav_gizmos(
    mut gizmos: ResMut<NavGizmosVisible>,
    input: Res<ButtonInput<KeyCode>>,
    settings: Res<Settings>,
) {
    if input.just_pressed(settings.key_for("toggle_gizmos", KeyCode::F2)) {
        gizmos.0 = !gizmos.0;
    }
}

/// Eight-point compass name for a horizontal heading. -Z is north.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn compass_point(forward: Vec3) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let angle = forward.x.atan2(-forward.z).to_degrees().rem_euclid(360.0);
    let idx = ((angle + 22.5) / 45.0) as usize % 8;
    POINTS[idx]
}

#[derive(bevy::ecs::system::SystemParam)]
pub struct DebugOverlayCtx<'w, 's> {
    pub diagnostics: Res<'w, DiagnosticsStore>,
    pub state: Res<'w, DebugOverlayState>,
    pub status: Res<'w, NavigatorStatus>,
    pub time: Res<'w, Time>,
    pub timer: ResMut<'w, DebugOverlayTimer>,
    pub query: Query<'w, 's, &'static mut Text, With<DebugOverlayText>>,
    pub player_query: Query<'w, 's, (&'static Transform, &'static Player)>,
    pub doors: Query<'w, 's, &'static Door>,
}

/// Refresh the debug overlay on its timer rather than every frame.
pub fn update_debug_overlay(mut ctx: DebugOverlayCtx<'_, '_>) {
    if !ctx.timer.0.tick(ctx.time.delta()).just_finished() {
        return;
    }
    let Ok(mut text) = ctx.query.get_single_mut() else { return };
    if !ctx.state.visible {
        text.sections[0].value = String::new();
        return;
    }

    let fps = ctx
        .diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(Diagnostic::smoothed)
        .unwrap_or(0.0);

    let player_line = match ctx.player_query.get_single() {
        Ok((tf, player)) => {
            let p = tf.translation;
            let phase = match player.phase {
                PlayerPhase::Grounded => "grounded",
                PlayerPhase::Airborne => "airborne",
            };
            format!(
                "Pos: ({:.1}, {:.1}, {:.1}) facing {}\nPhase: {phase} (vy {:.2})",
                p.x,
                p.y,
                p.z,
                compass_point(*tf.forward()),
                player.vertical_velocity
            )
        }
        Err(_) => "Pos: N/A".to_string(),
    };

    let (doors, open) = ctx.doors.iter().fold((0, 0), |(n, o), d| (n + 1, o + usize::from(d.opened)));
    let band = ctx.status.band.map_or("-", |b| b.name());

    text.sections[0].value = format!(
        "FPS: {fps:.1}\n{player_line}\nMode: {:?}\nDestinations: {} | band: {band}\nDoors: {doors} ({open} open)",
        ctx.status.mode,
        ctx.status.destinations.len(),
    );
}

/// F2: markers on destinations, door reach circles, the ground probe.
#[allow(clippy::needless_pass_by_value, clippy::too_many_arguments)]
pub fn draw_nav_gizmos(
    visible: Res<NavGizmosVisible>,
    mut gizmos: Gizmos,
    settings: Res<Settings>,
    registry: Res<TargetRegistry>,
    selected: Res<SelectedDestination>,
    anchors: Query<(&GlobalTransform, Option<&Aabb>)>,
    doors: Query<&Door>,
    player: Query<&Transform, With<Player>>,
) {
    if !visible.0 {
        return;
    }
    let selected_key = selected.0.as_deref().map(crate::loader::naming::label_key);
    for target in registry.iter() {
        let Ok(pos) = target.resolve(|e| anchors.get(e).ok().map(|(gt, aabb)| anchor_world_position(gt, aabb))) else {
            continue;
        };
        let is_selected = selected_key.as_deref() == Some(crate::loader::naming::label_key(&target.label).as_str());
        let color = if is_selected { Color::srgb(0.2, 1.0, 0.4) } else { Color::srgb(0.3, 0.6, 1.0) };
        gizmos.sphere(pos, Quat::IDENTITY, 0.3, color);
    }

    for door in &doors {
        let color = match (door.opened, door.near) {
            (true, _) => Color::srgb(0.5, 0.5, 0.5),
            (false, true) => Color::srgb(1.0, 0.8, 0.1),
            (false, false) => Color::srgb(1.0, 0.3, 0.2),
        };
        gizmos.circle(door.center, Dir3::Y, settings.doors.interaction_radius, color);
    }

    if let Ok(tf) = player.get_single() {
        let reach = settings.player.eye_height + settings.player.ground_tolerance;
        let from = tf.translation;
        gizmos.line(from, from - Vec3::Y * reach, Color::srgb(1.0, 0.0, 1.0));
    }
}
