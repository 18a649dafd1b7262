//! Debug dump (F3 default): writes a timestamped snapshot of the navigation
//! session to `./debug-dumps/`: load state, player, destinations, doors,
//! asset counts and process memory.
//!
//! Handy for bug reports: press the key where things look wrong and attach
//! the file.
use std::fmt::Write;

use bevy::diagnostic::{Diagnostic, DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::log::{error, info};
use bevy::prelude::*;
use chrono::{DateTime, Utc};

use crate::door::Door;
use crate::input::InputRouter;
use crate::loader::ModelLoad;
use crate::navigation::{NavigationTarget, SelectedDestination, TargetLocator, TargetRegistry};
use crate::player::Player;
use crate::scene::GroundSet;
use crate::settings::Settings;

pub const DUMP_DIR: &str = "debug-dumps";

pub struct DebugDumpPlugin;

impl Plugin for DebugDumpPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, debug_input_system);
    }
}

fn bytes_to_mb(bytes: u64) -> String {
    format!("{:.2} MB", (bytes as f64) / 1024.0 / 1024.0)
}

/// Resident and virtual memory of this process, plus system total and used.
#[cfg(not(target_arch = "wasm32"))]
fn memory_lines(out: &mut String) {
    use sysinfo::{Pid, PidExt, ProcessExt, System, SystemExt};

    let mut sys = System::new_all();
    sys.refresh_all();
    let pid = Pid::from_u32(std::process::id());
    if let Some(p) = sys.process(pid) {
        writeln!(out, "Process memory: {} (virtual {})", bytes_to_mb(p.memory()), bytes_to_mb(p.virtual_memory())).ok();
    }
    writeln!(out, "System memory: total={} used={}", bytes_to_mb(sys.total_memory()), bytes_to_mb(sys.used_memory())).ok();
}

#[cfg(target_arch = "wasm32")]
fn memory_lines(out: &mut String) {
    writeln!(out, "Process memory: unavailable").ok();
}

fn describe_target(t: &NavigationTarget) -> String {
    match t.locator {
        TargetLocator::MeshAnchor(e) => format!("{} (mesh {e:?})", t.label),
        TargetLocator::FixedPoint(p) => format!("{} (fixed {:.1}, {:.1}, {:.1})", t.label, p.x, p.y, p.z),
    }
}

/// Snapshot of the session as plain text.
#[must_use]
pub fn session_report(
    load: &ModelLoad,
    player: Option<(&Transform, &Player)>,
    registry: &TargetRegistry,
    selected: Option<&str>,
    doors: &[Door],
    ground: &GroundSet,
    router: &InputRouter,
) -> String {
    let mut out = String::new();
    writeln!(out, "Model: '{}' phase={:?} torn_down={}", load.path, load.phase(), load.torn_down).ok();
    if let Some(err) = &load.error {
        writeln!(out, "Load error: {err}").ok();
    }
    if let Some(spawn) = load.spawn_point {
        writeln!(out, "Spawn: ({:.2}, {:.2}, {:.2})", spawn.x, spawn.y, spawn.z).ok();
    }

    match player {
        Some((tf, p)) => {
            let pos = tf.translation;
            writeln!(
                out,
                "Player: ({:.2}, {:.2}, {:.2}) phase={:?} vy={:.3} last_safe_y={:?}",
                pos.x, pos.y, pos.z, p.phase, p.vertical_velocity, p.last_safe_y
            )
            .ok();
        }
        None => {
            writeln!(out, "Player: not spawned").ok();
        }
    }
    writeln!(out, "Input mode: {:?}", router.mode()).ok();
    writeln!(out, "Ground: {} meshes, {} triangles", ground.len(), ground.triangle_count()).ok();

    writeln!(out, "Destinations ({}), selected={:?}:", registry.len(), selected).ok();
    for t in registry.iter() {
        writeln!(out, "  {}", describe_target(t)).ok();
    }

    writeln!(out, "Doors ({}):", doors.len()).ok();
    for d in doors {
        writeln!(
            out,
            "  at ({:.1}, {:.1}, {:.1}) opened={} near={}",
            d.center.x, d.center.y, d.center.z, d.opened, d.near
        )
        .ok();
    }
    out
}

#[derive(bevy::ecs::system::SystemParam)]
pub struct DumpCtx<'w, 's> {
    pub load: Res<'w, ModelLoad>,
    pub registry: Res<'w, TargetRegistry>,
    pub selected: Res<'w, SelectedDestination>,
    pub ground: Res<'w, GroundSet>,
    pub router: Res<'w, InputRouter>,
    pub player: Query<'w, 's, (&'static Transform, &'static Player)>,
    pub doors: Query<'w, 's, &'static Door>,
    pub entities: Query<'w, 's, Entity>,
    pub meshes: Res<'w, Assets<Mesh>>,
    pub materials: Res<'w, Assets<StandardMaterial>>,
}

/// Write a dump when the dump key is pressed.
#[allow(clippy::needless_pass_by_value)]
fn debug_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    settings: Res<Settings>,
    diagnostics: Res<DiagnosticsStore>,
    ctx: DumpCtx,
) {
    if !keys.just_pressed(settings.key_for("dump_debug", KeyCode::F3)) {
        return;
    }

    let now: DateTime<Utc> = Utc::now();
    let ts_secs = now.timestamp();
    let fname = format!("{DUMP_DIR}/debug-{ts_secs}.txt");

    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(Diagnostic::smoothed)
        .unwrap_or(0.0);
    let frame_time = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FRAME_TIME)
        .and_then(Diagnostic::smoothed)
        .unwrap_or(0.0);

    let mut out = String::new();
    writeln!(out, "Debug dump: {ts_secs}").ok();
    writeln!(out, "Timestamp: {}", now.format("%Y-%m-%d %H:%M:%S")).ok();
    writeln!(out, "FPS: {fps:.1}, frame_time: {frame_time:.2} ms").ok();
    writeln!(out, "Entities: {}", ctx.entities.iter().count()).ok();
    writeln!(out, "Assets: meshes={} materials={}", ctx.meshes.len(), ctx.materials.len()).ok();
    memory_lines(&mut out);
    writeln!(out).ok();

    let doors: Vec<Door> = ctx.doors.iter().copied().collect();
    out.push_str(&session_report(
        &ctx.load,
        ctx.player.get_single().ok(),
        &ctx.registry,
        ctx.selected.0.as_deref(),
        &doors,
        &ctx.ground,
        &ctx.router,
    ));

    if cfg!(target_arch = "wasm32") {
        info!("debug dump\n{out}");
        return;
    }
    if let Err(e) = std::fs::create_dir_all(DUMP_DIR) {
        error!("debug dump: failed to create dir '{DUMP_DIR}': {e}");
        return;
    }
    match std::fs::write(&fname, out) {
        Ok(()) => info!("wrote debug dump: {fname}"),
        Err(e) => error!("debug dump: failed to write {fname}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputMode;
    use crate::navigation::FixedDestination;
    use crate::player::PlayerPhase;
    use crate::settings::MobileSettings;

    #[test]
    fn report_lists_session_state() {
        let mut load = ModelLoad::default();
        load.path = "models/building.glb".into();
        let registry = TargetRegistry::build(
            vec![("Lab".to_string(), Entity::from_raw(3))],
            &[FixedDestination { label: "Exit".into(), position: Vec3::new(1.0, 0.0, 2.0) }],
        );
        let router = InputRouter::new(InputMode::Mobile, Vec2::new(800.0, 600.0), &MobileSettings::default());
        let tf = Transform::from_xyz(1.0, 1.6, -2.0);
        let player = Player { phase: PlayerPhase::Grounded, ..Default::default() };
        let doors = [Door::new(Vec3::ZERO)];

        let text = session_report(&load, Some((&tf, &player)), &registry, Some("Exit"), &doors, &GroundSet::default(), &router);
        assert!(text.contains("phase=NotLoaded"));
        assert!(text.contains("Grounded"));
        assert!(text.contains("Input mode: Mobile"));
        assert!(text.contains("Lab (mesh"));
        assert!(text.contains("Exit (fixed 1.0, 0.0, 2.0)"));
        assert!(text.contains("Doors (1)"));
    }

    #[test]
    fn report_without_player() {
        let text = session_report(
            &ModelLoad::default(),
            None,
            &TargetRegistry::default(),
            None,
            &[],
            &GroundSet::default(),
            &InputRouter::new(InputMode::Desktop, Vec2::ONE, &MobileSettings::default()),
        );
        assert!(text.contains("Player: not spawned"));
    }
}
