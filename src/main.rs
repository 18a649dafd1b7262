use bevy::diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin};
use bevy::prelude::*;
use bevy::window::{Window, WindowPlugin};
use waypoint::debug::DebugDumpPlugin;
use waypoint::session::NavigatorPlugin;
use waypoint::settings::loader as settings_loader;
use waypoint::ui::OverlayPlugin;

mod app;
use app::{setup, sync_vsync_settings};

fn main() {
    let settings = settings_loader::load_settings_from_dir(settings_loader::SETTINGS_DIR);
    let settings_watcher = settings_loader::setup_settings_watcher(settings_loader::SETTINGS_DIR)
        .unwrap_or_else(|_| settings_loader::SettingsWatcher::stub());

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Waypoint".to_string(),
                position: WindowPosition::Centered(MonitorSelection::Primary),
                present_mode: app::display::present_mode(settings.graphics.vsync),
                fit_canvas_to_parent: true,
                ..default()
            }),
            ..default()
        }))
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(LogDiagnosticsPlugin::default());

    app.insert_resource(settings);
    app.insert_resource(settings_watcher);

    app.add_plugins(NavigatorPlugin)
        .add_plugins(OverlayPlugin)
        .add_plugins(DebugDumpPlugin);

    app.add_systems(Startup, setup);
    app.add_systems(Update, settings_loader::check_settings_changes);
    app.add_systems(Update, sync_vsync_settings);

    app.run();
}
