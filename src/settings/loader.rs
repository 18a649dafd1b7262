//! Settings loading and hot-reloading.
//!
//! Settings are loaded from RON files in `data/settings`. If several files are
//! present the first one (by file name) that parses wins; with none, defaults
//! are used. On native builds a watcher reloads the resource when a file
//! changes.
use crate::ron::{load_ron_files, setup_ron_watcher, RonWatcher};
use crate::settings::Settings;
use bevy::log::info;
use bevy::prelude::{Res, ResMut, Resource};

pub const SETTINGS_DIR: &str = "data/settings";

#[derive(Resource)]
pub struct SettingsWatcher {
    pub watcher: RonWatcher,
    pub dir: String,
}

impl SettingsWatcher {
    #[must_use]
    pub fn stub() -> Self {
        SettingsWatcher { watcher: RonWatcher::stub(), dir: SETTINGS_DIR.to_string() }
    }
}

/// Load settings from the RON files in `path`, or defaults when none parse.
#[must_use]
pub fn load_settings_from_dir(path: &str) -> Settings {
    let items: Vec<Settings> = load_ron_files(path);
    items.into_iter().next().unwrap_or_else(Settings::defaults)
}

/// Create a watcher for the settings directory.
///
/// # Errors
/// Propagates the watcher setup error; callers fall back to
/// `SettingsWatcher::stub()`.
pub fn setup_settings_watcher(path: &str) -> crate::error::NavResult<SettingsWatcher> {
    setup_ron_watcher(path).map(|watcher| SettingsWatcher { watcher, dir: path.to_string() })
}

/// Reload the `Settings` resource when the watcher saw a change.
#[allow(clippy::needless_pass_by_value)]
pub fn check_settings_changes(watcher: Res<SettingsWatcher>, mut settings: ResMut<Settings>) {
    if watcher.watcher.take_changed() {
        info!("settings changed, reloading from {}", watcher.dir);
        *settings = load_settings_from_dir(&watcher.dir);
    }
}
