//! Display-related systems, such as syncing vsync settings from the main
//! `Settings` resource to the primary window's present mode.
use bevy::prelude::*;
use bevy::window::{PresentMode, PrimaryWindow};
use waypoint::settings::Settings;

/// Present mode for a vsync preference.
#[must_use]
pub fn present_mode(vsync: bool) -> PresentMode {
    if vsync { PresentMode::AutoVsync } else { PresentMode::AutoNoVsync }
}

/// Sync `Settings.graphics.vsync` into the present mode of the primary window,
/// so a hot-reloaded settings file can toggle vsync without a restart.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_vsync_settings(
    settings: Res<Settings>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut last: Local<Option<bool>>,
) {
    let desired = settings.graphics.vsync;
    if *last == Some(desired) {
        return;
    }

    for mut w in &mut windows {
        w.present_mode = present_mode(desired);
    }
    *last = Some(desired);
}
