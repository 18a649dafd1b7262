//! Settings, types and defaults.
//!
//! Settings are stored as a RON file under `data/settings/` and are
//! hot-reloadable on native targets (see `ron::setup_ron_watcher`). Every
//! field has a serde default so a partial file only overrides what it names.
use bevy::prelude::{KeyCode, Resource, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::input::InputMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsSettings {
    #[serde(default = "GraphicsSettings::default_vsync")]
    pub vsync: bool, // Cap FPS to the display refresh rate.
}

impl GraphicsSettings {
    fn default_vsync() -> bool { true }
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self { vsync: Self::default_vsync() }
    }
}

/// Controls / input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlsSettings {
    #[serde(default)]
    pub invert_y: bool,
    #[serde(default)]
    pub invert_x: bool,
    #[serde(default = "ControlsSettings::default_sensitivity")]
    pub mouse_sensitivity: f32, // Radians of look per pixel of mouse motion, times 0.002.
    #[serde(default = "ControlsSettings::default_touch_sensitivity")]
    pub touch_look_sensitivity: f32, // Radians of look per pixel of touch drag.
    #[serde(default = "ControlsSettings::default_keybinds")]
    pub keybinds: HashMap<String, String>, // Action name -> key identifier.
    #[serde(default)]
    pub input_mode: InputMode, // Mode at startup; the host or the toggle key switches it later.
}

impl ControlsSettings {
    fn default_sensitivity() -> f32 { 1.0 }
    fn default_touch_sensitivity() -> f32 { 0.005 }

    fn default_keybinds() -> HashMap<String, String> {
        [
            ("forward", "W"),
            ("back", "S"),
            ("left", "A"),
            ("right", "D"),
            ("jump", "Space"),
            ("sprint", "LShift"),
            ("interact", "E"),
            ("pause", "Escape"),
            ("next_destination", "RBracket"),
            ("prev_destination", "LBracket"),
            ("toggle_mode", "M"),
            ("toggle_debug", "F1"),
            ("toggle_gizmos", "F2"),
            ("dump_debug", "F3"),
        ]
        .into_iter()
        .map(|(a, k)| (a.to_string(), k.to_string()))
        .collect()
    }
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            invert_y: false,
            invert_x: false,
            mouse_sensitivity: Self::default_sensitivity(),
            touch_look_sensitivity: Self::default_touch_sensitivity(),
            keybinds: Self::default_keybinds(),
            input_mode: InputMode::default(),
        }
    }
}

/// Per-axis speed multipliers applied on top of `PlayerSettings::base_speed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedTable {
    #[serde(default = "SpeedTable::one")]
    pub forward: f32,
    #[serde(default = "SpeedTable::default_backward")]
    pub backward: f32,
    #[serde(default = "SpeedTable::default_strafe")]
    pub strafe: f32,
}

impl SpeedTable {
    fn one() -> f32 { 1.0 }
    fn default_backward() -> f32 { 0.6 }
    fn default_strafe() -> f32 { 0.85 }
}

impl Default for SpeedTable {
    fn default() -> Self {
        Self {
            forward: Self::one(),
            backward: Self::default_backward(),
            strafe: Self::default_strafe(),
        }
    }
}

/// Player body and movement tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSettings {
    #[serde(default = "PlayerSettings::default_eye_height")]
    pub eye_height: f32, // Camera height above the floor it stands on.
    #[serde(default = "PlayerSettings::default_gravity")]
    pub gravity: f32, // Vertical acceleration (negative is down).
    #[serde(default = "PlayerSettings::default_jump_impulse")]
    pub jump_impulse: f32, // Vertical velocity set on jump.
    #[serde(default = "PlayerSettings::default_ground_tolerance")]
    pub ground_tolerance: f32, // Extra ray length below the feet that still counts as standing.
    #[serde(default = "PlayerSettings::default_base_speed")]
    pub base_speed: f32,
    #[serde(default)]
    pub speed: SpeedTable,
    #[serde(default = "PlayerSettings::default_sprint_multiplier")]
    pub sprint_multiplier: f32,
    #[serde(default = "PlayerSettings::default_recover_fall_distance")]
    pub recover_fall_distance: f32, // Fall this far below the last floor and the player is put back on it.
}

impl PlayerSettings {
    fn default_eye_height() -> f32 { 1.6 }
    fn default_gravity() -> f32 { -9.81 }
    fn default_jump_impulse() -> f32 { 4.5 }
    fn default_ground_tolerance() -> f32 { 0.25 }
    fn default_base_speed() -> f32 { 4.0 }
    fn default_sprint_multiplier() -> f32 { 1.8 }
    fn default_recover_fall_distance() -> f32 { 50.0 }
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            eye_height: Self::default_eye_height(),
            gravity: Self::default_gravity(),
            jump_impulse: Self::default_jump_impulse(),
            ground_tolerance: Self::default_ground_tolerance(),
            base_speed: Self::default_base_speed(),
            speed: SpeedTable::default(),
            sprint_multiplier: Self::default_sprint_multiplier(),
            recover_fall_distance: Self::default_recover_fall_distance(),
        }
    }
}

/// Touch joystick layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobileSettings {
    #[serde(default = "MobileSettings::default_joystick_radius")]
    pub joystick_radius: f32, // Max stick travel in logical pixels.
    #[serde(default = "MobileSettings::default_zone_radius")]
    pub zone_radius: f32, // Touches starting inside this circle drive the stick.
    #[serde(default = "MobileSettings::default_zone_margin")]
    pub zone_margin: f32, // Distance of the zone centre from the bottom-left corner.
}

impl MobileSettings {
    fn default_joystick_radius() -> f32 { 60.0 }
    fn default_zone_radius() -> f32 { 110.0 }
    fn default_zone_margin() -> f32 { 120.0 }
}

impl Default for MobileSettings {
    fn default() -> Self {
        Self {
            joystick_radius: Self::default_joystick_radius(),
            zone_radius: Self::default_zone_radius(),
            zone_margin: Self::default_zone_margin(),
        }
    }
}

/// Navigator arrow behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigatorSettings {
    #[serde(default = "NavigatorSettings::default_hud_offset")]
    pub hud_offset: Vec3, // Arrow position in camera space.
    #[serde(default = "NavigatorSettings::default_smoothing")]
    pub smoothing: f32, // Fraction of the remaining angle closed each tick.
    #[serde(default = "NavigatorSettings::default_near_distance")]
    pub near_distance: f32,
    #[serde(default = "NavigatorSettings::default_mid_distance")]
    pub mid_distance: f32,
    #[serde(default = "NavigatorSettings::default_pulse_amplitude")]
    pub pulse_amplitude: f32,
}

impl NavigatorSettings {
    fn default_hud_offset() -> Vec3 { Vec3::new(0.0, -0.35, -1.2) }
    fn default_smoothing() -> f32 { 0.15 }
    fn default_near_distance() -> f32 { 3.0 }
    fn default_mid_distance() -> f32 { 10.0 }
    fn default_pulse_amplitude() -> f32 { 0.12 }
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        Self {
            hud_offset: Self::default_hud_offset(),
            smoothing: Self::default_smoothing(),
            near_distance: Self::default_near_distance(),
            mid_distance: Self::default_mid_distance(),
            pulse_amplitude: Self::default_pulse_amplitude(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorSettings {
    #[serde(default = "DoorSettings::default_radius")]
    pub interaction_radius: f32,
    #[serde(default = "DoorSettings::default_interval")]
    pub check_interval: f32, // Seconds between proximity refreshes.
}

impl DoorSettings {
    fn default_radius() -> f32 { 2.0 }
    fn default_interval() -> f32 { 0.1 }
}

impl Default for DoorSettings {
    fn default() -> Self {
        Self {
            interaction_radius: Self::default_radius(),
            check_interval: Self::default_interval(),
        }
    }
}

/// Which model to walk through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "ModelSettings::default_path")]
    pub path: String, // Relative to the asset base path.
    #[serde(default = "ModelSettings::default_destinations_dir")]
    pub destinations_dir: String,
}

impl ModelSettings {
    fn default_path() -> String { "models/building.glb".to_string() }
    fn default_destinations_dir() -> String { "data/destinations".to_string() }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            destinations_dir: Self::default_destinations_dir(),
        }
    }
}

/// Top-level Settings
#[derive(Resource, Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub graphics: GraphicsSettings,
    #[serde(default)]
    pub controls: ControlsSettings,
    #[serde(default)]
    pub player: PlayerSettings,
    #[serde(default)]
    pub mobile: MobileSettings,
    #[serde(default)]
    pub navigator: NavigatorSettings,
    #[serde(default)]
    pub doors: DoorSettings,
    #[serde(default)]
    pub model: ModelSettings,
}

impl Settings {
    #[must_use]
    pub fn defaults() -> Self { Settings::default() }

    /// Resolve the key bound to `action`, falling back to `default` when the
    /// binding is missing or unparseable.
    #[must_use]
    pub fn key_for(&self, action: &str, default: KeyCode) -> KeyCode {
        self.controls
            .keybinds
            .get(action)
            .and_then(|s| Self::keycode_from_str(s))
            .unwrap_or(default)
    }

    /// Convert a key identifier from `controls.keybinds` (e.g. "W", "Space",
    /// "F1", "LShift") into a Bevy `KeyCode`. Case-insensitive.
    #[must_use]
    pub fn keycode_from_str(name: &str) -> Option<KeyCode> {
        const LETTERS: [KeyCode; 26] = [
            KeyCode::KeyA, KeyCode::KeyB, KeyCode::KeyC, KeyCode::KeyD, KeyCode::KeyE,
            KeyCode::KeyF, KeyCode::KeyG, KeyCode::KeyH, KeyCode::KeyI, KeyCode::KeyJ,
            KeyCode::KeyK, KeyCode::KeyL, KeyCode::KeyM, KeyCode::KeyN, KeyCode::KeyO,
            KeyCode::KeyP, KeyCode::KeyQ, KeyCode::KeyR, KeyCode::KeyS, KeyCode::KeyT,
            KeyCode::KeyU, KeyCode::KeyV, KeyCode::KeyW, KeyCode::KeyX, KeyCode::KeyY,
            KeyCode::KeyZ,
        ];
        const DIGITS: [KeyCode; 10] = [
            KeyCode::Digit0, KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4,
            KeyCode::Digit5, KeyCode::Digit6, KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9,
        ];
        const FUNCTION: [KeyCode; 12] = [
            KeyCode::F1, KeyCode::F2, KeyCode::F3, KeyCode::F4, KeyCode::F5, KeyCode::F6,
            KeyCode::F7, KeyCode::F8, KeyCode::F9, KeyCode::F10, KeyCode::F11, KeyCode::F12,
        ];

        let s = name.trim().to_ascii_uppercase();
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_uppercase() {
                return Some(LETTERS[(c as u8 - b'A') as usize]);
            }
            if c.is_ascii_digit() {
                return Some(DIGITS[(c as u8 - b'0') as usize]);
            }
        }

        if let Some(n) = s.strip_prefix('F').and_then(|n| n.parse::<usize>().ok())
            && (1..=FUNCTION.len()).contains(&n)
        {
            return Some(FUNCTION[n - 1]);
        }

        Some(match s.as_str() {
            "LEFT" | "ARROWLEFT" => KeyCode::ArrowLeft,
            "RIGHT" | "ARROWRIGHT" => KeyCode::ArrowRight,
            "UP" | "ARROWUP" => KeyCode::ArrowUp,
            "DOWN" | "ARROWDOWN" => KeyCode::ArrowDown,
            "ESC" | "ESCAPE" => KeyCode::Escape,
            "SPACE" => KeyCode::Space,
            "TAB" => KeyCode::Tab,
            "ENTER" | "RETURN" => KeyCode::Enter,
            "BACKSPACE" => KeyCode::Backspace,
            "LSHIFT" | "SHIFT" => KeyCode::ShiftLeft,
            "RSHIFT" => KeyCode::ShiftRight,
            "LCTRL" | "CTRL" => KeyCode::ControlLeft,
            "RCTRL" => KeyCode::ControlRight,
            "LALT" | "ALT" => KeyCode::AltLeft,
            "RALT" => KeyCode::AltRight,
            "[" | "LBRACKET" => KeyCode::BracketLeft,
            "]" | "RBRACKET" => KeyCode::BracketRight,
            "," | "COMMA" => KeyCode::Comma,
            "." | "PERIOD" => KeyCode::Period,
            "-" | "MINUS" => KeyCode::Minus,
            "=" | "EQUALS" => KeyCode::Equal,
            _ => return None,
        })
    }
}

pub mod loader;
