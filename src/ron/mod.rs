//! Utilities for loading RON files and watching directories for changes.
//!
//! Settings and the fixed destination table are both authored as RON files.
//! On native targets a `notify` watcher flags edits so they can be
//! hot-reloaded; in the browser there is no filesystem and the watcher is
//! always a stub.

use bevy::log::warn;
use bevy::prelude::Resource;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};

use crate::error::{NavError, NavResult};

#[derive(Resource)]
/// File-watcher resource for RON hot-reload.
pub struct RonWatcher {
    pub changed: Arc<Mutex<bool>>, // Set to `true` by the watcher thread when a watched file changes.
    #[cfg(not(target_arch = "wasm32"))]
    _watcher: Option<notify::RecommendedWatcher>, // Keeps the OS watcher alive.
}

impl RonWatcher {
    /// Create a `RonWatcher` with no OS watcher behind it.
    ///
    /// Used when watcher creation fails and on wasm, where there is nothing
    /// to watch.
    #[must_use]
    pub fn stub() -> Self {
        RonWatcher {
            changed: Arc::new(Mutex::new(false)),
            #[cfg(not(target_arch = "wasm32"))]
            _watcher: None,
        }
    }

    /// Read and clear the changed flag.
    ///
    /// A poisoned mutex is recovered rather than propagated; the flag is a
    /// plain bool so the inner value is always usable.
    pub fn take_changed(&self) -> bool {
        let mut flag = match self.changed.lock() {
            Ok(flag) => flag,
            Err(poisoned) => {
                warn!("ron watcher mutex poisoned, recovering");
                poisoned.into_inner()
            }
        };
        std::mem::replace(&mut *flag, false)
    }
}

/// Parse one RON document, tagging failures with the file they came from.
///
/// # Errors
/// Returns `NavError::Config` if `content` is not a valid `T`.
pub fn parse_ron_str<T: DeserializeOwned>(file: &str, content: &str) -> NavResult<T> {
    ron::from_str::<T>(content).map_err(|e| NavError::Config {
        file: file.to_string(),
        reason: e.to_string(),
    })
}

/// Load all `.ron` files from a directory and deserialize them into `T`.
///
/// Files are visited in file-name order so that merged tables keep a stable
/// declaration order. Files that fail to parse are skipped with a warning.
#[must_use]
pub fn load_ron_files<T: DeserializeOwned>(path: &str) -> Vec<T> {
    let Ok(entries) = std::fs::read_dir(path) else {
        return Vec::new();
    };

    let mut files: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    files.sort();

    let mut items = Vec::new();
    for file in files {
        let name = file.display().to_string();
        let content = match std::fs::read_to_string(&file) {
            Ok(c) => c,
            Err(e) => {
                warn!("failed to read {name}: {e}");
                continue;
            }
        };
        match parse_ron_str::<T>(&name, &content) {
            Ok(item) => items.push(item),
            Err(e) => warn!("{e}"),
        }
    }
    items
}

/// Create a `RonWatcher` that flags modifications under `path`.
///
/// # Errors
/// Returns `NavError::Io` if the OS watcher cannot be created or registered.
#[cfg(not(target_arch = "wasm32"))]
pub fn setup_ron_watcher(path: &str) -> NavResult<RonWatcher> {
    use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
    use std::path::{Path, PathBuf};

    let changed = Arc::new(Mutex::new(false));
    let changed_clone = changed.clone();
    let watched_path: PathBuf = std::fs::canonicalize(path).unwrap_or_else(|_| PathBuf::from(path));

    let mut watcher: RecommendedWatcher = Watcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(event.kind, notify::EventKind::Modify(_) | notify::EventKind::Create(_)) {
                    return;
                }
                let relevant = event.paths.iter().any(|p| {
                    std::fs::canonicalize(p)
                        .unwrap_or_else(|_| p.clone())
                        .starts_with(&watched_path)
                });
                if relevant && let Ok(mut flag) = changed_clone.lock() {
                    *flag = true;
                }
            }
            Err(e) => warn!("watch error: {e:?}"),
        },
        Config::default(),
    )
    .map_err(|e| NavError::Io(std::io::Error::other(e)))?;

    watcher
        .watch(Path::new(path), RecursiveMode::NonRecursive)
        .map_err(|e| NavError::Io(std::io::Error::other(e)))?;
    Ok(RonWatcher { changed, _watcher: Some(watcher) })
}

/// There is no filesystem to watch in the browser.
///
/// # Errors
/// Always returns `NavError::Io` with `Unsupported`.
#[cfg(target_arch = "wasm32")]
pub fn setup_ron_watcher(_path: &str) -> NavResult<RonWatcher> {
    Err(NavError::Io(std::io::Error::from(std::io::ErrorKind::Unsupported)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Sample {
        name: String,
        #[serde(default)]
        count: u32,
    }

    #[test]
    fn parses_valid_document() {
        let s: Sample = parse_ron_str("inline", "(name: \"lobby\", count: 3)").unwrap();
        assert_eq!(s, Sample { name: "lobby".into(), count: 3 });
    }

    #[test]
    fn bad_document_reports_file() {
        let err = parse_ron_str::<Sample>("broken.ron", "(name: )").unwrap_err();
        assert!(err.to_string().contains("broken.ron"));
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let items: Vec<Sample> = load_ron_files("definitely/not/a/dir");
        assert!(items.is_empty());
    }

    #[test]
    fn stub_watcher_flag_round_trip() {
        let w = RonWatcher::stub();
        assert!(!w.take_changed());
        *w.changed.lock().unwrap() = true;
        assert!(w.take_changed());
        assert!(!w.take_changed());
    }
}
