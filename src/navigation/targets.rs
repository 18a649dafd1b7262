//! Target registry: every destination the player can pick.
//!
//! Built once after the model loads. Mesh anchors come first in scene order,
//! then fixed points in declaration order. Labels are unique
//! (case-insensitive); later duplicates are dropped.
use bevy::log::debug;
use bevy::prelude::*;

use super::destinations::FixedDestination;
use crate::error::{NavError, NavResult};
use crate::loader::naming::label_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    MeshAnchor,
    FixedPoint,
}

/// Where a target is.
///
/// Mesh anchors hold the entity, not a position: the entity may have been
/// despawned since, so resolving can fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetLocator {
    MeshAnchor(Entity),
    FixedPoint(Vec3),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationTarget {
    pub label: String,
    pub locator: TargetLocator,
}

impl NavigationTarget {
    #[must_use]
    pub fn kind(&self) -> TargetKind {
        match self.locator {
            TargetLocator::MeshAnchor(_) => TargetKind::MeshAnchor,
            TargetLocator::FixedPoint(_) => TargetKind::FixedPoint,
        }
    }

    /// World position right now. `anchor_position` looks up a live entity.
    ///
    /// # Errors
    /// `NavError::MissingTarget` when the anchor entity no longer resolves.
    pub fn resolve(&self, anchor_position: impl Fn(Entity) -> Option<Vec3>) -> NavResult<Vec3> {
        match self.locator {
            TargetLocator::FixedPoint(p) => Ok(p),
            TargetLocator::MeshAnchor(e) => {
                anchor_position(e).ok_or_else(|| NavError::MissingTarget(self.label.clone()))
            }
        }
    }
}

#[derive(Resource, Default, Debug)]
pub struct TargetRegistry {
    targets: Vec<NavigationTarget>,
}

impl TargetRegistry {
    /// Merge discovered anchors with the fixed table.
    #[must_use]
    pub fn build(anchors: impl IntoIterator<Item = (String, Entity)>, fixed: &[FixedDestination]) -> Self {
        let mut registry = Self::default();
        for (label, entity) in anchors {
            registry.push(NavigationTarget { label, locator: TargetLocator::MeshAnchor(entity) });
        }
        for point in fixed {
            registry.push(NavigationTarget {
                label: point.label.clone(),
                locator: TargetLocator::FixedPoint(point.position),
            });
        }
        registry
    }

    /// Append unless the label is already taken. Returns whether it was added.
    pub fn push(&mut self, target: NavigationTarget) -> bool {
        if target.label.trim().is_empty() || self.get(&target.label).is_some() {
            debug!("skipping duplicate destination '{}'", target.label);
            return false;
        }
        self.targets.push(target);
        true
    }

    /// Linear scan; registries hold tens of entries.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&NavigationTarget> {
        let key = label_key(label);
        self.targets.iter().find(|t| label_key(&t.label) == key)
    }

    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.label.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NavigationTarget> {
        self.targets.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn clear(&mut self) {
        self.targets.clear();
    }

    /// Label `step` places after `current`, wrapping. With no current
    /// selection, forward steps start at the first entry and backward steps
    /// at the last.
    #[must_use]
    pub fn cycle(&self, current: Option<&str>, step: isize) -> Option<String> {
        let n = self.targets.len();
        if n == 0 {
            return None;
        }
        let start = current.and_then(|label| {
            let key = label_key(label);
            self.targets.iter().position(|t| label_key(&t.label) == key)
        });
        let idx = match start {
            Some(i) => (i as isize + step).rem_euclid(n as isize) as usize,
            None if step >= 0 => 0,
            None => n - 1,
        };
        Some(self.targets[idx].label.clone())
    }
}
