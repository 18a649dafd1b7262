//! Destinations and the guidance arrow that points at them.
pub mod destinations;
pub mod hud;
pub mod targets;

use bevy::prelude::*;

pub use destinations::{DestinationTable, FixedDestination, load_destinations};
pub use hud::{Guidance, NavigatorArrow, ProximityBand, update_navigator_hud};
pub use targets::{NavigationTarget, TargetKind, TargetLocator, TargetRegistry};

/// Label picked in the destination selector. Owned by the UI layer.
#[derive(Resource, Default, Debug, Clone, PartialEq, Eq)]
pub struct SelectedDestination(pub Option<String>);

/// Guidance computed this tick, `None` while the arrow is hidden.
#[derive(Resource, Default, Debug)]
pub struct ActiveGuidance(pub Option<Guidance>);
