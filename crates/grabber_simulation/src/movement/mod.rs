//! Movement domain - travel routines и navigation agent
//!
//! Содержит:
//! - drive_travel (steering шаг / запись destination агенту)
//! - advance_navigation_agents (headless замена navmesh)
//! - DoubleJumped (event от host input)

use bevy::prelude::*;

pub mod events;
pub mod systems;

// Re-export all systems and events
pub use events::*;
pub use systems::*;

use crate::SimulationSet;

pub struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DoubleJumped>()
            .add_systems(FixedUpdate, drive_travel.in_set(SimulationSet::Locomotion));
    }
}

/// Движение агентов по прямой вместо navmesh (demo, тесты)
pub struct HeadlessNavigationPlugin;

impl Plugin for HeadlessNavigationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            advance_navigation_agents
                .after(drive_travel)
                .in_set(SimulationSet::Locomotion),
        );
    }
}
