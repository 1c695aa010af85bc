//! Companion follow controller
//!
//! Вне aim: следует за игроком по слотам (Ground → Elevated → Behind).
//! В aim: прибит к aim anchor, при выборе цели телепортируется на неё.
//! После броска короткий recoil, потом снова следование.

use bevy::prelude::*;

pub mod components;
pub mod systems;

pub use components::*;
pub use systems::*;

use crate::SimulationSet;

pub struct CompanionPlugin;

impl Plugin for CompanionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (react_to_player_skill, drive_companion)
                .chain()
                .in_set(SimulationSet::Companion),
        );
    }
}

/// Companion рядом с игроком (в его ground слоте)
pub fn spawn_companion(commands: &mut Commands, player: &Transform, config: CompanionConfig) -> Entity {
    let position = player.translation + player.rotation * config.ground_offset;
    commands
        .spawn((Transform::from_translation(position), Companion::new(&config), config))
        .id()
}
