//! Player domain - spawn игрока со всем, что нужно ядру
//!
//! Ввод, камеру и физику игрока ведёт host. Ядро читает Transform,
//! пишет `PlayerLocomotion::locked` (aim mode) и шлёт `PlayerDamaged`.

use bevy::prelude::*;

use crate::components::{CollisionVolume, Player, PlayerLocomotion};
use crate::grab_skill::{GrabSkill, GrabSkillConfig};

pub fn spawn_player(commands: &mut Commands, transform: Transform, skill: GrabSkillConfig) -> Entity {
    let id = commands
        .spawn((
            Player,
            transform,
            PlayerLocomotion::default(),
            CollisionVolume { radius: 0.4 },
            GrabSkill::default(),
            skill,
        ))
        .id();
    crate::log_info(&format!("🧍 player {:?} at {:?}", id, transform.translation));
    id
}
