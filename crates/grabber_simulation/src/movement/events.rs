//! Movement events

use bevy::prelude::*;

/// Event: игрок сделал двойной прыжок
///
/// Генерируется:
/// - Host input system (движок)
///
/// Обрабатывается:
/// - companion::react_to_player_skill (чисто косметический эффект)
#[derive(Event, Debug, Clone, Copy)]
pub struct DoubleJumped {
    pub entity: Entity,
}
