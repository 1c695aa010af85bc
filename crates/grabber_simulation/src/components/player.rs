//! Player компоненты: marker + locomotion gate

use bevy::prelude::*;

/// Marker component для player-controlled entity
///
/// Враги находят игрока через `With<Player>` query (lookup only, не владеют им).
/// В single-player только один entity имеет этот компонент.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// Locomotion состояние игрока (пишется host input системой, читается grab skill)
///
/// `locked` = locomotion подавлена (aim mode). Grab skill обязан вернуть её при выходе.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct PlayerLocomotion {
    pub locked: bool,
    pub dashing: bool,
    pub grounded: bool,
}

impl Default for PlayerLocomotion {
    fn default() -> Self {
        Self {
            locked: false,
            dashing: false,
            grounded: true,
        }
    }
}

impl PlayerLocomotion {
    /// Можно ли войти в aim mode
    pub fn allows_aim(&self) -> bool {
        !self.locked && !self.dashing && self.grounded
    }
}
