//! Movement компоненты: navigation agent (black box path follower)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Как враг исполняет travel задачи
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum TravelMode {
    /// Прямое steering с forward probe (стоим на месте если упёрлись)
    #[default]
    Steering,
    /// Делегируем NavigationAgent (движок обходит препятствия сам)
    Navigation,
}

/// Navigation agent - контракт с navmesh движка
///
/// Ядро пишет `destination`, движок двигает Transform и пишет `remaining_distance`.
/// `suspended` - явная пауза (вместо выключения компонента движка).
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct NavigationAgent {
    pub destination: Option<Vec3>,
    pub remaining_distance: f32,
    pub speed: f32,
    pub suspended: bool,
}

impl Default for NavigationAgent {
    fn default() -> Self {
        Self {
            destination: None,
            remaining_distance: 0.0,
            speed: 3.0,
            suspended: true,
        }
    }
}

impl NavigationAgent {
    pub fn set_destination(&mut self, destination: Vec3) {
        self.destination = Some(destination);
        self.suspended = false;
    }

    pub fn suspend(&mut self) {
        self.destination = None;
        self.suspended = true;
        self.remaining_distance = 0.0;
    }
}
