//! Базовые компоненты акторов: Life, CollisionVolume

use bevy::prelude::*;

/// Жизни врага (счётчик ударов, не HP)
///
/// Инвариант: current <= 0 ⇒ alive == false. Мёртвый Life больше не меняется.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Life {
    pub current: i32,
    pub max: i32,
    pub alive: bool,
}

impl Default for Life {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Life {
    pub fn new(max: i32) -> Self {
        Self {
            current: max,
            max,
            alive: max > 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Снять одну жизнь. Возвращает оставшиеся жизни.
    pub fn take_hit(&mut self) -> i32 {
        if !self.alive {
            return self.current;
        }
        self.current -= 1;
        if self.current <= 0 {
            self.alive = false;
        }
        self.current
    }

    /// Смерть независимо от остатка (fall timeout)
    pub fn kill(&mut self) {
        self.alive = false;
    }
}

/// Коллизионный объём актора (сфера)
///
/// Используется для forward probe при движении и для melee overlap против игрока.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct CollisionVolume {
    pub radius: f32,
}

impl Default for CollisionVolume {
    fn default() -> Self {
        Self { radius: 0.5 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_life_hits() {
        let mut life = Life::new(2);
        assert_eq!(life.take_hit(), 1);
        assert!(life.is_alive());

        assert_eq!(life.take_hit(), 0);
        assert!(!life.is_alive());

        // Мёртвый - больше не уменьшается
        assert_eq!(life.take_hit(), 0);
    }

    #[test]
    fn test_kill_keeps_counter() {
        let mut life = Life::new(3);
        life.kill();
        assert!(!life.is_alive());
        assert_eq!(life.current, 3);
    }
}
