//! World positioning компоненты: Origin, PatrolRoute

use bevy::prelude::*;

/// Spawn позиция (дом) врага - центр wander-кольца и цель ReturnToOrigin
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Origin {
    pub position: Vec3,
}

impl Origin {
    pub fn new(position: Vec3) -> Self {
        Self { position }
    }
}

/// Патрульные точки (расставлены level designer'ом, read-only для врага)
///
/// Обходятся циклически; текущий индекс живёт в BehaviorMachine.
#[derive(Component, Debug, Clone, Default)]
pub struct PatrolRoute {
    pub points: Vec<Vec3>,
}

impl PatrolRoute {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Точка по running index (с wraparound)
    pub fn point(&self, index: usize) -> Option<Vec3> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points[index % self.points.len()])
    }

    pub fn next_index(&self, index: usize) -> usize {
        if self.points.is_empty() {
            0
        } else {
            (index + 1) % self.points.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_wraps() {
        let route = PatrolRoute::new(vec![Vec3::X, Vec3::Y, Vec3::Z]);
        assert_eq!(route.next_index(2), 0);
        assert_eq!(route.point(4), Some(Vec3::Y));
    }

    #[test]
    fn test_empty_route() {
        let route = PatrolRoute::default();
        assert!(route.point(0).is_none());
        assert_eq!(route.next_index(5), 0);
    }
}
