//! Spatial services - физические запросы как внешний collaborator
//!
//! Ядро НЕ владеет физикой. Движок (tactical layer) реализует `SpatialQueries`
//! и кладёт реализацию в `SpatialQueryService` resource. Все запросы синхронные,
//! single-shot, без retry: "ничего не нашли" - валидный результат, не ошибка.
//!
//! Headless реализация для demo/тестов: [`OpenField`].

use bevy::prelude::*;
use std::ops::Deref;

pub mod open_field;

pub use open_field::{GroundPatch, Obstacle, OpenField};

// ============================================================================
// Collision layers (битовые маски)
// ============================================================================

/// Layer: Actors (player, enemies, companion)
pub const LAYER_ACTORS: u32 = 0b10;

/// Layer: Environment (стены, препятствия)
pub const LAYER_ENVIRONMENT: u32 = 0b100;

/// Layer: Projectiles
pub const LAYER_PROJECTILES: u32 = 0b1000;

/// Layer: Ground (поверхности на которые можно приземлиться)
pub const LAYER_GROUND: u32 = 0b1_0000;

/// Mask: forward probe при движении (стены + пол под углом)
pub const MASK_MOVEMENT_PROBE: u32 = LAYER_ENVIRONMENT;

/// Mask: line-of-sight (vision cone, camera occlusion)
pub const MASK_LINE_OF_SIGHT: u32 = LAYER_ENVIRONMENT;

/// Mask: throw/knockback flight probe
pub const MASK_FLIGHT_PROBE: u32 = LAYER_ENVIRONMENT | LAYER_GROUND;

/// Результат ray/sphere cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub distance: f32,
    pub normal: Vec3,
}

/// Примитивные физические запросы движка
///
/// `direction` не обязан быть нормализован; нулевое направление = нет попадания.
pub trait SpatialQueries: Send + Sync + 'static {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: u32) -> Option<RayHit>;

    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: u32,
    ) -> Option<RayHit>;

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: u32) -> bool;

    /// Опора под позицией (unsupported-below probe)
    fn ground_below(&self, position: Vec3, max_distance: f32) -> Option<RayHit> {
        self.raycast(position, Vec3::NEG_Y, max_distance, LAYER_GROUND)
    }

    /// Длина пути по navmesh. `None` = движок не умеет / пути нет
    fn path_distance(&self, _from: Vec3, _to: Vec3) -> Option<f32> {
        None
    }
}

/// Resource-обёртка над реализацией движка
#[derive(Resource)]
pub struct SpatialQueryService {
    queries: Box<dyn SpatialQueries>,
}

impl SpatialQueryService {
    pub fn new(queries: impl SpatialQueries) -> Self {
        Self {
            queries: Box::new(queries),
        }
    }
}

impl Default for SpatialQueryService {
    /// Пустой мир: бесконечный пол на y = 0, без препятствий
    fn default() -> Self {
        Self::new(OpenField::flat(0.0))
    }
}

impl Deref for SpatialQueryService {
    type Target = dyn SpatialQueries;

    fn deref(&self) -> &Self::Target {
        self.queries.as_ref()
    }
}

/// Отрезок from → to свободен от препятствий по маске
pub fn segment_clear(spatial: &dyn SpatialQueries, from: Vec3, to: Vec3, mask: u32) -> bool {
    let delta = to - from;
    let length = delta.length();
    if length <= f32::EPSILON {
        return true;
    }
    spatial.raycast(from, delta, length, mask).is_none()
}

/// Forward probe размером с коллайдер: можно ли сдвинуться на `step`
pub fn step_clear(spatial: &dyn SpatialQueries, position: Vec3, step: Vec3, radius: f32) -> bool {
    let length = step.length();
    if length <= f32::EPSILON {
        return true;
    }
    spatial
        .sphere_cast(position, radius, step, length, MASK_MOVEMENT_PROBE)
        .is_none()
}
