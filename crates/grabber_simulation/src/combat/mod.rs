//! Combat state machine (layered над behavior машиной)
//!
//! Unaware → Pursuing → Telegraphing → Attacking → Cooldown → (Pursuing | Unaware)
//!
//! ECS ответственность:
//! - Phase machine, disengagement policy (time since last seen + радиус)
//! - Melee overlap check, homing projectile
//! - Events: PlayerDamaged (damage sink игрока)
//!
//! Движок ответственность:
//! - Анимации замаха/удара (по MotionStateRequested)
//! - Физика снаряда не нужна: полёт считает ядро через SpatialQueries

use bevy::prelude::*;

pub mod components;
pub mod projectile;
pub mod systems;

// Re-export основных типов
pub use components::{evaluate_engagement, AttackStyle, CombatConfig, CombatMachine, CombatPhase, Engagement};
pub use projectile::{projectile_for, HomingProjectile};

use crate::SimulationSet;

/// Damage sink игрока (fire-and-forget, ядро не ждёт подтверждения)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDamaged {
    pub amount: i32,
    pub source: Entity,
}

/// Combat Plugin
///
/// Порядок выполнения (SimulationSet::Combat):
/// 1. react_to_interruptions - сорванные замахи, выход из боя после броска
/// 2. engage_on_detection - TargetDetected → Pursuing
/// 3. update_combat - основной тик фаз
///
/// Снаряды двигаются в SimulationSet::Projectiles.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<PlayerDamaged>();

        // Регистрация систем в FixedUpdate
        app.add_systems(
            FixedUpdate,
            (
                systems::react_to_interruptions,
                systems::engage_on_detection,
                systems::update_combat,
            )
                .chain() // Последовательное выполнение
                .in_set(SimulationSet::Combat),
        )
        .add_systems(
            FixedUpdate,
            projectile::advance_projectiles.in_set(SimulationSet::Projectiles),
        );
    }
}
