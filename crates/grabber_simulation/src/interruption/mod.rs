//! Physical interruption protocol (общий контракт всех врагов)
//!
//! Free → Grabbed → Thrown → Falling → Dazed → Free, плюс терминальный Dead.
//! Прыжок сверху (`Stomped`) = удар + bounce routine пока враг оглушён.
//!
//! Пока состояние не Free, perception/behavior/combat машины entity просто
//! не вызываются (guard clause в их системах), позицией владеет протокол
//! или holder (grab skill).

use bevy::prelude::*;

pub mod components;
pub mod protocol;
pub mod systems;

#[cfg(test)]
mod protocol_tests;

pub use components::{
    DazeSeverity, Dead, DespawnAfter, Interruption, InterruptionConfig, InterruptionState, ThrowAnchors, ThrowAxis,
};
pub use protocol::{DamageOutcome, DeathCause, InterruptionTransition, PhysicalBody, ThrowRejected};

use crate::SimulationSet;

/// Удар по врагу (атака игрока)
#[derive(Event, Debug, Clone, Copy)]
pub struct EnemyHit {
    pub target: Entity,
    pub point: Vec3,
}

/// Враг задет dash'ем игрока → knockback
#[derive(Event, Debug, Clone, Copy)]
pub struct DashHit {
    pub target: Entity,
    pub from: Vec3,
}

/// Игрок приземлился на врага сверху → урон + bounce
#[derive(Event, Debug, Clone, Copy)]
pub struct Stomped {
    pub target: Entity,
    pub point: Vec3,
}

/// Протокол сменил состояние (единая шина для combat, grab skill, visual cues)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct InterruptionChanged {
    pub entity: Entity,
    pub transition: InterruptionTransition,
}

pub struct InterruptionPlugin;

impl Plugin for InterruptionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<EnemyHit>()
            .add_event::<DashHit>()
            .add_event::<Stomped>()
            .add_event::<InterruptionChanged>()
            .add_systems(
                FixedUpdate,
                (
                    systems::apply_enemy_hits,
                    systems::apply_dash_hits,
                    systems::apply_stomps,
                    systems::advance_interruptions,
                    systems::relocate_after_daze,
                )
                    .chain()
                    .in_set(SimulationSet::Interruption),
            )
            .add_systems(
                FixedUpdate,
                (
                    systems::publish_interruption_cues,
                    systems::publish_hit_flash,
                    systems::mark_dead,
                    systems::despawn_dead,
                )
                    .chain()
                    .in_set(SimulationSet::Cleanup),
            );
    }
}
