//! Autonomous behavior: Idle / Wandering / Searching / ReturnToOrigin
//!
//! Weighted-random FSM поверх motion tasks. Работает только пока враг Free и
//! не в бою (combat машина держит aggression gate).

use bevy::prelude::*;

pub mod components;
pub mod systems;

// Re-export основных типов
pub use components::{
    annulus_point, draw_weighted_state, random_duration, BehaviorConfig, BehaviorMachine, BehaviorState, StateWeight,
};

use crate::SimulationSet;

/// AI Plugin
///
/// Регистрирует behavior системы в FixedUpdate для детерминизма.
/// Порядок выполнения:
/// 1. behavior_arrivals - реакция на прибытие (flag от locomotion прошлого тика)
/// 2. behavior_transitions - countdown + weighted draw
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (systems::behavior_arrivals, systems::behavior_transitions)
                .chain() // Последовательное выполнение для детерминизма
                .in_set(SimulationSet::Behavior),
        );
    }
}
