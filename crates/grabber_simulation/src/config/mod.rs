//! Enemy profiles - вся настройка врага одного типа в одном месте
//!
//! Дефолтные профили на каждый `EnemyKind`; host может подсунуть свои
//! (serde, любой формат). Невалидный профиль не роняет spawn: ошибки
//! логируются, поведение деградирует (см. `ConfigError`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{BehaviorConfig, BehaviorState, StateWeight};
use crate::combat::{AttackStyle, CombatConfig};
use crate::components::TravelMode;
use crate::enemy::EnemyKind;
use crate::interruption::{InterruptionConfig, ThrowAnchors};
use crate::perception::PerceptionConfig;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("behavior weights are empty")]
    EmptyWeights,
    #[error("behavior weights sum to {total}, expected 100 (last state absorbs the rest)")]
    WeightsDontSum { total: u32 },
    #[error("{field}: min {min} is greater than max {max}")]
    InvertedRange { field: &'static str, min: f32, max: f32 },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("lives must be at least 1, got {0}")]
    NoLives(i32),
    #[error("no throw anchors: the enemy can never be thrown")]
    NoThrowAnchors,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyProfile {
    pub kind: EnemyKind,
    pub lives: i32,
    pub radius: f32,
    pub behavior: BehaviorConfig,
    pub combat: CombatConfig,
    pub perception: PerceptionConfig,
    pub interruption: InterruptionConfig,
    pub anchors: ThrowAnchors,
}

impl EnemyProfile {
    /// Дефолтный профиль для типа врага
    pub fn for_kind(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Wanderer => Self::wanderer(),
            EnemyKind::Seeker => Self::seeker(),
            EnemyKind::Slimoeil => Self::slimoeil(),
        }
    }

    /// Летающий, контактная атака, не падает
    fn wanderer() -> Self {
        Self {
            kind: EnemyKind::Wanderer,
            lives: 2,
            radius: 0.5,
            behavior: BehaviorConfig {
                weights: vec![
                    StateWeight::new(BehaviorState::Idle, 20),
                    StateWeight::new(BehaviorState::Wandering, 60),
                    StateWeight::new(BehaviorState::Searching, 10),
                    StateWeight::new(BehaviorState::ReturnToOrigin, 10),
                ],
                move_speed: 2.0,
                ..default()
            },
            combat: CombatConfig {
                style: AttackStyle::Melee {
                    reach: 0.5,
                    radius: 0.75,
                    damage: 1,
                },
                attack_range: 1.5,
                chase_speed: 3.5,
                ..default()
            },
            perception: PerceptionConfig::default(),
            interruption: InterruptionConfig {
                gravity_bound: false,
                ..default()
            },
            // Сверху вниз летуна не прибить
            anchors: ThrowAnchors {
                bottom: None,
                ..ThrowAnchors::all()
            },
        }
    }

    /// Стреляет самонаводящимися снарядами с места
    fn seeker() -> Self {
        Self {
            kind: EnemyKind::Seeker,
            lives: 3,
            radius: 0.6,
            behavior: BehaviorConfig {
                move_speed: 2.0,
                ..default()
            },
            combat: CombatConfig {
                style: AttackStyle::Ranged {
                    projectile_speed: 6.0,
                    lifetime: 4.0,
                    turn_rate_deg: 90.0,
                    projectile_radius: 0.25,
                    damage: 1,
                },
                attack_range: 10.0,
                telegraph: 0.75,
                cooldown: 2.5,
                disengage_distance: 25.0,
                ..default()
            },
            perception: PerceptionConfig {
                max_distance: 18.0,
                ..default()
            },
            interruption: InterruptionConfig::default(),
            anchors: ThrowAnchors::all(),
        }
    }

    /// Наземный, ходит через navigation agent
    fn slimoeil() -> Self {
        Self {
            kind: EnemyKind::Slimoeil,
            lives: 3,
            radius: 0.5,
            behavior: BehaviorConfig {
                travel_mode: TravelMode::Navigation,
                ..default()
            },
            combat: CombatConfig {
                chase_mode: TravelMode::Navigation,
                ..default()
            },
            perception: PerceptionConfig {
                use_path_distance: true,
                ..default()
            },
            interruption: InterruptionConfig::default(),
            anchors: ThrowAnchors::all(),
        }
    }

    /// Нужен ли NavigationAgent (хоть одна travel задача идёт через navmesh)
    pub fn uses_navigation(&self) -> bool {
        self.behavior.travel_mode == TravelMode::Navigation || self.combat.chase_mode == TravelMode::Navigation
    }

    /// Первая найденная проблема профиля
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lives < 1 {
            return Err(ConfigError::NoLives(self.lives));
        }
        positive("radius", self.radius)?;

        let behavior = &self.behavior;
        if behavior.weights.is_empty() {
            return Err(ConfigError::EmptyWeights);
        }
        let total = behavior.total_weight();
        if total != 100 {
            return Err(ConfigError::WeightsDontSum { total });
        }
        ordered("state duration", behavior.state_duration_min, behavior.state_duration_max)?;
        ordered("wander distance", behavior.wander_min_distance, behavior.wander_max_distance)?;
        ordered("search dwell", behavior.search_dwell_min, behavior.search_dwell_max)?;
        positive("move speed", behavior.move_speed)?;

        positive("attack range", self.combat.attack_range)?;
        positive("chase speed", self.combat.chase_speed)?;
        ordered("search cue / disengage", self.combat.search_cue_after, self.combat.disengage_after)?;

        positive("vision distance", self.perception.max_distance)?;
        positive("distance sample interval", self.perception.sample_interval)?;

        positive("throw duration", self.interruption.throw_duration)?;
        positive("fall death timeout", self.interruption.fall_death_after)?;

        if ThrowAnchors::default() == self.anchors {
            return Err(ConfigError::NoThrowAnchors);
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { field, min, max })
    }
}
