//! Combat FSM components (phase machine, attack style, disengage policy).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::components::TravelMode;
use crate::motion::MotionHandle;

/// Способ атаки (per enemy type)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttackStyle {
    /// Overlap сфера перед врагом против коллайдера игрока
    Melee { reach: f32, radius: f32, damage: i32 },
    /// Самонаводящийся снаряд в последнюю известную позицию игрока
    Ranged {
        projectile_speed: f32,
        lifetime: f32,
        /// Градусы в секунду
        turn_rate_deg: f32,
        projectile_radius: f32,
        damage: i32,
    },
}

impl AttackStyle {
    pub fn is_ranged(&self) -> bool {
        matches!(self, AttackStyle::Ranged { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum CombatPhase {
    #[default]
    Unaware,
    Pursuing,
    /// Замах с визуальным cue - игрок успевает среагировать
    Telegraphing,
    Attacking,
    Cooldown,
}

/// Параметры боя (per enemy type)
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub style: AttackStyle,
    pub attack_range: f32,
    /// Длительность telegraph (секунды)
    pub telegraph: f32,
    /// Cooldown после атаки (зависит от типа атаки)
    pub cooldown: f32,
    /// "Searching" cue после стольких секунд без визуального контакта
    pub search_cue_after: f32,
    /// Полный выход из боя
    pub disengage_after: f32,
    /// Выход из боя если игрок дальше этого радиуса
    pub disengage_distance: f32,
    pub chase_speed: f32,
    pub chase_mode: TravelMode,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            style: AttackStyle::Melee {
                reach: 1.0,
                radius: 0.8,
                damage: 1,
            },
            attack_range: 1.8,
            telegraph: 0.5,
            cooldown: 1.5,
            search_cue_after: 5.0,
            disengage_after: 10.0,
            disengage_distance: 20.0,
            chase_speed: 4.0,
            chase_mode: TravelMode::Steering,
        }
    }
}

/// Вердикт disengagement policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engagement {
    Engaged,
    /// Потеряли из виду: [search_cue_after, disengage_after)
    Searching,
    Disengage,
}

/// Единственный вход - время с последнего контакта (плюс жёсткий радиус)
pub fn evaluate_engagement(since_seen: Duration, distance: f32, config: &CombatConfig) -> Engagement {
    let since_seen = since_seen.as_secs_f32();
    if since_seen >= config.disengage_after || distance > config.disengage_distance {
        Engagement::Disengage
    } else if since_seen >= config.search_cue_after {
        Engagement::Searching
    } else {
        Engagement::Engaged
    }
}

/// Combat state machine (aggression gate для behavior машины)
#[derive(Component, Debug, Clone)]
pub struct CombatMachine {
    pub phase: CombatPhase,
    pub target: Option<Entity>,
    /// Куда целимся (снимок last known position на старте telegraph)
    pub aim_point: Vec3,
    /// Searching cue уже показан в текущем эпизоде потери цели
    pub search_cue_shown: bool,
    /// Travel routine погони
    pub chase: Option<MotionHandle>,
    phase_timer: Timer,
}

impl Default for CombatMachine {
    fn default() -> Self {
        Self {
            phase: CombatPhase::Unaware,
            target: None,
            aim_point: Vec3::ZERO,
            search_cue_shown: false,
            chase: None,
            phase_timer: Timer::default(),
        }
    }
}

impl CombatMachine {
    pub fn is_aggressive(&self) -> bool {
        self.phase != CombatPhase::Unaware
    }

    /// Unaware → Pursuing. Повторный detection во время боя игнорируется.
    pub fn engage(&mut self, target: Entity) -> bool {
        if self.is_aggressive() {
            return false;
        }
        self.phase = CombatPhase::Pursuing;
        self.target = Some(target);
        self.search_cue_shown = false;
        true
    }

    /// → Unaware. Возвращает handle погони, который надо отменить.
    pub fn disengage(&mut self) -> Option<MotionHandle> {
        self.phase = CombatPhase::Unaware;
        self.target = None;
        self.search_cue_shown = false;
        self.chase.take()
    }

    pub fn begin_telegraph(&mut self, aim_point: Vec3, duration: f32) {
        self.phase = CombatPhase::Telegraphing;
        self.aim_point = aim_point;
        self.phase_timer = Timer::from_seconds(duration, TimerMode::Once);
    }

    pub fn begin_cooldown(&mut self, duration: f32) {
        self.phase = CombatPhase::Cooldown;
        self.phase_timer = Timer::from_seconds(duration, TimerMode::Once);
    }

    /// Grab / throw / damage: замах сорван, aggression остаётся
    pub fn interrupt(&mut self) -> bool {
        self.chase = None;
        match self.phase {
            CombatPhase::Telegraphing | CombatPhase::Attacking => {
                self.phase = CombatPhase::Pursuing;
                true
            }
            _ => false,
        }
    }

    /// Тикнуть таймер фазы. true = фаза истекла.
    pub fn tick_phase(&mut self, dt: Duration) -> bool {
        self.phase_timer.tick(dt);
        self.phase_timer.finished()
    }
}
