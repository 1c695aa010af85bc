//! Behavior FSM components (autonomous state, weights, config).

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::TravelMode;
use crate::motion::{MotionHandle, MotionSlot};

/// Автономные состояния врага (пока он не в бою)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Reflect)]
pub enum BehaviorState {
    /// Стоим на месте (destination = текущая позиция)
    #[default]
    Idle,
    /// Случайная точка в кольце вокруг Origin
    Wandering,
    /// Обход патрульных точек по кругу
    Searching,
    /// Возврат к spawn позиции
    ReturnToOrigin,
}

impl BehaviorState {
    /// Интервал проверки прибытия (секунды). Idle никуда не едет.
    pub fn arrival_check_interval(&self) -> Option<f32> {
        match self {
            BehaviorState::Idle => None,
            BehaviorState::Wandering => Some(1.0),
            BehaviorState::Searching => Some(0.5),
            BehaviorState::ReturnToOrigin => Some(0.3),
        }
    }
}

/// Пара (состояние, вес) для weighted draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateWeight {
    pub state: BehaviorState,
    pub weight: u32,
}

impl StateWeight {
    pub const fn new(state: BehaviorState, weight: u32) -> Self {
        Self { state, weight }
    }
}

/// Weighted draw по `roll` из [0, 100)
///
/// Выбирается первое состояние, чья накопленная сумма СТРОГО больше roll
/// (нижняя граница включительно, верхняя исключительно): [30,30,40] → 29=A, 30=B, 60=C.
/// Если веса в сумме меньше 100, остаток забирает последнее состояние.
pub fn draw_weighted_state(weights: &[StateWeight], roll: u32) -> Option<BehaviorState> {
    let mut cumulative = 0u32;
    for entry in weights {
        cumulative = cumulative.saturating_add(entry.weight);
        if roll < cumulative {
            return Some(entry.state);
        }
    }
    weights.last().map(|entry| entry.state)
}

/// Случайная длительность в [min, max] (порядок границ не важен)
pub fn random_duration(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    if high - low <= f32::EPSILON {
        low
    } else {
        rng.gen_range(low..high)
    }
}

/// Точка в кольце [min_radius, max_radius] вокруг center, случайный азимут
pub fn annulus_point(rng: &mut impl Rng, center: Vec3, min_radius: f32, max_radius: f32) -> Vec3 {
    let bearing = rng.gen_range(0.0..std::f32::consts::TAU);
    let radius = random_duration(rng, min_radius, max_radius);
    center + Vec3::new(bearing.cos(), 0.0, bearing.sin()) * radius
}

/// Параметры autonomous behavior (per enemy type)
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub weights: Vec<StateWeight>,
    /// Сколько держать состояние (секунды, случайно в [min, max])
    pub state_duration_min: f32,
    pub state_duration_max: f32,
    pub wander_min_distance: f32,
    pub wander_max_distance: f32,
    pub move_speed: f32,
    /// Пауза на патрульной точке перед следующей (секунды, случайно в [min, max])
    pub search_dwell_min: f32,
    pub search_dwell_max: f32,
    /// Квадрат дистанции "прибыл"
    pub arrival_threshold_sq: f32,
    /// Таймер после выхода из боя (быстро вернуться к автономии)
    pub resume_delay: f32,
    pub travel_mode: TravelMode,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            weights: vec![
                StateWeight::new(BehaviorState::Idle, 30),
                StateWeight::new(BehaviorState::Wandering, 40),
                StateWeight::new(BehaviorState::Searching, 10),
                StateWeight::new(BehaviorState::ReturnToOrigin, 20),
            ],
            state_duration_min: 3.0,
            state_duration_max: 6.0,
            wander_min_distance: 2.0,
            wander_max_distance: 6.0,
            move_speed: 2.5,
            search_dwell_min: 2.0,
            search_dwell_max: 4.0,
            arrival_threshold_sq: 1.0,
            resume_delay: 0.5,
            travel_mode: TravelMode::Steering,
        }
    }
}

impl BehaviorConfig {
    pub fn total_weight(&self) -> u32 {
        self.weights.iter().map(|w| w.weight).sum()
    }
}

/// Autonomous behavior state machine
#[derive(Component, Debug, Clone)]
pub struct BehaviorMachine {
    pub state: BehaviorState,
    /// Countdown до следующего weighted draw
    pub change_timer: Timer,
    /// Running index по PatrolRoute
    pub patrol_index: usize,
    pub destination: Vec3,
    /// Наша travel routine (stale handle = её отменили)
    pub travel: Option<MotionHandle>,
    /// Стоим на патрульной точке (Searching), потом едем к следующей
    pub dwell: Option<Timer>,
}

impl Default for BehaviorMachine {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl BehaviorMachine {
    pub fn new(first_draw_after: f32) -> Self {
        Self {
            state: BehaviorState::Idle,
            change_timer: Timer::from_seconds(first_draw_after, TimerMode::Once),
            patrol_index: 0,
            destination: Vec3::ZERO,
            travel: None,
            dwell: None,
        }
    }

    /// Сбросить countdown на короткое значение (выход из боя)
    pub fn resume_soon(&mut self, delay: f32) {
        self.change_timer = Timer::from_seconds(delay, TimerMode::Once);
    }

    pub fn restart_timer(&mut self, seconds: f32) {
        self.change_timer = Timer::from_seconds(seconds, TimerMode::Once);
    }

    /// Отменить нашу travel routine (чужую, например погоню, не трогаем)
    pub fn cancel_travel(&mut self, motion: &mut MotionSlot) -> bool {
        self.dwell = None;
        self.travel.take().is_some_and(|handle| motion.cancel_if(handle))
    }
}
