//! Interruption компоненты: состояние протокола, throw anchors, config

use bevy::prelude::*;
use bevy::time::Stopwatch;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ось броска (выбирается игроком направлением ввода)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ThrowAxis {
    #[default]
    Right,
    Left,
    Backward,
    Bottom,
}

impl ThrowAxis {
    pub const ALL: [ThrowAxis; 4] = [ThrowAxis::Right, ThrowAxis::Left, ThrowAxis::Backward, ThrowAxis::Bottom];
}

/// Directional throw anchors (local offsets), по одному на ось
///
/// Отсутствующий anchor = бросок по этой оси отклоняется.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThrowAnchors {
    pub right: Option<Vec3>,
    pub left: Option<Vec3>,
    pub backward: Option<Vec3>,
    pub bottom: Option<Vec3>,
}

impl ThrowAnchors {
    /// Все четыре оси (Bevy: forward = -Z, значит backward = +Z)
    pub fn all() -> Self {
        Self {
            right: Some(Vec3::X),
            left: Some(Vec3::NEG_X),
            backward: Some(Vec3::Z),
            bottom: Some(Vec3::NEG_Y),
        }
    }

    pub fn get(&self, axis: ThrowAxis) -> Option<Vec3> {
        match axis {
            ThrowAxis::Right => self.right,
            ThrowAxis::Left => self.left,
            ThrowAxis::Backward => self.backward,
            ThrowAxis::Bottom => self.bottom,
        }
    }

    /// World направление броска в системе координат бросающего
    pub fn direction(&self, axis: ThrowAxis, frame: Quat) -> Option<Vec3> {
        let local = self.get(axis)?;
        let world = (frame * local).normalize_or_zero();
        (world != Vec3::ZERO).then_some(world)
    }
}

/// Тяжесть оглушения (короткое от удара, длинное после броска/падения)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DazeSeverity {
    Hit,
    Thrown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionState {
    /// Автономные/боевые машины работают как обычно
    Free,
    /// Позицией владеет holder (grab skill)
    Grabbed { holder: Entity },
    /// Полёт по внешней скорости (бросок или knockback)
    Thrown,
    /// Падение до земли
    Falling,
    /// Оглушён, ждёт countdown
    Dazed(DazeSeverity),
    /// Терминальное состояние
    Dead,
}

/// Physical interruption state machine (общая для всех типов врагов)
///
/// Инвариант: одновременно активна максимум одна motion routine (см. MotionSlot).
#[derive(Component, Debug, Clone)]
pub struct Interruption {
    pub state: InterruptionState,
    /// Может ли враг сам двигаться (false во время любого interruption)
    pub can_freely_move: bool,
    /// Видим ли для grab skill (гасится пока летит, возвращается после daze)
    pub targetable: bool,
    pub velocity: Vec3,
    pub(crate) daze_timer: Timer,
    pub(crate) immunity: Option<Timer>,
    pub(crate) flash: Option<Timer>,
    pub(crate) fall_clock: Stopwatch,
}

impl Default for Interruption {
    fn default() -> Self {
        Self {
            state: InterruptionState::Free,
            can_freely_move: true,
            targetable: true,
            velocity: Vec3::ZERO,
            daze_timer: Timer::default(),
            immunity: None,
            flash: None,
            fall_clock: Stopwatch::new(),
        }
    }
}

impl Interruption {
    pub fn is_free(&self) -> bool {
        self.state == InterruptionState::Free
    }

    pub fn is_dead(&self) -> bool {
        self.state == InterruptionState::Dead
    }

    pub fn is_dazed(&self) -> bool {
        matches!(self.state, InterruptionState::Dazed(_))
    }

    pub fn holder(&self) -> Option<Entity> {
        match self.state {
            InterruptionState::Grabbed { holder } => Some(holder),
            _ => None,
        }
    }

    /// Free И может двигаться - единственное состояние где работают AI машины
    pub fn allows_autonomy(&self) -> bool {
        self.is_free() && self.can_freely_move
    }

    pub fn is_immune(&self) -> bool {
        self.immunity.as_ref().is_some_and(|timer| !timer.finished())
    }

    /// Интенсивность вспышки после удара: 1 → 0 пока таймер идёт, последний 0 - один раз
    pub fn flash_level(&mut self) -> Option<f32> {
        let flash = self.flash.as_ref()?;
        if flash.finished() {
            self.flash = None;
            return Some(0.0);
        }
        Some(1.0 - flash.fraction())
    }

    pub fn fall_elapsed(&self) -> Duration {
        self.fall_clock.elapsed()
    }

    pub fn daze_remaining_secs(&self) -> f32 {
        if self.is_dazed() {
            self.daze_timer.remaining_secs()
        } else {
            0.0
        }
    }
}

/// Параметры interruption протокола (per enemy type)
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterruptionConfig {
    /// Дальность броска (метры)
    pub throw_distance: f32,
    /// Длительность полёта броска (секунды)
    pub throw_duration: f32,
    pub knockback_distance: f32,
    /// Начальный подъём при knockback (метры вверх к концу полёта)
    pub knockback_lift: f32,
    pub knockback_duration: f32,
    /// Daze после удара (секунды)
    pub hit_daze: f32,
    /// Daze после полного броска / падения
    pub thrown_daze: f32,
    /// Окно неуязвимости после принятого удара
    pub immunity: f32,
    /// Вспышка-feedback после удара
    pub hit_flash: f32,
    pub gravity: f32,
    pub gravity_scale: f32,
    /// Сколько секунд непрерывного падения до смерти
    pub fall_death_after: f32,
    /// Глубина unsupported-below probe
    pub support_probe: f32,
    /// Падает ли враг без опоры (летающие - нет)
    pub gravity_bound: bool,
    /// Задержка despawn после смерти
    pub despawn_delay: f32,
    /// Просадка при прыжке сверху (метры)
    pub stomp_dip: f32,
    pub stomp_duration: f32,
    /// Дальше этого от origin после daze = телепорт домой
    pub home_radius: f32,
    /// Летающий у земли после daze поднимается на столько (если потолок не ближе)
    pub hover_lift: f32,
    /// Зазор до потолка при подъёме
    pub hover_clearance: f32,
    /// Глубина проверки "летающий лежит на земле"
    pub hover_probe: f32,
}

impl Default for InterruptionConfig {
    fn default() -> Self {
        Self {
            throw_distance: 8.0,
            throw_duration: 0.6,
            knockback_distance: 3.0,
            knockback_lift: 1.0,
            knockback_duration: 0.25,
            hit_daze: 2.0,
            thrown_daze: 4.0,
            immunity: 1.5,
            hit_flash: 0.2,
            gravity: 9.81,
            gravity_scale: 2.0,
            fall_death_after: 6.0,
            support_probe: 1.5,
            gravity_bound: true,
            despawn_delay: 3.0,
            stomp_dip: 0.5,
            stomp_duration: 0.7,
            home_radius: 16.0,
            hover_lift: 3.0,
            hover_clearance: 0.8,
            hover_probe: 1.0,
        }
    }
}

impl InterruptionConfig {
    pub fn daze_duration(&self, severity: DazeSeverity) -> f32 {
        match severity {
            DazeSeverity::Hit => self.hit_daze,
            DazeSeverity::Thrown => self.thrown_daze,
        }
    }
}

/// Marker: entity мёртв (все машины его пропускают)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dead;

/// Удалить entity после terminal задержки (death cue успевает проиграться)
#[derive(Component, Debug, Clone)]
pub struct DespawnAfter {
    pub timer: Timer,
}

impl DespawnAfter {
    pub fn seconds(delay: f32) -> Self {
        Self {
            timer: Timer::from_seconds(delay, TimerMode::Once),
        }
    }
}
