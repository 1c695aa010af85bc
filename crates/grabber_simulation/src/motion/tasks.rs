//! Конкретные motion задачи: travel, flight (throw/knockback), fall

use bevy::prelude::*;
use std::time::Duration;

use crate::components::TravelMode;
use crate::interruption::ThrowAxis;
use crate::spatial::{step_clear, SpatialQueries, MASK_FLIGHT_PROBE};

/// Ease-out: быстрый старт, плавное торможение в конце броска
pub fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Повернуться к точке по горизонтали (без наклона)
pub fn face_towards(transform: &mut Transform, point: Vec3) {
    let flat = Vec3::new(point.x, transform.translation.y, point.z);
    if flat.distance_squared(transform.translation) > 1e-6 {
        transform.look_at(flat, Vec3::Y);
    }
}

// ============================================================================
// Travel
// ============================================================================

/// Перемещение к destination с периодической проверкой прибытия
///
/// Arrival check НЕ каждый тик: свой repeating timer (интервал зависит от state).
#[derive(Debug, Clone, PartialEq)]
pub struct TravelTask {
    pub destination: Vec3,
    pub speed: f32,
    pub mode: TravelMode,
    pub arrival_threshold_sq: f32,
    pub arrived: bool,
    /// Упёрлись в препятствие в последнем тике
    pub stalled: bool,
    arrival_check: Timer,
}

impl TravelTask {
    pub fn new(
        destination: Vec3,
        speed: f32,
        check_interval: f32,
        arrival_threshold_sq: f32,
        mode: TravelMode,
    ) -> Self {
        Self {
            destination,
            speed,
            mode,
            arrival_threshold_sq,
            arrived: false,
            stalled: false,
            arrival_check: Timer::from_seconds(check_interval, TimerMode::Repeating),
        }
    }

    pub fn retarget(&mut self, destination: Vec3) {
        self.destination = destination;
        self.arrived = false;
    }

    /// Периодический poll прибытия. Возвращает текущий arrived флаг.
    pub fn poll_arrival(&mut self, position: Vec3, dt: Duration) -> bool {
        if self.arrived {
            return true;
        }
        self.arrival_check.tick(dt);
        if self.arrival_check.just_finished() {
            self.arrived = position.distance_squared(self.destination) <= self.arrival_threshold_sq;
        }
        self.arrived
    }

    /// Один шаг steering. Коммитим шаг только если forward probe чист.
    pub fn steer(&mut self, transform: &mut Transform, spatial: &dyn SpatialQueries, radius: f32, dt: Duration) {
        if self.arrived {
            return;
        }

        let to_destination = self.destination - transform.translation;
        let distance = to_destination.length();
        if distance <= 1e-3 {
            self.stalled = false;
            return;
        }

        let step = to_destination / distance * (self.speed * dt.as_secs_f32()).min(distance);
        if step_clear(spatial, transform.translation, step, radius) {
            transform.translation += step;
            face_towards(transform, self.destination);
            self.stalled = false;
        } else {
            // Не обходим - просто стоим этот тик
            self.stalled = true;
        }
    }
}

// ============================================================================
// Flight (throw / knockback)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightKind {
    Throw(ThrowAxis),
    Knockback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightStep {
    InFlight,
    Blocked,
    Completed,
}

/// Контакт ближе чем конец шага на эту величину = препятствие, иначе просто касание в конце
const CONTACT_SLOP: f32 = 1e-3;

/// Полёт start → end по easing кривой за фиксированное время
///
/// `arc` - высота параболической дуги поверх прямой (knockback подбрасывает вверх).
#[derive(Debug, Clone, PartialEq)]
pub struct FlightTask {
    pub start: Vec3,
    pub end: Vec3,
    pub kind: FlightKind,
    pub arc: f32,
    timer: Timer,
}

impl FlightTask {
    pub fn new(start: Vec3, end: Vec3, duration: f32, kind: FlightKind) -> Self {
        Self {
            start,
            end,
            kind,
            arc: 0.0,
            timer: Timer::from_seconds(duration, TimerMode::Once),
        }
    }

    pub fn with_arc(mut self, height: f32) -> Self {
        self.arc = height;
        self
    }

    pub fn direction(&self) -> Vec3 {
        (self.end - self.start).normalize_or_zero()
    }

    pub fn advance(
        &mut self,
        transform: &mut Transform,
        spatial: &dyn SpatialQueries,
        radius: f32,
        dt: Duration,
    ) -> FlightStep {
        self.timer.tick(dt);
        let t = self.timer.fraction();
        let next = self.start.lerp(self.end, ease_out_quad(t)) + Vec3::Y * self.arc * 4.0 * t * (1.0 - t);
        let step = next - transform.translation;
        let length = step.length();

        if length > f32::EPSILON {
            let blocked = spatial
                .sphere_cast(transform.translation, radius, step, length, MASK_FLIGHT_PROBE)
                .is_some_and(|hit| hit.distance < length - CONTACT_SLOP);
            if blocked {
                return FlightStep::Blocked;
            }
        }

        transform.translation = next;
        if self.timer.finished() {
            FlightStep::Completed
        } else {
            FlightStep::InFlight
        }
    }
}

// ============================================================================
// Bounce (на врага прыгнули сверху)
// ============================================================================

/// Просадка вниз и возврат на исходную высоту: y = base - dip·sin(πt)
#[derive(Debug, Clone, PartialEq)]
pub struct BounceTask {
    pub base_height: f32,
    pub dip: f32,
    timer: Timer,
}

impl BounceTask {
    pub fn new(base_height: f32, dip: f32, duration: f32) -> Self {
        Self {
            base_height,
            dip,
            timer: Timer::from_seconds(duration, TimerMode::Once),
        }
    }

    /// true = routine закончилась, тело снова на `base_height`
    pub fn advance(&mut self, transform: &mut Transform, dt: Duration) -> bool {
        self.timer.tick(dt);
        let t = self.timer.fraction();
        transform.translation.y = self.base_height - self.dip * (std::f32::consts::PI * t).sin();
        if self.timer.finished() {
            transform.translation.y = self.base_height;
            return true;
        }
        false
    }
}

// ============================================================================
// Fall
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FallStep {
    Falling,
    Landed,
}

/// Интегрирование гравитации до контакта с землёй
#[derive(Debug, Clone, PartialEq)]
pub struct FallTask {
    pub velocity: Vec3,
    /// gravity × scale (м/с²)
    pub gravity: f32,
}

impl FallTask {
    pub fn new(gravity: f32) -> Self {
        Self {
            velocity: Vec3::ZERO,
            gravity,
        }
    }

    pub fn advance(
        &mut self,
        transform: &mut Transform,
        spatial: &dyn SpatialQueries,
        radius: f32,
        dt: Duration,
    ) -> FallStep {
        let dt = dt.as_secs_f32();
        self.velocity.y -= self.gravity * dt;
        let step = self.velocity * dt;
        let drop = (-step.y).max(0.0);

        if let Some(hit) = spatial.ground_below(transform.translation, drop + radius) {
            transform.translation = hit.point + Vec3::Y * radius;
            self.velocity = Vec3::ZERO;
            return FallStep::Landed;
        }

        transform.translation += step;
        FallStep::Falling
    }
}
