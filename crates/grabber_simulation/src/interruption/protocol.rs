//! Physical interruption protocol: операции над одним телом
//!
//! `PhysicalBody` - временный view (&mut на компоненты одного entity), собирается
//! системой на один вызов. Все entry points начинаются с guard clause:
//! мёртвое тело = silent no-op.

use bevy::prelude::*;
use std::time::Duration;
use thiserror::Error;

use super::components::{DazeSeverity, Interruption, InterruptionConfig, InterruptionState, ThrowAnchors, ThrowAxis};
use crate::components::Life;
use crate::motion::{BounceTask, FallStep, FallTask, FlightKind, FlightStep, FlightTask, MotionSlot, MotionTask};
use crate::spatial::{SpatialQueries, LAYER_ENVIRONMENT};

/// Почему бросок отклонён (состояние тела при этом не меняется)
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ThrowRejected {
    #[error("no throw anchor configured for axis {0:?}")]
    MissingAnchor(ThrowAxis),
    #[error("target is dead")]
    Dead,
    #[error("target cannot be grabbed in state {0:?}")]
    Unavailable(InterruptionState),
    #[error("target is held by another holder")]
    HeldByOther,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    Damage,
    FallTimeout,
}

/// Что изменилось в протоколе (уходит наружу как `InterruptionChanged`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterruptionTransition {
    Grabbed { holder: Entity },
    Released,
    Thrown { axis: ThrowAxis, direction: Vec3 },
    KnockedBack { direction: Vec3 },
    Falling,
    Dazed(DazeSeverity),
    Recovered(DazeSeverity),
    /// Урон принят, состояние протокола не поменялось (держат / летит / падает)
    Damaged { remaining: i32 },
    Died(DeathCause),
}

/// Результат `receive_damage`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Immunity окно или уже мёртв
    Rejected,
    /// Жизнь снята, состояние не поменялось
    Damaged { remaining: i32 },
    Dazed { remaining: i32 },
    Killed,
}

impl DamageOutcome {
    pub fn accepted(&self) -> bool {
        !matches!(self, DamageOutcome::Rejected)
    }

    pub fn transition(&self) -> Option<InterruptionTransition> {
        match *self {
            DamageOutcome::Rejected => None,
            DamageOutcome::Damaged { remaining } => Some(InterruptionTransition::Damaged { remaining }),
            DamageOutcome::Dazed { .. } => Some(InterruptionTransition::Dazed(DazeSeverity::Hit)),
            DamageOutcome::Killed => Some(InterruptionTransition::Died(DeathCause::Damage)),
        }
    }
}

/// View на компоненты одного тела
pub struct PhysicalBody<'a> {
    pub entity: Entity,
    pub transform: &'a mut Transform,
    pub interruption: &'a mut Interruption,
    pub life: &'a mut Life,
    pub motion: &'a mut MotionSlot,
    pub config: &'a InterruptionConfig,
    /// Радиус коллайдера (forward probe в полёте, контакт с землёй)
    pub radius: f32,
}

impl<'a> PhysicalBody<'a> {
    pub fn new(
        entity: Entity,
        transform: &'a mut Transform,
        interruption: &'a mut Interruption,
        life: &'a mut Life,
        motion: &'a mut MotionSlot,
        config: &'a InterruptionConfig,
        radius: f32,
    ) -> Self {
        Self {
            entity,
            transform,
            interruption,
            life,
            motion,
            config,
            radius,
        }
    }

    pub fn state(&self) -> InterruptionState {
        self.interruption.state
    }

    fn is_dead(&self) -> bool {
        self.interruption.is_dead() || !self.life.is_alive()
    }

    // ------------------------------------------------------------------------
    // Grab / release
    // ------------------------------------------------------------------------

    /// Подобрать тело. Разрешено из Free и Dazed.
    pub fn grab(&mut self, holder: Entity) -> Option<InterruptionTransition> {
        if self.is_dead() {
            return None;
        }
        match self.interruption.state {
            InterruptionState::Free | InterruptionState::Dazed(_) => {}
            _ => return None,
        }

        self.motion.cancel();
        self.interruption.state = InterruptionState::Grabbed { holder };
        self.interruption.can_freely_move = false;
        self.interruption.velocity = Vec3::ZERO;

        crate::log(&format!("🤏 {:?} grabbed by {:?}", self.entity, holder));
        Some(InterruptionTransition::Grabbed { holder })
    }

    /// Отпустить без броска: ровно Free, движение восстановлено, скорость 0
    pub fn release(&mut self) -> Option<InterruptionTransition> {
        if self.is_dead() || self.interruption.holder().is_none() {
            return None;
        }

        self.motion.cancel();
        self.interruption.state = InterruptionState::Free;
        self.interruption.can_freely_move = true;
        self.interruption.targetable = true;
        self.interruption.velocity = Vec3::ZERO;

        crate::log(&format!("{:?} released without throw", self.entity));
        Some(InterruptionTransition::Released)
    }

    /// Удержание: holder пишет позицию (единственный writer пока Grabbed)
    pub fn pin(&mut self, position: Vec3, facing: Quat) {
        if self.interruption.holder().is_some() {
            self.transform.translation = position;
            self.transform.rotation = facing;
        }
    }

    // ------------------------------------------------------------------------
    // Throw / knockback
    // ------------------------------------------------------------------------

    /// Combined grab + throw. `frame` = ориентация бросающего (оси Right/Left считаются от него).
    ///
    /// Проверки идут ДО любых мутаций: отказ оставляет тело как было (Free или Grabbed).
    /// Возвращает world направление броска.
    pub fn grab_and_throw(
        &mut self,
        holder: Entity,
        frame: Quat,
        axis: ThrowAxis,
        anchors: &ThrowAnchors,
    ) -> Result<Vec3, ThrowRejected> {
        if self.is_dead() {
            return Err(ThrowRejected::Dead);
        }
        let direction = anchors
            .direction(axis, frame)
            .ok_or(ThrowRejected::MissingAnchor(axis))?;
        match self.interruption.state {
            InterruptionState::Free | InterruptionState::Dazed(_) => {}
            InterruptionState::Grabbed { holder: current } if current == holder => {}
            InterruptionState::Grabbed { .. } => return Err(ThrowRejected::HeldByOther),
            other => return Err(ThrowRejected::Unavailable(other)),
        }

        if self.interruption.holder().is_none() {
            self.grab(holder);
        }

        let start = self.transform.translation;
        let end = start + direction * self.config.throw_distance;
        self.launch(FlightTask::new(start, end, self.config.throw_duration, FlightKind::Throw(axis)));

        crate::log(&format!("🌀 {:?} thrown {:?} (direction {:?})", self.entity, axis, direction));
        Ok(direction)
    }

    /// Knockback от dash: короткий полёт от источника с подъёмом, без anchor
    pub fn knockback(&mut self, from: Vec3) -> Option<InterruptionTransition> {
        if self.is_dead() {
            return None;
        }
        match self.interruption.state {
            InterruptionState::Free | InterruptionState::Dazed(_) => {}
            _ => return None,
        }

        let start = self.transform.translation;
        let mut away = start - from;
        away.y = 0.0;
        let away = away.try_normalize().unwrap_or_else(|| {
            let back = self.transform.back();
            Vec3::new(back.x, 0.0, back.z)
        });
        let end = start + away * self.config.knockback_distance;

        self.launch(
            FlightTask::new(start, end, self.config.knockback_duration, FlightKind::Knockback)
                .with_arc(self.config.knockback_lift),
        );
        let direction = (away * self.config.knockback_distance + Vec3::Y * self.config.knockback_lift).normalize_or_zero();
        Some(InterruptionTransition::KnockedBack { direction })
    }

    fn launch(&mut self, flight: FlightTask) {
        self.interruption.velocity = flight.direction();
        self.motion.start(MotionTask::Flight(flight));
        self.interruption.state = InterruptionState::Thrown;
        self.interruption.can_freely_move = false;
        self.interruption.targetable = false;
    }

    // ------------------------------------------------------------------------
    // Damage / death
    // ------------------------------------------------------------------------

    pub fn receive_damage(&mut self, point: Vec3) -> DamageOutcome {
        if self.is_dead() || self.interruption.is_immune() {
            return DamageOutcome::Rejected;
        }

        let remaining = self.life.take_hit();
        self.interruption.immunity = Some(Timer::from_seconds(self.config.immunity, TimerMode::Once));
        self.interruption.flash = Some(Timer::from_seconds(self.config.hit_flash, TimerMode::Once));

        if !self.life.is_alive() {
            crate::log(&format!("💀 {:?} killed by hit at {:?}", self.entity, point));
            self.die();
            return DamageOutcome::Killed;
        }

        match self.interruption.state {
            InterruptionState::Free | InterruptionState::Dazed(_) => {
                self.enter_daze(DazeSeverity::Hit);
                crate::log(&format!("{:?} hit at {:?}, {} lives left", self.entity, point, remaining));
                DamageOutcome::Dazed { remaining }
            }
            _ => DamageOutcome::Damaged { remaining },
        }
    }

    /// Игрок прыгнул сверху: удар + просадка, пока враг оглушён
    pub fn stomp(&mut self, point: Vec3) -> DamageOutcome {
        if self.is_dead() {
            return DamageOutcome::Rejected;
        }
        // Повторный прыжок во время bounce держит исходную высоту
        let base_height = match self.motion.current() {
            Some(MotionTask::Bounce(bounce)) => bounce.base_height,
            _ => self.transform.translation.y,
        };

        let outcome = self.receive_damage(point);
        if self.interruption.is_dazed() {
            self.motion.start(MotionTask::Bounce(BounceTask::new(
                base_height,
                self.config.stomp_dip,
                self.config.stomp_duration,
            )));
        }
        outcome
    }

    /// Терминальное состояние. Повторный вызов = no-op.
    pub fn die(&mut self) -> bool {
        if self.interruption.is_dead() {
            return false;
        }
        self.motion.cancel();
        self.life.kill();
        self.interruption.state = InterruptionState::Dead;
        self.interruption.can_freely_move = false;
        self.interruption.targetable = false;
        self.interruption.velocity = Vec3::ZERO;
        true
    }

    fn enter_daze(&mut self, severity: DazeSeverity) -> InterruptionTransition {
        self.motion.cancel();
        self.interruption.state = InterruptionState::Dazed(severity);
        self.interruption.can_freely_move = false;
        self.interruption.velocity = Vec3::ZERO;
        self.interruption.daze_timer = Timer::from_seconds(self.config.daze_duration(severity), TimerMode::Once);
        InterruptionTransition::Dazed(severity)
    }

    fn start_fall(&mut self) -> InterruptionTransition {
        self.motion
            .start(MotionTask::Fall(FallTask::new(self.config.gravity * self.config.gravity_scale)));
        self.interruption.state = InterruptionState::Falling;
        self.interruption.can_freely_move = false;
        self.interruption.targetable = false;
        self.interruption.velocity = Vec3::ZERO;
        self.interruption.fall_clock.reset();
        InterruptionTransition::Falling
    }

    fn unsupported(&self, spatial: &dyn SpatialQueries) -> bool {
        self.config.gravity_bound
            && spatial
                .ground_below(self.transform.translation, self.config.support_probe)
                .is_none()
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Продвинуть протокол на один тик
    pub fn tick(&mut self, dt: Duration, spatial: &dyn SpatialQueries) -> Option<InterruptionTransition> {
        // Вспышка доигрывает и на смертельном ударе
        if let Some(immunity) = self.interruption.immunity.as_mut() {
            immunity.tick(dt);
        }
        if let Some(flash) = self.interruption.flash.as_mut() {
            flash.tick(dt);
        }

        if self.interruption.is_dead() {
            return None;
        }

        match self.interruption.state {
            InterruptionState::Free | InterruptionState::Grabbed { .. } | InterruptionState::Dead => None,
            InterruptionState::Thrown => self.tick_flight(dt, spatial),
            InterruptionState::Falling => self.tick_fall(dt, spatial),
            InterruptionState::Dazed(severity) => {
                self.advance_bounce(dt);
                self.interruption.daze_timer.tick(dt);
                if !self.interruption.daze_timer.finished() {
                    return None;
                }
                if let Some(MotionTask::Bounce(bounce)) = self.motion.cancel() {
                    self.transform.translation.y = bounce.base_height;
                }
                self.interruption.state = InterruptionState::Free;
                self.interruption.can_freely_move = true;
                self.interruption.targetable = true;
                crate::log(&format!("{:?} recovered from {:?} daze", self.entity, severity));
                Some(InterruptionTransition::Recovered(severity))
            }
        }
    }

    fn advance_bounce(&mut self, dt: Duration) {
        let finished = match self.motion.current_mut() {
            Some(MotionTask::Bounce(bounce)) => bounce.advance(self.transform, dt),
            _ => return,
        };
        if finished {
            self.motion.cancel();
        }
    }

    /// После выхода из daze: далеко от дома → телепорт домой; летающий на земле → подъём
    ///
    /// Возвращает новую позицию, если тело переставили.
    pub fn relocate_after_daze(&mut self, home: Vec3, spatial: &dyn SpatialQueries) -> Option<Vec3> {
        if !self.interruption.is_free() {
            return None;
        }
        let position = self.transform.translation;

        if position.distance(home) > self.config.home_radius {
            crate::log(&format!("{:?} too far from home ({:.1}m), teleporting back", self.entity, position.distance(home)));
            self.transform.translation = home;
            return Some(home);
        }

        if self.config.gravity_bound || spatial.ground_below(position, self.config.hover_probe).is_none() {
            return None;
        }
        let lift = spatial
            .raycast(position, Vec3::Y, self.config.hover_lift, LAYER_ENVIRONMENT)
            .map_or(self.config.hover_lift, |ceiling| {
                (ceiling.distance - self.config.hover_clearance).max(0.0)
            });
        self.transform.translation.y += lift;
        Some(self.transform.translation)
    }

    fn tick_flight(&mut self, dt: Duration, spatial: &dyn SpatialQueries) -> Option<InterruptionTransition> {
        let (step, kind) = match self.motion.current_mut() {
            Some(MotionTask::Flight(flight)) => {
                let kind = flight.kind;
                (flight.advance(self.transform, spatial, self.radius, dt), kind)
            }
            // Полёт отменили снаружи - считаем завершённым
            _ => (FlightStep::Completed, FlightKind::Knockback),
        };

        let severity = match kind {
            FlightKind::Throw(_) => DazeSeverity::Thrown,
            FlightKind::Knockback => DazeSeverity::Hit,
        };

        match step {
            FlightStep::InFlight => None,
            FlightStep::Blocked | FlightStep::Completed => {
                if self.unsupported(spatial) {
                    crate::log(&format!("{:?} flight ended unsupported ({:?}), falling", self.entity, step));
                    Some(self.start_fall())
                } else {
                    Some(self.enter_daze(severity))
                }
            }
        }
    }

    fn tick_fall(&mut self, dt: Duration, spatial: &dyn SpatialQueries) -> Option<InterruptionTransition> {
        self.interruption.fall_clock.tick(dt);

        let landed = match self.motion.current_mut() {
            Some(MotionTask::Fall(fall)) => {
                let step = fall.advance(self.transform, spatial, self.radius, dt);
                self.interruption.velocity = fall.velocity;
                step == FallStep::Landed
            }
            _ => {
                // Fall routine потеряна - перезапускаем, таймер падения продолжает идти
                self.motion
                    .start(MotionTask::Fall(FallTask::new(self.config.gravity * self.config.gravity_scale)));
                false
            }
        };

        if landed {
            self.interruption.velocity = Vec3::ZERO;
            return Some(self.enter_daze(DazeSeverity::Thrown));
        }

        if self.interruption.fall_clock.elapsed() >= Duration::from_secs_f32(self.config.fall_death_after) {
            crate::log_warning(&format!(
                "{:?} fell for {:.2}s without ground contact, dying",
                self.entity,
                self.interruption.fall_clock.elapsed_secs()
            ));
            self.die();
            return Some(InterruptionTransition::Died(DeathCause::FallTimeout));
        }

        None
    }
}
