//! Motion tasks - одна активная motion routine на entity
//!
//! Вместо coroutine-циклов (yield per frame) каждая routine - явная задача в
//! `MotionSlot`, которую система двигает раз в тик. Старт новой задачи ВСЕГДА
//! отменяет предыдущую (cancel + replace), поэтому две routine одновременно
//! на одном entity невозможны.
//!
//! Владелец routine хранит `MotionHandle`; если handle больше не текущий -
//! routine была отменена кем-то с более высоким приоритетом (grab, damage, death).

use bevy::prelude::*;

pub mod tasks;

pub use tasks::{ease_out_quad, face_towards, BounceTask, FallStep, FallTask, FlightKind, FlightStep, FlightTask, TravelTask};

/// Идентификатор запущенной routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotionHandle(u32);

#[derive(Debug, Clone, PartialEq)]
pub enum MotionTask {
    /// Автономное/преследующее перемещение к точке
    Travel(TravelTask),
    /// Бросок или knockback (внешняя скорость, easing по времени)
    Flight(FlightTask),
    /// Свободное падение до земли
    Fall(FallTask),
    /// Просадка от прыжка сверху (пока dazed)
    Bounce(BounceTask),
}

impl MotionTask {
    pub fn name(&self) -> &'static str {
        match self {
            MotionTask::Travel(_) => "travel",
            MotionTask::Flight(_) => "flight",
            MotionTask::Fall(_) => "fall",
            MotionTask::Bounce(_) => "bounce",
        }
    }
}

/// Слот единственной активной motion routine
#[derive(Component, Debug, Default)]
pub struct MotionSlot {
    active: Option<(MotionHandle, MotionTask)>,
    next_id: u32,
}

impl MotionSlot {
    /// Запустить routine, отменив текущую
    pub fn start(&mut self, task: MotionTask) -> MotionHandle {
        if let Some((_, previous)) = self.active.take() {
            crate::log(&format!(
                "motion: {} cancelled, replaced by {}",
                previous.name(),
                task.name()
            ));
        }
        self.next_id = self.next_id.wrapping_add(1);
        let handle = MotionHandle(self.next_id);
        self.active = Some((handle, task));
        handle
    }

    /// Отменить текущую routine (если есть)
    pub fn cancel(&mut self) -> Option<MotionTask> {
        self.active.take().map(|(_, task)| task)
    }

    /// Отменить только если текущая routine - наша
    pub fn cancel_if(&mut self, handle: MotionHandle) -> bool {
        if self.is_running(handle) {
            self.active = None;
            true
        } else {
            false
        }
    }

    pub fn is_running(&self, handle: MotionHandle) -> bool {
        matches!(self.active, Some((h, _)) if h == handle)
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn handle(&self) -> Option<MotionHandle> {
        self.active.as_ref().map(|(h, _)| *h)
    }

    pub fn current(&self) -> Option<&MotionTask> {
        self.active.as_ref().map(|(_, task)| task)
    }

    pub fn current_mut(&mut self) -> Option<&mut MotionTask> {
        self.active.as_mut().map(|(_, task)| task)
    }

    /// Travel задача по handle (None если отменена или не travel)
    pub fn travel(&self, handle: MotionHandle) -> Option<&TravelTask> {
        match &self.active {
            Some((h, MotionTask::Travel(travel))) if *h == handle => Some(travel),
            _ => None,
        }
    }

    pub fn travel_mut(&mut self, handle: MotionHandle) -> Option<&mut TravelTask> {
        match &mut self.active {
            Some((h, MotionTask::Travel(travel))) if *h == handle => Some(travel),
            _ => None,
        }
    }
}
