//! Grab skill events: вход от host (input, trigger volumes) и выход (UI, companion)

use bevy::prelude::*;

use crate::interruption::ThrowAxis;

/// Что случилось с кандидатом (пишут trigger volumes хоста)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateEventKind {
    VisibilityEntered,
    VisibilityExited,
    RangeEntered,
    RangeExited,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateEvent {
    pub candidate: Entity,
    pub kind: CandidateEventKind,
}

/// Ввод игрока для скилла
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillInput {
    Aim,
    Cancel,
    Next,
    Previous,
    Axis(ThrowAxis),
    /// Схватить выбранного и держать перед собой
    Hold,
    Throw,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AimModeChanged {
    pub player: Entity,
    pub aiming: bool,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChanged {
    pub player: Entity,
    pub unselected: Option<Entity>,
    pub selected: Option<Entity>,
}

/// Показать preview оси броска над целью
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisPreviewRequested {
    pub target: Entity,
    pub axis: ThrowAxis,
}

/// Бросок состоялся
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ThrowResolved {
    pub player: Entity,
    pub target: Entity,
    pub axis: ThrowAxis,
    pub direction: Vec3,
}
