//! Visual sink - animation/effect запросы к движку
//!
//! Fire-and-forget: ядро пишет события, движок проигрывает клипы/партиклы.
//! Никакая логика ядра не читает эти события обратно.

use bevy::prelude::*;

/// Имена motion states (параметры animator'а на стороне движка)
pub mod motion_state {
    pub const MOVING: &str = "moving";
    pub const AGGRESSIVE: &str = "aggressive";
    pub const SEARCHING: &str = "searching";
    pub const TELEGRAPH: &str = "telegraph";
    pub const ATTACK: &str = "attack";
    pub const GRABBED: &str = "grabbed";
    pub const THROWN: &str = "thrown";
    pub const FALLING: &str = "falling";
    pub const DAZED: &str = "dazed";
    pub const HIT: &str = "hit";
    /// Scalar 0..1: затухающая вспышка после удара
    pub const HIT_FLASH: &str = "hit_flash";
    /// Цель замечена (perception rising edge)
    pub const ALERT: &str = "alert";
    pub const DEAD: &str = "dead";
    pub const SELECTABLE: &str = "selectable";
    pub const SELECTED: &str = "selected";
    pub const RECOIL: &str = "recoil";
    pub const SWIRL: &str = "swirl";
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionValue {
    Flag(bool),
    Scalar(f32),
}

/// Event: выставить motion state на animator'е entity
#[derive(Event, Debug, Clone, PartialEq)]
pub struct MotionStateRequested {
    pub entity: Entity,
    pub name: &'static str,
    pub value: MotionValue,
}

impl MotionStateRequested {
    pub fn flag(entity: Entity, name: &'static str, on: bool) -> Self {
        Self {
            entity,
            name,
            value: MotionValue::Flag(on),
        }
    }

    pub fn scalar(entity: Entity, name: &'static str, value: f32) -> Self {
        Self {
            entity,
            name,
            value: MotionValue::Scalar(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectId {
    HitFlash,
    /// Прыжок игрока на врага
    Impact,
    /// Телепорт/подъём после daze
    Pouf,
    Confused,
    Death,
    Telegraph,
    ProjectileLaunch,
    ProjectileImpact,
    ThrowAxisPreview,
    CompanionTeleport,
    CompanionRecoil,
    CompanionDoubleJump,
}

/// Event: проиграть эффект в точке
#[derive(Event, Debug, Clone, PartialEq)]
pub struct EffectRequested {
    pub effect: EffectId,
    pub position: Vec3,
}

pub struct VisualSinkPlugin;

impl Plugin for VisualSinkPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<MotionStateRequested>()
            .add_event::<EffectRequested>();
    }
}
