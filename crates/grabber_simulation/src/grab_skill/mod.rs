//! Grab-and-throw skill игрока
//!
//! Aim mode → выбор цели (auto-select + ручное переключение) → ось → бросок.
//! Видимость/дистанцию кандидатов сообщает host (trigger volumes),
//! перекрытие перепроверяется лучом от камеры.

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod systems;


pub use components::*;
pub use events::*;
pub use systems::*;

use crate::SimulationSet;

pub struct GrabSkillPlugin;

impl Plugin for GrabSkillPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CandidateEvent>()
            .add_event::<SkillInput>()
            .add_event::<AimModeChanged>()
            .add_event::<SelectionChanged>()
            .add_event::<AxisPreviewRequested>()
            .add_event::<ThrowResolved>()
            .add_systems(
                FixedUpdate,
                (track_candidates, handle_skill_input, carry_held_target)
                    .chain()
                    .in_set(SimulationSet::Skill),
            );
    }
}
