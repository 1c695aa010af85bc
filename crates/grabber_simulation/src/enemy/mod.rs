//! Enemy domain - типы врагов и spawn
//!
//! Wanderer (летающий), Seeker (ranged), Slimoeil (наземный melee).
//! Все три собраны из одних и тех же машин; различие только в профиле.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ai::BehaviorMachine;
use crate::combat::CombatMachine;
use crate::components::{CollisionVolume, Life, NavigationAgent, Origin, PatrolRoute};
use crate::config::EnemyProfile;
use crate::grab_skill::Grabbable;
use crate::interruption::Interruption;
use crate::motion::MotionSlot;
use crate::perception::VisionCone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
pub enum EnemyKind {
    Wanderer,
    Seeker,
    Slimoeil,
}

/// Marker врага
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Enemy {
    pub kind: EnemyKind,
}

/// Спавн врага по профилю
///
/// Невалидный профиль логируется, но враг всё равно появляется
/// (degraded поведение лучше пустого уровня).
pub fn spawn_enemy(
    commands: &mut Commands,
    profile: &EnemyProfile,
    position: Vec3,
    route: PatrolRoute,
) -> Entity {
    if let Err(error) = profile.validate() {
        crate::log_warning(&format!("⚠️ {:?} profile: {}", profile.kind, error));
    }

    let mut entity = commands.spawn((
        (
            Enemy { kind: profile.kind },
            Transform::from_translation(position),
            Origin::new(position),
            route,
            Life::new(profile.lives),
            CollisionVolume { radius: profile.radius },
        ),
        (
            MotionSlot::default(),
            Interruption::default(),
            profile.interruption.clone(),
            profile.anchors.clone(),
            Grabbable,
        ),
        (
            VisionCone::new(&profile.perception),
            BehaviorMachine::new(profile.behavior.state_duration_min),
            profile.behavior.clone(),
            CombatMachine::default(),
            profile.combat.clone(),
        ),
    ));

    if profile.uses_navigation() {
        entity.insert(NavigationAgent {
            speed: profile.behavior.move_speed,
            ..default()
        });
    }

    let id = entity.id();
    crate::log_info(&format!("👾 spawned {:?} {:?} at {:?}", profile.kind, id, position));
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::CombatConfig;
    use crate::interruption::ThrowAnchors;

    #[test]
    fn test_spawn_assembles_all_machines() {
        let mut world = World::new();
        let slimoeil = EnemyProfile::for_kind(EnemyKind::Slimoeil);
        let seeker = EnemyProfile::for_kind(EnemyKind::Seeker);

        let (ground, flying) = {
            let mut commands = world.commands();
            (
                spawn_enemy(&mut commands, &slimoeil, Vec3::new(1.0, 0.5, 2.0), PatrolRoute::default()),
                spawn_enemy(&mut commands, &seeker, Vec3::ZERO, PatrolRoute::new(vec![Vec3::X])),
            )
        };
        world.flush();

        let entity = world.entity(ground);
        assert_eq!(entity.get::<Enemy>().map(|e| e.kind), Some(EnemyKind::Slimoeil));
        assert_eq!(entity.get::<Origin>().map(|o| o.position), Some(Vec3::new(1.0, 0.5, 2.0)));
        assert_eq!(entity.get::<Life>().map(|l| l.current), Some(3));
        assert!(entity.get::<NavigationAgent>().is_some());
        assert!(entity.get::<Grabbable>().is_some());
        assert_eq!(entity.get::<ThrowAnchors>(), Some(&ThrowAnchors::all()));

        let entity = world.entity(flying);
        assert!(entity.get::<NavigationAgent>().is_none());
        assert!(entity.get::<CombatConfig>().is_some_and(|c| c.style.is_ranged()));
        assert_eq!(entity.get::<PatrolRoute>().map(|r| r.points.len()), Some(1));
    }
}
