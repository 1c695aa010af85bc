//! Interruption systems: входящие удары, тик протокола, visual cues, смерть

use bevy::prelude::*;

use super::components::{Dead, DespawnAfter, Interruption, InterruptionConfig};
use super::protocol::{InterruptionTransition, PhysicalBody};
use super::{DashHit, EnemyHit, InterruptionChanged, Stomped};
use crate::components::{CollisionVolume, Life, Origin};
use crate::motion::MotionSlot;
use crate::spatial::SpatialQueryService;
use crate::visual::{motion_state, EffectId, EffectRequested, MotionStateRequested};

/// Компоненты, из которых собирается `PhysicalBody`
pub type BodyData = (
    Entity,
    &'static mut Transform,
    &'static mut Interruption,
    &'static mut Life,
    &'static mut MotionSlot,
    &'static InterruptionConfig,
    Option<&'static CollisionVolume>,
);

pub(crate) fn body_radius(volume: Option<&CollisionVolume>) -> f32 {
    volume.copied().unwrap_or_default().radius
}

/// Система: EnemyHit → receive_damage
pub fn apply_enemy_hits(
    mut hits: EventReader<EnemyHit>,
    mut bodies: Query<BodyData>,
    mut changed: EventWriter<InterruptionChanged>,
    mut effects: EventWriter<EffectRequested>,
) {
    for hit in hits.read() {
        let Ok((entity, mut transform, mut interruption, mut life, mut motion, config, volume)) =
            bodies.get_mut(hit.target)
        else {
            continue;
        };

        let mut body = PhysicalBody::new(
            entity,
            &mut transform,
            &mut interruption,
            &mut life,
            &mut motion,
            config,
            body_radius(volume),
        );
        let outcome = body.receive_damage(hit.point);
        if !outcome.accepted() {
            continue;
        }

        effects.write(EffectRequested {
            effect: EffectId::HitFlash,
            position: hit.point,
        });
        if let Some(transition) = outcome.transition() {
            changed.write(InterruptionChanged { entity, transition });
        }
    }
}

/// Система: DashHit → knockback
pub fn apply_dash_hits(
    mut hits: EventReader<DashHit>,
    mut bodies: Query<BodyData>,
    mut changed: EventWriter<InterruptionChanged>,
) {
    for hit in hits.read() {
        let Ok((entity, mut transform, mut interruption, mut life, mut motion, config, volume)) =
            bodies.get_mut(hit.target)
        else {
            continue;
        };

        let mut body = PhysicalBody::new(
            entity,
            &mut transform,
            &mut interruption,
            &mut life,
            &mut motion,
            config,
            body_radius(volume),
        );
        if let Some(transition) = body.knockback(hit.from) {
            changed.write(InterruptionChanged { entity, transition });
        }
    }
}

/// Система: Stomped → урон + bounce
pub fn apply_stomps(
    mut stomps: EventReader<Stomped>,
    mut bodies: Query<BodyData>,
    mut changed: EventWriter<InterruptionChanged>,
    mut effects: EventWriter<EffectRequested>,
) {
    for stomp in stomps.read() {
        let Ok((entity, mut transform, mut interruption, mut life, mut motion, config, volume)) =
            bodies.get_mut(stomp.target)
        else {
            continue;
        };

        let mut body = PhysicalBody::new(
            entity,
            &mut transform,
            &mut interruption,
            &mut life,
            &mut motion,
            config,
            body_radius(volume),
        );
        let outcome = body.stomp(stomp.point);
        if body.interruption.is_dead() && !outcome.accepted() {
            continue;
        }

        effects.write(EffectRequested {
            effect: EffectId::Impact,
            position: stomp.point,
        });
        if let Some(transition) = outcome.transition() {
            changed.write(InterruptionChanged { entity, transition });
        }
    }
}

/// Система: тик протокола (flight, fall, daze, immunity)
pub fn advance_interruptions(
    time: Res<Time<Fixed>>,
    spatial: Res<SpatialQueryService>,
    mut bodies: Query<BodyData>,
    mut changed: EventWriter<InterruptionChanged>,
) {
    let dt = time.delta();

    for (entity, mut transform, mut interruption, mut life, mut motion, config, volume) in bodies.iter_mut() {
        let mut body = PhysicalBody::new(
            entity,
            &mut transform,
            &mut interruption,
            &mut life,
            &mut motion,
            config,
            body_radius(volume),
        );
        if let Some(transition) = body.tick(dt, &**spatial) {
            changed.write(InterruptionChanged { entity, transition });
        }
    }
}

/// Система: Recovered → телепорт домой / подъём летающего
pub fn relocate_after_daze(
    spatial: Res<SpatialQueryService>,
    mut changed: EventReader<InterruptionChanged>,
    mut bodies: Query<(BodyData, &Origin)>,
    mut effects: EventWriter<EffectRequested>,
) {
    for event in changed.read() {
        if !matches!(event.transition, InterruptionTransition::Recovered(_)) {
            continue;
        }
        let Ok(((entity, mut transform, mut interruption, mut life, mut motion, config, volume), origin)) =
            bodies.get_mut(event.entity)
        else {
            continue;
        };

        let mut body = PhysicalBody::new(
            entity,
            &mut transform,
            &mut interruption,
            &mut life,
            &mut motion,
            config,
            body_radius(volume),
        );
        if let Some(position) = body.relocate_after_daze(origin.position, &**spatial) {
            effects.write(EffectRequested {
                effect: EffectId::Pouf,
                position,
            });
        }
    }
}

/// Система: transition → motion state флаги + эффекты
pub fn publish_interruption_cues(
    mut changed: EventReader<InterruptionChanged>,
    transforms: Query<&Transform>,
    mut motion_states: EventWriter<MotionStateRequested>,
    mut effects: EventWriter<EffectRequested>,
) {
    for event in changed.read() {
        let entity = event.entity;
        let position = transforms.get(entity).map(|t| t.translation).unwrap_or_default();
        let flag = |name, on| MotionStateRequested::flag(entity, name, on);

        match event.transition {
            InterruptionTransition::Grabbed { .. } => {
                motion_states.write(flag(motion_state::MOVING, false));
                motion_states.write(flag(motion_state::DAZED, false));
                motion_states.write(flag(motion_state::GRABBED, true));
            }
            InterruptionTransition::Released => {
                motion_states.write(flag(motion_state::GRABBED, false));
            }
            InterruptionTransition::Thrown { .. } | InterruptionTransition::KnockedBack { .. } => {
                motion_states.write(flag(motion_state::GRABBED, false));
                motion_states.write(flag(motion_state::THROWN, true));
            }
            InterruptionTransition::Falling => {
                motion_states.write(flag(motion_state::THROWN, false));
                motion_states.write(flag(motion_state::FALLING, true));
            }
            InterruptionTransition::Dazed(_) => {
                motion_states.write(flag(motion_state::THROWN, false));
                motion_states.write(flag(motion_state::FALLING, false));
                motion_states.write(flag(motion_state::DAZED, true));
                effects.write(EffectRequested {
                    effect: EffectId::Confused,
                    position,
                });
            }
            InterruptionTransition::Recovered(_) => {
                motion_states.write(flag(motion_state::DAZED, false));
            }
            InterruptionTransition::Damaged { .. } => {
                motion_states.write(flag(motion_state::HIT, true));
            }
            InterruptionTransition::Died(_) => {
                motion_states.write(flag(motion_state::DEAD, true));
                effects.write(EffectRequested {
                    effect: EffectId::Death,
                    position,
                });
            }
        }
    }
}

/// Система: затухание hit flash → scalar motion state
pub fn publish_hit_flash(
    mut bodies: Query<(Entity, &mut Interruption)>,
    mut motion_states: EventWriter<MotionStateRequested>,
) {
    for (entity, mut interruption) in bodies.iter_mut() {
        if interruption.flash.is_none() {
            continue;
        }
        if let Some(level) = interruption.flash_level() {
            motion_states.write(MotionStateRequested::scalar(entity, motion_state::HIT_FLASH, level));
        }
    }
}

/// Система: Died → Dead marker + отложенный despawn
pub fn mark_dead(
    mut commands: Commands,
    mut changed: EventReader<InterruptionChanged>,
    configs: Query<&InterruptionConfig>,
) {
    for event in changed.read() {
        let InterruptionTransition::Died(cause) = event.transition else {
            continue;
        };
        let delay = configs
            .get(event.entity)
            .map(|config| config.despawn_delay)
            .unwrap_or_else(|_| InterruptionConfig::default().despawn_delay);

        if let Ok(mut entity) = commands.get_entity(event.entity) {
            entity.insert((Dead, DespawnAfter::seconds(delay)));
            crate::log_info(&format!("💀 {:?} died ({:?}), despawn in {:.1}s", event.entity, cause, delay));
        }
    }
}

/// Система: удалить мёртвых после задержки
pub fn despawn_dead(time: Res<Time<Fixed>>, mut commands: Commands, mut pending: Query<(Entity, &mut DespawnAfter)>) {
    for (entity, mut despawn) in pending.iter_mut() {
        despawn.timer.tick(time.delta());
        if despawn.timer.finished() {
            commands.entity(entity).despawn();
        }
    }
}
