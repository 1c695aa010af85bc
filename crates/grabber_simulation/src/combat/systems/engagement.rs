//! Combat FSM systems: detection → pursuit → telegraph → attack → cooldown → disengage.

use bevy::prelude::*;

use crate::ai::{BehaviorConfig, BehaviorMachine};
use crate::combat::projectile::projectile_for;
use crate::combat::{evaluate_engagement, AttackStyle, CombatConfig, CombatMachine, CombatPhase, Engagement, PlayerDamaged};
use crate::components::{CollisionVolume, Player};
use crate::interruption::{DazeSeverity, Dead, Interruption, InterruptionChanged, InterruptionTransition};
use crate::motion::{face_towards, MotionSlot, MotionTask, TravelTask};
use crate::perception::{TargetDetected, VisionCone};
use crate::visual::{motion_state, EffectId, EffectRequested, MotionStateRequested};

/// Как часто погоня перепроверяет дистанцию до точки (секунды)
const CHASE_CHECK_INTERVAL: f32 = 0.3;

/// Высота вылета снаряда над pivot'ом
const MUZZLE_HEIGHT: f32 = 0.5;

/// Система: rising edge perception → Unaware → Pursuing
pub fn engage_on_detection(
    mut detections: EventReader<TargetDetected>,
    mut enemies: Query<(&mut CombatMachine, &mut BehaviorMachine, &mut MotionSlot, &Interruption), Without<Dead>>,
    mut motion_states: EventWriter<MotionStateRequested>,
) {
    for detection in detections.read() {
        let Ok((mut machine, mut behavior, mut motion, interruption)) = enemies.get_mut(detection.observer) else {
            continue;
        };
        // Только movement-capable, не dazed, не grabbed
        if !interruption.allows_autonomy() {
            continue;
        }
        if machine.engage(detection.target) {
            crate::log_info(&format!("⚔️ {:?} engages {:?}", detection.observer, detection.target));
            // Wander/patrol routine не должна пережить вход в бой
            if behavior.cancel_travel(&mut motion) {
                motion_states.write(MotionStateRequested::flag(detection.observer, motion_state::MOVING, false));
            }
            motion_states.write(MotionStateRequested::flag(detection.observer, motion_state::AGGRESSIVE, true));
        }
    }
}

/// Система: реакция боевой машины на interruption protocol
///
/// Любое прерывание срывает telegraph. После Thrown daze - полный выход из боя,
/// после Hit daze - продолжаем погоню.
pub fn react_to_interruptions(
    mut changes: EventReader<InterruptionChanged>,
    mut enemies: Query<(&mut CombatMachine, &mut BehaviorMachine, &BehaviorConfig, Option<&mut VisionCone>)>,
    mut motion_states: EventWriter<MotionStateRequested>,
) {
    for change in changes.read() {
        let Ok((mut machine, mut behavior, behavior_config, vision)) = enemies.get_mut(change.entity) else {
            continue;
        };

        match change.transition {
            InterruptionTransition::Grabbed { .. }
            | InterruptionTransition::Thrown { .. }
            | InterruptionTransition::KnockedBack { .. }
            | InterruptionTransition::Falling
            | InterruptionTransition::Dazed(_)
            | InterruptionTransition::Damaged { .. } => {
                if machine.interrupt() {
                    crate::log(&format!("{:?}: attack interrupted by {:?}", change.entity, change.transition));
                    motion_states.write(MotionStateRequested::flag(change.entity, motion_state::TELEGRAPH, false));
                }
            }
            InterruptionTransition::Recovered(DazeSeverity::Thrown) | InterruptionTransition::Died(_) => {
                if machine.is_aggressive() {
                    machine.disengage();
                    behavior.resume_soon(behavior_config.resume_delay);
                    if let Some(mut vision) = vision {
                        vision.forget();
                    }
                    motion_states.write(MotionStateRequested::flag(change.entity, motion_state::AGGRESSIVE, false));
                    motion_states.write(MotionStateRequested::flag(change.entity, motion_state::SEARCHING, false));
                }
            }
            InterruptionTransition::Recovered(DazeSeverity::Hit) | InterruptionTransition::Released => {
                if machine.is_aggressive() {
                    machine.phase = CombatPhase::Pursuing;
                }
            }
        }
    }
}

/// Система: основной тик боевой машины
pub fn update_combat(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    player: Query<(&Transform, Option<&CollisionVolume>), With<Player>>,
    mut enemies: Query<
        (
            Entity,
            &mut Transform,
            &mut CombatMachine,
            &CombatConfig,
            &VisionCone,
            &mut MotionSlot,
            &Interruption,
            &mut BehaviorMachine,
            &BehaviorConfig,
        ),
        (Without<Dead>, Without<Player>),
    >,
    mut damaged: EventWriter<PlayerDamaged>,
    mut motion_states: EventWriter<MotionStateRequested>,
    mut effects: EventWriter<EffectRequested>,
) {
    let dt = time.delta();
    let player = player.single().ok();

    for (entity, mut transform, mut machine, config, vision, mut motion, interruption, mut behavior, behavior_config) in
        enemies.iter_mut()
    {
        if !machine.is_aggressive() || !interruption.allows_autonomy() {
            continue;
        }

        let Some((player_transform, player_volume)) = player else {
            disengage(entity, &mut machine, &mut motion, &mut behavior, behavior_config, &mut motion_states);
            continue;
        };
        let player_position = player_transform.translation;
        let distance = transform.translation.distance(player_position);
        let engagement = evaluate_engagement(vision.time_since_seen(), distance, config);

        match machine.phase {
            CombatPhase::Unaware => {}
            CombatPhase::Pursuing => {
                behavior.cancel_travel(&mut motion);
                match engagement {
                    Engagement::Disengage => {
                        crate::log_info(&format!(
                            "{:?} disengages (unseen {:.1}s, distance {:.1})",
                            entity,
                            vision.time_since_seen().as_secs_f32(),
                            distance
                        ));
                        disengage(entity, &mut machine, &mut motion, &mut behavior, behavior_config, &mut motion_states);
                        continue;
                    }
                    Engagement::Searching => {
                        if !machine.search_cue_shown {
                            machine.search_cue_shown = true;
                            motion_states.write(MotionStateRequested::flag(entity, motion_state::SEARCHING, true));
                        }
                    }
                    Engagement::Engaged => {
                        if machine.search_cue_shown && vision.is_visible() {
                            machine.search_cue_shown = false;
                            motion_states.write(MotionStateRequested::flag(entity, motion_state::SEARCHING, false));
                        }
                    }
                }

                let last_known = vision.last_seen_at().unwrap_or(player_position);
                let in_range = vision.is_visible() && distance <= config.attack_range;

                if config.style.is_ranged() {
                    // Ranged не преследует: разворачивается и стреляет с места
                    stop_chase(&mut machine, &mut motion);
                    face_towards(&mut transform, last_known);
                } else if !in_range {
                    let chase_point = if vision.is_visible() { player_position } else { last_known };
                    chase(&mut machine, &mut motion, config, chase_point);
                }

                if in_range {
                    stop_chase(&mut machine, &mut motion);
                    face_towards(&mut transform, last_known);
                    machine.begin_telegraph(last_known, config.telegraph);
                    motion_states.write(MotionStateRequested::flag(entity, motion_state::TELEGRAPH, true));
                    effects.write(EffectRequested {
                        effect: EffectId::Telegraph,
                        position: transform.translation,
                    });
                }
            }
            CombatPhase::Telegraphing | CombatPhase::Attacking => {
                // Потеря/возврат видимости telegraph не прерывает
                if machine.phase == CombatPhase::Telegraphing {
                    if !machine.tick_phase(dt) {
                        continue;
                    }
                    machine.phase = CombatPhase::Attacking;
                    motion_states.write(MotionStateRequested::flag(entity, motion_state::TELEGRAPH, false));
                }

                motion_states.write(MotionStateRequested::flag(entity, motion_state::ATTACK, true));
                match config.style {
                    AttackStyle::Melee { reach, radius, damage } => {
                        let strike_point = transform.translation + *transform.forward() * reach;
                        let player_radius = player_volume.copied().unwrap_or_default().radius;
                        if strike_point.distance(player_position) <= radius + player_radius {
                            crate::log_info(&format!("🗡️ {:?} hits player ({} dmg)", entity, damage));
                            damaged.write(PlayerDamaged {
                                amount: damage,
                                source: entity,
                            });
                        } else {
                            crate::log(&format!("{:?} melee swing missed", entity));
                        }
                    }
                    AttackStyle::Ranged { .. } => {
                        let muzzle = transform.translation + Vec3::Y * MUZZLE_HEIGHT + *transform.forward() * 0.5;
                        if let Some(projectile) = projectile_for(&config.style, entity, muzzle, machine.aim_point) {
                            commands.spawn((Transform::from_translation(muzzle), projectile));
                            effects.write(EffectRequested {
                                effect: EffectId::ProjectileLaunch,
                                position: muzzle,
                            });
                        }
                    }
                }
                machine.begin_cooldown(config.cooldown);
            }
            CombatPhase::Cooldown => {
                if !machine.tick_phase(dt) {
                    continue;
                }
                motion_states.write(MotionStateRequested::flag(entity, motion_state::ATTACK, false));
                if engagement == Engagement::Disengage {
                    disengage(entity, &mut machine, &mut motion, &mut behavior, behavior_config, &mut motion_states);
                } else {
                    machine.phase = CombatPhase::Pursuing;
                }
            }
        }
    }
}

/// Погоня: travel routine к точке (retarget если уже едем)
fn chase(machine: &mut CombatMachine, motion: &mut MotionSlot, config: &CombatConfig, point: Vec3) {
    if let Some(travel) = machine.chase.and_then(|handle| motion.travel_mut(handle)) {
        if travel.destination.distance_squared(point) > 0.01 {
            travel.retarget(point);
        }
        return;
    }

    let threshold = config.attack_range * 0.5;
    let travel = TravelTask::new(
        point,
        config.chase_speed,
        CHASE_CHECK_INTERVAL,
        threshold * threshold,
        config.chase_mode,
    );
    machine.chase = Some(motion.start(MotionTask::Travel(travel)));
}

fn stop_chase(machine: &mut CombatMachine, motion: &mut MotionSlot) {
    if let Some(handle) = machine.chase.take() {
        motion.cancel_if(handle);
    }
}

fn disengage(
    entity: Entity,
    machine: &mut CombatMachine,
    motion: &mut MotionSlot,
    behavior: &mut BehaviorMachine,
    behavior_config: &BehaviorConfig,
    motion_states: &mut EventWriter<MotionStateRequested>,
) {
    if let Some(handle) = machine.disengage() {
        motion.cancel_if(handle);
    }
    behavior.resume_soon(behavior_config.resume_delay);
    motion_states.write(MotionStateRequested::flag(entity, motion_state::AGGRESSIVE, false));
    motion_states.write(MotionStateRequested::flag(entity, motion_state::SEARCHING, false));
    motion_states.write(MotionStateRequested::flag(entity, motion_state::MOVING, false));
}
