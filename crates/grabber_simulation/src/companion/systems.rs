//! Companion systems: реакция на скилл игрока + следование по слотам

use bevy::prelude::*;

use super::components::{choose_slot, step_towards, Companion, CompanionConfig, CompanionMode, CompanionPerch, RecoilArc};
use crate::components::Player;
use crate::grab_skill::{AimModeChanged, SelectionChanged, ThrowResolved};
use crate::motion::face_towards;
use crate::movement::DoubleJumped;
use crate::spatial::{SpatialQueryService, LAYER_ENVIRONMENT};
use crate::visual::{motion_state, EffectId, EffectRequested, MotionStateRequested};

/// Система: события скилла и прыжков → режим companion'а
pub fn react_to_player_skill(
    mut aim_changes: EventReader<AimModeChanged>,
    mut selections: EventReader<SelectionChanged>,
    mut throws: EventReader<ThrowResolved>,
    mut jumps: EventReader<DoubleJumped>,
    player: Query<(Entity, &Transform), (With<Player>, Without<Companion>)>,
    targets: Query<(&Transform, Option<&CompanionPerch>), (Without<Companion>, Without<Player>)>,
    mut companions: Query<(Entity, &mut Transform, &mut Companion, &CompanionConfig), Without<Player>>,
    mut motion_states: EventWriter<MotionStateRequested>,
    mut effects: EventWriter<EffectRequested>,
) {
    let Ok((player_entity, player_transform)) = player.single() else {
        aim_changes.clear();
        selections.clear();
        throws.clear();
        jumps.clear();
        return;
    };

    let aim_changes: Vec<AimModeChanged> = aim_changes.read().copied().collect();
    let selections: Vec<SelectionChanged> = selections.read().copied().collect();
    let throws: Vec<ThrowResolved> = throws.read().copied().collect();
    let jumped = jumps.read().any(|jump| jump.entity == player_entity);

    for (entity, mut transform, mut companion, config) in companions.iter_mut() {
        for change in &aim_changes {
            if change.aiming {
                if matches!(companion.mode, CompanionMode::Recoil(_)) {
                    continue;
                }
                effects.write(EffectRequested {
                    effect: EffectId::CompanionTeleport,
                    position: transform.translation,
                });
                companion.mode = CompanionMode::PinnedToAim;
                companion.moving = false;
                motion_states.write(MotionStateRequested::flag(entity, motion_state::MOVING, false));
                pin_to_aim(&mut transform, player_transform, config);
            } else if companion.is_aiming() {
                companion.mode = CompanionMode::Following;
                companion.poll_slot_now();
            }
        }

        for selection in &selections {
            if !companion.is_aiming() {
                continue;
            }
            match selection.selected {
                Some(target) => {
                    let Ok((target_transform, perch)) = targets.get(target) else {
                        continue;
                    };
                    let offset = perch.map_or(config.perch_offset, |perch| perch.offset);
                    effects.write(EffectRequested {
                        effect: EffectId::CompanionTeleport,
                        position: transform.translation,
                    });
                    transform.translation = target_transform.translation + offset;
                    face_towards(&mut transform, player_transform.translation);
                    effects.write(EffectRequested {
                        effect: EffectId::CompanionTeleport,
                        position: transform.translation,
                    });
                    companion.mode = CompanionMode::AttachedToTarget(target);
                }
                None => {
                    if matches!(companion.mode, CompanionMode::AttachedToTarget(_)) {
                        effects.write(EffectRequested {
                            effect: EffectId::CompanionTeleport,
                            position: transform.translation,
                        });
                        companion.mode = CompanionMode::PinnedToAim;
                    }
                }
            }
        }

        for throw in &throws {
            let arc = RecoilArc::from_throw(
                transform.translation,
                throw.direction,
                config.recoil_distance,
                config.recoil_duration,
            );
            crate::log(&format!("{:?} recoils after throw of {:?}", entity, throw.target));
            companion.mode = CompanionMode::Recoil(arc);
            companion.interactable = false;
            motion_states.write(MotionStateRequested::flag(entity, motion_state::RECOIL, true));
            effects.write(EffectRequested {
                effect: EffectId::CompanionRecoil,
                position: transform.translation,
            });
        }

        if jumped {
            // Чисто косметика: режим и позиция не меняются
            companion.start_swirl(config.swirl_duration);
            motion_states.write(MotionStateRequested::flag(entity, motion_state::SWIRL, true));
            effects.write(EffectRequested {
                effect: EffectId::CompanionDoubleJump,
                position: transform.translation,
            });
        }
    }
}

/// Система: позиция companion'а (единственный writer)
pub fn drive_companion(
    time: Res<Time<Fixed>>,
    spatial: Res<SpatialQueryService>,
    player: Query<&Transform, (With<Player>, Without<Companion>)>,
    targets: Query<(&Transform, Option<&CompanionPerch>), (Without<Companion>, Without<Player>)>,
    mut companions: Query<(Entity, &mut Transform, &mut Companion, &CompanionConfig), Without<Player>>,
    mut motion_states: EventWriter<MotionStateRequested>,
) {
    let dt = time.delta();
    let Ok(player_transform) = player.single() else {
        return;
    };

    for (entity, mut transform, mut companion, config) in companions.iter_mut() {
        let companion = &mut *companion;
        if companion.tick_swirl(dt) {
            motion_states.write(MotionStateRequested::flag(entity, motion_state::SWIRL, false));
        }

        match companion.mode {
            CompanionMode::PinnedToAim => {
                pin_to_aim(&mut transform, player_transform, config);
            }
            CompanionMode::AttachedToTarget(target) => match targets.get(target) {
                Ok((target_transform, perch)) => {
                    let offset = perch.map_or(config.perch_offset, |perch| perch.offset);
                    transform.translation = target_transform.translation + offset;
                }
                Err(_) => {
                    // Цель исчезла посреди aim
                    companion.mode = CompanionMode::PinnedToAim;
                    pin_to_aim(&mut transform, player_transform, config);
                }
            },
            CompanionMode::Recoil(ref mut arc) => {
                let (next, done) = arc.advance(dt);
                if !spatial.overlap_sphere(next, config.radius, LAYER_ENVIRONMENT) {
                    transform.translation = next;
                }
                if done {
                    companion.mode = CompanionMode::Following;
                    companion.interactable = true;
                    companion.poll_slot_now();
                    motion_states.write(MotionStateRequested::flag(entity, motion_state::RECOIL, false));
                }
            }
            CompanionMode::Following => {
                if companion.slot_poll_due(dt) {
                    let slot = choose_slot(&**spatial, player_transform, config);
                    if slot != companion.slot {
                        crate::log(&format!("{:?} follow slot {:?} → {:?}", entity, companion.slot, slot));
                        companion.slot = slot;
                    }
                }

                let anchor = player_transform.translation + player_transform.rotation * config.slot_offset(companion.slot);
                let distance = transform.translation.distance(anchor);
                let moving = distance > config.min_follow_distance;
                if moving {
                    let speed = config.follow_speed(distance);
                    transform.translation = step_towards(transform.translation, anchor, speed * dt.as_secs_f32());
                    face_towards(&mut transform, anchor);
                }
                if moving != companion.moving {
                    companion.moving = moving;
                    motion_states.write(MotionStateRequested::flag(entity, motion_state::MOVING, moving));
                }
            }
        }
    }
}

fn pin_to_aim(transform: &mut Transform, player: &Transform, config: &CompanionConfig) {
    transform.translation = player.translation + player.rotation * config.aim_offset;
    transform.rotation = player.rotation;
}
