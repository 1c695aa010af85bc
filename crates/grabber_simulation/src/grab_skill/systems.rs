//! Grab skill systems: кандидаты, ввод, удержание

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::components::{CameraRig, GrabSkill, GrabSkillConfig, Grabbable, SelectionChange};
use super::events::{
    AimModeChanged, AxisPreviewRequested, CandidateEvent, CandidateEventKind, SelectionChanged, SkillInput,
    ThrowResolved,
};
use crate::components::{Player, PlayerLocomotion};
use crate::interruption::systems::{body_radius, BodyData};
use crate::interruption::{Interruption, InterruptionChanged, InterruptionTransition, PhysicalBody, ThrowAnchors};
use crate::perception::has_line_of_sight;
use crate::spatial::SpatialQueryService;
use crate::visual::{motion_state, EffectId, EffectRequested, MotionStateRequested};

/// Тела, которые скилл может схватить (player исключён для disjoint доступа)
type GrabTargets = (BodyData, &'static ThrowAnchors);
type GrabTargetFilter = (With<Grabbable>, Without<Player>);

/// Всё, что скилл сообщает наружу
#[derive(SystemParam)]
pub struct SkillSignals<'w> {
    pub aim_changes: EventWriter<'w, AimModeChanged>,
    pub selections: EventWriter<'w, SelectionChanged>,
    pub previews: EventWriter<'w, AxisPreviewRequested>,
    pub throws: EventWriter<'w, ThrowResolved>,
    pub interruptions: EventWriter<'w, InterruptionChanged>,
    pub motion_states: EventWriter<'w, MotionStateRequested>,
    pub effects: EventWriter<'w, EffectRequested>,
}

impl SkillSignals<'_> {
    fn selection(&mut self, player: Entity, change: SelectionChange) {
        if let Some(unselected) = change.unselected {
            self.motion_states
                .write(MotionStateRequested::flag(unselected, motion_state::SELECTED, false));
        }
        if let Some(selected) = change.selected {
            self.motion_states
                .write(MotionStateRequested::flag(selected, motion_state::SELECTED, true));
        }
        self.selections.write(SelectionChanged {
            player,
            unselected: change.unselected,
            selected: change.selected,
        });
    }

    fn selectable(&mut self, candidate: Entity, on: bool) {
        self.motion_states
            .write(MotionStateRequested::flag(candidate, motion_state::SELECTABLE, on));
    }
}

fn grabbable_now(interruption: &Interruption) -> bool {
    interruption.targetable && !interruption.is_dead()
}

/// Система: trigger volumes → visible/possible, зачистка, auto-select
pub fn track_candidates(
    time: Res<Time<Fixed>>,
    spatial: Res<SpatialQueryService>,
    rig: Option<Res<CameraRig>>,
    mut events: EventReader<CandidateEvent>,
    mut players: Query<(Entity, &Transform, &mut GrabSkill, &GrabSkillConfig), With<Player>>,
    candidates: Query<(&Transform, &Interruption), GrabTargetFilter>,
    mut signals: SkillSignals,
) {
    let Ok((player, player_transform, mut skill, config)) = players.single_mut() else {
        events.clear();
        return;
    };
    skill.tick(time.delta());
    let eye = CameraRig::eye(rig.as_deref(), player_transform, config);
    let in_range =
        |position: Vec3| position.distance(player_transform.translation) <= config.max_selection_distance;

    for event in events.read() {
        let candidate = event.candidate;
        match event.kind {
            CandidateEventKind::VisibilityEntered => {
                let Ok((transform, interruption)) = candidates.get(candidate) else {
                    continue;
                };
                if !has_line_of_sight(&**spatial, eye, transform.translation) {
                    continue;
                }
                if !grabbable_now(interruption) {
                    // Внутри trigger volume, но пока летит/dazed
                    if !interruption.is_dead() && !skill.suspended.contains(&candidate) {
                        skill.suspended.push(candidate);
                    }
                    continue;
                }
                if skill.on_visibility_entered(candidate) && skill.aiming {
                    signals.selectable(candidate, true);
                    if in_range(transform.translation) {
                        skill.on_range_entered(candidate);
                    }
                }
            }
            CandidateEventKind::VisibilityExited => {
                if skill.aiming && skill.visible.contains(&candidate) {
                    signals.selectable(candidate, false);
                }
                if let Some(change) = skill.on_visibility_exited(candidate) {
                    signals.selection(player, change);
                }
            }
            CandidateEventKind::RangeEntered => {
                skill.on_range_entered(candidate);
            }
            CandidateEventKind::RangeExited => {
                if let Some(change) = skill.on_range_exited(candidate) {
                    signals.selection(player, change);
                }
            }
        }
    }

    // Мёртвые и despawned - больше не кандидаты; живые, но не targetable - ждут recovery
    let held = skill.held;
    let stale: Vec<(Entity, bool)> = skill
        .visible
        .iter()
        .copied()
        .filter(|&e| Some(e) != held)
        .filter_map(|e| match candidates.get(e) {
            Ok((_, interruption)) if grabbable_now(interruption) => None,
            Ok((_, interruption)) => Some((e, !interruption.is_dead())),
            Err(_) => Some((e, false)),
        })
        .collect();
    for (candidate, alive) in stale {
        if skill.aiming {
            signals.selectable(candidate, false);
        }
        let change = if alive {
            skill.suspend_candidate(candidate)
        } else {
            skill.remove_candidate(candidate)
        };
        if let Some(change) = change {
            signals.selection(player, change);
        }
    }

    let suspended = skill.suspended.clone();
    for candidate in suspended {
        let Ok((transform, interruption)) = candidates.get(candidate) else {
            skill.suspended.retain(|&e| e != candidate);
            continue;
        };
        if interruption.is_dead() {
            skill.suspended.retain(|&e| e != candidate);
            continue;
        }
        if !grabbable_now(interruption) || !has_line_of_sight(&**spatial, eye, transform.translation) {
            continue;
        }
        if skill.restore_candidate(candidate) && skill.aiming {
            crate::log(&format!("{:?} is grabbable again", candidate));
            signals.selectable(candidate, true);
            if in_range(transform.translation) {
                skill.on_range_entered(candidate);
            }
        }
    }

    if let Some(change) = skill.auto_select() {
        signals.selection(player, change);
    }
}

/// Система: ввод скилла (aim, переключение, ось, hold, throw, cancel)
pub fn handle_skill_input(
    spatial: Res<SpatialQueryService>,
    rig: Option<Res<CameraRig>>,
    mut inputs: EventReader<SkillInput>,
    mut players: Query<
        (Entity, &Transform, &mut GrabSkill, &mut PlayerLocomotion, &GrabSkillConfig),
        With<Player>,
    >,
    mut bodies: Query<GrabTargets, GrabTargetFilter>,
    mut signals: SkillSignals,
) {
    let Ok((player, player_transform, mut skill, mut locomotion, config)) = players.single_mut() else {
        inputs.clear();
        return;
    };

    for input in inputs.read().copied() {
        match input {
            SkillInput::Aim => {
                if skill.aiming || !locomotion.allows_aim() {
                    continue;
                }
                locomotion.locked = true;
                let eye = CameraRig::eye(rig.as_deref(), player_transform, config);
                let origin = player_transform.translation;
                let selectable = skill.begin_aim(
                    |e| {
                        bodies.get(e).is_ok_and(|((_, transform, interruption, ..), _)| {
                            grabbable_now(interruption) && has_line_of_sight(&**spatial, eye, transform.translation)
                        })
                    },
                    |e| {
                        bodies.get(e).is_ok_and(|((_, transform, ..), _)| {
                            transform.translation.distance(origin) <= config.max_selection_distance
                        })
                    },
                );

                crate::log(&format!("🎯 aim mode on ({} visible, {} in range)", selectable.len(), skill.possible.len()));
                signals.aim_changes.write(AimModeChanged { player, aiming: true });
                for candidate in selectable {
                    signals.selectable(candidate, true);
                }
                if let Some(change) = skill.auto_select() {
                    signals.selection(player, change);
                }
            }
            SkillInput::Cancel => {
                if skill.aiming {
                    exit_aim(player, &mut skill, &mut locomotion, &mut bodies, &mut signals);
                }
            }
            SkillInput::Next | SkillInput::Previous => {
                if skill.held.is_some() {
                    continue;
                }
                let forward = input == SkillInput::Next;
                if let Some(change) = skill.cycle(forward, config.switch_interval) {
                    signals.selection(player, change);
                }
            }
            SkillInput::Axis(axis) => {
                if !skill.aiming {
                    continue;
                }
                if let Some(target) = skill.select_axis(axis) {
                    signals.previews.write(AxisPreviewRequested { target, axis });
                    if let Ok(((_, transform, ..), _)) = bodies.get(target) {
                        signals.effects.write(EffectRequested {
                            effect: EffectId::ThrowAxisPreview,
                            position: transform.translation,
                        });
                    }
                }
            }
            SkillInput::Hold => {
                let (true, None, Some(target)) = (skill.aiming, skill.held, skill.selected) else {
                    continue;
                };
                let Ok(((entity, mut transform, mut interruption, mut life, mut motion, body_config, volume), _)) =
                    bodies.get_mut(target)
                else {
                    continue;
                };
                let mut body = PhysicalBody::new(
                    entity,
                    &mut transform,
                    &mut interruption,
                    &mut life,
                    &mut motion,
                    body_config,
                    body_radius(volume),
                );
                if let Some(transition) = body.grab(player) {
                    skill.held = Some(target);
                    signals.interruptions.write(InterruptionChanged { entity, transition });
                }
            }
            SkillInput::Throw => {
                if !skill.aiming {
                    continue;
                }
                let Some(target) = skill.held.or(skill.selected) else {
                    continue;
                };
                let axis = skill.axis;
                let Ok(((entity, mut transform, mut interruption, mut life, mut motion, body_config, volume), anchors)) =
                    bodies.get_mut(target)
                else {
                    continue;
                };
                let was_held = interruption.holder() == Some(player);
                let mut body = PhysicalBody::new(
                    entity,
                    &mut transform,
                    &mut interruption,
                    &mut life,
                    &mut motion,
                    body_config,
                    body_radius(volume),
                );

                match body.grab_and_throw(player, player_transform.rotation, axis, anchors) {
                    Ok(direction) => {
                        if !was_held {
                            signals.interruptions.write(InterruptionChanged {
                                entity,
                                transition: InterruptionTransition::Grabbed { holder: player },
                            });
                        }
                        signals.interruptions.write(InterruptionChanged {
                            entity,
                            transition: InterruptionTransition::Thrown { axis, direction },
                        });
                        signals.throws.write(ThrowResolved {
                            player,
                            target,
                            axis,
                            direction,
                        });
                        skill.held = None;
                        exit_aim(player, &mut skill, &mut locomotion, &mut bodies, &mut signals);
                    }
                    Err(reason) => {
                        // Aim остаётся, можно выбрать другую ось
                        crate::log_warning(&format!("throw of {:?} rejected: {}", target, reason));
                    }
                }
            }
        }
    }
}

/// Выход из aim: locomotion обратно, визуалы погашены, удерживаемый отпущен
fn exit_aim(
    player: Entity,
    skill: &mut GrabSkill,
    locomotion: &mut PlayerLocomotion,
    bodies: &mut Query<GrabTargets, GrabTargetFilter>,
    signals: &mut SkillSignals,
) {
    let exit = skill.end_aim();
    locomotion.locked = false;

    for candidate in exit.cleared {
        signals.selectable(candidate, false);
    }
    if exit.unselected.is_some() {
        signals.selection(
            player,
            SelectionChange {
                unselected: exit.unselected,
                selected: None,
            },
        );
    }
    if let Some(held) = exit.released {
        if let Ok(((entity, mut transform, mut interruption, mut life, mut motion, config, volume), _)) =
            bodies.get_mut(held)
        {
            let mut body = PhysicalBody::new(
                entity,
                &mut transform,
                &mut interruption,
                &mut life,
                &mut motion,
                config,
                body_radius(volume),
            );
            if let Some(transition) = body.release() {
                signals.interruptions.write(InterruptionChanged { entity, transition });
            }
        }
    }

    crate::log("🎯 aim mode off");
    signals.aim_changes.write(AimModeChanged { player, aiming: false });
}

/// Система: удерживаемая цель следует за игроком (скилл единственный writer позиции)
pub fn carry_held_target(
    mut players: Query<(Entity, &Transform, &mut GrabSkill, &GrabSkillConfig), With<Player>>,
    mut bodies: Query<BodyData, GrabTargetFilter>,
) {
    let Ok((player, player_transform, mut skill, config)) = players.single_mut() else {
        return;
    };
    let Some(held) = skill.held else {
        return;
    };

    let Ok((entity, mut transform, mut interruption, mut life, mut motion, body_config, volume)) = bodies.get_mut(held)
    else {
        skill.held = None;
        return;
    };
    if interruption.holder() != Some(player) {
        // Умер в руках или перехвачен протоколом
        skill.held = None;
        return;
    }

    let hold_point = player_transform.translation + player_transform.rotation * config.hold_offset;
    let mut body = PhysicalBody::new(
        entity,
        &mut transform,
        &mut interruption,
        &mut life,
        &mut motion,
        body_config,
        body_radius(volume),
    );
    body.pin(hold_point, player_transform.rotation);
}
