//! Behavior FSM systems (weighted transitions, arrival handling).

use bevy::prelude::*;
use rand::Rng;

use crate::ai::{annulus_point, draw_weighted_state, random_duration, BehaviorConfig, BehaviorMachine, BehaviorState};
use crate::combat::CombatMachine;
use crate::components::{Origin, PatrolRoute};
use crate::interruption::{Dead, Interruption};
use crate::motion::{face_towards, MotionSlot, MotionTask, TravelTask};
use crate::visual::{motion_state, MotionStateRequested};
use crate::DeterministicRng;

/// Куда ехать в новом состоянии. `None` = state change пропускается (нет точек).
fn destination_for(
    state: BehaviorState,
    position: Vec3,
    origin: &Origin,
    route: Option<&PatrolRoute>,
    machine: &BehaviorMachine,
    config: &BehaviorConfig,
    rng: &mut impl Rng,
) -> Option<Vec3> {
    match state {
        BehaviorState::Idle => Some(position),
        BehaviorState::Wandering => Some(annulus_point(
            rng,
            origin.position,
            config.wander_min_distance,
            config.wander_max_distance,
        )),
        BehaviorState::Searching => route.and_then(|route| route.point(machine.patrol_index)),
        BehaviorState::ReturnToOrigin => Some(origin.position),
    }
}

/// Войти в состояние: cancel старой routine → старт новой
pub(crate) fn enter_state(
    entity: Entity,
    state: BehaviorState,
    destination: Vec3,
    machine: &mut BehaviorMachine,
    motion: &mut MotionSlot,
    config: &BehaviorConfig,
    motion_states: &mut EventWriter<MotionStateRequested>,
) {
    machine.cancel_travel(motion);
    machine.state = state;
    machine.destination = destination;

    let moving = match state.arrival_check_interval() {
        Some(interval) => {
            let travel = TravelTask::new(
                destination,
                config.move_speed,
                interval,
                config.arrival_threshold_sq,
                config.travel_mode,
            );
            machine.travel = Some(motion.start(MotionTask::Travel(travel)));
            true
        }
        None => false,
    };

    motion_states.write(MotionStateRequested::flag(entity, motion_state::MOVING, moving));
}

/// Система: countdown → weighted draw → новый state
///
/// Машина заморожена целиком (таймер тоже) пока враг не Free или в бою.
pub fn behavior_transitions(
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    mut enemies: Query<
        (
            Entity,
            &Transform,
            &mut BehaviorMachine,
            &BehaviorConfig,
            &Origin,
            Option<&PatrolRoute>,
            &mut MotionSlot,
            &Interruption,
            Option<&CombatMachine>,
        ),
        Without<Dead>,
    >,
    mut motion_states: EventWriter<MotionStateRequested>,
) {
    let dt = time.delta();

    for (entity, transform, mut machine, config, origin, route, mut motion, interruption, combat) in
        enemies.iter_mut()
    {
        if !interruption.allows_autonomy() || combat.is_some_and(|c| c.is_aggressive()) {
            continue;
        }

        machine.change_timer.tick(dt);
        if !machine.change_timer.finished() {
            continue;
        }

        let next_timer = random_duration(&mut rng.rng, config.state_duration_min, config.state_duration_max);
        machine.restart_timer(next_timer);

        let roll = rng.rng.gen_range(0..100);
        let Some(state) = draw_weighted_state(&config.weights, roll) else {
            crate::log_warning(&format!("{:?}: behavior weights are empty, state change skipped", entity));
            continue;
        };

        let Some(destination) = destination_for(
            state,
            transform.translation,
            origin,
            route,
            &machine,
            config,
            &mut rng.rng,
        ) else {
            crate::log_warning(&format!("{:?}: {:?} drawn without patrol points, state change skipped", entity, state));
            continue;
        };

        crate::log(&format!(
            "{:?}: behavior {:?} → {:?} (roll {}, next draw in {:.1}s)",
            entity, machine.state, state, roll, next_timer
        ));
        enter_state(entity, state, destination, &mut machine, &mut motion, config, &mut motion_states);
    }
}

/// Система: реакция на прибытие (arrival flag выставляет locomotion)
///
/// Wandering/ReturnToOrigin → Idle; Searching → пауза на точке, потом следующая точка маршрута.
pub fn behavior_arrivals(
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    mut enemies: Query<
        (
            Entity,
            &mut Transform,
            &mut BehaviorMachine,
            &BehaviorConfig,
            Option<&PatrolRoute>,
            &mut MotionSlot,
            &Interruption,
            Option<&CombatMachine>,
        ),
        Without<Dead>,
    >,
    mut motion_states: EventWriter<MotionStateRequested>,
) {
    let dt = time.delta();

    for (entity, mut transform, mut machine, config, route, mut motion, interruption, combat) in enemies.iter_mut()
    {
        if !interruption.allows_autonomy() || combat.is_some_and(|c| c.is_aggressive()) {
            continue;
        }
        let Some(handle) = machine.travel else {
            continue;
        };
        let Some(travel) = motion.travel(handle) else {
            // Routine отменили снаружи (grab, погоня) - забываем handle
            machine.travel = None;
            machine.dwell = None;
            continue;
        };
        if !travel.arrived {
            continue;
        }

        match machine.state {
            BehaviorState::Wandering | BehaviorState::ReturnToOrigin => {
                let here = transform.translation;
                enter_state(
                    entity,
                    BehaviorState::Idle,
                    here,
                    &mut machine,
                    &mut motion,
                    config,
                    &mut motion_states,
                );
            }
            BehaviorState::Searching => {
                let Some(route) = route.filter(|r| !r.is_empty()) else {
                    machine.cancel_travel(&mut motion);
                    continue;
                };

                let Some(dwell) = machine.dwell.as_mut() else {
                    let seconds = random_duration(&mut rng.rng, config.search_dwell_min, config.search_dwell_max);
                    machine.dwell = Some(Timer::from_seconds(seconds, TimerMode::Once));
                    motion_states.write(MotionStateRequested::flag(entity, motion_state::MOVING, false));
                    continue;
                };
                dwell.tick(dt);
                if !dwell.finished() {
                    continue;
                }

                machine.patrol_index = route.next_index(machine.patrol_index);
                let Some(next) = route.point(machine.patrol_index) else {
                    continue;
                };
                face_towards(&mut transform, next);
                enter_state(
                    entity,
                    BehaviorState::Searching,
                    next,
                    &mut machine,
                    &mut motion,
                    config,
                    &mut motion_states,
                );
            }
            BehaviorState::Idle => {
                machine.cancel_travel(&mut motion);
            }
        }
    }
}
