//! Locomotion systems: travel routine → Transform (steering) или NavigationAgent

use bevy::prelude::*;

use crate::components::{CollisionVolume, NavigationAgent, TravelMode};
use crate::interruption::{Dead, Interruption};
use crate::motion::{face_towards, MotionSlot, MotionTask};
use crate::spatial::SpatialQueryService;

/// Система: шаг активной travel routine
///
/// Arrival poll на своём таймере; steering коммитит шаг только при чистом probe.
/// Navigation режим только пишет destination агенту - двигает движок.
pub fn drive_travel(
    time: Res<Time<Fixed>>,
    spatial: Res<SpatialQueryService>,
    mut movers: Query<
        (
            &mut Transform,
            &mut MotionSlot,
            &Interruption,
            Option<&CollisionVolume>,
            Option<&mut NavigationAgent>,
        ),
        Without<Dead>,
    >,
) {
    let dt = time.delta();

    for (mut transform, mut motion, interruption, volume, mut agent) in movers.iter_mut() {
        let travel = match motion.current_mut() {
            Some(MotionTask::Travel(travel)) if interruption.allows_autonomy() => travel,
            _ => {
                // Нет travel или враг прерван: явная пауза агента
                if let Some(agent) = agent.as_mut().filter(|a| !a.suspended) {
                    agent.suspend();
                }
                continue;
            }
        };

        if travel.poll_arrival(transform.translation, dt) {
            if let Some(agent) = agent.as_mut().filter(|a| !a.suspended) {
                agent.suspend();
            }
            continue;
        }

        match (travel.mode, agent.as_mut()) {
            (TravelMode::Navigation, Some(agent)) => {
                if agent.destination != Some(travel.destination) || agent.suspended {
                    agent.speed = travel.speed;
                    agent.set_destination(travel.destination);
                }
            }
            // Без агента navigation деградирует в steering
            _ => {
                let radius = volume.copied().unwrap_or_default().radius;
                travel.steer(&mut transform, &**spatial, radius, dt);
            }
        }
    }
}

/// Система: headless замена navmesh агента (движение по прямой)
///
/// В игре эту работу делает движок; здесь - для demo и тестов.
pub fn advance_navigation_agents(
    time: Res<Time<Fixed>>,
    mut agents: Query<(&mut Transform, &mut NavigationAgent), Without<Dead>>,
) {
    let dt = time.delta_secs();

    for (mut transform, mut agent) in agents.iter_mut() {
        if agent.suspended {
            continue;
        }
        let Some(destination) = agent.destination else {
            continue;
        };

        let to_destination = destination - transform.translation;
        let distance = to_destination.length();
        let step = (agent.speed * dt).min(distance);
        if step > f32::EPSILON {
            transform.translation += to_destination / distance * step;
            face_towards(&mut transform, destination);
        }
        agent.remaining_distance = (distance - step).max(0.0);
    }
}
