//! Headless симуляция Grabber
//!
//! Запускает Bevy App без рендера: три врага, игрок, companion,
//! скриптованный aim → throw. В конце печатает сводку событий.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use grabber_simulation::grab_skill::{CandidateEvent, CandidateEventKind, ThrowResolved};
use grabber_simulation::interruption::InterruptionChanged;
use grabber_simulation::spatial::{GroundPatch, Obstacle, OpenField};
use grabber_simulation::*;

const TICK: Duration = Duration::from_micros(16_667);
const TICKS: u32 = 1200;

#[derive(Resource, Default, Debug)]
struct DemoStats {
    player_damage: i32,
    throws: u32,
    transitions: u32,
}

fn collect_stats(
    mut stats: ResMut<DemoStats>,
    mut damaged: EventReader<PlayerDamaged>,
    mut throws: EventReader<ThrowResolved>,
    mut changes: EventReader<InterruptionChanged>,
) {
    stats.player_damage += damaged.read().map(|d| d.amount).sum::<i32>();
    stats.throws += throws.read().count() as u32;
    stats.transitions += changes.read().count() as u32;
}

/// Игрок, companion и по одному врагу каждого типа; возвращает цель броска
fn spawn_scene(commands: &mut Commands) -> Entity {
    let player_transform = Transform::from_xyz(0.0, 0.5, 0.0);
    spawn_player(commands, player_transform, GrabSkillConfig::default());
    spawn_companion(commands, &player_transform, CompanionConfig::default());

    let route = PatrolRoute::new(vec![Vec3::new(5.0, 0.5, 5.0), Vec3::new(-5.0, 0.5, 5.0)]);
    let target = spawn_enemy(
        commands,
        &EnemyProfile::for_kind(EnemyKind::Slimoeil),
        Vec3::new(0.0, 0.5, -4.0),
        route.clone(),
    );
    spawn_enemy(
        commands,
        &EnemyProfile::for_kind(EnemyKind::Seeker),
        Vec3::new(8.0, 0.5, -8.0),
        route.clone(),
    );
    spawn_enemy(
        commands,
        &EnemyProfile::for_kind(EnemyKind::Wanderer),
        Vec3::new(-8.0, 2.0, 8.0),
        route,
    );
    target
}

fn main() {
    let seed = 42;
    println!("Starting Grabber headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);

    // Плато 40x40 с обрывом по краям и колонной сбоку
    let field = OpenField::void()
        .with_patch(GroundPatch {
            min: Vec2::new(-20.0, -20.0),
            max: Vec2::new(20.0, 20.0),
            height: 0.0,
        })
        .with_obstacle(Obstacle::Sphere {
            center: Vec3::new(-6.0, 1.0, -6.0),
            radius: 1.0,
        });

    app.insert_resource(SpatialQueryService::new(field))
        .add_plugins((SimulationPlugin, HeadlessNavigationPlugin))
        .insert_resource(Time::<Fixed>::from_duration(TICK))
        .insert_resource(TimeUpdateStrategy::ManualDuration(TICK))
        .init_resource::<DemoStats>()
        .add_systems(FixedPostUpdate, collect_stats);

    let world = app.world_mut();
    let target = {
        let mut commands = world.commands();
        spawn_scene(&mut commands)
    };
    world.flush();

    // Первый update с нулевым delta
    app.update();

    for tick in 0..TICKS {
        match tick {
            60 => {
                app.world_mut().send_event(CandidateEvent {
                    candidate: target,
                    kind: CandidateEventKind::VisibilityEntered,
                });
            }
            90 => {
                app.world_mut().send_event(SkillInput::Aim);
            }
            120 => {
                app.world_mut().send_event(SkillInput::Axis(ThrowAxis::Right));
            }
            150 => {
                app.world_mut().send_event(SkillInput::Throw);
            }
            _ => {}
        }

        app.update();

        if tick % 200 == 0 {
            let entity_count = app.world().entities().len();
            println!("Tick {}: {} entities", tick, entity_count);
        }
    }

    let stats = app.world().resource::<DemoStats>();
    println!(
        "Simulation complete! throws: {}, interruption transitions: {}, damage to player: {}",
        stats.throws, stats.transitions, stats.player_damage
    );
}
