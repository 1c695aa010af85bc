//! Общие helpers интеграционных тестов

#![allow(dead_code)]

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use grabber_simulation::spatial::OpenField;
use grabber_simulation::*;
use std::time::Duration;

/// Один fixed шаг = один update
pub const TICK: Duration = Duration::from_millis(20);

/// Полный App симуляции с ручным временем
pub fn simulation_app(seed: u64, field: OpenField) -> App {
    let mut app = create_headless_app(seed);
    app.insert_resource(SpatialQueryService::new(field))
        .add_plugins((SimulationPlugin, HeadlessNavigationPlugin))
        .insert_resource(Time::<Fixed>::from_duration(TICK))
        .insert_resource(TimeUpdateStrategy::ManualDuration(TICK));
    app.update(); // первый update: delta = 0
    app
}

pub fn run_ticks(app: &mut App, ticks: u32) {
    for _ in 0..ticks {
        app.update();
    }
}

pub fn spawn_with<R>(app: &mut App, f: impl FnOnce(&mut Commands) -> R) -> R {
    let world = app.world_mut();
    let result = {
        let mut commands = world.commands();
        f(&mut commands)
    };
    world.flush();
    result
}

pub fn interruption_state(app: &App, entity: Entity) -> InterruptionState {
    app.world()
        .get::<Interruption>(entity)
        .map(|i| i.state)
        .expect("entity has Interruption")
}

/// Собирает урон игроку за всё время теста
#[derive(Resource, Default)]
pub struct DamageLog(pub Vec<PlayerDamaged>);

fn record_damage(mut log: ResMut<DamageLog>, mut damaged: EventReader<PlayerDamaged>) {
    log.0.extend(damaged.read().copied());
}

pub fn track_damage(app: &mut App) {
    app.init_resource::<DamageLog>()
        .add_systems(FixedPostUpdate, record_damage);
}
