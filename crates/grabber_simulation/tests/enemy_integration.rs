//! Enemy integration test
//!
//! Полный цикл врага в headless App:
//! - perception → погоня → telegraph → melee удар по игроку
//! - удары игрока → daze → смерть → отложенный despawn
//! - прыжок сверху, затухающая вспышка, подъём летуна после daze
//! - патруль: пауза на каждой точке маршрута

mod common;

use bevy::prelude::*;
use common::*;
use grabber_simulation::ai::StateWeight;
use grabber_simulation::combat::CombatPhase;
use grabber_simulation::interruption::{Dead, DazeSeverity, EnemyHit, Stomped};
use grabber_simulation::spatial::OpenField;
use grabber_simulation::visual::{motion_state, EffectId, EffectRequested, MotionStateRequested, MotionValue};
use grabber_simulation::*;

/// Всё, что ядро отправило в visual sink
#[derive(Resource, Default)]
struct Cues {
    effects: Vec<EffectId>,
    states: Vec<MotionStateRequested>,
}

fn record_cues(
    mut cues: ResMut<Cues>,
    mut effects: EventReader<EffectRequested>,
    mut states: EventReader<MotionStateRequested>,
) {
    cues.effects.extend(effects.read().map(|e| e.effect));
    cues.states.extend(states.read().cloned());
}

fn track_cues(app: &mut App) {
    app.init_resource::<Cues>().add_systems(FixedPostUpdate, record_cues);
}

fn spawn_slimoeil(app: &mut App, position: Vec3) -> Entity {
    spawn_with(app, |commands| {
        spawn_enemy(
            commands,
            &EnemyProfile::for_kind(EnemyKind::Slimoeil),
            position,
            PatrolRoute::default(),
        )
    })
}

#[test]
fn test_melee_enemy_chases_and_hits_player() {
    let mut app = simulation_app(7, OpenField::flat(0.0));
    track_damage(&mut app);

    let player = spawn_with(&mut app, |commands| {
        spawn_player(commands, Transform::from_xyz(0.0, 0.5, 0.0), GrabSkillConfig::default())
    });
    let enemy = spawn_slimoeil(&mut app, Vec3::new(0.0, 0.5, -3.0));
    // Смотрит на игрока
    if let Some(mut transform) = app.world_mut().get_mut::<Transform>(enemy) {
        transform.look_at(Vec3::new(0.0, 0.5, 0.0), Vec3::Y);
    }

    app.update();
    let machine = app.world().get::<CombatMachine>(enemy).expect("combat machine");
    assert_eq!(machine.phase, CombatPhase::Pursuing);
    assert_eq!(machine.target, Some(player));

    run_ticks(&mut app, 150);

    let log = app.world().resource::<DamageLog>();
    assert!(!log.0.is_empty(), "враг должен был ударить за 3 секунды");
    assert!(log.0.iter().all(|hit| hit.source == enemy && hit.amount == 1));

    let position = app.world().get::<Transform>(enemy).expect("transform").translation;
    assert!(
        position.distance(Vec3::new(0.0, 0.5, 0.0)) <= CombatConfig::default().attack_range + 0.1,
        "враг дошёл до дистанции атаки: {:?}",
        position
    );
}

#[test]
fn test_player_hits_kill_and_despawn_enemy() {
    let mut app = simulation_app(7, OpenField::flat(0.0));
    let enemy = spawn_slimoeil(&mut app, Vec3::new(5.0, 0.5, 5.0));
    app.update();

    let hit = EnemyHit {
        target: enemy,
        point: Vec3::new(5.0, 1.0, 5.0),
    };

    app.world_mut().send_event(hit);
    app.update();
    assert_eq!(interruption_state(&app, enemy), InterruptionState::Dazed(DazeSeverity::Hit));
    assert_eq!(app.world().get::<Life>(enemy).map(|l| l.current), Some(2));

    // Повторный удар внутри окна неуязвимости игнорируется
    app.world_mut().send_event(hit);
    app.update();
    assert_eq!(app.world().get::<Life>(enemy).map(|l| l.current), Some(2));

    // Окно неуязвимости 1.5s
    run_ticks(&mut app, 80);
    app.world_mut().send_event(hit);
    app.update();
    assert_eq!(app.world().get::<Life>(enemy).map(|l| l.current), Some(1));

    run_ticks(&mut app, 80);
    app.world_mut().send_event(hit);
    app.update();
    assert_eq!(interruption_state(&app, enemy), InterruptionState::Dead);

    // Dead marker появляется в cleanup того же тика (после apply commands)
    app.update();
    assert!(app.world().get::<Dead>(enemy).is_some());
    let interruption = app.world().get::<Interruption>(enemy).expect("interruption");
    assert!(!interruption.targetable);

    // despawn_delay 3s
    run_ticks(&mut app, 160);
    assert!(app.world().get_entity(enemy).is_err(), "враг должен быть удалён");
}

#[test]
fn test_grabbed_enemy_ignores_player() {
    let mut app = simulation_app(7, OpenField::flat(0.0));
    let player = spawn_with(&mut app, |commands| {
        spawn_player(commands, Transform::from_xyz(0.0, 0.5, 0.0), GrabSkillConfig::default())
    });
    let enemy = spawn_slimoeil(&mut app, Vec3::new(0.0, 0.5, -3.0));
    if let Some(mut transform) = app.world_mut().get_mut::<Transform>(enemy) {
        transform.look_at(Vec3::new(0.0, 0.5, 0.0), Vec3::Y);
    }
    if let Some(mut interruption) = app.world_mut().get_mut::<Interruption>(enemy) {
        interruption.state = InterruptionState::Grabbed { holder: player };
        interruption.can_freely_move = false;
    }

    run_ticks(&mut app, 30);

    let machine = app.world().get::<CombatMachine>(enemy).expect("combat machine");
    assert_eq!(machine.phase, CombatPhase::Unaware, "perception выключена пока враг не Free");
}

#[test]
fn test_searching_dwells_at_each_patrol_point() {
    let mut app = simulation_app(9, OpenField::flat(0.0));
    let mut profile = EnemyProfile::for_kind(EnemyKind::Seeker);
    profile.behavior.weights = vec![StateWeight::new(BehaviorState::Searching, 100)];
    profile.behavior.state_duration_min = 30.0;
    profile.behavior.state_duration_max = 30.0;

    let start = Vec3::new(0.0, 0.5, 0.0);
    let route = PatrolRoute::new(vec![start, Vec3::new(4.0, 0.5, 0.0)]);
    let enemy = spawn_with(&mut app, |commands| spawn_enemy(commands, &profile, start, route));
    if let Some(mut machine) = app.world_mut().get_mut::<BehaviorMachine>(enemy) {
        machine.restart_timer(0.02);
    }

    // Прибытие на первую точку через 0.5s, потом 2..4s стоим
    run_ticks(&mut app, 75);
    let machine = app.world().get::<BehaviorMachine>(enemy).expect("behavior");
    assert_eq!(machine.state, BehaviorState::Searching);
    assert_eq!(machine.patrol_index, 0);
    assert!(machine.dwell.is_some(), "стоит на точке");
    let position = app.world().get::<Transform>(enemy).expect("transform").translation;
    assert!(position.x.abs() < 1e-3, "ещё не ушёл: {:?}", position);

    run_ticks(&mut app, 225);
    let machine = app.world().get::<BehaviorMachine>(enemy).expect("behavior");
    assert_eq!(machine.patrol_index, 1);
    let position = app.world().get::<Transform>(enemy).expect("transform").translation;
    assert!(position.x > 1.0, "пошёл к следующей точке: {:?}", position);
}

#[test]
fn test_stomp_bounces_dazed_enemy_and_flash_fades() {
    let mut app = simulation_app(7, OpenField::flat(0.0));
    track_cues(&mut app);
    let enemy = spawn_slimoeil(&mut app, Vec3::new(5.0, 0.5, 5.0));
    app.update();

    app.world_mut().send_event(Stomped {
        target: enemy,
        point: Vec3::new(5.0, 1.0, 5.0),
    });
    app.update();
    assert_eq!(interruption_state(&app, enemy), InterruptionState::Dazed(DazeSeverity::Hit));
    assert_eq!(app.world().get::<Life>(enemy).map(|l| l.current), Some(2));
    assert!(app.world().resource::<Cues>().effects.contains(&EffectId::Impact));

    run_ticks(&mut app, 15);
    let y = app.world().get::<Transform>(enemy).expect("transform").translation.y;
    assert!(y < 0.2, "просадка от прыжка: {}", y);

    run_ticks(&mut app, 30);
    let y = app.world().get::<Transform>(enemy).expect("transform").translation.y;
    assert_eq!(y, 0.5, "вернулся на исходную высоту");
    assert_eq!(interruption_state(&app, enemy), InterruptionState::Dazed(DazeSeverity::Hit));

    let flash: Vec<f32> = app
        .world()
        .resource::<Cues>()
        .states
        .iter()
        .filter(|s| s.entity == enemy && s.name == motion_state::HIT_FLASH)
        .filter_map(|s| match s.value {
            MotionValue::Scalar(level) => Some(level),
            MotionValue::Flag(_) => None,
        })
        .collect();
    assert!(flash.len() > 2, "flash публикуется каждый тик: {:?}", flash);
    assert!(flash.windows(2).all(|w| w[1] <= w[0]), "только затухает: {:?}", flash);
    assert_eq!(flash.last(), Some(&0.0));
}

#[test]
fn test_grounded_flyer_lifts_after_daze() {
    let mut app = simulation_app(7, OpenField::flat(0.0));
    track_cues(&mut app);
    let start = Vec3::new(2.0, 0.5, 2.0);
    let wanderer = spawn_with(&mut app, |commands| {
        spawn_enemy(
            commands,
            &EnemyProfile::for_kind(EnemyKind::Wanderer),
            start,
            PatrolRoute::default(),
        )
    });
    app.update();

    app.world_mut().send_event(EnemyHit {
        target: wanderer,
        point: start,
    });
    app.update();
    assert!(app.world().get::<Interruption>(wanderer).is_some_and(|i| i.is_dazed()));

    let mut ticks = 0;
    while interruption_state(&app, wanderer) != InterruptionState::Free && ticks < 200 {
        app.update();
        ticks += 1;
    }

    let position = app.world().get::<Transform>(wanderer).expect("transform").translation;
    assert!((position.y - 3.5).abs() < 1e-3, "поднялся на hover_lift: {:?}", position);
    assert!(app.world().resource::<Cues>().effects.contains(&EffectId::Pouf));
}

#[test]
fn test_alert_cue_follows_detection_edges() {
    let mut app = simulation_app(7, OpenField::flat(0.0));
    track_cues(&mut app);
    let player = spawn_with(&mut app, |commands| {
        spawn_player(commands, Transform::from_xyz(0.0, 0.5, 0.0), GrabSkillConfig::default())
    });
    let enemy = spawn_slimoeil(&mut app, Vec3::new(0.0, 0.5, -3.0));
    if let Some(mut transform) = app.world_mut().get_mut::<Transform>(enemy) {
        transform.look_at(Vec3::new(0.0, 0.5, 0.0), Vec3::Y);
    }
    app.update();

    // За спину врага, вне конуса
    if let Some(mut transform) = app.world_mut().get_mut::<Transform>(player) {
        transform.translation = Vec3::new(0.0, 0.5, -12.0);
    }
    app.update();

    let alerts: Vec<bool> = app
        .world()
        .resource::<Cues>()
        .states
        .iter()
        .filter(|s| s.entity == enemy && s.name == motion_state::ALERT)
        .filter_map(|s| match s.value {
            MotionValue::Flag(on) => Some(on),
            MotionValue::Scalar(_) => None,
        })
        .collect();
    assert_eq!(alerts, vec![true, false]);
}
