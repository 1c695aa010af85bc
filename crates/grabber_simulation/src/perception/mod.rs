//! Perception: vision cone + line-of-sight + периодический замер дистанции
//!
//! Угол и окклюзия пересчитываются каждый тик, дистанция - по своему таймеру
//! (path distance стоит дорого). Наружу уходят только ФРОНТЫ видимости:
//! `TargetDetected` один раз на захват цели, `TargetLost` один раз на потерю.

use bevy::prelude::*;
use bevy::time::Stopwatch;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::components::Player;
use crate::interruption::Interruption;
use crate::spatial::{segment_clear, SpatialQueries, SpatialQueryService, MASK_LINE_OF_SIGHT};
use crate::visual::{motion_state, MotionStateRequested};
use crate::SimulationSet;

/// Параметры зрения (per enemy type)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Половина угла конуса (градусы)
    pub half_angle_deg: f32,
    pub max_distance: f32,
    /// Высота глаз над pivot'ом
    pub eye_height: f32,
    /// Интервал замера дистанции (секунды)
    pub sample_interval: f32,
    /// Мерить по navmesh (наземные) или по прямой
    pub use_path_distance: bool,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            half_angle_deg: 60.0,
            max_distance: 15.0,
            eye_height: 0.5,
            sample_interval: 0.25,
            use_path_distance: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerceptionEdge {
    Acquired,
    Lost,
}

/// Зрение врага + память "когда последний раз видел"
#[derive(Component, Debug, Clone)]
pub struct VisionCone {
    pub half_angle_deg: f32,
    pub max_distance: f32,
    pub eye_height: f32,
    pub use_path_distance: bool,
    sample_timer: Timer,
    sampled_distance: Option<f32>,
    visible: bool,
    since_seen: Stopwatch,
    last_seen_at: Option<Vec3>,
}

impl VisionCone {
    pub fn new(config: &PerceptionConfig) -> Self {
        Self {
            half_angle_deg: config.half_angle_deg,
            max_distance: config.max_distance,
            eye_height: config.eye_height,
            use_path_distance: config.use_path_distance,
            sample_timer: Timer::from_seconds(config.sample_interval, TimerMode::Repeating),
            sampled_distance: None,
            visible: false,
            since_seen: Stopwatch::new(),
            last_seen_at: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Монотонно растёт, сбрасывается в 0 каждый тик когда цель видна
    pub fn time_since_seen(&self) -> Duration {
        self.since_seen.elapsed()
    }

    pub fn sampled_distance(&self) -> Option<f32> {
        self.sampled_distance
    }

    pub fn last_seen_at(&self) -> Option<Vec3> {
        self.last_seen_at
    }

    /// Пора ли перемерить дистанцию (первый замер - сразу)
    pub fn distance_sample_due(&mut self, dt: Duration) -> bool {
        self.sample_timer.tick(dt);
        self.sampled_distance.is_none() || self.sample_timer.just_finished()
    }

    pub fn record_distance(&mut self, distance: f32) {
        self.sampled_distance = Some(distance);
    }

    /// Обновить видимость за тик. Возвращает фронт, если он был.
    pub fn observe(&mut self, now_visible: bool, target_position: Vec3, dt: Duration) -> Option<PerceptionEdge> {
        if now_visible {
            self.since_seen.reset();
            self.last_seen_at = Some(target_position);
        } else {
            self.since_seen.tick(dt);
        }

        let edge = match (self.visible, now_visible) {
            (false, true) => Some(PerceptionEdge::Acquired),
            (true, false) => Some(PerceptionEdge::Lost),
            _ => None,
        };
        self.visible = now_visible;
        edge
    }

    /// Perception выключена (не Free / мёртв): видимость гасится БЕЗ фронтов
    ///
    /// `since_seen` на паузе: время в полёте/daze не идёт в счёт disengage.
    pub fn blind(&mut self) {
        self.visible = false;
    }

    /// Забыть цель (выход из боя)
    pub fn forget(&mut self) {
        self.last_seen_at = None;
    }
}

/// Цель внутри конуса: угол между forward и направлением на цель строго меньше half angle
pub fn within_cone(forward: Vec3, to_target: Vec3, half_angle_deg: f32) -> bool {
    if to_target.length_squared() <= f32::EPSILON {
        return true;
    }
    forward.angle_between(to_target).to_degrees() < half_angle_deg
}

/// Ничего не загораживает отрезок (общий для врагов и camera occlusion grab skill'а)
pub fn has_line_of_sight(spatial: &dyn SpatialQueries, from: Vec3, to: Vec3) -> bool {
    segment_clear(spatial, from, to, MASK_LINE_OF_SIGHT)
}

/// Полный тест видимости: конус + дистанция + окклюзия
pub fn is_visible(
    spatial: &dyn SpatialQueries,
    observer: &Transform,
    cone: &VisionCone,
    target: Vec3,
    distance: f32,
) -> bool {
    if distance >= cone.max_distance {
        return false;
    }
    let eye = observer.translation + Vec3::Y * cone.eye_height;
    within_cone(*observer.forward(), target - eye, cone.half_angle_deg) && has_line_of_sight(spatial, eye, target)
}

/// Event: враг увидел цель (rising edge)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDetected {
    pub observer: Entity,
    pub target: Entity,
}

/// Event: враг потерял цель (falling edge)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetLost {
    pub observer: Entity,
    pub target: Entity,
}

/// Система: vision cone всех врагов против игрока
pub fn update_perception(
    time: Res<Time<Fixed>>,
    spatial: Res<SpatialQueryService>,
    player: Query<(Entity, &Transform), With<Player>>,
    mut observers: Query<(Entity, &Transform, &mut VisionCone, Option<&Interruption>), Without<Player>>,
    mut detected: EventWriter<TargetDetected>,
    mut lost: EventWriter<TargetLost>,
) {
    let dt = time.delta();
    let Ok((player_entity, player_transform)) = player.single() else {
        for (_, _, mut cone, _) in observers.iter_mut() {
            cone.blind();
        }
        return;
    };
    let target = player_transform.translation;

    for (observer, transform, mut cone, interruption) in observers.iter_mut() {
        if interruption.is_some_and(|i| !i.is_free()) {
            cone.blind();
            continue;
        }

        if cone.distance_sample_due(dt) {
            let distance = if cone.use_path_distance {
                spatial
                    .path_distance(transform.translation, target)
                    .unwrap_or_else(|| transform.translation.distance(target))
            } else {
                transform.translation.distance(target)
            };
            cone.record_distance(distance);
        }

        let distance = cone.sampled_distance().unwrap_or(f32::MAX);
        let now_visible = is_visible(&**spatial, transform, &cone, target, distance);

        match cone.observe(now_visible, target, dt) {
            Some(PerceptionEdge::Acquired) => {
                crate::log(&format!("👁️ {:?} spotted player {:?} at {:.1}m", observer, player_entity, distance));
                detected.write(TargetDetected {
                    observer,
                    target: player_entity,
                });
            }
            Some(PerceptionEdge::Lost) => {
                crate::log(&format!("👻 {:?} lost sight of player {:?}", observer, player_entity));
                lost.write(TargetLost {
                    observer,
                    target: player_entity,
                });
            }
            None => {}
        }
    }
}

/// Система: фронты видимости → alert флаг animator'а
pub fn publish_perception_cues(
    mut detected: EventReader<TargetDetected>,
    mut lost: EventReader<TargetLost>,
    mut motion_states: EventWriter<MotionStateRequested>,
) {
    for event in detected.read() {
        motion_states.write(MotionStateRequested::flag(event.observer, motion_state::ALERT, true));
    }
    for event in lost.read() {
        motion_states.write(MotionStateRequested::flag(event.observer, motion_state::ALERT, false));
    }
}

pub struct PerceptionPlugin;

impl Plugin for PerceptionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<TargetDetected>()
            .add_event::<TargetLost>()
            .add_systems(
                FixedUpdate,
                (update_perception, publish_perception_cues)
                    .chain()
                    .in_set(SimulationSet::Perception),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{Obstacle, OpenField};

    const TICK: Duration = Duration::from_millis(100);

    #[test]
    fn test_detection_fires_once_while_visible() {
        let mut cone = VisionCone::new(&PerceptionConfig::default());

        let edges: Vec<_> = (0..30).filter_map(|_| cone.observe(true, Vec3::ZERO, TICK)).collect();

        assert_eq!(edges, vec![PerceptionEdge::Acquired]);
        assert_eq!(cone.time_since_seen(), Duration::ZERO);
    }

    #[test]
    fn test_lost_edge_and_since_seen_clock() {
        let mut cone = VisionCone::new(&PerceptionConfig::default());
        cone.observe(true, Vec3::X, TICK);

        assert_eq!(cone.observe(false, Vec3::X, TICK), Some(PerceptionEdge::Lost));
        assert_eq!(cone.observe(false, Vec3::X, TICK), None);
        assert_eq!(cone.time_since_seen(), Duration::from_millis(200));
        assert_eq!(cone.last_seen_at(), Some(Vec3::X));

        // Снова увидели - счётчик в ноль, новый фронт
        assert_eq!(cone.observe(true, Vec3::Y, TICK), Some(PerceptionEdge::Acquired));
        assert_eq!(cone.time_since_seen(), Duration::ZERO);
    }

    #[test]
    fn test_blind_suppresses_edges() {
        let mut cone = VisionCone::new(&PerceptionConfig::default());
        cone.observe(true, Vec3::ZERO, TICK);
        cone.blind();

        assert!(!cone.is_visible());
        // Следующее наблюдение снова даёт Acquired, а Lost не было никогда
        assert_eq!(cone.observe(true, Vec3::ZERO, TICK), Some(PerceptionEdge::Acquired));
    }

    #[test]
    fn test_since_seen_paused_while_blind() {
        let mut cone = VisionCone::new(&PerceptionConfig::default());
        cone.observe(true, Vec3::ZERO, TICK);
        cone.observe(false, Vec3::ZERO, TICK);
        assert_eq!(cone.time_since_seen(), TICK);

        for _ in 0..20 {
            cone.blind();
        }
        assert_eq!(cone.time_since_seen(), TICK, "clock не идёт пока враг прерван");

        cone.observe(false, Vec3::ZERO, TICK);
        assert_eq!(cone.time_since_seen(), TICK * 2);
    }

    #[test]
    fn test_distance_sampled_on_interval() {
        let mut cone = VisionCone::new(&PerceptionConfig {
            sample_interval: 0.5,
            ..Default::default()
        });

        assert!(cone.distance_sample_due(TICK));
        cone.record_distance(3.0);
        for _ in 0..3 {
            assert!(!cone.distance_sample_due(TICK));
        }
        assert!(cone.distance_sample_due(TICK));
    }

    #[test]
    fn test_within_cone() {
        let forward = Vec3::NEG_Z;
        assert!(within_cone(forward, Vec3::new(0.0, 0.0, -5.0), 45.0));
        assert!(within_cone(forward, Vec3::new(1.0, 0.0, -2.0), 45.0));
        assert!(!within_cone(forward, Vec3::new(5.0, 0.0, -1.0), 45.0));
        assert!(!within_cone(forward, Vec3::new(0.0, 0.0, 5.0), 45.0));
    }

    #[test]
    fn test_visibility_requires_clear_line() {
        let cone = VisionCone::new(&PerceptionConfig::default());
        let observer = Transform::from_xyz(0.0, 0.5, 0.0);
        let target = Vec3::new(0.0, 1.0, -8.0);

        let open = OpenField::flat(0.0);
        assert!(is_visible(&open, &observer, &cone, target, 8.0));

        let walled = OpenField::flat(0.0).with_obstacle(Obstacle::Box {
            min: Vec3::new(-3.0, 0.0, -4.5),
            max: Vec3::new(3.0, 4.0, -4.0),
        });
        assert!(!is_visible(&walled, &observer, &cone, target, 8.0));

        // Дальше max_distance
        assert!(!is_visible(&open, &observer, &cone, target, 20.0));
    }
}
