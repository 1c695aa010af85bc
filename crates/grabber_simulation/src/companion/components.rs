//! Companion components: режим, слот следования, recoil дуга, config

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::motion::ease_out_quad;
use crate::spatial::{SpatialQueries, LAYER_ENVIRONMENT, MASK_MOVEMENT_PROBE};

/// Слот следования относительно игрока
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum FollowSlot {
    /// У ног справа (игрок на земле, путь свободен)
    #[default]
    Ground,
    /// Над плечом
    Elevated,
    /// За спиной, в воздухе (оба боковых слота заняты)
    Behind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompanionMode {
    Following,
    /// Aim mode без цели: прибит к aim anchor игрока
    PinnedToAim,
    /// Aim mode с выбранной целью
    AttachedToTarget(Entity),
    /// Откат после броска (не интерактивен)
    Recoil(RecoilArc),
}

/// Короткая дуга отдачи после броска
#[derive(Debug, Clone, PartialEq)]
pub struct RecoilArc {
    pub start: Vec3,
    pub end: Vec3,
    clock: Timer,
}

impl RecoilArc {
    /// Против направления броска, в основном горизонтально, с подъёмом
    pub fn from_throw(start: Vec3, throw_direction: Vec3, distance: f32, duration: f32) -> Self {
        let away = Vec3::new(-throw_direction.x, throw_direction.y.abs(), -throw_direction.z);
        Self {
            start,
            end: start + Vec3::Y + away * distance,
            clock: Timer::from_seconds(duration, TimerMode::Once),
        }
    }

    /// Следующая позиция и флаг завершения
    pub fn advance(&mut self, dt: Duration) -> (Vec3, bool) {
        self.clock.tick(dt);
        let t = ease_out_quad(self.clock.fraction());
        (self.start.lerp(self.end, t), self.clock.finished())
    }
}

/// Цель может задать, где companion садится на неё
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct CompanionPerch {
    pub offset: Vec3,
}

#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanionConfig {
    /// Local offsets игрока (+X = вправо, +Z = назад)
    pub ground_offset: Vec3,
    pub elevated_offset: Vec3,
    pub behind_offset: Vec3,
    pub aim_offset: Vec3,
    /// Посадка на цель, если у цели нет CompanionPerch
    pub perch_offset: Vec3,
    pub base_speed: f32,
    pub max_speed: f32,
    /// На этой дистанции скорость достигает max_speed
    pub catch_up_distance: f32,
    pub min_follow_distance: f32,
    /// Период переоценки слота (секунды)
    pub slot_poll_interval: f32,
    pub radius: f32,
    /// Игрок считается "на земле" если опора ближе
    pub player_ground_probe: f32,
    pub recoil_distance: f32,
    pub recoil_duration: f32,
    pub swirl_duration: f32,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            ground_offset: Vec3::new(0.9, 0.25, 0.4),
            elevated_offset: Vec3::new(0.9, 1.8, 0.3),
            behind_offset: Vec3::new(0.0, 1.8, 1.5),
            aim_offset: Vec3::new(0.8, 1.6, -0.3),
            perch_offset: Vec3::new(0.0, 1.5, 0.0),
            base_speed: 4.0,
            max_speed: 12.0,
            catch_up_distance: 6.0,
            min_follow_distance: 0.3,
            slot_poll_interval: 0.25,
            radius: 0.5,
            player_ground_probe: 1.5,
            recoil_distance: 1.5,
            recoil_duration: 1.0,
            swirl_duration: 1.0,
        }
    }
}

impl CompanionConfig {
    pub fn slot_offset(&self, slot: FollowSlot) -> Vec3 {
        match slot {
            FollowSlot::Ground => self.ground_offset,
            FollowSlot::Elevated => self.elevated_offset,
            FollowSlot::Behind => self.behind_offset,
        }
    }

    /// Скорость растёт линейно с отставанием: base у слота, max на catch_up_distance
    pub fn follow_speed(&self, distance: f32) -> f32 {
        let span = (self.catch_up_distance - self.min_follow_distance).max(f32::EPSILON);
        let t = ((distance - self.min_follow_distance) / span).clamp(0.0, 1.0);
        self.base_speed + (self.max_speed - self.base_speed) * t
    }
}

/// Companion, следующий за игроком
#[derive(Component, Debug, Clone)]
pub struct Companion {
    pub mode: CompanionMode,
    pub slot: FollowSlot,
    pub interactable: bool,
    pub moving: bool,
    slot_poll: Timer,
    swirl: Option<Timer>,
}

impl Companion {
    pub fn new(config: &CompanionConfig) -> Self {
        let mut companion = Self {
            mode: CompanionMode::Following,
            slot: FollowSlot::Ground,
            interactable: true,
            moving: false,
            slot_poll: Timer::from_seconds(config.slot_poll_interval, TimerMode::Repeating),
            swirl: None,
        };
        companion.poll_slot_now();
        companion
    }

    pub fn is_aiming(&self) -> bool {
        matches!(self.mode, CompanionMode::PinnedToAim | CompanionMode::AttachedToTarget(_))
    }

    /// Пора ли переоценить слот
    pub fn slot_poll_due(&mut self, dt: Duration) -> bool {
        self.slot_poll.tick(dt);
        self.slot_poll.just_finished()
    }

    /// Переоценить слот на следующем тике
    pub fn poll_slot_now(&mut self) {
        let duration = self.slot_poll.duration();
        self.slot_poll.set_elapsed(duration);
    }

    pub fn start_swirl(&mut self, duration: f32) {
        self.swirl = Some(Timer::from_seconds(duration, TimerMode::Once));
    }

    /// true когда swirl только что закончился
    pub fn tick_swirl(&mut self, dt: Duration) -> bool {
        let Some(swirl) = self.swirl.as_mut() else {
            return false;
        };
        swirl.tick(dt);
        if swirl.finished() {
            self.swirl = None;
            return true;
        }
        false
    }
}

/// Выбор слота: Ground если игрок на земле и путь к слоту свободен,
/// иначе Elevated если там пусто, иначе Behind
pub fn choose_slot(spatial: &dyn SpatialQueries, player: &Transform, config: &CompanionConfig) -> FollowSlot {
    let ground = player.translation + player.rotation * config.ground_offset;
    let elevated = player.translation + player.rotation * config.elevated_offset;

    let player_grounded = spatial
        .ground_below(player.translation, config.player_ground_probe)
        .is_some();
    if player_grounded && ground_slot_clear(spatial, player.translation, ground, elevated, config.radius) {
        return FollowSlot::Ground;
    }

    if !spatial.overlap_sphere(elevated, config.radius, LAYER_ENVIRONMENT) {
        return FollowSlot::Elevated;
    }
    FollowSlot::Behind
}

fn ground_slot_clear(spatial: &dyn SpatialQueries, from: Vec3, ground: Vec3, elevated: Vec3, radius: f32) -> bool {
    let to_slot = ground + Vec3::Y * radius - from;
    if spatial
        .sphere_cast(from, radius * 0.5, to_slot, to_slot.length(), MASK_MOVEMENT_PROBE)
        .is_some()
    {
        return false;
    }
    // Слот не внутри блока: луч сверху вниз от elevated до ground
    let drop = ground - elevated;
    spatial.raycast(elevated, drop, drop.length(), LAYER_ENVIRONMENT).is_none()
}

/// Нормализованный шаг к точке без перелёта
pub fn step_towards(from: Vec3, to: Vec3, max_step: f32) -> Vec3 {
    let delta = to - from;
    let distance = delta.length();
    if distance <= max_step {
        return to;
    }
    from + delta / distance * max_step
}
