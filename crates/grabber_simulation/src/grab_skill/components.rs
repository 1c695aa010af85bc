//! Grab skill components: состояние прицеливания, списки кандидатов, config

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::interruption::ThrowAxis;

/// Marker: entity можно схватить (вместе с ThrowAnchors)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Grabbable;

/// Смена выделения: ровно один unselect и ровно один select затронутых целей
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange {
    pub unselected: Option<Entity>,
    pub selected: Option<Entity>,
}

/// Что надо погасить на выходе из aim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AimExit {
    /// Видимые кандидаты (снять selectable visual)
    pub cleared: Vec<Entity>,
    pub unselected: Option<Entity>,
    /// Удерживаемая цель (если была) - вызывающий отпускает её
    pub released: Option<Entity>,
}

#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabSkillConfig {
    /// Максимальная дистанция выбора (possible кандидаты)
    pub max_selection_distance: f32,
    /// Минимальный интервал между ручными переключениями (секунды)
    pub switch_interval: f32,
    /// Где держать схваченную цель (local offset игрока, -Z = вперёд)
    pub hold_offset: Vec3,
    /// Камера относительно игрока, если нет CameraRig
    pub camera_offset: Vec3,
}

impl Default for GrabSkillConfig {
    fn default() -> Self {
        Self {
            max_selection_distance: 12.0,
            switch_interval: 0.25,
            hold_offset: Vec3::new(0.0, 1.2, -1.5),
            camera_offset: Vec3::new(0.0, 2.0, 4.0),
        }
    }
}

/// Состояние grab-and-throw скилла игрока
///
/// Инвариант: `selected` ⊆ `possible` ⊆ `visible`.
#[derive(Component, Debug, Clone, Default)]
pub struct GrabSkill {
    pub aiming: bool,
    pub selected: Option<Entity>,
    /// Выбираемые (видимы И в пределах дистанции), порядок добавления
    pub possible: Vec<Entity>,
    /// Видимые (не перекрыты), не обязательно в пределах дистанции
    pub visible: Vec<Entity>,
    pub axis: ThrowAxis,
    /// Цель, схваченная через Hold (Grabbed, позицию пишет скилл)
    pub held: Option<Entity>,
    /// Временно не targetable (летит, dazed): вернутся в visible после recovery
    pub suspended: Vec<Entity>,
    switch_gate: Option<Timer>,
}

impl GrabSkill {
    pub fn tick(&mut self, dt: Duration) {
        if let Some(gate) = self.switch_gate.as_mut() {
            gate.tick(dt);
        }
    }

    fn switch_allowed(&self) -> bool {
        self.switch_gate.as_ref().is_none_or(|gate| gate.finished())
    }

    /// Вход в aim: перепроверить видимых, засеять possible
    ///
    /// Возвращает видимых кандидатов (им включается selectable visual).
    pub fn begin_aim(
        &mut self,
        mut still_visible: impl FnMut(Entity) -> bool,
        mut in_range: impl FnMut(Entity) -> bool,
    ) -> Vec<Entity> {
        self.aiming = true;
        self.visible.retain(|&e| still_visible(e));
        self.possible = self.visible.iter().copied().filter(|&e| in_range(e)).collect();
        self.selected = None;
        self.visible.clone()
    }

    /// Выход из aim (cancel или бросок)
    pub fn end_aim(&mut self) -> AimExit {
        self.aiming = false;
        self.possible.clear();
        self.switch_gate = None;
        AimExit {
            cleared: self.visible.clone(),
            unselected: self.selected.take(),
            released: self.held.take(),
        }
    }

    pub fn on_visibility_entered(&mut self, candidate: Entity) -> bool {
        if self.visible.contains(&candidate) {
            return false;
        }
        self.visible.push(candidate);
        true
    }

    pub fn on_visibility_exited(&mut self, candidate: Entity) -> Option<SelectionChange> {
        self.visible.retain(|&e| e != candidate);
        self.suspended.retain(|&e| e != candidate);
        self.on_range_exited(candidate)
    }

    /// Только во время aim и только для видимых
    pub fn on_range_entered(&mut self, candidate: Entity) -> bool {
        if !self.aiming || !self.visible.contains(&candidate) || self.possible.contains(&candidate) {
            return false;
        }
        self.possible.push(candidate);
        true
    }

    pub fn on_range_exited(&mut self, candidate: Entity) -> Option<SelectionChange> {
        self.possible.retain(|&e| e != candidate);
        if self.selected == Some(candidate) {
            self.selected = None;
            return Some(SelectionChange {
                unselected: Some(candidate),
                selected: None,
            });
        }
        None
    }

    /// Убрать кандидата отовсюду (умер, despawn, подавлен interruption'ом)
    pub fn remove_candidate(&mut self, candidate: Entity) -> Option<SelectionChange> {
        self.on_visibility_exited(candidate)
    }

    /// Кандидат жив, но сейчас не targetable: убрать из списков, помнить отдельно
    pub fn suspend_candidate(&mut self, candidate: Entity) -> Option<SelectionChange> {
        let change = self.on_visibility_exited(candidate);
        self.suspended.push(candidate);
        change
    }

    /// Снова targetable и не перекрыт → обратно в visible
    pub fn restore_candidate(&mut self, candidate: Entity) -> bool {
        let Some(index) = self.suspended.iter().position(|&e| e == candidate) else {
            return false;
        };
        self.suspended.swap_remove(index);
        self.on_visibility_entered(candidate)
    }

    /// Ничего не выбрано + есть possible → самый последний добавленный
    pub fn auto_select(&mut self) -> Option<SelectionChange> {
        if !self.aiming || self.selected.is_some() {
            return None;
        }
        let latest = *self.possible.last()?;
        self.selected = Some(latest);
        Some(SelectionChange {
            unselected: None,
            selected: Some(latest),
        })
    }

    /// Ручное переключение с wraparound (rate-limited)
    pub fn cycle(&mut self, forward: bool, switch_interval: f32) -> Option<SelectionChange> {
        if !self.aiming || !self.switch_allowed() {
            return None;
        }
        let Some(current) = self.selected else {
            return self.auto_select();
        };
        let len = self.possible.len();
        let index = self.possible.iter().position(|&e| e == current)?;
        let next_index = if forward { (index + 1) % len } else { (index + len - 1) % len };
        let next = self.possible[next_index];
        if next == current {
            return None;
        }

        self.selected = Some(next);
        self.switch_gate = Some(Timer::from_seconds(switch_interval, TimerMode::Once));
        Some(SelectionChange {
            unselected: Some(current),
            selected: Some(next),
        })
    }

    /// Выбрать ось. Возвращает цель для preview (если выбрана).
    pub fn select_axis(&mut self, axis: ThrowAxis) -> Option<Entity> {
        self.axis = axis;
        self.selected
    }
}

/// Позиция камеры (пишет host). Нужна для проверки перекрытия кандидатов.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct CameraRig {
    pub position: Vec3,
}

impl CameraRig {
    /// Камера из rig'а, иначе offset за спиной игрока
    pub fn eye(rig: Option<&CameraRig>, player: &Transform, config: &GrabSkillConfig) -> Vec3 {
        rig.map(|rig| rig.position)
            .unwrap_or_else(|| player.translation + player.rotation * config.camera_offset)
    }
}
