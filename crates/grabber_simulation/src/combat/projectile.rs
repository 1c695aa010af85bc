//! Homing projectile (ranged атака Seeker'а)
//!
//! Летит с постоянной скоростью, доворачивает к ТЕКУЩЕЙ позиции игрока с
//! ограниченной угловой скоростью. Живёт `lifetime`, гибнет о препятствие.

use bevy::prelude::*;

use super::{AttackStyle, PlayerDamaged};
use crate::components::{CollisionVolume, Player};
use crate::spatial::{SpatialQueryService, LAYER_GROUND, MASK_LINE_OF_SIGHT};
use crate::visual::{EffectId, EffectRequested};

#[derive(Component, Debug, Clone)]
pub struct HomingProjectile {
    pub source: Entity,
    pub direction: Vec3,
    pub speed: f32,
    /// Радиан в секунду
    pub turn_rate: f32,
    pub radius: f32,
    pub damage: i32,
    pub lifetime: Timer,
}

impl HomingProjectile {
    /// Повернуть direction к desired не больше чем на `max_angle`
    pub fn steer_towards(&mut self, desired: Vec3, max_angle: f32) {
        let Some(desired) = desired.try_normalize() else {
            return;
        };
        let angle = self.direction.angle_between(desired);
        if angle <= max_angle || angle <= f32::EPSILON {
            self.direction = desired;
            return;
        }
        let full = Quat::from_rotation_arc(self.direction, desired);
        let partial = Quat::IDENTITY.slerp(full, max_angle / angle);
        self.direction = (partial * self.direction).normalize_or_zero();
    }
}

/// Снаряд для ranged стиля: из `origin` в сторону `aim_point`. Melee → None.
pub fn projectile_for(style: &AttackStyle, source: Entity, origin: Vec3, aim_point: Vec3) -> Option<HomingProjectile> {
    let AttackStyle::Ranged {
        projectile_speed,
        lifetime,
        turn_rate_deg,
        projectile_radius,
        damage,
    } = *style
    else {
        return None;
    };

    Some(HomingProjectile {
        source,
        direction: (aim_point - origin).try_normalize().unwrap_or(Vec3::NEG_Z),
        speed: projectile_speed,
        turn_rate: turn_rate_deg.to_radians(),
        radius: projectile_radius,
        damage,
        lifetime: Timer::from_seconds(lifetime, TimerMode::Once),
    })
}

/// Система: полёт, наведение, попадание, истечение
pub fn advance_projectiles(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    spatial: Res<SpatialQueryService>,
    mut projectiles: Query<(Entity, &mut Transform, &mut HomingProjectile), Without<Player>>,
    player: Query<(Entity, &Transform, Option<&CollisionVolume>), With<Player>>,
    mut damaged: EventWriter<PlayerDamaged>,
    mut effects: EventWriter<EffectRequested>,
) {
    let dt = time.delta();
    let dt_secs = dt.as_secs_f32();
    let target = player.single().ok();

    for (entity, mut transform, mut projectile) in projectiles.iter_mut() {
        projectile.lifetime.tick(dt);
        if projectile.lifetime.finished() {
            commands.entity(entity).despawn();
            continue;
        }

        if let Some((_, player_transform, _)) = target {
            let max_angle = projectile.turn_rate * dt_secs;
            projectile.steer_towards(player_transform.translation - transform.translation, max_angle);
        }

        let step = projectile.direction * projectile.speed * dt_secs;
        let length = step.length();
        if let Some(hit) = spatial.sphere_cast(
            transform.translation,
            projectile.radius,
            step,
            length,
            MASK_LINE_OF_SIGHT | LAYER_GROUND,
        ) {
            effects.write(EffectRequested {
                effect: EffectId::ProjectileImpact,
                position: hit.point,
            });
            commands.entity(entity).despawn();
            continue;
        }
        transform.translation += step;

        let Some((player_entity, player_transform, volume)) = target else {
            continue;
        };
        let reach = projectile.radius + volume.copied().unwrap_or_default().radius;
        if transform.translation.distance(player_transform.translation) <= reach {
            crate::log(&format!(
                "☄️ projectile from {:?} hit player {:?} ({} dmg)",
                projectile.source, player_entity, projectile.damage
            ));
            damaged.write(PlayerDamaged {
                amount: projectile.damage,
                source: projectile.source,
            });
            effects.write(EffectRequested {
                effect: EffectId::ProjectileImpact,
                position: transform.translation,
            });
            commands.entity(entity).despawn();
        }
    }
}
