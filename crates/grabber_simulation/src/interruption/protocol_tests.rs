//! Tests for the physical interruption protocol.

#[cfg(test)]
mod tests {
    use super::super::components::*;
    use super::super::protocol::*;
    use crate::components::{Life, TravelMode};
    use crate::motion::{MotionSlot, MotionTask, TravelTask};
    use crate::spatial::{GroundPatch, Obstacle, OpenField, SpatialQueries};
    use bevy::prelude::*;
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(250);

    struct Fixture {
        entity: Entity,
        holder: Entity,
        transform: Transform,
        interruption: Interruption,
        life: Life,
        motion: MotionSlot,
        config: InterruptionConfig,
    }

    impl Fixture {
        fn new(lives: i32) -> Self {
            Self {
                entity: Entity::from_raw(7),
                holder: Entity::from_raw(1),
                transform: Transform::from_xyz(0.0, 0.5, 0.0),
                interruption: Interruption::default(),
                life: Life::new(lives),
                motion: MotionSlot::default(),
                config: InterruptionConfig::default(),
            }
        }

        fn body(&mut self) -> PhysicalBody<'_> {
            PhysicalBody::new(
                self.entity,
                &mut self.transform,
                &mut self.interruption,
                &mut self.life,
                &mut self.motion,
                &self.config,
                0.5,
            )
        }

        fn tick(&mut self, spatial: &dyn SpatialQueries) -> Option<InterruptionTransition> {
            self.body().tick(TICK, spatial)
        }
    }

    #[test]
    fn test_dead_entity_ignores_every_entry_point() {
        let mut fx = Fixture::new(1);
        let field = OpenField::flat(0.0);
        assert_eq!(fx.body().receive_damage(Vec3::ZERO), DamageOutcome::Killed);
        assert_eq!(fx.interruption.state, InterruptionState::Dead);

        let position = fx.transform.translation;
        let holder = fx.holder;

        assert_eq!(fx.body().receive_damage(Vec3::ZERO), DamageOutcome::Rejected);
        assert!(fx.body().grab(holder).is_none());
        assert!(fx.body().release().is_none());
        assert!(fx.body().knockback(Vec3::new(-1.0, 0.0, 0.0)).is_none());
        assert_eq!(
            fx.body()
                .grab_and_throw(holder, Quat::IDENTITY, ThrowAxis::Right, &ThrowAnchors::all()),
            Err(ThrowRejected::Dead)
        );
        assert!(!fx.body().die());
        for _ in 0..40 {
            assert!(fx.tick(&field).is_none());
        }

        assert_eq!(fx.interruption.state, InterruptionState::Dead);
        assert_eq!(fx.life.current, 0);
        assert!(!fx.life.is_alive());
        assert_eq!(fx.transform.translation, position);
        assert!(fx.motion.is_idle());
    }

    #[test]
    fn test_throw_without_anchor_leaves_free_state() {
        let mut fx = Fixture::new(3);
        let anchors = ThrowAnchors {
            right: Some(Vec3::X),
            ..Default::default()
        };
        let holder = fx.holder;

        let result = fx.body().grab_and_throw(holder, Quat::IDENTITY, ThrowAxis::Left, &anchors);

        assert_eq!(result, Err(ThrowRejected::MissingAnchor(ThrowAxis::Left)));
        assert_eq!(fx.interruption.state, InterruptionState::Free);
        assert!(fx.interruption.can_freely_move);
        assert!(fx.motion.is_idle());
    }

    #[test]
    fn test_throw_without_anchor_leaves_grabbed_state() {
        let mut fx = Fixture::new(3);
        let anchors = ThrowAnchors {
            right: Some(Vec3::X),
            ..Default::default()
        };
        let holder = fx.holder;
        fx.body().grab(holder);

        let result = fx.body().grab_and_throw(holder, Quat::IDENTITY, ThrowAxis::Bottom, &anchors);

        assert!(result.is_err());
        assert_eq!(fx.interruption.state, InterruptionState::Grabbed { holder });
        assert!(fx.motion.is_idle());
    }

    #[test]
    fn test_grab_release_round_trip() {
        let mut fx = Fixture::new(3);
        fx.motion.start(MotionTask::Travel(TravelTask::new(
            Vec3::new(5.0, 0.5, 0.0),
            2.0,
            1.0,
            1.0,
            TravelMode::Steering,
        )));
        fx.interruption.velocity = Vec3::new(2.0, 0.0, 0.0);
        let holder = fx.holder;

        assert_eq!(fx.body().grab(holder), Some(InterruptionTransition::Grabbed { holder }));
        assert!(!fx.interruption.can_freely_move);
        assert!(fx.motion.is_idle(), "grab должен отменить travel routine");

        assert_eq!(fx.body().release(), Some(InterruptionTransition::Released));
        assert_eq!(fx.interruption.state, InterruptionState::Free);
        assert!(fx.interruption.can_freely_move);
        assert_eq!(fx.interruption.velocity, Vec3::ZERO);
        assert!(fx.motion.is_idle());
    }

    #[test]
    fn test_second_hit_rejected_inside_immunity() {
        let mut fx = Fixture::new(2);
        let field = OpenField::flat(0.0);

        // t = 0
        assert_eq!(fx.body().receive_damage(Vec3::ZERO), DamageOutcome::Dazed { remaining: 1 });

        // t = 1.0 (immunity 1.5s ещё активна)
        for _ in 0..4 {
            assert!(fx.tick(&field).is_none());
        }
        assert_eq!(fx.body().receive_damage(Vec3::ZERO), DamageOutcome::Rejected);

        assert_eq!(fx.life.current, 1);
        assert_eq!(fx.interruption.state, InterruptionState::Dazed(DazeSeverity::Hit));
    }

    #[test]
    fn test_second_hit_accepted_after_immunity() {
        let mut fx = Fixture::new(3);
        let field = OpenField::flat(0.0);

        fx.body().receive_damage(Vec3::ZERO);
        // t = 1.5: immunity истекла, daze (2s) ещё нет
        for _ in 0..6 {
            assert!(fx.tick(&field).is_none());
        }
        assert_eq!(fx.body().receive_damage(Vec3::ZERO), DamageOutcome::Dazed { remaining: 1 });
        assert_eq!(fx.life.current, 1);
        assert_eq!(fx.interruption.state, InterruptionState::Dazed(DazeSeverity::Hit));

        // Daze перезапущен: ещё 2s от второго удара
        for _ in 0..7 {
            assert!(fx.tick(&field).is_none());
        }
        assert_eq!(fx.tick(&field), Some(InterruptionTransition::Recovered(DazeSeverity::Hit)));
        assert!(fx.interruption.allows_autonomy());
    }

    #[test]
    fn test_fall_death_exactly_at_timeout() {
        let mut fx = Fixture::new(3);
        let field = OpenField::void();
        let holder = fx.holder;

        fx.body()
            .grab_and_throw(holder, Quat::IDENTITY, ThrowAxis::Right, &ThrowAnchors::all())
            .expect("throw");

        let mut falling = false;
        for _ in 0..10 {
            if fx.tick(&field) == Some(InterruptionTransition::Falling) {
                falling = true;
                break;
            }
        }
        assert!(falling, "бросок в пустоту должен перейти в Falling");

        // 23 × 0.25 = 5.75s - ещё жив
        for _ in 0..23 {
            assert!(fx.tick(&field).is_none());
        }
        assert_eq!(fx.interruption.state, InterruptionState::Falling);
        assert!(fx.life.is_alive());

        // 24-й тик = ровно 6.0s
        assert_eq!(fx.tick(&field), Some(InterruptionTransition::Died(DeathCause::FallTimeout)));
        assert_eq!(fx.interruption.state, InterruptionState::Dead);
        assert!(!fx.life.is_alive());
        assert_eq!(fx.life.current, 3, "fall death не зависит от остатка жизней");
    }

    #[test]
    fn test_throw_on_ground_ends_dazed() {
        let mut fx = Fixture::new(3);
        let field = OpenField::flat(0.0);
        let holder = fx.holder;

        let direction = fx
            .body()
            .grab_and_throw(holder, Quat::IDENTITY, ThrowAxis::Right, &ThrowAnchors::all())
            .expect("throw");
        assert_eq!(direction, Vec3::X);
        assert_eq!(fx.interruption.state, InterruptionState::Thrown);
        assert!(!fx.interruption.targetable);

        let mut transitions = Vec::new();
        for _ in 0..4 {
            transitions.extend(fx.tick(&field));
        }

        assert_eq!(transitions, vec![InterruptionTransition::Dazed(DazeSeverity::Thrown)]);
        assert!((fx.transform.translation.x - fx.config.throw_distance).abs() < 1e-3);
        assert!(fx.motion.is_idle());
    }

    #[test]
    fn test_throw_off_ledge_falls_and_lands() {
        let mut fx = Fixture::new(3);
        // Верхний уступ до x = 2, нижний пол на y = -3
        let field = OpenField::void()
            .with_patch(GroundPatch {
                min: Vec2::new(-10.0, -10.0),
                max: Vec2::new(2.0, 10.0),
                height: 0.0,
            })
            .with_patch(GroundPatch {
                min: Vec2::new(-50.0, -50.0),
                max: Vec2::new(50.0, 50.0),
                height: -3.0,
            });
        let holder = fx.holder;
        fx.body()
            .grab_and_throw(holder, Quat::IDENTITY, ThrowAxis::Right, &ThrowAnchors::all())
            .expect("throw");

        let mut transitions = Vec::new();
        for _ in 0..20 {
            transitions.extend(fx.tick(&field));
        }

        assert_eq!(
            transitions,
            vec![
                InterruptionTransition::Falling,
                InterruptionTransition::Dazed(DazeSeverity::Thrown),
            ]
        );
        assert!((fx.transform.translation.y + 2.5).abs() < 1e-4);
        assert_eq!(fx.interruption.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_flying_kind_never_falls() {
        let mut fx = Fixture::new(3);
        fx.config.gravity_bound = false;
        let field = OpenField::void();
        let holder = fx.holder;
        fx.body()
            .grab_and_throw(holder, Quat::IDENTITY, ThrowAxis::Left, &ThrowAnchors::all())
            .expect("throw");

        let mut transitions = Vec::new();
        for _ in 0..4 {
            transitions.extend(fx.tick(&field));
        }
        assert_eq!(transitions, vec![InterruptionTransition::Dazed(DazeSeverity::Thrown)]);
    }

    #[test]
    fn test_damage_while_grabbed_keeps_holder() {
        let mut fx = Fixture::new(3);
        let holder = fx.holder;
        fx.body().grab(holder);

        assert_eq!(fx.body().receive_damage(Vec3::ZERO), DamageOutcome::Damaged { remaining: 2 });
        assert_eq!(fx.interruption.holder(), Some(holder));
    }

    #[test]
    fn test_knockback_hops_and_dazes() {
        let mut fx = Fixture::new(3);
        fx.config.knockback_duration = 0.5;
        let field = OpenField::flat(0.0);

        let transition = fx.body().knockback(Vec3::new(-1.0, 0.5, 0.0));
        let Some(InterruptionTransition::KnockedBack { direction }) = transition else {
            panic!("expected knockback, got {:?}", transition);
        };
        assert!(direction.x > 0.0 && direction.y > 0.0);

        // Середина дуги
        assert!(fx.tick(&field).is_none());
        assert!(fx.transform.translation.y > 1.0);

        assert_eq!(fx.tick(&field), Some(InterruptionTransition::Dazed(DazeSeverity::Hit)));
        assert!((fx.transform.translation.y - 0.5).abs() < 1e-4);
        assert!((fx.transform.translation.x - fx.config.knockback_distance).abs() < 1e-4);
    }

    #[test]
    fn test_stomp_dazes_and_bounces_back_to_height() {
        let mut fx = Fixture::new(3);
        let field = OpenField::flat(0.0);

        assert_eq!(fx.body().stomp(Vec3::new(0.0, 1.0, 0.0)), DamageOutcome::Dazed { remaining: 2 });
        assert_eq!(fx.interruption.state, InterruptionState::Dazed(DazeSeverity::Hit));
        assert!(matches!(fx.motion.current(), Some(MotionTask::Bounce(_))));

        // 0.7s просадки: вниз и обратно, daze продолжается
        assert!(fx.tick(&field).is_none());
        assert!(fx.transform.translation.y < 0.2, "просел: {:?}", fx.transform.translation);
        assert!(fx.tick(&field).is_none());
        assert!(fx.tick(&field).is_none());
        assert_eq!(fx.transform.translation.y, 0.5);
        assert!(fx.motion.is_idle());
        assert!(fx.interruption.is_dazed());
    }

    #[test]
    fn test_stomp_during_immunity_still_bounces() {
        let mut fx = Fixture::new(3);
        let field = OpenField::flat(0.0);
        fx.body().stomp(Vec3::ZERO);
        fx.tick(&field);

        // Второй прыжок: урона нет, просадка от исходной высоты
        assert_eq!(fx.body().stomp(Vec3::ZERO), DamageOutcome::Rejected);
        assert_eq!(fx.life.current, 2);
        let Some(MotionTask::Bounce(bounce)) = fx.motion.current() else {
            panic!("expected bounce, got {:?}", fx.motion.current());
        };
        assert_eq!(bounce.base_height, 0.5);
    }

    #[test]
    fn test_killing_stomp_has_no_bounce() {
        let mut fx = Fixture::new(1);
        assert_eq!(fx.body().stomp(Vec3::ZERO), DamageOutcome::Killed);
        assert!(fx.motion.is_idle());
    }

    #[test]
    fn test_hit_flash_fades_after_killing_blow() {
        let mut fx = Fixture::new(1);
        let field = OpenField::flat(0.0);
        fx.config.hit_flash = 0.5;
        fx.body().receive_damage(Vec3::ZERO);

        fx.tick(&field);
        let level = fx.interruption.flash_level().expect("flash still running");
        assert!((level - 0.5).abs() < 1e-5);
        fx.tick(&field);
        assert_eq!(fx.interruption.flash_level(), Some(0.0));
    }

    #[test]
    fn test_far_from_home_teleports_back() {
        let mut fx = Fixture::new(3);
        let field = OpenField::flat(0.0);
        let home = Vec3::new(0.0, 0.5, 0.0);
        fx.transform.translation = Vec3::new(20.0, 0.5, 0.0);

        assert_eq!(fx.body().relocate_after_daze(home, &field), Some(home));
        assert_eq!(fx.transform.translation, home);

        // Внутри радиуса наземный враг остаётся где лежит
        fx.transform.translation = Vec3::new(10.0, 0.5, 0.0);
        assert_eq!(fx.body().relocate_after_daze(home, &field), None);
    }

    #[test]
    fn test_grounded_flyer_lifts_under_ceiling() {
        let mut fx = Fixture::new(3);
        fx.config.gravity_bound = false;
        let home = Vec3::new(0.0, 0.5, 0.0);

        let open = OpenField::flat(0.0);
        assert_eq!(fx.body().relocate_after_daze(home, &open), Some(Vec3::new(0.0, 3.5, 0.0)));

        // Уже в воздухе - не трогаем
        assert_eq!(fx.body().relocate_after_daze(home, &open), None);

        fx.transform.translation = home;
        let covered = OpenField::flat(0.0).with_obstacle(Obstacle::Box {
            min: Vec3::new(-2.0, 2.5, -2.0),
            max: Vec3::new(2.0, 3.0, 2.0),
        });
        let lifted = fx.body().relocate_after_daze(home, &covered).expect("lifted");
        assert!((lifted.y - 1.7).abs() < 1e-4, "потолок минус зазор: {:?}", lifted);
    }
}
