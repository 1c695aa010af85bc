//! Tests for behavior FSM components.

#[cfg(test)]
mod tests {
    use super::super::behavior::*;
    use bevy::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn abc() -> Vec<StateWeight> {
        vec![
            StateWeight::new(BehaviorState::Idle, 30),
            StateWeight::new(BehaviorState::Wandering, 30),
            StateWeight::new(BehaviorState::Searching, 40),
        ]
    }

    #[test]
    fn test_weighted_draw_boundaries() {
        let weights = abc();
        let draws: Vec<_> = [29, 30, 59, 60, 99]
            .iter()
            .map(|&roll| draw_weighted_state(&weights, roll))
            .collect();

        assert_eq!(
            draws,
            vec![
                Some(BehaviorState::Idle),
                Some(BehaviorState::Wandering),
                Some(BehaviorState::Wandering),
                Some(BehaviorState::Searching),
                Some(BehaviorState::Searching),
            ]
        );
        assert_eq!(draw_weighted_state(&weights, 0), Some(BehaviorState::Idle));
    }

    #[test]
    fn test_last_state_absorbs_remainder() {
        let weights = vec![
            StateWeight::new(BehaviorState::Idle, 20),
            StateWeight::new(BehaviorState::ReturnToOrigin, 30),
        ];
        assert_eq!(draw_weighted_state(&weights, 49), Some(BehaviorState::ReturnToOrigin));
        assert_eq!(draw_weighted_state(&weights, 50), Some(BehaviorState::ReturnToOrigin));
        assert_eq!(draw_weighted_state(&weights, 99), Some(BehaviorState::ReturnToOrigin));
    }

    #[test]
    fn test_empty_weights() {
        assert_eq!(draw_weighted_state(&[], 10), None);
    }

    #[test]
    fn test_arrival_intervals() {
        assert_eq!(BehaviorState::Wandering.arrival_check_interval(), Some(1.0));
        assert_eq!(BehaviorState::Searching.arrival_check_interval(), Some(0.5));
        assert_eq!(BehaviorState::ReturnToOrigin.arrival_check_interval(), Some(0.3));
        assert_eq!(BehaviorState::Idle.arrival_check_interval(), None);
    }

    #[test]
    fn test_annulus_point_in_ring() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let center = Vec3::new(10.0, 1.0, -3.0);

        for _ in 0..200 {
            let point = annulus_point(&mut rng, center, 2.0, 5.0);
            let distance = point.distance(center);
            assert!((2.0 - 1e-4..=5.0 + 1e-4).contains(&distance), "distance {}", distance);
            assert_eq!(point.y, center.y);
        }
    }

    #[test]
    fn test_random_duration_degenerate_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(random_duration(&mut rng, 2.0, 2.0), 2.0);
        let swapped = random_duration(&mut rng, 6.0, 3.0);
        assert!((3.0..6.0).contains(&swapped));
    }

    #[test]
    fn test_default_config_sums_to_hundred() {
        assert_eq!(BehaviorConfig::default().total_weight(), 100);
    }
}
