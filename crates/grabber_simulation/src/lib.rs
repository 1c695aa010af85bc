//! Grabber Simulation Core
//!
//! ECS-симуляция на Bevy 0.16 (strategic layer): AI врагов, grab-and-throw
//! скилл игрока, companion.
//!
//! HYBRID ARCHITECTURE:
//! - ECS = strategic layer (состояния врагов, правила боя, выбор целей)
//! - Движок = tactical layer (физика через `SpatialQueries`, navmesh через
//!   `NavigationAgent`, анимации/эффекты через visual sink events)

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod combat;
pub mod companion;
pub mod components;
pub mod config;
pub mod enemy;
pub mod grab_skill;
pub mod interruption;
pub mod logger;
pub mod motion;
pub mod movement;
pub mod perception;
pub mod player;
pub mod spatial;
pub mod visual;

// Re-export основных типов для удобства
pub use ai::{AIPlugin, BehaviorConfig, BehaviorMachine, BehaviorState};
pub use combat::{CombatConfig, CombatMachine, CombatPhase, CombatPlugin, PlayerDamaged};
pub use companion::{spawn_companion, Companion, CompanionConfig, CompanionPlugin};
pub use components::*;
pub use config::{ConfigError, EnemyProfile};
pub use enemy::{spawn_enemy, Enemy, EnemyKind};
pub use grab_skill::{GrabSkill, GrabSkillConfig, GrabSkillPlugin, SkillInput};
pub use interruption::{Interruption, InterruptionPlugin, InterruptionState, ThrowAnchors, ThrowAxis};
pub use movement::{HeadlessNavigationPlugin, LocomotionPlugin};
pub use perception::PerceptionPlugin;
pub use player::spawn_player;
pub use spatial::{SpatialQueries, SpatialQueryService};
pub use visual::VisualSinkPlugin;

// Logger (crate::log* используется всеми подсистемами)
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, log_with_level, set_log_level, set_printer,
    set_printer_if_needed, ConsoleLogger, LogLevel, LogPrinter,
};

/// Порядок подсистем внутри одного FixedUpdate тика
///
/// Один writer позиции на тик: сначала скилл (держит Grabbed),
/// потом протокол (полёт/падение), потом машины врагов, потом locomotion.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    Perception,
    Skill,
    Interruption,
    Combat,
    Behavior,
    Locomotion,
    Projectiles,
    Companion,
    Cleanup,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Детерминистичный RNG (seed по умолчанию, если host не задал свой)
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Пустой мир (плоский пол), если движок не поставил свою реализацию
            .init_resource::<SpatialQueryService>()
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Perception,
                    SimulationSet::Skill,
                    SimulationSet::Interruption,
                    SimulationSet::Combat,
                    SimulationSet::Behavior,
                    SimulationSet::Locomotion,
                    SimulationSet::Projectiles,
                    SimulationSet::Companion,
                    SimulationSet::Cleanup,
                )
                    .chain(),
            )
            // Подсистемы (ECS strategic layer)
            .add_plugins((
                VisualSinkPlugin,
                PerceptionPlugin,
                GrabSkillPlugin,
                InterruptionPlugin,
                CombatPlugin,
                AIPlugin,
                LocomotionPlugin,
                CompanionPlugin,
            ));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}
