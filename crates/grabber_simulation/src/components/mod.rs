//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: Life, CollisionVolume
//! - world: Origin (spawn позиция), PatrolRoute
//! - player: Player marker, PlayerLocomotion
//! - movement: NavigationAgent, TravelMode

pub mod actor;
pub mod movement;
pub mod player;
pub mod world;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;
pub use player::*;
pub use world::*;
