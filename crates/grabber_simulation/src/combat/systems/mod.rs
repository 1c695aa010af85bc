//! Combat systems

pub mod engagement;

// Re-export all systems
pub use engagement::*;
