//! AI components

pub mod behavior;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod behavior_tests;

// Re-export all components
pub use behavior::*;
