//! Combat components

pub mod engagement;


// Re-export all components
pub use engagement::*;
