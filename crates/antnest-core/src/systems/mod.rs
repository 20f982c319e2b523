//! Systems - logic that operates on ant components

mod building;
mod movement;
mod strategy;

pub use building::*;
pub use movement::*;
pub use strategy::*;
