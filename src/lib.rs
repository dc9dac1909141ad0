// Re-export core modules for use by the binary or other consumers
pub mod components;
pub mod core;
pub mod data;
pub mod rules;
pub mod simulation;
pub mod systems;

// Expose the main Engine wrapper and types needed for interaction
pub use crate::core::world::{Engine, MascotCommand, Snapshot};
