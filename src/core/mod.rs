//! Core primitives.
//!
//! Small value types shared by the simulation. Nothing here knows about
//! players, sockets or ticks.

pub mod vec2;

// Re-export core types
pub use vec2::Vec2;
