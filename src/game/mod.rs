//! Game Logic Module
//!
//! The authoritative simulation. Synchronous and free of I/O; the
//! network layer decides when to call into it.
//!
//! ## Module Structure
//!
//! - `state`: Arena config, player records, collectible, world state
//! - `input`: Movement intents
//! - `collision`: Box overlap and proximity tests
//! - `ranking`: Leaderboard derivation
//! - `tick`: One fixed-rate simulation step

pub mod state;
pub mod input;
pub mod collision;
pub mod ranking;
pub mod tick;

// Re-export key types
pub use state::{ArenaConfig, ArenaError, Collectible, PlayerId, PlayerRecord, WorldError, WorldSnapshot, WorldState};
pub use input::MovementIntent;
pub use collision::{aabb_overlap, proximity, Rect};
pub use ranking::{rank, RankEntry};
pub use tick::{Pickup, TickResult};
