//! # Collect Arena Game Server
//!
//! Authoritative real-time server for a multiplayer collect-the-item game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  COLLECT ARENA SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  └── vec2.rs     - 2D vector                                 │
//! │                                                              │
//! │  game/           - Authoritative simulation (sync, no I/O)   │
//! │  ├── state.rs    - Arena, players, collectible, world        │
//! │  ├── input.rs    - Movement intents                          │
//! │  ├── collision.rs- AABB overlap and proximity                │
//! │  ├── ranking.rs  - Leaderboard                               │
//! │  └── tick.rs     - One fixed-rate step                       │
//! │                                                              │
//! │  network/        - Networking                                │
//! │  ├── server.rs   - WebSocket server, gateway, tick loop      │
//! │  ├── protocol.rs - Message types                             │
//! │  └── session.rs  - Locked world + broadcast fan-out          │
//! │                                                              │
//! │  config.rs       - Environment configuration                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//!
//! The world sits behind one lock. Movement intents take it briefly as
//! they arrive; each tick takes it once to resolve the pickup, rank the
//! players and build the outgoing messages, so every broadcast reflects
//! a single instant.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use config::{ConfigError, ServerConfig};
pub use crate::core::Vec2;
pub use game::input::MovementIntent;
pub use game::state::{ArenaConfig, PlayerId, PlayerRecord, WorldState};
pub use network::{GameServer, GameSession};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
