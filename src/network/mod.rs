//! Network Layer
//!
//! WebSocket server for real-time multiplayer communication.
//! Nothing here mutates game state directly; everything goes through
//! the session.

pub mod protocol;
pub mod session;
pub mod server;

pub use protocol::{
    ClientMessage, ServerMessage, InitialConfig, CollectibleUpdate,
    GameStateUpdate, PlayerStateUpdate, RankUpdate,
};
pub use session::{GameSession, JoinInfo, SessionError};
pub use server::{GameServer, GameServerError};
