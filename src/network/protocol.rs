//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Text frames carry JSON tagged by `type`; binary frames carry a
//! bincode-encoded movement intent for clients that want compact input.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::game::input::MovementIntent;
use crate::game::ranking::RankEntry;
use crate::game::state::{ArenaConfig, Collectible, PlayerRecord};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Keys held by the player.
    Movement(MovementIntent),
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Arena dimensions, sent once after connect.
    InitialConfig(InitialConfig),

    /// Collectible position, sent on connect and after every pickup.
    CollectibleUpdate(CollectibleUpdate),

    /// Full player table and leaderboard (every tick).
    GameState(GameStateUpdate),
}

/// Arena dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialConfig {
    /// Arena width.
    pub arena_width: f64,
    /// Arena height.
    pub arena_height: f64,
    /// Player box side length.
    pub player_size: f64,
}

impl From<&ArenaConfig> for InitialConfig {
    fn from(config: &ArenaConfig) -> Self {
        Self {
            arena_width: config.width,
            arena_height: config.height,
            player_size: config.player_size,
        }
    }
}

/// Collectible position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollectibleUpdate {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
}

impl From<Collectible> for CollectibleUpdate {
    fn from(collectible: Collectible) -> Self {
        Self {
            x: collectible.position.x,
            y: collectible.position.y,
        }
    }
}

/// Game state update (sent every tick).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateUpdate {
    /// Server tick this state belongs to.
    pub tick: u64,
    /// Players keyed by UUID string.
    pub players: BTreeMap<String, PlayerStateUpdate>,
    /// Leaderboard, best first.
    pub ranks: Vec<RankUpdate>,
}

impl GameStateUpdate {
    /// Build from world records and a leaderboard computed from them.
    pub fn new<'a>(
        tick: u64,
        players: impl IntoIterator<Item = &'a PlayerRecord>,
        ranks: &[RankEntry],
    ) -> Self {
        Self {
            tick,
            players: players.into_iter()
                .map(|p| (p.id.to_uuid_string(), PlayerStateUpdate::from(p)))
                .collect(),
            ranks: ranks.iter().map(RankUpdate::from).collect(),
        }
    }
}

/// Player state in update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStateUpdate {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Current score.
    pub score: u32,
    /// `Player_<N>`.
    pub display_name: String,
    /// CSS color.
    pub color: String,
}

impl From<&PlayerRecord> for PlayerStateUpdate {
    fn from(p: &PlayerRecord) -> Self {
        Self {
            x: p.position.x,
            y: p.position.y,
            score: p.score,
            display_name: p.display_name.clone(),
            color: p.color.clone(),
        }
    }
}

/// Leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankUpdate {
    /// Player UUID string.
    pub id: String,
    /// Current score.
    pub score: u32,
    /// `Player_<N>`.
    pub display_name: String,
}

impl From<&RankEntry> for RankUpdate {
    fn from(entry: &RankEntry) -> Self {
        Self {
            id: entry.id.to_uuid_string(),
            score: entry.score,
            display_name: entry.display_name.clone(),
        }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize to binary. Only movement is defined in binary form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        match self {
            ClientMessage::Movement(intent) => bincode::serialize(intent),
        }
    }

    /// Deserialize from binary.
    pub fn from_bytes(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize::<MovementIntent>(data).map(ClientMessage::Movement)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
