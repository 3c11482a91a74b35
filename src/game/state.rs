//! World State Definitions
//!
//! The authoritative mapping of connected players plus the single
//! active collectible. Every mutation of the game goes through
//! [`WorldState`]; callers only ever hold a [`PlayerId`].

use std::collections::BTreeMap;
use std::fmt;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::collision::Rect;
use crate::game::input::MovementIntent;

// =============================================================================
// ARENA CONFIG
// =============================================================================

/// Arena dimensions and gameplay constants.
///
/// All values are server-side; clients only learn the dimensions
/// through the initial configuration message.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Arena width in pixels
    pub width: f64,
    /// Arena height in pixels
    pub height: f64,
    /// Side length of the square player box
    pub player_size: f64,
    /// Side length of the square collectible box
    pub collectible_size: f64,
    /// Distance moved per accepted axis step
    pub player_speed: f64,
    /// Points awarded per pickup
    pub collectible_value: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            player_size: 20.0,
            collectible_size: 15.0,
            player_speed: 5.0,
            collectible_value: 10,
        }
    }
}

impl ArenaConfig {
    /// Largest legal player `x`.
    #[inline]
    pub fn max_player_x(&self) -> f64 {
        self.width - self.player_size
    }

    /// Largest legal player `y`.
    #[inline]
    pub fn max_player_y(&self) -> f64 {
        self.height - self.player_size
    }

    /// Check whether a player box at `position` lies fully inside the arena.
    #[inline]
    pub fn player_in_bounds(&self, position: Vec2) -> bool {
        position.x >= 0.0
            && position.x <= self.max_player_x()
            && position.y >= 0.0
            && position.y <= self.max_player_y()
    }

    /// Check the arena is usable.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ArenaError::NonPositiveDimensions);
        }
        if !(self.player_size > 0.0 && self.collectible_size > 0.0) {
            return Err(ArenaError::NonPositiveSize);
        }
        let largest = self.player_size.max(self.collectible_size);
        if largest > self.width || largest > self.height {
            return Err(ArenaError::DoesNotFit);
        }
        if !(self.player_speed > 0.0) {
            return Err(ArenaError::NonPositiveSpeed);
        }
        Ok(())
    }
}

/// Reasons an [`ArenaConfig`] cannot be played on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    /// Width or height is zero, negative or NaN.
    #[error("arena dimensions must be positive")]
    NonPositiveDimensions,

    /// Player or collectible size is zero, negative or NaN.
    #[error("entity sizes must be positive")]
    NonPositiveSize,

    /// A box is larger than the arena.
    #[error("entities do not fit inside the arena")]
    DoesNotFit,

    /// Players could never move.
    #[error("player speed must be positive")]
    NonPositiveSpeed,
}

// =============================================================================
// PLAYER ID
// =============================================================================

/// Unique player identifier (UUID as bytes).
///
/// Assigned when a connection opens and stable until it closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random identity.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_bytes(self.0))
    }
}

// =============================================================================
// PLAYER RECORD
// =============================================================================

/// State of a single connected player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Unique player ID
    pub id: PlayerId,

    /// `Player_<N>`, N being the registration number
    pub display_name: String,

    /// Top-left corner of the player box
    pub position: Vec2,

    /// Accumulated score, never decreases
    pub score: u32,

    /// CSS color string, cosmetic only
    pub color: String,

    /// Registration number, used to break ranking ties
    pub joined_seq: u64,
}

impl PlayerRecord {
    /// Bounding box of this player.
    #[inline]
    pub fn rect(&self, size: f64) -> Rect {
        Rect::square(self.position, size)
    }

    /// Add points to the score.
    pub fn add_score(&mut self, amount: u32) -> u32 {
        self.score = self.score.saturating_add(amount);
        self.score
    }
}

// =============================================================================
// COLLECTIBLE
// =============================================================================

/// The single item players race to pick up.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    /// Top-left corner of the collectible box
    pub position: Vec2,
}

impl Collectible {
    /// Bounding box of this collectible.
    #[inline]
    pub fn rect(&self, size: f64) -> Rect {
        Rect::square(self.position, size)
    }
}

// =============================================================================
// WORLD STATE
// =============================================================================

/// Errors from world mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// Identity is already registered.
    #[error("player {0} is already registered")]
    DuplicatePlayer(PlayerId),

    /// Identity is not (or no longer) registered.
    #[error("player {0} is not registered")]
    UnknownPlayer(PlayerId),
}

/// Owned copy of the world taken at a single instant.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldSnapshot {
    /// Tick at which the copy was taken
    pub tick: u64,
    /// All players keyed by identity
    pub players: BTreeMap<PlayerId, PlayerRecord>,
    /// The active collectible
    pub collectible: Collectible,
}

/// Complete authoritative game state.
///
/// Constructed explicitly and handed to whoever drives it; there is no
/// process-wide instance. Callers are expected to serialize access.
#[derive(Clone, Debug)]
pub struct WorldState {
    /// Arena dimensions and constants
    config: ArenaConfig,

    /// Ticks processed so far
    pub tick: u64,

    /// Spawn and color RNG
    rng: ChaCha8Rng,

    /// All players (BTreeMap keeps pickup iteration stable)
    players: BTreeMap<PlayerId, PlayerRecord>,

    /// The active collectible
    collectible: Collectible,

    /// Total successful registrations over the world's lifetime
    registrations: u64,
}

impl WorldState {
    /// Create a world and spawn its first collectible.
    pub fn new(config: ArenaConfig, rng_seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(rng_seed);
        let collectible = Self::spawn_collectible(&config, &mut rng);

        Self {
            config,
            tick: 0,
            rng,
            players: BTreeMap::new(),
            collectible,
            registrations: 0,
        }
    }

    fn spawn_collectible(config: &ArenaConfig, rng: &mut ChaCha8Rng) -> Collectible {
        let position = Vec2::new(
            spawn_coord(rng, config.width - config.collectible_size),
            spawn_coord(rng, config.height - config.collectible_size),
        );
        Collectible { position }
    }

    /// Arena configuration.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Register a new player at a random in-bounds position.
    pub fn register(&mut self, id: PlayerId) -> Result<PlayerRecord, WorldError> {
        if self.players.contains_key(&id) {
            return Err(WorldError::DuplicatePlayer(id));
        }

        self.registrations += 1;
        let seq = self.registrations;

        let position = Vec2::new(
            spawn_coord(&mut self.rng, self.config.max_player_x()),
            spawn_coord(&mut self.rng, self.config.max_player_y()),
        );
        let hue: f64 = self.rng.gen_range(0.0..360.0);
        let color = format!("hsl({:.0}, 70%, 50%)", hue);

        let record = PlayerRecord {
            id,
            display_name: format!("Player_{}", seq),
            position,
            score: 0,
            color,
            joined_seq: seq,
        };

        self.players.insert(id, record.clone());
        Ok(record)
    }

    /// Remove a player. Returns the removed record, `None` if absent.
    pub fn unregister(&mut self, id: &PlayerId) -> Option<PlayerRecord> {
        self.players.remove(id)
    }

    /// Apply a movement intent to one player.
    ///
    /// Each requested direction moves its axis by `speed` only when the
    /// result stays inside the arena; a rejected step does not affect the
    /// others. Returns `false` when the player is not registered.
    pub fn apply_movement(&mut self, id: &PlayerId, intent: MovementIntent, speed: f64) -> bool {
        let config = self.config;
        let Some(player) = self.players.get_mut(id) else {
            return false;
        };

        for (dx, dy) in intent.steps(speed) {
            let next = player.position.add(Vec2::new(dx, dy));
            if config.player_in_bounds(next) {
                player.position = next;
            }
        }
        true
    }

    /// Grant the collectible to a player and spawn a replacement.
    ///
    /// Returns the player's new score.
    pub fn award_collectible(&mut self, id: &PlayerId) -> Result<u32, WorldError> {
        let value = self.config.collectible_value;
        let player = self.players
            .get_mut(id)
            .ok_or(WorldError::UnknownPlayer(*id))?;
        let score = player.add_score(value);
        self.respawn_collectible();
        Ok(score)
    }

    /// Replace the collectible with a new one at a random position.
    pub fn respawn_collectible(&mut self) -> Collectible {
        self.collectible = Self::spawn_collectible(&self.config, &mut self.rng);
        self.collectible
    }

    /// Get a player by ID.
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerRecord> {
        self.players.get(id)
    }

    /// Iterate all players in identity order.
    pub fn players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.values()
    }

    /// Current collectible.
    pub fn collectible(&self) -> Collectible {
        self.collectible
    }

    /// Connected player count.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Total registrations so far, including departed players.
    pub fn registrations(&self) -> u64 {
        self.registrations
    }

    /// Copy the whole world.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            players: self.players.clone(),
            collectible: self.collectible,
        }
    }

    #[cfg(test)]
    pub(crate) fn player_mut(&mut self, id: &PlayerId) -> Option<&mut PlayerRecord> {
        self.players.get_mut(id)
    }

    #[cfg(test)]
    pub(crate) fn set_collectible(&mut self, position: Vec2) {
        self.collectible = Collectible { position };
    }
}

/// Uniform coordinate in `[0, max]`; an unusable `max` pins it to 0.
fn spawn_coord(rng: &mut ChaCha8Rng, max: f64) -> f64 {
    if max > 0.0 {
        rng.gen_range(0.0..=max)
    } else {
        0.0
    }
}

// =============================================================================
// TESTS
// =============================================================================
