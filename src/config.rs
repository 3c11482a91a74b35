//! Server configuration.

use std::net::SocketAddr;
use std::str::FromStr;

use crate::game::state::{ArenaConfig, ArenaError};
use crate::TICK_RATE;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A value is out of its allowed range.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Offending setting.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Arena dimensions or gameplay constants are unusable.
    #[error("invalid arena: {0}")]
    Arena(#[from] ArenaError),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Tick rate for game simulation (Hz).
    pub tick_rate: u32,
    /// Outbound messages buffered per connection before it starts skipping.
    pub broadcast_capacity: usize,
    /// Fixed world seed; random when `None`.
    pub rng_seed: Option<u64>,
    /// Arena dimensions and gameplay constants.
    pub arena: ArenaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_connections: 1000,
            tick_rate: TICK_RATE,
            broadcast_capacity: 256,
            rng_seed: None,
            arena: ArenaConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from the environment, falling back to defaults.
    pub fn load_or_default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = parse_var::<SocketAddr>(&lookup, "BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(port) = parse_var::<u16>(&lookup, "PORT") {
            config.bind_addr.set_port(port);
        }
        if let Some(max) = parse_var(&lookup, "MAX_CONNECTIONS") {
            config.max_connections = max;
        }
        if let Some(rate) = parse_var(&lookup, "TICK_RATE") {
            config.tick_rate = rate;
        }
        if let Some(capacity) = parse_var(&lookup, "BROADCAST_CAPACITY") {
            config.broadcast_capacity = capacity;
        }
        if let Some(seed) = parse_var(&lookup, "RNG_SEED") {
            config.rng_seed = Some(seed);
        }
        if let Some(width) = parse_var(&lookup, "ARENA_WIDTH") {
            config.arena.width = width;
        }
        if let Some(height) = parse_var(&lookup, "ARENA_HEIGHT") {
            config.arena.height = height;
        }

        config
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(invalid("max_connections", "must be at least 1"));
        }
        if self.tick_rate == 0 || self.tick_rate > 1000 {
            return Err(invalid("tick_rate", "must be 1-1000 Hz"));
        }
        if self.broadcast_capacity == 0 {
            return Err(invalid("broadcast_capacity", "must be at least 1"));
        }
        self.arena.validate()?;
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}
