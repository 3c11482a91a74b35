//! Game Session
//!
//! Owns the authoritative world behind a single lock and fans tick
//! results out to every connection. Connections only ever address the
//! world through their own [`PlayerId`].

use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::game::input::MovementIntent;
use crate::game::state::{ArenaConfig, PlayerId, PlayerRecord, WorldError, WorldSnapshot, WorldState};
use crate::game::tick::{tick, TickResult};
use crate::network::protocol::{
    CollectibleUpdate, GameStateUpdate, InitialConfig, ServerMessage,
};

/// Shared outbound message. Serialized once per receiver task.
pub type Outbound = Arc<ServerMessage>;

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// World rejected the operation.
    #[error("world error: {0}")]
    World(#[from] WorldError),
}

/// Everything a connection needs right after joining.
#[derive(Debug)]
pub struct JoinInfo {
    /// The freshly created record.
    pub player: PlayerRecord,
    /// Messages to send before any broadcast: config, then collectible.
    pub greeting: Vec<ServerMessage>,
}

/// Failure forced onto an upcoming step.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub(crate) enum StepFault {
    /// Step returns an error.
    Error,
    /// Step panics.
    Panic,
}

/// The running game.
pub struct GameSession {
    /// Authoritative state. Every read and write goes through this lock.
    world: RwLock<WorldState>,
    /// Arena constants (copy, so intents never need a read lock for them).
    config: ArenaConfig,
    /// Tick fan-out to all connections.
    outbound: broadcast::Sender<Outbound>,
    #[cfg(test)]
    faults: std::sync::Mutex<std::collections::VecDeque<StepFault>>,
}

impl GameSession {
    /// Create a new session around a fresh world.
    pub fn new(config: ArenaConfig, rng_seed: u64, broadcast_capacity: usize) -> Self {
        let (outbound, _) = broadcast::channel(broadcast_capacity.max(1));

        Self {
            world: RwLock::new(WorldState::new(config, rng_seed)),
            config,
            outbound,
            #[cfg(test)]
            faults: Default::default(),
        }
    }

    /// Arena constants.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Receive every message broadcast from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.outbound.subscribe()
    }

    /// Register a player and prepare its greeting.
    pub async fn join(&self, player_id: PlayerId) -> Result<JoinInfo, SessionError> {
        let mut world = self.world.write().await;
        let player = world.register(player_id)?;
        let greeting = self.greeting_for(&world);

        Ok(JoinInfo { player, greeting })
    }

    /// Config and collectible messages for a connection without a player.
    pub async fn greeting(&self) -> Vec<ServerMessage> {
        let world = self.world.read().await;
        self.greeting_for(&world)
    }

    fn greeting_for(&self, world: &WorldState) -> Vec<ServerMessage> {
        vec![
            ServerMessage::InitialConfig(InitialConfig::from(&self.config)),
            ServerMessage::CollectibleUpdate(CollectibleUpdate::from(world.collectible())),
        ]
    }

    /// Remove a player. Safe to call for players already gone.
    pub async fn leave(&self, player_id: &PlayerId) -> Option<PlayerRecord> {
        self.world.write().await.unregister(player_id)
    }

    /// Apply one movement intent at the server's fixed speed.
    ///
    /// Returns `false` if the player is no longer registered.
    pub async fn apply_intent(&self, player_id: &PlayerId, intent: MovementIntent) -> bool {
        if intent.is_idle() {
            return self.world.read().await.player(player_id).is_some();
        }
        self.world
            .write()
            .await
            .apply_movement(player_id, intent, self.config.player_speed)
    }

    /// Run one tick and broadcast its results.
    ///
    /// The pickup, the ranking and the outbound messages are all derived
    /// under one write lock; broadcasting happens after it is released.
    pub async fn step(&self) -> Result<TickResult, SessionError> {
        #[cfg(test)]
        self.take_fault()?;

        let (result, messages) = {
            let mut world = self.world.write().await;
            let result = tick(&mut world)?;

            let mut messages = Vec::with_capacity(2);
            if let Some(pickup) = &result.pickup {
                messages.push(ServerMessage::CollectibleUpdate(
                    CollectibleUpdate::from(pickup.collectible),
                ));
            }
            messages.push(ServerMessage::GameState(GameStateUpdate::new(
                result.tick,
                world.players(),
                &result.ranks,
            )));

            (result, messages)
        };

        if let Some(pickup) = &result.pickup {
            debug!(
                "Tick {}: player {} picked up collectible (score {})",
                result.tick, pickup.player_id, pickup.new_score
            );
        }

        #[cfg(feature = "debug-tracing")]
        tracing::trace!("Tick {}: {} players", result.tick, result.ranks.len());

        for message in messages {
            self.broadcast(message);
        }

        Ok(result)
    }

    /// Send a message to every subscribed connection.
    pub fn broadcast(&self, message: ServerMessage) {
        // No receivers just means nobody is connected
        let _ = self.outbound.send(Arc::new(message));
    }

    /// Consistent copy of the world.
    pub async fn snapshot(&self) -> WorldSnapshot {
        self.world.read().await.snapshot()
    }

    /// Connected player count.
    pub async fn player_count(&self) -> usize {
        self.world.read().await.player_count()
    }

    /// Make the next unfaulted step fail in the given way.
    #[cfg(test)]
    pub(crate) fn push_fault(&self, fault: StepFault) {
        self.faults.lock().unwrap().push_back(fault);
    }

    #[cfg(test)]
    fn take_fault(&self) -> Result<(), SessionError> {
        let fault = self.faults.lock().unwrap().pop_front();
        match fault {
            Some(StepFault::Error) => Err(SessionError::World(WorldError::UnknownPlayer(PlayerId::default()))),
            Some(StepFault::Panic) => panic!("forced step panic"),
            None => Ok(()),
        }
    }
}
