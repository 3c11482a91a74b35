//! WebSocket Game Server
//!
//! Accepts connections, runs one gateway task per client and drives the
//! fixed-rate tick loop.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, watch, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};
use futures_util::stream::SplitSink;
use futures_util::{FutureExt, SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};

use crate::config::{ConfigError, ServerConfig};
use crate::game::state::PlayerId;
use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::network::session::GameSession;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// Configuration rejected.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Connected client state.
struct ConnectedClient {
    /// Identity assigned at connect.
    player_id: PlayerId,
    /// False if registration failed; intents are then ignored.
    registered: bool,
    /// Connection time.
    connected_at: Instant,
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// The authoritative game.
    session: Arc<GameSession>,
    /// Connected clients.
    clients: Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
    /// Shutdown signal.
    shutdown_tx: watch::Sender<bool>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig) -> Self {
        let seed = config.rng_seed.unwrap_or_else(rand::random);
        let session = GameSession::new(config.arena, seed, config.broadcast_capacity);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            session: Arc::new(session),
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Handle to the running game.
    pub fn session(&self) -> Arc<GameSession> {
        self.session.clone()
    }

    /// Bind the configured address and run until shutdown.
    pub async fn run(&self) -> Result<(), GameServerError> {
        self.config.validate()?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Run on an already bound listener until shutdown.
    #[instrument(skip_all)]
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!("Game server listening on {}", listener.local_addr()?);

        let tick_handle = tokio::spawn(Self::run_tick_loop(
            self.session.clone(),
            self.config.tick_rate,
            self.shutdown_tx.subscribe(),
        ));

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = wait_for_shutdown(&mut shutdown_rx) => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        // The tick loop watches the same signal; wait for its last tick
        if let Err(e) = tick_handle.await {
            error!("Tick loop task failed: {}", e);
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let clients = self.clients.clone();
        let session = self.session.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let player_id = PlayerId::random();

            // Subscribe first so no tick after registration is missed
            let mut updates = session.subscribe();

            let (registered, greeting) = match session.join(player_id).await {
                Ok(joined) => {
                    info!("Client {} joined as {} ({})", addr, joined.player.display_name, player_id);
                    (true, joined.greeting)
                }
                Err(e) => {
                    error!("Invariant violated: could not register {} for {}: {}", player_id, addr, e);
                    (false, session.greeting().await)
                }
            };

            clients.write().await.insert(addr, ConnectedClient {
                player_id,
                registered,
                connected_at: Instant::now(),
            });

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                for msg in &greeting {
                    if !Self::send_message(&mut ws_sender, msg).await {
                        return;
                    }
                }

                loop {
                    match updates.recv().await {
                        Ok(msg) => {
                            if !Self::send_message(&mut ws_sender, &msg).await {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("Client {} lagging, skipped {} messages", addr, skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            });

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                match ClientMessage::from_json(&text) {
                                    Ok(client_msg) => {
                                        Self::handle_client_message(player_id, registered, client_msg, &session).await;
                                    }
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                    }
                                }
                            }
                            Some(Ok(Message::Binary(data))) => {
                                match ClientMessage::from_bytes(&data) {
                                    Ok(client_msg) => {
                                        Self::handle_client_message(player_id, registered, client_msg, &session).await;
                                    }
                                    Err(e) => {
                                        debug!("Invalid binary message from {}: {}", addr, e);
                                    }
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                warn!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            // Ping/pong is answered by tungstenite itself
                            _ => {}
                        }
                    }
                    _ = wait_for_shutdown(&mut shutdown_rx) => {
                        break;
                    }
                }
            }

            // Cleanup: queued outbound messages are abandoned
            sender_task.abort();

            if registered {
                session.leave(&player_id).await;
            }

            if let Some(client) = clients.write().await.remove(&addr) {
                info!(
                    "Client {} ({}) cleaned up after {:?}",
                    addr,
                    client.player_id,
                    client.connected_at.elapsed()
                );
            }
        });
    }

    /// Serialize and send one message. Returns `false` once the socket is gone.
    async fn send_message(ws_sender: &mut WsSink, msg: &ServerMessage) -> bool {
        let text = match msg.to_json() {
            Ok(t) => t,
            Err(e) => {
                error!("Failed to serialize message: {}", e);
                return true;
            }
        };
        ws_sender.send(Message::Text(text)).await.is_ok()
    }

    /// Handle a client message.
    async fn handle_client_message(
        player_id: PlayerId,
        registered: bool,
        msg: ClientMessage,
        session: &GameSession,
    ) {
        match msg {
            ClientMessage::Movement(intent) => {
                if !registered {
                    return;
                }
                if !session.apply_intent(&player_id, intent).await {
                    debug!("Dropped intent for departed player {}", player_id);
                }
            }
        }
    }

    /// Run the fixed-rate tick loop until shutdown.
    ///
    /// A late tick fires as soon as possible and the schedule shifts;
    /// missed ticks are never replayed in a burst. A failing tick is
    /// logged and the next one runs normally.
    async fn run_tick_loop(
        session: Arc<GameSession>,
        tick_rate: u32,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let tick_duration = Duration::from_micros(1_000_000 / tick_rate.max(1) as u64);
        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {}
                _ = wait_for_shutdown(&mut shutdown_rx) => {
                    info!("Tick loop stopped");
                    break;
                }
            }

            match AssertUnwindSafe(session.step()).catch_unwind().await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    error!("Tick failed: {}", e);
                }
                Err(_) => {
                    error!("Tick panicked, continuing with next tick");
                }
            }
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Get registered player count.
    pub async fn player_count(&self) -> usize {
        self.session.player_count().await
    }

    /// Get connections that could not be registered.
    pub async fn unregistered_count(&self) -> usize {
        self.clients.read().await.values().filter(|c| !c.registered).count()
    }
}

/// Resolve once shutdown has been requested or the server is gone.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        let stop = *rx.borrow_and_update();
        if stop || rx.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::session::StepFault;

    fn test_config() -> ServerConfig {
        ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            rng_seed: Some(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = GameServer::new(test_config());

        assert_eq!(server.connection_count().await, 0);
        assert_eq!(server.player_count().await, 0);
        assert_eq!(server.unregistered_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_config_refused() {
        let config = ServerConfig { tick_rate: 0, ..test_config() };
        let server = GameServer::new(config);

        let result = server.run().await;
        assert!(matches!(result, Err(GameServerError::Config(_))));
    }

    #[tokio::test]
    async fn test_shutdown_before_serve_returns() {
        let server = GameServer::new(test_config());
        server.shutdown();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let result = tokio::time::timeout(Duration::from_secs(2), server.serve(listener)).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_tick_loop_survives_failed_and_panicking_steps() {
        let server = GameServer::new(test_config());
        let session = server.session();
        let mut rx = session.subscribe();

        session.push_fault(StepFault::Error);
        session.push_fault(StepFault::Panic);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(GameServer::run_tick_loop(session.clone(), 60, shutdown_rx));

        // Neither faulted step advanced the world, so the first broadcast is tick 1
        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("no tick within 2s")
            .unwrap();
        match msg.as_ref() {
            ServerMessage::GameState(update) => assert_eq!(update.tick, 1),
            other => panic!("Wrong message type: {:?}", other),
        }

        shutdown_tx.send_replace(true);
        let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_tick_loop_advances_and_stops() {
        let server = GameServer::new(test_config());
        let session = server.session();
        let mut rx = session.subscribe();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = Arc::new(server);
        let runner = server.clone();
        let handle = tokio::spawn(async move { runner.serve(listener).await });

        // Game state goes out every tick even with nobody connected
        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("no tick within 2s")
            .unwrap();
        assert!(matches!(msg.as_ref(), ServerMessage::GameState(_)));

        server.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }
}
