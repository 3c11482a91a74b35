//! Collect Arena Game Server
//!
//! Authoritative game server for Collect Arena.

use tracing::info;
use tracing_subscriber::EnvFilter;

use collect_arena::{GameServer, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::load_or_default();
    config.validate()?;

    info!("Collect Arena Server v{}", VERSION);
    info!("Tick Rate: {} Hz", config.tick_rate);
    info!(
        "Arena: {}x{}, player size {}",
        config.arena.width, config.arena.height, config.arena.player_size
    );

    let server = GameServer::new(config);

    tokio::select! {
        result = server.run() => result?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Ctrl-C received, shutting down");
            server.shutdown();
        }
    }

    Ok(())
}
