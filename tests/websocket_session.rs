//! End-to-end check of the WebSocket gateway against a live server.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use collect_arena::network::ServerMessage;
use collect_arena::{GameServer, ServerConfig, Vec2};

type Client = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn start_server() -> (Arc<GameServer>, String) {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        rng_seed: Some(7),
        ..Default::default()
    };
    let server = Arc::new(GameServer::new(config));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());

    let runner = server.clone();
    tokio::spawn(async move { runner.serve(listener).await });

    (server, url)
}

async fn next_message(ws: &mut Client) -> ServerMessage {
    loop {
        let frame = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("no message within 2s")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = frame {
            return ServerMessage::from_json(&text).expect("unparseable server message");
        }
    }
}

async fn wait_for_players(server: &GameServer, expected: usize) {
    timeout(Duration::from_secs(2), async {
        while server.player_count().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("player count not reached within 2s");
}

async fn wait_for_connections(server: &GameServer, expected: usize) {
    timeout(Duration::from_secs(2), async {
        while server.connection_count().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("connection count not reached within 2s");
}

#[tokio::test]
async fn greeting_then_game_state() {
    let (server, url) = start_server().await;
    let (mut ws, _) = connect_async(url).await.unwrap();

    match next_message(&mut ws).await {
        ServerMessage::InitialConfig(config) => {
            assert_eq!(config.arena_width, 800.0);
            assert_eq!(config.arena_height, 600.0);
            assert_eq!(config.player_size, 20.0);
        }
        other => panic!("expected initialConfig first, got {:?}", other),
    }
    assert!(matches!(next_message(&mut ws).await, ServerMessage::CollectibleUpdate(_)));

    loop {
        if let ServerMessage::GameState(update) = next_message(&mut ws).await {
            assert_eq!(update.players.len(), 1);
            assert_eq!(update.ranks.len(), 1);
            assert_eq!(update.ranks[0].display_name, "Player_1");
            assert!(update.players.contains_key(&update.ranks[0].id));
            break;
        }
    }

    server.shutdown();
}

async fn only_position(server: &GameServer) -> Vec2 {
    let snapshot = server.session().snapshot().await;
    assert_eq!(snapshot.players.len(), 1);
    snapshot.players.values().next().unwrap().position
}

#[tokio::test]
async fn malformed_input_moves_nothing() {
    let (server, url) = start_server().await;
    let (mut ws, _) = connect_async(url).await.unwrap();
    wait_for_players(&server, 1).await;

    let arena = *server.session().config();
    let before = only_position(&server).await;

    ws.send(Message::Text("not json".to_string())).await.unwrap();
    ws.send(Message::Text(r#"{"type":"movement","up":true}"#.to_string())).await.unwrap();
    ws.send(Message::Text(
        r#"{"type":"movement","up":1,"down":false,"left":true,"right":false}"#.to_string(),
    ))
    .await
    .unwrap();
    ws.send(Message::Binary(vec![9, 9])).await.unwrap();

    // Still receiving broadcasts, still registered, not moved
    for _ in 0..5 {
        next_message(&mut ws).await;
    }
    assert_eq!(server.player_count().await, 1);
    assert_eq!(only_position(&server).await, before);

    // Pick whichever vertical step stays inside the arena
    let (intent, expected_y) = if before.y + arena.player_speed <= arena.max_player_y() {
        (r#"{"type":"movement","up":false,"down":true,"left":false,"right":false}"#, before.y + arena.player_speed)
    } else {
        (r#"{"type":"movement","up":true,"down":false,"left":false,"right":false}"#, before.y - arena.player_speed)
    };
    ws.send(Message::Text(intent.to_string())).await.unwrap();

    let moved = timeout(Duration::from_secs(2), async {
        loop {
            let position = only_position(&server).await;
            if position != before {
                return position;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("valid intent not applied within 2s");

    assert_eq!(moved, Vec2::new(before.x, expected_y));

    server.shutdown();
}

#[tokio::test]
async fn disconnect_removes_player() {
    let (server, url) = start_server().await;

    let (mut first, _) = connect_async(url.clone()).await.unwrap();
    let (_second, _) = connect_async(url).await.unwrap();
    wait_for_players(&server, 2).await;

    first.close(None).await.unwrap();
    wait_for_players(&server, 1).await;
    wait_for_connections(&server, 1).await;

    server.shutdown();
}
