//! End-to-end WebSocket tests.
//!
//! Starts the real server on an ephemeral port and plays through it with
//! `tokio-tungstenite` clients speaking the JSON event envelope.

use futures_util::{SinkExt, StreamExt};
use loto::table::{TableActor, TableConfig, TableHandle};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const SECRET: &str = "ws-test-secret";

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> (SocketAddr, TableHandle) {
    let config = TableConfig {
        host_secret: Some(SECRET.to_string()),
        rng_seed: Some(5),
        ..Default::default()
    };
    let (actor, table) = TableActor::new(config);
    tokio::spawn(actor.run());

    let app = loto_server::api::create_router(loto_server::api::AppState {
        table: table.clone(),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, table)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    client
}

async fn send(client: &mut Client, frame: Value) {
    client.send(Message::text(frame.to_string())).await.unwrap();
}

async fn join(addr: SocketAddr, name: &str, secret: Option<&str>) -> Client {
    let mut client = connect(addr).await;
    let data = match secret {
        Some(secret) => json!({"name": name, "secretKey": secret}),
        None => json!({"name": name}),
    };
    send(&mut client, json!({"event": "join-game", "data": data})).await;
    client
}

/// Next server event as parsed JSON, or `None` once the socket closes.
async fn next_event(client: &mut Client) -> Option<Value> {
    loop {
        let frame = timeout(Duration::from_secs(3), client.next())
            .await
            .expect("timed out waiting for server event")?;
        match frame {
            Ok(Message::Text(text)) => return Some(serde_json::from_str(text.as_str()).unwrap()),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Read events until one with the given name arrives.
async fn wait_for(client: &mut Client, event: &str) -> Value {
    loop {
        let value = next_event(client)
            .await
            .unwrap_or_else(|| panic!("socket closed before '{event}'"));
        if value["event"] == event {
            return value;
        }
    }
}

/// Read the next `update-game-state` and return the connection id of the
/// named player from it.
async fn own_id(client: &mut Client, name: &str) -> String {
    let state = wait_for(client, "update-game-state").await;
    state["data"]["players"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == name)
        .and_then(|p| p["id"].as_str())
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_join_flow() {
    let (addr, _table) = start_server().await;
    let mut host = join(addr, "Host", Some(SECRET)).await;

    let log = wait_for(&mut host, "receive-chat").await;
    assert_eq!(log["data"]["type"], "system");
    assert_eq!(log["data"]["subType"], "info");

    let role = wait_for(&mut host, "role-update").await;
    assert_eq!(role["data"]["isHost"], true);

    let state = wait_for(&mut host, "update-game-state").await;
    assert_eq!(state["data"]["gameState"], "IDLE");
    assert_eq!(state["data"]["players"][0]["isHost"], true);
    assert_eq!(state["data"]["players"][0]["balance"], 500);

    let sync = wait_for(&mut host, "sync-numbers").await;
    assert_eq!(sync["data"], json!([]));
}

#[tokio::test]
async fn test_chat_reaches_everyone() {
    let (addr, _table) = start_server().await;
    let mut alice = join(addr, "Alice", None).await;
    wait_for(&mut alice, "sync-numbers").await;
    let mut bob = join(addr, "Bob", None).await;
    wait_for(&mut bob, "sync-numbers").await;

    send(&mut bob, json!({"event": "send-chat", "data": "good luck"})).await;

    for client in [&mut alice, &mut bob] {
        loop {
            let chat = wait_for(client, "receive-chat").await;
            if chat["data"]["type"] == "user" {
                assert_eq!(chat["data"]["sender"], "Bob");
                assert_eq!(chat["data"]["content"], "good luck");
                break;
            }
        }
    }
}

#[tokio::test]
async fn test_full_round_over_websocket() {
    let (addr, table) = start_server().await;
    let mut host = join(addr, "Host", Some(SECRET)).await;
    wait_for(&mut host, "role-update").await;
    own_id(&mut host, "Host").await;

    let mut player = join(addr, "Alice", None).await;
    let player_id = own_id(&mut player, "Alice").await;

    send(&mut host, json!({"event": "host-open-betting", "data": 10})).await;
    wait_for(&mut player, "game-reset").await;

    send(&mut player, json!({"event": "buy-ticket"})).await;
    loop {
        let state = wait_for(&mut host, "update-game-state").await;
        let bought = state["data"]["players"]
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p["id"] == player_id.as_str() && p["hasTicket"] == true);
        if bought {
            break;
        }
    }
    send(&mut host, json!({"event": "host-approve-player", "data": player_id})).await;
    send(&mut host, json!({"event": "host-start-game"})).await;

    // Wait until the table is playing before drawing
    loop {
        let state = wait_for(&mut player, "update-game-state").await;
        if state["data"]["gameState"] == "PLAYING" {
            assert_eq!(state["data"]["pot"], 10);
            break;
        }
    }

    // A claim with only numbers that have been called is a guaranteed win
    send(&mut host, json!({"event": "call-number"})).await;
    let called = wait_for(&mut player, "new-number").await["data"].as_u64().unwrap();
    let mut row = vec![Value::Null; 9];
    row[0] = json!(called);
    send(&mut player, json!({"event": "request-check-win", "data": [row]})).await;

    let over = wait_for(&mut host, "game-over").await;
    assert_eq!(over["data"]["winnerName"], "Alice");
    assert_eq!(over["data"]["winAmount"], 10);

    let state = table.state().await.unwrap();
    assert_eq!(state.view.pot, 0);
    let alice = state
        .view
        .players
        .iter()
        .find(|p| p.name.as_str() == "Alice")
        .unwrap();
    assert_eq!(alice.balance, 500);
}

#[tokio::test]
async fn test_check_without_ticket_fails_privately() {
    let (addr, _table) = start_server().await;
    let mut player = join(addr, "Eve", None).await;
    wait_for(&mut player, "sync-numbers").await;

    send(&mut player, json!({"event": "request-check-win", "data": [[1, 2, 3]]})).await;

    let fail = wait_for(&mut player, "check-fail").await;
    assert!(fail.get("data").is_none());
}

#[tokio::test]
async fn test_malformed_frames_are_ignored() {
    let (addr, table) = start_server().await;
    let mut client = join(addr, "Mallory", None).await;
    wait_for(&mut client, "sync-numbers").await;

    client.send(Message::text("{not json")).await.unwrap();
    send(&mut client, json!({"event": "fold"})).await;
    send(&mut client, json!({"event": "send-chat", "data": "still here"})).await;

    let chat = wait_for(&mut client, "receive-chat").await;
    assert_eq!(chat["data"]["content"], "still here");
    assert_eq!(table.state().await.unwrap().connection_count, 1);
}

#[tokio::test]
async fn test_disconnect_removes_player() {
    let (addr, table) = start_server().await;
    let mut watcher = join(addr, "Watcher", None).await;
    wait_for(&mut watcher, "sync-numbers").await;

    let mut leaver = join(addr, "Leaver", None).await;
    wait_for(&mut leaver, "sync-numbers").await;
    leaver.close(None).await.unwrap();

    loop {
        let state = wait_for(&mut watcher, "update-game-state").await;
        let players = state["data"]["players"].as_array().unwrap();
        if players.len() == 1 {
            assert_eq!(players[0]["name"], "Watcher");
            break;
        }
    }
    assert_eq!(table.state().await.unwrap().view.players.len(), 1);
}

#[tokio::test]
async fn test_rate_limit_drops_excess_frames() {
    let (addr, _table) = start_server().await;
    let mut client = join(addr, "Spammer", None).await;
    wait_for(&mut client, "sync-numbers").await;

    // The join used one slot of the burst window
    for i in 0..20 {
        send(&mut client, json!({"event": "send-chat", "data": format!("msg {i}")})).await;
    }

    let mut delivered = 0;
    while let Ok(Some(event)) = timeout(Duration::from_millis(500), next_event(&mut client)).await {
        if event["event"] == "receive-chat" && event["data"]["type"] == "user" {
            delivered += 1;
        }
    }
    assert!(delivered <= 9, "burst limit let {delivered} chats through");
    assert!(delivered >= 1);
}

#[tokio::test]
async fn test_table_close_ends_sockets() {
    let (addr, table) = start_server().await;
    let mut client = join(addr, "Last", None).await;
    wait_for(&mut client, "sync-numbers").await;

    table.close().await.unwrap();

    loop {
        if next_event(&mut client).await.is_none() {
            break;
        }
    }
}
