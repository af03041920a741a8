mod support;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect() -> Client {
    let (ws, _) = connect_async(support::ensure_server())
        .await
        .expect("websocket handshake should succeed");
    ws
}

async fn next_json(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("server should keep sending")
            .expect("stream should stay open")
            .expect("frame should be valid");
        if let Message::Text(txt) = msg {
            return serde_json::from_str(txt.as_str()).expect("server sends json");
        }
    }
}

/// Reads world updates until `pred` accepts one.
async fn wait_for_update<F: Fn(&Value) -> bool>(ws: &mut Client, pred: F) -> Value {
    for _ in 0..600 {
        let msg = next_json(ws).await;
        if msg["type"] == "WorldUpdate" && pred(&msg["data"]) {
            return msg["data"].clone();
        }
    }
    panic!("no matching world update");
}

fn entities_of_kind<'a>(update: &'a Value, kind: &str) -> Vec<&'a Value> {
    update["entities"]
        .as_array()
        .map(|all| all.iter().filter(|e| e["kind"] == kind).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn when_client_connects_then_identity_comes_first_and_character_appears() {
    let mut ws = connect().await;

    let identity = next_json(&mut ws).await;
    assert_eq!(identity["type"], "Identity");
    assert!(identity["data"]["player_id"].as_u64().is_some());

    let update = wait_for_update(&mut ws, |u| !entities_of_kind(u, "character").is_empty()).await;
    assert_eq!(entities_of_kind(&update, "light").len(), 4);
    assert_eq!(entities_of_kind(&update, "enemy").len(), 1);
}

#[tokio::test]
async fn when_client_destroys_enemy_then_every_client_sees_one_destruction_and_a_respawn() {
    let mut shooter = connect().await;
    let mut watcher = connect().await;
    next_json(&mut shooter).await;
    next_json(&mut watcher).await;

    let update = wait_for_update(&mut shooter, |u| entities_of_kind(u, "enemy").len() == 1).await;
    let enemy = entities_of_kind(&update, "enemy")[0]["id"].as_u64().unwrap();

    shooter
        .send(Message::text(
            json!({"type": "Damage", "data": {"target": enemy, "amount": 100.0}}).to_string(),
        ))
        .await
        .unwrap();

    let destroyed = |u: &Value| {
        u["events"]
            .as_array()
            .is_some_and(|events| {
                events
                    .iter()
                    .any(|e| e["event"] == "destroy_entity" && e["entity"] == enemy)
            })
    };
    let seen = wait_for_update(&mut watcher, destroyed).await;
    assert!(
        seen["entities"]
            .as_array()
            .unwrap()
            .iter()
            .all(|e| e["id"] != enemy)
    );
    let replacements = entities_of_kind(&seen, "enemy");
    assert_eq!(replacements.len(), 1);
    assert_ne!(replacements[0]["id"], enemy);
}

#[tokio::test]
async fn when_client_keeps_sending_garbage_then_server_closes_the_socket() {
    let mut ws = connect().await;
    next_json(&mut ws).await;

    for _ in 0..11 {
        if ws.send(Message::text("not json")).await.is_err() {
            break;
        }
    }

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => return true,
                Ok(_) => continue,
            }
        }
        true
    })
    .await
    .expect("server should close the connection");
    assert!(closed);
}
