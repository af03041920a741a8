use crate::domain::{EntityId, GameError, Intent};
use crate::interface_adapters::engine::LocalRuntime;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage, WorldUpdateDto};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::{connection_tag, next_player_id};
use crate::use_cases::{GameInstance, Submitted, WorldUpdate};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

/// A connection never owns the simulation; it forwards every intent.
type ObserverInstance = GameInstance<LocalRuntime, mpsc::Sender<Intent>>;

#[derive(Debug)]
enum NetError {
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    IntentsClosed,
    WorldUpdatesClosed,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const RELIABLE_RETRIES: u32 = 50;
const RELIABLE_BACKOFF: Duration = Duration::from_millis(10);

pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    // Serialize each world update once and broadcast the shared bytes.
    loop {
        match world_rx.recv().await {
            Ok(update) => {
                let msg = ServerMessage::WorldUpdate(WorldUpdateDto::from(update));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world update");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                let _ = world_latest_tx.send(bytes.clone());
                let _ = world_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "world serializer lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("world updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let span = info_span!("conn", conn_id = connection_tag(), player_id = tracing::field::Empty);
    serve_connection(socket, state, span.clone())
        .instrument(span)
        .await;
}

async fn serve_connection(mut socket: WebSocket, state: Arc<AppState>, span: Span) {
    let mut ctx = match bootstrap_connection(&mut socket, &state).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "bootstrap failed".into(),
                })))
                .await;
            let _ = socket.close().await;
            return;
        }
    };

    span.record("player_id", ctx.player_id);
    info!("client connected");

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    player_id: u64,
    instance: ObserverInstance,
    world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    world_latest_rx: watch::Receiver<Utf8Bytes>,
    lag_recovery_count: u64,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    invalid_json: u32,

    last_intent_full_log: Instant,
    last_world_lag_log: Instant,
    last_invalid_input_log: Instant,

    close_frame: Option<CloseFrame>,
}

/// Forwards a lifecycle intent, waiting out a full queue instead of
/// dropping it.
async fn forward_reliable(instance: &mut ObserverInstance, intent: Intent) -> Result<(), NetError> {
    for _ in 0..RELIABLE_RETRIES {
        match instance.submit(intent.clone()) {
            Ok(_) => return Ok(()),
            Err(GameError::TransportFull) => tokio::time::sleep(RELIABLE_BACKOFF).await,
            Err(_) => return Err(NetError::IntentsClosed),
        }
    }
    warn!(operation = intent.operation(), "intent queue stayed full; giving up");
    Err(NetError::IntentsClosed)
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
) -> Result<ConnCtx, NetError> {
    // Subscribe before any await so no update is missed.
    let world_bytes_rx = state.world_bytes_tx.subscribe();
    let world_latest_rx = state.world_latest_tx.subscribe();
    let mut instance = ObserverInstance::observer(state.intent_tx.clone());

    let player_id = next_player_id();
    send_message(socket, &ServerMessage::Identity { player_id }).await?;

    // Join before the first update so the snapshot includes the character.
    forward_reliable(&mut instance, Intent::Join { player_id }).await?;

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        player_id,
        instance,
        world_bytes_rx,
        world_latest_rx,
        lag_recovery_count: 0,

        msgs_in: 0,
        msgs_out: 0,
        bytes_in: 0,
        bytes_out: 0,

        invalid_json: 0,

        last_intent_full_log: now,
        last_world_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn intent_for(player_id: u64, msg: ClientMessage) -> Option<Intent> {
    match msg {
        ClientMessage::Aim { look } => look.is_finite().then_some(Intent::Aim { player_id, look }),
        ClientMessage::Interact => Some(Intent::Interact { player_id }),
        ClientMessage::Fire => Some(Intent::Fire { player_id }),
        ClientMessage::Damage { target, amount } => {
            amount.is_finite().then_some(Intent::ApplyDamage {
                target: EntityId(target),
                amount,
            })
        }
    }
}

fn submit_client_intent(ctx: &mut ConnCtx, intent: Intent) -> Result<LoopControl, NetError> {
    let player_id = ctx.player_id;
    match ctx.instance.submit(intent) {
        Ok(Submitted::Forwarded) => Ok(LoopControl::Continue),
        Ok(Submitted::Executed(_)) => {
            // Observers never execute locally.
            warn!(player_id, "connection instance executed an intent");
            Ok(LoopControl::Continue)
        }
        Err(GameError::TransportFull) => {
            if should_log(&mut ctx.last_intent_full_log) {
                warn!(player_id, "intent channel full; dropping intent");
            }
            Ok(LoopControl::Continue)
        }
        Err(_) => Err(NetError::IntentsClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(incoming, ctx) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            world_msg = ctx.world_bytes_rx.recv() => {
                match world_msg {
                    Ok(bytes) => match forward_world_bytes(bytes, socket, ctx).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut ctx.last_world_lag_log) {
                            warn!(missed = n, "world updates lagged; sending snapshot");
                        }
                        recover_from_lag(socket, ctx).await
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(ctx).await {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Resends the latest serialized update. Returns true to disconnect.
async fn recover_from_lag(socket: &mut WebSocket, ctx: &mut ConnCtx) -> bool {
    let latest = ctx.world_latest_rx.borrow().clone();
    if latest.is_empty() {
        if should_log(&mut ctx.last_world_lag_log) {
            warn!("world snapshot unavailable during lag recovery");
        }
        return false;
    }
    ctx.lag_recovery_count += 1;
    debug!(
        player_id = ctx.player_id,
        bytes = latest.len(),
        count = ctx.lag_recovery_count,
        "sending lag recovery snapshot"
    );
    matches!(
        forward_world_bytes(latest, socket, ctx).await,
        LoopControl::Disconnect
    )
}

fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    let player_id = ctx.player_id;
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => match intent_for(player_id, msg) {
                        Some(intent) => submit_client_intent(ctx, intent),
                        None => {
                            if should_log(&mut ctx.last_invalid_input_log) {
                                warn!(player_id, "non-finite values in client message; dropping");
                            }
                            Ok(LoopControl::Continue)
                        }
                    },
                    Err(parse_err) => {
                        ctx.invalid_json += 1;
                        if should_log(&mut ctx.last_invalid_input_log) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if ctx.invalid_json > MAX_INVALID_JSON {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }
                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_world_bytes(
    world_msg: Utf8Bytes,
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
) -> LoopControl {
    let bytes_len = world_msg.len();
    match socket.send(Message::Text(world_msg)).await {
        Ok(()) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send world update");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;
    forward_reliable(&mut ctx.instance, Intent::Leave { player_id }).await?;

    debug!(
        player_id,
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        lag_recovery_count = ctx.lag_recovery_count,
        "connection stats"
    );
    info!(player_id, "client disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn when_client_aims_with_nan_then_no_intent_is_built() {
        let msg = ClientMessage::Aim {
            look: Vec3::new(f32::NAN, 0.0, 0.0),
        };
        assert!(intent_for(1, msg).is_none());
    }

    #[test]
    fn client_damage_targets_entity_by_id() {
        let msg = ClientMessage::Damage {
            target: 9,
            amount: 40.0,
        };
        assert_eq!(
            intent_for(1, msg),
            Some(Intent::ApplyDamage {
                target: EntityId(9),
                amount: 40.0
            })
        );
    }

    #[tokio::test]
    async fn when_queue_is_full_then_reliable_forward_waits_for_room() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut instance = ObserverInstance::observer(tx);
        instance.submit(Intent::Fire { player_id: 1 }).unwrap();

        let drain = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            let first = rx.recv().await;
            let second = rx.recv().await;
            (first, second)
        });
        forward_reliable(&mut instance, Intent::Leave { player_id: 1 })
            .await
            .unwrap();

        let (first, second) = drain.await.unwrap();
        assert_eq!(first, Some(Intent::Fire { player_id: 1 }));
        assert_eq!(second, Some(Intent::Leave { player_id: 1 }));
    }
}
