// Framework bootstrap for the game server runtime.

use crate::domain::GameError;
use crate::frameworks::config;
use crate::interface_adapters::engine::LocalRuntime;
use crate::interface_adapters::net::{world_update_serializer, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::game::world_task;
use crate::use_cases::{Session, SessionSettings};

use axum::{Router, extract::ws::Utf8Bytes, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::{Notify, broadcast, mpsc, watch};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

fn startup_error(e: GameError) -> std::io::Error {
    std::io::Error::other(format!("failed to start round: {e}"))
}

/// Builds the authoritative session: arena lamps plus the first enemy.
fn build_session() -> std::result::Result<Session<LocalRuntime>, GameError> {
    let mut session = Session::new(
        LocalRuntime::new(),
        SessionSettings::default(),
        config::spawn_rng(),
    );
    for location in config::ARENA_LIGHTS {
        session.add_light(location)?;
    }
    session.start_round()?;
    Ok(session)
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let session = build_session().map_err(startup_error)?;

    let (intent_tx, intent_rx) = mpsc::channel(config::INTENT_CHANNEL_CAPACITY);
    let (world_tx, world_rx) = broadcast::channel(config::WORLD_BROADCAST_CAPACITY);
    let (world_bytes_tx, _) = broadcast::channel(config::WORLD_BROADCAST_CAPACITY);
    let (world_latest_tx, _) = watch::channel(Utf8Bytes::from_static(""));
    let shutdown = Arc::new(Notify::new());

    tokio::spawn(world_update_serializer(
        world_rx,
        world_bytes_tx.clone(),
        world_latest_tx.clone(),
    ));
    tokio::spawn(world_task(
        session,
        intent_rx,
        world_tx,
        config::TICK_INTERVAL,
        shutdown.clone(),
    ));

    let state = Arc::new(AppState {
        intent_tx,
        world_bytes_tx,
        world_latest_tx,
    });
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    let served = axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    });
    shutdown.notify_one();
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}
