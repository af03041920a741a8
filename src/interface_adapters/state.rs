use axum::extract::ws::Utf8Bytes;
use tokio::sync::{broadcast, mpsc, watch};

use crate::domain::Intent;

#[derive(Clone)]
pub struct AppState {
    // Intents forwarded by observer connections to the authority.
    pub intent_tx: mpsc::Sender<Intent>,
    // Serialized world updates, shared across all connections.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    // Latest serialized world update for lag recovery.
    pub world_latest_tx: watch::Sender<Utf8Bytes>,
}
