use std::sync::atomic::{AtomicU64, Ordering};

/// Player ids handed out to connections, unique for the life of the process.
pub fn next_player_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Random tag used to correlate a connection's log lines.
pub fn connection_tag() -> u64 {
    rand::random()
}
