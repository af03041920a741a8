use std::{env, time::Duration};

use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("FUTURUM_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

/// Fixed seed for the spawn RNG, for reproducible rounds.
pub fn seed() -> Option<u64> {
    env::var("FUTURUM_SEED").ok().and_then(|v| v.parse().ok())
}

pub fn spawn_rng() -> StdRng {
    match seed() {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub const INTENT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;

pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60);

// Lamps placed around the arena walls at startup.
pub const ARENA_LIGHTS: [Vec3; 4] = [
    Vec3::new(1500.0, 0.0, 400.0),
    Vec3::new(-1500.0, 0.0, 400.0),
    Vec3::new(0.0, 1500.0, 400.0),
    Vec3::new(0.0, -1500.0, 400.0),
];
