use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::domain::EntityId;
use crate::interface_adapters::engine::LocalRuntime;
use crate::use_cases::session::{Session, SessionSettings};

pub(crate) fn session_with_seed(seed: u64) -> Session<LocalRuntime> {
    Session::new(
        LocalRuntime::new(),
        SessionSettings::default(),
        StdRng::seed_from_u64(seed),
    )
}

/// Session with two lamps placed on the arena walls.
pub(crate) fn lit_arena(seed: u64) -> (Session<LocalRuntime>, Vec<EntityId>) {
    let mut session = session_with_seed(seed);
    let lights = [Vec3::new(1500.0, 0.0, 300.0), Vec3::new(-1500.0, 0.0, 300.0)]
        .into_iter()
        .map(|at| session.add_light(at).unwrap())
        .collect();
    (session, lights)
}
