// Use-case level outputs of the world loop.

use crate::domain::{Broadcast, EntitySnapshot};

/// Everything the authority tells observers about one tick.
#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub tick: u64,
    // Reliable broadcasts raised during the tick, in order.
    pub events: Vec<Broadcast>,
    // Replicated fields at the end of the tick.
    pub entities: Vec<EntitySnapshot>,
}
