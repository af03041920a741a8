use glam::Vec3;
use tracing::debug;

use crate::domain::entity::EntityId;
use crate::domain::ports::{CollisionCategory, EngineRuntime, Falloff};

#[derive(Debug, Clone, Copy)]
pub struct Blast {
    pub center: Vec3,
    pub radius: f32,
    pub impulse: f32,
    pub falloff: Falloff,
}

/// Pushes every body in `filter` within the blast radius outward.
///
/// Returns the bodies that were pushed.
pub fn apply_blast_impulse<R: EngineRuntime>(
    runtime: &mut R,
    blast: Blast,
    filter: CollisionCategory,
    exclude: Option<EntityId>,
) -> Vec<EntityId> {
    let hits: Vec<EntityId> = runtime
        .overlap(blast.center, blast.radius, filter)
        .into_iter()
        .filter(|id| Some(*id) != exclude)
        .collect();

    for id in &hits {
        runtime.apply_radial_impulse(*id, blast.center, blast.radius, blast.impulse, blast.falloff);
    }

    debug!(bodies = hits.len(), radius = blast.radius, "blast impulse applied");
    hits
}

/// Damage dealt at `target` by a blast of `base` damage.
pub fn radial_damage(base: f32, center: Vec3, target: Vec3, radius: f32) -> f32 {
    base * Falloff::Linear.scale(center.distance(target), radius)
}
