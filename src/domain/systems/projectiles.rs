use glam::Vec3;
use tracing::debug;

use crate::domain::entity::{EntityId, ProjectileId, Viewpoint};
use crate::domain::ports::{CollisionCategory, EngineRuntime};
use crate::domain::tuning::ProjectileTuning;

/// Everything a projectile can strike.
pub const PROJECTILE_MASK: CollisionCategory = CollisionCategory(
    CollisionCategory::WORLD_DYNAMIC.0
        | CollisionCategory::PHYSICS_BODY.0
        | CollisionCategory::INTERACTABLE.0
        | CollisionCategory::PAWN.0,
);

#[derive(Debug, Clone, PartialEq)]
pub struct SimProjectile {
    pub id: ProjectileId,
    pub owner: EntityId,
    pub location: Vec3,
    pub velocity: Vec3,
    pub ttl: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileEvent {
    Detonated {
        projectile: ProjectileId,
        owner: EntityId,
        location: Vec3,
    },
    Expired {
        projectile: ProjectileId,
    },
}

/// Creates a projectile leaving the muzzle along the owner's look direction.
pub fn launch(
    id: ProjectileId,
    owner: EntityId,
    body_location: Vec3,
    view: &Viewpoint,
    cfg: &ProjectileTuning,
) -> SimProjectile {
    let eye = view.eye_position(body_location);
    SimProjectile {
        id,
        owner,
        location: eye + view.look * cfg.muzzle_offset,
        velocity: view.look * cfg.speed,
        ttl: cfg.life_time,
    }
}

/// Integrates projectile movement and lifetimes.
///
/// Each projectile sweeps the segment it travels this tick; the first body
/// hit (other than its owner) detonates it at the hit point.
pub fn tick_projectiles<R: EngineRuntime>(
    runtime: &R,
    projectiles: &mut Vec<SimProjectile>,
    dt: f32,
) -> Vec<ProjectileEvent> {
    let mut events = Vec::new();

    projectiles.retain_mut(|p| {
        let step = p.velocity * dt;
        let distance = step.length();
        if distance > 0.0 {
            let hit = runtime.line_trace(
                p.location,
                step / distance,
                distance,
                PROJECTILE_MASK,
                Some(p.owner),
            );
            if let Some(hit) = hit {
                debug!(projectile = p.id.0, entity = %hit.entity, "projectile hit");
                events.push(ProjectileEvent::Detonated {
                    projectile: p.id,
                    owner: p.owner,
                    location: hit.location,
                });
                return false;
            }
        }

        p.location += step;
        p.ttl -= dt;
        if p.ttl <= 0.0 {
            events.push(ProjectileEvent::Expired { projectile: p.id });
            return false;
        }
        true
    });

    events
}
