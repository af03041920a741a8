// Typed messages between instances: intents travel observer -> authority,
// broadcasts travel authority -> every instance.

use glam::Vec3;

use crate::domain::entity::{EntityId, EntityKind, ProjectileId};
use crate::domain::light::LinearColor;

/// Mutation request. Observers forward these; the authority executes them.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Join { player_id: u64 },
    Leave { player_id: u64 },
    Aim { player_id: u64, look: Vec3 },
    Interact { player_id: u64 },
    Fire { player_id: u64 },
    ApplyDamage { target: EntityId, amount: f32 },
}

impl Intent {
    pub fn operation(&self) -> &'static str {
        match self {
            Intent::Join { .. } => "join",
            Intent::Leave { .. } => "leave",
            Intent::Aim { .. } => "aim",
            Intent::Interact { .. } => "interact",
            Intent::Fire { .. } => "fire",
            Intent::ApplyDamage { .. } => "apply_damage",
        }
    }
}

/// Reliable, ordered command the authority multicasts to all instances.
#[derive(Debug, Clone, PartialEq)]
pub enum Broadcast {
    EntitySpawned {
        entity: EntityId,
        kind: EntityKind,
        location: Vec3,
    },
    EntityRemoved {
        entity: EntityId,
    },
    HealthChanged {
        entity: EntityId,
        current: f32,
    },
    PlayDamageEffects {
        entity: EntityId,
    },
    /// Play destruction effects and remove the entity.
    DestroyEntity {
        entity: EntityId,
        location: Vec3,
    },
    LightState {
        entity: EntityId,
        lit: bool,
    },
    ProjectileSpawned {
        projectile: ProjectileId,
        owner: EntityId,
        location: Vec3,
        velocity: Vec3,
    },
    ProjectileDetonated {
        projectile: ProjectileId,
        location: Vec3,
    },
    ProjectileExpired {
        projectile: ProjectileId,
    },
}

/// Replicated fields of one entity, sent every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub location: Vec3,
    pub health: Option<f32>,
    pub sparks_visible: bool,
    pub lit: Option<bool>,
    pub color: Option<LinearColor>,
}
