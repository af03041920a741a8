// Observer-side mirror of replicated state.
//
// A replica never computes gameplay state; it only copies what the
// authority sends and plays the cosmetic side of each broadcast.

use std::collections::BTreeMap;

use glam::Vec3;
use tracing::{debug, trace};

use crate::domain::{Broadcast, EntityId, EntityKind, EntitySnapshot, LinearColor, ProjectileId};
use crate::use_cases::types::WorldUpdate;

#[derive(Debug, Clone, PartialEq)]
pub struct ReplicaEntity {
    pub kind: EntityKind,
    pub location: Vec3,
    pub health: Option<f32>,
    pub sparks_visible: bool,
    pub lit: Option<bool>,
    pub color: Option<LinearColor>,
}

impl ReplicaEntity {
    fn spawned(kind: EntityKind, location: Vec3) -> Self {
        Self {
            kind,
            location,
            health: None,
            sparks_visible: false,
            lit: (kind == EntityKind::Light).then_some(true),
            color: None,
        }
    }
}

impl From<&EntitySnapshot> for ReplicaEntity {
    fn from(s: &EntitySnapshot) -> Self {
        Self {
            kind: s.kind,
            location: s.location,
            health: s.health,
            sparks_visible: s.sparks_visible,
            lit: s.lit,
            color: s.color,
        }
    }
}

#[derive(Debug, Default)]
pub struct Replica {
    last_tick: u64,
    entities: BTreeMap<EntityId, ReplicaEntity>,
    projectiles: BTreeMap<ProjectileId, Vec3>,
    explosions_played: u64,
}

impl Replica {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_tick(&self) -> u64 {
        self.last_tick
    }

    pub fn entity(&self, id: EntityId) -> Option<&ReplicaEntity> {
        self.entities.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    /// Explosion effects played so far (enemy destruction and projectile blasts).
    pub fn explosions_played(&self) -> u64 {
        self.explosions_played
    }

    /// Applies one update. Returns false for duplicate or stale ticks.
    pub fn apply(&mut self, update: &WorldUpdate) -> bool {
        if update.tick <= self.last_tick {
            trace!(tick = update.tick, last = self.last_tick, "stale update dropped");
            return false;
        }
        self.last_tick = update.tick;

        for event in &update.events {
            self.apply_event(event);
        }

        // The snapshot is complete: anything it omits no longer exists.
        self.entities = update
            .entities
            .iter()
            .map(|s| (s.id, ReplicaEntity::from(s)))
            .collect();
        true
    }

    fn apply_event(&mut self, event: &Broadcast) {
        match *event {
            Broadcast::EntitySpawned {
                entity,
                kind,
                location,
            } => {
                self.entities
                    .insert(entity, ReplicaEntity::spawned(kind, location));
            }
            Broadcast::EntityRemoved { entity } => {
                self.entities.remove(&entity);
            }
            Broadcast::HealthChanged { entity, current } => {
                if let Some(e) = self.entities.get_mut(&entity) {
                    e.health = Some(current);
                }
            }
            Broadcast::PlayDamageEffects { entity } => {
                if let Some(e) = self.entities.get_mut(&entity) {
                    if !e.sparks_visible {
                        e.sparks_visible = true;
                    }
                }
            }
            Broadcast::DestroyEntity { entity, location } => {
                self.explosions_played += 1;
                self.entities.remove(&entity);
                debug!(%entity, x = location.x, y = location.y, "played destruction");
            }
            Broadcast::LightState { entity, lit } => {
                if let Some(e) = self.entities.get_mut(&entity) {
                    e.lit = Some(lit);
                    e.sparks_visible = !lit;
                }
            }
            Broadcast::ProjectileSpawned {
                projectile,
                location,
                ..
            } => {
                self.projectiles.insert(projectile, location);
            }
            Broadcast::ProjectileDetonated { projectile, .. } => {
                self.explosions_played += 1;
                self.projectiles.remove(&projectile);
            }
            Broadcast::ProjectileExpired { projectile } => {
                self.projectiles.remove(&projectile);
            }
        }
    }
}
