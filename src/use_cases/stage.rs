// Authoritative gameplay state: entity records, projectiles, pending
// broadcasts and timers. Only the authority ever owns a `Stage`.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use glam::{Quat, Vec3};
use tracing::{debug, info};

use crate::domain::systems::explosion::{self, Blast};
use crate::domain::systems::{lights, projectiles};
use crate::domain::systems::projectiles::{ProjectileEvent, SimProjectile};
use crate::domain::tuning::{CharacterTuning, EnemyTuning, ProjectileTuning};
use crate::domain::{
    Broadcast, CollisionCategory, DamageOutcome, EffectId, EngineRuntime, EntityId, EntityKind,
    EntityRecord, EntitySnapshot, Falloff, GameError, ProjectileId, SoundId, TaskQueue, Viewpoint,
};

/// Where joining characters appear.
const CHARACTER_SPAWN: Vec3 = Vec3::new(0.0, 0.0, 100.0);

#[derive(Debug, Clone, Copy, Default)]
pub struct StageTuning {
    pub enemy: EnemyTuning,
    pub projectile: ProjectileTuning,
    pub character: CharacterTuning,
}

/// Deferred work run on the simulation thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedTask {
    PublishLights(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractOutcome {
    Used { target: EntityId, lit: bool },
    /// The trace hit nothing within reach.
    NoHit,
}

pub struct Stage<R> {
    runtime: R,
    tuning: StageTuning,
    entities: BTreeMap<EntityId, EntityRecord>,
    players: HashMap<u64, EntityId>,
    projectiles: Vec<SimProjectile>,
    next_projectile_id: u64,
    outbox: Vec<Broadcast>,
    timers: TaskQueue<TimedTask>,
}

impl<R: EngineRuntime> Stage<R> {
    pub fn new(runtime: R, tuning: StageTuning) -> Self {
        Self {
            runtime,
            tuning,
            entities: BTreeMap::new(),
            players: HashMap::new(),
            projectiles: Vec::new(),
            next_projectile_id: 1,
            outbox: Vec::new(),
            timers: TaskQueue::new(),
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    pub fn tuning(&self) -> &StageTuning {
        &self.tuning
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entities.values()
    }

    pub fn count_kind(&self, kind: EntityKind) -> usize {
        self.entities.values().filter(|e| e.kind == kind).count()
    }

    pub fn player_entity(&self, player_id: u64) -> Option<EntityId> {
        self.players.get(&player_id).copied()
    }

    pub fn projectiles(&self) -> &[SimProjectile] {
        &self.projectiles
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn schedule(&mut self, delay: Duration, task: TimedTask) {
        self.timers.schedule(delay, task);
    }

    pub fn advance_timers(&mut self, dt: Duration) -> Vec<TimedTask> {
        self.timers.advance(dt)
    }

    pub fn drain_broadcasts(&mut self) -> Vec<Broadcast> {
        std::mem::take(&mut self.outbox)
    }

    fn spawn_record(
        &mut self,
        kind: EntityKind,
        location: Vec3,
        make: impl FnOnce(EntityId) -> EntityRecord,
    ) -> Result<EntityId, GameError> {
        let id = self.runtime.spawn(kind, location, Quat::IDENTITY)?;
        self.entities.insert(id, make(id));
        self.outbox.push(Broadcast::EntitySpawned {
            entity: id,
            kind,
            location,
        });
        Ok(id)
    }

    pub fn spawn_enemy(&mut self, location: Vec3, velocity: Vec3) -> Result<EntityId, GameError> {
        let max_health = self.tuning.enemy.max_health;
        let id = self.spawn_record(EntityKind::Enemy, location, |id| {
            EntityRecord::enemy(id, max_health)
        })?;
        self.runtime.set_linear_velocity(id, velocity);
        Ok(id)
    }

    pub fn spawn_light(&mut self, location: Vec3) -> Result<EntityId, GameError> {
        self.spawn_record(EntityKind::Light, location, EntityRecord::light)
    }

    /// Spawns a character for `player_id`; joining twice returns the
    /// existing character.
    pub fn join(&mut self, player_id: u64) -> Result<EntityId, GameError> {
        if let Some(id) = self.players.get(&player_id) {
            return Ok(*id);
        }
        let view = Viewpoint::new(player_id, self.tuning.character.eye_height);
        let id = self.spawn_record(EntityKind::Character, CHARACTER_SPAWN, |id| {
            EntityRecord::character(id, view)
        })?;
        self.players.insert(player_id, id);
        info!(player_id, entity = %id, "player joined");
        Ok(id)
    }

    pub fn leave(&mut self, player_id: u64) -> Option<EntityId> {
        let id = self.players.remove(&player_id)?;
        self.projectiles.retain(|p| p.owner != id);
        self.remove_entity(id);
        info!(player_id, entity = %id, "player left");
        Some(id)
    }

    pub fn aim(&mut self, player_id: u64, look: Vec3) -> Result<bool, GameError> {
        let (_, view) = self.viewpoint_mut(player_id)?;
        Ok(view.aim(look))
    }

    fn viewpoint_mut(&mut self, player_id: u64) -> Result<(EntityId, &mut Viewpoint), GameError> {
        let id = self
            .players
            .get(&player_id)
            .copied()
            .ok_or(GameError::UnknownPlayer(player_id))?;
        let view = self
            .entities
            .get_mut(&id)
            .and_then(|record| record.viewpoint.as_mut())
            .ok_or(GameError::CapabilityMissing {
                entity: id,
                capability: "viewpoint",
            })?;
        Ok((id, view))
    }

    fn remove_entity(&mut self, id: EntityId) {
        self.runtime.destroy(id);
        if self.entities.remove(&id).is_some() {
            self.outbox.push(Broadcast::EntityRemoved { entity: id });
        }
    }

    /// Applies damage to a damageable entity. A lamp has no health and
    /// toggles on any damage, the same way it reacts to `Use`.
    ///
    /// Damage against an entity that is no longer registered is inert. The
    /// caller publishes `EntityDestroyed` when this returns `Destroyed`.
    pub fn apply_damage(&mut self, target: EntityId, amount: f32) -> Result<DamageOutcome, GameError> {
        let Some(record) = self.entities.get_mut(&target) else {
            debug!(entity = %target, "damage against missing entity ignored");
            return Ok(DamageOutcome::Inert);
        };
        let lamp = record.light.is_some();
        let Some(health) = record.health.as_mut() else {
            if !lamp {
                return Err(GameError::CapabilityMissing {
                    entity: target,
                    capability: "damageable",
                });
            }
            let lit = self.use_entity(target)?;
            debug!(entity = %target, amount, lit, "lamp toggled by damage");
            return Ok(DamageOutcome::Toggled);
        };

        let before = health.current();
        let outcome = health.apply_damage(amount);
        let current = health.current();
        if current != before {
            self.outbox.push(Broadcast::HealthChanged {
                entity: target,
                current,
            });
        }

        match outcome {
            DamageOutcome::Inert | DamageOutcome::Unchanged | DamageOutcome::Toggled => {}
            DamageOutcome::DamageEffects => {
                if let Some(fx) = record.damage_fx.as_mut() {
                    fx.show_damage();
                }
                self.outbox.push(Broadcast::PlayDamageEffects { entity: target });
            }
            DamageOutcome::Destroyed => self.destroy_enemy(target),
        }
        debug!(entity = %target, amount, current, ?outcome, "damage applied");
        Ok(outcome)
    }

    fn destroy_enemy(&mut self, id: EntityId) {
        let location = self.runtime.location(id).unwrap_or(Vec3::ZERO);
        self.outbox.push(Broadcast::DestroyEntity {
            entity: id,
            location,
        });

        self.runtime.play_effect(EffectId::EnemyExplosion, location);
        if let Some(fx) = self
            .entities
            .get_mut(&id)
            .and_then(|record| record.damage_fx.as_mut())
        {
            fx.deactivate();
        }
        self.runtime.set_gravity(id, true);

        let enemy = self.tuning.enemy;
        explosion::apply_blast_impulse(
            &mut self.runtime,
            Blast {
                center: location,
                radius: enemy.explosion_radius,
                impulse: enemy.explosion_impulse,
                falloff: Falloff::Linear,
            },
            CollisionCategory::MASK_EXPLOSION,
            Some(id),
        );

        self.runtime.destroy(id);
        self.entities.remove(&id);
        info!(entity = %id, x = location.x, y = location.y, z = location.z, "enemy destroyed");
    }

    pub fn set_light_state(&mut self, id: EntityId, lit: bool) -> Result<(), GameError> {
        let light = self
            .entities
            .get_mut(&id)
            .ok_or(GameError::UnknownEntity(id))?
            .light
            .as_mut()
            .ok_or(GameError::CapabilityMissing {
                entity: id,
                capability: "light",
            })?;
        light.set_state(lit);
        self.outbox.push(Broadcast::LightState { entity: id, lit });
        Ok(())
    }

    /// Invokes `Use` on an interactable entity exactly once.
    pub fn use_entity(&mut self, id: EntityId) -> Result<bool, GameError> {
        let target = self
            .entities
            .get_mut(&id)
            .and_then(|record| record.interactable_mut())
            .ok_or(GameError::CapabilityMissing {
                entity: id,
                capability: "interactable",
            })?;
        let lit = target.use_entity();
        self.outbox.push(Broadcast::LightState { entity: id, lit });
        Ok(lit)
    }

    /// Traces from the player's eyes along their look direction and uses
    /// whatever interactable is hit.
    pub fn interact(&mut self, player_id: u64) -> Result<InteractOutcome, GameError> {
        let (id, view) = self.viewpoint_mut(player_id)?;
        let view = *view;
        let body = self.runtime.location(id).ok_or(GameError::UnknownEntity(id))?;
        let eye = view.eye_position(body);

        let hit = self.runtime.line_trace(
            eye,
            view.look,
            self.tuning.character.reach,
            CollisionCategory::INTERACTABLE,
            Some(id),
        );
        let Some(hit) = hit else {
            return Ok(InteractOutcome::NoHit);
        };
        let lit = self.use_entity(hit.entity)?;
        Ok(InteractOutcome::Used {
            target: hit.entity,
            lit,
        })
    }

    pub fn fire(&mut self, player_id: u64) -> Result<ProjectileId, GameError> {
        let (owner, view) = self.viewpoint_mut(player_id)?;
        let view = *view;
        let body = self
            .runtime
            .location(owner)
            .ok_or(GameError::UnknownEntity(owner))?;

        let id = ProjectileId(self.next_projectile_id);
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
        let projectile = projectiles::launch(id, owner, body, &view, &self.tuning.projectile);

        self.runtime.play_sound(SoundId::Fire, body);
        self.outbox.push(Broadcast::ProjectileSpawned {
            projectile: id,
            owner,
            location: projectile.location,
            velocity: projectile.velocity,
        });
        self.projectiles.push(projectile);
        Ok(id)
    }

    /// Advances projectiles and resolves detonations. Returns every entity
    /// destroyed by a blast.
    pub fn tick_projectiles(&mut self, dt: f32) -> Vec<EntityId> {
        let events = projectiles::tick_projectiles(&self.runtime, &mut self.projectiles, dt);
        let mut destroyed = Vec::new();
        for event in events {
            match event {
                ProjectileEvent::Detonated {
                    projectile,
                    location,
                    ..
                } => {
                    self.outbox.push(Broadcast::ProjectileDetonated {
                        projectile,
                        location,
                    });
                    destroyed.extend(self.detonate(location));
                }
                ProjectileEvent::Expired { projectile } => {
                    self.outbox.push(Broadcast::ProjectileExpired { projectile });
                }
            }
        }
        destroyed
    }

    fn detonate(&mut self, center: Vec3) -> Vec<EntityId> {
        let cfg = self.tuning.projectile;
        self.runtime.play_effect(EffectId::ProjectileExplosion, center);
        self.runtime.play_sound(SoundId::Explosion, center);

        let mut destroyed = Vec::new();
        let caught = self.runtime.overlap(
            center,
            cfg.explosion_radius,
            CollisionCategory::MASK_EXPLOSION | CollisionCategory::INTERACTABLE,
        );
        for id in caught {
            if !self.entities.contains_key(&id) {
                continue;
            }
            let Some(location) = self.runtime.location(id) else {
                continue;
            };
            let amount = explosion::radial_damage(cfg.damage, center, location, cfg.explosion_radius);
            match self.apply_damage(id, amount) {
                Ok(DamageOutcome::Destroyed) => destroyed.push(id),
                Ok(_) => {}
                Err(e) => debug!(entity = %id, error = %e, "blast skipped entity"),
            }
        }

        explosion::apply_blast_impulse(
            &mut self.runtime,
            Blast {
                center,
                radius: cfg.explosion_radius,
                impulse: cfg.impulse,
                falloff: Falloff::Linear,
            },
            CollisionCategory::MASK_EXPLOSION,
            None,
        );
        destroyed
    }

    /// Re-tints every lit lamp towards the most recently spawned live enemy.
    pub fn recolor_lights(&mut self) {
        let target = self
            .entities
            .values()
            .filter(|e| e.kind == EntityKind::Enemy)
            .next_back()
            .and_then(|e| self.runtime.location(e.id));

        for record in self.entities.values_mut() {
            let Some(light) = record.light.as_mut().filter(|l| l.is_lit()) else {
                continue;
            };
            if let Some(lamp) = self.runtime.location(record.id) {
                lights::track_target(light, lamp, target);
            }
        }
    }

    pub fn step(&mut self, dt: f32) {
        self.runtime.step(dt);
    }

    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        self.entities
            .values()
            .map(|record| EntitySnapshot {
                id: record.id,
                kind: record.kind,
                location: self.runtime.location(record.id).unwrap_or(Vec3::ZERO),
                health: record.health.map(|h| h.current()),
                sparks_visible: record
                    .damage_fx
                    .map(|fx| fx.sparks_visible)
                    .or(record.light.map(|l| l.sparks_visible()))
                    .unwrap_or(false),
                lit: record.light.map(|l| l.is_lit()),
                color: record.light.map(|l| l.color),
            })
            .collect()
    }
}
