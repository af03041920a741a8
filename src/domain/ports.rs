// Port to the host engine runtime: spawning, physics queries and effects.

use std::ops::BitOr;

use glam::{Quat, Vec3};

use crate::domain::entity::{EntityId, EntityKind};
use crate::domain::errors::GameError;

/// Collision categories used to filter traces and overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CollisionCategory(pub u32);

impl CollisionCategory {
    pub const NONE: Self = Self(0);

    /// Movable world geometry.
    pub const WORLD_DYNAMIC: Self = Self(1 << 0);

    /// Simulated rigid bodies.
    pub const PHYSICS_BODY: Self = Self(1 << 1);

    /// Dedicated channel for things a player can use.
    pub const INTERACTABLE: Self = Self(1 << 2);

    /// Player characters.
    pub const PAWN: Self = Self(1 << 3);

    /// Bodies pushed around by explosions.
    pub const MASK_EXPLOSION: Self = Self(Self::WORLD_DYNAMIC.0 | Self::PHYSICS_BODY.0);

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for CollisionCategory {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Falloff {
    Constant,
    Linear,
}

impl Falloff {
    /// Strength multiplier at `distance` from the centre; zero outside.
    pub fn scale(self, distance: f32, radius: f32) -> f32 {
        if radius <= 0.0 || distance > radius {
            return 0.0;
        }
        match self {
            Falloff::Constant => 1.0,
            Falloff::Linear => 1.0 - distance / radius,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectId {
    EnemyExplosion,
    ProjectileExplosion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundId {
    Fire,
    Explosion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceHit {
    pub entity: EntityId,
    pub location: Vec3,
    pub distance: f32,
}

/// Calls the gameplay core makes into the engine.
///
/// Implementations own physical transforms; the core owns gameplay state.
pub trait EngineRuntime: Send {
    /// Fails with `SpawnFailure` when no simulation world is available.
    fn spawn(&mut self, kind: EntityKind, location: Vec3, rotation: Quat) -> Result<EntityId, GameError>;

    /// Idempotent: destroying a missing entity does nothing.
    fn destroy(&mut self, entity: EntityId);

    fn location(&self, entity: EntityId) -> Option<Vec3>;

    fn set_linear_velocity(&mut self, entity: EntityId, velocity: Vec3);

    fn set_gravity(&mut self, entity: EntityId, enabled: bool);

    fn overlap(&self, center: Vec3, radius: f32, filter: CollisionCategory) -> Vec<EntityId>;

    fn line_trace(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: CollisionCategory,
        ignore: Option<EntityId>,
    ) -> Option<TraceHit>;

    fn apply_radial_impulse(
        &mut self,
        entity: EntityId,
        center: Vec3,
        radius: f32,
        magnitude: f32,
        falloff: Falloff,
    );

    fn play_effect(&mut self, effect: EffectId, location: Vec3);

    fn play_sound(&mut self, sound: SoundId, location: Vec3);

    /// Advances physics by `dt` seconds.
    fn step(&mut self, dt: f32);
}
