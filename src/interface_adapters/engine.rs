// In-process engine runtime: sphere bodies, simple integration and
// recorded effect cues. Stands in for the host engine in tests and in the
// standalone server.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use tracing::{debug, warn};

use crate::domain::{
    CollisionCategory, EffectId, EngineRuntime, EntityId, EntityKind, Falloff, GameError, SoundId,
    TraceHit,
};

const GRAVITY: f32 = 980.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub kind: Option<EntityKind>,
    pub location: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub radius: f32,
    pub mass: f32,
    pub gravity: bool,
    pub category: CollisionCategory,
    // Static bodies ignore impulses and integration.
    pub dynamic: bool,
}

impl Body {
    fn template(kind: EntityKind, location: Vec3, rotation: Quat) -> Self {
        let (radius, mass, category, dynamic) = match kind {
            EntityKind::Enemy => (50.0, 60.0, CollisionCategory::PHYSICS_BODY, true),
            EntityKind::Light => (60.0, 0.0, CollisionCategory::INTERACTABLE, false),
            EntityKind::Character => (55.0, 80.0, CollisionCategory::PAWN, false),
        };
        Self {
            kind: Some(kind),
            location,
            rotation,
            velocity: Vec3::ZERO,
            radius,
            mass,
            gravity: false,
            category,
            dynamic,
        }
    }
}

/// Effect or sound requested by the gameplay core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    Effect(EffectId, Vec3),
    Sound(SoundId, Vec3),
}

#[derive(Debug)]
pub struct LocalRuntime {
    available: bool,
    next_id: u64,
    bodies: BTreeMap<EntityId, Body>,
    cues: Vec<Cue>,
}

impl Default for LocalRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalRuntime {
    pub fn new() -> Self {
        Self {
            available: true,
            next_id: 1,
            bodies: BTreeMap::new(),
            cues: Vec::new(),
        }
    }

    /// Runtime with no simulation world: every spawn fails.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn body(&self, entity: EntityId) -> Option<&Body> {
        self.bodies.get(&entity)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Adds a loose physics prop with no gameplay record (crates, barrels).
    pub fn spawn_prop(&mut self, location: Vec3, radius: f32, mass: f32) -> EntityId {
        let id = self.allocate();
        self.bodies.insert(
            id,
            Body {
                kind: None,
                location,
                rotation: Quat::IDENTITY,
                velocity: Vec3::ZERO,
                radius,
                mass,
                gravity: true,
                category: CollisionCategory::WORLD_DYNAMIC,
                dynamic: true,
            },
        );
        id
    }

    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Distance along a normalized ray to the first contact with a sphere.
fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        // Ray starts inside the sphere.
        return Some(0.0);
    }
    let b = oc.dot(dir);
    if b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    Some(-b - disc.sqrt())
}

impl EngineRuntime for LocalRuntime {
    fn spawn(&mut self, kind: EntityKind, location: Vec3, rotation: Quat) -> Result<EntityId, GameError> {
        if !self.available {
            return Err(GameError::SpawnFailure {
                kind,
                reason: "simulation world unavailable".to_string(),
            });
        }
        if !location.is_finite() {
            return Err(GameError::SpawnFailure {
                kind,
                reason: "non-finite spawn location".to_string(),
            });
        }
        let id = self.allocate();
        self.bodies.insert(id, Body::template(kind, location, rotation));
        debug!(entity = %id, ?kind, "body spawned");
        Ok(id)
    }

    fn destroy(&mut self, entity: EntityId) {
        if self.bodies.remove(&entity).is_some() {
            debug!(%entity, "body destroyed");
        }
    }

    fn location(&self, entity: EntityId) -> Option<Vec3> {
        self.bodies.get(&entity).map(|b| b.location)
    }

    fn set_linear_velocity(&mut self, entity: EntityId, velocity: Vec3) {
        match self.bodies.get_mut(&entity) {
            Some(body) if body.dynamic => body.velocity = velocity,
            Some(_) => warn!(%entity, "velocity set on static body; ignoring"),
            None => {}
        }
    }

    fn set_gravity(&mut self, entity: EntityId, enabled: bool) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            body.gravity = enabled;
        }
    }

    fn overlap(&self, center: Vec3, radius: f32, filter: CollisionCategory) -> Vec<EntityId> {
        self.bodies
            .iter()
            .filter(|(_, b)| b.category.intersects(filter))
            .filter(|(_, b)| b.location.distance(center) <= radius)
            .map(|(id, _)| *id)
            .collect()
    }

    fn line_trace(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: CollisionCategory,
        ignore: Option<EntityId>,
    ) -> Option<TraceHit> {
        let dir = direction.try_normalize()?;
        self.bodies
            .iter()
            .filter(|(id, b)| Some(**id) != ignore && b.category.intersects(filter))
            .filter_map(|(id, b)| {
                let t = ray_sphere(origin, dir, b.location, b.radius)?;
                (t <= max_distance).then_some(TraceHit {
                    entity: *id,
                    location: origin + dir * t,
                    distance: t,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn apply_radial_impulse(
        &mut self,
        entity: EntityId,
        center: Vec3,
        radius: f32,
        magnitude: f32,
        falloff: Falloff,
    ) {
        let Some(body) = self.bodies.get_mut(&entity) else {
            return;
        };
        if !body.dynamic || body.mass <= 0.0 {
            return;
        }
        let offset = body.location - center;
        let scale = falloff.scale(offset.length(), radius);
        if scale <= 0.0 {
            return;
        }
        let dir = offset.try_normalize().unwrap_or(Vec3::Z);
        body.velocity += dir * (magnitude * scale / body.mass);
    }

    fn play_effect(&mut self, effect: EffectId, location: Vec3) {
        self.cues.push(Cue::Effect(effect, location));
    }

    fn play_sound(&mut self, sound: SoundId, location: Vec3) {
        self.cues.push(Cue::Sound(sound, location));
    }

    fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut().filter(|b| b.dynamic) {
            if body.gravity {
                body.velocity.z -= GRAVITY * dt;
            }
            body.location += body.velocity * dt;
        }
    }
}
