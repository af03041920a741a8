// Entity records: identity plus an optional set of capabilities.

use std::fmt;

use glam::Vec3;

use crate::domain::health::{DamageFx, Health};
use crate::domain::light::LightFixture;

/// Handle issued by the engine runtime when an entity is spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Projectiles live in their own id space; they are never runtime bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectileId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Enemy,
    Light,
    Character,
}

/// Eye position and look direction of a controlling agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    pub player_id: u64,
    pub eye_height: f32,
    // Always normalized.
    pub look: Vec3,
}

impl Viewpoint {
    pub fn new(player_id: u64, eye_height: f32) -> Self {
        Self {
            player_id,
            eye_height,
            look: Vec3::X,
        }
    }

    /// Points the view along `look`. Zero-length or non-finite vectors are
    /// ignored and return false.
    pub fn aim(&mut self, look: Vec3) -> bool {
        match look.try_normalize() {
            Some(dir) => {
                self.look = dir;
                true
            }
            None => false,
        }
    }

    pub fn eye_position(&self, body_location: Vec3) -> Vec3 {
        body_location + Vec3::Z * self.eye_height
    }
}

/// Capability for entities that react to a `Use` request.
pub trait Interactable {
    /// Performs the use action and returns the resulting lit state.
    fn use_entity(&mut self) -> bool;
}

/// Authoritative record for one spawned entity.
///
/// Behaviour is selected by which capabilities are present, not by kind.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    pub id: EntityId,
    pub kind: EntityKind,
    pub health: Option<Health>,
    pub damage_fx: Option<DamageFx>,
    pub light: Option<LightFixture>,
    pub viewpoint: Option<Viewpoint>,
}

impl EntityRecord {
    pub fn enemy(id: EntityId, max_health: f32) -> Self {
        Self {
            id,
            kind: EntityKind::Enemy,
            health: Some(Health::new(max_health)),
            damage_fx: Some(DamageFx::default()),
            light: None,
            viewpoint: None,
        }
    }

    pub fn light(id: EntityId) -> Self {
        Self {
            id,
            kind: EntityKind::Light,
            health: None,
            damage_fx: None,
            light: Some(LightFixture::default()),
            viewpoint: None,
        }
    }

    pub fn character(id: EntityId, viewpoint: Viewpoint) -> Self {
        Self {
            id,
            kind: EntityKind::Character,
            health: None,
            damage_fx: None,
            light: None,
            viewpoint: Some(viewpoint),
        }
    }

    pub fn is_damageable(&self) -> bool {
        self.health.is_some()
    }

    pub fn interactable_mut(&mut self) -> Option<&mut dyn Interactable> {
        self.light.as_mut().map(|light| light as &mut dyn Interactable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_aiming_with_zero_vector_then_look_is_unchanged() {
        let mut view = Viewpoint::new(7, 64.0);
        assert!(!view.aim(Vec3::ZERO));
        assert!(!view.aim(Vec3::new(f32::NAN, 0.0, 0.0)));
        assert_eq!(view.look, Vec3::X);
    }

    #[test]
    fn when_aiming_then_look_is_normalized() {
        let mut view = Viewpoint::new(7, 64.0);
        assert!(view.aim(Vec3::new(0.0, 10.0, 0.0)));
        assert_eq!(view.look, Vec3::Y);
        assert_eq!(view.eye_position(Vec3::ZERO), Vec3::new(0.0, 0.0, 64.0));
    }

    #[test]
    fn only_lights_expose_the_interactable_capability() {
        let mut light = EntityRecord::light(EntityId(1));
        let mut enemy = EntityRecord::enemy(EntityId(2), 100.0);
        assert!(light.interactable_mut().is_some());
        assert!(enemy.interactable_mut().is_none());
        assert!(enemy.is_damageable());
        assert!(!light.is_damageable());
    }
}
