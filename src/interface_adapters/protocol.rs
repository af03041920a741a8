// Wire protocol DTOs and conversions for public game server messages.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::domain::{Broadcast, EntityKind, EntitySnapshot};
use crate::use_cases::WorldUpdate;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned identity for the connection, sent before anything else.
    Identity { player_id: u64 },
    // Broadcasts and replicated state for a given tick.
    WorldUpdate(WorldUpdateDto),
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    Aim { look: Vec3 },
    Interact,
    Fire,
    Damage { target: u64, amount: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKindDto {
    Enemy,
    Light,
    Character,
}

impl From<EntityKind> for EntityKindDto {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Enemy => EntityKindDto::Enemy,
            EntityKind::Light => EntityKindDto::Light,
            EntityKind::Character => EntityKindDto::Character,
        }
    }
}

/// Reliable event raised during a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventDto {
    EntitySpawned {
        entity: u64,
        kind: EntityKindDto,
        location: Vec3,
    },
    EntityRemoved {
        entity: u64,
    },
    HealthChanged {
        entity: u64,
        current: f32,
    },
    PlayDamageEffects {
        entity: u64,
    },
    DestroyEntity {
        entity: u64,
        location: Vec3,
    },
    LightState {
        entity: u64,
        lit: bool,
    },
    ProjectileSpawned {
        projectile: u64,
        owner: u64,
        location: Vec3,
        velocity: Vec3,
    },
    ProjectileDetonated {
        projectile: u64,
        location: Vec3,
    },
    ProjectileExpired {
        projectile: u64,
    },
}

impl From<&Broadcast> for EventDto {
    fn from(event: &Broadcast) -> Self {
        match *event {
            Broadcast::EntitySpawned {
                entity,
                kind,
                location,
            } => EventDto::EntitySpawned {
                entity: entity.0,
                kind: kind.into(),
                location,
            },
            Broadcast::EntityRemoved { entity } => EventDto::EntityRemoved { entity: entity.0 },
            Broadcast::HealthChanged { entity, current } => EventDto::HealthChanged {
                entity: entity.0,
                current,
            },
            Broadcast::PlayDamageEffects { entity } => {
                EventDto::PlayDamageEffects { entity: entity.0 }
            }
            Broadcast::DestroyEntity { entity, location } => EventDto::DestroyEntity {
                entity: entity.0,
                location,
            },
            Broadcast::LightState { entity, lit } => EventDto::LightState {
                entity: entity.0,
                lit,
            },
            Broadcast::ProjectileSpawned {
                projectile,
                owner,
                location,
                velocity,
            } => EventDto::ProjectileSpawned {
                projectile: projectile.0,
                owner: owner.0,
                location,
                velocity,
            },
            Broadcast::ProjectileDetonated {
                projectile,
                location,
            } => EventDto::ProjectileDetonated {
                projectile: projectile.0,
                location,
            },
            Broadcast::ProjectileExpired { projectile } => EventDto::ProjectileExpired {
                projectile: projectile.0,
            },
        }
    }
}

/// Flattened entity state for wire transmission in world updates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityStateDto {
    pub id: u64,
    pub kind: EntityKindDto,
    pub location: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<f32>,
    pub sparks_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<[f32; 3]>,
}

impl From<&EntitySnapshot> for EntityStateDto {
    fn from(entity: &EntitySnapshot) -> Self {
        Self {
            id: entity.id.0,
            kind: entity.kind.into(),
            location: entity.location,
            health: entity.health,
            sparks_visible: entity.sparks_visible,
            lit: entity.lit,
            color: entity.color.map(|c| [c.r, c.g, c.b]),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub events: Vec<EventDto>,
    pub entities: Vec<EntityStateDto>,
}

impl From<WorldUpdate> for WorldUpdateDto {
    fn from(update: WorldUpdate) -> Self {
        Self {
            tick: update.tick,
            events: update.events.iter().map(EventDto::from).collect(),
            entities: update.entities.iter().map(EntityStateDto::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntityId, LinearColor};
    use serde_json::json;

    #[test]
    fn identity_uses_the_type_and_data_envelope() {
        let txt = serde_json::to_value(ServerMessage::Identity { player_id: 42 }).unwrap();
        assert_eq!(txt, json!({"type": "Identity", "data": {"player_id": 42}}));
    }

    #[test]
    fn client_messages_parse_from_the_envelope() {
        let aim: ClientMessage =
            serde_json::from_str(r#"{"type":"Aim","data":{"look":[0.0,1.0,0.0]}}"#).unwrap();
        assert_eq!(aim, ClientMessage::Aim { look: Vec3::Y });

        let fire: ClientMessage = serde_json::from_str(r#"{"type":"Fire"}"#).unwrap();
        assert_eq!(fire, ClientMessage::Fire);

        let damage: ClientMessage =
            serde_json::from_str(r#"{"type":"Damage","data":{"target":3,"amount":12.5}}"#).unwrap();
        assert_eq!(
            damage,
            ClientMessage::Damage {
                target: 3,
                amount: 12.5
            }
        );
    }

    #[test]
    fn unknown_client_message_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"Teleport"}"#).is_err());
    }

    #[test]
    fn world_update_flattens_events_and_entities() {
        let update = WorldUpdate {
            tick: 7,
            events: vec![Broadcast::LightState {
                entity: EntityId(2),
                lit: false,
            }],
            entities: vec![EntitySnapshot {
                id: EntityId(2),
                kind: EntityKind::Light,
                location: Vec3::new(1.0, 2.0, 3.0),
                health: None,
                sparks_visible: true,
                lit: Some(false),
                color: Some(LinearColor::RED),
            }],
        };
        let value = serde_json::to_value(ServerMessage::WorldUpdate(update.into())).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "WorldUpdate",
                "data": {
                    "tick": 7,
                    "events": [{"event": "light_state", "entity": 2, "lit": false}],
                    "entities": [{
                        "id": 2,
                        "kind": "light",
                        "location": [1.0, 2.0, 3.0],
                        "sparks_visible": true,
                        "lit": false,
                        "color": [1.0, 0.0, 0.0]
                    }]
                }
            })
        );
    }
}
