// Domain layer: authoritative gameplay rules, free of any async runtime.

pub mod authority;
pub mod dispatcher;
pub mod entity;
pub mod errors;
pub mod health;
pub mod light;
pub mod messages;
pub mod ports;
pub mod scheduler;
pub mod systems;
pub mod tuning;

pub use authority::{Admission, AuthorityGate, IntentSink, Role};
pub use dispatcher::{Channel, EventDispatcher, Signal, SubscriptionId};
pub use entity::{EntityId, EntityKind, EntityRecord, Interactable, ProjectileId, Viewpoint};
pub use errors::GameError;
pub use health::{DamageOutcome, DamageState, Health};
pub use light::{LightFixture, LinearColor};
pub use messages::{Broadcast, EntitySnapshot, Intent};
pub use ports::{CollisionCategory, EffectId, EngineRuntime, Falloff, SoundId, TraceHit};
pub use scheduler::TaskQueue;
