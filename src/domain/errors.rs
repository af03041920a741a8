// Domain-level errors for gameplay workflows.

use thiserror::Error;

use crate::domain::entity::{EntityId, EntityKind};

/// Failures observable at the call site of an authoritative operation.
///
/// Empty traces and overlaps are not errors; they resolve to `None` or an
/// empty list at the query site.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    /// A mutation reached an instance that is not the authority and had no
    /// upstream to forward it to.
    #[error("{operation} requires authority and no upstream is available")]
    AuthorityViolation { operation: &'static str },

    /// The targeted entity lacks the capability the operation needs.
    #[error("entity {entity} does not implement {capability}")]
    CapabilityMissing {
        entity: EntityId,
        capability: &'static str,
    },

    /// The simulation world could not create the requested entity.
    #[error("failed to spawn {kind:?}: {reason}")]
    SpawnFailure { kind: EntityKind, reason: String },

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("unknown player {0}")]
    UnknownPlayer(u64),

    /// `start_round` was called while the round already has a live enemy.
    #[error("round already in progress")]
    RoundInProgress,

    #[error("intent transport closed")]
    TransportClosed,

    #[error("intent transport full")]
    TransportFull,
}
