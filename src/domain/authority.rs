// Authority gate: every mutation either executes on the authority or is
// forwarded to it. There is no third path.

use crate::domain::errors::GameError;
use crate::domain::messages::Intent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Authority,
    Observer,
}

/// Transport that carries intents from an observer to the authority.
pub trait IntentSink {
    fn forward(&self, intent: Intent) -> Result<(), GameError>;
}

#[derive(Debug, PartialEq)]
pub enum Admission {
    /// This instance is the authority: run the mutation here.
    Execute(Intent),
    /// The intent was handed to the authority; the caller must return.
    Forwarded,
}

#[derive(Debug, Clone)]
pub struct AuthorityGate<S> {
    role: Role,
    upstream: Option<S>,
}

impl<S: IntentSink> AuthorityGate<S> {
    pub fn authority() -> Self {
        Self {
            role: Role::Authority,
            upstream: None,
        }
    }

    pub fn observer(upstream: S) -> Self {
        Self {
            role: Role::Observer,
            upstream: Some(upstream),
        }
    }

    /// Observer with no route to the authority. Every mutation is rejected.
    pub fn detached() -> Self {
        Self {
            role: Role::Observer,
            upstream: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_authority(&self) -> bool {
        self.role == Role::Authority
    }

    pub fn admit(&self, intent: Intent) -> Result<Admission, GameError> {
        match (self.role, &self.upstream) {
            (Role::Authority, _) => Ok(Admission::Execute(intent)),
            (Role::Observer, Some(upstream)) => {
                upstream.forward(intent)?;
                Ok(Admission::Forwarded)
            }
            (Role::Observer, None) => Err(GameError::AuthorityViolation {
                operation: intent.operation(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<Intent>>>,
        closed: bool,
    }

    impl IntentSink for RecordingSink {
        fn forward(&self, intent: Intent) -> Result<(), GameError> {
            if self.closed {
                return Err(GameError::TransportClosed);
            }
            self.sent.lock().expect("sent mutex poisoned").push(intent);
            Ok(())
        }
    }

    #[test]
    fn when_authority_then_intent_executes_locally() {
        let gate = AuthorityGate::<RecordingSink>::authority();
        assert!(gate.is_authority());
        let intent = Intent::Interact { player_id: 1 };
        assert_eq!(gate.admit(intent.clone()).unwrap(), Admission::Execute(intent));
    }

    #[test]
    fn when_observer_then_intent_is_forwarded_not_executed() {
        let sink = RecordingSink::default();
        let gate = AuthorityGate::observer(sink.clone());
        assert!(!gate.is_authority());
        let intent = Intent::Fire { player_id: 3 };
        assert_eq!(gate.admit(intent.clone()).unwrap(), Admission::Forwarded);
        assert_eq!(*sink.sent.lock().unwrap(), vec![intent]);
    }

    #[test]
    fn when_observer_has_no_upstream_then_mutation_fails_closed() {
        let gate = AuthorityGate::<RecordingSink>::detached();
        let err = gate.admit(Intent::Interact { player_id: 1 }).unwrap_err();
        assert_eq!(err, GameError::AuthorityViolation { operation: "interact" });
    }

    #[test]
    fn when_upstream_closed_then_error_surfaces() {
        let sink = RecordingSink {
            closed: true,
            ..RecordingSink::default()
        };
        let gate = AuthorityGate::observer(sink);
        let err = gate
            .admit(Intent::ApplyDamage {
                target: crate::domain::EntityId(1),
                amount: 5.0,
            })
            .unwrap_err();
        assert_eq!(err, GameError::TransportClosed);
    }
}
