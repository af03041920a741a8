// Game instance: the single entry point for mutations on any instance.
//
// Observers forward every intent to the authority and return; the authority
// executes against its session. Broadcasting the results is the session's job.

use glam::Vec3;
use tokio::sync::mpsc;

use crate::domain::{Admission, AuthorityGate, EngineRuntime, EntityId, GameError, Intent, IntentSink, Role};
use crate::use_cases::session::{Executed, Session};

impl IntentSink for mpsc::Sender<Intent> {
    fn forward(&self, intent: Intent) -> Result<(), GameError> {
        self.try_send(intent).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => GameError::TransportFull,
            mpsc::error::TrySendError::Closed(_) => GameError::TransportClosed,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submitted {
    Executed(Executed),
    Forwarded,
}

pub struct GameInstance<R, S> {
    gate: AuthorityGate<S>,
    // Present exactly when the gate grants authority.
    session: Option<Session<R>>,
}

impl<R: EngineRuntime + 'static, S: IntentSink> GameInstance<R, S> {
    pub fn authority(session: Session<R>) -> Self {
        Self {
            gate: AuthorityGate::authority(),
            session: Some(session),
        }
    }

    pub fn observer(upstream: S) -> Self {
        Self {
            gate: AuthorityGate::observer(upstream),
            session: None,
        }
    }

    pub fn role(&self) -> Role {
        self.gate.role()
    }

    pub fn session(&self) -> Option<&Session<R>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session<R>> {
        self.session.as_mut()
    }

    pub fn into_session(self) -> Option<Session<R>> {
        self.session
    }

    pub fn submit(&mut self, intent: Intent) -> Result<Submitted, GameError> {
        let intent = match self.gate.admit(intent)? {
            Admission::Forwarded => return Ok(Submitted::Forwarded),
            Admission::Execute(intent) => intent,
        };
        let session = self.session.as_mut().ok_or(GameError::AuthorityViolation {
            operation: intent.operation(),
        })?;
        session.execute(intent).map(Submitted::Executed)
    }

    pub fn apply_damage(&mut self, target: EntityId, amount: f32) -> Result<Submitted, GameError> {
        self.submit(Intent::ApplyDamage { target, amount })
    }

    pub fn interact(&mut self, player_id: u64) -> Result<Submitted, GameError> {
        self.submit(Intent::Interact { player_id })
    }

    pub fn fire(&mut self, player_id: u64) -> Result<Submitted, GameError> {
        self.submit(Intent::Fire { player_id })
    }

    pub fn aim(&mut self, player_id: u64, look: Vec3) -> Result<Submitted, GameError> {
        self.submit(Intent::Aim { player_id, look })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DamageOutcome;
    use crate::interface_adapters::engine::LocalRuntime;
    use crate::use_cases::test_support::session_with_seed;

    type Instance = GameInstance<LocalRuntime, mpsc::Sender<Intent>>;

    #[test]
    fn when_observer_submits_damage_then_intent_reaches_authority_queue() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut observer = Instance::observer(tx);
        let submitted = observer.apply_damage(EntityId(1), 25.0).unwrap();
        assert_eq!(submitted, Submitted::Forwarded);
        assert!(observer.session().is_none());
        assert_eq!(
            rx.try_recv().unwrap(),
            Intent::ApplyDamage {
                target: EntityId(1),
                amount: 25.0
            }
        );
    }

    #[test]
    fn when_authority_stops_listening_then_observer_sees_transport_closed() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let mut observer = Instance::observer(tx);
        assert_eq!(observer.fire(1).unwrap_err(), GameError::TransportClosed);
    }

    #[test]
    fn when_authority_queue_full_then_observer_sees_backpressure() {
        let (tx, _rx) = mpsc::channel(1);
        let mut observer = Instance::observer(tx);
        observer.interact(1).unwrap();
        assert_eq!(observer.interact(1).unwrap_err(), GameError::TransportFull);
    }

    #[test]
    fn when_authority_submits_damage_then_session_executes_it() {
        let mut session = session_with_seed(1);
        let enemy = session.start_round().unwrap();
        let mut authority = Instance::authority(session);
        assert_eq!(authority.role(), Role::Authority);

        let submitted = authority.apply_damage(enemy, 70.0).unwrap();
        assert_eq!(
            submitted,
            Submitted::Executed(Executed::Damaged(DamageOutcome::DamageEffects))
        );
        let health = authority
            .session()
            .and_then(|s| s.stage().entity(enemy))
            .and_then(|e| e.health)
            .unwrap();
        assert_eq!(health.current(), 30.0);
    }
}
