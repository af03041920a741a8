// World task: the fixed-step loop that owns the authoritative session,
// drains queued intents and broadcasts one update per tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, broadcast, mpsc};
use tracing::{debug, info, warn};

use super::instance::GameInstance;
use super::session::Session;
use super::types::WorldUpdate;
use crate::domain::{EngineRuntime, GameError, Intent};

/// Authoritative simulation loop.
///
/// Drains queued intents once per tick, advances the session by one fixed
/// step and publishes the tick's broadcasts plus a full snapshot. Hands
/// the session back when `shutdown` fires.
pub async fn world_task<R: EngineRuntime + 'static>(
    session: Session<R>,
    mut intent_rx: mpsc::Receiver<Intent>,
    world_tx: broadcast::Sender<WorldUpdate>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) -> Option<Session<R>> {
    let mut instance: GameInstance<R, mpsc::Sender<Intent>> = GameInstance::authority(session);
    let mut tick: u64 = 0;

    // Fixed-step loop at the configured tick rate.
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(?tick_interval, "world task started");
    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                break;
            }
            _ = interval.tick() => {}
        }

        while let Ok(intent) = intent_rx.try_recv() {
            let operation = intent.operation();
            match instance.submit(intent) {
                Ok(result) => debug!(operation, ?result, "intent executed"),
                Err(e @ GameError::CapabilityMissing { .. }) => {
                    debug!(operation, error = %e, "intent rejected")
                }
                Err(e) => warn!(operation, error = %e, "intent failed"),
            }
        }

        let Some(session) = instance.session_mut() else {
            break;
        };
        session.tick(tick_interval);

        tick += 1;
        let _ = world_tx.send(WorldUpdate {
            tick,
            events: session.drain_broadcasts(),
            entities: session.snapshot(),
        });
    }

    info!(tick, "world task stopped");
    instance.into_session()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Broadcast, EntityKind};
    use crate::use_cases::replica::Replica;
    use crate::use_cases::test_support::session_with_seed;

    #[tokio::test]
    async fn when_damage_intent_queued_then_destruction_is_broadcast_and_enemy_respawns() {
        let mut session = session_with_seed(3);
        let enemy = session.start_round().unwrap();

        let (intent_tx, intent_rx) = mpsc::channel(16);
        let (world_tx, mut world_rx) = broadcast::channel(256);
        let shutdown = Arc::new(Notify::new());
        let task = tokio::spawn(world_task(
            session,
            intent_rx,
            world_tx,
            Duration::from_millis(5),
            shutdown.clone(),
        ));

        intent_tx
            .send(Intent::ApplyDamage {
                target: enemy,
                amount: 100.0,
            })
            .await
            .unwrap();

        let mut replica = Replica::new();
        let destroyed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let update = world_rx.recv().await.unwrap();
                replica.apply(&update);
                let hit = update
                    .events
                    .iter()
                    .any(|e| matches!(e, Broadcast::DestroyEntity { entity, .. } if *entity == enemy));
                if hit {
                    return update;
                }
            }
        })
        .await
        .unwrap();

        assert!(destroyed.entities.iter().all(|e| e.id != enemy));
        assert_eq!(replica.explosions_played(), 1);
        assert!(replica.entity(enemy).is_none());
        assert_eq!(replica.len(), destroyed.entities.len());
        assert_eq!(
            destroyed
                .entities
                .iter()
                .filter(|e| e.kind == EntityKind::Enemy)
                .count(),
            1
        );

        shutdown.notify_one();
        let session = task.await.unwrap().unwrap();
        assert_eq!(session.round().spawned(), 2);
    }

    #[tokio::test]
    async fn tick_numbers_increase_monotonically() {
        let session = session_with_seed(4);
        let (_intent_tx, intent_rx) = mpsc::channel(1);
        let (world_tx, mut world_rx) = broadcast::channel(64);
        let shutdown = Arc::new(Notify::new());
        let task = tokio::spawn(world_task(
            session,
            intent_rx,
            world_tx,
            Duration::from_millis(2),
            shutdown.clone(),
        ));

        let first = world_rx.recv().await.unwrap().tick;
        let second = world_rx.recv().await.unwrap().tick;
        assert!(second > first);

        shutdown.notify_one();
        task.await.unwrap();
    }
}
