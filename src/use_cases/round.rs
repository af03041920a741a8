// Round controller: spawn policy and the endless respawn loop.

use glam::Vec3;
use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, error, info};

use crate::domain::tuning::RoundSettings;
use crate::domain::{EngineRuntime, EntityId, GameError};
use crate::use_cases::stage::{Stage, TimedTask};

/// Keeps at most one enemy alive and replaces it when it is destroyed.
///
/// Respawning never ends; there is no win or loss condition.
#[derive(Debug)]
pub struct RoundController {
    settings: RoundSettings,
    rng: StdRng,
    live_enemy: Option<EntityId>,
    spawned: u64,
    last_failure: Option<GameError>,
}

impl RoundController {
    pub fn new(settings: RoundSettings, rng: StdRng) -> Self {
        Self {
            settings,
            rng,
            live_enemy: None,
            spawned: 0,
            last_failure: None,
        }
    }

    pub fn settings(&self) -> &RoundSettings {
        &self.settings
    }

    pub fn live_enemy(&self) -> Option<EntityId> {
        self.live_enemy
    }

    /// Total enemies spawned since the controller was created.
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    /// Most recent spawn failure, kept for reporting.
    pub fn last_failure(&self) -> Option<&GameError> {
        self.last_failure.as_ref()
    }

    fn random_vec(&mut self, extent: f32) -> Vec3 {
        let extent = extent.abs();
        Vec3::new(
            self.rng.gen_range(-extent..=extent),
            self.rng.gen_range(-extent..=extent),
            self.rng.gen_range(-extent..=extent),
        )
    }

    /// Spawns one enemy at a random point in the arena with a random
    /// velocity. With `with_lights`, lights come back on after the delay.
    pub fn spawn_enemy<R: EngineRuntime>(
        &mut self,
        stage: &mut Stage<R>,
        with_lights: bool,
    ) -> Result<EntityId, GameError> {
        let mut location = self.random_vec(self.settings.spawn_extent);
        location.z = self.settings.spawn_height;
        let velocity = self.random_vec(self.settings.velocity_extent);

        let id = match stage.spawn_enemy(location, velocity) {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "enemy spawn failed");
                self.last_failure = Some(e.clone());
                return Err(e);
            }
        };

        self.live_enemy = Some(id);
        self.spawned += 1;
        if with_lights {
            stage.schedule(self.settings.lights_delay, TimedTask::PublishLights(true));
        }
        info!(entity = %id, spawned = self.spawned, with_lights, "enemy spawned");
        Ok(id)
    }

    /// `EntityDestroyed` handler: replaces the live enemy once it is gone.
    pub fn on_entity_destroyed<R: EngineRuntime>(&mut self, stage: &mut Stage<R>) -> Result<(), GameError> {
        if let Some(id) = self.live_enemy {
            if stage.entity(id).is_some() {
                debug!(entity = %id, "live enemy still present; no respawn");
                return Ok(());
            }
        }
        self.live_enemy = None;
        self.spawn_enemy(stage, true).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface_adapters::engine::LocalRuntime;
    use crate::use_cases::stage::StageTuning;
    use rand::SeedableRng;

    fn controller() -> RoundController {
        RoundController::new(RoundSettings::default(), StdRng::seed_from_u64(7))
    }

    #[test]
    fn spawned_enemy_lies_inside_the_arena_box() {
        let mut stage = Stage::new(LocalRuntime::new(), StageTuning::default());
        let mut round = controller();
        let settings = *round.settings();
        assert_eq!(settings.spawn_extent, 1250.0);
        for _ in 0..20 {
            let id = round.spawn_enemy(&mut stage, false).unwrap();
            let body = stage.runtime().body(id).unwrap();
            assert!(body.location.x.abs() <= settings.spawn_extent);
            assert!(body.location.y.abs() <= settings.spawn_extent);
            assert_eq!(body.location.z, settings.spawn_height);
            assert!(body.velocity.abs().max_element() <= settings.velocity_extent);
        }
        assert_eq!(stage.pending_timers(), 0);
    }

    #[test]
    fn when_spawning_with_lights_then_a_timer_is_queued() {
        let mut stage = Stage::new(LocalRuntime::new(), StageTuning::default());
        let mut round = controller();
        round.spawn_enemy(&mut stage, true).unwrap();
        assert_eq!(stage.pending_timers(), 1);
    }

    #[test]
    fn when_world_unavailable_then_failure_is_surfaced_and_recorded() {
        let mut stage = Stage::new(LocalRuntime::unavailable(), StageTuning::default());
        let mut round = controller();
        let err = round.spawn_enemy(&mut stage, false).unwrap_err();
        assert!(matches!(err, GameError::SpawnFailure { .. }));
        assert_eq!(round.last_failure(), Some(&err));
        assert_eq!(round.spawned(), 0);
        assert!(round.live_enemy().is_none());
    }

    #[test]
    fn when_live_enemy_still_present_then_no_respawn() {
        let mut stage = Stage::new(LocalRuntime::new(), StageTuning::default());
        let mut round = controller();
        round.spawn_enemy(&mut stage, false).unwrap();
        round.on_entity_destroyed(&mut stage).unwrap();
        assert_eq!(round.spawned(), 1);
    }
}
