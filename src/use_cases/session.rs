// Authoritative session: stage, round controller and the event dispatcher
// that connects them.

use std::time::Duration;

use glam::Vec3;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::domain::dispatcher::{Delivery, Subscriber};
use crate::domain::tuning::RoundSettings;
use crate::domain::{
    Broadcast, Channel, DamageOutcome, EngineRuntime, EntityId, EntitySnapshot, EventDispatcher,
    GameError, Intent, ProjectileId, Signal,
};
use crate::use_cases::round::RoundController;
use crate::use_cases::stage::{InteractOutcome, Stage, StageTuning, TimedTask};

/// Context handed to dispatcher handlers.
pub struct World<R> {
    pub stage: Stage<R>,
    pub round: RoundController,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionSettings {
    pub round: RoundSettings,
    pub tuning: StageTuning,
}

/// Result of an intent executed on the authority.
#[derive(Debug, Clone, PartialEq)]
pub enum Executed {
    Joined(EntityId),
    Left(Option<EntityId>),
    Aimed(bool),
    Interacted(InteractOutcome),
    Fired(ProjectileId),
    Damaged(DamageOutcome),
}

pub struct Session<R> {
    world: World<R>,
    dispatcher: EventDispatcher<World<R>>,
    round_subscribed: bool,
}

impl<R: EngineRuntime + 'static> Session<R> {
    /// Creates the session and its dispatcher. Nothing is spawned until
    /// `start_round`.
    pub fn new(runtime: R, settings: SessionSettings, rng: StdRng) -> Self {
        Self {
            world: World {
                stage: Stage::new(runtime, settings.tuning),
                round: RoundController::new(settings.round, rng),
            },
            dispatcher: EventDispatcher::new(),
            round_subscribed: false,
        }
    }

    pub fn stage(&self) -> &Stage<R> {
        &self.world.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage<R> {
        &mut self.world.stage
    }

    pub fn round(&self) -> &RoundController {
        &self.world.round
    }

    pub fn dispatcher(&self) -> &EventDispatcher<World<R>> {
        &self.dispatcher
    }

    /// Spawns the first enemy and hooks the round controller to
    /// `EntityDestroyed` so every destruction triggers one respawn.
    pub fn start_round(&mut self) -> Result<EntityId, GameError> {
        if let Some(id) = self.world.round.live_enemy() {
            if self.world.stage.entity(id).is_some() {
                return Err(GameError::RoundInProgress);
            }
        }

        let World { stage, round } = &mut self.world;
        let enemy = round.spawn_enemy(stage, false)?;

        if !self.round_subscribed {
            self.dispatcher.subscribe(
                Channel::EntityDestroyed,
                Subscriber::RoundController,
                |world: &mut World<R>, _| {
                    let World { stage, round } = world;
                    round.on_entity_destroyed(stage)
                },
            );
            self.round_subscribed = true;
        }
        info!(entity = %enemy, "round started");
        Ok(enemy)
    }

    /// Places a light fixture and subscribes it to the lighting signals.
    pub fn add_light(&mut self, location: Vec3) -> Result<EntityId, GameError> {
        let id = self.world.stage.spawn_light(location)?;
        let owner = Subscriber::Entity(id);

        self.dispatcher
            .subscribe(Channel::EntityDestroyed, owner, move |world: &mut World<R>, _| {
                world.stage.set_light_state(id, false)
            });
        self.dispatcher
            .subscribe(Channel::SetLightsState, owner, move |world: &mut World<R>, signal| {
                match signal {
                    Signal::SetLightsState(lit) => world.stage.set_light_state(id, lit),
                    Signal::EntityDestroyed => Ok(()),
                }
            });
        debug!(entity = %id, "light registered");
        Ok(id)
    }

    pub fn publish(&mut self, signal: Signal) -> Delivery {
        self.dispatcher.publish(&mut self.world, signal)
    }

    fn entity_destroyed(&mut self, id: EntityId) {
        self.dispatcher.unsubscribe_owner(Subscriber::Entity(id));
        let delivery = self.publish(Signal::EntityDestroyed);
        if !delivery.failures.is_empty() {
            warn!(entity = %id, failures = delivery.failures.len(), "destroy signal had failing handlers");
        }
    }

    pub fn apply_damage(&mut self, target: EntityId, amount: f32) -> Result<DamageOutcome, GameError> {
        let outcome = self.world.stage.apply_damage(target, amount)?;
        if outcome == DamageOutcome::Destroyed {
            self.entity_destroyed(target);
        }
        Ok(outcome)
    }

    /// Runs an intent. Only reachable through the authority path of a
    /// `GameInstance` or directly on the authoritative session.
    pub fn execute(&mut self, intent: Intent) -> Result<Executed, GameError> {
        match intent {
            Intent::Join { player_id } => self.world.stage.join(player_id).map(Executed::Joined),
            Intent::Leave { player_id } => {
                let left = self.world.stage.leave(player_id);
                if let Some(id) = left {
                    self.dispatcher.unsubscribe_owner(Subscriber::Entity(id));
                }
                Ok(Executed::Left(left))
            }
            Intent::Aim { player_id, look } => {
                self.world.stage.aim(player_id, look).map(Executed::Aimed)
            }
            Intent::Interact { player_id } => self
                .world
                .stage
                .interact(player_id)
                .map(Executed::Interacted),
            Intent::Fire { player_id } => self.world.stage.fire(player_id).map(Executed::Fired),
            Intent::ApplyDamage { target, amount } => {
                self.apply_damage(target, amount).map(Executed::Damaged)
            }
        }
    }

    /// Advances one simulation tick: timers, projectiles, physics, lamps.
    pub fn tick(&mut self, dt: Duration) {
        for task in self.world.stage.advance_timers(dt) {
            match task {
                TimedTask::PublishLights(lit) => {
                    self.publish(Signal::SetLightsState(lit));
                }
            }
        }

        let secs = dt.as_secs_f32();
        for id in self.world.stage.tick_projectiles(secs) {
            self.entity_destroyed(id);
        }
        self.world.stage.step(secs);
        self.world.stage.recolor_lights();
    }

    pub fn drain_broadcasts(&mut self) -> Vec<Broadcast> {
        self.world.stage.drain_broadcasts()
    }

    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        self.world.stage.snapshot()
    }
}
