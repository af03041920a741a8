// Session-scoped publish/subscribe hub for gameplay signals.
//
// Handlers receive the session context mutably, so a handler can change
// world state but cannot publish re-entrantly; follow-up signals go through
// the scheduled task queue instead.

use std::fmt;

use tracing::{debug, warn};

use crate::domain::entity::EntityId;
use crate::domain::errors::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    EntityDestroyed,
    SetLightsState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    EntityDestroyed,
    SetLightsState(bool),
}

impl Signal {
    pub fn channel(&self) -> Channel {
        match self {
            Signal::EntityDestroyed => Channel::EntityDestroyed,
            Signal::SetLightsState(_) => Channel::SetLightsState,
        }
    }
}

/// Identity a subscription is registered under, used for bulk removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscriber {
    RoundController,
    Entity(EntityId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<C> = Box<dyn FnMut(&mut C, Signal) -> Result<(), GameError> + Send>;

struct Subscription<C> {
    id: SubscriptionId,
    channel: Channel,
    owner: Subscriber,
    handler: Handler<C>,
}

/// Result of one publish: how many handlers ran and which of them failed.
#[derive(Debug, Default, PartialEq)]
pub struct Delivery {
    pub delivered: usize,
    pub failures: Vec<GameError>,
}

pub struct EventDispatcher<C> {
    // Registration order is delivery order.
    subscriptions: Vec<Subscription<C>>,
    next_id: u64,
}

impl<C> Default for EventDispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for EventDispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl<C> EventDispatcher<C> {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            next_id: 1,
        }
    }

    pub fn subscribe<F>(&mut self, channel: Channel, owner: Subscriber, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut C, Signal) -> Result<(), GameError> + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            channel,
            owner,
            handler: Box::new(handler),
        });
        debug!(?channel, ?owner, "subscribed");
        id
    }

    /// Removes one subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        before != self.subscriptions.len()
    }

    /// Removes every subscription registered by `owner`.
    pub fn unsubscribe_owner(&mut self, owner: Subscriber) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.owner != owner);
        before - self.subscriptions.len()
    }

    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.subscriptions
            .iter()
            .filter(|s| s.channel == channel)
            .count()
    }

    /// Runs every handler on the signal's channel, in subscription order.
    ///
    /// A failing handler does not stop delivery to the rest.
    pub fn publish(&mut self, ctx: &mut C, signal: Signal) -> Delivery {
        let channel = signal.channel();
        let mut delivery = Delivery::default();
        for sub in self.subscriptions.iter_mut().filter(|s| s.channel == channel) {
            delivery.delivered += 1;
            if let Err(e) = (sub.handler)(ctx, signal) {
                warn!(?channel, owner = ?sub.owner, error = %e, "signal handler failed");
                delivery.failures.push(e);
            }
        }
        debug!(?signal, delivered = delivery.delivered, "published");
        delivery
    }
}
