//! Event plumbing for inter-system communication.
//!
//! Two shapes are provided:
//! - [`Emitter`]: per-component observer list. Handlers run synchronously
//!   right after the owning component has finished mutating its state.
//! - [`EventBus`]: bounded channel for progression-level [`GameEvent`]s that
//!   UI collaborators drain once per frame.

use std::fmt;

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use shade_common::EntityId;

use crate::ability::AbilityKind;
use crate::weapon::WeaponType;

/// Handle returned by [`Emitter::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Box<dyn FnMut(&E) + Send>;

/// Observer list owned by a single component.
pub struct Emitter<E> {
    handlers: Vec<(SubscriptionId, Handler<E>)>,
    next_id: u64,
}

impl<E> Default for Emitter<E> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 1,
        }
    }
}

impl<E> fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}

impl<E> Emitter<E> {
    /// Creates an emitter with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. Handlers are invoked in subscription order.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&E) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Removes a handler. Returns false if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _)| *sub != id);
        self.handlers.len() != before
    }

    /// Drops every subscriber (entity teardown).
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    /// Delivers an event to every subscriber.
    pub fn emit(&mut self, event: &E) {
        for (_, handler) in &mut self.handlers {
            handler(event);
        }
    }
}

/// Progression and presentation events broadcast through the [`EventBus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// The player's weapon form changed
    WeaponChanged {
        /// New weapon form
        weapon: WeaponType,
    },
    /// An ability level was raised
    AbilityUpgraded {
        /// Ability that changed
        ability: AbilityKind,
        /// New level
        level: u32,
    },
    /// The shadow fragment balance changed
    ShadowFragmentsChanged {
        /// New balance
        balance: u32,
    },
    /// A character died
    EntityDied {
        /// Entity ID
        entity_id: EntityId,
    },
}

/// Event bus for broadcasting events to subscribers.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<GameEvent>,
    /// Receiver for collecting events
    receiver: Receiver<GameEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: GameEvent) {
        // Non-blocking send - if full, event is dropped
        if self.sender.try_send(event).is_err() {
            tracing::warn!("event bus full, dropping event");
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle for publishing events.
    #[must_use]
    pub fn sender(&self) -> Sender<GameEvent> {
        self.sender.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_emitter_delivers_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut emitter = Emitter::<u32>::new();

        let a = Arc::clone(&seen);
        emitter.subscribe(move |v| a.lock().push(("a", *v)));
        let b = Arc::clone(&seen);
        emitter.subscribe(move |v| b.lock().push(("b", *v)));

        emitter.emit(&7);
        assert_eq!(*seen.lock(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_emitter_unsubscribe() {
        let count = Arc::new(Mutex::new(0));
        let mut emitter = Emitter::<()>::new();

        let c = Arc::clone(&count);
        let id = emitter.subscribe(move |()| *c.lock() += 1);
        emitter.emit(&());
        assert!(emitter.unsubscribe(id));
        assert!(!emitter.unsubscribe(id));
        emitter.emit(&());

        assert_eq!(*count.lock(), 1);
        assert_eq!(emitter.subscriber_count(), 0);
    }

    #[test]
    fn test_event_bus_drain() {
        let bus = EventBus::new(4);
        bus.publish(GameEvent::ShadowFragmentsChanged { balance: 3 });
        bus.sender()
            .try_send(GameEvent::WeaponChanged {
                weapon: WeaponType::Scythe,
            })
            .ok();

        assert_eq!(bus.pending_count(), 2);
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_event_bus_drops_when_full() {
        let bus = EventBus::new(1);
        bus.publish(GameEvent::ShadowFragmentsChanged { balance: 1 });
        bus.publish(GameEvent::ShadowFragmentsChanged { balance: 2 });
        assert_eq!(bus.drain(), vec![GameEvent::ShadowFragmentsChanged { balance: 1 }]);
    }
}
