//! Enemy finite-state machine core.
//!
//! This module provides:
//! - The closed [`EnemyState`] set and the distance classifier
//! - [`StateRecord`], the active state plus its `can_change_state` guard
//! - [`EnemyStateMachine`], which honours the guard on every request

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::{Emitter, SubscriptionId};

/// Enemy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    /// Spawned, settling onto the ground
    Appearing,
    /// Standing still
    Idle,
    /// Moving (patrol or chase)
    Move,
    /// Attacking
    Attack,
    /// Reacting to a hit
    Hit,
    /// Dead (absorbing)
    Dead,
}

impl EnemyState {
    /// States that lock the machine on entry until released.
    #[must_use]
    pub const fn locks_on_entry(self) -> bool {
        matches!(self, Self::Appearing | Self::Attack | Self::Hit | Self::Dead)
    }
}

/// Distance-based classification.
///
/// `Dead` is absorbing and `Hit`/`Appearing` are held; otherwise the
/// attack range wins over the chase range.
#[must_use]
pub fn classify(current: EnemyState, distance: f32, chase_range: f32, attack_range: f32) -> EnemyState {
    match current {
        EnemyState::Dead | EnemyState::Hit | EnemyState::Appearing => current,
        _ if distance <= attack_range => EnemyState::Attack,
        _ if distance <= chase_range => EnemyState::Move,
        _ => EnemyState::Idle,
    }
}

/// The active state and its guard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    /// Active state
    pub state: EnemyState,
    /// Whether a transition request is honoured
    pub can_change_state: bool,
    /// Machine clock at entry
    pub entered_at: f64,
    /// Seconds spent in this state
    pub elapsed: f32,
}

impl StateRecord {
    fn enter(state: EnemyState, now: f64) -> Self {
        Self {
            state,
            can_change_state: !state.locks_on_entry(),
            entered_at: now,
            elapsed: 0.0,
        }
    }
}

/// Lifecycle notifications for the animation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyEvent {
    /// A transition happened.
    StateChanged {
        /// Previous state
        from: EnemyState,
        /// New state
        to: EnemyState,
    },
    /// Movement started.
    StartMove,
    /// Movement stopped.
    EndMove,
    /// Attack animation.
    Attack,
    /// Hit animation.
    Hit,
    /// Death animation.
    Died,
    /// The body should be removed.
    Despawned,
}

/// Guarded state machine shared by every enemy behaviour.
#[derive(Debug)]
pub struct EnemyStateMachine {
    record: StateRecord,
    next: Option<EnemyState>,
    clock: f64,
    events: Emitter<EnemyEvent>,
}

impl EnemyStateMachine {
    /// Creates a machine already in `initial`.
    #[must_use]
    pub fn new(initial: EnemyState) -> Self {
        Self {
            record: StateRecord::enter(initial, 0.0),
            next: None,
            clock: 0.0,
            events: Emitter::new(),
        }
    }

    /// Subscribes to lifecycle notifications.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&EnemyEvent) + Send + 'static,
    {
        self.events.subscribe(handler)
    }

    /// Drops all subscriptions.
    pub fn clear_subscribers(&mut self) {
        self.events.clear();
    }

    /// Active state.
    #[must_use]
    pub fn state(&self) -> EnemyState {
        self.record.state
    }

    /// Active state record.
    #[must_use]
    pub fn record(&self) -> &StateRecord {
        &self.record
    }

    /// Whether a transition request would be honoured.
    #[must_use]
    pub fn can_change_state(&self) -> bool {
        self.record.can_change_state
    }

    /// Seconds since the machine was created.
    #[must_use]
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Advances the clock and the time spent in the active state.
    pub fn tick(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.clock += f64::from(dt);
        self.record.elapsed += dt;
    }

    /// Restores the guard. Has no effect on `Dead`.
    pub fn release(&mut self) {
        if self.record.state != EnemyState::Dead {
            self.record.can_change_state = true;
        }
    }

    /// Requests a transition. Refused while locked, from `Dead`, or to the
    /// active state.
    pub fn change_state(&mut self, to: EnemyState) -> bool {
        if !self.record.can_change_state || self.record.state == EnemyState::Dead {
            debug!("transition {:?} -> {:?} refused (locked)", self.record.state, to);
            return false;
        }
        if self.record.state == to {
            return false;
        }
        self.transition(to);
        true
    }

    /// Transitions regardless of the guard (death, end of appearance).
    /// `Dead` stays absorbing.
    pub fn force_state(&mut self, to: EnemyState) -> bool {
        if self.record.state == EnemyState::Dead || self.record.state == to {
            return false;
        }
        self.transition(to);
        true
    }

    /// Queues the state to enter once the active one completes.
    pub fn set_next(&mut self, next: Option<EnemyState>) {
        self.next = next;
    }

    /// Queued next state.
    #[must_use]
    pub fn next(&self) -> Option<EnemyState> {
        self.next
    }

    /// Takes the queued next state.
    pub fn take_next(&mut self) -> Option<EnemyState> {
        self.next.take()
    }

    /// Emits a lifecycle notification that is not tied to a transition.
    pub fn notify(&mut self, event: EnemyEvent) {
        self.events.emit(&event);
    }

    fn transition(&mut self, to: EnemyState) {
        let from = self.record.state;

        // exit hook
        if from == EnemyState::Move {
            self.events.emit(&EnemyEvent::EndMove);
        }

        self.record = StateRecord::enter(to, self.clock);
        debug!("enemy state {:?} -> {:?}", from, to);
        self.events.emit(&EnemyEvent::StateChanged { from, to });

        // entry hook
        match to {
            EnemyState::Move => self.events.emit(&EnemyEvent::StartMove),
            EnemyState::Attack => self.events.emit(&EnemyEvent::Attack),
            EnemyState::Hit => self.events.emit(&EnemyEvent::Hit),
            EnemyState::Dead => self.events.emit(&EnemyEvent::Died),
            EnemyState::Appearing | EnemyState::Idle => {},
        }
    }
}
