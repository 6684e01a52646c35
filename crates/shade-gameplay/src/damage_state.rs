//! Player reactions to damage: hit slowdown, stun, knockback and death.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::events::{Emitter, SubscriptionId};
use crate::locomotion::{SpeedChannel, SpeedModifier};
use crate::timer::Countdown;

/// Damage-driven player state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageState {
    /// No reaction running
    Normal,
    /// Brief post-hit window
    Hit,
    /// Stunned
    Stunned,
    /// Being knocked back
    Knockback,
    /// Dead (absorbing)
    Dead,
}

/// Reaction notifications for the animation/physics collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DamageStateEvent {
    /// Play the hurt animation.
    Hurt,
    /// Zero the body's velocity.
    Halt,
    /// Apply a horizontal knockback velocity.
    Knockback {
        /// Signed horizontal velocity
        velocity_x: f32,
    },
    /// Knockback finished; clear horizontal velocity.
    KnockbackEnded,
    /// The player died.
    Died,
}

/// Reaction tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageReactionConfig {
    /// Seconds further hits are ignored after a hit.
    pub hit_ignore_duration: f32,
    /// Speed multiplier during the hit window.
    pub hit_slowdown_multiplier: f32,
    /// Base stun duration.
    pub default_stun_duration: f32,
    /// Base knockback force.
    pub default_knockback_force: f32,
    /// Knockback duration.
    pub knockback_duration: f32,
}

impl Default for DamageReactionConfig {
    fn default() -> Self {
        Self {
            hit_ignore_duration: 0.5,
            hit_slowdown_multiplier: 0.5,
            default_stun_duration: 1.0,
            default_knockback_force: 2.0,
            knockback_duration: 0.15,
        }
    }
}

/// Runs one timed reaction at a time on top of the stat outcomes.
#[derive(Debug)]
pub struct DamageStateMachine {
    config: DamageReactionConfig,
    state: DamageState,
    in_hit: bool,
    reaction: Option<Countdown>,
    events: Emitter<DamageStateEvent>,
}

impl DamageStateMachine {
    /// Creates a machine in `Normal`.
    #[must_use]
    pub fn new(config: DamageReactionConfig) -> Self {
        Self {
            config,
            state: DamageState::Normal,
            in_hit: false,
            reaction: None,
            events: Emitter::new(),
        }
    }

    /// Subscribes to reaction notifications.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&DamageStateEvent) + Send + 'static,
    {
        self.events.subscribe(handler)
    }

    /// Drops all subscriptions.
    pub fn clear_subscribers(&mut self) {
        self.events.clear();
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> DamageState {
        self.state
    }

    /// Whether further hits are being ignored.
    #[must_use]
    pub fn is_in_hit_state(&self) -> bool {
        self.in_hit
    }

    fn blocked(&self) -> bool {
        self.state == DamageState::Dead || self.in_hit
    }

    /// Reaction to a survived hit.
    pub fn on_hurt(&mut self, speed: &mut impl SpeedModifier) -> bool {
        if self.blocked() {
            return false;
        }

        self.state = DamageState::Hit;
        self.in_hit = true;
        self.reaction = Some(Countdown::new(self.config.hit_ignore_duration));
        speed.set_multiplier(SpeedChannel::HitReaction, self.config.hit_slowdown_multiplier);
        self.events.emit(&DamageStateEvent::Hurt);
        true
    }

    /// Stuns for the base duration plus `extra` seconds.
    pub fn start_stun(&mut self, extra: f32) -> bool {
        if self.blocked() {
            return false;
        }

        let duration = self.config.default_stun_duration + extra.max(0.0);
        self.state = DamageState::Stunned;
        self.reaction = Some(Countdown::new(duration));
        self.events.emit(&DamageStateEvent::Halt);
        self.events.emit(&DamageStateEvent::Hurt);
        debug!("stunned for {:.2}s", duration);
        true
    }

    /// Knocks the player away from where they face.
    pub fn start_knockback(
        &mut self,
        force_x: f32,
        facing_left: bool,
        speed: &mut impl SpeedModifier,
    ) -> bool {
        if self.blocked() {
            return false;
        }

        let force = self.config.default_knockback_force + force_x;
        let facing = if facing_left { -1.0 } else { 1.0 };

        self.state = DamageState::Knockback;
        self.in_hit = true;
        self.reaction = Some(Countdown::new(self.config.knockback_duration));
        speed.set_multiplier(SpeedChannel::HitReaction, 0.0);
        self.events.emit(&DamageStateEvent::Hurt);
        self.events.emit(&DamageStateEvent::Knockback {
            velocity_x: -facing * force,
        });
        true
    }

    /// Cancels every reaction and latches `Dead`.
    pub fn on_death(&mut self, speed: &mut impl SpeedModifier) {
        if self.state == DamageState::Dead {
            return;
        }

        self.reaction = None;
        self.in_hit = false;
        self.state = DamageState::Dead;
        speed.clear_multiplier(SpeedChannel::HitReaction);
        info!("player died");
        self.events.emit(&DamageStateEvent::Halt);
        self.events.emit(&DamageStateEvent::Died);
    }

    /// Advances the running reaction.
    pub fn tick(&mut self, dt: f32, speed: &mut impl SpeedModifier) {
        let finished = match &mut self.reaction {
            Some(timer) => timer.tick(dt),
            None => return,
        };
        if !finished {
            return;
        }

        self.reaction = None;
        match self.state {
            DamageState::Hit => {
                speed.clear_multiplier(SpeedChannel::HitReaction);
            },
            DamageState::Knockback => {
                speed.clear_multiplier(SpeedChannel::HitReaction);
                self.events.emit(&DamageStateEvent::KnockbackEnded);
            },
            DamageState::Stunned | DamageState::Normal | DamageState::Dead => {},
        }
        self.in_hit = false;
        self.state = DamageState::Normal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locomotion::{Locomotion, LocomotionConfig};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn setup() -> (DamageStateMachine, Locomotion) {
        (
            DamageStateMachine::new(DamageReactionConfig::default()),
            Locomotion::new(LocomotionConfig::default()),
        )
    }

    #[test]
    fn test_hit_window() {
        let (mut machine, mut loco) = setup();
        assert!(machine.on_hurt(&mut loco));
        assert_eq!(machine.state(), DamageState::Hit);
        assert_eq!(loco.multiplier(SpeedChannel::HitReaction), 0.5);

        // Ignored while the window is open
        assert!(!machine.on_hurt(&mut loco));
        assert!(!machine.start_stun(0.0));

        machine.tick(0.5, &mut loco);
        assert_eq!(machine.state(), DamageState::Normal);
        assert_eq!(loco.multiplier(SpeedChannel::HitReaction), 1.0);
        assert!(machine.on_hurt(&mut loco));
    }

    #[test]
    fn test_stun_duration() {
        let (mut machine, mut loco) = setup();
        assert!(machine.start_stun(0.5));
        machine.tick(1.25, &mut loco);
        assert_eq!(machine.state(), DamageState::Stunned);
        machine.tick(0.25, &mut loco);
        assert_eq!(machine.state(), DamageState::Normal);
    }

    #[test]
    fn test_knockback_opposite_to_facing() {
        let (mut machine, mut loco) = setup();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        machine.subscribe(move |e| sink.lock().push(*e));

        assert!(machine.start_knockback(1.0, false, &mut loco));
        assert_eq!(loco.multiplier(SpeedChannel::HitReaction), 0.0);
        assert!(log
            .lock()
            .contains(&DamageStateEvent::Knockback { velocity_x: -3.0 }));

        machine.tick(0.15, &mut loco);
        assert_eq!(machine.state(), DamageState::Normal);
        assert!(!machine.is_in_hit_state());
        assert_eq!(loco.multiplier(SpeedChannel::HitReaction), 1.0);
        assert_eq!(log.lock().last(), Some(&DamageStateEvent::KnockbackEnded));
    }

    #[test]
    fn test_death_cancels_reactions() {
        let (mut machine, mut loco) = setup();
        machine.on_hurt(&mut loco);
        machine.on_death(&mut loco);

        assert_eq!(machine.state(), DamageState::Dead);
        assert_eq!(loco.multiplier(SpeedChannel::HitReaction), 1.0);

        machine.tick(10.0, &mut loco);
        assert_eq!(machine.state(), DamageState::Dead);
        assert!(!machine.on_hurt(&mut loco));
        assert!(!machine.start_knockback(1.0, true, &mut loco));
    }
}
