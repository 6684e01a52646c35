//! Status effects (debuffs).
//!
//! Each effect is an independent on/off flag. Damage-over-time effects own
//! a timer that exists only while the flag is set, so clearing an effect
//! cancels its pending tick immediately.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::{Emitter, SubscriptionId};
use crate::fatigue::RestPolicy;
use crate::locomotion::{SpeedChannel, SpeedModifier};
use crate::stats::DamageReceiver;
use crate::timer::{Jittered, Repeating};

/// Kinds of status effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffectType {
    /// Slow HP drain.
    Bleeding,
    /// Heavy movement penalty.
    Fracture,
    /// Slow HP drain; blocks resting.
    Poisoning,
    /// Intermittent HP loss.
    Burn,
}

impl StatusEffectType {
    /// Every effect, in cure order.
    pub const ALL: [Self; 4] = [Self::Bleeding, Self::Fracture, Self::Poisoning, Self::Burn];
}

/// Applied/healed notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusEvent {
    /// Effect became active.
    Applied(StatusEffectType),
    /// Effect was cured.
    Healed(StatusEffectType),
}

/// Status effect tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusEffectConfig {
    /// Damage per bleeding tick.
    pub bleeding_damage: f32,
    /// Damage per poisoning tick.
    pub poisoning_damage: f32,
    /// Period of the bleeding/poisoning ticks.
    pub tick_period: f32,
    /// Move speed multiplier while fractured.
    pub fracture_move_speed_penalty: f32,
    /// Damage per burn tick.
    pub burn_damage: f32,
    /// Lower bound of the burn interval.
    pub burn_interval_min: f32,
    /// Upper bound of the burn interval.
    pub burn_interval_max: f32,
}

impl Default for StatusEffectConfig {
    fn default() -> Self {
        Self {
            bleeding_damage: 0.5,
            poisoning_damage: 0.5,
            tick_period: 1.0,
            fracture_move_speed_penalty: 0.7,
            burn_damage: 1.0,
            burn_interval_min: 2.0,
            burn_interval_max: 5.0,
        }
    }
}

/// Active status effects of one character.
#[derive(Debug)]
pub struct StatusEffectManager {
    config: StatusEffectConfig,
    bleeding: Option<Repeating>,
    fractured: bool,
    poisoning: Option<Repeating>,
    burn: Option<Jittered>,
    rng: fastrand::Rng,
    events: Emitter<StatusEvent>,
}

impl StatusEffectManager {
    /// Creates a manager with no active effects.
    #[must_use]
    pub fn new(config: StatusEffectConfig, rng: fastrand::Rng) -> Self {
        Self {
            config,
            bleeding: None,
            fractured: false,
            poisoning: None,
            burn: None,
            rng,
            events: Emitter::new(),
        }
    }

    /// Subscribes to applied/healed notifications.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&StatusEvent) + Send + 'static,
    {
        self.events.subscribe(handler)
    }

    /// Drops all subscriptions.
    pub fn clear_subscribers(&mut self) {
        self.events.clear();
    }

    /// Whether an effect is active.
    #[must_use]
    pub fn is_active(&self, effect: StatusEffectType) -> bool {
        match effect {
            StatusEffectType::Bleeding => self.bleeding.is_some(),
            StatusEffectType::Fracture => self.fractured,
            StatusEffectType::Poisoning => self.poisoning.is_some(),
            StatusEffectType::Burn => self.burn.is_some(),
        }
    }

    /// Active effects in cure order.
    pub fn active(&self) -> impl Iterator<Item = StatusEffectType> + '_ {
        StatusEffectType::ALL
            .into_iter()
            .filter(|effect| self.is_active(*effect))
    }

    /// Resting is blocked while poisoned.
    #[must_use]
    pub fn can_rest(&self) -> bool {
        self.poisoning.is_none()
    }

    /// Applies an effect. Returns false if it was already active.
    pub fn apply(&mut self, effect: StatusEffectType, speed: &mut impl SpeedModifier) -> bool {
        if self.is_active(effect) {
            return false;
        }

        match effect {
            StatusEffectType::Bleeding => {
                self.bleeding = Some(Repeating::new(self.config.tick_period));
            },
            StatusEffectType::Fracture => {
                self.fractured = true;
                speed.set_multiplier(
                    SpeedChannel::Fracture,
                    self.config.fracture_move_speed_penalty,
                );
            },
            StatusEffectType::Poisoning => {
                self.poisoning = Some(Repeating::new(self.config.tick_period));
            },
            StatusEffectType::Burn => {
                let rng = fastrand::Rng::with_seed(self.rng.u64(..));
                self.burn = Some(Jittered::new(
                    self.config.burn_interval_min,
                    self.config.burn_interval_max,
                    rng,
                ));
            },
        }

        debug!("status applied: {:?}", effect);
        self.events.emit(&StatusEvent::Applied(effect));
        true
    }

    /// Cures an effect. Returns false if it was not active.
    pub fn heal(&mut self, effect: StatusEffectType, speed: &mut impl SpeedModifier) -> bool {
        if !self.is_active(effect) {
            return false;
        }

        match effect {
            StatusEffectType::Bleeding => self.bleeding = None,
            StatusEffectType::Fracture => {
                self.fractured = false;
                speed.clear_multiplier(SpeedChannel::Fracture);
            },
            StatusEffectType::Poisoning => self.poisoning = None,
            StatusEffectType::Burn => self.burn = None,
        }

        debug!("status healed: {:?}", effect);
        self.events.emit(&StatusEvent::Healed(effect));
        true
    }

    /// Cures every active effect.
    pub fn heal_all(&mut self, speed: &mut impl SpeedModifier) {
        for effect in StatusEffectType::ALL {
            self.heal(effect, speed);
        }
    }

    /// Advances damage-over-time effects. Returns the HP removed.
    pub fn tick(&mut self, dt: f32, target: &mut impl DamageReceiver) -> f32 {
        let mut dealt = 0.0;

        if let Some(timer) = &mut self.bleeding {
            for _ in 0..timer.tick(dt) {
                if target.is_dead() {
                    break;
                }
                dealt += target.take_damage(self.config.bleeding_damage).dealt();
            }
        }
        if let Some(timer) = &mut self.poisoning {
            for _ in 0..timer.tick(dt) {
                if target.is_dead() {
                    break;
                }
                dealt += target.take_damage(self.config.poisoning_damage).dealt();
            }
        }
        if let Some(timer) = &mut self.burn {
            for _ in 0..timer.tick(dt) {
                if target.is_dead() {
                    break;
                }
                dealt += target.take_damage(self.config.burn_damage).dealt();
            }
        }

        dealt
    }
}

impl RestPolicy for StatusEffectManager {
    fn can_rest(&self) -> bool {
        StatusEffectManager::can_rest(self)
    }
}
