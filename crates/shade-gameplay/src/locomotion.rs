//! Player locomotion state.
//!
//! Physics and input live outside the core. This type only tracks the
//! activity flags that drive fatigue, the dash/jump bookkeeping, and the
//! speed multipliers other systems impose.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::timer::Countdown;

/// Independent contributor to the effective speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeedChannel {
    /// Fatigue stage penalty
    Fatigue,
    /// Fracture status effect
    Fracture,
    /// Hit/knockback reaction
    HitReaction,
    /// Shadow mode bonus
    Shadow,
}

impl SpeedChannel {
    const COUNT: usize = 4;

    const fn index(self) -> usize {
        self as usize
    }
}

/// Anything whose movement speed other systems may scale.
pub trait SpeedModifier {
    /// Sets the multiplier for a channel.
    fn set_multiplier(&mut self, channel: SpeedChannel, multiplier: f32);

    /// Restores a channel to 1.0.
    fn clear_multiplier(&mut self, channel: SpeedChannel) {
        self.set_multiplier(channel, 1.0);
    }
}

/// Locomotion tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Horizontal dash speed.
    pub dash_speed: f32,
    /// Dash duration in seconds.
    pub dash_duration: f32,
    /// Vertical jump impulse.
    pub jump_force: f32,
    /// Jumps allowed before landing.
    pub max_jump_count: u32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            dash_speed: 10.0,
            dash_duration: 0.2,
            jump_force: 7.0,
            max_jump_count: 2,
        }
    }
}

/// Activity flags, dash/jump state and speed multipliers.
#[derive(Debug, Clone)]
pub struct Locomotion {
    config: LocomotionConfig,
    input_x: f32,
    facing_left: bool,
    grounded: bool,
    jumping: bool,
    jump_count: u32,
    max_jump_count: u32,
    dash: Option<Countdown>,
    dash_direction: f32,
    multipliers: [f32; SpeedChannel::COUNT],
}

impl Locomotion {
    /// Creates a grounded, idle locomotion state.
    #[must_use]
    pub fn new(config: LocomotionConfig) -> Self {
        let max_jump_count = config.max_jump_count;
        Self {
            config,
            input_x: 0.0,
            facing_left: false,
            grounded: true,
            jumping: false,
            jump_count: 0,
            max_jump_count,
            dash: None,
            dash_direction: 1.0,
            multipliers: [1.0; SpeedChannel::COUNT],
        }
    }

    /// Sets horizontal intent in `[-1, 1]`; also updates facing.
    pub fn set_input(&mut self, x: f32) {
        self.input_x = x.clamp(-1.0, 1.0);
        if self.input_x < 0.0 {
            self.facing_left = true;
        } else if self.input_x > 0.0 {
            self.facing_left = false;
        }
    }

    /// Whether there is horizontal intent.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.input_x.abs() > f32::EPSILON
    }

    /// Whether a dash is in progress.
    #[must_use]
    pub fn is_dashing(&self) -> bool {
        self.dash.is_some()
    }

    /// Whether the character is airborne from a jump.
    #[must_use]
    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    /// Whether the character is on the ground.
    #[must_use]
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Any activity that accrues fatigue.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_moving() || self.is_dashing() || self.is_jumping()
    }

    /// Facing direction.
    #[must_use]
    pub fn facing_left(&self) -> bool {
        self.facing_left
    }

    /// Jumps used since last landing.
    #[must_use]
    pub fn jump_count(&self) -> u32 {
        self.jump_count
    }

    /// Jumps allowed before landing.
    #[must_use]
    pub fn max_jump_count(&self) -> u32 {
        self.max_jump_count
    }

    /// Raises the jump allowance (artifacts).
    pub fn add_max_jump_count(&mut self, amount: u32) {
        self.max_jump_count = self.max_jump_count.saturating_add(amount);
    }

    /// Starts a dash in the facing direction. Ignored while dashing.
    pub fn dash(&mut self) -> bool {
        if self.is_dashing() {
            return false;
        }
        self.dash_direction = if self.facing_left { -1.0 } else { 1.0 };
        self.dash = Some(Countdown::new(self.config.dash_duration));
        true
    }

    /// Jumps if the allowance permits. Returns the vertical impulse.
    pub fn jump(&mut self) -> Option<f32> {
        if self.jump_count >= self.max_jump_count {
            debug!("jump declined ({}/{})", self.jump_count, self.max_jump_count);
            return None;
        }
        self.jump_count += 1;
        self.jumping = true;
        self.grounded = false;
        Some(self.config.jump_force)
    }

    /// Ground contact from the physics collaborator.
    pub fn land(&mut self) {
        self.grounded = true;
        self.jumping = false;
        self.jump_count = 0;
    }

    /// Advances the dash window.
    pub fn tick(&mut self, dt: f32) {
        if let Some(dash) = &mut self.dash {
            if dash.tick(dt) {
                self.dash = None;
            }
        }
    }

    /// Multiplier on one channel.
    #[must_use]
    pub fn multiplier(&self, channel: SpeedChannel) -> f32 {
        self.multipliers[channel.index()]
    }

    /// Product of every channel.
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        self.multipliers.iter().product()
    }

    /// Horizontal velocity given the character's final move speed.
    #[must_use]
    pub fn velocity_x(&self, move_speed: f32) -> f32 {
        if self.is_dashing() {
            self.dash_direction * self.config.dash_speed
        } else {
            self.input_x * move_speed * self.speed_multiplier()
        }
    }
}

impl SpeedModifier for Locomotion {
    fn set_multiplier(&mut self, channel: SpeedChannel, multiplier: f32) {
        self.multipliers[channel.index()] = multiplier.max(0.0);
    }
}
