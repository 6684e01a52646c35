//! Tick-driven timers.
//!
//! Every long-running behaviour in the core (status-effect ticks, the
//! exhaustion sequence, dash and attack windows) is a timer advanced by the
//! owning component's update pass. Dropping or resetting a timer cancels it.

use serde::{Deserialize, Serialize};

/// Firings resolved one interval at a time before a jittered timer falls
/// back to its mean interval.
const JITTER_STEP_LIMIT: u32 = 1024;

/// One-shot deadline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    /// Starts a countdown of `seconds`.
    #[must_use]
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    /// Advances the countdown. Returns true once the deadline has passed.
    pub fn tick(&mut self, dt: f32) -> bool {
        if dt.is_finite() {
            self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
        }
        self.is_finished()
    }

    /// Checks whether the deadline has passed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Seconds left before the deadline.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}

/// Fixed-period repeating timer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Repeating {
    period: f32,
    accumulated: f32,
}

impl Repeating {
    /// Creates a timer that fires every `period` seconds.
    #[must_use]
    pub fn new(period: f32) -> Self {
        Self {
            period: period.max(0.001),
            accumulated: 0.0,
        }
    }

    /// Advances the timer, returning how many periods elapsed.
    ///
    /// Non-finite `dt` is ignored; the count saturates at `u32::MAX`.
    pub fn tick(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() {
            return 0;
        }
        self.accumulated += dt.max(0.0);
        let periods = (self.accumulated / self.period).floor();
        if periods < 1.0 {
            return 0;
        }
        self.accumulated = (self.accumulated % self.period).max(0.0);
        saturate(periods)
    }

    /// Returns the period in seconds.
    #[must_use]
    pub fn period(&self) -> f32 {
        self.period
    }
}

/// Repeating timer whose interval is resampled uniformly from
/// `[min, max)` after every firing.
#[derive(Debug, Clone)]
pub struct Jittered {
    min: f32,
    max: f32,
    next: f32,
    accumulated: f32,
    rng: fastrand::Rng,
}

impl Jittered {
    /// Creates a jittered timer seeded from `rng`.
    #[must_use]
    pub fn new(min: f32, max: f32, mut rng: fastrand::Rng) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let min = min.max(0.001);
        let max = max.max(min);
        let next = sample(&mut rng, min, max);
        Self {
            min,
            max,
            next,
            accumulated: 0.0,
            rng,
        }
    }

    /// Advances the timer, returning how many intervals elapsed.
    ///
    /// Non-finite `dt` is ignored. Past a long backlog the remaining
    /// firings are counted against the mean interval.
    pub fn tick(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() {
            return 0;
        }
        self.accumulated += dt.max(0.0);

        let mut fired: u32 = 0;
        while self.accumulated >= self.next && fired < JITTER_STEP_LIMIT {
            self.accumulated -= self.next;
            self.next = sample(&mut self.rng, self.min, self.max);
            fired += 1;
        }

        if self.accumulated >= self.next {
            let mean = (self.min + self.max) * 0.5;
            let backlog = (self.accumulated / mean).floor().max(1.0);
            fired = fired.saturating_add(saturate(backlog));
            self.accumulated = (self.accumulated % mean).max(0.0);
            self.next = sample(&mut self.rng, self.min, self.max);
        }
        fired
    }

    /// Interval that must elapse before the next firing.
    #[must_use]
    pub fn next_interval(&self) -> f32 {
        self.next
    }
}

fn sample(rng: &mut fastrand::Rng, min: f32, max: f32) -> f32 {
    min + rng.f32() * (max - min)
}

fn saturate(count: f32) -> u32 {
    if count >= u32::MAX as f32 {
        u32::MAX
    } else {
        count as u32
    }
}
