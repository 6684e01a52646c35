//! Simulation timing.
//!
//! Splits variable frame time into fixed timesteps for the physics-rate
//! pass. The headless driver feeds it simulated frame times, so runs are
//! deterministic for a given seed.

/// Fixed-timestep accumulator.
#[derive(Debug)]
pub struct FrameTiming {
    /// Accumulator for fixed timestep
    accumulator: f32,
    /// Fixed timestep delta (for physics)
    fixed_dt: f32,
    /// Maximum delta time to prevent spiral of death
    max_dt: f32,
    /// Maximum fixed updates per frame
    max_updates: u32,
    /// Simulated seconds so far
    elapsed: f64,
    /// Frames processed so far
    frames: u64,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new(1.0 / 50.0)
    }
}

impl FrameTiming {
    /// Create a timing manager with the given fixed timestep.
    #[must_use]
    pub fn new(fixed_dt: f32) -> Self {
        Self {
            accumulator: 0.0,
            fixed_dt: fixed_dt.max(0.001), // Minimum 1ms
            max_dt: 0.25,                  // Max 250ms delta (prevents spiral of death)
            max_updates: 10,
            elapsed: 0.0,
            frames: 0,
        }
    }

    /// Get the fixed timestep value.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Simulated seconds so far.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Frames processed so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Accumulate frame time for fixed timestep updates.
    /// Returns the number of fixed updates that should be performed.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        let dt = dt.clamp(0.0, self.max_dt);
        self.elapsed += f64::from(dt);
        self.frames += 1;
        self.accumulator += dt;
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < self.max_updates {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // If we're still behind, reset accumulator
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        count
    }
}
