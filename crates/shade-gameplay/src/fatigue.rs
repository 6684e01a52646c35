//! Fatigue accumulation, stage penalties and the exhaustion sequence.
//!
//! Fatigue is a scalar in `[0, 100]` that rises while the character is
//! active. It is banded into [`FatigueStage`]s, each of which carries a
//! [`FatiguePenalty`]. The penalty is replaced wholesale on every stage
//! change; consumers (locomotion, stamina cost) read it rather than being
//! pushed to.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::events::{Emitter, SubscriptionId};

/// Upper bound of the fatigue scalar.
pub const MAX_FATIGUE: f32 = 100.0;

// ============================================================================
// Stages
// ============================================================================

/// Discrete fatigue band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FatigueStage {
    /// Below 60
    None,
    /// 60-69
    Mildly,
    /// 70-79
    Fatigued,
    /// 80-89
    Heavy,
    /// 90 and above
    Exhausted,
}

impl FatigueStage {
    /// Classifies a fatigue value.
    #[must_use]
    pub fn from_fatigue(fatigue: f32) -> Self {
        match fatigue {
            f if f >= 90.0 => Self::Exhausted,
            f if f >= 80.0 => Self::Heavy,
            f if f >= 70.0 => Self::Fatigued,
            f if f >= 60.0 => Self::Mildly,
            _ => Self::None,
        }
    }

    /// Penalty applied while in this stage.
    #[must_use]
    pub const fn penalty(self) -> FatiguePenalty {
        match self {
            Self::None => FatiguePenalty::NONE,
            Self::Mildly => FatiguePenalty::new(0.90, 1.0, false),
            Self::Fatigued => FatiguePenalty::new(0.80, 1.0, false),
            Self::Heavy => FatiguePenalty::new(0.70, 1.10, false),
            Self::Exhausted => FatiguePenalty::new(0.50, 1.25, true),
        }
    }
}

/// Multipliers a stage imposes on its consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatiguePenalty {
    /// Move speed multiplier
    pub move_speed: f32,
    /// Stamina cost multiplier
    pub stamina_cost: f32,
    /// Whether the vision shrink is active
    pub vision_shrink: bool,
}

impl FatiguePenalty {
    /// Baseline (no penalty).
    pub const NONE: Self = Self::new(1.0, 1.0, false);

    const fn new(move_speed: f32, stamina_cost: f32, vision_shrink: bool) -> Self {
        Self {
            move_speed,
            stamina_cost,
            vision_shrink,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Fatigue tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatigueConfig {
    /// Fatigue gained per second while moving, dashing or jumping.
    pub increase_rate: f32,
    /// Overlay alpha of the partial vision shrink.
    pub light_darkness_alpha: f32,
    /// Seconds the screen stays fully dark during exhaustion.
    pub darkness_duration: f32,
    /// Seconds for each overlay fade.
    pub fade_time: f32,
    /// Fatigue recovered when leaving shadow mode.
    pub unshadow_recovery: f32,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            increase_rate: 0.5,
            light_darkness_alpha: 0.5,
            darkness_duration: 3.0,
            fade_time: 0.5,
            unshadow_recovery: 5.0,
        }
    }
}

// ============================================================================
// Vision Overlay
// ============================================================================

/// Phase of the vision overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisionPhase {
    /// No overlay
    Clear,
    /// Partial shrink
    Shrunk,
    /// Fading to full darkness
    FadingIn,
    /// Fully dark
    Obstructed,
    /// Fading back to the partial shrink
    FadingOut,
}

/// Screen-darkening overlay driven by fatigue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionOverlay {
    phase: VisionPhase,
    alpha: f32,
    fade_from: f32,
    elapsed: f32,
    shrink_alpha: f32,
    fade_time: f32,
    hold_time: f32,
}

impl VisionOverlay {
    /// Creates a clear overlay.
    #[must_use]
    pub fn new(config: &FatigueConfig) -> Self {
        Self {
            phase: VisionPhase::Clear,
            alpha: 0.0,
            fade_from: 0.0,
            elapsed: 0.0,
            shrink_alpha: config.light_darkness_alpha.clamp(0.0, 1.0),
            fade_time: config.fade_time.max(0.0),
            hold_time: config.darkness_duration.max(0.0),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> VisionPhase {
        self.phase
    }

    /// Current overlay alpha (0 clear, 1 fully dark).
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Whether the obstruction sequence is playing.
    #[must_use]
    pub fn is_sequence_running(&self) -> bool {
        matches!(
            self.phase,
            VisionPhase::FadingIn | VisionPhase::Obstructed | VisionPhase::FadingOut
        )
    }

    /// Applies the partial shrink. Ignored while the sequence is playing.
    pub fn shrink(&mut self) {
        if self.is_sequence_running() {
            return;
        }
        self.phase = VisionPhase::Shrunk;
        self.alpha = self.shrink_alpha;
    }

    /// Removes the overlay. Ignored while the sequence is playing.
    pub fn clear(&mut self) {
        if self.is_sequence_running() {
            return;
        }
        self.phase = VisionPhase::Clear;
        self.alpha = 0.0;
    }

    /// Removes the overlay unconditionally, cancelling the sequence.
    pub fn reset(&mut self) {
        self.phase = VisionPhase::Clear;
        self.alpha = 0.0;
        self.elapsed = 0.0;
    }

    /// Starts (or restarts) the obstruction sequence from the current alpha.
    pub fn obstruct(&mut self) {
        self.phase = VisionPhase::FadingIn;
        self.fade_from = self.alpha;
        self.elapsed = 0.0;
    }

    /// Advances the sequence. Returns true on the tick it completes.
    pub fn tick(&mut self, dt: f32) -> bool {
        let mut remaining = dt.max(0.0);
        loop {
            let duration = match self.phase {
                VisionPhase::FadingIn | VisionPhase::FadingOut => self.fade_time,
                VisionPhase::Obstructed => self.hold_time,
                VisionPhase::Clear | VisionPhase::Shrunk => return false,
            };

            let left = duration - self.elapsed;
            if remaining < left {
                self.elapsed += remaining;
                self.update_alpha(self.elapsed / duration);
                return false;
            }

            remaining -= left;
            self.elapsed = 0.0;
            match self.phase {
                VisionPhase::FadingIn => {
                    self.alpha = 1.0;
                    self.phase = VisionPhase::Obstructed;
                },
                VisionPhase::Obstructed => {
                    self.fade_from = 1.0;
                    self.phase = VisionPhase::FadingOut;
                },
                VisionPhase::FadingOut => {
                    self.alpha = self.shrink_alpha;
                    self.phase = VisionPhase::Shrunk;
                    return true;
                },
                VisionPhase::Clear | VisionPhase::Shrunk => return false,
            }
        }
    }

    fn update_alpha(&mut self, t: f32) {
        let target = match self.phase {
            VisionPhase::FadingIn => 1.0,
            VisionPhase::FadingOut => self.shrink_alpha,
            _ => return,
        };
        self.alpha = self.fade_from + (target - self.fade_from) * t.clamp(0.0, 1.0);
    }
}

// ============================================================================
// Fatigue System
// ============================================================================

/// Whether the character may rest right now.
pub trait RestPolicy {
    /// Returns false while a condition forbids resting.
    fn can_rest(&self) -> bool;
}

impl RestPolicy for bool {
    fn can_rest(&self) -> bool {
        *self
    }
}

/// Fatigue notifications.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FatigueEvent {
    /// Stage changed and the new penalty is in effect.
    StageChanged {
        /// Previous stage
        from: FatigueStage,
        /// New stage
        to: FatigueStage,
    },
    /// Fatigue hit the cap; the obstruction sequence started.
    ExhaustionStarted,
    /// The obstruction sequence completed.
    ExhaustionFinished,
    /// Fatigue was cleared by resting.
    Rested,
}

/// Per-character fatigue state.
#[derive(Debug)]
pub struct FatigueSystem {
    config: FatigueConfig,
    fatigue: f32,
    stage: FatigueStage,
    penalty: FatiguePenalty,
    exhaustion_triggered: bool,
    exhaustion_finished: bool,
    overlay: VisionOverlay,
    events: Emitter<FatigueEvent>,
}

impl FatigueSystem {
    /// Creates a rested fatigue system.
    #[must_use]
    pub fn new(config: FatigueConfig) -> Self {
        let overlay = VisionOverlay::new(&config);
        Self {
            config,
            fatigue: 0.0,
            stage: FatigueStage::None,
            penalty: FatiguePenalty::NONE,
            exhaustion_triggered: false,
            exhaustion_finished: false,
            overlay,
            events: Emitter::new(),
        }
    }

    /// Subscribes to fatigue notifications.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&FatigueEvent) + Send + 'static,
    {
        self.events.subscribe(handler)
    }

    /// Drops all subscriptions.
    pub fn clear_subscribers(&mut self) {
        self.events.clear();
    }

    /// Current fatigue in `[0, 100]`.
    #[must_use]
    pub fn fatigue(&self) -> f32 {
        self.fatigue
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> FatigueStage {
        self.stage
    }

    /// Penalty currently in effect.
    #[must_use]
    pub fn penalty(&self) -> FatiguePenalty {
        self.penalty
    }

    /// Vision overlay state.
    #[must_use]
    pub fn overlay(&self) -> &VisionOverlay {
        &self.overlay
    }

    /// True while the obstruction sequence is playing.
    #[must_use]
    pub fn is_exhaustion_triggered(&self) -> bool {
        self.exhaustion_triggered
    }

    /// True after the sequence has played, until the next rest.
    #[must_use]
    pub fn is_exhaustion_finished(&self) -> bool {
        self.exhaustion_finished
    }

    /// Whether activity currently accrues fatigue.
    #[must_use]
    pub fn accrues(&self) -> bool {
        !self.exhaustion_triggered && !self.exhaustion_finished
    }

    /// Per-frame update. `active` is true while moving, dashing or jumping.
    pub fn tick(&mut self, dt: f32, active: bool) {
        if active {
            self.add_fatigue(self.config.increase_rate * dt.max(0.0));
        }

        if self.overlay.tick(dt) {
            self.exhaustion_finished = true;
            self.exhaustion_triggered = false;
            if !self.penalty.vision_shrink {
                self.overlay.clear();
            }
            info!("exhaustion sequence finished");
            self.events.emit(&FatigueEvent::ExhaustionFinished);
        }
    }

    /// Adds fatigue. Ignored once exhaustion has been reached, until rest.
    pub fn add_fatigue(&mut self, amount: f32) {
        if !self.accrues() {
            return;
        }
        self.fatigue = (self.fatigue + amount).clamp(0.0, MAX_FATIGUE);
        self.check_stage();
    }

    /// Removes fatigue without clearing the exhaustion latches.
    pub fn recover(&mut self, amount: f32) {
        self.fatigue = (self.fatigue - amount.max(0.0)).clamp(0.0, MAX_FATIGUE);
        self.check_stage();
    }

    /// Recovery granted when leaving shadow mode.
    pub fn recover_unshadow(&mut self) {
        self.recover(self.config.unshadow_recovery);
    }

    /// Clears fatigue at a safe zone. Refused when `policy` forbids rest.
    pub fn rest_at_safe_zone(&mut self, policy: &impl RestPolicy) -> bool {
        if !policy.can_rest() {
            info!("cannot rest right now");
            return false;
        }

        self.fatigue = 0.0;
        self.exhaustion_triggered = false;
        self.exhaustion_finished = false;
        self.overlay.reset();
        self.check_stage();
        self.events.emit(&FatigueEvent::Rested);
        true
    }

    fn check_stage(&mut self) {
        let stage = FatigueStage::from_fatigue(self.fatigue);
        if stage != self.stage {
            let from = self.stage;
            self.stage = stage;
            self.penalty = stage.penalty();

            if self.penalty.vision_shrink {
                self.overlay.shrink();
            } else {
                self.overlay.clear();
            }

            debug!("fatigue stage {:?} -> {:?}", from, stage);
            self.events.emit(&FatigueEvent::StageChanged { from, to: stage });
        }

        if self.fatigue >= MAX_FATIGUE && !self.exhaustion_triggered && !self.exhaustion_finished {
            self.exhaustion_triggered = true;
            self.overlay.obstruct();
            info!("fatigue reached {}", MAX_FATIGUE);
            self.events.emit(&FatigueEvent::ExhaustionStarted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    const EPS: f32 = 1e-4;

    fn system() -> FatigueSystem {
        FatigueSystem::new(FatigueConfig::default())
    }

    fn recorder(system: &mut FatigueSystem) -> Arc<Mutex<Vec<FatigueEvent>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        system.subscribe(move |e| sink.lock().push(*e));
        log
    }

    #[test]
    fn test_stage_thresholds() {
        assert_eq!(FatigueStage::from_fatigue(0.0), FatigueStage::None);
        assert_eq!(FatigueStage::from_fatigue(59.9), FatigueStage::None);
        assert_eq!(FatigueStage::from_fatigue(60.0), FatigueStage::Mildly);
        assert_eq!(FatigueStage::from_fatigue(70.0), FatigueStage::Fatigued);
        assert_eq!(FatigueStage::from_fatigue(85.0), FatigueStage::Heavy);
        assert_eq!(FatigueStage::from_fatigue(90.0), FatigueStage::Exhausted);
        assert_eq!(FatigueStage::from_fatigue(100.0), FatigueStage::Exhausted);
    }

    #[test]
    fn test_penalty_table() {
        assert_eq!(FatigueStage::None.penalty(), FatiguePenalty::NONE);
        assert_eq!(FatigueStage::Mildly.penalty().move_speed, 0.90);
        assert_eq!(FatigueStage::Fatigued.penalty().move_speed, 0.80);
        let heavy = FatigueStage::Heavy.penalty();
        assert_eq!((heavy.move_speed, heavy.stamina_cost), (0.70, 1.10));
        let exhausted = FatigueStage::Exhausted.penalty();
        assert_eq!((exhausted.move_speed, exhausted.stamina_cost), (0.50, 1.25));
        assert!(exhausted.vision_shrink);
    }

    #[test]
    fn test_add_fatigue_crosses_mild() {
        let mut fatigue = system();
        fatigue.add_fatigue(59.0);
        assert_eq!(fatigue.stage(), FatigueStage::None);

        fatigue.add_fatigue(2.0);
        assert_eq!(fatigue.stage(), FatigueStage::Mildly);
        assert_eq!(fatigue.penalty().move_speed, 0.90);
    }

    #[test]
    fn test_stage_change_fires_once() {
        let mut fatigue = system();
        let log = recorder(&mut fatigue);

        fatigue.add_fatigue(61.0);
        fatigue.add_fatigue(1.0);
        fatigue.add_fatigue(1.0);

        assert_eq!(
            log.lock().as_slice(),
            &[FatigueEvent::StageChanged {
                from: FatigueStage::None,
                to: FatigueStage::Mildly
            }]
        );
    }

    #[test]
    fn test_reset_then_apply() {
        let mut fatigue = system();
        fatigue.add_fatigue(85.0);
        assert_eq!(fatigue.penalty().stamina_cost, 1.10);

        fatigue.recover(20.0);
        assert_eq!(fatigue.stage(), FatigueStage::Mildly);
        assert_eq!(fatigue.penalty().stamina_cost, 1.0);
        assert_eq!(fatigue.penalty().move_speed, 0.90);
    }

    #[test]
    fn test_tick_accrues_only_when_active() {
        let mut fatigue = system();
        fatigue.tick(2.0, false);
        assert_eq!(fatigue.fatigue(), 0.0);
        fatigue.tick(2.0, true);
        assert!((fatigue.fatigue() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_fatigue_clamped() {
        let mut fatigue = system();
        fatigue.add_fatigue(-10.0);
        assert_eq!(fatigue.fatigue(), 0.0);
        fatigue.add_fatigue(500.0);
        assert_eq!(fatigue.fatigue(), MAX_FATIGUE);
    }

    #[test]
    fn test_exhausted_stage_shrinks_vision() {
        let mut fatigue = system();
        fatigue.add_fatigue(92.0);
        assert_eq!(fatigue.overlay().phase(), VisionPhase::Shrunk);
        assert_eq!(fatigue.overlay().alpha(), 0.5);

        fatigue.recover(10.0);
        assert_eq!(fatigue.overlay().phase(), VisionPhase::Clear);
    }

    #[test]
    fn test_exhaustion_sequence_runs_once() {
        let mut fatigue = system();
        let log = recorder(&mut fatigue);

        fatigue.add_fatigue(100.0);
        assert!(fatigue.is_exhaustion_triggered());
        assert!(!fatigue.accrues());
        assert_eq!(fatigue.overlay().phase(), VisionPhase::FadingIn);

        fatigue.tick(0.25, true);
        assert!((fatigue.overlay().alpha() - 0.75).abs() < EPS);
        fatigue.tick(0.25, true);
        assert_eq!(fatigue.overlay().phase(), VisionPhase::Obstructed);
        assert_eq!(fatigue.overlay().alpha(), 1.0);

        fatigue.tick(3.0, true);
        assert_eq!(fatigue.overlay().phase(), VisionPhase::FadingOut);
        fatigue.tick(0.5, true);
        assert_eq!(fatigue.overlay().phase(), VisionPhase::Shrunk);
        assert_eq!(fatigue.overlay().alpha(), 0.5);

        assert!(!fatigue.is_exhaustion_triggered());
        assert!(fatigue.is_exhaustion_finished());

        // Still at the cap, but the sequence does not fire again
        fatigue.add_fatigue(10.0);
        fatigue.tick(10.0, true);

        let started = log
            .lock()
            .iter()
            .filter(|e| **e == FatigueEvent::ExhaustionStarted)
            .count();
        assert_eq!(started, 1);
        assert!(log.lock().contains(&FatigueEvent::ExhaustionFinished));
    }

    #[test]
    fn test_single_large_tick_completes_sequence() {
        let mut fatigue = system();
        fatigue.add_fatigue(100.0);
        fatigue.tick(10.0, false);
        assert!(fatigue.is_exhaustion_finished());
        assert_eq!(fatigue.overlay().phase(), VisionPhase::Shrunk);
    }

    #[test]
    fn test_rest_clears_latches() {
        let mut fatigue = system();
        fatigue.add_fatigue(100.0);
        fatigue.tick(4.0, false);

        assert!(fatigue.rest_at_safe_zone(&true));
        assert_eq!(fatigue.fatigue(), 0.0);
        assert_eq!(fatigue.stage(), FatigueStage::None);
        assert_eq!(fatigue.penalty(), FatiguePenalty::NONE);
        assert!(fatigue.accrues());
        assert_eq!(fatigue.overlay().phase(), VisionPhase::Clear);

        // Can reach exhaustion again after resting
        fatigue.add_fatigue(100.0);
        assert!(fatigue.is_exhaustion_triggered());
    }

    #[test]
    fn test_rest_refused_by_policy() {
        let mut fatigue = system();
        fatigue.add_fatigue(75.0);
        assert!(!fatigue.rest_at_safe_zone(&false));
        assert_eq!(fatigue.fatigue(), 75.0);
    }

    #[test]
    fn test_unshadow_recovery() {
        let mut fatigue = system();
        fatigue.add_fatigue(62.0);
        fatigue.recover_unshadow();
        assert_eq!(fatigue.fatigue(), 57.0);
        assert_eq!(fatigue.stage(), FatigueStage::None);
    }
}
