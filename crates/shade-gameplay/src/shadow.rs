//! Shadow mode: an attack/speed buff paid for with half of the current HP.

use serde::{Deserialize, Serialize};
use shade_common::SourceId;
use tracing::info;

use crate::fatigue::FatigueSystem;
use crate::locomotion::{SpeedChannel, SpeedModifier};
use crate::stats::{StatManager, StatModType, StatModifier, StatSource, StatType};

/// Shadow mode tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Multiplicative attack bonus (0.2 = +20%).
    pub attack_power_bonus: f32,
    /// Speed multiplier while active.
    pub move_speed_multiplier: f32,
    /// Fraction of current HP paid on entry.
    pub hp_cost_fraction: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            attack_power_bonus: 0.2,
            move_speed_multiplier: 1.3,
            hp_cost_fraction: 0.5,
        }
    }
}

/// Toggleable shadow mode.
#[derive(Debug, Clone)]
pub struct ShadowMode {
    config: ShadowConfig,
    source: SourceId,
    active: bool,
}

impl StatSource for ShadowMode {
    fn source_id(&self) -> SourceId {
        self.source
    }
}

impl ShadowMode {
    /// Creates an inactive shadow mode contributing under `source`.
    #[must_use]
    pub fn new(config: ShadowConfig, source: SourceId) -> Self {
        Self {
            config,
            source,
            active: false,
        }
    }

    /// Whether shadow mode is on.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Flips shadow mode. Returns the new state.
    pub fn toggle(
        &mut self,
        stats: &mut StatManager,
        speed: &mut impl SpeedModifier,
        fatigue: &mut FatigueSystem,
    ) -> bool {
        if self.active {
            self.exit(stats, speed, fatigue);
        } else {
            self.enter(stats, speed);
        }
        self.active
    }

    fn enter(&mut self, stats: &mut StatManager, speed: &mut impl SpeedModifier) {
        if stats.is_dead() {
            return;
        }

        stats.add_modifier(
            StatType::AttackPower,
            StatModifier::new(self.config.attack_power_bonus, StatModType::Multiplicative, self),
        );
        let cost = stats.current_hp() * self.config.hp_cost_fraction;
        stats.apply_direct_hp_loss(cost);
        speed.set_multiplier(SpeedChannel::Shadow, self.config.move_speed_multiplier);

        self.active = true;
        info!("shadow mode on (paid {:.1} HP)", cost);
    }

    fn exit(
        &mut self,
        stats: &mut StatManager,
        speed: &mut impl SpeedModifier,
        fatigue: &mut FatigueSystem,
    ) {
        self.remove_buffs(stats, speed);
        fatigue.recover_unshadow();
        info!("shadow mode off");
    }

    /// Removes every shadow contribution (exit or entity teardown).
    pub fn remove_buffs(&mut self, stats: &mut StatManager, speed: &mut impl SpeedModifier) {
        stats.remove_modifier(StatType::AttackPower, self.source);
        speed.clear_multiplier(SpeedChannel::Shadow);
        self.active = false;
    }
}
