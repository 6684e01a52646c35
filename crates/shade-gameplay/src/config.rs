//! Gameplay tuning.
//!
//! Every tunable of the character core in one serde tree. Missing fields
//! take their defaults, so a partial `[gameplay]` table is valid.

use serde::{Deserialize, Serialize};
use shade_common::ConfigError;

use crate::ability::AbilityConfig;
use crate::damage_state::DamageReactionConfig;
use crate::enemy::EnemyConfig;
use crate::environment::EnvironmentConfig;
use crate::fatigue::FatigueConfig;
use crate::items::ItemConfig;
use crate::locomotion::LocomotionConfig;
use crate::shadow::ShadowConfig;
use crate::stats::InitialStats;
use crate::status_effect::StatusEffectConfig;

/// All gameplay tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Player starting stats.
    pub player_stats: InitialStats,
    /// Movement, dash and jump.
    pub locomotion: LocomotionConfig,
    /// Fatigue accrual and vision timings.
    pub fatigue: FatigueConfig,
    /// Status effect damages and intervals.
    pub status: StatusEffectConfig,
    /// Hit, stun and knockback reactions.
    pub damage: DamageReactionConfig,
    /// Shadow mode.
    pub shadow: ShadowConfig,
    /// Ability levels and fragments.
    pub abilities: AbilityConfig,
    /// Consumables.
    pub items: ItemConfig,
    /// Hazard zones.
    pub environment: EnvironmentConfig,
    /// Enemies and loot.
    pub enemy: EnemyConfig,
}

impl GameplayConfig {
    /// Clamps values that would break the simulation. Returns one
    /// [`ConfigError::InvalidValue`] per adjusted field.
    pub fn sanitize(&mut self) -> Vec<ConfigError> {
        let mut fixed = Vec::new();

        if self.fatigue.increase_rate < 0.0 {
            fixed.push(ConfigError::invalid(
                "fatigue.increase_rate",
                format!("{} is negative, using 0", self.fatigue.increase_rate),
            ));
            self.fatigue.increase_rate = 0.0;
        }
        if self.status.burn_interval_min <= 0.0 {
            let default = StatusEffectConfig::default().burn_interval_min;
            fixed.push(ConfigError::invalid(
                "status.burn_interval_min",
                format!("{} is not positive, using {default}", self.status.burn_interval_min),
            ));
            self.status.burn_interval_min = default;
        }
        if self.status.tick_period <= 0.0 {
            let default = StatusEffectConfig::default().tick_period;
            fixed.push(ConfigError::invalid(
                "status.tick_period",
                format!("{} is not positive, using {default}", self.status.tick_period),
            ));
            self.status.tick_period = default;
        }
        if !(0.0..=1.0).contains(&self.enemy.loot.drop_chance) {
            fixed.push(ConfigError::invalid(
                "enemy.loot.drop_chance",
                format!("{} is outside 0..=1", self.enemy.loot.drop_chance),
            ));
            self.enemy.loot.drop_chance = self.enemy.loot.drop_chance.clamp(0.0, 1.0);
        }
        if !(0.0..=1.0).contains(&self.shadow.hp_cost_fraction) {
            fixed.push(ConfigError::invalid(
                "shadow.hp_cost_fraction",
                format!("{} is outside 0..=1", self.shadow.hp_cost_fraction),
            ));
            self.shadow.hp_cost_fraction = self.shadow.hp_cost_fraction.clamp(0.0, 1.0);
        }

        fixed
    }
}
