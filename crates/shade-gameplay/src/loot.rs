//! Loot rolled when an enemy dies.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::items::ItemKind;

/// Loot tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LootConfig {
    /// Roll threshold; a roll below this value drops nothing.
    pub drop_chance: f32,
    /// Items a drop is chosen from.
    pub table: Vec<ItemKind>,
}

impl Default for LootConfig {
    fn default() -> Self {
        Self {
            drop_chance: 0.5,
            table: vec![
                ItemKind::HealHp,
                ItemKind::CureBleeding,
                ItemKind::CurePoisoning,
            ],
        }
    }
}

/// Rolls loot from a table.
#[derive(Debug, Clone)]
pub struct LootDropper {
    drop_chance: f32,
    table: Vec<ItemKind>,
    rng: fastrand::Rng,
}

impl LootDropper {
    /// Creates a dropper.
    #[must_use]
    pub fn new(config: &LootConfig, rng: fastrand::Rng) -> Self {
        Self {
            drop_chance: config.drop_chance.clamp(0.0, 1.0),
            table: config.table.clone(),
            rng,
        }
    }

    /// Rolls once. Returns the dropped item, if any.
    pub fn drop_loot(&mut self) -> Option<ItemKind> {
        if self.rng.f32() < self.drop_chance {
            return None;
        }

        if self.table.is_empty() {
            warn!("loot table is empty");
            return None;
        }

        let item = self.table[self.rng.usize(..self.table.len())];
        info!("dropped {:?}", item);
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_fails_at_full_chance() {
        let config = LootConfig {
            drop_chance: 1.0,
            ..LootConfig::default()
        };
        let mut dropper = LootDropper::new(&config, fastrand::Rng::with_seed(1));
        for _ in 0..100 {
            assert_eq!(dropper.drop_loot(), None);
        }
    }

    #[test]
    fn test_always_drops_at_zero_chance() {
        let config = LootConfig {
            drop_chance: 0.0,
            table: vec![ItemKind::Artifact],
        };
        let mut dropper = LootDropper::new(&config, fastrand::Rng::with_seed(1));
        assert_eq!(dropper.drop_loot(), Some(ItemKind::Artifact));
    }

    #[test]
    fn test_empty_table_is_noop() {
        let config = LootConfig {
            drop_chance: 0.0,
            table: Vec::new(),
        };
        let mut dropper = LootDropper::new(&config, fastrand::Rng::with_seed(1));
        assert_eq!(dropper.drop_loot(), None);
    }

    #[test]
    fn test_drops_come_from_table() {
        let config = LootConfig::default();
        let mut dropper = LootDropper::new(&config, fastrand::Rng::with_seed(42));
        let mut dropped = 0;
        for _ in 0..200 {
            if let Some(item) = dropper.drop_loot() {
                assert!(config.table.contains(&item));
                dropped += 1;
            }
        }
        assert!(dropped > 0 && dropped < 200);
    }
}
