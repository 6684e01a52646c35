//! Ability levels and the shadow fragment currency.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::events::GameEvent;

/// Upgradable ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Attack
    Might,
    /// Defense
    Temperance,
    /// Special attack
    Spirit,
    /// Critical chance (%)
    Insight,
    /// Evasion (%)
    Agility,
}

impl AbilityKind {
    /// Every ability.
    pub const ALL: [Self; 5] = [
        Self::Might,
        Self::Temperance,
        Self::Spirit,
        Self::Insight,
        Self::Agility,
    ];

    /// Value granted per level.
    #[must_use]
    pub const fn per_level(self) -> u32 {
        match self {
            Self::Might | Self::Spirit => 5,
            Self::Temperance => 3,
            Self::Insight | Self::Agility => 2,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Ability tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityConfig {
    /// Starting level of every ability.
    pub starting_level: u32,
    /// Starting fragment balance.
    pub starting_fragments: u32,
    /// Fragments per upgrade.
    pub upgrade_cost: u32,
}

impl Default for AbilityConfig {
    fn default() -> Self {
        Self {
            starting_level: 1,
            starting_fragments: 20,
            upgrade_cost: 1,
        }
    }
}

/// Ability levels plus currency, publishing changes for the progression UI.
#[derive(Debug)]
pub struct Abilities {
    levels: [u32; 5],
    fragments: u32,
    upgrade_cost: u32,
    bus: Sender<GameEvent>,
}

impl Abilities {
    /// Creates abilities publishing to `bus`.
    #[must_use]
    pub fn new(config: &AbilityConfig, bus: Sender<GameEvent>) -> Self {
        Self {
            levels: [config.starting_level; 5],
            fragments: config.starting_fragments,
            upgrade_cost: config.upgrade_cost,
            bus,
        }
    }

    /// Current level of an ability.
    #[must_use]
    pub fn level(&self, kind: AbilityKind) -> u32 {
        self.levels[kind.index()]
    }

    /// Derived value of an ability (level times its per-level value).
    #[must_use]
    pub fn value(&self, kind: AbilityKind) -> u32 {
        self.level(kind) * kind.per_level()
    }

    /// Shadow fragment balance.
    #[must_use]
    pub fn shadow_fragments(&self) -> u32 {
        self.fragments
    }

    /// Spends fragments to raise an ability. Declined when unaffordable.
    pub fn upgrade(&mut self, kind: AbilityKind) -> bool {
        if self.fragments < self.upgrade_cost {
            info!("not enough shadow fragments ({} < {})", self.fragments, self.upgrade_cost);
            return false;
        }

        self.fragments -= self.upgrade_cost;
        self.publish(GameEvent::ShadowFragmentsChanged {
            balance: self.fragments,
        });

        let level = &mut self.levels[kind.index()];
        *level += 1;
        let level = *level;
        self.publish(GameEvent::AbilityUpgraded {
            ability: kind,
            level,
        });

        info!("{:?} upgraded to {} ({} fragments left)", kind, level, self.fragments);
        true
    }

    /// Grants fragments (enemy kills).
    pub fn add_fragments(&mut self, amount: u32) {
        self.fragments = self.fragments.saturating_add(amount);
        self.publish(GameEvent::ShadowFragmentsChanged {
            balance: self.fragments,
        });
        info!("+{} shadow fragments ({} total)", amount, self.fragments);
    }

    fn publish(&self, event: GameEvent) {
        if self.bus.try_send(event).is_err() {
            warn!("event bus full, dropping event");
        }
    }
}
