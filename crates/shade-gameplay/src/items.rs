//! Consumable item kinds and their effects.
//!
//! Carried items live in the player's [`crate::inventory::Inventory`]; the
//! player aggregate applies one through [`crate::player::Player::use_item`].

use serde::{Deserialize, Serialize};

use crate::status_effect::StatusEffectType;

/// Consumable item kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// HP potion
    HealHp,
    /// Bandage
    CureBleeding,
    /// Splint
    CureFracture,
    /// Antidote
    CurePoisoning,
    /// Burn ointment
    CureBurn,
    /// Grants an extra jump
    Artifact,
    /// Story item with no gameplay effect
    Clue,
}

/// What using an item does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ItemEffect {
    /// Restore HP.
    Heal(f32),
    /// Cure one status effect.
    Cure(StatusEffectType),
    /// Raise the jump allowance.
    ExtraJump(u32),
    /// Nothing.
    None,
}

/// Item tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemConfig {
    /// HP restored by a potion.
    pub heal_amount: f32,
    /// Distinct item kinds the player can carry.
    pub inventory_capacity: u32,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            heal_amount: 20.0,
            inventory_capacity: 16,
        }
    }
}

impl ItemKind {
    /// Resolves the effect of this item.
    #[must_use]
    pub fn effect(self, config: &ItemConfig) -> ItemEffect {
        match self {
            Self::HealHp => ItemEffect::Heal(config.heal_amount),
            Self::CureBleeding => ItemEffect::Cure(StatusEffectType::Bleeding),
            Self::CureFracture => ItemEffect::Cure(StatusEffectType::Fracture),
            Self::CurePoisoning => ItemEffect::Cure(StatusEffectType::Poisoning),
            Self::CureBurn => ItemEffect::Cure(StatusEffectType::Burn),
            Self::Artifact => ItemEffect::ExtraJump(1),
            Self::Clue => ItemEffect::None,
        }
    }
}
