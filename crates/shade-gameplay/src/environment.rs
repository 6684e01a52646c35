//! Environment zones the player can enter.

use serde::{Deserialize, Serialize};

use crate::status_effect::StatusEffectType;

/// Zone kinds reported by the collision collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    /// Resting spot
    SafeZone,
    /// Burns on contact
    Lava,
    /// Poisons on contact
    Swamp,
}

impl Zone {
    /// Status effect applied by a hazard zone.
    #[must_use]
    pub const fn hazard(self) -> Option<StatusEffectType> {
        match self {
            Self::SafeZone => None,
            Self::Lava => Some(StatusEffectType::Burn),
            Self::Swamp => Some(StatusEffectType::Poisoning),
        }
    }
}

/// Environment tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Damage dealt on entering a hazard zone.
    pub hazard_damage: f32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self { hazard_damage: 5.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_hazards() {
        assert_eq!(Zone::SafeZone.hazard(), None);
        assert_eq!(Zone::Lava.hazard(), Some(StatusEffectType::Burn));
        assert_eq!(Zone::Swamp.hazard(), Some(StatusEffectType::Poisoning));
    }
}
