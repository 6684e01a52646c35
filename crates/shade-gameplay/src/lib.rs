//! # Shade Gameplay
//!
//! Character status and state-transition core for Shade.
//!
//! This crate provides the per-character systems and the rules that tie
//! them together:
//! - Stats with additive/multiplicative modifiers, HP, stamina and death
//! - Fatigue stages, penalties and the exhaustion sequence
//! - Status effects (bleeding, fracture, poisoning, burn)
//! - Player locomotion, damage reactions and shadow mode
//! - Abilities, shadow fragments, the inventory, consumables and hazard zones
//! - Enemy state machine with patrol, brawler and boss behaviours
//! - Weapon stat table and weapon forms
//! - Observer emitters and the progression event bus

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod ability;
pub mod config;
pub mod damage_state;
pub mod enemy;
pub mod enemy_state;
pub mod environment;
pub mod error;
pub mod events;
pub mod fatigue;
pub mod inventory;
pub mod items;
pub mod locomotion;
pub mod loot;
pub mod player;
pub mod shadow;
pub mod stats;
pub mod status_effect;
pub mod timer;
pub mod weapon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::ability::*;
    pub use crate::config::*;
    pub use crate::damage_state::*;
    pub use crate::enemy::*;
    pub use crate::enemy_state::*;
    pub use crate::environment::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::fatigue::*;
    pub use crate::inventory::*;
    pub use crate::items::*;
    pub use crate::locomotion::*;
    pub use crate::loot::*;
    pub use crate::player::*;
    pub use crate::shadow::*;
    pub use crate::stats::*;
    pub use crate::status_effect::*;
    pub use crate::timer::*;
    pub use crate::weapon::{WeaponForm, WeaponStat, WeaponStatTable, WeaponTableError, WeaponType};
}

pub use prelude::*;
