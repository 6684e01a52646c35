//! Weapon stat table and weapon forms.
//!
//! Weapon stats are declared in a JSON list loaded once at startup:
//!
//! ```json
//! [{ "type": "Shears", "damage": 12, "attackSpeed": 1.0, "range": 1.5 }]
//! ```
//!
//! The table is held in a process-wide registry with explicit
//! [`init`]/[`teardown`]. Lookups of a weapon with no entry are errors,
//! never silent defaults.

use std::path::{Path, PathBuf};

use ahash::AHashMap;
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use shade_common::{LookupError, ShadeError};
use thiserror::Error;
use tracing::{info, warn};

use crate::events::GameEvent;

/// Weapon kinds the player can wield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponType {
    /// Fast close-range blades
    Shears,
    /// Wide sweeping blade
    Scythe,
    /// Ranged light
    Lantern,
}

impl WeaponType {
    /// All weapon kinds, in form order.
    pub const ALL: [Self; 3] = [Self::Shears, Self::Scythe, Self::Lantern];
}

/// One row of the weapon table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponStat {
    /// Weapon this row describes.
    #[serde(rename = "type")]
    pub weapon_type: WeaponType,
    /// Damage per hit.
    pub damage: u32,
    /// Attacks per second.
    #[serde(rename = "attackSpeed")]
    pub attack_speed: f32,
    /// Reach in world units.
    pub range: f32,
}

/// Errors raised while loading or querying the weapon table.
#[derive(Debug, Error)]
pub enum WeaponTableError {
    /// The table file could not be read.
    #[error("Failed to read weapon table {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The table is not valid JSON or has the wrong shape.
    #[error("Invalid weapon table: {0}")]
    Parse(String),
    /// The same weapon is listed twice.
    #[error("Weapon {0:?} is listed more than once")]
    DuplicateEntry(WeaponType),
    /// No entry for the requested weapon.
    #[error("Unknown weapon: {0:?}")]
    UnknownWeapon(WeaponType),
    /// The registry has not been initialized.
    #[error("Weapon table is not loaded")]
    NotLoaded,
}

impl From<WeaponTableError> for ShadeError {
    fn from(err: WeaponTableError) -> Self {
        match err {
            WeaponTableError::Read { source, .. } => ShadeError::Io(source),
            WeaponTableError::Parse(msg) => ShadeError::Serialization(msg),
            WeaponTableError::DuplicateEntry(weapon) => {
                ShadeError::Serialization(format!("duplicate weapon entry {weapon:?}"))
            },
            WeaponTableError::UnknownWeapon(weapon) => {
                ShadeError::Lookup(LookupError::UnknownKey(format!("{weapon:?}")))
            },
            WeaponTableError::NotLoaded => ShadeError::Lookup(LookupError::NotLoaded("weapon table")),
        }
    }
}

// ============================================================================
// Stat Table
// ============================================================================

/// Weapon stats keyed by weapon type.
#[derive(Debug, Clone, Default)]
pub struct WeaponStatTable {
    entries: AHashMap<WeaponType, WeaponStat>,
}

impl WeaponStatTable {
    /// Parses a JSON list of weapon rows.
    pub fn from_json(data: &str) -> Result<Self, WeaponTableError> {
        let rows: Vec<WeaponStat> =
            serde_json::from_str(data).map_err(|e| WeaponTableError::Parse(e.to_string()))?;
        Self::from_rows(rows)
    }

    /// Builds a table from rows. Duplicate weapons are rejected.
    pub fn from_rows(rows: impl IntoIterator<Item = WeaponStat>) -> Result<Self, WeaponTableError> {
        let mut entries = AHashMap::new();
        for row in rows {
            if entries.insert(row.weapon_type, row).is_some() {
                return Err(WeaponTableError::DuplicateEntry(row.weapon_type));
            }
        }
        Ok(Self { entries })
    }

    /// Loads the table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WeaponTableError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| WeaponTableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json(&data)?;

        let missing: Vec<_> = WeaponType::ALL
            .into_iter()
            .filter(|w| !table.entries.contains_key(w))
            .collect();
        if !missing.is_empty() {
            warn!("weapon table {} has no entry for {:?}", path.display(), missing);
        }
        info!("Loaded {} weapon(s) from {}", table.len(), path.display());
        Ok(table)
    }

    /// Stats of a weapon.
    pub fn stat(&self, weapon: WeaponType) -> Result<WeaponStat, WeaponTableError> {
        self.entries
            .get(&weapon)
            .copied()
            .ok_or(WeaponTableError::UnknownWeapon(weapon))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Global Registry
// ============================================================================

static WEAPON_TABLE: parking_lot::RwLock<Option<WeaponStatTable>> = parking_lot::RwLock::new(None);

/// Installs the process-wide weapon table, replacing any previous one.
pub fn init(table: WeaponStatTable) {
    *WEAPON_TABLE.write() = Some(table);
}

/// Removes the process-wide weapon table.
pub fn teardown() {
    *WEAPON_TABLE.write() = None;
}

/// Whether the process-wide table is installed.
#[must_use]
pub fn is_loaded() -> bool {
    WEAPON_TABLE.read().is_some()
}

/// Looks up a weapon in the process-wide table.
pub fn stat(weapon: WeaponType) -> Result<WeaponStat, WeaponTableError> {
    WEAPON_TABLE
        .read()
        .as_ref()
        .ok_or(WeaponTableError::NotLoaded)?
        .stat(weapon)
}

// ============================================================================
// Weapon Forms
// ============================================================================

/// The player's cycle of weapon forms.
#[derive(Debug)]
pub struct WeaponForm {
    forms: Vec<WeaponType>,
    index: usize,
    bus: Sender<GameEvent>,
}

impl WeaponForm {
    /// Creates a cycle over `forms`, starting at the first one.
    ///
    /// An empty list falls back to every weapon kind.
    #[must_use]
    pub fn new(forms: Vec<WeaponType>, bus: Sender<GameEvent>) -> Self {
        let forms = if forms.is_empty() {
            warn!("no weapon forms given, using all");
            WeaponType::ALL.to_vec()
        } else {
            forms
        };
        Self {
            forms,
            index: 0,
            bus,
        }
    }

    /// Active weapon.
    #[must_use]
    pub fn current(&self) -> WeaponType {
        self.forms[self.index]
    }

    /// Stats of the active weapon from the process-wide table.
    pub fn current_stat(&self) -> Result<WeaponStat, WeaponTableError> {
        stat(self.current())
    }

    /// Switches to the next form and publishes `WeaponChanged`.
    pub fn cycle(&mut self) -> WeaponType {
        self.index = (self.index + 1) % self.forms.len();
        let weapon = self.current();
        if self.bus.try_send(GameEvent::WeaponChanged { weapon }).is_err() {
            warn!("event bus full, dropping event");
        }
        info!("weapon form -> {:?}", weapon);
        weapon
    }
}
