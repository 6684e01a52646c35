//! Inventory of carried consumables.

use ahash::AHashMap;
use thiserror::Error;
use tracing::debug;

use crate::items::ItemKind;

/// Inventory error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Item not carried
    #[error("{0:?} is not in the inventory")]
    NotFound(ItemKind),
    /// Every slot is taken by another item kind
    #[error("Inventory full: capacity {capacity}")]
    Full {
        /// Inventory capacity
        capacity: u32,
    },
}

/// Carried items, stacked per kind.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    items: AHashMap<ItemKind, u32>,
    /// Maximum distinct item kinds
    capacity: u32,
}

impl Inventory {
    /// Creates an empty inventory with `capacity` slots.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        Self {
            items: AHashMap::new(),
            capacity,
        }
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn slot_count(&self) -> u32 {
        self.items.len() as u32
    }

    /// Returns the capacity.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// How many of `item` are carried.
    #[must_use]
    pub fn count(&self, item: ItemKind) -> u32 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    /// Whether at least one `item` is carried.
    #[must_use]
    pub fn contains(&self, item: ItemKind) -> bool {
        self.count(item) > 0
    }

    /// Whether nothing is carried.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds one `item`. A new kind needs a free slot.
    pub fn add(&mut self, item: ItemKind) -> Result<(), InventoryError> {
        let current = self.count(item);
        if current == 0 && self.slot_count() >= self.capacity {
            return Err(InventoryError::Full {
                capacity: self.capacity,
            });
        }
        self.items.insert(item, current + 1);
        debug!("picked up {:?} ({} carried)", item, current + 1);
        Ok(())
    }

    /// Removes one `item`.
    pub fn remove(&mut self, item: ItemKind) -> Result<(), InventoryError> {
        match self.count(item) {
            0 => Err(InventoryError::NotFound(item)),
            1 => {
                self.items.remove(&item);
                Ok(())
            },
            n => {
                self.items.insert(item, n - 1);
                Ok(())
            },
        }
    }

    /// Carried kinds and counts, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemKind, u32)> + '_ {
        self.items.iter().map(|(&item, &count)| (item, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_stacks_per_kind() {
        let mut inventory = Inventory::new(2);
        inventory.add(ItemKind::HealHp).expect("add");
        inventory.add(ItemKind::HealHp).expect("add");
        inventory.add(ItemKind::Clue).expect("add");

        assert_eq!(inventory.count(ItemKind::HealHp), 2);
        assert_eq!(inventory.slot_count(), 2);
        assert_eq!(
            inventory.add(ItemKind::Artifact),
            Err(InventoryError::Full { capacity: 2 })
        );
        // Stacking onto a carried kind still works when full
        assert!(inventory.add(ItemKind::Clue).is_ok());
    }

    #[test]
    fn test_remove() {
        let mut inventory = Inventory::new(4);
        inventory.add(ItemKind::CureBurn).expect("add");
        inventory.add(ItemKind::CureBurn).expect("add");

        inventory.remove(ItemKind::CureBurn).expect("remove");
        assert_eq!(inventory.count(ItemKind::CureBurn), 1);
        inventory.remove(ItemKind::CureBurn).expect("remove");
        assert!(inventory.is_empty());
        assert_eq!(
            inventory.remove(ItemKind::CureBurn),
            Err(InventoryError::NotFound(ItemKind::CureBurn))
        );
    }
}
