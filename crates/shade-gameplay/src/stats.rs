//! Character stat engine.
//!
//! This module provides:
//! - The fixed stat enumeration and its initial values
//! - Additive/multiplicative modifiers keyed by source
//! - Eagerly cached final stats
//! - HP/stamina state with damage, healing and the death latch

use serde::{Deserialize, Serialize};
use shade_common::{EntityId, SourceId};
use tracing::{debug, info};

use crate::events::{Emitter, SubscriptionId};

// ============================================================================
// Stat Types
// ============================================================================

/// Stat tracked by a [`StatManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatType {
    /// Maximum health points.
    MaxHp,
    /// Maximum stamina.
    MaxStamina,
    /// Attack power.
    AttackPower,
    /// Defense power.
    DefensePower,
    /// Movement speed.
    MoveSpeed,
}

impl StatType {
    /// Every stat, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::MaxHp,
        Self::MaxStamina,
        Self::AttackPower,
        Self::DefensePower,
        Self::MoveSpeed,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

/// How a modifier combines with the base value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatModType {
    /// Added to the base value (+10 attack).
    Additive,
    /// Summed into a ratio applied after additives (+0.1 = +10%).
    Multiplicative,
}

/// Anything that can contribute modifiers (equipment, buffs, shadow mode).
pub trait StatSource {
    /// Identity used to remove this source's modifiers.
    fn source_id(&self) -> SourceId;
}

/// An immutable adjustment to one stat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    value: f32,
    kind: StatModType,
    source: SourceId,
}

impl StatModifier {
    /// Creates a modifier contributed by `source`.
    #[must_use]
    pub fn new(value: f32, kind: StatModType, source: &impl StatSource) -> Self {
        Self {
            value,
            kind,
            source: source.source_id(),
        }
    }

    /// Creates an additive modifier from a raw source id.
    #[must_use]
    pub const fn additive(value: f32, source: SourceId) -> Self {
        Self {
            value,
            kind: StatModType::Additive,
            source,
        }
    }

    /// Creates a multiplicative modifier from a raw source id.
    #[must_use]
    pub const fn multiplicative(value: f32, source: SourceId) -> Self {
        Self {
            value,
            kind: StatModType::Multiplicative,
            source,
        }
    }

    /// Modifier value.
    #[must_use]
    pub const fn value(&self) -> f32 {
        self.value
    }

    /// Modifier kind.
    #[must_use]
    pub const fn kind(&self) -> StatModType {
        self.kind
    }

    /// Source that contributed the modifier.
    #[must_use]
    pub const fn source(&self) -> SourceId {
        self.source
    }
}

/// Initial stat values for a character archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialStats {
    /// Maximum HP.
    pub max_hp: f32,
    /// Maximum stamina.
    pub max_stamina: f32,
    /// Attack power.
    pub attack_power: f32,
    /// Defense power.
    pub defense_power: f32,
    /// Movement speed.
    pub move_speed: f32,
}

impl Default for InitialStats {
    fn default() -> Self {
        Self {
            max_hp: 100.0,
            max_stamina: 100.0,
            attack_power: 10.0,
            defense_power: 5.0,
            move_speed: 5.0,
        }
    }
}

impl InitialStats {
    /// Returns the initial value for a stat.
    #[must_use]
    pub fn get(&self, stat: StatType) -> f32 {
        match stat {
            StatType::MaxHp => self.max_hp,
            StatType::MaxStamina => self.max_stamina,
            StatType::AttackPower => self.attack_power,
            StatType::DefensePower => self.defense_power,
            StatType::MoveSpeed => self.move_speed,
        }
    }

    /// Set defense power.
    #[must_use]
    pub fn with_defense(mut self, defense: f32) -> Self {
        self.defense_power = defense;
        self
    }

    /// Set attack power.
    #[must_use]
    pub fn with_attack(mut self, attack: f32) -> Self {
        self.attack_power = attack;
        self
    }

    /// Set max HP.
    #[must_use]
    pub fn with_hp(mut self, hp: f32) -> Self {
        self.max_hp = hp;
        self
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Change notifications raised by a [`StatManager`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StatEvent {
    /// Current or max HP changed.
    HpChanged {
        /// Owning entity
        source: EntityId,
        /// Current HP
        current: f32,
        /// Max HP
        max: f32,
    },
    /// Current or max stamina changed.
    StaminaChanged {
        /// Owning entity
        source: EntityId,
        /// Current stamina
        current: f32,
        /// Max stamina
        max: f32,
    },
    /// A non-resource final stat changed.
    FinalStatChanged {
        /// Owning entity
        source: EntityId,
        /// Stat that changed
        stat: StatType,
        /// New final value
        value: f32,
    },
    /// Damage was taken and the character survived.
    Hurt {
        /// Owning entity
        source: EntityId,
    },
    /// HP reached zero. Raised once.
    Death {
        /// Owning entity
        source: EntityId,
    },
}

/// Result of a damage request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Target was already dead; nothing changed.
    Ignored,
    /// Damage applied, target survived.
    Hurt {
        /// HP actually removed
        dealt: f32,
    },
    /// Damage applied and HP reached zero.
    Killed {
        /// HP actually removed
        dealt: f32,
    },
}

impl DamageOutcome {
    /// HP removed by this request.
    #[must_use]
    pub fn dealt(&self) -> f32 {
        match self {
            Self::Ignored => 0.0,
            Self::Hurt { dealt } | Self::Killed { dealt } => *dealt,
        }
    }
}

/// Anything that accepts defended damage.
pub trait DamageReceiver {
    /// Applies damage through the defense formula.
    fn take_damage(&mut self, amount: f32) -> DamageOutcome;

    /// Whether the receiver has already died.
    fn is_dead(&self) -> bool;
}

// ============================================================================
// Stat Manager
// ============================================================================

/// Owns a character's stats, modifiers and HP/stamina.
#[derive(Debug)]
pub struct StatManager {
    owner: EntityId,
    /// Base values, changed only by upgrades.
    base: [f32; 5],
    /// Active modifiers per stat.
    modifiers: [Vec<StatModifier>; 5],
    /// Cached final values.
    finals: [f32; 5],
    current_hp: f32,
    current_stamina: f32,
    /// Scales stamina costs (raised by fatigue).
    stamina_multiplier: f32,
    is_dead: bool,
    events: Emitter<StatEvent>,
}

impl StatManager {
    /// Creates a manager at full HP and stamina.
    #[must_use]
    pub fn new(owner: EntityId, initial: &InitialStats) -> Self {
        let mut manager = Self {
            owner,
            base: [0.0; 5],
            modifiers: Default::default(),
            finals: [0.0; 5],
            current_hp: 0.0,
            current_stamina: 0.0,
            stamina_multiplier: 1.0,
            is_dead: false,
            events: Emitter::new(),
        };

        for stat in StatType::ALL {
            manager.base[stat.index()] = initial.get(stat).max(0.0);
            manager.finals[stat.index()] = manager.calculate_final(stat);
        }
        manager.current_hp = manager.max_hp();
        manager.current_stamina = manager.max_stamina();
        manager
    }

    /// Entity that owns these stats.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Subscribes to change notifications.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&StatEvent) + Send + 'static,
    {
        self.events.subscribe(handler)
    }

    /// Removes a subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Drops all subscriptions (entity teardown).
    pub fn clear_subscribers(&mut self) {
        self.events.clear();
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Base value of a stat (before modifiers).
    #[must_use]
    pub fn base(&self, stat: StatType) -> f32 {
        self.base[stat.index()]
    }

    /// Cached final value of a stat.
    #[must_use]
    pub fn final_stat(&self, stat: StatType) -> f32 {
        self.finals[stat.index()]
    }

    /// Active modifiers on a stat.
    #[must_use]
    pub fn modifiers(&self, stat: StatType) -> &[StatModifier] {
        &self.modifiers[stat.index()]
    }

    /// Final max HP.
    #[must_use]
    pub fn max_hp(&self) -> f32 {
        self.final_stat(StatType::MaxHp)
    }

    /// Final max stamina.
    #[must_use]
    pub fn max_stamina(&self) -> f32 {
        self.final_stat(StatType::MaxStamina)
    }

    /// Final attack power.
    #[must_use]
    pub fn attack_power(&self) -> f32 {
        self.final_stat(StatType::AttackPower)
    }

    /// Final defense power.
    #[must_use]
    pub fn defense_power(&self) -> f32 {
        self.final_stat(StatType::DefensePower)
    }

    /// Final move speed.
    #[must_use]
    pub fn move_speed(&self) -> f32 {
        self.final_stat(StatType::MoveSpeed)
    }

    /// Current HP.
    #[must_use]
    pub fn current_hp(&self) -> f32 {
        self.current_hp
    }

    /// Current stamina.
    #[must_use]
    pub fn current_stamina(&self) -> f32 {
        self.current_stamina
    }

    /// Get HP percentage (0.0-1.0).
    #[must_use]
    pub fn hp_percent(&self) -> f32 {
        let max = self.max_hp();
        if max <= 0.0 {
            0.0
        } else {
            (self.current_hp / max).clamp(0.0, 1.0)
        }
    }

    /// Multiplier applied to stamina costs.
    #[must_use]
    pub fn stamina_multiplier(&self) -> f32 {
        self.stamina_multiplier
    }

    /// Sets the stamina cost multiplier (clamped to >= 0).
    pub fn set_stamina_multiplier(&mut self, multiplier: f32) {
        self.stamina_multiplier = multiplier.max(0.0);
    }

    /// Whether the death latch has fired.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    // ------------------------------------------------------------------
    // Modifiers
    // ------------------------------------------------------------------

    /// Permanently shifts a base value (ability point investment).
    pub fn upgrade_stat(&mut self, stat: StatType, amount: f32) {
        let base = &mut self.base[stat.index()];
        *base = (*base + amount).max(0.0);
        self.update_final_stat(stat);
    }

    /// Adds a temporary modifier (equipment, buff).
    pub fn add_modifier(&mut self, stat: StatType, modifier: StatModifier) {
        self.modifiers[stat.index()].push(modifier);
        self.update_final_stat(stat);
    }

    /// Removes every modifier on `stat` contributed by `source`.
    /// Returns the number removed; removing an absent source is a no-op.
    pub fn remove_modifier(&mut self, stat: StatType, source: SourceId) -> usize {
        let list = &mut self.modifiers[stat.index()];
        let before = list.len();
        list.retain(|m| m.source != source);
        let removed = before - list.len();

        if removed > 0 {
            self.update_final_stat(stat);
        }
        removed
    }

    /// Removes every modifier contributed by `source` across all stats.
    pub fn remove_modifiers_from(&mut self, source: SourceId) -> usize {
        StatType::ALL
            .into_iter()
            .map(|stat| self.remove_modifier(stat, source))
            .sum()
    }

    fn calculate_final(&self, stat: StatType) -> f32 {
        let mut additive = 0.0;
        let mut multiplicative = 1.0;

        for modifier in &self.modifiers[stat.index()] {
            match modifier.kind {
                StatModType::Additive => additive += modifier.value,
                StatModType::Multiplicative => multiplicative += modifier.value,
            }
        }

        let value = (self.base[stat.index()] + additive).max(0.0) * multiplicative;
        value.max(0.0)
    }

    fn update_final_stat(&mut self, stat: StatType) {
        let value = self.calculate_final(stat);
        self.finals[stat.index()] = value;

        match stat {
            StatType::MaxHp => {
                self.current_hp = self.current_hp.min(value);
                self.emit_hp();
            },
            StatType::MaxStamina => {
                self.current_stamina = self.current_stamina.min(value);
                self.emit_stamina();
            },
            _ => {
                self.events.emit(&StatEvent::FinalStatChanged {
                    source: self.owner,
                    stat,
                    value,
                });
            },
        }
    }

    // ------------------------------------------------------------------
    // HP / stamina
    // ------------------------------------------------------------------

    /// Applies damage reduced by defense: `amount * 100 / (100 + defense)`.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.is_dead {
            return DamageOutcome::Ignored;
        }

        let amount = amount.max(0.0);
        let damage = amount * (100.0 / (100.0 + self.defense_power()));
        let before = self.current_hp;
        self.current_hp = (self.current_hp - damage).max(0.0);
        let dealt = before - self.current_hp;
        self.emit_hp();

        if self.current_hp > 0.0 {
            self.events.emit(&StatEvent::Hurt { source: self.owner });
            DamageOutcome::Hurt { dealt }
        } else {
            self.die();
            DamageOutcome::Killed { dealt }
        }
    }

    /// Removes HP ignoring defense and without a hurt notification
    /// (self-inflicted costs). Still latches death at zero.
    pub fn apply_direct_hp_loss(&mut self, amount: f32) -> DamageOutcome {
        if self.is_dead {
            return DamageOutcome::Ignored;
        }

        let before = self.current_hp;
        self.current_hp = (self.current_hp - amount.max(0.0)).max(0.0);
        let dealt = before - self.current_hp;
        self.emit_hp();

        if self.current_hp <= 0.0 {
            self.die();
            DamageOutcome::Killed { dealt }
        } else {
            DamageOutcome::Hurt { dealt }
        }
    }

    /// Restores HP up to the max.
    pub fn heal_hp(&mut self, amount: f32) {
        if self.is_dead {
            debug!("{}: heal ignored, already dead", self.owner);
            return;
        }
        self.current_hp = (self.current_hp + amount.max(0.0)).min(self.max_hp());
        self.emit_hp();
    }

    /// Restores stamina up to the max.
    pub fn heal_stamina(&mut self, amount: f32) {
        if self.is_dead {
            return;
        }
        self.current_stamina = (self.current_stamina + amount.max(0.0)).min(self.max_stamina());
        self.emit_stamina();
    }

    /// Cost of `amount` after the stamina multiplier.
    #[must_use]
    pub fn stamina_cost(&self, amount: f32) -> f32 {
        amount.max(0.0) * self.stamina_multiplier
    }

    /// Checks whether `amount` (before the multiplier) can be paid.
    #[must_use]
    pub fn can_use_stamina(&self, amount: f32) -> bool {
        !self.is_dead && self.current_stamina >= self.stamina_cost(amount)
    }

    /// Spends stamina. Declined without partial consumption when the
    /// scaled cost exceeds the current stamina.
    pub fn use_stamina(&mut self, amount: f32) -> bool {
        if !self.can_use_stamina(amount) {
            debug!(
                "{}: not enough stamina ({:.1} < {:.1})",
                self.owner,
                self.current_stamina,
                self.stamina_cost(amount)
            );
            return false;
        }
        self.current_stamina -= self.stamina_cost(amount);
        self.emit_stamina();
        true
    }

    fn die(&mut self) {
        self.is_dead = true;
        info!("{} died", self.owner);
        self.events.emit(&StatEvent::Death { source: self.owner });
    }

    fn emit_hp(&mut self) {
        self.events.emit(&StatEvent::HpChanged {
            source: self.owner,
            current: self.current_hp,
            max: self.max_hp(),
        });
    }

    fn emit_stamina(&mut self) {
        self.events.emit(&StatEvent::StaminaChanged {
            source: self.owner,
            current: self.current_stamina,
            max: self.max_stamina(),
        });
    }
}

impl DamageReceiver for StatManager {
    fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        StatManager::take_damage(self, amount)
    }

    fn is_dead(&self) -> bool {
        self.is_dead
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use std::sync::Arc;

    const EPS: f32 = 1e-4;

    fn manager(initial: InitialStats) -> StatManager {
        StatManager::new(EntityId::from_raw(1), &initial)
    }

    fn recorder(manager: &mut StatManager) -> Arc<Mutex<Vec<StatEvent>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        manager.subscribe(move |e| sink.lock().push(*e));
        log
    }

    #[test]
    fn test_initial_values() {
        let stats = manager(InitialStats::default());
        assert_eq!(stats.max_hp(), 100.0);
        assert_eq!(stats.current_hp(), 100.0);
        assert_eq!(stats.current_stamina(), 100.0);
        assert_eq!(stats.attack_power(), 10.0);
        assert!(!stats.is_dead());
    }

    #[test]
    fn test_additive_and_multiplicative() {
        let mut stats = manager(InitialStats::default().with_attack(10.0));
        let source = SourceId::new(9);

        stats.add_modifier(StatType::AttackPower, StatModifier::additive(5.0, source));
        stats.add_modifier(
            StatType::AttackPower,
            StatModifier::multiplicative(0.2, source),
        );

        // (10 + 5) * 1.2
        assert!((stats.attack_power() - 18.0).abs() < EPS);
    }

    #[test]
    fn test_negative_additive_floors_before_multiply() {
        let mut stats = manager(InitialStats::default().with_attack(10.0));
        stats.add_modifier(
            StatType::AttackPower,
            StatModifier::additive(-30.0, SourceId::new(1)),
        );
        stats.add_modifier(
            StatType::AttackPower,
            StatModifier::multiplicative(1.0, SourceId::new(2)),
        );
        assert_eq!(stats.attack_power(), 0.0);
    }

    #[test]
    fn test_multiplicative_below_zero_clamps() {
        let mut stats = manager(InitialStats::default());
        stats.add_modifier(
            StatType::MoveSpeed,
            StatModifier::multiplicative(-1.5, SourceId::new(1)),
        );
        assert_eq!(stats.move_speed(), 0.0);
    }

    #[test]
    fn test_remove_modifier_by_source() {
        let mut stats = manager(InitialStats::default().with_attack(10.0));
        let sword = SourceId::new(1);
        let ring = SourceId::new(2);

        stats.add_modifier(StatType::AttackPower, StatModifier::additive(5.0, sword));
        stats.add_modifier(StatType::AttackPower, StatModifier::additive(2.0, sword));
        stats.add_modifier(StatType::AttackPower, StatModifier::additive(1.0, ring));

        assert_eq!(stats.remove_modifier(StatType::AttackPower, sword), 2);
        assert_eq!(stats.attack_power(), 11.0);

        let log = recorder(&mut stats);
        assert_eq!(stats.remove_modifier(StatType::AttackPower, sword), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_remove_modifiers_from_all_stats() {
        let mut stats = manager(InitialStats::default());
        let buff = SourceId::new(3);
        stats.add_modifier(StatType::AttackPower, StatModifier::additive(5.0, buff));
        stats.add_modifier(StatType::DefensePower, StatModifier::additive(5.0, buff));

        assert_eq!(stats.remove_modifiers_from(buff), 2);
        assert_eq!(stats.attack_power(), 10.0);
        assert_eq!(stats.defense_power(), 5.0);
    }

    #[test]
    fn test_upgrade_floors_at_zero() {
        let mut stats = manager(InitialStats::default().with_defense(5.0));
        stats.upgrade_stat(StatType::DefensePower, 3.0);
        assert_eq!(stats.base(StatType::DefensePower), 8.0);

        stats.upgrade_stat(StatType::DefensePower, -50.0);
        assert_eq!(stats.base(StatType::DefensePower), 0.0);
        assert_eq!(stats.defense_power(), 0.0);
    }

    #[test]
    fn test_max_hp_reduction_clamps_current() {
        let mut stats = manager(InitialStats::default());
        let curse = SourceId::new(4);
        stats.add_modifier(StatType::MaxHp, StatModifier::multiplicative(-0.5, curse));
        assert_eq!(stats.max_hp(), 50.0);
        assert_eq!(stats.current_hp(), 50.0);

        // Raising max again does not refill current HP
        stats.remove_modifier(StatType::MaxHp, curse);
        assert_eq!(stats.max_hp(), 100.0);
        assert_eq!(stats.current_hp(), 50.0);
    }

    #[test]
    fn test_max_stamina_reduction_clamps_current() {
        let mut stats = manager(InitialStats::default());
        stats.add_modifier(
            StatType::MaxStamina,
            StatModifier::additive(-40.0, SourceId::new(1)),
        );
        assert_eq!(stats.current_stamina(), 60.0);
    }

    #[test]
    fn test_defense_formula() {
        let mut stats = manager(InitialStats::default().with_defense(100.0));
        let outcome = stats.take_damage(100.0);
        assert_eq!(outcome, DamageOutcome::Hurt { dealt: 50.0 });
        assert_eq!(stats.current_hp(), 50.0);
    }

    #[test]
    fn test_hurt_then_death_scenario() {
        let mut stats = manager(InitialStats::default().with_defense(0.0));
        let log = recorder(&mut stats);

        stats.take_damage(30.0);
        assert_eq!(stats.current_hp(), 70.0);
        assert!(log.lock().contains(&StatEvent::Hurt {
            source: stats.owner()
        }));

        log.lock().clear();
        let outcome = stats.take_damage(100.0);
        assert_eq!(outcome, DamageOutcome::Killed { dealt: 70.0 });
        assert_eq!(stats.current_hp(), 0.0);
        assert!(stats.is_dead());

        let events = log.lock().clone();
        assert!(events.contains(&StatEvent::Death {
            source: stats.owner()
        }));
        assert!(!events
            .iter()
            .any(|e| matches!(e, StatEvent::Hurt { .. })));
    }

    #[test]
    fn test_dead_ignores_damage() {
        let mut stats = manager(InitialStats::default().with_defense(0.0));
        stats.take_damage(500.0);
        let log = recorder(&mut stats);

        assert_eq!(stats.take_damage(10.0), DamageOutcome::Ignored);
        assert_eq!(stats.apply_direct_hp_loss(10.0), DamageOutcome::Ignored);
        stats.heal_hp(50.0);
        assert_eq!(stats.current_hp(), 0.0);
        assert!(stats.is_dead());
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_negative_damage_is_clamped() {
        let mut stats = manager(InitialStats::default());
        stats.take_damage(-20.0);
        assert_eq!(stats.current_hp(), 100.0);
    }

    #[test]
    fn test_direct_hp_loss_skips_defense_and_hurt() {
        let mut stats = manager(InitialStats::default().with_defense(100.0));
        let log = recorder(&mut stats);

        stats.apply_direct_hp_loss(40.0);
        assert_eq!(stats.current_hp(), 60.0);
        assert!(!log
            .lock()
            .iter()
            .any(|e| matches!(e, StatEvent::Hurt { .. })));

        stats.apply_direct_hp_loss(60.0);
        assert!(stats.is_dead());
        assert!(log.lock().contains(&StatEvent::Death {
            source: stats.owner()
        }));
    }

    #[test]
    fn test_heal_clamps_to_max() {
        let mut stats = manager(InitialStats::default().with_defense(0.0));
        stats.take_damage(50.0);
        stats.heal_hp(20.0);
        assert_eq!(stats.current_hp(), 70.0);
        stats.heal_hp(1000.0);
        assert_eq!(stats.current_hp(), 100.0);
        stats.heal_hp(-30.0);
        assert_eq!(stats.current_hp(), 100.0);
    }

    #[test]
    fn test_use_stamina_declines_without_partial_spend() {
        let mut stats = manager(InitialStats::default());
        assert!(stats.use_stamina(60.0));
        assert_eq!(stats.current_stamina(), 40.0);

        assert!(!stats.use_stamina(50.0));
        assert_eq!(stats.current_stamina(), 40.0);

        stats.heal_stamina(500.0);
        assert_eq!(stats.current_stamina(), 100.0);
    }

    #[test]
    fn test_stamina_multiplier_scales_cost() {
        let mut stats = manager(InitialStats::default());
        stats.set_stamina_multiplier(1.25);
        assert!(stats.use_stamina(40.0));
        assert_eq!(stats.current_stamina(), 50.0);

        // 45 * 1.25 = 56.25 > 50
        assert!(!stats.can_use_stamina(45.0));
    }

    #[test]
    fn test_final_stat_event_carries_value() {
        let mut stats = manager(InitialStats::default());
        let log = recorder(&mut stats);
        stats.upgrade_stat(StatType::MoveSpeed, 1.0);

        assert_eq!(
            log.lock().as_slice(),
            &[StatEvent::FinalStatChanged {
                source: stats.owner(),
                stat: StatType::MoveSpeed,
                value: 6.0,
            }]
        );
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut stats = manager(InitialStats::default());
        let log = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&log);
        let id = stats.subscribe(move |_| *sink.lock() += 1);

        stats.heal_hp(1.0);
        assert!(stats.unsubscribe(id));
        stats.heal_hp(1.0);
        assert_eq!(*log.lock(), 1);
    }

    fn modifier_strategy() -> impl Strategy<Value = (f32, bool)> {
        (-20.0f32..20.0, any::<bool>())
    }

    proptest! {
        #[test]
        fn prop_final_stat_independent_of_order(
            base in 0.0f32..200.0,
            mods in prop::collection::vec(modifier_strategy(), 0..8),
        ) {
            let to_modifier = |(value, additive): (f32, bool)| {
                if additive {
                    StatModifier::additive(value, SourceId::new(1))
                } else {
                    StatModifier::multiplicative(value / 20.0, SourceId::new(1))
                }
            };

            let initial = InitialStats::default().with_attack(base);
            let mut forward = manager(initial.clone());
            let mut backward = manager(initial);
            for m in &mods {
                forward.add_modifier(StatType::AttackPower, to_modifier(*m));
            }
            for m in mods.iter().rev() {
                backward.add_modifier(StatType::AttackPower, to_modifier(*m));
            }

            let add: f32 = mods.iter().filter(|m| m.1).map(|m| m.0).sum();
            let mult: f32 = 1.0 + mods.iter().filter(|m| !m.1).map(|m| m.0 / 20.0).sum::<f32>();
            let expected = ((base + add).max(0.0) * mult).max(0.0);

            prop_assert!(forward.attack_power() >= 0.0);
            prop_assert!((forward.attack_power() - backward.attack_power()).abs() < 1e-2);
            prop_assert!((forward.attack_power() - expected).abs() < 1e-2);
        }

        #[test]
        fn prop_damage_never_raises_hp(hits in prop::collection::vec(0.0f32..80.0, 1..20)) {
            let mut stats = manager(InitialStats::default());
            let mut last = stats.current_hp();
            for hit in hits {
                stats.take_damage(hit);
                prop_assert!(stats.current_hp() <= last);
                prop_assert!(stats.current_hp() >= 0.0);
                last = stats.current_hp();
            }
            if stats.current_hp() == 0.0 {
                prop_assert!(stats.is_dead());
            }
        }
    }
}
