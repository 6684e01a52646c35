//! Player aggregate.
//!
//! The player owns one of each character system and wires them together:
//! damage outcomes drive the reaction machine, fatigue penalties are synced
//! into the locomotion and stamina multipliers, and status effects route
//! their periodic damage through the same path as direct hits.

use crossbeam_channel::Sender;
use glam::Vec2;
use shade_common::{EntityId, SourceId};
use tracing::{debug, info, warn};

use crate::ability::Abilities;
use crate::config::GameplayConfig;
use crate::damage_state::DamageStateMachine;
use crate::enemy::EnemyTarget;
use crate::environment::{EnvironmentConfig, Zone};
use crate::events::GameEvent;
use crate::fatigue::FatigueSystem;
use crate::inventory::{Inventory, InventoryError};
use crate::items::{ItemConfig, ItemEffect, ItemKind};
use crate::locomotion::{Locomotion, SpeedChannel, SpeedModifier};
use crate::shadow::ShadowMode;
use crate::stats::{DamageOutcome, DamageReceiver, StatManager};
use crate::status_effect::{StatusEffectManager, StatusEffectType};

/// Routes damage into the stats and the resulting outcome into the
/// reaction machine.
struct DamageRouter<'a> {
    stats: &'a mut StatManager,
    reactions: &'a mut DamageStateMachine,
    locomotion: &'a mut Locomotion,
}

impl DamageReceiver for DamageRouter<'_> {
    fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        let outcome = self.stats.take_damage(amount);
        match outcome {
            DamageOutcome::Hurt { .. } => {
                self.reactions.on_hurt(self.locomotion);
            },
            DamageOutcome::Killed { .. } => self.reactions.on_death(self.locomotion),
            DamageOutcome::Ignored => {},
        }
        outcome
    }

    fn is_dead(&self) -> bool {
        self.stats.is_dead()
    }
}

/// The player character.
#[derive(Debug)]
pub struct Player {
    /// Unique entity ID
    entity_id: EntityId,
    /// Position in world space
    position: Vec2,
    stats: StatManager,
    fatigue: FatigueSystem,
    status: StatusEffectManager,
    locomotion: Locomotion,
    reactions: DamageStateMachine,
    shadow: ShadowMode,
    abilities: Abilities,
    inventory: Inventory,
    items: ItemConfig,
    environment: EnvironmentConfig,
    /// Set once `EntityDied` has been published
    death_reported: bool,
    bus: Sender<GameEvent>,
}

impl Player {
    /// Creates a player at `position`.
    #[must_use]
    pub fn new(
        config: &GameplayConfig,
        position: Vec2,
        bus: Sender<GameEvent>,
        rng: fastrand::Rng,
    ) -> Self {
        let entity_id = EntityId::new();
        Self {
            entity_id,
            position,
            stats: StatManager::new(entity_id, &config.player_stats),
            fatigue: FatigueSystem::new(config.fatigue.clone()),
            status: StatusEffectManager::new(config.status.clone(), rng),
            locomotion: Locomotion::new(config.locomotion.clone()),
            reactions: DamageStateMachine::new(config.damage.clone()),
            shadow: ShadowMode::new(config.shadow.clone(), SourceId::from(entity_id)),
            abilities: Abilities::new(&config.abilities, bus.clone()),
            inventory: Inventory::new(config.items.inventory_capacity),
            items: config.items.clone(),
            environment: config.environment.clone(),
            death_reported: false,
            bus,
        }
    }

    /// Get the player's entity ID.
    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Get the player's current position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Set the player's position directly.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Stats.
    #[must_use]
    pub fn stats(&self) -> &StatManager {
        &self.stats
    }

    /// Stats (mutable, for equipment modifiers and upgrades).
    pub fn stats_mut(&mut self) -> &mut StatManager {
        &mut self.stats
    }

    /// Fatigue.
    #[must_use]
    pub fn fatigue(&self) -> &FatigueSystem {
        &self.fatigue
    }

    /// Fatigue (mutable, for subscriptions).
    pub fn fatigue_mut(&mut self) -> &mut FatigueSystem {
        &mut self.fatigue
    }

    /// Status effects.
    #[must_use]
    pub fn status(&self) -> &StatusEffectManager {
        &self.status
    }

    /// Status effects (mutable, for subscriptions).
    pub fn status_mut(&mut self) -> &mut StatusEffectManager {
        &mut self.status
    }

    /// Locomotion.
    #[must_use]
    pub fn locomotion(&self) -> &Locomotion {
        &self.locomotion
    }

    /// Damage reactions.
    #[must_use]
    pub fn reactions(&self) -> &DamageStateMachine {
        &self.reactions
    }

    /// Damage reactions (mutable, for subscriptions).
    pub fn reactions_mut(&mut self) -> &mut DamageStateMachine {
        &mut self.reactions
    }

    /// Shadow mode.
    #[must_use]
    pub fn shadow(&self) -> &ShadowMode {
        &self.shadow
    }

    /// Abilities and shadow fragments.
    #[must_use]
    pub fn abilities(&self) -> &Abilities {
        &self.abilities
    }

    /// Abilities (mutable, for upgrades).
    pub fn abilities_mut(&mut self) -> &mut Abilities {
        &mut self.abilities
    }

    /// Whether the player has died.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.stats.is_dead()
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Takes defended damage and reacts to the outcome.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        let outcome = self.router().take_damage(amount);
        self.after_damage();
        outcome
    }

    /// Applies a status effect. Returns false if already active or dead.
    pub fn apply_status(&mut self, effect: StatusEffectType) -> bool {
        if self.is_dead() {
            return false;
        }
        self.status.apply(effect, &mut self.locomotion)
    }

    /// Cures a status effect. Returns false if it was not active.
    pub fn heal_status(&mut self, effect: StatusEffectType) -> bool {
        self.status.heal(effect, &mut self.locomotion)
    }

    /// Cures every status effect.
    pub fn heal_all_status(&mut self) {
        self.status.heal_all(&mut self.locomotion);
    }

    /// Adds fatigue and applies the resulting penalty immediately.
    pub fn add_fatigue(&mut self, amount: f32) {
        self.fatigue.add_fatigue(amount);
        self.sync_fatigue_penalty();
    }

    /// Rests at a safe zone. Refused while poisoned.
    pub fn rest_at_safe_zone(&mut self) -> bool {
        let rested = self.fatigue.rest_at_safe_zone(&self.status);
        self.sync_fatigue_penalty();
        rested
    }

    /// Toggles shadow mode. Returns whether it is now active.
    pub fn toggle_shadow(&mut self) -> bool {
        let active = self
            .shadow
            .toggle(&mut self.stats, &mut self.locomotion, &mut self.fatigue);
        self.sync_fatigue_penalty();
        self.after_damage();
        active
    }

    /// Carried items.
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Stores a picked-up item.
    pub fn pick_up(&mut self, item: ItemKind) -> Result<(), InventoryError> {
        if let Err(e) = self.inventory.add(item) {
            warn!("could not pick up {:?}: {e}", item);
            return Err(e);
        }
        Ok(())
    }

    /// Takes one carried item out of the inventory and uses it.
    pub fn use_from_inventory(&mut self, item: ItemKind) -> Result<ItemEffect, InventoryError> {
        self.inventory.remove(item)?;
        Ok(self.use_item(item))
    }

    /// Consumes an item.
    pub fn use_item(&mut self, item: ItemKind) -> ItemEffect {
        let effect = item.effect(&self.items);
        match effect {
            ItemEffect::Heal(amount) => self.stats.heal_hp(amount),
            ItemEffect::Cure(status) => {
                self.heal_status(status);
            },
            ItemEffect::ExtraJump(count) => self.locomotion.add_max_jump_count(count),
            ItemEffect::None => {},
        }
        debug!("used {:?}", item);
        effect
    }

    /// Zone entry reported by the collision collaborator.
    pub fn enter_zone(&mut self, zone: Zone) {
        match zone.hazard() {
            None => {
                self.rest_at_safe_zone();
            },
            Some(effect) => {
                self.apply_status(effect);
                self.take_damage(self.environment.hazard_damage);
            },
        }
    }

    /// Horizontal input in `[-1, 1]`.
    pub fn set_input(&mut self, x: f32) {
        self.locomotion.set_input(x);
    }

    /// Starts a dash. Ignored while dead or reacting to a hit.
    pub fn dash(&mut self) -> bool {
        if self.is_dead() || self.reactions.is_in_hit_state() {
            return false;
        }
        self.locomotion.dash()
    }

    /// Jumps if jumps remain. Returns the jump impulse.
    pub fn jump(&mut self) -> Option<f32> {
        if self.is_dead() {
            return None;
        }
        self.locomotion.jump()
    }

    /// Ground contact from the physics collaborator.
    pub fn land(&mut self) {
        self.locomotion.land();
    }

    /// Stuns the player for the base duration plus `extra` seconds.
    pub fn start_stun(&mut self, extra: f32) -> bool {
        self.reactions.start_stun(extra)
    }

    /// Knocks the player back. Returns false while immune.
    pub fn start_knockback(&mut self, force_x: f32) -> bool {
        let facing_left = self.locomotion.facing_left();
        self.reactions
            .start_knockback(force_x, facing_left, &mut self.locomotion)
    }

    // ========================================================================
    // Update passes
    // ========================================================================

    /// Fixed-rate pass: status ticks, reactions, locomotion.
    pub fn fixed_update(&mut self, dt: f32) {
        let mut router = DamageRouter {
            stats: &mut self.stats,
            reactions: &mut self.reactions,
            locomotion: &mut self.locomotion,
        };
        let dealt = self.status.tick(dt, &mut router);
        if dealt > 0.0 {
            debug!("status effects dealt {:.2}", dealt);
        }
        self.after_damage();

        self.reactions.tick(dt, &mut self.locomotion);
        self.locomotion.tick(dt);

        if !self.is_dead() {
            let vx = self.locomotion.velocity_x(self.stats.move_speed());
            self.position.x += vx * dt;
        }
    }

    /// Frame-rate pass: fatigue accrual and penalty sync.
    pub fn update(&mut self, dt: f32) {
        let active = !self.is_dead() && self.locomotion.is_active();
        self.fatigue.tick(dt, active);
        self.sync_fatigue_penalty();
    }

    /// Drops every subscription and shadow contribution (entity teardown).
    pub fn teardown(&mut self) {
        self.shadow.remove_buffs(&mut self.stats, &mut self.locomotion);
        self.stats.clear_subscribers();
        self.fatigue.clear_subscribers();
        self.status.clear_subscribers();
        self.reactions.clear_subscribers();
        debug!("{} torn down", self.entity_id);
    }

    fn router(&mut self) -> DamageRouter<'_> {
        DamageRouter {
            stats: &mut self.stats,
            reactions: &mut self.reactions,
            locomotion: &mut self.locomotion,
        }
    }

    fn sync_fatigue_penalty(&mut self) {
        let penalty = self.fatigue.penalty();
        self.locomotion
            .set_multiplier(SpeedChannel::Fatigue, penalty.move_speed);
        self.stats.set_stamina_multiplier(penalty.stamina_cost);
    }

    fn after_damage(&mut self) {
        if self.death_reported || !self.stats.is_dead() {
            return;
        }
        self.death_reported = true;
        // apply_direct_hp_loss kills without routing
        self.reactions.on_death(&mut self.locomotion);
        info!("{} (player) died", self.entity_id);
        if self
            .bus
            .try_send(GameEvent::EntityDied {
                entity_id: self.entity_id,
            })
            .is_err()
        {
            warn!("event bus full, dropping event");
        }
    }
}

impl EnemyTarget for Player {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_dead(&self) -> bool {
        self.stats.is_dead()
    }

    fn receive_attack(&mut self, amount: f32) -> DamageOutcome {
        self.take_damage(amount)
    }

    fn grant_fragments(&mut self, amount: u32) {
        self.abilities.add_fragments(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage_state::DamageState;
    use crate::events::EventBus;
    use crate::fatigue::FatigueStage;
    use crate::stats::InitialStats;

    const EPS: f32 = 1e-4;

    fn player_with(config: &GameplayConfig, bus: &EventBus) -> Player {
        Player::new(config, Vec2::ZERO, bus.sender(), fastrand::Rng::with_seed(9))
    }

    fn player(bus: &EventBus) -> Player {
        let config = GameplayConfig {
            player_stats: InitialStats::default().with_defense(0.0),
            ..GameplayConfig::default()
        };
        player_with(&config, bus)
    }

    #[test]
    fn test_damage_drives_reactions() {
        let bus = EventBus::default();
        let mut player = player(&bus);

        assert!(matches!(player.take_damage(30.0), DamageOutcome::Hurt { .. }));
        assert_eq!(player.stats().current_hp(), 70.0);
        assert_eq!(player.reactions().state(), DamageState::Hit);
        assert_eq!(player.locomotion().multiplier(SpeedChannel::HitReaction), 0.5);

        assert!(matches!(player.take_damage(100.0), DamageOutcome::Killed { .. }));
        assert!(player.is_dead());
        assert_eq!(player.reactions().state(), DamageState::Dead);
        assert_eq!(
            bus.drain(),
            vec![GameEvent::EntityDied {
                entity_id: player.entity_id()
            }]
        );

        // Reported once
        player.take_damage(10.0);
        player.fixed_update(1.0);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_bleeding_routes_through_defense() {
        let bus = EventBus::default();
        let mut player = player(&bus);
        assert!(player.apply_status(StatusEffectType::Bleeding));

        player.fixed_update(0.6);
        assert_eq!(player.stats().current_hp(), 100.0);
        player.fixed_update(0.4);
        assert!((player.stats().current_hp() - 99.5).abs() < EPS);
        assert_eq!(player.reactions().state(), DamageState::Hit);

        assert!(player.heal_status(StatusEffectType::Bleeding));
        player.fixed_update(1.0);
        assert!((player.stats().current_hp() - 99.5).abs() < EPS);
    }

    #[test]
    fn test_fatigue_penalty_synced() {
        let bus = EventBus::default();
        let mut player = player(&bus);

        player.add_fatigue(59.0);
        assert_eq!(player.locomotion().multiplier(SpeedChannel::Fatigue), 1.0);
        player.add_fatigue(2.0);
        assert_eq!(player.fatigue().stage(), FatigueStage::Mildly);
        assert_eq!(player.locomotion().multiplier(SpeedChannel::Fatigue), 0.9);

        player.add_fatigue(25.0);
        assert_eq!(player.fatigue().stage(), FatigueStage::Heavy);
        assert_eq!(player.stats().stamina_multiplier(), 1.1);
    }

    #[test]
    fn test_fatigue_accrues_only_while_active() {
        let bus = EventBus::default();
        let mut player = player(&bus);

        player.update(10.0);
        assert_eq!(player.fatigue().fatigue(), 0.0);

        player.set_input(1.0);
        player.update(10.0);
        assert!((player.fatigue().fatigue() - 5.0).abs() < EPS);
    }

    #[test]
    fn test_swamp_blocks_rest() {
        let bus = EventBus::default();
        let mut player = player(&bus);
        player.add_fatigue(65.0);

        player.enter_zone(Zone::Swamp);
        assert!(player.status().is_active(StatusEffectType::Poisoning));
        assert_eq!(player.stats().current_hp(), 95.0);

        player.enter_zone(Zone::SafeZone);
        assert!((player.fatigue().fatigue() - 65.0).abs() < EPS);

        player.use_item(ItemKind::CurePoisoning);
        assert!(player.rest_at_safe_zone());
        assert_eq!(player.fatigue().fatigue(), 0.0);
        assert_eq!(player.locomotion().multiplier(SpeedChannel::Fatigue), 1.0);
    }

    #[test]
    fn test_items() {
        let bus = EventBus::default();
        let mut player = player(&bus);
        player.take_damage(50.0);

        assert_eq!(player.use_item(ItemKind::HealHp), ItemEffect::Heal(20.0));
        assert_eq!(player.stats().current_hp(), 70.0);

        player.apply_status(StatusEffectType::Fracture);
        assert_eq!(player.locomotion().multiplier(SpeedChannel::Fracture), 0.7);
        player.use_item(ItemKind::CureFracture);
        assert_eq!(player.locomotion().multiplier(SpeedChannel::Fracture), 1.0);

        player.use_item(ItemKind::Artifact);
        assert_eq!(player.locomotion().max_jump_count(), 3);

        assert_eq!(player.use_item(ItemKind::Clue), ItemEffect::None);
    }

    #[test]
    fn test_inventory_items() {
        let bus = EventBus::default();
        let mut player = player(&bus);
        player.take_damage(50.0);

        assert!(player.pick_up(ItemKind::HealHp).is_ok());
        assert_eq!(player.inventory().count(ItemKind::HealHp), 1);

        assert_eq!(
            player.use_from_inventory(ItemKind::HealHp),
            Ok(ItemEffect::Heal(20.0))
        );
        assert_eq!(player.stats().current_hp(), 70.0);
        assert!(player.inventory().is_empty());

        // Nothing left to use
        assert_eq!(
            player.use_from_inventory(ItemKind::HealHp),
            Err(InventoryError::NotFound(ItemKind::HealHp))
        );
        assert_eq!(player.stats().current_hp(), 70.0);
    }

    #[test]
    fn test_shadow_toggle() {
        let bus = EventBus::default();
        let mut player = player(&bus);
        player.add_fatigue(20.0);

        assert!(player.toggle_shadow());
        assert_eq!(player.stats().current_hp(), 50.0);
        assert!((player.stats().attack_power() - 12.0).abs() < EPS);
        assert_eq!(player.locomotion().multiplier(SpeedChannel::Shadow), 1.3);
        // Self-inflicted, no hit reaction
        assert_eq!(player.reactions().state(), DamageState::Normal);

        assert!(!player.toggle_shadow());
        assert_eq!(player.stats().attack_power(), 10.0);
        assert!((player.fatigue().fatigue() - 15.0).abs() < EPS);
    }

    #[test]
    fn test_fixed_update_moves() {
        let bus = EventBus::default();
        let mut player = player(&bus);
        player.set_input(1.0);
        player.fixed_update(0.5);
        assert!((player.position().x - 2.5).abs() < EPS);

        player.apply_status(StatusEffectType::Fracture);
        player.fixed_update(1.0);
        assert!((player.position().x - 6.0).abs() < EPS);
    }

    #[test]
    fn test_enemy_target_rewards() {
        let bus = EventBus::default();
        let mut player = player(&bus);
        player.grant_fragments(10);
        assert_eq!(player.abilities().shadow_fragments(), 30);
    }

    #[test]
    fn test_teardown_removes_shadow() {
        let bus = EventBus::default();
        let mut player = player(&bus);
        player.toggle_shadow();
        player.teardown();
        assert!(!player.shadow().is_active());
        assert_eq!(player.stats().attack_power(), 10.0);
        assert_eq!(player.locomotion().multiplier(SpeedChannel::Shadow), 1.0);
    }
}
