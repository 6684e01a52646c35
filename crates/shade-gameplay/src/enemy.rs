//! Enemy controllers.
//!
//! One [`EnemyController`] drives every enemy kind. The kind is a tagged
//! [`Behavior`] that decides how each state updates; transitions always go
//! through the shared [`EnemyStateMachine`] so the `can_change_state` guard
//! applies uniformly.
//!
//! - `Patrol`: settle, idle on a timer, walk to the next waypoint, attack
//!   when the player is detected.
//! - `Brawler`: re-classified by distance every tick, strikes on a cooldown.
//! - `Boss`: idle/chase/attack cycle with a cooldown-gated attack.

use crossbeam_channel::Sender;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use shade_common::EntityId;
use tracing::{debug, error, info, warn};

use crate::enemy_state::{classify, EnemyEvent, EnemyState, EnemyStateMachine};
use crate::error::WiringError;
use crate::events::{GameEvent, SubscriptionId};
use crate::items::ItemKind;
use crate::loot::{LootConfig, LootDropper};
use crate::stats::{DamageOutcome, InitialStats, StatManager};
use crate::timer::Countdown;

// ============================================================================
// Configuration
// ============================================================================

/// Patrol enemy tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Seconds spent idle before moving.
    pub idle_time: f32,
    /// Walking speed.
    pub move_speed: f32,
    /// Distance at which a waypoint counts as reached.
    pub arrive_radius: f32,
    /// Radius of the player detection area.
    pub detection_radius: f32,
    /// Seconds the attack holds the lock.
    pub attack_swing: f32,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            idle_time: 2.0,
            move_speed: 2.0,
            arrive_radius: 1.0,
            detection_radius: 1.5,
            attack_swing: 1.0,
        }
    }
}

/// Distance-classified enemy tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrawlerConfig {
    /// Walking speed.
    pub move_speed: f32,
    /// Distance at which the enemy starts moving.
    pub chase_range: f32,
    /// Distance at which the enemy attacks.
    pub attack_range: f32,
    /// Seconds between strikes.
    pub attack_cooldown: f32,
    /// Damage per strike.
    pub attack_damage: f32,
    /// Distance at which a waypoint counts as reached.
    pub waypoint_radius: f32,
}

impl Default for BrawlerConfig {
    fn default() -> Self {
        Self {
            move_speed: 2.0,
            chase_range: 10.0,
            attack_range: 5.0,
            attack_cooldown: 1.0,
            attack_damage: 10.0,
            waypoint_radius: 0.25,
        }
    }
}

/// Boss tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    /// Chase speed.
    pub move_speed: f32,
    /// Distance at which the boss starts chasing.
    pub chase_range: f32,
    /// Distance at which the boss attacks.
    pub attack_range: f32,
    /// Seconds the attack lasts before returning to idle.
    pub attack_cooldown: f32,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            chase_range: 10.0,
            attack_range: 2.0,
            attack_cooldown: 2.0,
        }
    }
}

/// Tuning shared by every enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Initial stats of a regular enemy.
    pub stats: InitialStats,
    /// Patrol behaviour.
    pub patrol: PatrolConfig,
    /// Brawler behaviour.
    pub brawler: BrawlerConfig,
    /// Boss behaviour.
    pub boss: BossConfig,
    /// Loot table.
    pub loot: LootConfig,
    /// Seconds between death and removal.
    pub despawn_delay: f32,
    /// Shadow fragments granted to the killer.
    pub fragment_reward: u32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            stats: InitialStats::default().with_hp(50.0),
            patrol: PatrolConfig::default(),
            brawler: BrawlerConfig::default(),
            boss: BossConfig::default(),
            loot: LootConfig::default(),
            despawn_delay: 2.0,
            fragment_reward: 10,
        }
    }
}

/// Which behaviour to spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorKind {
    /// Timer-driven patroller
    Patrol,
    /// Distance-classified fighter
    Brawler,
    /// Boss
    Boss,
}

/// Behaviour with its tuning.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    /// Timer-driven patroller
    Patrol(PatrolConfig),
    /// Distance-classified fighter
    Brawler(BrawlerConfig),
    /// Boss
    Boss(BossConfig),
}

impl Behavior {
    /// Resolves a kind against the enemy tuning.
    #[must_use]
    pub fn from_kind(kind: BehaviorKind, config: &EnemyConfig) -> Self {
        match kind {
            BehaviorKind::Patrol => Self::Patrol(config.patrol.clone()),
            BehaviorKind::Brawler => Self::Brawler(config.brawler.clone()),
            BehaviorKind::Boss => Self::Boss(config.boss.clone()),
        }
    }

    /// State the machine starts in.
    #[must_use]
    pub fn initial_state(&self) -> EnemyState {
        match self {
            Self::Patrol(_) | Self::Boss(_) => EnemyState::Appearing,
            Self::Brawler(_) => EnemyState::Idle,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Patrol(_) => "patrol enemy",
            Self::Brawler(_) => "brawler enemy",
            Self::Boss(_) => "boss",
        }
    }

    fn needs_route(&self) -> bool {
        matches!(self, Self::Patrol(_) | Self::Brawler(_))
    }
}

/// Spawn description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// Behaviour to use.
    pub behavior: BehaviorKind,
    /// Spawn position.
    pub position: Vec2,
    /// Patrol waypoints.
    #[serde(default)]
    pub waypoints: Vec<Vec2>,
    /// Spawn in the air; the enemy stays `Appearing` until [`EnemyController::land`].
    #[serde(default)]
    pub airborne: bool,
    /// Stat overrides (defaults to the enemy tuning).
    #[serde(default)]
    pub stats: Option<InitialStats>,
}

impl EnemySpawn {
    /// Creates a grounded spawn with no waypoints.
    #[must_use]
    pub fn new(behavior: BehaviorKind, position: Vec2) -> Self {
        Self {
            behavior,
            position,
            waypoints: Vec::new(),
            airborne: false,
            stats: None,
        }
    }

    /// Set the patrol waypoints.
    #[must_use]
    pub fn with_waypoints(mut self, waypoints: Vec<Vec2>) -> Self {
        self.waypoints = waypoints;
        self
    }

    /// Spawn in the air.
    #[must_use]
    pub fn airborne(mut self) -> Self {
        self.airborne = true;
        self
    }

    /// Override the stats.
    #[must_use]
    pub fn with_stats(mut self, stats: InitialStats) -> Self {
        self.stats = Some(stats);
        self
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// What an enemy needs from the character it fights.
pub trait EnemyTarget {
    /// World position.
    fn position(&self) -> Vec2;

    /// Whether the target is dead.
    fn is_dead(&self) -> bool;

    /// Deals damage to the target.
    fn receive_attack(&mut self, amount: f32) -> DamageOutcome;

    /// Rewards the target for a kill.
    fn grant_fragments(&mut self, amount: u32);
}

/// Cyclic list of waypoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatrolRoute {
    waypoints: Vec<Vec2>,
    index: usize,
}

impl PatrolRoute {
    /// Creates a route starting at the first waypoint.
    #[must_use]
    pub fn new(waypoints: Vec<Vec2>) -> Self {
        Self {
            waypoints,
            index: 0,
        }
    }

    /// Whether the route has no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoint currently headed to.
    #[must_use]
    pub fn current(&self) -> Option<Vec2> {
        self.waypoints.get(self.index).copied()
    }

    /// Moves on to the next waypoint, wrapping around.
    pub fn advance(&mut self) {
        if !self.waypoints.is_empty() {
            self.index = (self.index + 1) % self.waypoints.len();
        }
    }
}

fn move_towards(current: Vec2, target: Vec2, max_step: f32) -> Vec2 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_step || distance <= f32::EPSILON {
        target
    } else {
        current + delta / distance * max_step
    }
}

// ============================================================================
// Controller
// ============================================================================

/// A single enemy: stats, state machine and behaviour.
#[derive(Debug)]
pub struct EnemyController {
    id: EntityId,
    behavior: Behavior,
    machine: EnemyStateMachine,
    stats: StatManager,
    loot: LootDropper,
    route: PatrolRoute,
    position: Vec2,
    facing_left: bool,
    grounded: bool,
    action: Option<Countdown>,
    last_attack: Option<f64>,
    player_detected: bool,
    despawn_delay: f32,
    fragment_reward: u32,
    despawn: Option<Countdown>,
    despawned: bool,
    wiring_error: Option<WiringError>,
    bus: Sender<GameEvent>,
}

impl EnemyController {
    /// Spawns an enemy. Missing wiring disables it instead of failing.
    #[must_use]
    pub fn spawn(
        spawn: &EnemySpawn,
        config: &EnemyConfig,
        bus: Sender<GameEvent>,
        rng: fastrand::Rng,
    ) -> Self {
        let behavior = Behavior::from_kind(spawn.behavior, config);
        let id = EntityId::new();
        let stats = StatManager::new(id, spawn.stats.as_ref().unwrap_or(&config.stats));

        let wiring_error = if behavior.needs_route() && spawn.waypoints.is_empty() {
            let err = WiringError::MissingCollaborator {
                component: behavior.name(),
                collaborator: "patrol route",
            };
            error!("{}: {}, disabling", id, err);
            Some(err)
        } else {
            None
        };

        Self {
            id,
            machine: EnemyStateMachine::new(behavior.initial_state()),
            behavior,
            stats,
            loot: LootDropper::new(&config.loot, rng),
            route: PatrolRoute::new(spawn.waypoints.clone()),
            position: spawn.position,
            facing_left: false,
            grounded: !spawn.airborne,
            action: None,
            last_attack: None,
            player_detected: false,
            despawn_delay: config.despawn_delay,
            fragment_reward: config.fragment_reward,
            despawn: None,
            despawned: false,
            wiring_error,
            bus,
        }
    }

    /// Entity ID.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Behaviour.
    #[must_use]
    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    /// Active state.
    #[must_use]
    pub fn state(&self) -> EnemyState {
        self.machine.state()
    }

    /// State machine (read-only).
    #[must_use]
    pub fn machine(&self) -> &EnemyStateMachine {
        &self.machine
    }

    /// Stats.
    #[must_use]
    pub fn stats(&self) -> &StatManager {
        &self.stats
    }

    /// Stats (mutable, for modifiers and upgrades).
    pub fn stats_mut(&mut self) -> &mut StatManager {
        &mut self.stats
    }

    /// World position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Facing direction.
    #[must_use]
    pub fn facing_left(&self) -> bool {
        self.facing_left
    }

    /// Whether the enemy was disabled at spawn.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.wiring_error.is_none()
    }

    /// Why the enemy was disabled, if it was.
    #[must_use]
    pub fn wiring_error(&self) -> Option<&WiringError> {
        self.wiring_error.as_ref()
    }

    /// Whether the body should be removed from the world.
    #[must_use]
    pub fn is_despawned(&self) -> bool {
        self.despawned
    }

    /// Subscribes to lifecycle notifications.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&EnemyEvent) + Send + 'static,
    {
        self.machine.subscribe(handler)
    }

    /// Drops every subscription (entity teardown).
    pub fn teardown(&mut self) {
        self.machine.clear_subscribers();
        self.stats.clear_subscribers();
    }

    /// Ground contact; ends the appearance.
    pub fn land(&mut self) {
        self.grounded = true;
    }

    /// Releases the state lock from outside (animation end).
    pub fn release(&mut self) {
        self.machine.release();
    }

    /// Damages the enemy. Death is processed on the next tick.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        self.stats.take_damage(amount)
    }

    /// Enters the hit reaction, honouring the lock.
    pub fn receive_hit(&mut self) -> bool {
        self.machine.change_state(EnemyState::Hit)
    }

    /// Ends the hit reaction and re-classifies by distance.
    pub fn end_hit(&mut self, target: &mut impl EnemyTarget) {
        if self.machine.state() != EnemyState::Hit {
            return;
        }
        self.machine.release();

        let next = match &self.behavior {
            Behavior::Brawler(cfg) => classify(
                EnemyState::Idle,
                self.distance_to(target),
                cfg.chase_range,
                cfg.attack_range,
            ),
            Behavior::Patrol(_) | Behavior::Boss(_) => EnemyState::Idle,
        };
        self.request(next, target);
    }

    /// Fixed-rate update. Returns loot dropped this tick.
    pub fn tick(&mut self, dt: f32, target: &mut impl EnemyTarget) -> Option<ItemKind> {
        if self.wiring_error.is_some() || self.despawned {
            return None;
        }

        self.machine.tick(dt);

        if let Some(timer) = &mut self.despawn {
            if timer.tick(dt) {
                self.despawned = true;
                self.machine.notify(EnemyEvent::Despawned);
                debug!("{} despawned", self.id);
            }
            return None;
        }

        if self.stats.is_dead() {
            return self.die(target);
        }

        match self.behavior.clone() {
            Behavior::Patrol(cfg) => self.tick_patrol(dt, &cfg, target),
            Behavior::Brawler(cfg) => self.tick_brawler(dt, &cfg, target),
            Behavior::Boss(cfg) => self.tick_boss(dt, &cfg, target),
        }
        None
    }

    fn distance_to(&self, target: &impl EnemyTarget) -> f32 {
        if target.is_dead() {
            f32::INFINITY
        } else {
            self.position.distance(target.position())
        }
    }

    /// Guarded transition plus the entry side effects of the new state.
    fn request(&mut self, to: EnemyState, target: &mut impl EnemyTarget) -> bool {
        if !self.machine.change_state(to) {
            return false;
        }
        self.on_enter(to, target);
        true
    }

    fn on_enter(&mut self, state: EnemyState, target: &mut impl EnemyTarget) {
        if state != EnemyState::Attack {
            return;
        }
        match &self.behavior {
            Behavior::Patrol(cfg) => {
                self.action = Some(Countdown::new(cfg.attack_swing));
                self.strike(self.stats.attack_power(), target);
            },
            Behavior::Boss(cfg) => {
                self.action = Some(Countdown::new(cfg.attack_cooldown));
                self.strike(self.stats.attack_power(), target);
            },
            Behavior::Brawler(_) => {},
        }
    }

    fn strike(&mut self, damage: f32, target: &mut impl EnemyTarget) {
        if target.is_dead() {
            return;
        }
        self.facing_left = target.position().x < self.position.x;
        let outcome = target.receive_attack(damage);
        self.last_attack = Some(self.machine.clock());
        debug!("{} struck for {:.1}", self.id, outcome.dealt());
    }

    fn finish_appearing(&mut self) {
        if self.grounded && self.machine.force_state(EnemyState::Idle) {
            info!("{} appeared", self.id);
        }
    }

    fn tick_patrol(&mut self, dt: f32, cfg: &PatrolConfig, target: &mut impl EnemyTarget) {
        let detected = self.distance_to(target) <= cfg.detection_radius;
        if detected && !self.player_detected {
            self.request(EnemyState::Attack, target);
        }
        if detected {
            self.machine.set_next(Some(EnemyState::Attack));
        } else if self.player_detected {
            self.machine.set_next(None);
        }
        self.player_detected = detected;

        match self.machine.state() {
            EnemyState::Appearing => self.finish_appearing(),
            EnemyState::Idle => {
                if let Some(next) = self.machine.take_next() {
                    self.request(next, target);
                } else if self.machine.record().elapsed >= cfg.idle_time {
                    self.request(EnemyState::Move, target);
                }
            },
            EnemyState::Move => {
                let Some(waypoint) = self.route.current() else {
                    return;
                };
                if self.position.distance(waypoint) < cfg.arrive_radius {
                    self.route.advance();
                    self.machine.release();
                    self.request(EnemyState::Idle, target);
                    return;
                }
                self.facing_left = waypoint.x < self.position.x;
                self.position = move_towards(self.position, waypoint, cfg.move_speed * dt);
            },
            EnemyState::Attack => {
                let done = self.action.as_mut().map_or(true, |timer| timer.tick(dt));
                if done {
                    self.action = None;
                    self.machine.release();
                    self.request(EnemyState::Idle, target);
                }
            },
            EnemyState::Hit | EnemyState::Dead => {},
        }
    }

    fn tick_brawler(&mut self, dt: f32, cfg: &BrawlerConfig, target: &mut impl EnemyTarget) {
        let distance = self.distance_to(target);
        let current = self.machine.state();
        let next = classify(current, distance, cfg.chase_range, cfg.attack_range);
        if next != current {
            self.request(next, target);
        }

        match self.machine.state() {
            EnemyState::Move => {
                let Some(waypoint) = self.route.current() else {
                    return;
                };
                if self.position.distance(waypoint) < cfg.waypoint_radius {
                    self.route.advance();
                }
                if let Some(waypoint) = self.route.current() {
                    self.facing_left = waypoint.x < self.position.x;
                    self.position = move_towards(self.position, waypoint, cfg.move_speed * dt);
                }
            },
            EnemyState::Attack => {
                let ready = self.last_attack.map_or(true, |last| {
                    self.machine.clock() - last >= f64::from(cfg.attack_cooldown)
                });
                if ready {
                    if target.is_dead() {
                        self.machine.release();
                        self.request(EnemyState::Idle, target);
                        return;
                    }
                    self.strike(cfg.attack_damage, target);
                }
                // Brawlers reclassify by distance every tick, so the attack
                // lock only spans this update. Cooldown gates the strikes.
                self.machine.release();
            },
            EnemyState::Appearing => self.finish_appearing(),
            EnemyState::Idle | EnemyState::Hit | EnemyState::Dead => {},
        }
    }

    fn tick_boss(&mut self, dt: f32, cfg: &BossConfig, target: &mut impl EnemyTarget) {
        let distance = self.distance_to(target);

        match self.machine.state() {
            EnemyState::Appearing => self.finish_appearing(),
            EnemyState::Idle => {
                if distance < cfg.chase_range {
                    self.request(EnemyState::Move, target);
                }
            },
            EnemyState::Move => {
                if distance > cfg.chase_range {
                    self.request(EnemyState::Idle, target);
                } else if distance < cfg.attack_range {
                    self.request(EnemyState::Attack, target);
                } else {
                    let dx = target.position().x - self.position.x;
                    self.facing_left = dx < 0.0;
                    let step = (cfg.move_speed * dt).min(dx.abs());
                    self.position.x += dx.signum() * step;
                }
            },
            EnemyState::Attack => {
                let done = self.action.as_mut().map_or(true, |timer| timer.tick(dt));
                if done {
                    self.action = None;
                    self.machine.release();
                    self.request(EnemyState::Idle, target);
                }
            },
            EnemyState::Hit | EnemyState::Dead => {},
        }
    }

    fn die(&mut self, target: &mut impl EnemyTarget) -> Option<ItemKind> {
        if !self.machine.force_state(EnemyState::Dead) {
            return None;
        }

        self.action = None;
        let dropped = self.loot.drop_loot();
        target.grant_fragments(self.fragment_reward);
        if self
            .bus
            .try_send(GameEvent::EntityDied { entity_id: self.id })
            .is_err()
        {
            warn!("event bus full, dropping event");
        }
        self.despawn = Some(Countdown::new(self.despawn_delay));
        info!("{} ({}) died", self.id, self.behavior.name());
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;

    /// Minimal target standing at a fixed position.
    struct Dummy {
        position: Vec2,
        hp: f32,
        hits: u32,
        fragments: u32,
    }

    impl Dummy {
        fn at(x: f32) -> Self {
            Self {
                position: Vec2::new(x, 0.0),
                hp: 100.0,
                hits: 0,
                fragments: 0,
            }
        }
    }

    impl EnemyTarget for Dummy {
        fn position(&self) -> Vec2 {
            self.position
        }

        fn is_dead(&self) -> bool {
            self.hp <= 0.0
        }

        fn receive_attack(&mut self, amount: f32) -> DamageOutcome {
            self.hits += 1;
            self.hp = (self.hp - amount).max(0.0);
            if self.hp > 0.0 {
                DamageOutcome::Hurt { dealt: amount }
            } else {
                DamageOutcome::Killed { dealt: amount }
            }
        }

        fn grant_fragments(&mut self, amount: u32) {
            self.fragments += amount;
        }
    }

    fn spawn(spawn: &EnemySpawn, bus: &EventBus) -> EnemyController {
        EnemyController::spawn(
            spawn,
            &EnemyConfig::default(),
            bus.sender(),
            fastrand::Rng::with_seed(5),
        )
    }

    fn route() -> Vec<Vec2> {
        vec![Vec2::new(4.0, 0.0), Vec2::new(0.0, 0.0)]
    }

    #[test]
    fn test_missing_route_disables() {
        let bus = EventBus::default();
        let mut enemy = spawn(&EnemySpawn::new(BehaviorKind::Brawler, Vec2::ZERO), &bus);
        assert!(!enemy.is_enabled());
        assert!(enemy.wiring_error().is_some());

        let mut dummy = Dummy::at(1.0);
        enemy.tick(1.0, &mut dummy);
        assert_eq!(enemy.state(), EnemyState::Idle);
        assert_eq!(dummy.hits, 0);
    }

    #[test]
    fn test_patrol_appears_idles_then_moves() {
        let bus = EventBus::default();
        let spawn_desc = EnemySpawn::new(BehaviorKind::Patrol, Vec2::ZERO)
            .with_waypoints(route())
            .airborne();
        let mut enemy = spawn(&spawn_desc, &bus);
        let mut far = Dummy::at(100.0);

        enemy.tick(0.1, &mut far);
        assert_eq!(enemy.state(), EnemyState::Appearing);

        enemy.land();
        enemy.tick(0.1, &mut far);
        assert_eq!(enemy.state(), EnemyState::Idle);

        enemy.tick(1.0, &mut far);
        assert_eq!(enemy.state(), EnemyState::Idle);
        enemy.tick(1.0, &mut far);
        assert_eq!(enemy.state(), EnemyState::Move);

        // Walks to (4, 0) at 2 u/s; arrives within the 1.0 radius
        for _ in 0..20 {
            enemy.tick(0.1, &mut far);
        }
        assert_eq!(enemy.state(), EnemyState::Idle);
        assert!(enemy.position().x > 2.9);
    }

    #[test]
    fn test_patrol_attack_holds_lock() {
        let bus = EventBus::default();
        let spawn_desc = EnemySpawn::new(BehaviorKind::Patrol, Vec2::ZERO).with_waypoints(route());
        let mut enemy = spawn(&spawn_desc, &bus);
        let mut far = Dummy::at(100.0);
        enemy.tick(0.1, &mut far);
        assert_eq!(enemy.state(), EnemyState::Idle);

        let mut near = Dummy::at(1.0);
        enemy.tick(0.1, &mut near);
        assert_eq!(enemy.state(), EnemyState::Attack);
        assert_eq!(near.hits, 1);
        assert_eq!(near.hp, 90.0);
        assert!(!enemy.machine().can_change_state());

        // Player walks away mid-swing; the swing still completes
        enemy.tick(0.5, &mut far);
        assert_eq!(enemy.state(), EnemyState::Attack);
        enemy.tick(0.5, &mut far);
        assert_eq!(enemy.state(), EnemyState::Idle);
    }

    #[test]
    fn test_patrol_repeats_attack_while_detected() {
        let bus = EventBus::default();
        let spawn_desc = EnemySpawn::new(BehaviorKind::Patrol, Vec2::ZERO).with_waypoints(route());
        let mut enemy = spawn(&spawn_desc, &bus);
        let mut near = Dummy::at(1.0);

        enemy.tick(0.1, &mut near);
        enemy.tick(0.1, &mut near);
        assert_eq!(near.hits, 1);

        // Swing ends -> Idle, then the queued attack fires
        enemy.tick(1.0, &mut near);
        enemy.tick(0.1, &mut near);
        assert_eq!(enemy.state(), EnemyState::Attack);
        assert_eq!(near.hits, 2);
    }

    #[test]
    fn test_brawler_classifies_by_distance() {
        let bus = EventBus::default();
        let spawn_desc = EnemySpawn::new(BehaviorKind::Brawler, Vec2::ZERO).with_waypoints(route());
        let mut enemy = spawn(&spawn_desc, &bus);

        let mut far = Dummy::at(50.0);
        enemy.tick(0.1, &mut far);
        assert_eq!(enemy.state(), EnemyState::Idle);

        let mut mid = Dummy::at(8.0);
        enemy.tick(0.1, &mut mid);
        assert_eq!(enemy.state(), EnemyState::Move);

        let mut near = Dummy::at(3.0);
        enemy.tick(0.1, &mut near);
        assert_eq!(enemy.state(), EnemyState::Attack);
        assert_eq!(near.hits, 1);
        assert_eq!(near.hp, 90.0);

        // Cooldown of one second between strikes
        enemy.tick(0.5, &mut near);
        assert_eq!(near.hits, 1);
        enemy.tick(0.6, &mut near);
        assert_eq!(near.hits, 2);
    }

    #[test]
    fn test_brawler_attack_releases_each_tick() {
        let bus = EventBus::default();
        let spawn_desc = EnemySpawn::new(BehaviorKind::Brawler, Vec2::ZERO).with_waypoints(route());
        let mut enemy = spawn(&spawn_desc, &bus);

        let mut near = Dummy::at(3.0);
        enemy.tick(0.1, &mut near);
        assert_eq!(enemy.state(), EnemyState::Attack);
        assert!(enemy.machine().can_change_state());

        // Target backs off; the next tick follows it instead of finishing a swing
        let mut mid = Dummy::at(8.0);
        enemy.tick(0.1, &mut mid);
        assert_eq!(enemy.state(), EnemyState::Move);
        assert_eq!(mid.hits, 0);
    }

    #[test]
    fn test_brawler_idles_when_target_dead() {
        let bus = EventBus::default();
        let spawn_desc = EnemySpawn::new(BehaviorKind::Brawler, Vec2::ZERO).with_waypoints(route());
        let mut enemy = spawn(&spawn_desc, &bus);
        let mut near = Dummy::at(1.0);
        near.hp = 0.0;

        enemy.tick(0.1, &mut near);
        assert_eq!(enemy.state(), EnemyState::Idle);
        assert_eq!(near.hits, 0);
    }

    #[test]
    fn test_brawler_hit_reclassifies() {
        let bus = EventBus::default();
        let spawn_desc = EnemySpawn::new(BehaviorKind::Brawler, Vec2::ZERO).with_waypoints(route());
        let mut enemy = spawn(&spawn_desc, &bus);
        let mut mid = Dummy::at(8.0);
        enemy.tick(0.1, &mut mid);

        assert!(enemy.receive_hit());
        enemy.tick(0.1, &mut mid);
        assert_eq!(enemy.state(), EnemyState::Hit);

        enemy.end_hit(&mut mid);
        assert_eq!(enemy.state(), EnemyState::Move);
    }

    #[test]
    fn test_boss_cycle() {
        let bus = EventBus::default();
        let mut boss = spawn(&EnemySpawn::new(BehaviorKind::Boss, Vec2::ZERO), &bus);
        let mut player = Dummy::at(5.0);

        boss.tick(0.1, &mut player);
        assert_eq!(boss.state(), EnemyState::Idle);
        boss.tick(0.1, &mut player);
        assert_eq!(boss.state(), EnemyState::Move);

        // Closes 3 u/s until inside the attack range
        for _ in 0..12 {
            boss.tick(0.1, &mut player);
            if boss.state() == EnemyState::Attack {
                break;
            }
        }
        assert_eq!(boss.state(), EnemyState::Attack);
        assert_eq!(player.hits, 1);

        // Locked for the cooldown even if the player leaves
        let mut gone = Dummy::at(100.0);
        boss.tick(1.0, &mut gone);
        assert_eq!(boss.state(), EnemyState::Attack);
        boss.tick(1.0, &mut gone);
        assert_eq!(boss.state(), EnemyState::Idle);
    }

    #[test]
    fn test_death_is_forced_and_rewards() {
        let bus = EventBus::default();
        let spawn_desc = EnemySpawn::new(BehaviorKind::Patrol, Vec2::ZERO).with_waypoints(route());
        let mut enemy = spawn(&spawn_desc, &bus);
        let mut near = Dummy::at(1.0);
        enemy.tick(0.1, &mut near);
        enemy.tick(0.1, &mut near);
        assert!(!enemy.machine().can_change_state());

        let outcome = enemy.take_damage(1000.0);
        assert!(matches!(outcome, DamageOutcome::Killed { .. }));
        enemy.tick(0.1, &mut near);

        assert_eq!(enemy.state(), EnemyState::Dead);
        assert_eq!(near.fragments, 10);
        assert_eq!(
            bus.drain(),
            vec![GameEvent::EntityDied {
                entity_id: enemy.id()
            }]
        );

        // Absorbing, and no more rewards
        enemy.release();
        assert!(!enemy.receive_hit());
        enemy.tick(1.0, &mut near);
        assert_eq!(near.fragments, 10);
        assert!(!enemy.is_despawned());

        enemy.tick(1.0, &mut near);
        assert!(enemy.is_despawned());
    }
}
