//! Application lifecycle management.
//!
//! Headless game loop: one scripted player against the configured enemies,
//! driven by a fixed-rate pass (status ticks, reactions, enemy AI) and a
//! frame-rate pass (fatigue), with progression events drained every frame.

use anyhow::{Context, Result};
use glam::Vec2;
use tracing::{debug, error, info, warn};

use shade_gameplay::enemy::EnemyController;
use shade_gameplay::enemy_state::EnemyState;
use shade_gameplay::events::{EventBus, GameEvent};
use shade_gameplay::items::{ItemEffect, ItemKind};
use shade_gameplay::player::Player;
use shade_gameplay::weapon::{self, WeaponForm, WeaponStatTable, WeaponType};

use crate::config::EngineConfig;
use crate::timing::FrameTiming;

/// Outcome of a simulation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimReport {
    /// Frames processed
    pub frames: u64,
    /// Fixed updates processed
    pub fixed_steps: u64,
    /// Simulated seconds
    pub elapsed: f64,
    /// Enemies killed
    pub enemies_killed: u32,
    /// Enemies still in the world
    pub enemies_remaining: usize,
    /// Items picked up
    pub items_collected: u32,
    /// Items used from the inventory
    pub items_used: u32,
    /// Player attacks landed
    pub attacks_landed: u32,
    /// Player HP at the end
    pub player_hp: f32,
    /// Whether the player died
    pub player_dead: bool,
    /// Shadow fragment balance at the end
    pub shadow_fragments: u32,
    /// Events drained from the bus
    pub events: u32,
}

/// Application state.
struct ShadeApp {
    /// Engine configuration
    config: EngineConfig,
    /// Frame timing
    timing: FrameTiming,
    /// Progression event bus
    bus: EventBus,

    // === Entities ===
    player: Player,
    weapon: WeaponForm,
    enemies: Vec<EnemyController>,

    // === Player combat ===
    /// Seconds until the next player attack
    attack_cooldown: f32,
    /// Seconds until the next weapon switch
    weapon_timer: f32,

    report: SimReport,
}

impl ShadeApp {
    fn new(config: EngineConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let bus = EventBus::new(config.bus_capacity);

        let player = Player::new(
            &config.gameplay,
            config.script.player_start,
            bus.sender(),
            rng.fork(),
        );
        let weapon = WeaponForm::new(WeaponType::ALL.to_vec(), bus.sender());

        let enemies: Vec<_> = config
            .enemies
            .iter()
            .map(|spawn| {
                EnemyController::spawn(spawn, &config.gameplay.enemy, bus.sender(), rng.fork())
            })
            .collect();
        let disabled = enemies.iter().filter(|e| !e.is_enabled()).count();
        if disabled > 0 {
            warn!("{} enemy(ies) disabled by missing wiring", disabled);
        }
        info!("Spawned player {} and {} enemies", player.entity_id(), enemies.len());

        Self {
            timing: FrameTiming::new(config.fixed_dt()),
            weapon_timer: config.script.weapon_cycle_interval,
            config,
            bus,
            player,
            weapon,
            enemies,
            attack_cooldown: 0.0,
            report: SimReport::default(),
        }
    }

    /// Runs until the time limit or the player's death.
    fn run(&mut self) -> SimReport {
        let frame_dt = self.config.frame_dt();
        let total_frames = (self.config.sim_seconds * self.config.frame_rate as f32).ceil() as u64;
        self.player.set_input(self.config.script.input_x);

        for _ in 0..total_frames {
            self.frame(frame_dt);
            if self.player.is_dead() {
                info!("Player died at {:.2}s", self.timing.elapsed());
                break;
            }
        }

        self.drain_events();
        self.shutdown();
        self.finish_report()
    }

    fn frame(&mut self, dt: f32) {
        let steps = self.timing.accumulate(dt);
        let fixed_dt = self.timing.fixed_dt();
        for _ in 0..steps {
            self.fixed_update(fixed_dt);
            self.report.fixed_steps += 1;
        }

        self.update(dt);
        self.drain_events();
    }

    /// Physics-rate pass.
    fn fixed_update(&mut self, dt: f32) {
        self.player.fixed_update(dt);

        for enemy in &mut self.enemies {
            if enemy.state() == EnemyState::Hit
                && enemy.machine().record().elapsed >= self.config.script.hit_recovery
            {
                enemy.end_hit(&mut self.player);
            }
            if let Some(item) = enemy.tick(dt, &mut self.player) {
                if !self.player.is_dead() && self.player.pick_up(item).is_ok() {
                    self.report.items_collected += 1;
                }
            }
        }
        self.enemies.retain(|e| !e.is_despawned());

        self.use_supplies();

        self.player_attack(dt);
    }

    /// Frame-rate pass.
    fn update(&mut self, dt: f32) {
        self.player
            .stats_mut()
            .heal_stamina(self.config.script.stamina_regen * dt);
        self.player.update(dt);

        if self.config.script.weapon_cycle_interval > 0.0 {
            self.weapon_timer -= dt;
            if self.weapon_timer <= 0.0 {
                self.weapon_timer += self.config.script.weapon_cycle_interval;
                self.weapon.cycle();
            }
        }
    }

    /// Uses carried items the player currently needs.
    fn use_supplies(&mut self) {
        if self.player.is_dead() {
            return;
        }

        let wanted: Vec<ItemKind> = self
            .player
            .inventory()
            .iter()
            .map(|(item, _)| item)
            .filter(|&item| match item.effect(&self.config.gameplay.items) {
                ItemEffect::Heal(_) => self.player.stats().hp_percent() < 0.5,
                ItemEffect::Cure(status) => self.player.status().is_active(status),
                ItemEffect::ExtraJump(_) => true,
                ItemEffect::None => false,
            })
            .collect();

        for item in wanted {
            if let Ok(effect) = self.player.use_from_inventory(item) {
                debug!("Used {:?} -> {:?}", item, effect);
                self.report.items_used += 1;
            }
        }
    }

    /// Strikes the nearest living enemy in reach of the current weapon.
    fn player_attack(&mut self, dt: f32) {
        self.attack_cooldown = (self.attack_cooldown - dt).max(0.0);
        if self.attack_cooldown > 0.0 || self.player.is_dead() {
            return;
        }

        let stat = match self.weapon.current_stat() {
            Ok(stat) => stat,
            Err(e) => {
                error!("Weapon lookup failed: {e}");
                self.attack_cooldown = 1.0;
                return;
            },
        };

        let origin = self.player.position();
        let Some(target) = nearest_in_range(&mut self.enemies, origin, stat.range) else {
            return;
        };

        let cost = self.config.script.attack_stamina_cost;
        if !self.player.stats_mut().use_stamina(cost) {
            debug!("Not enough stamina to attack");
            return;
        }

        let damage = stat.damage as f32 + self.player.stats().attack_power();
        let outcome = target.take_damage(damage);
        target.receive_hit();
        self.report.attacks_landed += 1;
        debug!(
            "{:?} hit {} for {:.1}",
            self.weapon.current(),
            target.id(),
            outcome.dealt()
        );

        self.attack_cooldown = 1.0 / stat.attack_speed.max(0.1);
    }

    fn drain_events(&mut self) {
        for event in self.bus.drain() {
            self.report.events += 1;
            match event {
                GameEvent::EntityDied { entity_id } if entity_id != self.player.entity_id() => {
                    self.report.enemies_killed += 1;
                    info!("Enemy {} died", entity_id);
                },
                other => debug!("Event: {:?}", other),
            }
        }
    }

    fn shutdown(&mut self) {
        self.player.teardown();
        for enemy in &mut self.enemies {
            enemy.teardown();
        }
    }

    fn finish_report(&mut self) -> SimReport {
        let mut report = std::mem::take(&mut self.report);
        report.frames = self.timing.frames();
        report.elapsed = self.timing.elapsed();
        report.enemies_remaining = self.enemies.len();
        report.player_hp = self.player.stats().current_hp();
        report.player_dead = self.player.is_dead();
        report.shadow_fragments = self.player.abilities().shadow_fragments();
        report
    }
}

fn nearest_in_range(
    enemies: &mut [EnemyController],
    origin: Vec2,
    range: f32,
) -> Option<&mut EnemyController> {
    enemies
        .iter_mut()
        .filter(|e| e.is_enabled() && e.state() != EnemyState::Dead)
        .map(|e| (e.position().distance(origin), e))
        .filter(|(distance, _)| *distance <= range)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, e)| e)
}

/// Run the simulation.
pub fn run(mut config: EngineConfig) -> Result<SimReport> {
    let adjusted = config.validate();
    if !adjusted.is_empty() {
        warn!("{} config value(s) adjusted", adjusted.len());
    }

    let table = WeaponStatTable::load(&config.weapon_table)
        .with_context(|| format!("loading weapon table {}", config.weapon_table.display()))?;
    weapon::init(table);

    let mut app = ShadeApp::new(config);
    let report = app.run();
    weapon::teardown();

    info!(
        "Simulated {:.1}s ({} frames, {} fixed steps): {} hit(s), {} kill(s), {} enemy(ies) left, player HP {:.1}{}",
        report.elapsed,
        report.frames,
        report.fixed_steps,
        report.attacks_landed,
        report.enemies_killed,
        report.enemies_remaining,
        report.player_hp,
        if report.player_dead { " (dead)" } else { "" }
    );
    Ok(report)
}
