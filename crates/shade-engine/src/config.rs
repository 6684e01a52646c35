//! Engine configuration.
//!
//! Provides the simulation clock rates, asset paths, the scripted player
//! behaviour, the enemy roster and the gameplay tuning. Configuration can be
//! loaded from and saved to a TOML file.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use shade_common::ConfigError;
use shade_gameplay::config::GameplayConfig;
use shade_gameplay::enemy::{BehaviorKind, EnemySpawn};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "shade.toml";

/// Scripted player behaviour for headless runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Spawn position
    pub player_start: Vec2,
    /// Horizontal input held for the whole run (-1.0 - 1.0)
    pub input_x: f32,
    /// Stamina spent per player attack
    pub attack_stamina_cost: f32,
    /// Stamina regenerated per second
    pub stamina_regen: f32,
    /// Seconds between weapon form switches (0 = never)
    pub weapon_cycle_interval: f32,
    /// Seconds an enemy stays in its hit reaction
    pub hit_recovery: f32,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            player_start: Vec2::ZERO,
            input_x: 1.0,
            attack_stamina_cost: 5.0,
            stamina_regen: 10.0,
            weapon_cycle_interval: 10.0,
            hit_recovery: 0.3,
        }
    }
}

/// Engine configuration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Clock ===
    /// Fixed updates per second
    pub tick_rate: u32,
    /// Variable updates per second
    pub frame_rate: u32,
    /// Simulated seconds before the run stops
    pub sim_seconds: f32,
    /// RNG seed (None = random)
    pub seed: Option<u64>,

    // === Assets ===
    /// Weapon stat table (JSON)
    pub weapon_table: PathBuf,

    // === Events ===
    /// Event bus capacity
    pub bus_capacity: usize,

    // === Scenario ===
    /// Scripted player behaviour
    pub script: ScriptConfig,
    /// Enemies spawned at startup
    pub enemies: Vec<EnemySpawn>,

    // === Gameplay ===
    /// Gameplay tuning
    pub gameplay: GameplayConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Clock
            tick_rate: 50,
            frame_rate: 60,
            sim_seconds: 60.0,
            seed: None,

            // Assets
            weapon_table: PathBuf::from("assets/weapons.json"),

            // Events
            bus_capacity: 256,

            // Scenario
            script: ScriptConfig::default(),
            enemies: vec![
                EnemySpawn::new(BehaviorKind::Patrol, Vec2::new(8.0, 0.0))
                    .with_waypoints(vec![Vec2::new(8.0, 0.0), Vec2::new(14.0, 0.0)])
                    .airborne(),
                EnemySpawn::new(BehaviorKind::Brawler, Vec2::new(20.0, 0.0))
                    .with_waypoints(vec![Vec2::new(18.0, 0.0), Vec2::new(24.0, 0.0)]),
                EnemySpawn::new(BehaviorKind::Boss, Vec2::new(40.0, 0.0)),
            ],

            // Gameplay
            gameplay: GameplayConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    #[allow(dead_code)]
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    /// Returns every value that had to be adjusted.
    pub fn validate(&mut self) -> Vec<ConfigError> {
        let mut adjusted = Vec::new();

        // Clock
        clamp_field(&mut adjusted, "tick_rate", &mut self.tick_rate, 10, 240);
        clamp_field(&mut adjusted, "frame_rate", &mut self.frame_rate, 10, 240);
        clamp_field(&mut adjusted, "sim_seconds", &mut self.sim_seconds, 0.0, 3600.0);

        // Events
        clamp_field(&mut adjusted, "bus_capacity", &mut self.bus_capacity, 16, 65_536);

        // Script
        let script = &mut self.script;
        clamp_field(&mut adjusted, "script.input_x", &mut script.input_x, -1.0, 1.0);
        script.attack_stamina_cost = script.attack_stamina_cost.max(0.0);
        script.stamina_regen = script.stamina_regen.max(0.0);
        script.weapon_cycle_interval = script.weapon_cycle_interval.max(0.0);
        script.hit_recovery = script.hit_recovery.max(0.0);

        // Gameplay
        adjusted.extend(self.gameplay.sanitize());

        for err in &adjusted {
            warn!("Config adjusted: {err}");
        }
        adjusted
    }

    /// Fixed timestep in seconds.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Variable timestep in seconds.
    #[must_use]
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }
}

fn clamp_field<T>(adjusted: &mut Vec<ConfigError>, field: &'static str, value: &mut T, min: T, max: T)
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    let clamped = if *value < min {
        min
    } else if *value > max {
        max
    } else {
        return;
    };
    adjusted.push(ConfigError::invalid(
        field,
        format!("{value} is outside {min}..={max}, using {clamped}"),
    ));
    *value = clamped;
}
