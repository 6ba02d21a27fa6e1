//! Simulation tuning knobs.
//!
//! Every threshold the simulation consults lives here so balance can be
//! changed without touching the rules. Values are deserialized from JSON with
//! per-field defaults, so a partial document only overrides what it names.
//!
//! ```
//! use shelter_logic::config::SimConfig;
//!
//! let cfg = SimConfig::from_json(r#"{ "occupancy": { "sleep_capacity": 6 } }"#).unwrap();
//! assert_eq!(cfg.occupancy.sleep_capacity, 6);
//! assert_eq!(cfg.power.rooms_per_station, 4);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Navigation graph tolerances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Max horizontal gap between two rooms that still counts as touching.
    pub adjacency_gap: f32,
    /// Tolerance for matching shaft X-ranges and shaft/room contact.
    pub shaft_tolerance: f32,
    /// Two rooms share a floor when their top edges differ by at most this.
    pub floor_tolerance: f32,
    /// Lost agents further than this from the nearest room centre are snapped.
    pub snap_distance: f32,
    /// Number of cached room chains kept by the navigation graph.
    pub path_cache_capacity: usize,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            adjacency_gap: 8.0,
            shaft_tolerance: 6.0,
            floor_tolerance: 2.0,
            snap_distance: 60.0,
            path_cache_capacity: 256,
        }
    }
}

/// Seat and bed limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OccupancyConfig {
    pub sleep_capacity: usize,
    pub slots_per_room: usize,
}

impl Default for OccupancyConfig {
    fn default() -> Self {
        Self {
            sleep_capacity: 4,
            slots_per_room: 5,
        }
    }
}

/// Power distribution rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// Rooms whose construction index is below this are always powered.
    pub starter_rooms: usize,
    /// Room-slots each power-producing room supplies (itself included).
    pub rooms_per_station: usize,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            starter_rooms: 4,
            rooms_per_station: 4,
        }
    }
}

/// Combat and detection timing (seconds) and distances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub detection_interval: f32,
    /// `None` means aggressive detectors search the whole shelter.
    pub detection_radius: Option<f32>,
    pub attack_lock: f32,
    pub hurt_duration: f32,
    pub death_sequence: f32,
    /// How far a target may drift from the end of the chase path before re-pathing.
    pub repath_distance: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            detection_interval: 0.25,
            detection_radius: None,
            attack_lock: 0.6,
            hurt_duration: 0.3,
            death_sequence: 2.0,
            repath_distance: 24.0,
        }
    }
}

/// Waypoint motion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Walking speed in units per second.
    pub walk_speed: f32,
    /// Cap on distance covered in a single tick.
    pub max_step: f32,
    pub arrive_epsilon: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            walk_speed: 60.0,
            max_step: 12.0,
            arrive_epsilon: 0.5,
        }
    }
}

/// Stalled-agent polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub stuck_check_interval: f32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            stuck_check_interval: 3.0,
        }
    }
}

/// Complete simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub nav: NavConfig,
    pub occupancy: OccupancyConfig,
    pub power: PowerConfig,
    pub combat: CombatConfig,
    pub motion: MotionConfig,
    pub recovery: RecoveryConfig,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            nav: NavConfig::default(),
            occupancy: OccupancyConfig::default(),
            power: PowerConfig::default(),
            combat: CombatConfig::default(),
            motion: MotionConfig::default(),
            recovery: RecoveryConfig::default(),
            seed: 0x5EED,
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("motion.walk_speed", self.motion.walk_speed)?;
        positive("motion.max_step", self.motion.max_step)?;
        positive(
            "recovery.stuck_check_interval",
            self.recovery.stuck_check_interval,
        )?;
        positive("combat.detection_interval", self.combat.detection_interval)?;
        if let Some(radius) = self.combat.detection_radius {
            positive("combat.detection_radius", radius)?;
        }
        if self.occupancy.sleep_capacity == 0 {
            return Err(invalid("occupancy.sleep_capacity", "must be at least 1"));
        }
        if self.occupancy.slots_per_room < self.occupancy.sleep_capacity {
            return Err(invalid(
                "occupancy.slots_per_room",
                "must be at least occupancy.sleep_capacity",
            ));
        }
        if self.power.rooms_per_station == 0 {
            return Err(invalid("power.rooms_per_station", "must be at least 1"));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, &format!("expected a positive number, got {value}")))
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
