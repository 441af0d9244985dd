//! Formation timing and movement configuration
//!
//! All tuning numbers for formation movement live here. The movement
//! intervals match the batch cadence leaders are observed moving at:
//! player leaders re-target their followers every server batch, creature
//! leaders every third batch.

use serde::{Deserialize, Serialize};

use crate::core::error::{FormationError, Result};

/// Distance between followers when no stored settings apply
pub const DEFAULT_FORMATION_FOLLOWER_DISTANCE: f32 = 3.0;
/// Formation cadence for creature leaders (ms, three batch cycles)
pub const CREATURE_FORMATION_MOVEMENT_INTERVAL: u32 = 1200;
/// Formation cadence for player leaders (ms, one batch cycle)
pub const PLAYER_FORMATION_MOVEMENT_INTERVAL: u32 = 400;
/// Secondary check cadence of a follower controller (ms)
pub const MOVEMENT_CHECK_INTERVAL: u32 = 500;
/// How far ahead creature leaders are predicted (seconds of travel)
pub const CREATURE_PREDICTION_SECONDS: f32 = 1.65;
/// Upper bound for the follower catch-up speed multiplier
pub const MAX_CATCHUP_MULTIPLIER: f32 = 1.5;

/// Configuration for formation coordinators and follower controllers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationConfig {
    /// Cadence of formation moves when the leader is a player (ms)
    pub player_movement_interval: u32,

    /// Cadence of formation moves when the leader is a creature (ms)
    pub creature_movement_interval: u32,

    /// Radius used by formations without stored settings
    pub default_follower_distance: f32,

    /// Period of the follower's secondary check timer (ms)
    pub movement_check_interval: u32,

    /// Prediction horizon for creature leaders (seconds)
    ///
    /// Player leaders are predicted exactly one second ahead.
    pub creature_prediction_seconds: f32,

    /// Cap on the catch-up speed multiplier
    ///
    /// A follower far behind its slot moves at most this many times the
    /// leader's velocity.
    pub max_catchup_multiplier: f32,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            player_movement_interval: PLAYER_FORMATION_MOVEMENT_INTERVAL,
            creature_movement_interval: CREATURE_FORMATION_MOVEMENT_INTERVAL,
            default_follower_distance: DEFAULT_FORMATION_FOLLOWER_DISTANCE,
            movement_check_interval: MOVEMENT_CHECK_INTERVAL,
            creature_prediction_seconds: CREATURE_PREDICTION_SECONDS,
            max_catchup_multiplier: MAX_CATCHUP_MULTIPLIER,
        }
    }
}

impl FormationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML, filling missing keys with defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FormationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.player_movement_interval == 0 || self.creature_movement_interval == 0 {
            return Err(FormationError::InvalidConfig(
                "movement intervals must be positive".into(),
            ));
        }

        if self.movement_check_interval == 0 {
            return Err(FormationError::InvalidConfig(
                "movement_check_interval must be positive".into(),
            ));
        }

        if self.default_follower_distance <= 0.0 {
            return Err(FormationError::InvalidConfig(format!(
                "default_follower_distance ({}) must be positive",
                self.default_follower_distance
            )));
        }

        if self.creature_prediction_seconds <= 0.0 {
            return Err(FormationError::InvalidConfig(format!(
                "creature_prediction_seconds ({}) must be positive",
                self.creature_prediction_seconds
            )));
        }

        if self.max_catchup_multiplier < 1.0 {
            return Err(FormationError::InvalidConfig(format!(
                "max_catchup_multiplier ({}) should be >= 1.0",
                self.max_catchup_multiplier
            )));
        }

        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<FormationConfig> = OnceLock::new();

/// Get the global formation config (initializes with defaults if not set)
pub fn config() -> &'static FormationConfig {
    CONFIG.get_or_init(FormationConfig::default)
}

/// Set the global formation config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: FormationConfig) -> std::result::Result<(), FormationConfig> {
    CONFIG.set(config)
}
