//! Navigation settings.

use serde::Deserialize;

use crate::error::{NavError, Result};
use crate::instruction::Locale;

/// Thresholds and language used by a navigation session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NavigationConfig {
    /// Distance to the next maneuver below which the pre-announcement fires (default: 100 m)
    #[serde(default = "default_upcoming_turn_threshold")]
    pub upcoming_turn_threshold_m: f64,

    /// Distance to the final maneuver that counts as arrival (default: 30 m)
    #[serde(default = "default_arrival_threshold")]
    pub arrival_threshold_m: f64,

    #[serde(default)]
    pub locale: Locale,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            upcoming_turn_threshold_m: default_upcoming_turn_threshold(),
            arrival_threshold_m: default_arrival_threshold(),
            locale: Locale::default(),
        }
    }
}

impl NavigationConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("upcoming_turn_threshold_m", self.upcoming_turn_threshold_m),
            ("arrival_threshold_m", self.arrival_threshold_m),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(NavError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        Ok(())
    }
}

fn default_upcoming_turn_threshold() -> f64 {
    100.0
}

fn default_arrival_threshold() -> f64 {
    30.0
}
