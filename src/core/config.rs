//! Planner configuration with documented constants
//!
//! All tunable numbers of the planning engine are collected here with notes
//! on what they control. Values load from TOML; any field missing from the
//! file keeps its default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{PlannerError, Result};

/// Configuration for one planning session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    // === ROUTE SEARCH ===
    /// Maximum number of terminal routes recorded by one enumeration pass
    ///
    /// Reaching the cap stops the pass early; uncovered territories are then
    /// enumerated again as a smaller residual area.
    pub enumeration_cap: usize,

    // === SMART AREAS ===
    /// How many layers of adjacent territories a region may grow by
    pub smart_area_layers: usize,

    /// Upper bound on `(borderRatio) / (sizeRatio)` for a grown area
    ///
    /// A grown candidate below this limit competes on border count with the
    /// plain region. At 1.1 a candidate must roughly keep its border count
    /// per territory from getting worse.
    pub smart_area_ratio_limit: f64,

    // === GARRISONS ===
    /// Depth of the threat search behind a border territory
    pub threat_depth: usize,

    /// Ideal garrison = round(multiplier * threat)
    pub garrison_multiplier: f64,

    /// Fraction of own income a garrison may grow by in one turn
    ///
    /// At 0.5 a single border never absorbs more than half a turn's income.
    pub garrison_income_fraction: f64,

    // === SCORING ===
    /// Probability of keeping an unguarded territory until next turn
    pub keep_chance: f64,

    /// Income value of holding one territory (three territories = one army)
    pub territory_value: f64,

    /// Common multiplier applied to every objective score
    pub score_scale: f64,

    /// Weight of neighbouring regions in the expansion density term
    pub neighbour_pressure_weight: f64,

    /// Armies a full set of three cards is assumed to be worth when the host
    /// does not report a cash value
    pub default_card_cash: u32,

    // === EXECUTION ===
    /// Free armies must exceed `defenders * mop_up_odds` for a mop-up attack
    pub mop_up_odds: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            // Route search
            enumeration_cap: 100_000,

            // Smart areas
            smart_area_layers: 2,
            smart_area_ratio_limit: 1.1,

            // Garrisons
            threat_depth: 5,
            garrison_multiplier: 1.2,
            garrison_income_fraction: 0.5,

            // Scoring
            keep_chance: 1.0 / 3.0,
            territory_value: 1.0 / 3.0,
            score_scale: 10.0,
            neighbour_pressure_weight: 0.5,
            default_card_cash: 4,

            // Execution
            mop_up_odds: 1.0,
        }
    }
}

impl PlannerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a config from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: PlannerConfig = toml::from_str(contents)?;
        config.validate().map_err(PlannerError::InvalidConfig)?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.enumeration_cap == 0 {
            return Err("enumeration_cap must be at least 1".into());
        }

        if !(0.0..=1.0).contains(&self.keep_chance) {
            return Err(format!("keep_chance ({}) must lie in [0, 1]", self.keep_chance));
        }

        if self.garrison_income_fraction < 0.0 || self.garrison_multiplier < 0.0 {
            return Err("Garrison factors must be non-negative".into());
        }

        if self.smart_area_ratio_limit <= 0.0 {
            return Err(format!(
                "smart_area_ratio_limit ({}) must be positive",
                self.smart_area_ratio_limit
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PlannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.enumeration_cap, 100_000);
        assert_eq!(config.threat_depth, 5);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PlannerConfig::from_toml_str("enumeration_cap = 50\nthreat_depth = 3\n").unwrap();
        assert_eq!(config.enumeration_cap, 50);
        assert_eq!(config.threat_depth, 3);
        assert_eq!(config.smart_area_layers, 2);
        assert_eq!(config.score_scale, 10.0);
    }

    #[test]
    fn test_invalid_keep_chance_rejected() {
        let config = PlannerConfig {
            keep_chance: 1.5,
            ..PlannerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_breaking_validation_is_rejected() {
        let err = PlannerConfig::from_toml_str("garrison_multiplier = -1.0\n").unwrap_err();
        assert!(matches!(err, PlannerError::InvalidConfig(_)));
        assert!(PlannerConfig::from_toml_str("enumeration_cap = 0\n").is_err());
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(PlannerConfig::from_toml_str("enumeration_cap = \"lots\"").is_err());
    }

    #[test]
    fn test_load_shipped_default_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/planner/default.toml");
        let config = PlannerConfig::load(path).expect("Should load shipped planner config");
        assert_eq!(config, PlannerConfig::default());
    }
}
