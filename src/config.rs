//! Scoring configuration
//!
//! Tunables for the seed ranker, friction detector and level table. Every field
//! has a default, so a partial JSON document only overrides what it names.

use crate::error::PulseError;
use crate::types::Importance;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of seeds returned
pub const DEFAULT_SEED_LIMIT: usize = 5;

/// Days assumed for a contact that has never been reached
pub const NEVER_CONTACTED_DAYS: i64 = 100;

/// Number of trailing days the friction detector evaluates
pub const DEFAULT_FRICTION_WINDOW: usize = 3;

/// A single day at or above this approval rate clears sustained friction
pub const DEFAULT_CLEAR_EFFICIENCY: f64 = 0.80;

/// Cumulative XP required to reach each level, level 1 first
pub const LEVEL_THRESHOLDS: [u64; 6] = [0, 500, 1500, 5000, 15000, 50000];

/// Weight and target interval for one importance band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImportanceWeight {
    pub weight: f64,
    pub target_days: u32,
}

/// Weight/target lookup used by the seed ranker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportanceTable {
    pub high: ImportanceWeight,
    pub medium: ImportanceWeight,
    pub low: ImportanceWeight,
}

impl Default for ImportanceTable {
    fn default() -> Self {
        Self {
            high: ImportanceWeight {
                weight: 3.0,
                target_days: 14,
            },
            medium: ImportanceWeight {
                weight: 1.5,
                target_days: 30,
            },
            low: ImportanceWeight {
                weight: 0.5,
                target_days: 90,
            },
        }
    }
}

impl ImportanceTable {
    pub fn get(&self, importance: Importance) -> ImportanceWeight {
        match importance {
            Importance::High => self.high,
            Importance::Medium => self.medium,
            Importance::Low => self.low,
        }
    }
}

/// Seed ranker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub limit: usize,
    pub never_contacted_days: i64,
    pub table: ImportanceTable,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SEED_LIMIT,
            never_contacted_days: NEVER_CONTACTED_DAYS,
            table: ImportanceTable::default(),
        }
    }
}

/// Friction detector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrictionConfig {
    pub window: usize,
    pub clear_efficiency: f64,
}

impl Default for FrictionConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_FRICTION_WINDOW,
            clear_efficiency: DEFAULT_CLEAR_EFFICIENCY,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    pub seeds: SeedConfig,
    pub friction: FrictionConfig,
    pub levels: Vec<u64>,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            seeds: SeedConfig::default(),
            friction: FrictionConfig::default(),
            levels: LEVEL_THRESHOLDS.to_vec(),
        }
    }
}

impl PulseConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, PulseError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self, PulseError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, PulseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values outside the scorers' documented input domain
    pub fn validate(&self) -> Result<(), PulseError> {
        for (band, entry) in [
            ("high", self.seeds.table.high),
            ("medium", self.seeds.table.medium),
            ("low", self.seeds.table.low),
        ] {
            if entry.target_days == 0 {
                return Err(PulseError::InvalidConfig(format!(
                    "seeds.table.{band}.target_days must be positive"
                )));
            }
            if !entry.weight.is_finite() || entry.weight < 0.0 {
                return Err(PulseError::InvalidConfig(format!(
                    "seeds.table.{band}.weight must be a non-negative number"
                )));
            }
        }

        if self.seeds.never_contacted_days <= 0 {
            return Err(PulseError::InvalidConfig(
                "seeds.never_contacted_days must be positive".to_string(),
            ));
        }

        if self.friction.window == 0 {
            return Err(PulseError::InvalidConfig(
                "friction.window must be at least 1".to_string(),
            ));
        }

        if self.levels.first() != Some(&0) {
            return Err(PulseError::InvalidConfig(
                "levels must start at 0".to_string(),
            ));
        }

        if self.levels.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(PulseError::InvalidConfig(
                "levels must be strictly increasing".to_string(),
            ));
        }

        Ok(())
    }
}
