//! Engine configuration with documented constants
//!
//! All tunable values are collected here with explanations of their purpose.
//! Defaults carry the Sonoran Desert calibration from the field studies the
//! scoring model was fitted against.

use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::risk::band::BandRule;
use crate::risk::index::{RiskWeights, ScoringStrategy};

/// Configuration for one engine instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    // === RISK SCORING ===
    /// Scoring weights (alpha = vegetation, beta = invasive grass, gamma = slope)
    ///
    /// Must sum to 1.0. Violations are a configuration error rejected at
    /// validation time, never a runtime fault.
    pub weights: RiskWeights,

    /// Which scoring rule maps cell inputs to a risk index
    ///
    /// Two rules are in circulation among the domain owners; both are kept
    /// selectable until one is declared canonical.
    pub scoring: ScoringStrategy,

    /// Lower bound of the Medium risk band (inclusive)
    pub band_medium_min: f64,

    /// Lower bound of the High risk band (inclusive)
    pub band_high_min: f64,

    /// Defensible-space rules: (max distance from structure, max grass height)
    ///
    /// Ordered by distance, innermost first. Used for compliance reporting
    /// only; never feeds the risk index.
    pub defensible_bands: Vec<BandRule>,

    // === ENVIRONMENT ===
    /// Water deficit accrued per tick by an unserviced zone (mm)
    pub deficit_accrual_mm: f64,

    /// Duration of one simulation tick in hours
    pub tick_hours: f64,

    /// Liters of delivered water that offset one millimeter of deficit
    ///
    /// Converts zone deficit into delivery demand and delivered volume back
    /// into deficit reduction.
    pub liters_per_mm: f64,

    // === DISPATCH ===
    /// Optional fairness guard: zones unserved for at least this many ticks
    /// are promoted to the head of the dispatch order
    ///
    /// `None` keeps strict greedy-by-priority ordering, which can starve
    /// persistently low-priority zones indefinitely. That starvation is
    /// intended behavior, not a defect; this guard is the escape valve.
    pub min_service_interval: Option<u64>,

    /// Maximum trips any single asset can fly/drive in one tick
    ///
    /// Bounds the greedy assignment loop. Trucks draw no battery, so the
    /// trip budget is the only thing that exhausts them within a tick.
    pub max_trips_per_tick: u32,

    /// Drone cruise speed (m/s), used to derive airborne minutes from range
    pub drone_cruise_mps: f64,

    // === PARALLELIZATION ===
    /// Minimum cell count before the scoring phase uses parallel workers
    ///
    /// Below this threshold, thread overhead exceeds benefits.
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            scoring: ScoringStrategy::WeightedSum,
            band_medium_min: 0.33,
            band_high_min: 0.67,
            defensible_bands: BandRule::sonoran_defaults(),
            deficit_accrual_mm: 2.0,
            tick_hours: 1.0,
            liters_per_mm: 10.0,
            min_service_interval: None,
            max_trips_per_tick: 6,
            drone_cruise_mps: 12.0,
            parallel_threshold: 1000,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let weight_sum = self.weights.alpha + self.weights.beta + self.weights.gamma;
        if (weight_sum - 1.0).abs() > 1e-9 {
            return Err(EngineError::InvalidConfig(format!(
                "scoring weights must sum to 1.0, got {weight_sum}"
            )));
        }
        if self.weights.alpha < 0.0 || self.weights.beta < 0.0 || self.weights.gamma < 0.0 {
            return Err(EngineError::InvalidConfig(
                "scoring weights must be non-negative".into(),
            ));
        }

        if !(0.0 < self.band_medium_min && self.band_medium_min < self.band_high_min) {
            return Err(EngineError::InvalidConfig(format!(
                "band thresholds must satisfy 0 < medium ({}) < high ({})",
                self.band_medium_min, self.band_high_min
            )));
        }

        if self.deficit_accrual_mm < 0.0 {
            return Err(EngineError::InvalidConfig(
                "deficit accrual rate must be non-negative".into(),
            ));
        }
        if self.liters_per_mm <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "liters_per_mm must be positive".into(),
            ));
        }
        if self.tick_hours <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "tick duration must be positive".into(),
            ));
        }
        if self.max_trips_per_tick == 0 {
            return Err(EngineError::InvalidConfig(
                "max_trips_per_tick must be at least 1".into(),
            ));
        }
        if self.drone_cruise_mps <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "drone cruise speed must be positive".into(),
            ));
        }

        // Band rules must be ordered innermost-first
        let mut last = 0.0_f64;
        for rule in &self.defensible_bands {
            if rule.max_distance_m <= last {
                return Err(EngineError::InvalidConfig(format!(
                    "defensible band distances must strictly increase, got {} after {}",
                    rule.max_distance_m, last
                )));
            }
            last = rule.max_distance_m;
        }

        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn load_from_toml(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
