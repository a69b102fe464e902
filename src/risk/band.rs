//! Risk bands and defensible-space rules
//!
//! Band classification is a pure function of the risk index. Defensible-space
//! rules are static configuration used for compliance reporting only; they
//! never feed the index.

use serde::{Deserialize, Serialize};

/// Risk band derived from a cell's index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    /// Classify an index against the configured thresholds
    ///
    /// Lower bounds are inclusive: an index exactly at `medium_min`
    /// classifies Medium, exactly at `high_min` classifies High.
    pub fn classify(index: f64, medium_min: f64, high_min: f64) -> Self {
        if index >= high_min {
            Self::High
        } else if index >= medium_min {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// One defensible-space rule: grass within `max_distance_m` of a structure
/// must stay at or below `max_grass_height_cm`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandRule {
    pub max_distance_m: f64,
    pub max_grass_height_cm: f64,
}

impl BandRule {
    pub fn new(max_distance_m: f64, max_grass_height_cm: f64) -> Self {
        Self {
            max_distance_m,
            max_grass_height_cm,
        }
    }

    /// Default rules from the Sonoran WUI calibration: zero-fuel strip,
    /// fuel-reduction ring, extended management ring
    pub fn sonoran_defaults() -> Vec<Self> {
        vec![
            Self::new(1.0, 0.0),
            Self::new(10.0, 10.0),
            Self::new(30.0, 20.0),
        ]
    }
}

/// Maximum permitted grass height at a given distance from a structure
///
/// Rules are ordered innermost-first; the first matching ring applies.
/// Beyond the outermost ring there is no height requirement.
pub fn required_max_height_cm(rules: &[BandRule], distance_m: f64) -> Option<f64> {
    rules
        .iter()
        .find(|r| distance_m <= r.max_distance_m)
        .map(|r| r.max_grass_height_cm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries_inclusive() {
        assert_eq!(RiskBand::classify(0.32, 0.33, 0.67), RiskBand::Low);
        assert_eq!(RiskBand::classify(0.33, 0.33, 0.67), RiskBand::Medium);
        assert_eq!(RiskBand::classify(0.66, 0.33, 0.67), RiskBand::Medium);
        assert_eq!(RiskBand::classify(0.67, 0.33, 0.67), RiskBand::High);
        assert_eq!(RiskBand::classify(1.0, 0.33, 0.67), RiskBand::High);
    }

    #[test]
    fn test_required_height_by_ring() {
        let rules = BandRule::sonoran_defaults();
        assert_eq!(required_max_height_cm(&rules, 0.5), Some(0.0));
        assert_eq!(required_max_height_cm(&rules, 5.0), Some(10.0));
        assert_eq!(required_max_height_cm(&rules, 25.0), Some(20.0));
        assert_eq!(required_max_height_cm(&rules, 100.0), None);
    }
}
