//! Risk index scoring
//!
//! Maps a cell's normalized signals (vegetation, invasive grass, slope) to a
//! single index in [0, 1]. The scoring rule is pure and side-effect-free, so
//! the sweep over cells is embarrassingly parallel.
//!
//! Two scoring rules exist in the source material and disagree; both are
//! implemented and the choice is configuration. See DESIGN.md.

use ahash::AHashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::config::EngineConfig;
use crate::core::types::CellId;
use crate::grid::cell::Cell;
use crate::risk::band::RiskBand;

/// Scoring weights calibrated for the Sonoran WUI
///
/// Invasive grass is the primary fire-risk driver, hence the largest weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            alpha: 0.35,
            beta: 0.45,
            gamma: 0.20,
        }
    }
}

/// Which rule maps (vegetation, grass, slope) to the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringStrategy {
    /// alpha*v + beta*g + gamma*s, clamped to 1.0
    WeightedSum,
    /// v * g * s (risk only where all three factors are present)
    Product,
}

/// Compute the risk index for one cell's signals
///
/// Inputs must already be normalized; range validation happens in the sweep.
pub fn risk_index(strategy: ScoringStrategy, weights: RiskWeights, v: f64, g: f64, s: f64) -> f64 {
    match strategy {
        ScoringStrategy::WeightedSum => {
            (weights.alpha * v + weights.beta * g + weights.gamma * s).min(1.0)
        }
        ScoringStrategy::Product => v * g * s,
    }
}

fn in_unit_range(x: f64) -> bool {
    (0.0..=1.0).contains(&x)
}

/// Change in a cell's aggregate contribution from one sweep
#[derive(Debug, Clone, Copy)]
pub struct IndexDelta {
    pub cell: CellId,
    pub old_contribution: f64,
    pub new_contribution: f64,
}

impl IndexDelta {
    pub fn delta(&self) -> f64 {
        self.new_contribution - self.old_contribution
    }
}

fn rescore_cell(cell: &mut Cell, config: &EngineConfig) -> IndexDelta {
    let old_contribution = cell.contribution();

    let valid = in_unit_range(cell.vegetation)
        && in_unit_range(cell.grass_cover)
        && in_unit_range(cell.slope);

    if valid {
        cell.risk_index = risk_index(
            config.scoring,
            config.weights,
            cell.vegetation,
            cell.grass_cover,
            cell.slope,
        );
        cell.band = RiskBand::classify(cell.risk_index, config.band_medium_min, config.band_high_min);
        cell.valid = true;
    } else {
        // Out-of-range signal: the cell sits out this tick, nothing aborts
        cell.risk_index = 0.0;
        cell.band = RiskBand::Low;
        cell.valid = false;
    }

    IndexDelta {
        cell: cell.id,
        old_contribution,
        new_contribution: cell.contribution(),
    }
}

/// Recompute every cell's index and band
///
/// Runs on parallel workers when the cell count reaches the configured
/// threshold. Returned deltas are sorted by cell id so downstream float
/// accumulation is reproducible regardless of map iteration order.
pub fn recompute_indices(cells: &mut AHashMap<CellId, Cell>, config: &EngineConfig) -> Vec<IndexDelta> {
    let mut deltas: Vec<IndexDelta> = if cells.len() >= config.parallel_threshold {
        cells
            .par_iter_mut()
            .map(|(_, cell)| rescore_cell(cell, config))
            .collect()
    } else {
        cells
            .iter_mut()
            .map(|(_, cell)| rescore_cell(cell, config))
            .collect()
    };

    deltas.sort_by_key(|d| d.cell);
    deltas
}
