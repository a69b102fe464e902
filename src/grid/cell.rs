//! Cell model - the smallest spatial unit of the managed grid
//!
//! Cells carry normalized environmental signals and the derived risk index.
//! Signal writes come from external ingestion; the index write comes from
//! the scoring sweep. Everything else reads.

use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::core::types::{CellId, GridCoord};
use crate::risk::band::RiskBand;

/// Normalization caps carried over from the field calibration
pub const MAX_TREES_PER_HA: f64 = 1000.0;
pub const MAX_SLOPE_DEGREES: f64 = 60.0;

/// One grid cell (10x10 m at the default resolution)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub coord: GridCoord,
    /// Cell center, WGS-84 (x = lon, y = lat)
    pub center: Point<f64>,
    /// Vegetation density, normalized [0, 1]
    pub vegetation: f64,
    /// Invasive grass coverage, normalized [0, 1]
    pub grass_cover: f64,
    /// Slope steepness, normalized [0, 1]
    pub slope: f64,
    /// Distance to the nearest structure (m), for defensible-space reporting
    pub distance_to_structure_m: f64,
    /// Observed grass height (cm), for defensible-space reporting
    pub grass_height_cm: f64,
    /// Derived risk index [0, 1]; meaningless while `valid` is false
    pub risk_index: f64,
    /// Risk band derived from the index
    pub band: RiskBand,
    /// False when any input signal is out of range; invalid cells are
    /// excluded from aggregation and reporting for the tick
    pub valid: bool,
}

impl Cell {
    pub fn new(id: CellId, coord: GridCoord, center: Point<f64>) -> Self {
        Self {
            id,
            coord,
            center,
            vegetation: 0.0,
            grass_cover: 0.0,
            slope: 0.0,
            distance_to_structure_m: f64::MAX,
            grass_height_cm: 0.0,
            risk_index: 0.0,
            band: RiskBand::Low,
            valid: true,
        }
    }

    pub fn with_signals(mut self, vegetation: f64, grass_cover: f64, slope: f64) -> Self {
        self.vegetation = vegetation;
        self.grass_cover = grass_cover;
        self.slope = slope;
        self
    }

    pub fn with_structure_distance(mut self, distance_m: f64) -> Self {
        self.distance_to_structure_m = distance_m;
        self
    }

    pub fn with_grass_height(mut self, height_cm: f64) -> Self {
        self.grass_height_cm = height_cm;
        self
    }

    /// Contribution of this cell to its zone aggregate (0 while invalid)
    pub fn contribution(&self) -> f64 {
        if self.valid {
            self.risk_index
        } else {
            0.0
        }
    }
}

/// One observation from the external cell-attribute feed
///
/// Signals are already normalized; use [`CellSample::from_field_units`] to
/// convert raw survey measurements.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CellSample {
    pub cell: CellId,
    pub vegetation: f64,
    pub grass_cover: f64,
    pub slope: f64,
    pub grass_height_cm: f64,
    /// Validity flag from the feed itself (sensor fault, stale reading)
    pub valid: bool,
}

impl CellSample {
    pub fn new(cell: CellId, vegetation: f64, grass_cover: f64, slope: f64) -> Self {
        Self {
            cell,
            vegetation,
            grass_cover,
            slope,
            grass_height_cm: 0.0,
            valid: true,
        }
    }

    /// Convert raw survey units to normalized signals
    ///
    /// Density saturates at 1000 trees/ha and slope at 60 degrees; negative
    /// readings pass through unclamped and are caught by range validation.
    pub fn from_field_units(
        cell: CellId,
        trees_per_ha: f64,
        grass_cover_percent: f64,
        slope_degrees: f64,
    ) -> Self {
        Self::new(
            cell,
            (trees_per_ha / MAX_TREES_PER_HA).min(1.0),
            (grass_cover_percent / 100.0).min(1.0),
            (slope_degrees / MAX_SLOPE_DEGREES).min(1.0),
        )
    }

    pub fn with_grass_height(mut self, height_cm: f64) -> Self {
        self.grass_height_cm = height_cm;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_unit_normalization() {
        let sample = CellSample::from_field_units(CellId(1), 500.0, 80.0, 15.0);
        assert!((sample.vegetation - 0.5).abs() < 1e-9);
        assert!((sample.grass_cover - 0.8).abs() < 1e-9);
        assert!((sample.slope - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_field_units_saturate() {
        let sample = CellSample::from_field_units(CellId(1), 2500.0, 100.0, 75.0);
        assert_eq!(sample.vegetation, 1.0);
        assert_eq!(sample.slope, 1.0);
    }

    #[test]
    fn test_negative_readings_pass_through() {
        // Range validation in the scoring sweep flags these, not the ingest
        let sample = CellSample::from_field_units(CellId(1), -10.0, 20.0, 5.0);
        assert!(sample.vegetation < 0.0);
    }

    #[test]
    fn test_invalid_cell_contributes_zero() {
        let mut cell = Cell::new(CellId(1), GridCoord::new(0, 0), Point::new(0.0, 0.0));
        cell.risk_index = 0.7;
        cell.valid = false;
        assert_eq!(cell.contribution(), 0.0);
    }
}
