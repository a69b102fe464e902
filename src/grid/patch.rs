//! Zones and patch-level aggregation
//!
//! A zone is an ordered set of cells treated as one dispatch unit. Its
//! aggregate risk is the exact sum of member cell contributions; the
//! aggregation layer keeps that sum correct with O(1) incremental updates
//! and falls back to a full recompute only when membership changes.

use ahash::AHashMap;
use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::core::types::{CellId, ZoneId};
use crate::grid::cell::Cell;
use crate::risk::index::IndexDelta;

/// A group of cells dispatched as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub label: String,
    /// Ordered member cells; ownership is exclusive across zones
    pub cells: Vec<CellId>,
    /// Sum of member cell risk contributions
    pub aggregate_risk: f64,
    /// Outstanding water deficit (mm)
    pub deficit_mm: f64,
    /// Native wildlife count, a proxy for ecological pressure
    pub wildlife_count: u32,
    /// Ticks since the last disturbance or completed service
    pub recovery_stage: u32,
    /// Zone centroid, WGS-84 (x = lon, y = lat)
    pub centroid: Point<f64>,
    /// Distance to the nearest asset depot (km)
    pub distance_km: f64,
    /// Ticks since the zone last received a delivery
    pub ticks_since_service: u64,
    /// Volume delivered in the most recent tick (consumed by the next
    /// environment advance)
    pub delivered_last_tick_l: f64,
}

impl Zone {
    pub fn new(id: ZoneId, label: String) -> Self {
        Self {
            id,
            label,
            cells: Vec::new(),
            aggregate_risk: 0.0,
            deficit_mm: 0.0,
            wildlife_count: 0,
            recovery_stage: 0,
            centroid: Point::new(0.0, 0.0),
            distance_km: 0.0,
            ticks_since_service: 0,
            delivered_last_tick_l: 0.0,
        }
    }

    pub fn with_deficit(mut self, deficit_mm: f64) -> Self {
        self.deficit_mm = deficit_mm;
        self
    }

    pub fn with_wildlife(mut self, count: u32) -> Self {
        self.wildlife_count = count;
        self
    }

    /// Delivery demand implied by the current deficit
    pub fn demand_liters(&self, liters_per_mm: f64) -> f64 {
        self.deficit_mm * liters_per_mm
    }
}

/// Recompute a zone's aggregate from scratch
///
/// Sums member contributions in member order. Used at initialization and
/// after any membership change; invalid cells contribute zero.
pub fn recompute_zone_aggregate(zone: &mut Zone, cells: &AHashMap<CellId, Cell>) {
    zone.aggregate_risk = zone
        .cells
        .iter()
        .filter_map(|id| cells.get(id))
        .map(Cell::contribution)
        .sum();
}

/// Apply per-cell contribution deltas to zone aggregates in O(1) per cell
///
/// `owner` maps each cell to its zone; unowned cells are skipped. Deltas
/// must arrive sorted by cell id (the scoring sweep guarantees this) so the
/// float accumulation order is reproducible. Zones in `skip` are about to be
/// fully recomputed and must not also receive increments.
pub fn apply_index_deltas(
    zones: &mut AHashMap<ZoneId, Zone>,
    owner: &AHashMap<CellId, ZoneId>,
    deltas: &[IndexDelta],
    skip: &ahash::AHashSet<ZoneId>,
) {
    for delta in deltas {
        if delta.delta() == 0.0 {
            continue;
        }
        let Some(zone_id) = owner.get(&delta.cell) else {
            continue;
        };
        if skip.contains(zone_id) {
            continue;
        }
        if let Some(zone) = zones.get_mut(zone_id) {
            zone.aggregate_risk += delta.delta();
        }
    }
}
