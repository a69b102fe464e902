//! GridStore - authoritative state for cells and zones
//!
//! Single owner of mutable grid state within a simulation instance. Signal
//! writes come from ingestion, index writes from the scoring sweep, and
//! environment writes from the clock; everything funnels through here.

use ahash::{AHashMap, AHashSet};
use geo_types::Point;

use crate::core::types::{centroid_of, haversine_m, CellId, ZoneId};
use crate::grid::cell::{Cell, CellSample};
use crate::grid::patch::{recompute_zone_aggregate, Zone};

/// Authoritative store of cells, zones, and their ownership mapping
#[derive(Debug, Clone, Default)]
pub struct GridStore {
    pub cells: AHashMap<CellId, Cell>,
    pub zones: AHashMap<ZoneId, Zone>,
    /// Exclusive cell -> zone ownership
    owner: AHashMap<CellId, ZoneId>,
    /// Zones whose membership changed since the last aggregation pass
    dirty: AHashSet<ZoneId>,
    next_zone_id: u32,
}

impl GridStore {
    pub fn new() -> Self {
        Self {
            cells: AHashMap::new(),
            zones: AHashMap::new(),
            owner: AHashMap::new(),
            dirty: AHashSet::new(),
            next_zone_id: 1,
        }
    }

    pub fn insert_cell(&mut self, cell: Cell) {
        self.cells.insert(cell.id, cell);
    }

    /// Apply a batch of observations from the external attribute feed
    ///
    /// Returns the number of samples applied. Samples for unknown cells are
    /// dropped with a warning; they never abort the batch.
    pub fn ingest(&mut self, samples: &[CellSample]) -> usize {
        let mut applied = 0;
        for sample in samples {
            let Some(cell) = self.cells.get_mut(&sample.cell) else {
                tracing::warn!("ingest sample for unknown cell {:?}, dropped", sample.cell);
                continue;
            };
            cell.vegetation = sample.vegetation;
            cell.grass_cover = sample.grass_cover;
            cell.slope = sample.slope;
            cell.grass_height_cm = sample.grass_height_cm;
            cell.valid = sample.valid;
            applied += 1;
        }
        applied
    }

    /// Create an empty zone
    pub fn create_zone(&mut self, label: impl Into<String>) -> ZoneId {
        let id = ZoneId(self.next_zone_id);
        self.next_zone_id += 1;
        self.zones.insert(id, Zone::new(id, label.into()));
        self.dirty.insert(id);
        id
    }

    /// Add a cell to a zone, enforcing exclusive ownership
    ///
    /// A claim on a cell that is unknown or already owned by another zone is
    /// rejected and logged; the engine continues with the remaining members.
    pub fn assign_cell(&mut self, zone_id: ZoneId, cell_id: CellId) -> bool {
        if !self.cells.contains_key(&cell_id) {
            tracing::warn!("zone {:?} claimed unknown cell {:?}, rejected", zone_id, cell_id);
            return false;
        }
        if let Some(current) = self.owner.get(&cell_id) {
            tracing::warn!(
                "zone {:?} claimed cell {:?} already owned by {:?}, rejected",
                zone_id,
                cell_id,
                current
            );
            return false;
        }
        let Some(zone) = self.zones.get_mut(&zone_id) else {
            tracing::warn!("cell assignment to unknown zone {:?}, rejected", zone_id);
            return false;
        };
        zone.cells.push(cell_id);
        self.owner.insert(cell_id, zone_id);
        self.dirty.insert(zone_id);
        true
    }

    /// Remove a cell from its zone
    pub fn release_cell(&mut self, zone_id: ZoneId, cell_id: CellId) -> bool {
        if self.owner.get(&cell_id) != Some(&zone_id) {
            return false;
        }
        let Some(zone) = self.zones.get_mut(&zone_id) else {
            return false;
        };
        zone.cells.retain(|c| *c != cell_id);
        self.owner.remove(&cell_id);
        self.dirty.insert(zone_id);
        true
    }

    /// Adopt a fully-formed zone (snapshot restore path)
    ///
    /// Claims ownership of the zone's member cells; a conflicting or
    /// dangling claim means the snapshot is internally inconsistent.
    pub fn adopt_zone(&mut self, zone: Zone) -> crate::core::error::Result<()> {
        for cell in &zone.cells {
            if !self.cells.contains_key(cell) {
                return Err(crate::core::error::EngineError::CorruptSnapshot(format!(
                    "zone {:?} references missing cell {:?}",
                    zone.id, cell
                )));
            }
            if let Some(owner) = self.owner.get(cell) {
                return Err(crate::core::error::EngineError::CorruptSnapshot(format!(
                    "cell {:?} claimed by both {:?} and {:?}",
                    cell, owner, zone.id
                )));
            }
        }
        for cell in &zone.cells {
            self.owner.insert(*cell, zone.id);
        }
        self.next_zone_id = self.next_zone_id.max(zone.id.0 + 1);
        self.zones.insert(zone.id, zone);
        Ok(())
    }

    /// Remove a zone, releasing its cells
    pub fn remove_zone(&mut self, zone_id: ZoneId) -> bool {
        let Some(zone) = self.zones.remove(&zone_id) else {
            return false;
        };
        for cell in zone.cells {
            self.owner.remove(&cell);
        }
        self.dirty.remove(&zone_id);
        true
    }

    /// Apply scoring deltas to zone aggregates, skipping zones queued for a
    /// full recompute
    pub fn apply_deltas(
        &mut self,
        deltas: &[crate::risk::index::IndexDelta],
        skip: &AHashSet<ZoneId>,
    ) {
        crate::grid::patch::apply_index_deltas(&mut self.zones, &self.owner, deltas, skip);
    }

    pub fn zone_of(&self, cell_id: CellId) -> Option<ZoneId> {
        self.owner.get(&cell_id).copied()
    }

    pub fn ownership(&self) -> &AHashMap<CellId, ZoneId> {
        &self.owner
    }

    /// Zone ids in ascending order, for deterministic iteration
    pub fn sorted_zone_ids(&self) -> Vec<ZoneId> {
        let mut ids: Vec<ZoneId> = self.zones.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Drain the set of zones needing a full aggregate recompute
    pub fn take_dirty_zones(&mut self) -> AHashSet<ZoneId> {
        std::mem::take(&mut self.dirty)
    }

    /// Fully recompute aggregates and centroids for the given zones
    pub fn recompute_zones(&mut self, zone_ids: &AHashSet<ZoneId>) {
        let mut ids: Vec<ZoneId> = zone_ids.iter().copied().collect();
        ids.sort();
        for id in ids {
            let Some(zone) = self.zones.get_mut(&id) else {
                continue;
            };
            recompute_zone_aggregate(zone, &self.cells);
            let centers: Vec<Point<f64>> = zone
                .cells
                .iter()
                .filter_map(|c| self.cells.get(c))
                .map(|c| c.center)
                .collect();
            if let Some(centroid) = centroid_of(&centers) {
                zone.centroid = centroid;
            }
        }
    }

    /// Refresh each zone's distance to the nearest depot
    pub fn update_depot_distances(&mut self, depots: &[Point<f64>]) {
        if depots.is_empty() {
            return;
        }
        for zone in self.zones.values_mut() {
            let nearest_m = depots
                .iter()
                .map(|d| haversine_m(zone.centroid, *d))
                .fold(f64::INFINITY, f64::min);
            zone.distance_km = nearest_m / 1000.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::GridCoord;

    fn store_with_cells(n: u32) -> GridStore {
        let mut store = GridStore::new();
        for i in 0..n {
            store.insert_cell(Cell::new(
                CellId(i),
                GridCoord::new(0, i),
                Point::new(-112.0 + i as f64 * 0.001, 33.4),
            ));
        }
        store
    }

    #[test]
    fn test_exclusive_ownership_rejects_second_claim() {
        let mut store = store_with_cells(2);
        let a = store.create_zone("a");
        let b = store.create_zone("b");

        assert!(store.assign_cell(a, CellId(0)));
        assert!(!store.assign_cell(b, CellId(0)));
        assert_eq!(store.zone_of(CellId(0)), Some(a));
    }

    #[test]
    fn test_membership_change_marks_zone_dirty() {
        let mut store = store_with_cells(3);
        let zone = store.create_zone("z");
        store.take_dirty_zones();

        store.assign_cell(zone, CellId(1));
        let dirty = store.take_dirty_zones();
        assert!(dirty.contains(&zone));

        // Unchanged zones are not re-flagged
        assert!(store.take_dirty_zones().is_empty());
    }

    #[test]
    fn test_release_then_recompute_drops_contribution() {
        let mut store = store_with_cells(2);
        let zone = store.create_zone("z");
        store.assign_cell(zone, CellId(0));
        store.assign_cell(zone, CellId(1));

        store.cells.get_mut(&CellId(0)).unwrap().risk_index = 0.4;
        store.cells.get_mut(&CellId(1)).unwrap().risk_index = 0.3;
        let dirty = store.take_dirty_zones();
        store.recompute_zones(&dirty);
        assert!((store.zones[&zone].aggregate_risk - 0.7).abs() < 1e-12);

        store.release_cell(zone, CellId(1));
        let dirty = store.take_dirty_zones();
        store.recompute_zones(&dirty);
        assert!((store.zones[&zone].aggregate_risk - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_ingest_unknown_cell_dropped() {
        let mut store = store_with_cells(1);
        let samples = vec![
            CellSample::new(CellId(0), 0.5, 0.5, 0.5),
            CellSample::new(CellId(99), 0.5, 0.5, 0.5),
        ];
        assert_eq!(store.ingest(&samples), 1);
    }

    #[test]
    fn test_depot_distance_uses_nearest() {
        let mut store = store_with_cells(1);
        let zone = store.create_zone("z");
        store.assign_cell(zone, CellId(0));
        let dirty = store.take_dirty_zones();
        store.recompute_zones(&dirty);

        let near = store.zones[&zone].centroid;
        let far = Point::new(near.x() + 1.0, near.y());
        store.update_depot_distances(&[far, near]);
        assert!(store.zones[&zone].distance_km < 0.01);
    }
}
