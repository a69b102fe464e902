//! Engine - orchestrates the per-tick pipeline
//!
//! This is the core loop that ties together:
//! environment advance -> scoring sweep -> aggregation -> ranking ->
//! assignment -> service application -> compliance -> publish.
//!
//! Each tick builds a fresh snapshot and atomically swaps it in on
//! completion. Readers hold the previously published snapshot and are never
//! blocked. A failed tick restores the working state and leaves the
//! published snapshot authoritative.

pub mod clock;
pub mod events;
pub mod snapshot;

pub use clock::SimulationClock;
pub use events::{DisturbanceEvent, DisturbanceKind, EngineEvent};
pub use snapshot::{ComplianceRow, TickSnapshot, ZoneRank, SNAPSHOT_FORMAT_VERSION};

use std::sync::Arc;

use ahash::AHashMap;

use crate::core::config::EngineConfig;
use crate::core::error::Result;
use crate::core::types::ZoneId;
use crate::dispatch::asset::{AssetPool, MissionOutcome};
use crate::dispatch::assigner::{plan_assignments, Assignment, AssignmentStatus};
use crate::dispatch::energy::return_cost_j;
use crate::dispatch::scheduler::{priority_score, PriorityScheduler};
use crate::grid::store::GridStore;
use crate::risk::band::required_max_height_cm;
use crate::risk::index::recompute_indices;
use crate::telemetry::TelemetrySink;

/// One simulation instance: the single decision-maker over its grid
pub struct Engine {
    pub config: EngineConfig,
    pub store: GridStore,
    pub pool: AssetPool,
    pub clock: SimulationClock,
    scheduler: PriorityScheduler,
    published: Arc<TickSnapshot>,
    telemetry: Option<Box<dyn TelemetrySink>>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: GridStore::new(),
            pool: AssetPool::new(),
            clock: SimulationClock::new(),
            scheduler: PriorityScheduler::new(),
            published: Arc::new(TickSnapshot::empty()),
            telemetry: None,
        })
    }

    pub fn with_telemetry(mut self, sink: Box<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    /// The last published snapshot; safe to read at any time
    pub fn snapshot(&self) -> Arc<TickSnapshot> {
        Arc::clone(&self.published)
    }

    /// Restore engine state from a reloaded snapshot
    ///
    /// Rebuilds the store from the snapshot's cell and zone records so a
    /// replay started here continues identically.
    pub fn restore(&mut self, snapshot: &TickSnapshot) -> Result<()> {
        let mut store = GridStore::new();
        for cell in &snapshot.cells {
            store.insert_cell(cell.clone());
        }
        for zone in &snapshot.zones {
            store.adopt_zone(zone.clone())?;
        }
        self.store = store;
        self.clock.tick = snapshot.tick;
        self.scheduler = PriorityScheduler::new();
        self.published = Arc::new(snapshot.clone());
        Ok(())
    }

    /// Run one tick of the full pipeline
    ///
    /// Stages, in order:
    /// 1. Assets finish recharging and emergency handoffs
    /// 2. Environment advance (accrual, absorption, recovery, disturbances)
    /// 3. Scoring sweep over all cells (parallel above the threshold)
    /// 4. Aggregation: full recompute for membership-dirty zones,
    ///    incremental deltas for the rest
    /// 5. Depot distances and priority re-rank
    /// 6. Greedy assignment planning
    /// 7. Service application through the asset state machine
    /// 8. Defensible-space compliance report
    /// 9. Snapshot build and atomic publish
    ///
    /// On error the entire tick is rolled back; the previously published
    /// snapshot remains authoritative.
    pub fn run_tick(&mut self, disturbances: &[DisturbanceEvent]) -> Result<Vec<EngineEvent>> {
        let saved_store = self.store.clone();
        let saved_pool = self.pool.clone();
        let saved_clock = self.clock.clone();
        let saved_scheduler = self.scheduler.clone();

        match self.run_tick_inner(disturbances) {
            Ok((next, events)) => {
                self.published = Arc::new(next);
                if let Some(sink) = &self.telemetry {
                    sink.on_tick(&self.published, &events);
                }
                Ok(events)
            }
            Err(e) => {
                self.store = saved_store;
                self.pool = saved_pool;
                self.clock = saved_clock;
                self.scheduler = saved_scheduler;
                tracing::error!("tick aborted, staying on last good snapshot: {e}");
                Err(e)
            }
        }
    }

    fn run_tick_inner(
        &mut self,
        disturbances: &[DisturbanceEvent],
    ) -> Result<(TickSnapshot, Vec<EngineEvent>)> {
        let mut events = Vec::new();
        let tick = self.clock.advance();

        self.pool.advance_tick();

        events.extend(self.clock.advance_environment(
            &mut self.store.zones,
            disturbances,
            &self.config,
        ));

        // Scoring sweep; deltas come back sorted by cell id
        let deltas = recompute_indices(&mut self.store.cells, &self.config);
        for delta in &deltas {
            if !self.store.cells[&delta.cell].valid {
                events.push(EngineEvent::CellInvalidated { cell: delta.cell });
            }
        }

        // Aggregation: zones with membership changes get a full recompute,
        // everything else takes the O(1) incremental path
        let dirty = self.store.take_dirty_zones();
        self.store.apply_deltas(&deltas, &dirty);
        self.store.recompute_zones(&dirty);

        let depots = self.pool.depot_positions();
        self.store.update_depot_distances(&depots);

        // Re-rank: single-zone rescores, no global sort
        self.scheduler.retain(|z| self.store.zones.contains_key(&z));
        for id in self.store.sorted_zone_ids() {
            let score = priority_score(&self.store.zones[&id]);
            self.scheduler.upsert(id, score);
        }
        let ranked: Vec<(ZoneId, f64)> = self.scheduler.ranked().collect();

        let mut manifest = plan_assignments(&ranked, &self.store.zones, &self.pool, &self.config);

        self.execute_manifest(&mut manifest, &mut events);

        let compliance = self.build_compliance();
        let rankings = ranked
            .iter()
            .map(|(zone, score)| ZoneRank {
                zone: *zone,
                score: *score,
            })
            .collect();

        let mut cells: Vec<_> = self.store.cells.values().cloned().collect();
        cells.sort_by_key(|c| c.id);
        let mut zones: Vec<_> = self.store.zones.values().cloned().collect();
        zones.sort_by_key(|z| z.id);

        let next = TickSnapshot {
            version: SNAPSHOT_FORMAT_VERSION,
            tick,
            rankings,
            manifest,
            compliance,
            cells,
            zones,
        };
        Ok((next, events))
    }

    /// Drive planned assignments through the asset state machine and apply
    /// deliveries to zones
    fn execute_manifest(&mut self, manifest: &mut [Assignment], events: &mut Vec<EngineEvent>) {
        let mut delivered_by_zone: AHashMap<ZoneId, (f64, u32)> = AHashMap::new();

        for row in manifest.iter_mut() {
            if row.status != AssignmentStatus::Planned {
                continue;
            }
            let Some(asset_id) = row.asset else {
                continue;
            };
            let Some(asset) = self.pool.get_mut(asset_id) else {
                continue;
            };

            let one_way_m = if row.trips > 0 {
                row.distance_m / (2.0 * f64::from(row.trips))
            } else {
                0.0
            };
            let abort_cost = return_cost_j(asset.kind, one_way_m);

            match asset.run_mission(row.energy_j, abort_cost) {
                MissionOutcome::Completed => {
                    row.status = AssignmentStatus::Completed;
                    if let Some(zone) = self.store.zones.get_mut(&row.zone) {
                        zone.delivered_last_tick_l += row.delivered_liters;
                        zone.ticks_since_service = 0;
                        // Service restarts the recovery count
                        zone.recovery_stage = 0;
                    }
                    let entry = delivered_by_zone.entry(row.zone).or_insert((0.0, 0));
                    entry.0 += row.delivered_liters;
                    entry.1 += row.trips;
                }
                MissionOutcome::EmergencyReturn => {
                    // Mission incomplete: the row stays Planned and the
                    // zone's demand carries into the next tick
                    events.push(EngineEvent::AssetAborted {
                        asset: asset_id,
                        zone: row.zone,
                    });
                }
            }
        }

        let mut served: Vec<(ZoneId, (f64, u32))> = delivered_by_zone.into_iter().collect();
        served.sort_by_key(|(z, _)| *z);
        for (zone, (delivered_liters, trips)) in served {
            events.push(EngineEvent::ZoneServiced {
                zone,
                delivered_liters,
                trips,
            });
        }

        for row in manifest.iter() {
            if row.status == AssignmentStatus::Infeasible {
                let unmet = self
                    .store
                    .zones
                    .get(&row.zone)
                    .map(|z| {
                        (z.demand_liters(self.config.liters_per_mm) - z.delivered_last_tick_l)
                            .max(0.0)
                    })
                    .unwrap_or(0.0);
                events.push(EngineEvent::ZoneUnmet {
                    zone: row.zone,
                    unmet_liters: unmet,
                });
            }
        }
    }

    /// Defensible-space compliance over valid cells inside a configured ring
    fn build_compliance(&self) -> Vec<ComplianceRow> {
        let mut cell_ids: Vec<_> = self.store.cells.keys().copied().collect();
        cell_ids.sort();

        let mut report = Vec::new();
        for id in cell_ids {
            let cell = &self.store.cells[&id];
            if !cell.valid {
                continue;
            }
            let Some(required) = required_max_height_cm(
                &self.config.defensible_bands,
                cell.distance_to_structure_m,
            ) else {
                continue;
            };
            report.push(ComplianceRow {
                cell: id,
                distance_to_structure_m: cell.distance_to_structure_m,
                required_max_height_cm: required,
                observed_height_cm: cell.grass_height_cm,
                compliant: cell.grass_height_cm <= required,
            });
        }
        report
    }
}
