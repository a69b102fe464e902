//! Greedy constrained route assignment
//!
//! Once per tick, walks zones in priority order and commits the nearest
//! eligible asset to each, trip by trip, until fleet budgets or outstanding
//! demand run out. Strict greedy-by-priority ordering can starve
//! persistently low-priority zones indefinitely while high-priority zones
//! are continually replenished; that is intended behavior. The configurable
//! minimum-service-interval guard is the escape valve for operators who
//! want fairness.

use ahash::AHashMap;
use geo_types::Point;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::config::EngineConfig;
use crate::core::types::{haversine_m, AssetId, ZoneId};
use crate::dispatch::asset::{AssetKind, AssetPool};
use crate::dispatch::energy::{mission_energy_j, MissionProfile};
use crate::grid::patch::Zone;

/// Liter-equivalent credited per nanobot soil injection
pub const LITERS_PER_INJECTION: f64 = 1.0;

/// Outcome state of one manifest row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentStatus {
    /// Committed to an asset, not yet executed
    Planned,
    /// No asset could serve the (remaining) demand; zone stays in backlog
    Infeasible,
    /// Executed and delivered
    Completed,
}

/// One row of the per-tick assignment manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// `None` when no asset qualified
    pub asset: Option<AssetId>,
    pub zone: ZoneId,
    pub trips: u32,
    /// Total distance traveled across all trips (m)
    pub distance_m: f64,
    /// Total battery cost across all trips (J)
    pub energy_j: f64,
    pub delivered_liters: f64,
    pub status: AssignmentStatus,
}

/// Trips needed to move `volume_l` in `capacity_l` loads (ceiling division)
pub fn required_trips(volume_l: f64, capacity_l: f64) -> u32 {
    debug_assert!(capacity_l > 0.0);
    if volume_l <= 0.0 {
        return 0;
    }
    (volume_l / capacity_l).ceil() as u32
}

/// Remaining per-tick budget of one asset during planning
#[derive(Debug, Clone)]
struct AssetBudget {
    id: AssetId,
    kind: AssetKind,
    capacity: f64,
    position: Point<f64>,
    energy_j: f64,
    trips_left: u32,
}

impl AssetBudget {
    fn trip_volume_l(&self) -> f64 {
        match self.kind {
            AssetKind::Nanobot => self.capacity * LITERS_PER_INJECTION,
            _ => self.capacity,
        }
    }

    fn injections_per_trip(&self) -> u32 {
        match self.kind {
            AssetKind::Nanobot => self.capacity.round().max(1.0) as u32,
            _ => 0,
        }
    }

    /// Battery cost of one out-and-back trip to a zone
    fn trip_cost_j(&self, round_trip_m: f64, cruise_mps: f64) -> f64 {
        let profile = match self.kind {
            AssetKind::Drone => MissionProfile::new(round_trip_m)
                .with_airborne_minutes(round_trip_m / (cruise_mps * 60.0)),
            AssetKind::Nanobot => {
                MissionProfile::new(round_trip_m).with_injections(self.injections_per_trip())
            }
            AssetKind::Truck => MissionProfile::new(round_trip_m),
        };
        mission_energy_j(self.kind, &profile)
    }

    fn can_fund_trip(&self, trip_cost_j: f64) -> bool {
        !self.kind.battery_limited() || trip_cost_j <= self.energy_j
    }
}

/// Plan the tick's assignment manifest
///
/// Pure over its inputs: only idle assets are budgeted, budgets are local
/// copies, and nothing here mutates the store. Replanning against an
/// unchanged snapshot yields an identical manifest.
pub fn plan_assignments(
    ranked: &[(ZoneId, f64)],
    zones: &AHashMap<ZoneId, Zone>,
    pool: &AssetPool,
    config: &EngineConfig,
) -> Vec<Assignment> {
    let mut budgets: Vec<AssetBudget> = pool
        .sorted_asset_ids()
        .into_iter()
        .filter_map(|id| pool.get(id))
        .filter(|a| a.is_available())
        .map(|a| AssetBudget {
            id: a.id,
            kind: a.kind,
            capacity: a.capacity,
            position: a.position,
            energy_j: a.energy_j,
            trips_left: config.max_trips_per_tick,
        })
        .collect();

    // Fairness guard: overdue zones jump the queue, keeping rank order
    // among themselves
    let order: Vec<(ZoneId, f64)> = match config.min_service_interval {
        Some(interval) => {
            let overdue = |id: &ZoneId| {
                zones
                    .get(id)
                    .map(|z| z.ticks_since_service >= interval)
                    .unwrap_or(false)
            };
            let mut promoted: Vec<(ZoneId, f64)> =
                ranked.iter().filter(|(z, _)| overdue(z)).copied().collect();
            promoted.extend(ranked.iter().filter(|(z, _)| !overdue(z)).copied());
            promoted
        }
        None => ranked.to_vec(),
    };

    let mut manifest = Vec::new();

    for (zone_id, _score) in order {
        let Some(zone) = zones.get(&zone_id) else {
            continue;
        };
        let mut demand_l = zone.demand_liters(config.liters_per_mm);
        if demand_l <= f64::EPSILON {
            continue;
        }

        while demand_l > f64::EPSILON {
            // Nearest asset that can fund at least one trip
            let candidate = budgets
                .iter()
                .enumerate()
                .filter(|(_, b)| b.trips_left > 0)
                .filter_map(|(i, b)| {
                    let one_way_m = haversine_m(b.position, zone.centroid);
                    let trip_cost = b.trip_cost_j(2.0 * one_way_m, config.drone_cruise_mps);
                    b.can_fund_trip(trip_cost)
                        .then_some((i, b.id, one_way_m, trip_cost))
                })
                .min_by_key(|(_, id, one_way_m, _)| (OrderedFloat(*one_way_m), *id));

            let Some((idx, _id, one_way_m, trip_cost)) = candidate else {
                manifest.push(Assignment {
                    asset: None,
                    zone: zone_id,
                    trips: 0,
                    distance_m: 0.0,
                    energy_j: 0.0,
                    delivered_liters: 0.0,
                    status: AssignmentStatus::Infeasible,
                });
                break;
            };

            let budget = &mut budgets[idx];
            let trips_needed = required_trips(demand_l, budget.trip_volume_l());
            let trips_by_energy = if budget.kind.battery_limited() {
                (budget.energy_j / trip_cost).floor() as u32
            } else {
                u32::MAX
            };
            let trips = trips_needed.min(trips_by_energy).min(budget.trips_left);
            debug_assert!(trips > 0);

            let delivered = demand_l.min(f64::from(trips) * budget.trip_volume_l());
            let energy = f64::from(trips) * trip_cost;

            if budget.kind.battery_limited() {
                budget.energy_j -= energy;
            }
            budget.trips_left -= trips;
            demand_l -= delivered;

            manifest.push(Assignment {
                asset: Some(budget.id),
                zone: zone_id,
                trips,
                distance_m: f64::from(trips) * 2.0 * one_way_m,
                energy_j: energy,
                delivered_liters: delivered,
                status: AssignmentStatus::Planned,
            });
        }
    }

    manifest
}
