//! Delivery assets and their mission state machine
//!
//! Trucks, drones, and nanobot carriers share one lifecycle:
//! Idle -> EnRoute -> Servicing -> Returning -> Recharging -> Idle.
//! Any active mission state short-circuits to EmergencyReturn when the
//! projected remaining energy no longer covers the trip home; from
//! EmergencyReturn the only exit is Recharging, never Servicing.

use ahash::AHashMap;
use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::core::types::AssetId;

/// Asset platform type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Truck,
    Drone,
    Nanobot,
}

impl AssetKind {
    /// Trucks refuel at the depot; only airborne and injected platforms
    /// carry a battery budget
    pub fn battery_limited(self) -> bool {
        !matches!(self, Self::Truck)
    }

    /// Nominal battery capacity in joules
    pub fn default_battery_j(self) -> f64 {
        match self {
            Self::Truck => 0.0,
            Self::Drone => 1_800_000.0, // 500 Wh
            Self::Nanobot => 5_000.0,
        }
    }

    /// Ticks spent in Recharging before returning to Idle
    pub fn default_recharge_ticks(self) -> u32 {
        match self {
            Self::Truck => 0,
            Self::Drone => 4,
            Self::Nanobot => 4,
        }
    }
}

/// Lifecycle state of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetStatus {
    Idle,
    EnRoute,
    Servicing,
    Returning,
    EmergencyReturn,
    Recharging,
}

impl AssetStatus {
    pub fn can_transition_to(self, next: Self) -> bool {
        use AssetStatus::*;
        matches!(
            (self, next),
            (Idle, EnRoute)
                | (EnRoute, Servicing)
                | (Servicing, Returning)
                | (Returning, Recharging)
                | (EnRoute, EmergencyReturn)
                | (Servicing, EmergencyReturn)
                | (Returning, EmergencyReturn)
                | (EmergencyReturn, Recharging)
                | (Recharging, Idle)
        )
    }
}

/// How a dispatched mission ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionOutcome {
    Completed,
    /// Mission aborted; the zone stays in backlog for a later tick
    EmergencyReturn,
}

/// A mobile delivery asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub kind: AssetKind,
    /// Liters per trip (trucks, drones) or injections per trip (nanobots)
    pub capacity: f64,
    /// Home depot, WGS-84 (x = lon, y = lat)
    pub position: Point<f64>,
    /// Remaining battery (joules); unused for trucks
    pub energy_j: f64,
    pub battery_capacity_j: f64,
    pub recharge_interval_ticks: u32,
    pub status: AssetStatus,
    pub ticks_in_state: u32,
}

impl Asset {
    pub fn new(id: AssetId, kind: AssetKind, capacity: f64, position: Point<f64>) -> Self {
        Self {
            id,
            kind,
            capacity,
            position,
            energy_j: kind.default_battery_j(),
            battery_capacity_j: kind.default_battery_j(),
            recharge_interval_ticks: kind.default_recharge_ticks(),
            status: AssetStatus::Idle,
            ticks_in_state: 0,
        }
    }

    pub fn with_battery(mut self, capacity_j: f64) -> Self {
        self.battery_capacity_j = capacity_j;
        self.energy_j = capacity_j;
        self
    }

    pub fn with_recharge_interval(mut self, ticks: u32) -> Self {
        self.recharge_interval_ticks = ticks;
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == AssetStatus::Idle
    }

    fn step(&mut self, next: AssetStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.status,
            next
        );
        self.status = next;
        self.ticks_in_state = 0;
    }

    /// Execute a planned mission against the asset's live energy state
    ///
    /// `mission_cost_j` covers all trips including return legs;
    /// `return_cost_j` is the worst-case cost of aborting home. The outbound
    /// checkpoint re-validates against live energy: planning used snapshot
    /// values, and anything that drained the battery since (degradation,
    /// thermal derating) forces an emergency return before service begins.
    pub fn run_mission(&mut self, mission_cost_j: f64, return_cost_j: f64) -> MissionOutcome {
        debug_assert!(self.is_available(), "mission dispatched to busy asset");
        self.step(AssetStatus::EnRoute);

        if self.kind.battery_limited() && self.energy_j < mission_cost_j {
            self.energy_j = (self.energy_j - return_cost_j).max(0.0);
            self.step(AssetStatus::EmergencyReturn);
            return MissionOutcome::EmergencyReturn;
        }

        self.step(AssetStatus::Servicing);
        self.step(AssetStatus::Returning);
        if self.kind.battery_limited() {
            self.energy_j -= mission_cost_j;
        }
        self.step(AssetStatus::Recharging);
        MissionOutcome::Completed
    }

    /// Advance the lifecycle by one tick outside of missions
    pub fn advance_tick(&mut self) {
        match self.status {
            AssetStatus::EmergencyReturn => self.step(AssetStatus::Recharging),
            AssetStatus::Recharging => {
                self.ticks_in_state += 1;
                if self.ticks_in_state >= self.recharge_interval_ticks {
                    self.energy_j = self.battery_capacity_j;
                    self.step(AssetStatus::Idle);
                }
            }
            _ => {}
        }
    }
}

/// Registry of all assets in a simulation instance
#[derive(Debug, Clone, Default)]
pub struct AssetPool {
    pub assets: AHashMap<AssetId, Asset>,
}

impl AssetPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset, excluding invalid configurations
    ///
    /// Capacity must be positive; a violation drops the asset with a warning
    /// and the engine continues with the remaining fleet.
    pub fn register(&mut self, asset: Asset) -> bool {
        if asset.capacity <= 0.0 {
            tracing::warn!(
                "asset {:?} has non-positive capacity {}, excluded from dispatch",
                asset.id,
                asset.capacity
            );
            return false;
        }
        self.assets.insert(asset.id, asset);
        true
    }

    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(&id)
    }

    pub fn get_mut(&mut self, id: AssetId) -> Option<&mut Asset> {
        self.assets.get_mut(&id)
    }

    /// Asset ids in ascending order, for deterministic iteration
    pub fn sorted_asset_ids(&self) -> Vec<AssetId> {
        let mut ids: Vec<AssetId> = self.assets.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Unique depot positions of the registered fleet
    pub fn depot_positions(&self) -> Vec<Point<f64>> {
        let mut depots: Vec<Point<f64>> = Vec::new();
        for id in self.sorted_asset_ids() {
            let p = self.assets[&id].position;
            if !depots.iter().any(|d| *d == p) {
                depots.push(p);
            }
        }
        depots
    }

    /// Advance recharge countdowns and emergency-return handoffs
    pub fn advance_tick(&mut self) {
        for asset in self.assets.values_mut() {
            asset.advance_tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drone(id: u32) -> Asset {
        Asset::new(AssetId(id), AssetKind::Drone, 400.0, Point::new(-112.0, 33.4))
    }

    #[test]
    fn test_mission_walks_full_lifecycle() {
        let mut asset = drone(1);
        let outcome = asset.run_mission(10_000.0, 2_000.0);
        assert_eq!(outcome, MissionOutcome::Completed);
        assert_eq!(asset.status, AssetStatus::Recharging);
        assert!((asset.energy_j - (1_800_000.0 - 10_000.0)).abs() < 1e-6);
    }

    #[test]
    fn test_recharge_restores_battery() {
        let mut asset = drone(1).with_recharge_interval(2);
        asset.run_mission(10_000.0, 2_000.0);
        for _ in 0..2 {
            asset.advance_tick();
        }
        assert_eq!(asset.status, AssetStatus::Idle);
        assert_eq!(asset.energy_j, asset.battery_capacity_j);
    }

    #[test]
    fn test_emergency_return_never_services() {
        let mut asset = drone(1);
        // Battery drained after planning, before launch
        asset.energy_j = 500.0;
        let outcome = asset.run_mission(10_000.0, 400.0);
        assert_eq!(outcome, MissionOutcome::EmergencyReturn);
        assert_eq!(asset.status, AssetStatus::EmergencyReturn);

        // The only exit from EmergencyReturn is Recharging
        asset.advance_tick();
        assert_eq!(asset.status, AssetStatus::Recharging);
    }

    #[test]
    fn test_truck_ignores_battery() {
        let mut truck = Asset::new(AssetId(1), AssetKind::Truck, 5000.0, Point::new(0.0, 0.0));
        let outcome = truck.run_mission(0.0, 0.0);
        assert_eq!(outcome, MissionOutcome::Completed);
        // Instant depot turnaround: available again after one advance
        truck.advance_tick();
        assert_eq!(truck.status, AssetStatus::Idle);
    }

    #[test]
    fn test_pool_excludes_zero_capacity() {
        let mut pool = AssetPool::new();
        let bad = Asset::new(AssetId(1), AssetKind::Truck, 0.0, Point::new(0.0, 0.0));
        assert!(!pool.register(bad));
        assert!(pool.assets.is_empty());
    }

    #[test]
    fn test_transition_table() {
        use AssetStatus::*;
        assert!(Idle.can_transition_to(EnRoute));
        assert!(EmergencyReturn.can_transition_to(Recharging));
        assert!(!EmergencyReturn.can_transition_to(Servicing));
        assert!(!Recharging.can_transition_to(EnRoute));
    }
}
