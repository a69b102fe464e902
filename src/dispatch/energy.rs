//! Mission energy model
//!
//! Per-platform energy cost for a delivery mission and the feasibility
//! check against an asset's remaining battery. A mission whose cost exceeds
//! what the battery holds before the next recharge window is infeasible and
//! never attempted; the zone simply stays in backlog.

use serde::{Deserialize, Serialize};

use crate::dispatch::asset::{Asset, AssetKind};

/// Drone propulsion cost per meter of flight path (J/m)
pub const DRONE_J_PER_M: f64 = 0.5;

/// Fixed drone launch/landing overhead per mission (J)
pub const DRONE_MISSION_BASELINE_J: f64 = 1000.0;

/// Drone hover/avionics cost per airborne minute (J/min)
pub const DRONE_J_PER_AIRBORNE_MIN: f64 = 500.0;

/// Nanobot locomotion cost per meter (J/m)
pub const NANOBOT_J_PER_M: f64 = 0.1;

/// Nanobot cost per soil injection (J)
pub const NANOBOT_J_PER_INJECTION: f64 = 50.0;

/// Energy profile of one planned mission
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissionProfile {
    /// Total path length including return legs (m)
    pub distance_m: f64,
    /// Time aloft (drones only)
    pub airborne_minutes: f64,
    /// Soil injections performed (nanobots only)
    pub injection_count: u32,
}

impl MissionProfile {
    pub fn new(distance_m: f64) -> Self {
        Self {
            distance_m,
            airborne_minutes: 0.0,
            injection_count: 0,
        }
    }

    pub fn with_airborne_minutes(mut self, minutes: f64) -> Self {
        self.airborne_minutes = minutes;
        self
    }

    pub fn with_injections(mut self, count: u32) -> Self {
        self.injection_count = count;
        self
    }
}

/// Total energy cost of a mission for the given platform (J)
///
/// Trucks are depot-fueled and report zero battery cost; their dispatch is
/// bounded by the per-tick trip budget instead.
pub fn mission_energy_j(kind: AssetKind, profile: &MissionProfile) -> f64 {
    match kind {
        AssetKind::Truck => 0.0,
        AssetKind::Drone => {
            DRONE_J_PER_M * profile.distance_m
                + DRONE_MISSION_BASELINE_J
                + DRONE_J_PER_AIRBORNE_MIN * profile.airborne_minutes
        }
        AssetKind::Nanobot => {
            NANOBOT_J_PER_M * profile.distance_m
                + NANOBOT_J_PER_INJECTION * f64::from(profile.injection_count)
        }
    }
}

/// Worst-case cost of aborting a mission and returning to base (J)
pub fn return_cost_j(kind: AssetKind, one_way_distance_m: f64) -> f64 {
    match kind {
        AssetKind::Truck => 0.0,
        AssetKind::Drone => DRONE_J_PER_M * one_way_distance_m,
        AssetKind::Nanobot => NANOBOT_J_PER_M * one_way_distance_m,
    }
}

/// Can this asset fund the mission from its remaining battery?
pub fn is_feasible(asset: &Asset, mission_cost_j: f64) -> bool {
    if !asset.kind.battery_limited() {
        return true;
    }
    mission_cost_j <= asset.energy_j
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AssetId;
    use geo_types::Point;

    #[test]
    fn test_drone_mission_energy() {
        // 2000 m with 5 airborne minutes: 0.5*2000 + 1000 + 500*5 = 4500 J
        let profile = MissionProfile::new(2000.0).with_airborne_minutes(5.0);
        let cost = mission_energy_j(AssetKind::Drone, &profile);
        assert!((cost - 4500.0).abs() < 1e-9);
    }

    #[test]
    fn test_nanobot_mission_energy() {
        // 100 m with 2 injections: 0.1*100 + 50*2 = 110 J
        let profile = MissionProfile::new(100.0).with_injections(2);
        let cost = mission_energy_j(AssetKind::Nanobot, &profile);
        assert!((cost - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_truck_costs_nothing() {
        let profile = MissionProfile::new(50_000.0);
        assert_eq!(mission_energy_j(AssetKind::Truck, &profile), 0.0);
    }

    #[test]
    fn test_feasibility_against_battery() {
        let mut drone = Asset::new(AssetId(1), AssetKind::Drone, 400.0, Point::new(0.0, 0.0));
        drone.energy_j = 4000.0;
        assert!(is_feasible(&drone, 3999.0));
        assert!(is_feasible(&drone, 4000.0));
        assert!(!is_feasible(&drone, 4001.0));
    }

    #[test]
    fn test_truck_always_feasible() {
        let truck = Asset::new(AssetId(1), AssetKind::Truck, 5000.0, Point::new(0.0, 0.0));
        assert!(is_feasible(&truck, f64::MAX));
    }
}
