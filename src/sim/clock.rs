//! Simulation clock and environment advance
//!
//! Advances discrete ticks (one hour by default) and applies the
//! time-driven state changes: deficit accrual, delivery absorption from the
//! prior tick, recovery progression, and disturbance resets. The clock is
//! RNG-free and mutates zones in ascending id order, which keeps replays
//! bit-identical.

use ahash::{AHashMap, AHashSet};

use crate::core::config::EngineConfig;
use crate::core::types::{Tick, ZoneId};
use crate::grid::patch::Zone;
use crate::sim::events::{DisturbanceEvent, EngineEvent};

/// Discrete time source for one engine instance
#[derive(Debug, Clone, Default)]
pub struct SimulationClock {
    pub tick: Tick,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self { tick: 0 }
    }

    /// Advance to the next tick
    pub fn advance(&mut self) -> Tick {
        self.tick += 1;
        self.tick
    }

    /// Apply time-driven zone mutations for the current tick
    ///
    /// Zones serviced in the prior tick absorb their deliveries (deficit
    /// drops proportional to delivered volume) instead of accruing; all
    /// others accrue the configured rate. Undisturbed zones advance their
    /// recovery count; disturbed zones reset to zero.
    pub fn advance_environment(
        &self,
        zones: &mut AHashMap<ZoneId, Zone>,
        disturbances: &[DisturbanceEvent],
        config: &EngineConfig,
    ) -> Vec<EngineEvent> {
        let mut events = Vec::new();

        let disturbed: AHashSet<ZoneId> = disturbances.iter().map(|d| d.zone).collect();
        for d in disturbances {
            if !zones.contains_key(&d.zone) {
                tracing::warn!("disturbance for unknown zone {:?}, dropped", d.zone);
            }
        }

        let mut ids: Vec<ZoneId> = zones.keys().copied().collect();
        ids.sort();

        for id in ids {
            let zone = zones.get_mut(&id).expect("id from keys");

            if zone.delivered_last_tick_l > 0.0 {
                let reduction_mm = zone.delivered_last_tick_l / config.liters_per_mm;
                zone.deficit_mm = (zone.deficit_mm - reduction_mm).max(0.0);
                zone.delivered_last_tick_l = 0.0;
            } else {
                zone.deficit_mm += config.deficit_accrual_mm;
            }

            if disturbed.contains(&id) {
                zone.recovery_stage = 0;
                let kind = disturbances
                    .iter()
                    .find(|d| d.zone == id)
                    .map(|d| d.kind)
                    .expect("zone is in disturbed set");
                events.push(EngineEvent::DisturbanceApplied { zone: id, kind });
            } else {
                zone.recovery_stage += 1;
            }

            zone.ticks_since_service = zone.ticks_since_service.saturating_add(1);
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::events::DisturbanceKind;

    fn zone(id: u32) -> Zone {
        Zone::new(ZoneId(id), format!("z{id}"))
    }

    fn zones_of(list: Vec<Zone>) -> AHashMap<ZoneId, Zone> {
        list.into_iter().map(|z| (z.id, z)).collect()
    }

    #[test]
    fn test_unserviced_zone_accrues_deficit() {
        let config = EngineConfig::default();
        let clock = SimulationClock::new();
        let mut zones = zones_of(vec![zone(1)]);

        clock.advance_environment(&mut zones, &[], &config);
        assert!((zones[&ZoneId(1)].deficit_mm - config.deficit_accrual_mm).abs() < 1e-12);
    }

    #[test]
    fn test_delivery_absorbs_instead_of_accruing() {
        let config = EngineConfig::default();
        let clock = SimulationClock::new();
        let mut z = zone(1);
        z.deficit_mm = 50.0;
        z.delivered_last_tick_l = 300.0; // 30 mm at 10 L/mm
        let mut zones = zones_of(vec![z]);

        clock.advance_environment(&mut zones, &[], &config);
        let after = &zones[&ZoneId(1)];
        assert!((after.deficit_mm - 20.0).abs() < 1e-12);
        assert_eq!(after.delivered_last_tick_l, 0.0);
    }

    #[test]
    fn test_delivery_never_drives_deficit_negative() {
        let config = EngineConfig::default();
        let clock = SimulationClock::new();
        let mut z = zone(1);
        z.deficit_mm = 10.0;
        z.delivered_last_tick_l = 500.0;
        let mut zones = zones_of(vec![z]);

        clock.advance_environment(&mut zones, &[], &config);
        assert_eq!(zones[&ZoneId(1)].deficit_mm, 0.0);
    }

    #[test]
    fn test_recovery_monotonic_until_disturbance() {
        let config = EngineConfig::default();
        let clock = SimulationClock::new();
        let mut zones = zones_of(vec![zone(1)]);

        for _ in 0..5 {
            clock.advance_environment(&mut zones, &[], &config);
        }
        assert_eq!(zones[&ZoneId(1)].recovery_stage, 5);

        let fire = DisturbanceEvent {
            zone: ZoneId(1),
            kind: DisturbanceKind::Fire,
            tick: 5,
        };
        let events = clock.advance_environment(&mut zones, &[fire], &config);
        assert_eq!(zones[&ZoneId(1)].recovery_stage, 0);
        assert!(matches!(
            events[0],
            EngineEvent::DisturbanceApplied {
                kind: DisturbanceKind::Fire,
                ..
            }
        ));
    }
}
