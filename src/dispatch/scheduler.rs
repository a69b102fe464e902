//! Zone priority scheduling
//!
//! Maintains a total order over zones by descending priority score with
//! deterministic tie-breaking by ascending zone id. Rescoring one zone is a
//! remove/insert pair on an ordered set, so a single-zone change never
//! forces a re-rank of the rest.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use ahash::AHashMap;
use ordered_float::OrderedFloat;

use crate::core::types::ZoneId;
use crate::grid::patch::Zone;

/// Dispatch priority of a zone
///
/// Water deficit and wildlife pressure push a zone up; an advanced recovery
/// stage and depot distance pull it down.
pub fn priority_score(zone: &Zone) -> f64 {
    zone.deficit_mm / 100.0 + f64::from(zone.wildlife_count) / 100.0
        - f64::from(zone.recovery_stage) * 2.0
        - zone.distance_km / 10.0
}

/// Ordering key: highest score first, ties by ascending zone id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RankKey {
    score: OrderedFloat<f64>,
    zone: ZoneId,
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.zone.cmp(&other.zone))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority order over all live zones
#[derive(Debug, Clone, Default)]
pub struct PriorityScheduler {
    scores: AHashMap<ZoneId, f64>,
    order: BTreeSet<RankKey>,
}

impl PriorityScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or rescore a single zone in O(log n)
    pub fn upsert(&mut self, zone: ZoneId, score: f64) {
        if let Some(old) = self.scores.insert(zone, score) {
            if old == score {
                return;
            }
            self.order.remove(&RankKey {
                score: OrderedFloat(old),
                zone,
            });
        }
        self.order.insert(RankKey {
            score: OrderedFloat(score),
            zone,
        });
    }

    /// Drop a zone from the ranking
    pub fn remove(&mut self, zone: ZoneId) {
        if let Some(old) = self.scores.remove(&zone) {
            self.order.remove(&RankKey {
                score: OrderedFloat(old),
                zone,
            });
        }
    }

    /// Drop zones that no longer exist without disturbing the rest
    pub fn retain(&mut self, keep: impl Fn(ZoneId) -> bool) {
        let stale: Vec<ZoneId> = self
            .scores
            .keys()
            .copied()
            .filter(|z| !keep(*z))
            .collect();
        for zone in stale {
            self.remove(zone);
        }
    }

    pub fn score_of(&self, zone: ZoneId) -> Option<f64> {
        self.scores.get(&zone).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Zones in dispatch order: descending score, ties by ascending id
    pub fn ranked(&self) -> impl Iterator<Item = (ZoneId, f64)> + '_ {
        self.order.iter().map(|k| (k.zone, k.score.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone_with(deficit: f64, wildlife: u32, stage: u32, distance_km: f64) -> Zone {
        let mut z = Zone::new(ZoneId(1), "test".into());
        z.deficit_mm = deficit;
        z.wildlife_count = wildlife;
        z.recovery_stage = stage;
        z.distance_km = distance_km;
        z
    }

    #[test]
    fn test_priority_formula() {
        // 150/100 + 100/100 - 0.0 - 29/10
        let z = zone_with(150.0, 100, 0, 29.0);
        let score = priority_score(&z);
        assert!((score - (1.5 + 1.0 - 2.9)).abs() < 1e-12);
    }

    #[test]
    fn test_recovery_stage_suppresses_priority() {
        let fresh = zone_with(100.0, 50, 0, 5.0);
        let recovering = zone_with(100.0, 50, 3, 5.0);
        assert!(priority_score(&fresh) > priority_score(&recovering));
    }

    #[test]
    fn test_ranking_descends() {
        let mut sched = PriorityScheduler::new();
        sched.upsert(ZoneId(1), 5.0);
        sched.upsert(ZoneId(2), 10.0);
        sched.upsert(ZoneId(3), 7.5);

        let order: Vec<ZoneId> = sched.ranked().map(|(z, _)| z).collect();
        assert_eq!(order, vec![ZoneId(2), ZoneId(3), ZoneId(1)]);
    }

    #[test]
    fn test_ties_break_by_ascending_id() {
        let mut sched = PriorityScheduler::new();
        sched.upsert(ZoneId(7), 3.0);
        sched.upsert(ZoneId(2), 3.0);
        sched.upsert(ZoneId(5), 3.0);

        let order: Vec<ZoneId> = sched.ranked().map(|(z, _)| z).collect();
        assert_eq!(order, vec![ZoneId(2), ZoneId(5), ZoneId(7)]);
    }

    #[test]
    fn test_rescore_moves_one_zone() {
        let mut sched = PriorityScheduler::new();
        sched.upsert(ZoneId(1), 5.0);
        sched.upsert(ZoneId(2), 10.0);

        sched.upsert(ZoneId(1), 20.0);
        let order: Vec<ZoneId> = sched.ranked().map(|(z, _)| z).collect();
        assert_eq!(order, vec![ZoneId(1), ZoneId(2)]);
        assert_eq!(sched.len(), 2);
    }

    #[test]
    fn test_remove_zone() {
        let mut sched = PriorityScheduler::new();
        sched.upsert(ZoneId(1), 5.0);
        sched.upsert(ZoneId(2), 10.0);
        sched.remove(ZoneId(2));

        let order: Vec<ZoneId> = sched.ranked().map(|(z, _)| z).collect();
        assert_eq!(order, vec![ZoneId(1)]);
        assert!(sched.score_of(ZoneId(2)).is_none());
    }
}
