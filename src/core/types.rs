//! Core type definitions used throughout the engine

use geo::{Centroid, HaversineDistance};
use geo_types::{MultiPoint, Point};
use serde::{Deserialize, Serialize};

/// Simulation tick counter (one tick = one configured time step)
pub type Tick = u64;

/// Unique identifier for a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u32);

/// Unique identifier for a zone (dispatch unit of one or more cells)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

/// Unique identifier for a delivery asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u32);

impl CellId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl ZoneId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl AssetId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Row/column address of a cell within its grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    pub row: u32,
    pub col: u32,
}

impl GridCoord {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Haversine distance in meters between two WGS-84 points (x = lon, y = lat)
pub fn haversine_m(a: Point<f64>, b: Point<f64>) -> f64 {
    a.haversine_distance(&b)
}

/// Centroid of a set of points; `None` when the set is empty
pub fn centroid_of(points: &[Point<f64>]) -> Option<Point<f64>> {
    if points.is_empty() {
        return None;
    }
    MultiPoint::from(points.to_vec()).centroid()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_phoenix_tempe() {
        // Phoenix to Tempe is roughly 13 km
        let phoenix = Point::new(-112.0742, 33.4484);
        let tempe = Point::new(-111.9400, 33.4255);
        let dist = haversine_m(phoenix, tempe);
        assert!(dist > 10_000.0 && dist < 16_000.0);
    }

    #[test]
    fn test_centroid_of_square() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        let c = centroid_of(&points).unwrap();
        assert!((c.x() - 0.5).abs() < 1e-9);
        assert!((c.y() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_empty() {
        assert!(centroid_of(&[]).is_none());
    }
}
