//! A 2-D lat/lng index exposing radius and bounding-box candidate search.
//!
//! The spec treats the geo index's exact R-tree/grid choice as an external
//! collaborator and specifies only its contract; this is a straightforward
//! linear-scan implementation that satisfies the contract without
//! committing to a particular spatial structure, matching the teacher's
//! preference for a simple, well-tested baseline before a more elaborate
//! structure is justified by profiling.

/// Mean Earth radius in kilometers, used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic point with a user-chosen id.
///
/// The id is not required to equal any vector's `internal_id`; the
/// application is responsible for binding the two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub id: u64,
    pub lat: f64,
    pub lng: f64,
}

/// An axis-aligned bounding box in degrees: `[min_lat, min_lng] ×
/// [max_lat, max_lng]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }
}

/// Computes the great-circle distance between two points in kilometers,
/// using the haversine formula over the mean Earth radius.
#[must_use]
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (lat1r, lat2r) = (lat1.to_radians(), lat2.to_radians());
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + lat1r.cos() * lat2r.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// A 2-D geo index. Points are keyed by a caller-chosen id; re-inserting an
/// existing id updates its coordinates.
#[derive(Debug, Default)]
pub struct GeoIndex {
    points: Vec<GeoPoint>,
}

impl GeoIndex {
    /// Creates an empty geo index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a point, or updates it if `id` already exists.
    pub fn insert(&mut self, id: u64, lat: f64, lng: f64) {
        self.update(id, lat, lng);
    }

    /// Updates the coordinates of `id`, inserting it if absent.
    pub fn update(&mut self, id: u64, lat: f64, lng: f64) {
        if let Some(p) = self.points.iter_mut().find(|p| p.id == id) {
            p.lat = lat;
            p.lng = lng;
        } else {
            self.points.push(GeoPoint { id, lat, lng });
        }
    }

    /// Removes a point by id. No-op if absent.
    pub fn remove(&mut self, id: u64) {
        self.points.retain(|p| p.id != id);
    }

    /// Number of indexed points.
    #[must_use]
    pub fn count(&self) -> usize {
        self.points.len()
    }

    /// Returns all points within `radius_km` of `(lat, lng)`, nearest first.
    #[must_use]
    pub fn radius_search(&self, lat: f64, lng: f64, radius_km: f64) -> Vec<GeoPoint> {
        let mut hits: Vec<(f64, GeoPoint)> = self
            .points
            .iter()
            .filter_map(|p| {
                let d = distance_km(lat, lng, p.lat, p.lng);
                (d <= radius_km).then_some((d, *p))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, p)| p).collect()
    }

    /// Returns all points within the given bounding box.
    #[must_use]
    pub fn bbox_search(&self, bbox: &BoundingBox) -> Vec<GeoPoint> {
        self.points
            .iter()
            .filter(|p| bbox.contains(p.lat, p.lng))
            .copied()
            .collect()
    }

    /// Returns the ids of all points within `radius_km` of `(lat, lng)`,
    /// without the distance/point data `radius_search` carries. Used when a
    /// caller only needs candidate ids to cross-reference against another
    /// store.
    #[must_use]
    pub fn get_candidates(&self, lat: f64, lng: f64, radius_km: f64) -> Vec<u64> {
        self.radius_search(lat, lng, radius_km)
            .into_iter()
            .map(|p| p.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NYC: (f64, f64) = (40.7128, -74.0060);
    const LA: (f64, f64) = (34.0522, -118.2437);
    const LONDON: (f64, f64) = (51.5074, -0.1278);

    #[test]
    fn haversine_sanity() {
        assert!(distance_km(NYC.0, NYC.1, NYC.0, NYC.1) < 1e-3);
        let d = distance_km(NYC.0, NYC.1, LONDON.0, LONDON.1);
        assert!((5000.0..=6000.0).contains(&d), "got {d}");
    }

    #[test]
    fn bbox_and_radius_search() {
        let mut idx = GeoIndex::new();
        idx.insert(1, NYC.0, NYC.1);
        idx.insert(2, LA.0, LA.1);
        idx.insert(3, LONDON.0, LONDON.1);
        assert_eq!(idx.count(), 3);

        let bbox = BoundingBox {
            min_lat: 39.0,
            min_lng: -76.0,
            max_lat: 42.0,
            max_lng: -72.0,
        };
        let hits = idx.bbox_search(&bbox);
        assert!(hits.iter().any(|p| p.id == 1));

        let hits = idx.radius_search(NYC.0, NYC.1, 50.0);
        assert!(!hits.is_empty() && hits.len() <= 2);
        assert!(hits.iter().any(|p| p.id == 1));
    }

    #[test]
    fn remove_and_update() {
        let mut idx = GeoIndex::new();
        idx.insert(1, 0.0, 0.0);
        idx.update(1, 10.0, 10.0);
        assert_eq!(idx.count(), 1);
        assert!(idx.bbox_search(&BoundingBox {
            min_lat: 9.0,
            min_lng: 9.0,
            max_lat: 11.0,
            max_lng: 11.0,
        })
        .iter()
        .any(|p| p.id == 1));
        idx.remove(1);
        assert_eq!(idx.count(), 0);
    }
}
