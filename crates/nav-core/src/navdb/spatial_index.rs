//! Flat spatial index over waypoint positions.
//!
//! Entries are kept unsorted; radius queries scan linearly, rejecting
//! candidates whose latitude difference alone exceeds the radius before
//! paying for the haversine.

use crate::spatial::haversine_distance_nm;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SpatialEntry {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SpatialIndex {
    entries: Vec<SpatialEntry>,
}

impl SpatialIndex {
    pub fn build<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64, f64)>,
    {
        let entries = points
            .into_iter()
            .map(|(name, lat, lon)| SpatialEntry {
                lat,
                lon,
                name: name.to_string(),
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[SpatialEntry] {
        &self.entries
    }

    /// Names within `radius_nm` of the point, nearest first (ties by name).
    pub fn within(&self, lat: f64, lon: f64, radius_nm: f64) -> Vec<(String, f64)> {
        // one degree of latitude is ~60 NM; pad slightly for the sphere radius
        let lat_window = radius_nm / 60.0 + 1e-6;
        let mut hits: Vec<(String, f64)> = self
            .entries
            .iter()
            .filter(|entry| (entry.lat - lat).abs() <= lat_window)
            .filter_map(|entry| {
                let distance = haversine_distance_nm(lat, lon, entry.lat, entry.lon);
                (distance <= radius_nm).then(|| (entry.name.clone(), distance))
            })
            .collect();
        hits.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        hits
    }

    /// Closest entry to a point, if any.
    pub fn nearest(&self, lat: f64, lon: f64) -> Option<(String, f64)> {
        self.entries
            .iter()
            .map(|entry| {
                (
                    entry,
                    haversine_distance_nm(lat, lon, entry.lat, entry.lon),
                )
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.name.cmp(&b.0.name)))
            .map(|(entry, distance)| (entry.name.clone(), distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SpatialIndex {
        SpatialIndex::build([
            ("A", 40.0, -74.0),
            ("B", 40.5, -74.0),
            ("C", 41.0, -74.0),
            ("D", 45.0, -74.0),
        ])
    }

    #[test]
    fn within_sorts_by_distance_and_respects_radius() {
        let hits = index().within(40.0, -74.0, 61.0);
        let names: Vec<&str> = hits.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert!(hits.iter().all(|(_, d)| *d <= 61.0));
    }

    #[test]
    fn zero_radius_returns_exact_match_only() {
        let hits = index().within(40.5, -74.0, 0.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "B");
    }

    #[test]
    fn nearest_finds_closest() {
        let (name, _) = index().nearest(44.0, -74.0).expect("nearest");
        assert_eq!(name, "D");
        assert!(SpatialIndex::default().nearest(0.0, 0.0).is_none());
    }
}
