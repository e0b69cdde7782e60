//! Coarse terrain estimates for areas without tile coverage, and the water
//! tables behind the advisory water check.

use crate::tile::TileKey;

struct Region {
    name: &'static str,
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
    elevation_ft: f64,
}

impl Region {
    fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

const fn region(
    name: &'static str,
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
    elevation_ft: f64,
) -> Region {
    Region {
        name,
        min_lat,
        min_lon,
        max_lat,
        max_lon,
        elevation_ft,
    }
}

/// Highland zones that override the latitude bands.
const MOUNTAIN_REGIONS: &[Region] = &[
    region("Tibetan Plateau", 28.0, 78.0, 38.0, 100.0, 14000.0),
    region("Himalaya", 26.5, 72.0, 36.0, 97.0, 12000.0),
    region("Andes", -40.0, -75.0, 5.0, -66.0, 9000.0),
    region("Rocky Mountains", 35.0, -116.0, 49.0, -104.5, 7000.0),
    region("Alps", 44.0, 5.0, 48.0, 16.0, 5000.0),
    region("Antarctic Plateau", -90.0, -180.0, -70.0, 180.0, 8000.0),
    region("Greenland Ice Sheet", 62.0, -50.0, 80.0, -25.0, 7000.0),
    region("Ethiopian Highlands", 6.0, 35.0, 14.0, 42.0, 7500.0),
];

/// Open water, flagged for the water check and estimated at sea level.
const WATER_REGIONS: &[Region] = &[
    region("Gulf of Guinea", -5.0, -10.0, 4.0, 8.0, 0.0),
    region("Gulf of Mexico", 21.0, -96.0, 28.5, -84.0, 0.0),
    region("Western North Atlantic", 32.0, -72.0, 39.5, -55.0, 0.0),
    region("Gulf of Maine", 42.0, -70.0, 43.5, -66.5, 0.0),
    region("Central North Pacific", 10.0, -175.0, 40.0, -130.0, 0.0),
    region("Tasman Sea", -45.0, 155.0, -30.0, 168.0, 0.0),
    region("Lake Michigan", 42.0, -87.5, 45.5, -86.5, 579.0),
    region("Lake Superior", 46.8, -91.0, 48.3, -85.5, 600.0),
];

/// One-degree cells known to be entirely water.
const WATER_TILES: &[(i32, i32)] = &[
    (0, 0),
    (0, -1),
    (-1, 0),
    (-1, -1),
    (40, -70),
    (39, -72),
    (39, -71),
    (38, -73),
    (41, -69),
    (25, -90),
    (26, -91),
];

/// Deterministic ground elevation guess in feet MSL.
///
/// Water and highland tables first, then latitude bands: plains near the
/// equator, higher ground through the subtropics, temperate lowlands and
/// low polar terrain.
pub fn estimate_elevation_ft(lat: f64, lon: f64) -> f64 {
    if is_known_water_tile(TileKey::containing(lat, lon)) {
        return 0.0;
    }
    if let Some(water) = water_region(lat, lon) {
        return water.elevation_ft;
    }
    if let Some(high) = MOUNTAIN_REGIONS.iter().find(|r| r.contains(lat, lon)) {
        return high.elevation_ft;
    }
    match lat.abs() {
        a if a < 23.5 => 500.0,
        a if a < 35.0 => 1500.0,
        a if a < 55.0 => 1000.0,
        a if a < 66.5 => 800.0,
        _ => 300.0,
    }
}

pub fn is_known_water_tile(key: TileKey) -> bool {
    WATER_TILES
        .iter()
        .any(|&(lat, lon)| key.lat == lat && key.lon == lon)
}

fn water_region(lat: f64, lon: f64) -> Option<&'static Region> {
    WATER_REGIONS.iter().find(|r| r.contains(lat, lon))
}

/// Name of the flagged water body around a point, if any.
pub fn water_body(lat: f64, lon: f64) -> Option<&'static str> {
    water_region(lat, lon).map(|r| r.name)
}

/// Name of the highland zone around a point, if any.
pub fn mountain_region(lat: f64, lon: f64) -> Option<&'static str> {
    MOUNTAIN_REGIONS
        .iter()
        .find(|r| r.contains(lat, lon))
        .map(|r| r.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimates_are_deterministic_and_finite() {
        for &(lat, lon) in &[(0.0, 0.0), (45.0, -100.0), (-89.9, 10.0), (70.0, 100.0)] {
            let a = estimate_elevation_ft(lat, lon);
            assert!(a.is_finite());
            assert_eq!(a, estimate_elevation_ft(lat, lon));
        }
    }

    #[test]
    fn water_tiles_are_sea_level() {
        assert_eq!(estimate_elevation_ft(0.0, 0.0), 0.0);
        assert!(is_known_water_tile(TileKey::new(0, 0)));
        assert_eq!(water_body(1.0, 1.0), Some("Gulf of Guinea"));
    }

    #[test]
    fn highlands_override_bands() {
        assert_eq!(mountain_region(39.5, -106.0), Some("Rocky Mountains"));
        assert!(estimate_elevation_ft(39.5, -106.0) > estimate_elevation_ft(41.0, -90.0));
        assert!(estimate_elevation_ft(32.0, 90.0) >= 12000.0);
    }

    #[test]
    fn latitude_bands() {
        assert_eq!(estimate_elevation_ft(10.0, 20.0), 500.0);
        assert_eq!(estimate_elevation_ft(50.0, 60.0), 1000.0);
        assert_eq!(estimate_elevation_ft(75.0, 100.0), 300.0);
    }
}
