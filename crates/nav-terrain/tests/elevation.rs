//! Tile-backed elevation tests.
//!
//! Synthetic SRTM3 tiles (1201x1201) are written to a temporary directory.

use flate2::write::GzEncoder;
use flate2::Compression;
use nav_core::error::NavError;
use nav_core::spatial::{BoundingBox, GeoPoint, FEET_PER_METER};
use nav_terrain::{
    ElevationConfig, ElevationService, HgtTile, TileKey, TileStatus, MAX_ELEVATION_FT,
    MIN_ELEVATION_FT, SRTM3_SIZE, VOID_SAMPLE,
};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn tile_bytes(value: impl Fn(usize, usize) -> i16) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(SRTM3_SIZE * SRTM3_SIZE * 2);
    for row in 0..SRTM3_SIZE {
        for col in 0..SRTM3_SIZE {
            bytes.extend_from_slice(&value(row, col).to_be_bytes());
        }
    }
    bytes
}

fn write_tile(dir: &Path, key: TileKey, value: impl Fn(usize, usize) -> i16) {
    let path = dir.join(format!("{}.hgt", key.name()));
    std::fs::write(path, tile_bytes(value)).expect("write tile");
}

fn write_gz_tile(dir: &Path, key: TileKey, value: impl Fn(usize, usize) -> i16) {
    let path = dir.join(format!("{}.hgt.gz", key.name()));
    let file = std::fs::File::create(path).expect("create tile");
    let mut encoder = GzEncoder::new(file, Compression::fast());
    encoder.write_all(&tile_bytes(value)).expect("compress tile");
    encoder.finish().expect("finish gzip");
}

fn service(dir: &TempDir, tile_cache_size: usize) -> ElevationService {
    ElevationService::new(ElevationConfig {
        tile_dir: dir.path().to_path_buf(),
        tile_cache_size,
        ..ElevationConfig::default()
    })
}

#[test]
fn interpolates_from_plain_tile() {
    let dir = TempDir::new().expect("tempdir");
    // meters equal to the column index
    write_tile(dir.path(), TileKey::new(40, -74), |_, col| col as i16);
    let svc = service(&dir, 4);

    let elevation = svc.get_elevation(40.5, -73.5).expect("elevation");
    assert!((elevation - 600.0 * FEET_PER_METER).abs() < 1e-6);

    let quarter = svc.get_elevation(40.5, -73.75).expect("elevation");
    assert!((quarter - 300.0 * FEET_PER_METER).abs() < 1e-6);

    assert_eq!(svc.tile_status(40.5, -73.5).expect("status"), TileStatus::Loaded);
    let stats = svc.stats();
    assert_eq!(stats.tile_loads, 1);
    assert_eq!(stats.fallbacks, 0);
}

#[test]
fn reads_gzip_tiles() {
    let dir = TempDir::new().expect("tempdir");
    write_gz_tile(dir.path(), TileKey::new(41, -73), |_, _| 250);
    let svc = service(&dir, 4);
    let elevation = svc.get_elevation(41.3, -72.6).expect("elevation");
    assert!((elevation - 250.0 * FEET_PER_METER).abs() < 1e-6);
    assert_eq!(svc.tile_status(41.3, -72.6).expect("status"), TileStatus::Loaded);
}

#[test]
fn missing_tile_falls_back_to_estimator_once() {
    let dir = TempDir::new().expect("tempdir");
    let svc = service(&dir, 4);

    let first = svc.get_elevation(0.0, 0.0).expect("elevation");
    assert!(first.is_finite());
    assert!((MIN_ELEVATION_FT..=MAX_ELEVATION_FT).contains(&first));
    let stats = svc.stats();
    assert_eq!(stats.sample_misses, 1);
    assert_eq!(stats.fallbacks, 1);

    let second = svc.get_elevation(0.0, 0.0).expect("elevation");
    assert_eq!(first.to_bits(), second.to_bits());
    let stats = svc.stats();
    assert_eq!(stats.sample_hits, 1);
    assert_eq!(stats.sample_misses, 1);
    assert_eq!(stats.fallbacks, 1);
}

#[test]
fn load_tile_surfaces_errors() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("N10E010.hgt"), [0u8; 100]).expect("write");
    let svc = service(&dir, 4);
    assert!(matches!(svc.load_tile(10.5, 10.5), Err(NavError::Io(_))));
    assert!(matches!(svc.load_tile(11.5, 10.5), Err(NavError::NotFound(_))));
    // elevation still answers from the estimator
    assert!(svc.get_elevation(10.5, 10.5).expect("elevation").is_finite());
    assert_eq!(svc.tile_status(10.5, 10.5).expect("status"), TileStatus::Missing);
}

#[test]
fn tile_cache_evicts_least_recently_used() {
    let dir = TempDir::new().expect("tempdir");
    write_tile(dir.path(), TileKey::new(40, -74), |_, _| 10);
    write_tile(dir.path(), TileKey::new(41, -74), |_, _| 20);
    let svc = service(&dir, 1);

    svc.get_elevation(40.5, -73.5).expect("elevation");
    svc.get_elevation(41.5, -73.5).expect("elevation");

    assert_eq!(svc.tile_status(40.5, -73.5).expect("status"), TileStatus::NotLoaded);
    assert_eq!(svc.tile_status(41.5, -73.5).expect("status"), TileStatus::Loaded);
    let stats = svc.stats();
    assert_eq!(stats.tile_evictions, 1);
    assert_eq!(stats.tiles_cached, 1);
}

#[test]
fn void_tiles_read_as_sea_level() {
    let dir = TempDir::new().expect("tempdir");
    write_tile(dir.path(), TileKey::new(44, -110), |_, _| VOID_SAMPLE);
    let svc = service(&dir, 4);
    assert_eq!(svc.get_elevation(44.5, -109.5).expect("elevation"), 0.0);
    let tile = HgtTile::load(dir.path(), TileKey::new(44, -110)).expect("tile");
    assert_eq!(tile.fill_percentage(), 0.0);
}

#[test]
fn elevations_are_clamped() {
    let dir = TempDir::new().expect("tempdir");
    write_tile(dir.path(), TileKey::new(27, 86), |_, _| 10_000);
    write_tile(dir.path(), TileKey::new(31, 35), |_, _| -1_000);
    let svc = service(&dir, 4);
    assert_eq!(svc.get_elevation(27.5, 86.5).expect("high"), MAX_ELEVATION_FT);
    assert_eq!(svc.get_elevation(31.5, 35.5).expect("low"), MIN_ELEVATION_FT);
}

#[test]
fn steep_terrain_is_flagged() {
    let dir = TempDir::new().expect("tempdir");
    // 40 m per row, rising to the north
    write_tile(dir.path(), TileKey::new(40, -106), |row, _| {
        (600 - row as i32) as i16 * 40
    });
    let svc = service(&dir, 4);
    let slope = svc.get_slope(40.5, -105.5).expect("slope");
    assert!(slope.is_steep, "slope was {}", slope.slope_deg);
    assert!((slope.slope_deg - 23.4).abs() < 1.0);
    assert!(slope.max_elevation_ft > slope.min_elevation_ft);
}

#[test]
fn profile_over_tile() {
    let dir = TempDir::new().expect("tempdir");
    write_tile(dir.path(), TileKey::new(40, -74), |_, col| col as i16);
    let svc = service(&dir, 4);
    let start = GeoPoint::new(40.2, -73.9);
    let end = GeoPoint::new(40.8, -73.1);
    let profile = svc.get_terrain_profile(start, end, 10).expect("profile");
    assert_eq!(profile.len(), 10);
    assert!(profile.windows(2).all(|w| w[1].distance_nm > w[0].distance_nm));
    assert!(profile.windows(2).all(|w| w[1].elevation_ft > w[0].elevation_ft));
    let total = start.distance_nm(&end);
    assert!((profile[9].distance_nm - total).abs() < 1e-9);
}

#[test]
fn preload_warms_available_tiles() {
    let dir = TempDir::new().expect("tempdir");
    write_tile(dir.path(), TileKey::new(40, -74), |_, _| 5);
    write_gz_tile(dir.path(), TileKey::new(41, -73), |_, _| 5);
    let svc = service(&dir, 8);
    let loaded = svc
        .preload_region(&BoundingBox::new(40.2, -73.8, 41.7, -72.2))
        .expect("preload");
    assert_eq!(loaded, 2);
    assert_eq!(svc.tile_status(40.5, -73.5).expect("status"), TileStatus::Loaded);
    assert_eq!(svc.tile_status(40.5, -72.5).expect("status"), TileStatus::Missing);
}

/// Absent tiles between two present ones must not push either out of a
/// two-tile cache.
#[test]
fn missing_tiles_do_not_evict_loaded_ones() {
    let dir = TempDir::new().expect("tempdir");
    write_tile(dir.path(), TileKey::new(40, -74), |_, _| 5);
    write_tile(dir.path(), TileKey::new(40, -72), |_, _| 7);
    let svc = service(&dir, 2);
    let resident = svc
        .preload_region(&BoundingBox::new(40.2, -73.8, 40.8, -71.2))
        .expect("preload");
    assert_eq!(resident, 2);
    assert_eq!(svc.tile_status(40.5, -73.5).expect("status"), TileStatus::Loaded);
    assert_eq!(svc.tile_status(40.5, -72.5).expect("status"), TileStatus::Missing);
    assert_eq!(svc.tile_status(40.5, -71.5).expect("status"), TileStatus::Loaded);

    // a fallback read of the absent tile leaves both loaded tiles in place
    svc.get_elevation(40.5, -72.5).expect("elevation");
    let stats = svc.stats();
    assert_eq!(stats.tile_evictions, 0);
    assert_eq!(stats.tiles_cached, 2);
    assert_eq!(svc.tile_status(40.5, -73.5).expect("status"), TileStatus::Loaded);
}

#[test]
fn loading_twice_is_identical() {
    let dir = TempDir::new().expect("tempdir");
    write_tile(dir.path(), TileKey::new(40, -74), |row, col| ((row * 7 + col) % 3000) as i16);
    let a = HgtTile::load(dir.path(), TileKey::new(40, -74)).expect("tile");
    let b = HgtTile::load(dir.path(), TileKey::new(40, -74)).expect("tile");
    assert_eq!(a.size(), SRTM3_SIZE);
    assert_eq!(a.samples(), b.samples());
}

#[test]
fn concurrent_queries_agree() {
    let dir = TempDir::new().expect("tempdir");
    write_tile(dir.path(), TileKey::new(40, -74), |_, col| col as i16);
    let svc = service(&dir, 4);
    let expected = 600.0 * FEET_PER_METER;
    std::thread::scope(|scope| {
        for _ in 0..4 {
            let svc = &svc;
            scope.spawn(move || {
                for _ in 0..25 {
                    let value = svc.get_elevation(40.5, -73.5).expect("elevation");
                    assert!((value - expected).abs() < 1e-6);
                }
            });
        }
    });
    let stats = svc.stats();
    assert_eq!(stats.tiles_cached, 1);
    assert_eq!(stats.sample_hits + stats.sample_misses, 100);
}
