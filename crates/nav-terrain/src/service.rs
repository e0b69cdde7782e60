//! Elevation service: bounded tile and sample caches in front of HGT tiles,
//! with a banded estimator where no tile is available.
//!
//! Both caches and the counters live behind one mutex. Tile files are read
//! with the lock released; when two callers race to load the same tile the
//! first insertion wins and the other copy is dropped.

use crate::estimate::{estimate_elevation_ft, is_known_water_tile, water_body};
use crate::tile::{HgtTile, TileKey};
use lru::LruCache;
use nav_core::error::{NavError, NavResult};
use nav_core::spatial::{
    haversine_distance_nm, intermediate_point, meters_to_lat, meters_to_lon,
    validate_coordinates, BoundingBox, GeoPoint, FEET_PER_METER,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

pub const MIN_ELEVATION_FT: f64 = -500.0;
pub const MAX_ELEVATION_FT: f64 = 29029.0;
pub const STEEP_SLOPE_DEG: f64 = 15.0;
const SLOPE_OFFSET_M: f64 = 200.0;
/// Water check tolerance around sea level (or lake level).
const WATER_TOLERANCE_FT: f64 = 10.0;
/// Bound on remembered failed loads; kept apart from the tile bound.
const MISSING_TILE_MARKERS: usize = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevationConfig {
    pub tile_dir: PathBuf,
    pub tile_cache_size: usize,
    pub sample_cache_size: usize,
    /// Quantisation step of the sample cache key, in degrees
    pub cache_precision_deg: f64,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            tile_dir: PathBuf::from("terrain"),
            tile_cache_size: 16,
            sample_cache_size: 10_000,
            cache_precision_deg: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileStatus {
    Loaded,
    /// A load was attempted and failed; reads use the estimator
    Missing,
    NotLoaded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ElevationStats {
    pub sample_hits: u64,
    pub sample_misses: u64,
    pub tile_loads: u64,
    pub tile_load_failures: u64,
    pub tile_evictions: u64,
    pub fallbacks: u64,
    pub tiles_cached: usize,
    pub samples_cached: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileSample {
    pub lat: f64,
    pub lon: f64,
    /// Cumulative great-circle distance from the start
    pub distance_nm: f64,
    pub elevation_ft: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlopeInfo {
    pub slope_deg: f64,
    pub min_elevation_ft: f64,
    pub max_elevation_ft: f64,
    pub is_steep: bool,
}

#[derive(Debug, Clone)]
enum TileSlot {
    Loaded(Arc<HgtTile>),
    Missing,
}

struct ServiceState {
    tiles: LruCache<TileKey, Arc<HgtTile>>,
    missing: LruCache<TileKey, ()>,
    samples: LruCache<(i64, i64), f64>,
    stats: ElevationStats,
}

pub struct ElevationService {
    config: ElevationConfig,
    state: Mutex<ServiceState>,
}

fn capacity(size: usize) -> NonZeroUsize {
    NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN)
}

fn clamp_elevation(elevation_ft: f64) -> f64 {
    if elevation_ft.is_finite() {
        elevation_ft.clamp(MIN_ELEVATION_FT, MAX_ELEVATION_FT)
    } else {
        0.0
    }
}

impl ElevationService {
    pub fn new(config: ElevationConfig) -> Self {
        let state = ServiceState {
            tiles: LruCache::new(capacity(config.tile_cache_size)),
            missing: LruCache::new(capacity(MISSING_TILE_MARKERS)),
            samples: LruCache::new(capacity(config.sample_cache_size)),
            stats: ElevationStats::default(),
        };
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    pub fn config(&self) -> &ElevationConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        // caches and counters stay usable after a panicking holder
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn sample_key(&self, lat: f64, lon: f64) -> (i64, i64) {
        let step = if self.config.cache_precision_deg > 0.0 {
            self.config.cache_precision_deg
        } else {
            0.01
        };
        ((lat / step).round() as i64, (lon / step).round() as i64)
    }

    /// Elevation in feet MSL, clamped to [-500, 29029].
    ///
    /// Missing tiles are not an error: the estimator answers and the
    /// `fallbacks` counter records it.
    pub fn get_elevation(&self, lat: f64, lon: f64) -> NavResult<f64> {
        validate_coordinates(lat, lon)?;
        let key = self.sample_key(lat, lon);
        {
            let mut state = self.lock();
            if let Some(&cached) = state.samples.get(&key) {
                state.stats.sample_hits += 1;
                return Ok(cached);
            }
            state.stats.sample_misses += 1;
        }

        let elevation_ft = self.compute_elevation(lat, lon);
        self.lock().samples.put(key, elevation_ft);
        Ok(elevation_ft)
    }

    /// Interpolate (or estimate) without touching the sample cache.
    fn compute_elevation(&self, lat: f64, lon: f64) -> f64 {
        match self.acquire_tile(TileKey::containing(lat, lon)) {
            TileSlot::Loaded(tile) => clamp_elevation(tile.elevation_m(lat, lon) * FEET_PER_METER),
            TileSlot::Missing => {
                self.lock().stats.fallbacks += 1;
                tracing::debug!(lat, lon, "No terrain tile, using estimator");
                clamp_elevation(estimate_elevation_ft(lat, lon))
            }
        }
    }

    fn acquire_tile(&self, key: TileKey) -> TileSlot {
        {
            let mut state = self.lock();
            if let Some(tile) = state.tiles.get(&key) {
                return TileSlot::Loaded(Arc::clone(tile));
            }
            if state.missing.get(&key).is_some() {
                return TileSlot::Missing;
            }
        }
        let loaded = HgtTile::load(&self.config.tile_dir, key);
        self.install_tile(key, loaded).0
    }

    /// Insert a freshly loaded tile unless another caller got there first.
    fn install_tile(&self, key: TileKey, loaded: NavResult<HgtTile>) -> (TileSlot, Option<NavError>) {
        let mut state = self.lock();
        if let Some(existing) = state.tiles.get(&key) {
            return (TileSlot::Loaded(Arc::clone(existing)), loaded.err());
        }
        match loaded {
            Ok(tile) => {
                state.stats.tile_loads += 1;
                tracing::info!(
                    tile = %key,
                    size = tile.size(),
                    fill = tile.fill_percentage(),
                    "Loaded terrain tile"
                );
                let tile = Arc::new(tile);
                state.missing.pop(&key);
                if let Some((evicted, _)) = state.tiles.push(key, Arc::clone(&tile)) {
                    if evicted != key {
                        state.stats.tile_evictions += 1;
                    }
                }
                (TileSlot::Loaded(tile), None)
            }
            Err(err) => {
                state.stats.tile_load_failures += 1;
                match &err {
                    NavError::NotFound(_) => tracing::debug!(tile = %key, "Terrain tile not on disk"),
                    _ => tracing::warn!("Failed to load terrain tile {}: {}", key, err),
                }
                // failed loads never displace a resident tile
                state.missing.put(key, ());
                (TileSlot::Missing, Some(err))
            }
        }
    }

    /// `n` samples at equal fractions along the great circle from `start` to
    /// `end`; one sample yields just the start point.
    pub fn get_terrain_profile(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        samples: usize,
    ) -> NavResult<Vec<ProfileSample>> {
        validate_coordinates(start.lat, start.lon)?;
        validate_coordinates(end.lat, end.lon)?;
        if samples == 0 {
            return Err(NavError::invalid_input(
                "samples",
                "a profile needs at least one sample",
            ));
        }

        let total_nm = haversine_distance_nm(start.lat, start.lon, end.lat, end.lon);
        let mut profile = Vec::with_capacity(samples);
        for i in 0..samples {
            let fraction = if samples == 1 {
                0.0
            } else {
                i as f64 / (samples - 1) as f64
            };
            let (lat, lon) = intermediate_point(start.lat, start.lon, end.lat, end.lon, fraction);
            profile.push(ProfileSample {
                lat,
                lon,
                distance_nm: total_nm * fraction,
                elevation_ft: self.get_elevation(lat, lon)?,
            });
        }
        Ok(profile)
    }

    /// Slope from samples ~200 m north, south, east and west of the point.
    pub fn get_slope(&self, lat: f64, lon: f64) -> NavResult<SlopeInfo> {
        validate_coordinates(lat, lon)?;
        let dlat = meters_to_lat(SLOPE_OFFSET_M, lat);
        let dlon = meters_to_lon(SLOPE_OFFSET_M, lat);
        let points = [
            ((lat + dlat).min(90.0), lon),
            ((lat - dlat).max(-90.0), lon),
            (lat, (lon + dlon).min(180.0)),
            (lat, (lon - dlon).max(-180.0)),
        ];

        let elevations: Vec<f64> = points
            .iter()
            .map(|&(plat, plon)| self.compute_elevation(plat, plon))
            .collect();
        let min_elevation_ft = elevations.iter().copied().fold(f64::INFINITY, f64::min);
        let max_elevation_ft = elevations.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let rise_m = (max_elevation_ft - min_elevation_ft) / FEET_PER_METER;
        let slope_deg = (rise_m / (2.0 * SLOPE_OFFSET_M)).atan().to_degrees();
        Ok(SlopeInfo {
            slope_deg,
            min_elevation_ft,
            max_elevation_ft,
            is_steep: slope_deg > STEEP_SLOPE_DEG,
        })
    }

    /// Terrain elevation plus clearance.
    pub fn minimum_safe_altitude(&self, lat: f64, lon: f64, clearance_ft: f64) -> NavResult<f64> {
        if !clearance_ft.is_finite() {
            return Err(NavError::invalid_input(
                "clearance_ft",
                "clearance must be finite",
            ));
        }
        Ok(self.get_elevation(lat, lon)? + clearance_ft)
    }

    /// Advisory water check: a known water tile, or a flagged water body at
    /// roughly its surface elevation.
    pub fn is_water(&self, lat: f64, lon: f64) -> NavResult<bool> {
        validate_coordinates(lat, lon)?;
        if is_known_water_tile(TileKey::containing(lat, lon)) {
            return Ok(true);
        }
        if water_body(lat, lon).is_none() {
            return Ok(false);
        }
        let elevation_ft = self.get_elevation(lat, lon)?;
        let surface_ft = estimate_elevation_ft(lat, lon);
        Ok((elevation_ft - surface_ft).abs() <= WATER_TOLERANCE_FT)
    }

    pub fn tile_status(&self, lat: f64, lon: f64) -> NavResult<TileStatus> {
        validate_coordinates(lat, lon)?;
        let key = TileKey::containing(lat, lon);
        let state = self.lock();
        Ok(if state.tiles.contains(&key) {
            TileStatus::Loaded
        } else if state.missing.contains(&key) {
            TileStatus::Missing
        } else {
            TileStatus::NotLoaded
        })
    }

    /// Load the tile containing the point, surfacing the failure that a
    /// plain elevation query would hide.
    pub fn load_tile(&self, lat: f64, lon: f64) -> NavResult<()> {
        validate_coordinates(lat, lon)?;
        let key = TileKey::containing(lat, lon);
        {
            let mut state = self.lock();
            if state.tiles.get(&key).is_some() {
                return Ok(());
            }
            // a previous failure is retried
            state.missing.pop(&key);
        }
        let loaded = HgtTile::load(&self.config.tile_dir, key);
        match self.install_tile(key, loaded) {
            (TileSlot::Loaded(_), _) => Ok(()),
            (TileSlot::Missing, Some(err)) => Err(err),
            (TileSlot::Missing, None) => Err(NavError::NotFound(format!("tile {key}"))),
        }
    }

    /// Warm every tile intersecting the box, up to the tile cache size.
    /// Returns how many of the box's tiles are resident afterwards.
    pub fn preload_region(&self, region: &BoundingBox) -> NavResult<usize> {
        validate_coordinates(region.min_lat, region.min_lon)?;
        validate_coordinates(region.max_lat, region.max_lon)?;
        let lat_range = region.min_lat.floor() as i32..=region.max_lat.floor().min(89.0) as i32;
        let lon_range = region.min_lon.floor() as i32..=region.max_lon.floor().min(179.0) as i32;

        let keys: Vec<TileKey> = lat_range
            .flat_map(|tile_lat| {
                lon_range
                    .clone()
                    .map(move |tile_lon| TileKey::new(tile_lat, tile_lon))
            })
            .collect();

        let mut attempted_ok = 0usize;
        for key in &keys {
            if attempted_ok >= self.config.tile_cache_size.max(1) {
                break;
            }
            let (lat, lon) = (key.lat as f64 + 0.5, key.lon as f64 + 0.5);
            if self.load_tile(lat, lon).is_ok() {
                attempted_ok += 1;
            }
        }

        let state = self.lock();
        let resident = keys.iter().filter(|&key| state.tiles.contains(key)).count();
        tracing::debug!(resident, "Preloaded terrain region");
        Ok(resident)
    }

    pub fn clear_caches(&self) {
        let mut state = self.lock();
        state.tiles.clear();
        state.missing.clear();
        state.samples.clear();
    }

    pub fn stats(&self) -> ElevationStats {
        let state = self.lock();
        ElevationStats {
            tiles_cached: state.tiles.len(),
            samples_cached: state.samples.len(),
            ..state.stats
        }
    }
}
