//! Tool configuration from environment.
//!
//! Every `NAV_*` variable is optional; absent or unparsable values keep the
//! component default.

use nav_core::{
    NavDatabase, NavDatabaseConfig, NavDataset, NavResult, RouterConfig, ValidationRules,
};
use nav_terrain::ElevationConfig;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// JSON dataset to load instead of the embedded tables
    pub dataset_path: Option<PathBuf>,
    pub database: NavDatabaseConfig,
    pub router: RouterConfig,
    pub elevation: ElevationConfig,
    pub validation: ValidationRules,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let router = RouterConfig::default();
        let elevation = ElevationConfig::default();
        let database = NavDatabaseConfig::default();
        let validation = ValidationRules::default();

        Self {
            dataset_path: lookup("NAV_DATASET")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            database: NavDatabaseConfig {
                query_cache_max_entries: parsed(&lookup, "NAV_QUERY_CACHE_MAX_ENTRIES")
                    .unwrap_or(database.query_cache_max_entries),
                query_cache_ttl_seconds: parsed(&lookup, "NAV_QUERY_CACHE_TTL_SECONDS")
                    .unwrap_or(database.query_cache_ttl_seconds),
            },
            router: RouterConfig {
                max_search_distance_nm: parsed(&lookup, "NAV_MAX_SEARCH_DISTANCE_NM")
                    .unwrap_or(router.max_search_distance_nm),
                prefer_airways: parsed(&lookup, "NAV_PREFER_AIRWAYS").unwrap_or(router.prefer_airways),
                min_altitude_ft: parsed(&lookup, "NAV_MIN_ALTITUDE_FT").unwrap_or(router.min_altitude_ft),
                max_altitude_ft: parsed(&lookup, "NAV_MAX_ALTITUDE_FT").unwrap_or(router.max_altitude_ft),
                cruise_speed_kn: parsed(&lookup, "NAV_CRUISE_SPEED_KN").unwrap_or(router.cruise_speed_kn),
                fuel_burn_lb_per_nm: parsed(&lookup, "NAV_FUEL_BURN_LB_PER_NM")
                    .unwrap_or(router.fuel_burn_lb_per_nm),
                max_direct_step_nm: parsed(&lookup, "NAV_MAX_DIRECT_STEP_NM")
                    .unwrap_or(router.max_direct_step_nm),
                airway_bonus: parsed(&lookup, "NAV_AIRWAY_BONUS").unwrap_or(router.airway_bonus),
                direct_penalty: parsed(&lookup, "NAV_DIRECT_PENALTY").unwrap_or(router.direct_penalty),
                preferred_airway_bonus: parsed(&lookup, "NAV_PREFERRED_AIRWAY_BONUS")
                    .unwrap_or(router.preferred_airway_bonus),
            },
            elevation: ElevationConfig {
                tile_dir: lookup("NAV_TILE_DIR")
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or(elevation.tile_dir),
                tile_cache_size: parsed(&lookup, "NAV_TILE_CACHE_SIZE").unwrap_or(elevation.tile_cache_size),
                sample_cache_size: parsed(&lookup, "NAV_SAMPLE_CACHE_SIZE")
                    .unwrap_or(elevation.sample_cache_size),
                cache_precision_deg: parsed(&lookup, "NAV_CACHE_PRECISION_DEG")
                    .unwrap_or(elevation.cache_precision_deg),
            },
            validation: ValidationRules {
                max_direct_leg_nm: parsed(&lookup, "NAV_MAX_DIRECT_LEG_NM")
                    .unwrap_or(validation.max_direct_leg_nm),
                min_altitude_ft: parsed(&lookup, "NAV_PLAN_MIN_ALTITUDE_FT")
                    .unwrap_or(validation.min_altitude_ft),
                max_altitude_ft: parsed(&lookup, "NAV_PLAN_MAX_ALTITUDE_FT")
                    .unwrap_or(validation.max_altitude_ft),
                max_speed_kn: parsed(&lookup, "NAV_MAX_SPEED_KN").unwrap_or(validation.max_speed_kn),
            },
        }
    }

    /// Open the store from `dataset_path`, or the embedded tables.
    pub fn open_database(&self) -> NavResult<NavDatabase> {
        let dataset = match &self.dataset_path {
            Some(path) => NavDataset::from_json_file(path)?,
            None => NavDataset::embedded(),
        };
        NavDatabase::from_dataset(dataset, self.database.clone())
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|raw| parse_value(&raw))
}

fn parse_value<T: FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse().ok()
}
