//! Read-mostly navigation store with hash, reverse and spatial indices.
//!
//! The index lives behind a reader-writer lock: queries take the shared lock
//! and never block each other, dataset loads take the exclusive lock. List
//! queries are memoized in a separate `QueryCache` keyed by stable strings
//! such as `connecting:KJFK:WP1`; the cache is invalidated on every load.

pub mod dataset;
mod spatial_index;

pub use dataset::NavDataset;

use crate::cache::{CacheStats, QueryCache};
use crate::error::{NavError, NavResult};
use crate::models::{Airport, Airway, NavaidKind, Procedure, ProcedureKind, Waypoint};
use crate::router::{self, SearchRequest};
use crate::spatial::{
    haversine_distance_nm, initial_bearing_deg, is_valid_latitude, is_valid_longitude,
    validate_coordinates,
};
use crate::validator::{self, FlightPlan, ValidationRules};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spatial_index::SpatialIndex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Store-level cache knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavDatabaseConfig {
    pub query_cache_max_entries: usize,
    pub query_cache_ttl_seconds: u64,
}

impl Default for NavDatabaseConfig {
    fn default() -> Self {
        Self {
            query_cache_max_entries: 10_000,
            query_cache_ttl_seconds: 3600,
        }
    }
}

/// A waypoint returned by a radius query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyWaypoint {
    pub waypoint: Waypoint,
    pub distance_nm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyAirport {
    pub airport: Airport,
    pub distance_nm: f64,
}

/// Counters and sizes for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub waypoints: usize,
    pub airways: usize,
    pub airports: usize,
    pub sids: usize,
    pub stars: usize,
    pub approaches: usize,
    pub query_cache: CacheStats,
    pub loaded_at: DateTime<Utc>,
}

/// Indexed snapshot of the dataset. Only mutated by `NavDatabase::load_dataset`.
#[derive(Debug, Default)]
pub(crate) struct NavIndex {
    pub waypoints: HashMap<String, Waypoint>,
    pub airways: HashMap<String, Airway>,
    pub airports: HashMap<String, Airport>,
    pub sids: HashMap<String, Vec<Procedure>>,
    pub stars: HashMap<String, Vec<Procedure>>,
    pub approaches: HashMap<String, Vec<Procedure>>,
    pub airways_by_waypoint: HashMap<String, BTreeSet<String>>,
    pub spatial: SpatialIndex,
    pub airport_spatial: SpatialIndex,
}

impl NavIndex {
    fn build(dataset: NavDataset) -> NavResult<Self> {
        let mut index = NavIndex::default();

        for waypoint in dataset.waypoints {
            let mut waypoint = waypoint;
            waypoint.name = normalize_name(&waypoint.name);
            if waypoint.name.is_empty() {
                return Err(NavError::ConsistencyViolation(
                    "waypoint with empty name".to_string(),
                ));
            }
            if index.waypoints.contains_key(&waypoint.name) {
                return Err(NavError::ConsistencyViolation(format!(
                    "duplicate waypoint {}",
                    waypoint.name
                )));
            }
            index.waypoints.insert(waypoint.name.clone(), waypoint);
        }

        for airport in dataset.airports {
            let mut airport = airport;
            airport.icao = normalize_name(&airport.icao);
            if index.airports.contains_key(&airport.icao) {
                return Err(NavError::ConsistencyViolation(format!(
                    "duplicate airport {}",
                    airport.icao
                )));
            }
            // every airport is also routable as a waypoint
            match index.waypoints.get(&airport.icao) {
                Some(existing) if !matches_airport(existing, &airport) => {
                    return Err(NavError::ConsistencyViolation(format!(
                        "waypoint {} disagrees with airport record ({:?} at {}, {})",
                        airport.icao, existing.kind, existing.lat, existing.lon
                    )));
                }
                Some(_) => {}
                None => {
                    let waypoint = Waypoint::new(
                        airport.icao.clone(),
                        airport.lat,
                        airport.lon,
                        NavaidKind::Airport,
                    )
                    .with_elevation(airport.elevation_ft);
                    index.waypoints.insert(airport.icao.clone(), waypoint);
                }
            }
            index.airports.insert(airport.icao.clone(), airport);
        }

        for airway in dataset.airways {
            let mut airway = airway;
            airway.name = normalize_name(&airway.name);
            airway.waypoints = airway.waypoints.iter().map(|w| normalize_name(w)).collect();
            if index.airways.contains_key(&airway.name) {
                return Err(NavError::ConsistencyViolation(format!(
                    "duplicate airway {}",
                    airway.name
                )));
            }
            for name in &airway.waypoints {
                index
                    .airways_by_waypoint
                    .entry(name.clone())
                    .or_default()
                    .insert(airway.name.clone());
            }
            index.airways.insert(airway.name.clone(), airway);
        }

        for procedure in dataset.procedures {
            let mut procedure = procedure;
            procedure.airport = normalize_name(&procedure.airport);
            procedure.runway = normalize_runway(&procedure.runway);
            for fix in &mut procedure.fixes {
                fix.name = normalize_name(&fix.name);
            }
            let table = match procedure.kind {
                ProcedureKind::Sid => &mut index.sids,
                ProcedureKind::Star => &mut index.stars,
                ProcedureKind::Approach => &mut index.approaches,
            };
            table
                .entry(procedure.airport.clone())
                .or_default()
                .push(procedure);
        }

        index.spatial = SpatialIndex::build(
            index
                .waypoints
                .values()
                .map(|w| (w.name.as_str(), w.lat, w.lon)),
        );
        index.airport_spatial = SpatialIndex::build(
            index
                .airports
                .values()
                .map(|a| (a.icao.as_str(), a.lat, a.lon)),
        );

        Ok(index)
    }

    pub fn waypoint(&self, name: &str) -> Option<&Waypoint> {
        self.waypoints.get(name)
    }

    /// Airways that may be flown from `from` directly to `to`.
    pub fn airways_for_leg<'a>(&'a self, from: &str, to: &str) -> Vec<&'a Airway> {
        let Some(names) = self.airways_by_waypoint.get(from) else {
            return Vec::new();
        };
        names
            .iter()
            .filter_map(|name| self.airways.get(name))
            .filter(|airway| airway.has_leg(from, to))
            .collect()
    }

    /// Airway neighbours of a node: (neighbour, airway).
    pub fn airway_neighbors<'a>(&'a self, from: &str) -> Vec<(&'a str, &'a Airway)> {
        let Some(names) = self.airways_by_waypoint.get(from) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for airway in names.iter().filter_map(|name| self.airways.get(name)) {
            for neighbor in airway.neighbors_of(from) {
                out.push((neighbor, airway));
            }
        }
        out
    }

    pub fn nearby_names(&self, lat: f64, lon: f64, radius_nm: f64) -> Vec<(String, f64)> {
        self.spatial.within(lat, lon, radius_nm)
    }

    fn consistency_violation(&self) -> Option<String> {
        let mut waypoint_names: Vec<&String> = self.waypoints.keys().collect();
        waypoint_names.sort();
        for name in waypoint_names {
            let waypoint = &self.waypoints[name];
            if !is_valid_latitude(waypoint.lat) || !is_valid_longitude(waypoint.lon) {
                return Some(format!(
                    "waypoint {} has invalid coordinates ({}, {})",
                    name, waypoint.lat, waypoint.lon
                ));
            }
            if waypoint.elevation_ft.is_some_and(|e| !e.is_finite()) {
                return Some(format!("waypoint {name} has a non-finite elevation"));
            }
        }

        let mut airway_names: Vec<&String> = self.airways.keys().collect();
        airway_names.sort();
        for name in &airway_names {
            let airway = &self.airways[*name];
            if airway.waypoints.len() < 2 {
                return Some(format!("airway {name} has fewer than 2 waypoints"));
            }
            if !airway.min_altitude_ft.is_finite() || !airway.max_altitude_ft.is_finite() {
                return Some(format!("airway {name} has a non-finite altitude band"));
            }
            if airway.min_altitude_ft > airway.max_altitude_ft {
                return Some(format!(
                    "airway {} min altitude {} exceeds max altitude {}",
                    name, airway.min_altitude_ft, airway.max_altitude_ft
                ));
            }
            if let Some(missing) = airway
                .waypoints
                .iter()
                .find(|w| !self.waypoints.contains_key(*w))
            {
                return Some(format!("airway {name} references unknown waypoint {missing}"));
            }
        }

        for table in [&self.sids, &self.stars, &self.approaches] {
            let mut airports: Vec<&String> = table.keys().collect();
            airports.sort();
            for airport in airports {
                for procedure in &table[airport] {
                    if let Some(missing) = procedure
                        .fixes
                        .iter()
                        .find(|fix| !self.waypoints.contains_key(&fix.name))
                    {
                        return Some(format!(
                            "{} {} at {} references unknown fix {}",
                            procedure.kind, procedure.name, airport, missing.name
                        ));
                    }
                    if let Some(transition) = &procedure.transition {
                        if !self.waypoints.contains_key(transition) {
                            return Some(format!(
                                "{} {} at {} has unknown transition {}",
                                procedure.kind, procedure.name, airport, transition
                            ));
                        }
                    }
                }
            }
        }

        // reverse index must be the exact inverse of airway -> waypoints
        let mut expected: HashMap<&str, BTreeSet<&str>> = HashMap::new();
        for airway in self.airways.values() {
            for name in &airway.waypoints {
                expected.entry(name.as_str()).or_default().insert(airway.name.as_str());
            }
        }
        for (waypoint, airways) in &self.airways_by_waypoint {
            let indexed: BTreeSet<&str> = airways.iter().map(String::as_str).collect();
            let wanted = expected.remove(waypoint.as_str()).unwrap_or_default();
            if indexed != wanted {
                return Some(format!("reverse index for {waypoint} is out of sync"));
            }
        }
        if let Some((waypoint, _)) = expected.into_iter().find(|(_, set)| !set.is_empty()) {
            return Some(format!("reverse index is missing {waypoint}"));
        }

        if self.spatial.len() != self.waypoints.len() {
            return Some(format!(
                "spatial index has {} entries for {} waypoints",
                self.spatial.len(),
                self.waypoints.len()
            ));
        }
        let mut seen = HashSet::new();
        for entry in self.spatial.entries() {
            if !seen.insert(entry.name.as_str()) || !self.waypoints.contains_key(&entry.name) {
                return Some(format!("spatial index entry {} is invalid", entry.name));
            }
        }

        for (icao, airport) in &self.airports {
            if !is_valid_latitude(airport.lat) || !is_valid_longitude(airport.lon) {
                return Some(format!("airport {icao} has invalid coordinates"));
            }
        }

        None
    }
}

/// Thread-safe navigation database.
pub struct NavDatabase {
    index: RwLock<NavIndex>,
    query_cache: QueryCache<String, Vec<String>>,
    config: NavDatabaseConfig,
    loaded_at: RwLock<DateTime<Utc>>,
}

impl NavDatabase {
    /// Empty store; populate with `load_dataset`.
    pub fn new(config: NavDatabaseConfig) -> Self {
        Self {
            index: RwLock::new(NavIndex::default()),
            query_cache: QueryCache::new(
                config.query_cache_max_entries,
                Duration::from_secs(config.query_cache_ttl_seconds),
            ),
            config,
            loaded_at: RwLock::new(Utc::now()),
        }
    }

    /// Store initialized from the compiled-in tables.
    pub fn embedded(config: NavDatabaseConfig) -> NavResult<Self> {
        Self::from_dataset(NavDataset::embedded(), config)
    }

    pub fn from_dataset(dataset: NavDataset, config: NavDatabaseConfig) -> NavResult<Self> {
        let db = Self::new(config);
        db.load_dataset(dataset)?;
        Ok(db)
    }

    /// Replace the indexed dataset. Refuses datasets that break an invariant.
    ///
    /// Must not race with readers that expect a stable snapshot; the store is
    /// meant to be loaded once at init.
    pub fn load_dataset(&self, dataset: NavDataset) -> NavResult<()> {
        let index = NavIndex::build(dataset)?;
        if let Some(violation) = index.consistency_violation() {
            tracing::warn!("Rejecting navigation dataset: {}", violation);
            return Err(NavError::ConsistencyViolation(violation));
        }
        tracing::info!(
            waypoints = index.waypoints.len(),
            airways = index.airways.len(),
            airports = index.airports.len(),
            "Navigation database loaded"
        );
        *self.write() = index;
        *self
            .loaded_at
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Utc::now();
        self.invalidate_cache();
        Ok(())
    }

    pub fn config(&self) -> &NavDatabaseConfig {
        &self.config
    }

    pub fn invalidate_cache(&self) {
        self.query_cache.clear();
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, NavIndex> {
        // the index is only replaced wholesale, never left half-written
        self.index
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, NavIndex> {
        self.index
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cached_names<F>(&self, key: String, compute: F) -> Vec<String>
    where
        F: FnOnce(&NavIndex) -> Vec<String>,
    {
        if let Some(hit) = self.query_cache.get(&key) {
            return hit;
        }
        let names = compute(&self.read());
        self.query_cache.put(key, names.clone());
        names
    }

    // ==== Waypoints ====

    pub fn get_waypoint(&self, name: &str) -> Option<Waypoint> {
        let key = normalize_name(name);
        if key.is_empty() {
            return None;
        }
        self.read().waypoints.get(&key).cloned()
    }

    pub fn waypoint_count(&self) -> usize {
        self.read().waypoints.len()
    }

    /// All waypoints of a kind, ordered by name.
    pub fn get_waypoints_by_type(&self, kind: NavaidKind) -> Vec<Waypoint> {
        let names = self.cached_names(format!("type:{kind:?}"), |index| {
            let mut names: Vec<String> = index
                .waypoints
                .values()
                .filter(|w| w.kind == kind)
                .map(|w| w.name.clone())
                .collect();
            names.sort();
            names
        });
        self.resolve_waypoints(&names)
    }

    /// Waypoints within `radius_nm` great-circle distance, nearest first.
    pub fn get_waypoints_nearby(
        &self,
        lat: f64,
        lon: f64,
        radius_nm: f64,
    ) -> NavResult<Vec<NearbyWaypoint>> {
        validate_coordinates(lat, lon)?;
        if !radius_nm.is_finite() || radius_nm < 0.0 {
            return Err(NavError::invalid_input(
                "radius_nm",
                format!("{radius_nm} is not a finite non-negative radius"),
            ));
        }
        // exact bits, so neighbouring radii never share an entry
        let key = format!(
            "nearby:{:x}:{:x}:{:x}",
            lat.to_bits(),
            lon.to_bits(),
            radius_nm.to_bits()
        );
        let names = self.cached_names(key, |index| {
            index
                .nearby_names(lat, lon, radius_nm)
                .into_iter()
                .map(|(name, _)| name)
                .collect()
        });
        Ok(self
            .resolve_waypoints(&names)
            .into_iter()
            .map(|waypoint| NearbyWaypoint {
                distance_nm: haversine_distance_nm(lat, lon, waypoint.lat, waypoint.lon),
                waypoint,
            })
            .collect())
    }

    fn resolve_waypoints(&self, names: &[String]) -> Vec<Waypoint> {
        let index = self.read();
        names
            .iter()
            .filter_map(|name| index.waypoints.get(name).cloned())
            .collect()
    }

    // ==== Airways ====

    pub fn get_airway(&self, name: &str) -> Option<Airway> {
        self.read().airways.get(&normalize_name(name)).cloned()
    }

    pub fn airway_count(&self) -> usize {
        self.read().airways.len()
    }

    /// Waypoints of an airway in sequence order.
    pub fn get_airway_waypoints(&self, name: &str) -> Option<Vec<Waypoint>> {
        let index = self.read();
        let airway = index.airways.get(&normalize_name(name))?;
        Some(
            airway
                .waypoints
                .iter()
                .filter_map(|w| index.waypoints.get(w).cloned())
                .collect(),
        )
    }

    /// Reverse index lookup: airways whose sequence contains `waypoint`.
    pub fn get_airways_for_waypoint(&self, waypoint: &str) -> Vec<String> {
        self.read()
            .airways_by_waypoint
            .get(&normalize_name(waypoint))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Airways containing `from` and `to` as adjacent, flyable entries.
    pub fn get_connecting_airways(&self, from: &str, to: &str) -> Vec<String> {
        let from = normalize_name(from);
        let to = normalize_name(to);
        self.cached_names(format!("connecting:{from}:{to}"), |index| {
            index
                .airways_for_leg(&from, &to)
                .into_iter()
                .map(|airway| airway.name.clone())
                .collect()
        })
    }

    /// Full airway records for a leg; used by the validator.
    pub fn airways_for_leg(&self, from: &str, to: &str) -> Vec<Airway> {
        self.read()
            .airways_for_leg(&normalize_name(from), &normalize_name(to))
            .into_iter()
            .cloned()
            .collect()
    }

    /// Airways whose band contains `altitude_ft`, ordered by name.
    pub fn get_airways_by_altitude(&self, altitude_ft: f64) -> Vec<String> {
        if !altitude_ft.is_finite() {
            return Vec::new();
        }
        self.cached_names(format!("altitude:{altitude_ft}"), |index| {
            let mut names: Vec<String> = index
                .airways
                .values()
                .filter(|airway| airway.covers_altitude(altitude_ft))
                .map(|airway| airway.name.clone())
                .collect();
            names.sort();
            names
        })
    }

    // ==== Procedures ====

    pub fn get_sid(&self, airport: &str, runway: &str) -> Option<Procedure> {
        self.find_procedure(ProcedureKind::Sid, airport, runway, None)
    }

    pub fn get_star(&self, airport: &str, runway: &str) -> Option<Procedure> {
        self.find_procedure(ProcedureKind::Star, airport, runway, None)
    }

    /// First approach to the runway, optionally restricted to a type such as `ILS`.
    pub fn get_approach(
        &self,
        airport: &str,
        runway: &str,
        approach_type: Option<&str>,
    ) -> Option<Procedure> {
        self.find_procedure(ProcedureKind::Approach, airport, runway, approach_type)
    }

    pub fn get_sids(&self, airport: &str) -> Vec<Procedure> {
        self.list_procedures(ProcedureKind::Sid, airport)
    }

    pub fn get_stars(&self, airport: &str) -> Vec<Procedure> {
        self.list_procedures(ProcedureKind::Star, airport)
    }

    pub fn get_approaches(&self, airport: &str) -> Vec<Procedure> {
        self.list_procedures(ProcedureKind::Approach, airport)
    }

    fn list_procedures(&self, kind: ProcedureKind, airport: &str) -> Vec<Procedure> {
        let index = self.read();
        let table = match kind {
            ProcedureKind::Sid => &index.sids,
            ProcedureKind::Star => &index.stars,
            ProcedureKind::Approach => &index.approaches,
        };
        table
            .get(&normalize_name(airport))
            .cloned()
            .unwrap_or_default()
    }

    fn find_procedure(
        &self,
        kind: ProcedureKind,
        airport: &str,
        runway: &str,
        approach_type: Option<&str>,
    ) -> Option<Procedure> {
        let runway = normalize_runway(runway);
        let wanted_type = approach_type.map(normalize_name);
        self.list_procedures(kind, airport).into_iter().find(|p| {
            p.runway == runway
                && match (&wanted_type, &p.approach_type) {
                    (None, _) => true,
                    (Some(wanted), Some(actual)) => normalize_name(actual) == *wanted,
                    (Some(_), None) => false,
                }
        })
    }

    // ==== Airports ====

    pub fn get_airport(&self, icao: &str) -> Option<Airport> {
        self.read().airports.get(&normalize_name(icao)).cloned()
    }

    pub fn get_airports_nearby(
        &self,
        lat: f64,
        lon: f64,
        radius_nm: f64,
    ) -> NavResult<Vec<NearbyAirport>> {
        validate_coordinates(lat, lon)?;
        if !radius_nm.is_finite() || radius_nm < 0.0 {
            return Err(NavError::invalid_input(
                "radius_nm",
                format!("{radius_nm} is not a finite non-negative radius"),
            ));
        }
        let index = self.read();
        Ok(index
            .airport_spatial
            .within(lat, lon, radius_nm)
            .into_iter()
            .filter_map(|(icao, distance_nm)| {
                index.airports.get(&icao).cloned().map(|airport| NearbyAirport {
                    airport,
                    distance_nm,
                })
            })
            .collect())
    }

    pub fn nearest_airport(&self, lat: f64, lon: f64) -> NavResult<Option<NearbyAirport>> {
        validate_coordinates(lat, lon)?;
        let index = self.read();
        Ok(index
            .airport_spatial
            .nearest(lat, lon)
            .and_then(|(icao, distance_nm)| {
                index.airports.get(&icao).cloned().map(|airport| NearbyAirport {
                    airport,
                    distance_nm,
                })
            }))
    }

    // ==== Geometry between named waypoints ====

    pub fn calculate_distance(&self, from: &str, to: &str) -> NavResult<f64> {
        let (a, b) = self.resolve_pair(from, to)?;
        Ok(haversine_distance_nm(a.lat, a.lon, b.lat, b.lon))
    }

    /// Initial true bearing in [0, 360).
    pub fn calculate_heading(&self, from: &str, to: &str) -> NavResult<f64> {
        let (a, b) = self.resolve_pair(from, to)?;
        Ok(initial_bearing_deg(a.lat, a.lon, b.lat, b.lon))
    }

    fn resolve_pair(&self, from: &str, to: &str) -> NavResult<(Waypoint, Waypoint)> {
        let a = self
            .get_waypoint(from)
            .ok_or_else(|| NavError::NotFound(format!("waypoint {from}")))?;
        let b = self
            .get_waypoint(to)
            .ok_or_else(|| NavError::NotFound(format!("waypoint {to}")))?;
        Ok((a, b))
    }

    // ==== Plans and routes ====

    /// Validate a named waypoint sequence at a cruise altitude with default rules.
    pub fn validate_flight_plan<S: AsRef<str>>(
        &self,
        waypoints: &[S],
        cruise_altitude_ft: f64,
    ) -> NavResult<()> {
        let plan = FlightPlan::from_names(waypoints, cruise_altitude_ft);
        self.validate_plan(&plan, &ValidationRules::default())
    }

    pub fn validate_plan(&self, plan: &FlightPlan, rules: &ValidationRules) -> NavResult<()> {
        validator::validate_flight_plan(self, plan, rules).map_err(NavError::from)
    }

    /// Airway-only route as an ordered list of waypoint names.
    ///
    /// Uses the same A* search as `AirwayRouter` but without direct legs, so
    /// every consecutive pair in the result shares an airway that covers the
    /// cruise altitude.
    pub fn find_route(
        &self,
        origin: &str,
        destination: &str,
        cruise_altitude_ft: f64,
    ) -> NavResult<Vec<String>> {
        let origin = normalize_name(origin);
        let destination = normalize_name(destination);
        if !cruise_altitude_ft.is_finite() {
            return Err(NavError::invalid_input(
                "cruise_altitude_ft",
                "cruise altitude must be finite",
            ));
        }

        let key = format!("route:{origin}:{destination}:{cruise_altitude_ft}");
        if let Some(hit) = self.query_cache.get(&key) {
            return Ok(hit);
        }

        let index = self.read();
        if !index.waypoints.contains_key(&origin) {
            return Err(NavError::NotFound(format!("waypoint {origin}")));
        }
        if !index.waypoints.contains_key(&destination) {
            return Err(NavError::NotFound(format!("waypoint {destination}")));
        }

        let request = SearchRequest::airways_only(&origin, &destination, cruise_altitude_ft);
        let path = router::search(&index, &request)
            .ok_or_else(|| NavError::no_route(origin.clone(), destination.clone()))?;
        drop(index);

        let names = path.node_names();
        self.query_cache.put(key, names.clone());
        Ok(names)
    }

    // ==== Diagnostics ====

    /// Empty string when every invariant holds, otherwise the first violation.
    pub fn check_database_consistency(&self) -> String {
        self.read().consistency_violation().unwrap_or_default()
    }

    pub fn verify_consistency(&self) -> NavResult<()> {
        match self.read().consistency_violation() {
            None => Ok(()),
            Some(violation) => Err(NavError::ConsistencyViolation(violation)),
        }
    }

    pub fn stats(&self) -> DatabaseStats {
        let index = self.read();
        let count =
            |table: &HashMap<String, Vec<Procedure>>| -> usize { table.values().map(Vec::len).sum() };
        DatabaseStats {
            waypoints: index.waypoints.len(),
            airways: index.airways.len(),
            airports: index.airports.len(),
            sids: count(&index.sids),
            stars: count(&index.stars),
            approaches: count(&index.approaches),
            query_cache: self.query_cache.stats(),
            loaded_at: *self
                .loaded_at
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        }
    }
}

/// Identifiers are stored trimmed and uppercase.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

/// `RW04R`, `rw04r` and `04R` all name the same runway.
fn normalize_runway(runway: &str) -> String {
    let upper = normalize_name(runway);
    match upper.strip_prefix("RW") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => upper,
    }
}

/// An explicit waypoint may stand in for an airport only at the same spot.
fn matches_airport(waypoint: &Waypoint, airport: &Airport) -> bool {
    const TOLERANCE_DEG: f64 = 1e-6;
    waypoint.kind == NavaidKind::Airport
        && (waypoint.lat - airport.lat).abs() <= TOLERANCE_DEG
        && (waypoint.lon - airport.lon).abs() <= TOLERANCE_DEG
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProcedureFix;

    fn db() -> NavDatabase {
        NavDatabase::embedded(NavDatabaseConfig::default()).expect("embedded dataset")
    }

    #[test]
    fn embedded_dataset_is_consistent() {
        let db = db();
        assert_eq!(db.check_database_consistency(), "");
        assert!(db.verify_consistency().is_ok());
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let db = db();
        assert_eq!(db.get_waypoint("kjfk").map(|w| w.name), Some("KJFK".to_string()));
        assert!(db.get_waypoint("").is_none());
        assert!(db.get_waypoint("NOPE").is_none());
    }

    #[test]
    fn airports_become_waypoints() {
        let db = db();
        let kbos = db.get_waypoint("KBOS").expect("KBOS");
        assert_eq!(kbos.kind, NavaidKind::Airport);
        assert_eq!(kbos.elevation_ft, Some(20.0));
    }

    #[test]
    fn waypoints_by_type_are_sorted() {
        let db = db();
        let vors = db.get_waypoints_by_type(NavaidKind::Vor);
        assert!(!vors.is_empty());
        assert!(vors.windows(2).all(|w| w[0].name < w[1].name));
        assert!(vors.iter().all(|w| w.kind == NavaidKind::Vor));
    }

    #[test]
    fn connecting_airways_respect_adjacency_and_direction() {
        let db = db();
        assert_eq!(db.get_connecting_airways("KJFK", "WP1"), vec!["J121"]);
        assert_eq!(db.get_connecting_airways("WP1", "KJFK"), vec!["J121"]);
        assert!(db.get_connecting_airways("KJFK", "KBOS").is_empty());
        // Q100 is one-way SYR -> ALB -> HFD
        assert_eq!(db.get_connecting_airways("SYR", "ALB"), vec!["Q100"]);
        assert!(db.get_connecting_airways("ALB", "SYR").is_empty());
    }

    #[test]
    fn airways_by_altitude_band() {
        let db = db();
        let high = db.get_airways_by_altitude(35000.0);
        assert!(high.contains(&"J121".to_string()));
        assert!(!high.contains(&"V16".to_string()));
        assert!(db.get_airways_by_altitude(f64::NAN).is_empty());
    }

    #[test]
    fn procedures_lookup() {
        let db = db();
        let sid = db.get_sid("KJFK", "31L").expect("sid");
        assert_eq!(sid.name, "MERIT4");
        assert_eq!(db.get_sid("KJFK", "RW31L").map(|p| p.name), Some("MERIT4".into()));
        assert_eq!(db.get_star("KBOS", "04R").map(|p| p.name), Some("ROBUC3".into()));
        let rnav = db.get_approach("KBOS", "04R", Some("rnav")).expect("rnav");
        assert_eq!(rnav.name, "R04R");
        assert_eq!(db.get_approach("KBOS", "04R", None).map(|p| p.name), Some("I04R".into()));
        assert!(db.get_approach("KBOS", "04R", Some("GLS")).is_none());
        assert!(db.get_sid("KXXX", "01").is_none());
    }

    #[test]
    fn distance_and_heading_require_known_waypoints() {
        let db = db();
        let d = db.calculate_distance("KJFK", "KBOS").expect("distance");
        assert!((d - 161.89).abs() < 0.1);
        let h = db.calculate_heading("KJFK", "KBOS").expect("heading");
        assert!((0.0..360.0).contains(&h));
        assert!(matches!(
            db.calculate_distance("KJFK", "NOPE"),
            Err(NavError::NotFound(_))
        ));
        assert!(db.calculate_distance("KJFK", "KJFK").expect("zero") < 1e-6);
    }

    #[test]
    fn nearby_rejects_bad_input() {
        let db = db();
        assert!(db.get_waypoints_nearby(91.0, 0.0, 10.0).is_err());
        assert!(db.get_waypoints_nearby(40.0, -74.0, -1.0).is_err());
        assert!(db.get_waypoints_nearby(40.0, -74.0, f64::NAN).is_err());
    }

    #[test]
    fn repeated_queries_hit_the_cache() {
        let db = db();
        db.get_connecting_airways("KJFK", "WP1");
        db.get_connecting_airways("KJFK", "WP1");
        let stats = db.stats();
        assert!(stats.query_cache.hits >= 1);
        db.invalidate_cache();
        assert_eq!(db.stats().query_cache.entries, 0);
    }

    #[test]
    fn find_route_follows_airways() {
        let db = db();
        let route = db.find_route("KJFK", "KBOS", 35000.0).expect("route");
        assert_eq!(route, vec!["KJFK", "WP1", "KBOS"]);
        assert!(matches!(
            db.find_route("KJFK", "NOPE", 35000.0),
            Err(NavError::NotFound(_))
        ));
    }

    #[test]
    fn inconsistent_dataset_is_rejected() {
        let mut dataset = NavDataset::embedded();
        dataset.airways.push(Airway::new("J999", &["KJFK", "GHOST"], 18000.0, 45000.0));
        let err = NavDatabase::from_dataset(dataset, NavDatabaseConfig::default())
            .err()
            .expect("should reject");
        assert!(matches!(err, NavError::ConsistencyViolation(ref msg) if msg.contains("GHOST")));
    }

    #[test]
    fn inverted_band_is_rejected() {
        let mut dataset = NavDataset::embedded();
        dataset.airways.push(Airway::new("J998", &["KJFK", "WP1"], 30000.0, 20000.0));
        assert!(NavDatabase::from_dataset(dataset, NavDatabaseConfig::default()).is_err());
    }

    #[test]
    fn unknown_procedure_fix_is_rejected() {
        let mut dataset = NavDataset::embedded();
        dataset.procedures.push(Procedure {
            kind: ProcedureKind::Sid,
            airport: "KJFK".into(),
            runway: "22R".into(),
            name: "BOGUS1".into(),
            fixes: vec![ProcedureFix::new("NOWHERE")],
            transition: None,
            approach_type: None,
        });
        assert!(NavDatabase::from_dataset(dataset, NavDatabaseConfig::default()).is_err());
    }

    #[test]
    fn duplicate_waypoint_is_rejected() {
        let mut dataset = NavDataset::embedded();
        dataset
            .waypoints
            .push(Waypoint::new("wp1", 10.0, 10.0, NavaidKind::Fix));
        assert!(matches!(
            NavDatabase::from_dataset(dataset, NavDatabaseConfig::default()),
            Err(NavError::ConsistencyViolation(_))
        ));
    }

    #[test]
    fn airport_clashing_with_waypoint_is_rejected() {
        let mut dataset = NavDataset::embedded();
        dataset
            .waypoints
            .push(Waypoint::new("KBOS", 42.0, -71.0, NavaidKind::Fix));
        assert!(matches!(
            NavDatabase::from_dataset(dataset, NavDatabaseConfig::default()),
            Err(NavError::ConsistencyViolation(ref msg)) if msg.contains("KBOS")
        ));

        // the same position and kind is accepted
        let mut dataset = NavDataset::embedded();
        dataset
            .waypoints
            .push(Waypoint::new("KBOS", 42.3656, -71.0096, NavaidKind::Airport));
        assert!(NavDatabase::from_dataset(dataset, NavDatabaseConfig::default()).is_ok());
    }

    #[test]
    fn nearby_results_stay_inside_each_radius() {
        let dataset = NavDataset {
            waypoints: vec![
                Waypoint::new("CTR", 10.0, 10.0, NavaidKind::Fix),
                Waypoint::new("EDGE", 10.5, 10.0, NavaidKind::Fix),
            ],
            ..NavDataset::default()
        };
        let db = NavDatabase::from_dataset(dataset, NavDatabaseConfig::default()).expect("db");
        let edge = haversine_distance_nm(10.0, 10.0, 10.5, 10.0);

        let wide = db.get_waypoints_nearby(10.0, 10.0, edge + 1e-5).expect("nearby");
        assert!(wide.iter().any(|n| n.waypoint.name == "EDGE"));
        let narrow = db.get_waypoints_nearby(10.0, 10.0, edge - 5e-5).expect("nearby");
        let names: Vec<&str> = narrow.iter().map(|n| n.waypoint.name.as_str()).collect();
        assert_eq!(names, vec!["CTR"]);
    }

    #[test]
    fn nearest_airport_to_jfk_vor() {
        let db = db();
        let nearest = db.nearest_airport(40.65, -73.78).expect("valid").expect("some");
        assert_eq!(nearest.airport.icao, "KJFK");
        let nearby = db.get_airports_nearby(40.6413, -73.7781, 20.0).expect("nearby");
        let icaos: Vec<&str> = nearby.iter().map(|n| n.airport.icao.as_str()).collect();
        assert_eq!(icaos.first(), Some(&"KJFK"));
        assert!(icaos.contains(&"KLGA"));
    }

    #[test]
    fn concurrent_readers() {
        let db = db();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                let db = &db;
                scope.spawn(move || {
                    for _ in 0..50 {
                        assert!(db.get_waypoint("KJFK").is_some());
                        assert_eq!(db.get_connecting_airways("KJFK", "WP1"), vec!["J121"]);
                        assert!(db.get_waypoints_nearby(40.6413, -73.7781, 50.0).is_ok());
                    }
                });
            }
        });
    }
}
