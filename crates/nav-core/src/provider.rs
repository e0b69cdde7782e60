//! Navdata provider interface for the airport-management side of the copilot.
//!
//! One capability trait with two implementations: `DatabaseProvider` answers
//! live from a shared `NavDatabase`, `CachedProvider` memoizes identifier
//! lookups of any provider. Absence is `None`, never an error.

use crate::error::{NavError, NavResult};
use crate::models::{Airport, NavaidKind, Waypoint};
use crate::navdb::{NavDatabase, NearbyAirport, NearbyWaypoint};
use crate::spatial::GeoPoint;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait NavDataProvider: Send + Sync {
    fn initialize(&self) -> NavResult<()>;
    fn shutdown(&self);
    fn is_ready(&self) -> bool;
    fn airport_by_icao(&self, icao: &str) -> Option<Airport>;
    fn airports_nearby(&self, center: GeoPoint, radius_nm: f64) -> NavResult<Vec<NearbyAirport>>;
    fn navaid_by_id(&self, id: &str) -> Option<Waypoint>;
    /// `kind = None` returns every radio navaid in range.
    fn navaids_nearby(
        &self,
        center: GeoPoint,
        radius_nm: f64,
        kind: Option<NavaidKind>,
    ) -> NavResult<Vec<NearbyWaypoint>>;
    fn nearest_airport(&self, position: GeoPoint) -> NavResult<Option<NearbyAirport>>;
}

/// Live provider backed by the navigation store.
pub struct DatabaseProvider {
    db: Arc<NavDatabase>,
    ready: AtomicBool,
}

impl DatabaseProvider {
    pub fn new(db: Arc<NavDatabase>) -> Self {
        Self {
            db,
            ready: AtomicBool::new(false),
        }
    }

    fn ensure_ready(&self) -> NavResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(NavError::NotFound("navdata provider is not initialized".into()))
        }
    }
}

impl NavDataProvider for DatabaseProvider {
    fn initialize(&self) -> NavResult<()> {
        self.db.verify_consistency()?;
        self.ready.store(true, Ordering::Release);
        tracing::info!(
            waypoints = self.db.waypoint_count(),
            "Navdata provider ready"
        );
        Ok(())
    }

    fn shutdown(&self) {
        self.ready.store(false, Ordering::Release);
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn airport_by_icao(&self, icao: &str) -> Option<Airport> {
        if !self.is_ready() {
            return None;
        }
        self.db.get_airport(icao)
    }

    fn airports_nearby(&self, center: GeoPoint, radius_nm: f64) -> NavResult<Vec<NearbyAirport>> {
        self.ensure_ready()?;
        self.db.get_airports_nearby(center.lat, center.lon, radius_nm)
    }

    fn navaid_by_id(&self, id: &str) -> Option<Waypoint> {
        if !self.is_ready() {
            return None;
        }
        self.db.get_waypoint(id).filter(|w| w.kind.is_navaid())
    }

    fn navaids_nearby(
        &self,
        center: GeoPoint,
        radius_nm: f64,
        kind: Option<NavaidKind>,
    ) -> NavResult<Vec<NearbyWaypoint>> {
        self.ensure_ready()?;
        Ok(self
            .db
            .get_waypoints_nearby(center.lat, center.lon, radius_nm)?
            .into_iter()
            .filter(|hit| match kind {
                Some(kind) => hit.waypoint.kind == kind,
                None => hit.waypoint.kind.is_navaid(),
            })
            .collect())
    }

    fn nearest_airport(&self, position: GeoPoint) -> NavResult<Option<NearbyAirport>> {
        self.ensure_ready()?;
        self.db.nearest_airport(position.lat, position.lon)
    }
}

/// Memoizes identifier lookups (hits and misses) of an inner provider.
/// Spatial queries pass through.
pub struct CachedProvider<P> {
    inner: P,
    airports: DashMap<String, Option<Airport>>,
    navaids: DashMap<String, Option<Waypoint>>,
}

impl<P: NavDataProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            airports: DashMap::new(),
            navaids: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn cached_entries(&self) -> usize {
        self.airports.len() + self.navaids.len()
    }

    pub fn clear(&self) {
        self.airports.clear();
        self.navaids.clear();
    }
}

impl<P: NavDataProvider> NavDataProvider for CachedProvider<P> {
    fn initialize(&self) -> NavResult<()> {
        self.clear();
        self.inner.initialize()
    }

    fn shutdown(&self) {
        self.clear();
        self.inner.shutdown();
    }

    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    fn airport_by_icao(&self, icao: &str) -> Option<Airport> {
        if !self.is_ready() {
            return None;
        }
        let key = icao.trim().to_ascii_uppercase();
        if let Some(hit) = self.airports.get(&key) {
            return hit.value().clone();
        }
        let value = self.inner.airport_by_icao(&key);
        self.airports.insert(key, value.clone());
        value
    }

    fn airports_nearby(&self, center: GeoPoint, radius_nm: f64) -> NavResult<Vec<NearbyAirport>> {
        self.inner.airports_nearby(center, radius_nm)
    }

    fn navaid_by_id(&self, id: &str) -> Option<Waypoint> {
        if !self.is_ready() {
            return None;
        }
        let key = id.trim().to_ascii_uppercase();
        if let Some(hit) = self.navaids.get(&key) {
            return hit.value().clone();
        }
        let value = self.inner.navaid_by_id(&key);
        self.navaids.insert(key, value.clone());
        value
    }

    fn navaids_nearby(
        &self,
        center: GeoPoint,
        radius_nm: f64,
        kind: Option<NavaidKind>,
    ) -> NavResult<Vec<NearbyWaypoint>> {
        self.inner.navaids_nearby(center, radius_nm, kind)
    }

    fn nearest_airport(&self, position: GeoPoint) -> NavResult<Option<NearbyAirport>> {
        self.inner.nearest_airport(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navdb::NavDatabaseConfig;

    fn live() -> DatabaseProvider {
        let db = NavDatabase::embedded(NavDatabaseConfig::default()).expect("embedded dataset");
        DatabaseProvider::new(Arc::new(db))
    }

    #[test]
    fn provider_answers_only_when_ready() {
        let provider = live();
        assert!(!provider.is_ready());
        assert!(provider.airport_by_icao("KJFK").is_none());
        assert!(provider
            .airports_nearby(GeoPoint::new(40.64, -73.78), 10.0)
            .is_err());
        provider.initialize().expect("init");
        assert!(provider.is_ready());
        assert_eq!(
            provider.airport_by_icao("kjfk").map(|a| a.icao),
            Some("KJFK".to_string())
        );
        provider.shutdown();
        assert!(!provider.is_ready());
    }

    #[test]
    fn navaid_lookup_skips_fixes_and_airports() {
        let provider = live();
        provider.initialize().expect("init");
        assert!(provider.navaid_by_id("CCC").is_some());
        assert!(provider.navaid_by_id("WP1").is_none());
        assert!(provider.navaid_by_id("KJFK").is_none());
    }

    #[test]
    fn navaids_nearby_filters_by_kind() {
        let provider = live();
        provider.initialize().expect("init");
        let center = GeoPoint::new(40.9188, -72.3168);
        let vors = provider
            .navaids_nearby(center, 60.0, Some(NavaidKind::Vor))
            .expect("query");
        assert!(vors.iter().all(|hit| hit.waypoint.kind == NavaidKind::Vor));
        assert_eq!(vors.first().map(|hit| hit.waypoint.name.as_str()), Some("HTO"));
        let all = provider.navaids_nearby(center, 60.0, None).expect("query");
        assert!(all.iter().all(|hit| hit.waypoint.kind.is_navaid()));
        assert!(all.len() >= vors.len());
    }

    #[test]
    fn cached_provider_memoizes_misses_too() {
        let cached = CachedProvider::new(live());
        cached.initialize().expect("init");
        assert!(cached.airport_by_icao("KBOS").is_some());
        assert!(cached.airport_by_icao("KBOS").is_some());
        assert!(cached.navaid_by_id("NOPE").is_none());
        assert_eq!(cached.cached_entries(), 2);
        let nearest = cached
            .nearest_airport(GeoPoint::new(42.36, -71.0))
            .expect("query")
            .expect("some airport");
        assert_eq!(nearest.airport.icao, "KBOS");
        cached.shutdown();
        assert_eq!(cached.cached_entries(), 0);
    }
}
