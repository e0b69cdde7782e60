pub mod cache;
pub mod error;
pub mod models;
pub mod navdb;
pub mod provider;
pub mod router;
pub mod spatial;
pub mod validator;

pub use cache::{CacheStats, QueryCache};
pub use error::{NavError, NavResult, ValidationError, ValidationErrorKind};
pub use models::{
    Airport, Airway, AirwayDirection, AltitudeConstraint, NavaidKind, Procedure, ProcedureFix,
    ProcedureKind, Route, RouteQuality, RouteSegment, Waypoint,
};
pub use navdb::{
    DatabaseStats, NavDatabase, NavDatabaseConfig, NavDataset, NearbyAirport, NearbyWaypoint,
};
pub use provider::{CachedProvider, DatabaseProvider, NavDataProvider};
pub use router::{
    format_altitude, format_route, format_route_for_filing, parse_route, AirwayRouter,
    RouterConfig,
};
pub use spatial::{haversine_distance_nm, initial_bearing_deg, BoundingBox, GeoPoint};
pub use validator::{FlightPlan, PlanEntry, ValidationRules};
