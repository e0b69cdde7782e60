//! Core data models for the navigation database and router.

use crate::spatial::GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of navigation fix a waypoint represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavaidKind {
    /// Named RNAV/intersection fix
    Fix,
    Vor,
    Ndb,
    Dme,
    Tacan,
    Airport,
    /// Co-located navaids (VOR/DME, VORTAC)
    Compound,
}

impl NavaidKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "fix" | "wpt" | "intersection" => Some(Self::Fix),
            "vor" => Some(Self::Vor),
            "ndb" => Some(Self::Ndb),
            "dme" => Some(Self::Dme),
            "tacan" => Some(Self::Tacan),
            "airport" | "apt" => Some(Self::Airport),
            "compound" | "vordme" | "vor-dme" | "vortac" => Some(Self::Compound),
            _ => None,
        }
    }

    /// Radio navaids, as opposed to fixes and airports.
    pub fn is_navaid(self) -> bool {
        !matches!(self, Self::Fix | Self::Airport)
    }
}

impl fmt::Display for NavaidKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fix => "FIX",
            Self::Vor => "VOR",
            Self::Ndb => "NDB",
            Self::Dme => "DME",
            Self::Tacan => "TACAN",
            Self::Airport => "AIRPORT",
            Self::Compound => "VOR/DME",
        };
        f.write_str(name)
    }
}

/// A named geographic fix. Immutable once inserted into the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Feet MSL, when published
    #[serde(default)]
    pub elevation_ft: Option<f64>,
    pub kind: NavaidKind,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64, kind: NavaidKind) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
            elevation_ft: None,
            kind,
        }
    }

    pub fn with_elevation(mut self, elevation_ft: f64) -> Self {
        self.elevation_ft = Some(elevation_ft);
        self
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AirwayDirection {
    /// Legs may only be flown in sequence order
    Unidirectional,
    #[default]
    Bidirectional,
}

/// A published corridor: an ordered sequence of waypoint names and an altitude band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airway {
    pub name: String,
    pub waypoints: Vec<String>,
    pub min_altitude_ft: f64,
    pub max_altitude_ft: f64,
    #[serde(default)]
    pub direction: AirwayDirection,
}

impl Airway {
    pub fn new(
        name: impl Into<String>,
        waypoints: &[&str],
        min_altitude_ft: f64,
        max_altitude_ft: f64,
    ) -> Self {
        Self {
            name: name.into(),
            waypoints: waypoints.iter().map(|w| w.to_string()).collect(),
            min_altitude_ft,
            max_altitude_ft,
            direction: AirwayDirection::Bidirectional,
        }
    }

    pub fn one_way(mut self) -> Self {
        self.direction = AirwayDirection::Unidirectional;
        self
    }

    /// Inclusive altitude band check.
    pub fn covers_altitude(&self, altitude_ft: f64) -> bool {
        altitude_ft.is_finite()
            && altitude_ft >= self.min_altitude_ft
            && altitude_ft <= self.max_altitude_ft
    }

    pub fn contains(&self, waypoint: &str) -> bool {
        self.waypoints.iter().any(|name| name == waypoint)
    }

    /// True when `from` and `to` are adjacent entries that may be flown in
    /// that order.
    pub fn has_leg(&self, from: &str, to: &str) -> bool {
        self.waypoints.windows(2).any(|pair| {
            (pair[0] == from && pair[1] == to)
                || (self.direction == AirwayDirection::Bidirectional
                    && pair[0] == to
                    && pair[1] == from)
        })
    }

    /// Waypoints reachable in one leg from `from` along this airway.
    pub fn neighbors_of<'a>(&'a self, from: &str) -> Vec<&'a str> {
        let mut out = Vec::new();
        for (idx, name) in self.waypoints.iter().enumerate() {
            if name != from {
                continue;
            }
            if let Some(next) = self.waypoints.get(idx + 1) {
                out.push(next.as_str());
            }
            if self.direction == AirwayDirection::Bidirectional && idx > 0 {
                out.push(self.waypoints[idx - 1].as_str());
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureKind {
    Sid,
    Star,
    Approach,
}

impl fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sid => "SID",
            Self::Star => "STAR",
            Self::Approach => "approach",
        };
        f.write_str(name)
    }
}

/// Published altitude restriction at a procedure fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AltitudeConstraint {
    At { altitude_ft: f64 },
    AtOrAbove { altitude_ft: f64 },
    AtOrBelow { altitude_ft: f64 },
    Between { min_ft: f64, max_ft: f64 },
}

impl AltitudeConstraint {
    pub fn admits(&self, altitude_ft: f64) -> bool {
        match *self {
            Self::At { altitude_ft: at } => (altitude_ft - at).abs() < 1.0,
            Self::AtOrAbove { altitude_ft: min } => altitude_ft >= min,
            Self::AtOrBelow { altitude_ft: max } => altitude_ft <= max,
            Self::Between { min_ft, max_ft } => altitude_ft >= min_ft && altitude_ft <= max_ft,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureFix {
    pub name: String,
    #[serde(default)]
    pub constraint: Option<AltitudeConstraint>,
}

impl ProcedureFix {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
        }
    }

    pub fn with_constraint(mut self, constraint: AltitudeConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

/// SID, STAR or approach, keyed by (airport, runway, name).
///
/// The router treats procedures as opaque sub-paths; callers splice them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub kind: ProcedureKind,
    pub airport: String,
    pub runway: String,
    pub name: String,
    pub fixes: Vec<ProcedureFix>,
    #[serde(default)]
    pub transition: Option<String>,
    /// Approach type (ILS, RNAV, VOR, ...); unused for SIDs and STARs.
    #[serde(default)]
    pub approach_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub icao: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub elevation_ft: f64,
}

impl Airport {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// One leg of a planned route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub from: String,
    pub to: String,
    /// `None` for a direct leg
    pub airway: Option<String>,
    pub distance_nm: f64,
    /// Initial true heading
    pub heading_deg: f64,
    pub min_altitude_ft: f64,
    pub max_altitude_ft: f64,
    pub time_min: f64,
    pub fuel_lb: f64,
}

impl RouteSegment {
    pub fn is_direct(&self) -> bool {
        self.airway.is_none()
    }

    pub fn covers_altitude(&self, altitude_ft: f64) -> bool {
        altitude_ft >= self.min_altitude_ft && altitude_ft <= self.max_altitude_ft
    }
}

/// Ordered segment list produced by the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub segments: Vec<RouteSegment>,
    pub cruise_altitude_ft: f64,
    pub total_distance_nm: f64,
    pub total_time_min: f64,
    pub total_fuel_lb: f64,
    /// Search cost including airway bonuses and direct penalties
    pub cost: f64,
    pub nodes_visited: usize,
}

impl Route {
    pub fn from_segments(segments: Vec<RouteSegment>, cruise_altitude_ft: f64, cost: f64) -> Self {
        let total_distance_nm = segments.iter().map(|s| s.distance_nm).sum();
        let total_time_min = segments.iter().map(|s| s.time_min).sum();
        let total_fuel_lb = segments.iter().map(|s| s.fuel_lb).sum();
        Self {
            segments,
            cruise_altitude_ft,
            total_distance_nm,
            total_time_min,
            total_fuel_lb,
            cost,
            nodes_visited: 0,
        }
    }

    pub fn origin(&self) -> Option<&str> {
        self.segments.first().map(|s| s.from.as_str())
    }

    pub fn destination(&self) -> Option<&str> {
        self.segments.last().map(|s| s.to.as_str())
    }

    /// Ordered waypoint names including origin and destination.
    pub fn waypoint_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.segments.len() + 1);
        if let Some(first) = self.segments.first() {
            names.push(first.from.clone());
        }
        names.extend(self.segments.iter().map(|s| s.to.clone()));
        names
    }

    pub fn same_path(&self, other: &Route) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.from == b.from && a.to == b.to && a.airway == b.airway)
    }
}

/// Analytics for a planned route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteQuality {
    pub total_distance_nm: f64,
    /// Great-circle distance between origin and destination
    pub direct_distance_nm: f64,
    pub estimated_time_min: f64,
    pub fuel_lb: f64,
    pub altitude_violations: usize,
    pub turn_restrictions: usize,
    /// 0 is ideal, 1 is worst
    pub cost_index: f64,
}
