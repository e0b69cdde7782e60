//! Flight-plan validation.
//!
//! Checks run in a fixed order and the first failure is reported:
//! coordinates, cruise altitude, heading, speed, plan length, empty
//! identifiers, duplicates, resolvability, connectivity, then airway altitude
//! conflicts.

use crate::error::{ValidationError, ValidationErrorKind};
use crate::navdb::NavDatabase;
use crate::spatial::{
    is_valid_latitude, is_valid_longitude, GeoPoint, MAX_ALTITUDE_FT, MIN_ALTITUDE_FT,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Limits applied by the validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Longest leg accepted without a shared airway
    pub max_direct_leg_nm: f64,
    pub min_altitude_ft: f64,
    pub max_altitude_ft: f64,
    pub max_speed_kn: f64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_direct_leg_nm: 250.0,
            min_altitude_ft: MIN_ALTITUDE_FT,
            max_altitude_ft: MAX_ALTITUDE_FT,
            max_speed_kn: 1000.0,
        }
    }
}

/// One waypoint reference in a submitted plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub name: String,
    /// User-defined position; overrides the stored one when set
    #[serde(default)]
    pub position: Option<GeoPoint>,
    #[serde(default)]
    pub heading_deg: Option<f64>,
    #[serde(default)]
    pub speed_kn: Option<f64>,
}

impl PlanEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
            heading_deg: None,
            speed_kn: None,
        }
    }

    pub fn at(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            position: Some(GeoPoint::new(lat, lon)),
            ..Self::named(name)
        }
    }

    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.heading_deg = Some(heading_deg);
        self
    }

    pub fn with_speed(mut self, speed_kn: f64) -> Self {
        self.speed_kn = Some(speed_kn);
        self
    }
}

/// A submitted plan: ordered references plus a cruise altitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightPlan {
    pub entries: Vec<PlanEntry>,
    pub cruise_altitude_ft: f64,
}

impl FlightPlan {
    pub fn new(entries: Vec<PlanEntry>, cruise_altitude_ft: f64) -> Self {
        Self {
            entries,
            cruise_altitude_ft,
        }
    }

    pub fn from_names<S: AsRef<str>>(names: &[S], cruise_altitude_ft: f64) -> Self {
        Self::new(
            names
                .iter()
                .map(|name| PlanEntry::named(name.as_ref()))
                .collect(),
            cruise_altitude_ft,
        )
    }
}

fn fail(
    kind: ValidationErrorKind,
    field: impl Into<String>,
    message: impl Into<String>,
) -> Result<(), ValidationError> {
    Err(ValidationError::new(kind, field, message))
}

/// Validate a plan against the store. Pure: repeated calls give the same verdict.
pub fn validate_flight_plan(
    db: &NavDatabase,
    plan: &FlightPlan,
    rules: &ValidationRules,
) -> Result<(), ValidationError> {
    check_coordinates(plan)?;
    check_cruise_altitude(plan, rules)?;
    check_headings(plan)?;
    check_speeds(plan, rules)?;

    if plan.entries.len() < 2 {
        return fail(
            ValidationErrorKind::EmptyFlightplan,
            "waypoints",
            format!(
                "flight plan needs at least 2 waypoints, got {}",
                plan.entries.len()
            ),
        );
    }

    for (idx, entry) in plan.entries.iter().enumerate() {
        if entry.name.trim().is_empty() {
            return fail(
                ValidationErrorKind::InvalidWaypoint,
                format!("waypoints[{idx}]"),
                "waypoint identifier is empty",
            );
        }
    }

    let mut seen = HashSet::new();
    for (idx, entry) in plan.entries.iter().enumerate() {
        let name = entry.name.trim().to_ascii_uppercase();
        if !seen.insert(name.clone()) {
            return fail(
                ValidationErrorKind::DuplicateWaypoint,
                format!("waypoints[{idx}]"),
                format!("waypoint {name} appears more than once"),
            );
        }
    }

    let mut points = Vec::with_capacity(plan.entries.len());
    for (idx, entry) in plan.entries.iter().enumerate() {
        let position = match (entry.position, db.get_waypoint(&entry.name)) {
            (Some(position), _) => position,
            (None, Some(waypoint)) => waypoint.position(),
            (None, None) => {
                return fail(
                    ValidationErrorKind::Unresolvable,
                    format!("waypoints[{idx}]"),
                    format!("waypoint {} is not in the navigation database", entry.name),
                );
            }
        };
        points.push(position);
    }

    let altitude = plan.cruise_altitude_ft;
    for (idx, pair) in plan.entries.windows(2).enumerate() {
        let (from, to) = (&pair[0].name, &pair[1].name);
        let airways = db.airways_for_leg(from, to);
        if airways.iter().any(|airway| airway.covers_altitude(altitude)) {
            continue;
        }
        let distance = points[idx].distance_nm(&points[idx + 1]);
        if distance > rules.max_direct_leg_nm {
            return fail(
                ValidationErrorKind::Disconnected,
                format!("segments[{idx}]"),
                format!(
                    "{from} -> {to} is {distance:.1} NM with no airway at {altitude:.0} ft (direct limit {:.0} NM)",
                    rules.max_direct_leg_nm
                ),
            );
        }
    }

    for (idx, pair) in plan.entries.windows(2).enumerate() {
        let (from, to) = (&pair[0].name, &pair[1].name);
        let airways = db.airways_for_leg(from, to);
        if airways.is_empty() || airways.iter().any(|airway| airway.covers_altitude(altitude)) {
            continue;
        }
        let bands: Vec<String> = airways
            .iter()
            .map(|airway| {
                format!(
                    "{} [{:.0}-{:.0}]",
                    airway.name, airway.min_altitude_ft, airway.max_altitude_ft
                )
            })
            .collect();
        return fail(
            ValidationErrorKind::AltitudeViolation,
            format!("segments[{idx}]"),
            format!(
                "{from} -> {to}: cruise altitude {altitude:.0} ft outside {}",
                bands.join(", ")
            ),
        );
    }

    Ok(())
}

fn check_coordinates(plan: &FlightPlan) -> Result<(), ValidationError> {
    for (idx, entry) in plan.entries.iter().enumerate() {
        let Some(position) = entry.position else {
            continue;
        };
        if !is_valid_latitude(position.lat) {
            return fail(
                ValidationErrorKind::InvalidLatitude,
                format!("waypoints[{idx}].lat"),
                format!("latitude {} outside [-90, 90]", position.lat),
            );
        }
        if !is_valid_longitude(position.lon) {
            return fail(
                ValidationErrorKind::InvalidLongitude,
                format!("waypoints[{idx}].lon"),
                format!("longitude {} outside [-180, 180]", position.lon),
            );
        }
    }
    Ok(())
}

fn check_cruise_altitude(plan: &FlightPlan, rules: &ValidationRules) -> Result<(), ValidationError> {
    let altitude = plan.cruise_altitude_ft;
    if !altitude.is_finite() || altitude < rules.min_altitude_ft || altitude > rules.max_altitude_ft
    {
        return fail(
            ValidationErrorKind::InvalidAltitude,
            "cruise_altitude_ft",
            format!(
                "cruise altitude {altitude} outside [{}, {}] ft",
                rules.min_altitude_ft, rules.max_altitude_ft
            ),
        );
    }
    Ok(())
}

fn check_headings(plan: &FlightPlan) -> Result<(), ValidationError> {
    for (idx, entry) in plan.entries.iter().enumerate() {
        let Some(heading) = entry.heading_deg else {
            continue;
        };
        if !heading.is_finite() || heading.fract() != 0.0 || !(0.0..360.0).contains(&heading) {
            return fail(
                ValidationErrorKind::InvalidHeading,
                format!("waypoints[{idx}].heading_deg"),
                format!("heading {heading} must be a whole number in [0, 360)"),
            );
        }
    }
    Ok(())
}

fn check_speeds(plan: &FlightPlan, rules: &ValidationRules) -> Result<(), ValidationError> {
    for (idx, entry) in plan.entries.iter().enumerate() {
        let Some(speed) = entry.speed_kn else {
            continue;
        };
        if !speed.is_finite() || speed <= 0.0 || speed > rules.max_speed_kn {
            return fail(
                ValidationErrorKind::InvalidSpeed,
                format!("waypoints[{idx}].speed_kn"),
                format!("speed {speed} outside (0, {}] kn", rules.max_speed_kn),
            );
        }
    }
    Ok(())
}
