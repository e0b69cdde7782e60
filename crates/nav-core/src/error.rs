//! Error taxonomy shared by the navigation core and the terrain service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result alias used across the navigation core.
pub type NavResult<T> = Result<T, NavError>;

/// Errors surfaced by store queries, routing, validation and elevation lookups.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NavError {
    /// A coordinate, altitude, heading or speed failed a finite/range check.
    #[error("invalid {field}: {message}")]
    InvalidInput { field: String, message: String },
    /// A named waypoint, airway, procedure or airport is absent.
    #[error("not found: {0}")]
    NotFound(String),
    /// The router exhausted its frontier.
    #[error("no route from {origin} to {destination}")]
    NoRoute { origin: String, destination: String },
    /// A terrain tile could not be opened or read.
    #[error("io error: {0}")]
    Io(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Only produced by the diagnostic consistency API and dataset loading.
    #[error("consistency violation: {0}")]
    ConsistencyViolation(String),
}

impl NavError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn no_route(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self::NoRoute {
            origin: origin.into(),
            destination: destination.into(),
        }
    }

    /// Validation kind when this is a validator failure.
    pub fn validation_kind(&self) -> Option<ValidationErrorKind> {
        match self {
            Self::Validation(err) => Some(err.kind),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NavError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Specific flight-plan validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    InvalidLatitude,
    InvalidLongitude,
    InvalidAltitude,
    InvalidSpeed,
    InvalidWaypoint,
    EmptyFlightplan,
    DuplicateWaypoint,
    InvalidHeading,
    Unresolvable,
    Disconnected,
    AltitudeViolation,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidLatitude => "invalid latitude",
            Self::InvalidLongitude => "invalid longitude",
            Self::InvalidAltitude => "invalid altitude",
            Self::InvalidSpeed => "invalid speed",
            Self::InvalidWaypoint => "invalid waypoint",
            Self::EmptyFlightplan => "empty flight plan",
            Self::DuplicateWaypoint => "duplicate waypoint",
            Self::InvalidHeading => "invalid heading",
            Self::Unresolvable => "unresolvable waypoint",
            Self::Disconnected => "disconnected route",
            Self::AltitudeViolation => "altitude violation",
        };
        f.write_str(name)
    }
}

/// A validator verdict naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind} at {field}: {message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    /// Offending field, e.g. `cruise_altitude_ft` or `waypoints[2]`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(
        kind: ValidationErrorKind,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }
}
