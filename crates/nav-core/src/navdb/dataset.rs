//! Aeronautical tables compiled into the binary, plus the JSON loader that
//! accepts the same shape at runtime.

use crate::error::{NavError, NavResult};
use crate::models::{
    AltitudeConstraint, Airport, Airway, AirwayDirection, NavaidKind, Procedure, ProcedureFix,
    ProcedureKind, Waypoint,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raw tables a `NavDatabase` is built from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavDataset {
    #[serde(default)]
    pub airports: Vec<Airport>,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub airways: Vec<Airway>,
    #[serde(default)]
    pub procedures: Vec<Procedure>,
}

impl NavDataset {
    /// Northeast US dataset shipped with the binary.
    pub fn embedded() -> Self {
        let airports = AIRPORTS
            .iter()
            .map(|&(icao, name, lat, lon, elevation_ft)| Airport {
                icao: icao.to_string(),
                name: name.to_string(),
                lat,
                lon,
                elevation_ft,
            })
            .collect();

        let waypoints = WAYPOINTS
            .iter()
            .map(|&(name, lat, lon, kind)| Waypoint::new(name, lat, lon, kind))
            .collect();

        let airways = AIRWAYS
            .iter()
            .map(|&(name, sequence, min_ft, max_ft, direction)| Airway {
                name: name.to_string(),
                waypoints: sequence.iter().map(|w| w.to_string()).collect(),
                min_altitude_ft: min_ft,
                max_altitude_ft: max_ft,
                direction,
            })
            .collect();

        Self {
            airports,
            waypoints,
            airways,
            procedures: embedded_procedures(),
        }
    }

    pub fn from_json_str(json: &str) -> NavResult<Self> {
        serde_json::from_str(json)
            .map_err(|err| NavError::invalid_input("dataset", format!("malformed dataset: {err}")))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> NavResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|err| NavError::Io(format!("{}: {err}", path.display())))?;
        tracing::debug!(path = %path.display(), bytes = raw.len(), "Loading navigation dataset");
        Self::from_json_str(&raw)
    }
}

const AIRPORTS: &[(&str, &str, f64, f64, f64)] = &[
    ("KJFK", "John F Kennedy Intl", 40.6413, -73.7781, 13.0),
    ("KLGA", "LaGuardia", 40.7769, -73.8740, 21.0),
    ("KEWR", "Newark Liberty Intl", 40.6895, -74.1745, 18.0),
    ("KBOS", "Boston Logan Intl", 42.3656, -71.0096, 20.0),
    ("KPHL", "Philadelphia Intl", 39.8729, -75.2437, 36.0),
    ("KBWI", "Baltimore/Washington Intl", 39.1754, -76.6683, 146.0),
    ("KIAD", "Washington Dulles Intl", 38.9531, -77.4565, 313.0),
    ("KDCA", "Ronald Reagan Washington National", 38.8512, -77.0402, 15.0),
    ("KBDL", "Bradley Intl", 41.9389, -72.6832, 173.0),
    ("KPVD", "Rhode Island T F Green Intl", 41.7240, -71.4282, 55.0),
    ("KALB", "Albany Intl", 42.7483, -73.8017, 285.0),
    ("KSYR", "Syracuse Hancock Intl", 43.1112, -76.1063, 421.0),
    ("KPWM", "Portland Intl Jetport", 43.6462, -70.3093, 76.0),
    ("KACK", "Nantucket Memorial", 41.2531, -70.0602, 47.0),
];

const WAYPOINTS: &[(&str, f64, f64, NavaidKind)] = &[
    // VHF navaids
    ("CCC", 40.9297, -72.7989, NavaidKind::Compound),
    ("HTO", 40.9188, -72.3168, NavaidKind::Vor),
    ("ORW", 41.5562, -71.9993, NavaidKind::Vor),
    ("PVD", 41.7246, -71.4296, NavaidKind::Compound),
    ("BOS", 42.3574, -70.9895, NavaidKind::Compound),
    ("HFD", 41.6410, -72.5475, NavaidKind::Vor),
    ("BDR", 41.1606, -73.1243, NavaidKind::Vor),
    ("DPK", 40.7917, -73.3033, NavaidKind::Vor),
    ("SAX", 41.0676, -74.5382, NavaidKind::Compound),
    ("ENE", 43.4257, -70.6136, NavaidKind::Vor),
    ("ALB", 42.7472, -73.8033, NavaidKind::Compound),
    ("SYR", 43.1604, -76.2046, NavaidKind::Compound),
    ("PUT", 41.9560, -71.8441, NavaidKind::Vor),
    ("SEY", 41.1675, -71.5763, NavaidKind::Vor),
    ("MVY", 41.3960, -70.6120, NavaidKind::Vor),
    ("ACK", 41.2818, -70.0268, NavaidKind::Compound),
    ("ETX", 40.5811, -75.6825, NavaidKind::Compound),
    ("RBV", 40.2025, -74.4950, NavaidKind::Compound),
    ("PTW", 40.2222, -75.5600, NavaidKind::Compound),
    ("SBJ", 40.5830, -74.7420, NavaidKind::Vor),
    ("EMI", 39.4950, -76.9786, NavaidKind::Compound),
    ("BAL", 39.1710, -76.6613, NavaidKind::Compound),
    ("LRP", 40.1200, -76.2913, NavaidKind::Vor),
    ("ARD", 40.2536, -74.9076, NavaidKind::Vor),
    // NDB, DME, TACAN
    ("GON", 41.3300, -72.0450, NavaidKind::Ndb),
    ("DCA", 38.8594, -77.0363, NavaidKind::Dme),
    ("ADW", 38.8109, -76.8670, NavaidKind::Tacan),
    // RNAV fixes
    ("WP1", 41.5117, -72.4123, NavaidKind::Fix),
    ("MERIT", 41.3819, -73.1374, NavaidKind::Fix),
    ("CANDR", 40.6000, -73.5000, NavaidKind::Fix),
    ("DEEZZ", 40.5600, -72.9500, NavaidKind::Fix),
    ("PARCH", 40.9995, -72.1878, NavaidKind::Fix),
    ("ROBUC", 42.6000, -70.4000, NavaidKind::Fix),
    ("OOSHN", 42.2000, -70.1000, NavaidKind::Fix),
    ("BRONC", 42.2500, -71.1200, NavaidKind::Fix),
    ("ZALPO", 40.5500, -73.8600, NavaidKind::Fix),
];

const HIGH: (f64, f64) = (18000.0, 45000.0);
const LOW: (f64, f64) = (2000.0, 17999.0);

const AIRWAYS: &[(&str, &[&str], f64, f64, AirwayDirection)] = &[
    ("J121", &["KJFK", "WP1", "KBOS"], HIGH.0, HIGH.1, AirwayDirection::Bidirectional),
    ("J42", &["RBV", "SBJ", "SAX", "ALB"], HIGH.0, HIGH.1, AirwayDirection::Bidirectional),
    ("J75", &["EMI", "LRP", "ETX", "SAX"], HIGH.0, HIGH.1, AirwayDirection::Bidirectional),
    ("J6", &["BAL", "PTW", "ARD", "KJFK"], HIGH.0, HIGH.1, AirwayDirection::Bidirectional),
    ("J55", &["ALB", "BOS", "ENE"], HIGH.0, HIGH.1, AirwayDirection::Bidirectional),
    ("Q100", &["SYR", "ALB", "HFD"], HIGH.0, HIGH.1, AirwayDirection::Unidirectional),
    ("V16", &["KJFK", "DPK", "CCC", "HTO"], LOW.0, LOW.1, AirwayDirection::Bidirectional),
    ("V1", &["HTO", "SEY", "PVD", "BOS"], LOW.0, LOW.1, AirwayDirection::Bidirectional),
    ("V229", &["BDR", "HFD", "PUT", "BOS"], 3000.0, LOW.1, AirwayDirection::Bidirectional),
    ("V475", &["DPK", "BDR"], LOW.0, LOW.1, AirwayDirection::Bidirectional),
    ("V374", &["HTO", "GON", "ORW"], LOW.0, LOW.1, AirwayDirection::Bidirectional),
    ("V58", &["HFD", "ORW", "PVD"], LOW.0, LOW.1, AirwayDirection::Bidirectional),
    ("V34", &["KLGA", "BDR", "HFD", "KBDL"], LOW.0, LOW.1, AirwayDirection::Bidirectional),
    ("V146", &["KPVD", "PVD", "MVY", "ACK", "KACK"], LOW.0, LOW.1, AirwayDirection::Bidirectional),
    ("V3", &["KDCA", "DCA", "ADW", "BAL", "KBWI"], LOW.0, LOW.1, AirwayDirection::Bidirectional),
    ("V14", &["KPHL", "ARD", "RBV", "KEWR"], LOW.0, LOW.1, AirwayDirection::Bidirectional),
    ("V93", &["KIAD", "EMI"], LOW.0, LOW.1, AirwayDirection::Bidirectional),
    ("V2", &["KALB", "ALB"], LOW.0, LOW.1, AirwayDirection::Bidirectional),
    ("V130", &["KSYR", "SYR"], LOW.0, LOW.1, AirwayDirection::Bidirectional),
    ("V106", &["ENE", "KPWM"], LOW.0, LOW.1, AirwayDirection::Bidirectional),
];

fn fix(name: &str) -> ProcedureFix {
    ProcedureFix::new(name)
}

fn procedure(
    kind: ProcedureKind,
    airport: &str,
    runway: &str,
    name: &str,
    fixes: Vec<ProcedureFix>,
    transition: &str,
) -> Procedure {
    Procedure {
        kind,
        airport: airport.to_string(),
        runway: runway.to_string(),
        name: name.to_string(),
        fixes,
        transition: Some(transition.to_string()),
        approach_type: None,
    }
}

fn approach(
    airport: &str,
    runway: &str,
    name: &str,
    approach_type: &str,
    fixes: Vec<ProcedureFix>,
) -> Procedure {
    let transition = fixes.first().map(|f| f.name.clone());
    Procedure {
        kind: ProcedureKind::Approach,
        airport: airport.to_string(),
        runway: runway.to_string(),
        name: name.to_string(),
        fixes,
        transition,
        approach_type: Some(approach_type.to_string()),
    }
}

fn embedded_procedures() -> Vec<Procedure> {
    use AltitudeConstraint::*;
    use ProcedureKind::*;

    vec![
        procedure(
            Sid,
            "KJFK",
            "31L",
            "MERIT4",
            vec![
                fix("DPK").with_constraint(AtOrAbove { altitude_ft: 3000.0 }),
                fix("MERIT").with_constraint(AtOrAbove { altitude_ft: 8000.0 }),
            ],
            "MERIT",
        ),
        procedure(
            Sid,
            "KJFK",
            "04L",
            "DEEZZ5",
            vec![
                fix("CANDR").with_constraint(At { altitude_ft: 3000.0 }),
                fix("DEEZZ"),
            ],
            "DEEZZ",
        ),
        procedure(
            Sid,
            "KEWR",
            "22R",
            "NEWARK5",
            vec![fix("SBJ"), fix("SAX")],
            "SAX",
        ),
        procedure(
            Sid,
            "KBOS",
            "22R",
            "LOGAN9",
            vec![fix("BOS"), fix("PVD")],
            "PVD",
        ),
        procedure(
            Star,
            "KBOS",
            "04R",
            "ROBUC3",
            vec![
                fix("PUT").with_constraint(Between {
                    min_ft: 11000.0,
                    max_ft: 15000.0,
                }),
                fix("ROBUC").with_constraint(AtOrBelow { altitude_ft: 11000.0 }),
            ],
            "PUT",
        ),
        procedure(
            Star,
            "KBOS",
            "22L",
            "OOSHN5",
            vec![fix("OOSHN"), fix("ROBUC")],
            "OOSHN",
        ),
        procedure(
            Star,
            "KJFK",
            "13L",
            "PARCH3",
            vec![
                fix("ORW"),
                fix("PARCH").with_constraint(AtOrBelow { altitude_ft: 12000.0 }),
                fix("CCC"),
            ],
            "ORW",
        ),
        approach(
            "KBOS",
            "04R",
            "I04R",
            "ILS",
            vec![
                fix("BRONC").with_constraint(AtOrAbove { altitude_ft: 1800.0 }),
                fix("KBOS"),
            ],
        ),
        approach(
            "KBOS",
            "04R",
            "R04R",
            "RNAV",
            vec![fix("ROBUC"), fix("BRONC"), fix("KBOS")],
        ),
        approach(
            "KJFK",
            "04R",
            "I04R",
            "ILS",
            vec![
                fix("ZALPO").with_constraint(At { altitude_ft: 1500.0 }),
                fix("KJFK"),
            ],
        ),
        approach(
            "KJFK",
            "13L",
            "V13L",
            "VOR",
            vec![fix("DPK"), fix("KJFK")],
        ),
    ]
}
