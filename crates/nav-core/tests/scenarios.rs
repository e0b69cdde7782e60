//! End-to-end navigation scenarios against the embedded dataset and small
//! hand-built datasets.

use nav_core::{
    format_route, parse_route, Airway, AirwayRouter, NavDatabase, NavDatabaseConfig, NavDataset,
    NavError, NavaidKind, RouterConfig, ValidationErrorKind, Waypoint,
};
use std::sync::Arc;

fn embedded_db() -> NavDatabase {
    NavDatabase::embedded(NavDatabaseConfig::default()).expect("embedded dataset is consistent")
}

fn router(config: RouterConfig) -> AirwayRouter {
    AirwayRouter::new(Arc::new(embedded_db()), config)
}

/// Origin and destination joined by three airways through different fixes.
fn three_path_db() -> NavDatabase {
    let dataset = NavDataset {
        waypoints: vec![
            Waypoint::new("ORIGN", 10.0, 10.0, NavaidKind::Fix),
            Waypoint::new("DESTN", 10.0, 12.0, NavaidKind::Fix),
            Waypoint::new("ALPHA", 10.0, 11.0, NavaidKind::Fix),
            Waypoint::new("BRAVO", 10.5, 11.0, NavaidKind::Fix),
            Waypoint::new("CHRLY", 11.0, 11.0, NavaidKind::Fix),
        ],
        airways: vec![
            Airway::new("J1", &["ORIGN", "ALPHA", "DESTN"], 18000.0, 45000.0),
            Airway::new("J2", &["ORIGN", "BRAVO", "DESTN"], 18000.0, 45000.0),
            Airway::new("J3", &["ORIGN", "CHRLY", "DESTN"], 18000.0, 45000.0),
        ],
        ..NavDataset::default()
    };
    NavDatabase::from_dataset(dataset, NavDatabaseConfig::default()).expect("consistent dataset")
}

fn airway_only_config() -> RouterConfig {
    RouterConfig {
        // no direct neighbours, and the origin-destination leg is too long
        max_direct_step_nm: 0.0,
        max_search_distance_nm: 100.0,
        ..RouterConfig::default()
    }
}

/// J121 carries KJFK to KBOS at cruise.
#[test]
fn route_exists_via_airway() {
    let db = embedded_db();
    let names = db.find_route("KJFK", "KBOS", 35000.0).expect("route");
    assert_eq!(names, vec!["KJFK", "WP1", "KBOS"]);

    let direct = db.calculate_distance("KJFK", "KBOS").expect("distance");
    let router = AirwayRouter::new(Arc::new(db), RouterConfig::default());
    let route = router
        .find_optimal_route("KJFK", "KBOS", 35000.0)
        .expect("route");
    assert_eq!(route.origin(), Some("KJFK"));
    assert_eq!(route.destination(), Some("KBOS"));
    assert!((route.total_distance_nm - direct).abs() / direct < 0.01);
    assert!(route.segments.iter().all(|s| s.airway.as_deref() == Some("J121")));
}

/// Three airway paths give exactly three alternatives, shortest first.
#[test]
fn alternative_routes_count() {
    let router = AirwayRouter::new(Arc::new(three_path_db()), airway_only_config());

    let routes = router
        .find_alternate_routes("ORIGN", "DESTN", 35000.0, 3)
        .expect("routes");
    assert_eq!(routes.len(), 3);
    assert!(routes
        .windows(2)
        .all(|w| w[0].total_distance_nm <= w[1].total_distance_nm));
    let via: Vec<String> = routes.iter().map(|r| r.waypoint_names()[1].clone()).collect();
    assert_eq!(via, vec!["ALPHA", "BRAVO", "CHRLY"]);

    // asking for more does not invent paths
    let more = router
        .find_alternate_routes("ORIGN", "DESTN", 35000.0, 5)
        .expect("routes");
    assert_eq!(more.len(), 3);
}

/// The preferred-airway bonus pulls the route onto a path up to 15% longer,
/// and no further.
#[test]
fn preferred_airway_changes_the_path() {
    let router = AirwayRouter::new(Arc::new(three_path_db()), airway_only_config());

    let optimal = router
        .find_optimal_route("ORIGN", "DESTN", 35000.0)
        .expect("route");
    assert_eq!(optimal.waypoint_names(), vec!["ORIGN", "ALPHA", "DESTN"]);

    // J2 is about 12% longer than J1
    let preferred = router
        .find_preferred_route("ORIGN", "DESTN", 35000.0, &["J2"])
        .expect("route");
    assert_eq!(preferred.waypoint_names(), vec!["ORIGN", "BRAVO", "DESTN"]);
    assert!(preferred
        .segments
        .iter()
        .all(|s| s.airway.as_deref() == Some("J2")));
    assert!(preferred.total_distance_nm > optimal.total_distance_nm);

    // J3 is about 42% longer, beyond what the bonus can buy
    let too_long = router
        .find_preferred_route("ORIGN", "DESTN", 35000.0, &["j3"])
        .expect("route");
    assert_eq!(too_long.waypoint_names(), vec!["ORIGN", "ALPHA", "DESTN"]);
}

/// A preferred search fails exactly where the optimal one does.
#[test]
fn preferred_route_without_path_is_no_route() {
    let router = AirwayRouter::new(Arc::new(three_path_db()), airway_only_config());
    assert!(matches!(
        router.find_preferred_route("ORIGN", "DESTN", 5000.0, &["J1"]),
        Err(NavError::NoRoute { .. })
    ));
}

/// A low cruise altitude on a jet route names the first offending leg.
#[test]
fn altitude_violation() {
    let db = embedded_db();
    let err = db
        .validate_flight_plan(&["KJFK", "WP1", "KBOS"], 5000.0)
        .unwrap_err();
    match err {
        NavError::Validation(violation) => {
            assert_eq!(violation.kind, ValidationErrorKind::AltitudeViolation);
            assert_eq!(violation.field, "segments[0]");
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

/// The second occurrence of a repeated waypoint is reported.
#[test]
fn duplicate_waypoint() {
    let db = embedded_db();
    let err = db
        .validate_flight_plan(&["KJFK", "WP1", "WP1", "KBOS"], 35000.0)
        .unwrap_err();
    assert_eq!(err.validation_kind(), Some(ValidationErrorKind::DuplicateWaypoint));
    match err {
        NavError::Validation(violation) => assert_eq!(violation.field, "waypoints[2]"),
        other => panic!("expected a validation error, got {other:?}"),
    }
}

/// Nearby results include the centre fix, sorted and bounded by the radius.
#[test]
fn spatial_near_query() {
    let db = embedded_db();
    let nearby = db
        .get_waypoints_nearby(40.6413, -73.7781, 50.0)
        .expect("nearby");
    assert!(nearby.iter().any(|n| n.waypoint.name == "KJFK"));
    assert!(nearby
        .windows(2)
        .all(|w| w[0].distance_nm <= w[1].distance_nm));
    assert!(nearby.iter().all(|n| n.distance_nm <= 50.0));
    assert_eq!(nearby[0].waypoint.name, "KJFK");
}

/// Every airway listed for a waypoint contains it, and every airway entry
/// is listed for its waypoint.
#[test]
fn reverse_index_is_inverse_of_airways() {
    let db = embedded_db();
    for airway in NavDataset::embedded().airways {
        for waypoint in &airway.waypoints {
            assert!(db.get_airways_for_waypoint(waypoint).contains(&airway.name));
        }
    }
    for waypoint in NavDataset::embedded().waypoints {
        for name in db.get_airways_for_waypoint(&waypoint.name) {
            let airway = db.get_airway(&name).expect("listed airway exists");
            assert!(airway.waypoints.contains(&waypoint.name));
        }
    }
}

#[test]
fn distance_is_symmetric() {
    let db = embedded_db();
    for (a, b) in [("KJFK", "KBOS"), ("SAX", "ALB"), ("KDCA", "KPWM")] {
        let there = db.calculate_distance(a, b).expect("distance");
        let back = db.calculate_distance(b, a).expect("distance");
        assert!((there - back).abs() < 1e-9);
    }
    assert_eq!(db.calculate_distance("KJFK", "KJFK").expect("distance"), 0.0);
}

/// Route totals are the sum of their legs, and the formatted route parses back.
#[test]
fn route_totals_and_formatting() {
    let router = router(RouterConfig::default());
    let route = router
        .find_optimal_route("KPHL", "KALB", 35000.0)
        .expect("route");
    let sum: f64 = route.segments.iter().map(|s| s.distance_nm).sum();
    assert!((route.total_distance_nm - sum).abs() < 1e-6);
    for pair in route.segments.windows(2) {
        assert_eq!(pair[0].to, pair[1].from);
    }

    let text = format_route(&route);
    assert_eq!(parse_route(&text).expect("parse"), route.waypoint_names());
}

#[test]
fn validation_is_repeatable() {
    let db = embedded_db();
    let plan = ["KJFK", "WP1", "KBOS"];
    for altitude in [35000.0, 5000.0] {
        let first = db.validate_flight_plan(&plan, altitude);
        let second = db.validate_flight_plan(&plan, altitude);
        assert_eq!(first.is_ok(), second.is_ok());
        assert_eq!(
            first.err().and_then(|e| e.validation_kind()),
            second.err().and_then(|e| e.validation_kind())
        );
    }
    assert!(db.validate_flight_plan(&plan, 35000.0).is_ok());
}

/// A single-altitude airway is flyable at exactly that altitude.
#[test]
fn degenerate_altitude_band() {
    let dataset = NavDataset {
        waypoints: vec![
            Waypoint::new("AAA", 30.0, -90.0, NavaidKind::Vor),
            Waypoint::new("BBB", 30.5, -90.5, NavaidKind::Vor),
        ],
        airways: vec![Airway::new("V10", &["AAA", "BBB"], 10000.0, 10000.0)],
        ..NavDataset::default()
    };
    let db = NavDatabase::from_dataset(dataset, NavDatabaseConfig::default()).expect("db");
    assert_eq!(db.get_airways_by_altitude(10000.0), vec!["V10"]);
    assert!(db.get_airways_by_altitude(10000.5).is_empty());
    assert_eq!(db.find_route("AAA", "BBB", 10000.0).expect("route"), vec!["AAA", "BBB"]);
    assert!(matches!(
        db.find_route("AAA", "BBB", 9999.0),
        Err(NavError::NoRoute { .. })
    ));
}

#[test]
fn zero_alternatives_is_empty() {
    let router = router(RouterConfig::default());
    let routes = router
        .find_alternate_routes("KJFK", "KBOS", 35000.0, 0)
        .expect("routes");
    assert!(routes.is_empty());
}

#[test]
fn same_origin_and_destination_is_rejected() {
    let router = router(RouterConfig::default());
    assert!(matches!(
        router.find_optimal_route("KJFK", "KJFK", 35000.0),
        Err(NavError::InvalidInput { .. })
    ));
}

#[test]
fn unknown_endpoints_and_missing_links() {
    let db = embedded_db();
    assert!(matches!(
        db.find_route("KJFK", "ZZZZ", 35000.0),
        Err(NavError::NotFound(_))
    ));
    // KBOS is only on a jet route
    assert!(matches!(
        db.find_route("KJFK", "KBOS", 5000.0),
        Err(NavError::NoRoute { .. })
    ));
}

#[test]
fn coordinate_boundaries() {
    let db = embedded_db();
    assert!(db.get_waypoints_nearby(90.0, 180.0, 10.0).is_ok());
    assert!(db.get_waypoints_nearby(-90.0, -180.0, 10.0).is_ok());
    assert!(matches!(
        db.get_waypoints_nearby(90.000001, 0.0, 10.0),
        Err(NavError::InvalidInput { .. })
    ));
    assert!(matches!(
        db.get_waypoints_nearby(0.0, -180.000001, 10.0),
        Err(NavError::InvalidInput { .. })
    ));
}

/// Concurrent route queries against one store agree.
#[test]
fn concurrent_queries_agree() {
    let db = Arc::new(embedded_db());
    let expected = db.find_route("KJFK", "KBOS", 35000.0).expect("route");
    std::thread::scope(|scope| {
        for _ in 0..4 {
            let db = Arc::clone(&db);
            let expected = expected.clone();
            scope.spawn(move || {
                for _ in 0..20 {
                    db.invalidate_cache();
                    assert_eq!(db.find_route("KJFK", "KBOS", 35000.0).expect("route"), expected);
                }
            });
        }
    });
}
