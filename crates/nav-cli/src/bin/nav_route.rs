//! Plan a route between two waypoints and print it with its analysis and
//! filing string.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use nav_cli::{init_tracing, Config};
use nav_core::{format_route, format_route_for_filing, AirwayRouter, Route};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Cheapest route
    Optimal,
    /// Cheapest route with a bonus on the airways given by --prefer
    Preferred,
    /// Up to --count loopless routes in cost order
    Alternates,
    /// Single great-circle leg
    Direct,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Origin waypoint or airport
    origin: String,

    /// Destination waypoint or airport
    destination: String,

    /// Cruise altitude in feet
    #[arg(long, default_value_t = 35000.0)]
    altitude: f64,

    #[arg(long, value_enum, default_value = "optimal")]
    mode: Mode,

    /// Preferred airways, comma separated
    #[arg(long, value_delimiter = ',')]
    prefer: Vec<String>,

    /// Number of alternates to request
    #[arg(long, default_value_t = 3)]
    count: usize,

    /// Print routes as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();
    let config = Config::from_env();
    let db = Arc::new(config.open_database()?);
    let router = AirwayRouter::new(db, config.router.clone());

    let (origin, destination, altitude) = (&args.origin, &args.destination, args.altitude);
    let routes: Vec<Route> = match args.mode {
        Mode::Optimal => vec![router.find_optimal_route(origin, destination, altitude)?],
        Mode::Preferred => {
            let preferred: Vec<&str> = args.prefer.iter().map(String::as_str).collect();
            vec![router.find_preferred_route(origin, destination, altitude, &preferred)?]
        }
        Mode::Alternates => {
            router.find_alternate_routes(origin, destination, altitude, args.count)?
        }
        Mode::Direct => vec![router.direct_route(origin, destination, altitude)?],
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&routes)?);
        return Ok(());
    }

    for (idx, route) in routes.iter().enumerate() {
        let quality = router.analyze_route(route);
        if routes.len() > 1 {
            println!("=== Route {} ===", idx + 1);
        }
        println!("{}", format_route(route));
        println!("Filing: {}", format_route_for_filing(route));
        println!(
            "Distance: {:.1} NM (direct {:.1} NM) | Time: {:.0} min | Fuel: {:.0} lb",
            quality.total_distance_nm,
            quality.direct_distance_nm,
            quality.estimated_time_min,
            quality.fuel_lb
        );
        println!(
            "Cost index: {:.3} | Altitude violations: {} | Sharp turns: {} | Nodes: {}",
            quality.cost_index,
            quality.altitude_violations,
            quality.turn_restrictions,
            route.nodes_visited
        );
        for segment in &route.segments {
            println!(
                "  {:>6} -> {:<6} {:<6} {:>6.1} NM  hdg {:03.0}  [{:.0}-{:.0} ft]",
                segment.from,
                segment.to,
                segment.airway.as_deref().unwrap_or("DCT"),
                segment.distance_nm,
                segment.heading_deg,
                segment.min_altitude_ft,
                segment.max_altitude_ft
            );
        }
    }
    Ok(())
}
