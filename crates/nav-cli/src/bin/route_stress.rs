//! Fire random airport-to-airport route queries at the router and report
//! timing and outcomes.

use anyhow::Result;
use clap::Parser;
use nav_cli::{init_tracing, Config};
use nav_core::{AirwayRouter, NavError, NavaidKind};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Queries per thread
    #[arg(long, default_value_t = 200)]
    queries: usize,

    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Cruise altitudes are drawn from [min, max] in 1000 ft steps
    #[arg(long, default_value_t = 5000.0)]
    min_altitude: f64,

    #[arg(long, default_value_t = 41000.0)]
    max_altitude: f64,
}

#[derive(Debug, Default)]
struct Tally {
    ok: usize,
    no_route: usize,
    failed: usize,
    total_time: Duration,
    slowest: Duration,
    max_nodes: usize,
    total_distance_nm: f64,
}

impl Tally {
    fn merge(&mut self, other: Tally) {
        self.ok += other.ok;
        self.no_route += other.no_route;
        self.failed += other.failed;
        self.total_time += other.total_time;
        self.slowest = self.slowest.max(other.slowest);
        self.max_nodes = self.max_nodes.max(other.max_nodes);
        self.total_distance_nm += other.total_distance_nm;
    }
}

fn run_queries(router: &AirwayRouter, airports: &[String], args: &Args) -> Tally {
    let mut rng = rand::rng();
    let mut tally = Tally::default();
    let steps = ((args.max_altitude - args.min_altitude) / 1000.0).floor().max(0.0) as u32;

    for _ in 0..args.queries {
        let origin = &airports[rng.random_range(0..airports.len())];
        let destination = &airports[rng.random_range(0..airports.len())];
        if origin == destination {
            continue;
        }
        let altitude = args.min_altitude + 1000.0 * rng.random_range(0..=steps) as f64;

        let started = Instant::now();
        let result = router.find_optimal_route(origin, destination, altitude);
        let elapsed = started.elapsed();
        tally.total_time += elapsed;
        tally.slowest = tally.slowest.max(elapsed);

        match result {
            Ok(route) => {
                tally.ok += 1;
                tally.max_nodes = tally.max_nodes.max(route.nodes_visited);
                tally.total_distance_nm += route.total_distance_nm;
            }
            Err(NavError::NoRoute { .. }) => tally.no_route += 1,
            Err(err) => {
                tracing::warn!(%origin, %destination, altitude, "Query failed: {}", err);
                tally.failed += 1;
            }
        }
    }
    tally
}

fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();
    let config = Config::from_env();
    let db = Arc::new(config.open_database()?);

    let airports: Vec<String> = db
        .get_waypoints_by_type(NavaidKind::Airport)
        .into_iter()
        .map(|w| w.name)
        .collect();
    if airports.len() < 2 {
        anyhow::bail!("dataset has fewer than 2 airports");
    }
    let router = AirwayRouter::new(db, config.router.clone());

    println!(
        "Running {} queries on {} threads over {} airports...",
        args.queries * args.threads.max(1),
        args.threads.max(1),
        airports.len()
    );
    let started = Instant::now();
    let mut tally = Tally::default();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..args.threads.max(1))
            .map(|_| scope.spawn(|| run_queries(&router, &airports, &args)))
            .collect();
        for handle in handles {
            match handle.join() {
                Ok(part) => tally.merge(part),
                Err(_) => tracing::error!("Stress worker panicked"),
            }
        }
    });
    let wall = started.elapsed();

    let answered = tally.ok + tally.no_route + tally.failed;
    println!(
        "Result: ok={} no_route={} failed={} | wall={:.2}s",
        tally.ok,
        tally.no_route,
        tally.failed,
        wall.as_secs_f64()
    );
    if answered > 0 {
        println!(
            "Latency: avg={:.3}ms slowest={:.3}ms | max_nodes={}",
            tally.total_time.as_secs_f64() * 1000.0 / answered as f64,
            tally.slowest.as_secs_f64() * 1000.0,
            tally.max_nodes
        );
    }
    if tally.ok > 0 {
        println!(
            "Average route length: {:.1} NM",
            tally.total_distance_nm / tally.ok as f64
        );
    }
    Ok(())
}
