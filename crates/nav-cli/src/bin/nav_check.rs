//! Check the navigation dataset and, optionally, validate a flight plan.

use anyhow::{bail, Result};
use clap::Parser;
use nav_cli::{init_tracing, Config};
use nav_core::FlightPlan;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Flight plan waypoints in order
    waypoints: Vec<String>,

    /// Cruise altitude in feet
    #[arg(long, default_value_t = 35000.0)]
    altitude: f64,

    /// Print store statistics as JSON
    #[arg(long)]
    stats: bool,
}

fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();
    let config = Config::from_env();
    let db = config.open_database()?;

    let report = db.check_database_consistency();
    if !report.is_empty() {
        bail!("dataset inconsistent: {report}");
    }
    let stats = db.stats();
    println!(
        "Dataset OK: {} waypoints, {} airways, {} airports, {} procedures",
        stats.waypoints,
        stats.airways,
        stats.airports,
        stats.sids + stats.stars + stats.approaches
    );
    if args.stats {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    if args.waypoints.is_empty() {
        return Ok(());
    }
    let plan = FlightPlan::from_names(&args.waypoints, args.altitude);
    match db.validate_plan(&plan, &config.validation) {
        Ok(()) => {
            println!("Plan valid: {}", args.waypoints.join(" "));
            Ok(())
        }
        Err(err) => bail!("plan rejected: {err}"),
    }
}
