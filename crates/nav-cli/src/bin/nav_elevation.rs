//! Terrain queries against the SRTM tile directory.

use anyhow::Result;
use clap::{Parser, Subcommand};
use nav_cli::{init_tracing, Config};
use nav_core::GeoPoint;
use nav_terrain::ElevationService;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Tile directory (overrides NAV_TILE_DIR)
    #[arg(long)]
    tile_dir: Option<PathBuf>,

    /// Print cache counters when done
    #[arg(long)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ground elevation at a point
    Point {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
    /// Elevation samples along the great circle between two points
    Profile {
        #[arg(allow_negative_numbers = true)]
        from_lat: f64,
        #[arg(allow_negative_numbers = true)]
        from_lon: f64,
        #[arg(allow_negative_numbers = true)]
        to_lat: f64,
        #[arg(allow_negative_numbers = true)]
        to_lon: f64,
        #[arg(long, default_value_t = 20)]
        samples: usize,
    },
    /// Local terrain slope
    Slope {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
    /// Minimum safe altitude
    Msa {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
        #[arg(long, default_value_t = 1000.0)]
        clearance: f64,
    },
    /// Advisory water check
    Water {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
}

fn main() -> Result<()> {
    init_tracing()?;
    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(dir) = args.tile_dir {
        config.elevation.tile_dir = dir;
    }
    let service = ElevationService::new(config.elevation);

    match args.command {
        Command::Point { lat, lon } => {
            let elevation = service.get_elevation(lat, lon)?;
            let status = service.tile_status(lat, lon)?;
            println!("{elevation:.0} ft ({status:?})");
        }
        Command::Profile {
            from_lat,
            from_lon,
            to_lat,
            to_lon,
            samples,
        } => {
            let profile = service.get_terrain_profile(
                GeoPoint::new(from_lat, from_lon),
                GeoPoint::new(to_lat, to_lon),
                samples,
            )?;
            for sample in &profile {
                println!(
                    "{:>8.1} NM  {:>9.4} {:>10.4}  {:>7.0} ft",
                    sample.distance_nm, sample.lat, sample.lon, sample.elevation_ft
                );
            }
            if let Some(highest) = profile
                .iter()
                .max_by(|a, b| a.elevation_ft.total_cmp(&b.elevation_ft))
            {
                println!(
                    "Highest: {:.0} ft at {:.1} NM",
                    highest.elevation_ft, highest.distance_nm
                );
            }
        }
        Command::Slope { lat, lon } => {
            let slope = service.get_slope(lat, lon)?;
            println!(
                "{:.1} deg ({:.0}-{:.0} ft){}",
                slope.slope_deg,
                slope.min_elevation_ft,
                slope.max_elevation_ft,
                if slope.is_steep { " STEEP" } else { "" }
            );
        }
        Command::Msa {
            lat,
            lon,
            clearance,
        } => {
            let msa = service.minimum_safe_altitude(lat, lon, clearance)?;
            println!("{msa:.0} ft");
        }
        Command::Water { lat, lon } => {
            println!("{}", service.is_water(lat, lon)?);
        }
    }

    if args.stats {
        println!("{}", serde_json::to_string_pretty(&service.stats())?);
    }
    Ok(())
}
