//! Command line tools for the navigation core:
//! - nav-route: plan, compare and file routes
//! - nav-elevation: terrain queries
//! - nav-check: dataset consistency and flight-plan validation
//! - route_stress: random route queries with timing

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::init_tracing;
