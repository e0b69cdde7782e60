pub mod estimate;
pub mod service;
pub mod tile;

pub use estimate::estimate_elevation_ft;
pub use service::{
    ElevationConfig, ElevationService, ElevationStats, ProfileSample, SlopeInfo, TileStatus,
    MAX_ELEVATION_FT, MIN_ELEVATION_FT, STEEP_SLOPE_DEG,
};
pub use tile::{HgtTile, TileKey, SRTM1_SIZE, SRTM3_SIZE, VOID_SAMPLE};
