//! SRTM HGT tiles.
//!
//! A tile covers one 1°×1° cell named after its south-west corner
//! (`N39W104`). Samples are big-endian `i16` meters in row-major order with
//! the northernmost row first; `-32768` marks a void. SRTM1 tiles are
//! 3601×3601, SRTM3 tiles 1201×1201; the grid size is inferred from the byte
//! length.

use nav_core::error::{NavError, NavResult};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const VOID_SAMPLE: i16 = i16::MIN;
pub const SRTM1_SIZE: usize = 3601;
pub const SRTM3_SIZE: usize = 1201;

/// South-west corner of a tile in whole degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub lat: i32,
    pub lon: i32,
}

impl TileKey {
    pub fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    /// Tile whose footprint contains the point.
    pub fn containing(lat: f64, lon: f64) -> Self {
        Self {
            lat: lat.floor() as i32,
            lon: lon.floor() as i32,
        }
    }

    /// `N39W104`, `S01E000`
    pub fn name(&self) -> String {
        let ns = if self.lat >= 0 { 'N' } else { 'S' };
        let ew = if self.lon >= 0 { 'E' } else { 'W' };
        format!(
            "{ns}{:02}{ew}{:03}",
            self.lat.unsigned_abs(),
            self.lon.unsigned_abs()
        )
    }

    /// Candidate files in lookup order: plain, then gzip.
    pub fn candidate_paths(&self, dir: &Path) -> [PathBuf; 2] {
        let name = self.name();
        [
            dir.join(format!("{name}.hgt")),
            dir.join(format!("{name}.hgt.gz")),
        ]
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// An immutable grid of elevation samples.
#[derive(Debug, Clone, PartialEq)]
pub struct HgtTile {
    key: TileKey,
    size: usize,
    samples: Vec<i16>,
}

impl HgtTile {
    /// Build a tile from native-order samples; `samples.len()` must be `size²`.
    pub fn from_samples(key: TileKey, size: usize, samples: Vec<i16>) -> NavResult<Self> {
        if size < 2 || samples.len() != size * size {
            return Err(NavError::invalid_input(
                "tile",
                format!(
                    "{key}: {} samples do not form a {size}x{size} grid",
                    samples.len()
                ),
            ));
        }
        Ok(Self { key, size, samples })
    }

    /// Decode raw big-endian HGT bytes.
    pub fn from_bytes(key: TileKey, bytes: &[u8]) -> NavResult<Self> {
        let size = match bytes.len() {
            n if n == SRTM1_SIZE * SRTM1_SIZE * 2 => SRTM1_SIZE,
            n if n == SRTM3_SIZE * SRTM3_SIZE * 2 => SRTM3_SIZE,
            n => {
                return Err(NavError::Io(format!(
                    "{key}: {n} bytes is not an SRTM1 or SRTM3 tile"
                )));
            }
        };
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        Self::from_samples(key, size, samples)
    }

    /// Read `NAME.hgt` or `NAME.hgt.gz` from `dir`.
    ///
    /// `NotFound` when neither file exists, `Io` when one exists but cannot
    /// be read or decoded.
    pub fn load(dir: &Path, key: TileKey) -> NavResult<Self> {
        let [plain, gzipped] = key.candidate_paths(dir);
        if plain.is_file() {
            let bytes = std::fs::read(&plain).map_err(|err| io_error(&plain, err))?;
            return Self::from_bytes(key, &bytes);
        }
        if gzipped.is_file() {
            use flate2::read::GzDecoder;

            tracing::debug!(path = %gzipped.display(), "Decompressing gzip HGT tile");
            let file = File::open(&gzipped).map_err(|err| io_error(&gzipped, err))?;
            let mut bytes = Vec::with_capacity(SRTM1_SIZE * SRTM1_SIZE * 2);
            GzDecoder::new(file)
                .read_to_end(&mut bytes)
                .map_err(|err| io_error(&gzipped, err))?;
            return Self::from_bytes(key, &bytes);
        }
        Err(NavError::NotFound(format!(
            "tile {key} in {}",
            dir.display()
        )))
    }

    pub fn key(&self) -> TileKey {
        self.key
    }

    /// Samples per side.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn raw(&self, row: usize, col: usize) -> i16 {
        let last = self.size - 1;
        self.samples[row.min(last) * self.size + col.min(last)]
    }

    pub fn is_void(&self, row: usize, col: usize) -> bool {
        self.raw(row, col) == VOID_SAMPLE
    }

    /// Share of non-void samples, in percent.
    pub fn fill_percentage(&self) -> f64 {
        let filled = self.samples.iter().filter(|&&s| s != VOID_SAMPLE).count();
        filled as f64 * 100.0 / self.samples.len() as f64
    }

    /// Bilinear sample in meters at fractional grid coordinates (row 0 is north).
    ///
    /// Void corners are dropped from the weighted average. If every corner
    /// is void the result is 0.
    pub fn sample(&self, row_frac: f64, col_frac: f64) -> f64 {
        let last = (self.size - 1) as f64;
        let row = if row_frac.is_finite() { row_frac.clamp(0.0, last) } else { 0.0 };
        let col = if col_frac.is_finite() { col_frac.clamp(0.0, last) } else { 0.0 };

        let r0 = row.floor() as usize;
        let c0 = col.floor() as usize;
        let r1 = (r0 + 1).min(self.size - 1);
        let c1 = (c0 + 1).min(self.size - 1);
        let dr = row - r0 as f64;
        let dc = col - c0 as f64;

        let corners = [
            (self.raw(r0, c0), (1.0 - dr) * (1.0 - dc)),
            (self.raw(r0, c1), (1.0 - dr) * dc),
            (self.raw(r1, c0), dr * (1.0 - dc)),
            (self.raw(r1, c1), dr * dc),
        ];

        let mut weighted = 0.0;
        let mut weight_sum = 0.0;
        let mut plain_sum = 0.0;
        let mut valid = 0usize;
        for (value, weight) in corners {
            if value == VOID_SAMPLE {
                continue;
            }
            weighted += value as f64 * weight;
            weight_sum += weight;
            plain_sum += value as f64;
            valid += 1;
        }

        if valid == 0 {
            0.0
        } else if weight_sum > 1e-12 {
            weighted / weight_sum
        } else {
            // the point sits on a void sample; its valid neighbours carry no weight
            plain_sum / valid as f64
        }
    }

    /// Interpolated elevation in meters at a point inside this tile.
    pub fn elevation_m(&self, lat: f64, lon: f64) -> f64 {
        let last = (self.size - 1) as f64;
        let row_frac = (self.key.lat as f64 + 1.0 - lat) * last;
        let col_frac = (lon - self.key.lon as f64) * last;
        self.sample(row_frac, col_frac)
    }
}

fn io_error(path: &Path, err: std::io::Error) -> NavError {
    NavError::Io(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(values: [[i16; 3]; 3]) -> HgtTile {
        let samples = values.iter().flatten().copied().collect();
        HgtTile::from_samples(TileKey::new(39, -104), 3, samples).expect("3x3 grid")
    }

    #[test]
    fn tile_names() {
        assert_eq!(TileKey::new(39, -104).name(), "N39W104");
        assert_eq!(TileKey::new(-1, 0).name(), "S01E000");
        assert_eq!(TileKey::containing(39.7, -103.2), TileKey::new(39, -104));
        assert_eq!(TileKey::containing(-0.5, -0.5), TileKey::new(-1, -1));
    }

    #[test]
    fn bilinear_midpoint() {
        let tile = grid([[0, 100, 200], [100, 200, 300], [200, 300, 400]]);
        assert_eq!(tile.sample(0.0, 0.0), 0.0);
        assert!((tile.sample(0.5, 0.5) - 100.0).abs() < 1e-9);
        assert!((tile.sample(2.0, 2.0) - 400.0).abs() < 1e-9);
    }

    #[test]
    fn voids_are_dropped_from_the_average() {
        let v = VOID_SAMPLE;
        let tile = grid([[v, 100, 0], [100, 100, 0], [0, 0, 0]]);
        assert!((tile.sample(0.5, 0.5) - 100.0).abs() < 1e-9);
        // exactly on a void with valid neighbours
        assert!((tile.sample(0.0, 0.0) - 100.0).abs() < 1e-9);
        let all_void = grid([[v, v, 0], [v, v, 0], [0, 0, 0]]);
        assert_eq!(all_void.sample(0.5, 0.5), 0.0);
    }

    #[test]
    fn fill_percentage_counts_voids() {
        let v = VOID_SAMPLE;
        let tile = grid([[v, 1, 1], [1, 1, 1], [1, 1, v]]);
        assert!((tile.fill_percentage() - 700.0 / 9.0).abs() < 1e-9);
        assert!(tile.is_void(0, 0));
        assert!(!tile.is_void(1, 1));
    }

    #[test]
    fn north_row_first() {
        let tile = grid([[300, 300, 300], [200, 200, 200], [100, 100, 100]]);
        // north edge of the tile is row 0
        assert!((tile.elevation_m(40.0, -103.5) - 300.0).abs() < 1e-9);
        assert!((tile.elevation_m(39.0, -103.5) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_odd_byte_lengths() {
        assert!(matches!(
            HgtTile::from_bytes(TileKey::new(0, 0), &[0u8; 10]),
            Err(NavError::Io(_))
        ));
        assert!(HgtTile::from_samples(TileKey::new(0, 0), 3, vec![0; 8]).is_err());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = std::env::temp_dir().join("nav-terrain-no-such-dir");
        assert!(matches!(
            HgtTile::load(&dir, TileKey::new(12, 34)),
            Err(NavError::NotFound(_))
        ));
    }
}
