//! Raw elevation tiles.
//!
//! A tile file is `side * side` unsigned 16-bit little-endian samples with no
//! header. Each sample is fixed point: `raw / 256` height units.

use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use crate::error::{GridError, GridResult};

/// Default height subtracted from every sample before clamping.
pub const DEFAULT_BASE_HEIGHT_OFFSET: f32 = 31.0;

/// Fixed-point scale of a raw sample.
const RAW_SCALE: f32 = 256.0;

/// One decoded tile.
#[derive(Debug, Clone)]
pub struct Tile {
    side: usize,
    samples: Vec<u16>,
}

impl Tile {
    /// Read and decode a tile file. The file must be exactly `side*side*2` bytes.
    pub fn read(path: &Path, side: usize) -> GridResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| GridError::io_read(path, e))?;
        Self::from_bytes(&bytes, side, path)
    }

    /// Decode a tile from its raw bytes; `path` is only used for error context.
    pub fn from_bytes(bytes: &[u8], side: usize, path: &Path) -> GridResult<Self> {
        let expected = (side * side * 2) as u64;
        if bytes.len() as u64 != expected {
            return Err(GridError::TileSize {
                path: path.to_path_buf(),
                expected,
                actual: bytes.len() as u64,
            });
        }

        let mut samples = vec![0u16; side * side];
        LittleEndian::read_u16_into(bytes, &mut samples);
        trace!(path = %path.display(), side, "Decoded tile");
        Ok(Self { side, samples })
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Raw sample at column `x`, row `y`.
    #[inline]
    pub fn raw(&self, x: usize, y: usize) -> u16 {
        self.samples[y * self.side + x]
    }

    pub fn samples(&self) -> &[u16] {
        &self.samples
    }
}

/// Convert a raw sample to height units above `base_height_offset`, clamped at zero.
#[inline]
pub fn normalize_sample(raw: u16, base_height_offset: f32) -> f32 {
    (raw as f32 / RAW_SCALE - base_height_offset).max(0.0)
}
