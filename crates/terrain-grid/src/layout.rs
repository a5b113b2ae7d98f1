//! Spatial layout of tiles and super-tiles.
//!
//! A dataset is a set of region folders. Folder `i` (in sorted order) holds up
//! to `tiles_per_side²` tiles that together form one super-tile, and the
//! [`PlacementTable`] says where that super-tile sits in the global layout.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Default tile edge length in samples.
pub const DEFAULT_TILE_SIDE: usize = 256;

/// Default number of tiles along each edge of a super-tile.
pub const DEFAULT_TILES_PER_SIDE: usize = 2;

/// Super-tile column for each region folder of the reference dataset.
const REFERENCE_X: [usize; 36] = [
    0, 1, 2, 0, 0, 1, //
    2, 1, 2, 3, 4, 5, //
    3, 4, 3, 4, 5, 5, //
    0, 0, 1, 2, 1, 2, //
    0, 1, 2, 3, 4, 3, //
    4, 5, 5, 3, 4, 5,
];

/// Super-tile row for each region folder of the reference dataset.
const REFERENCE_Y: [usize; 36] = [
    0, 0, 0, 1, 2, 1, //
    1, 2, 2, 0, 0, 0, //
    1, 1, 2, 2, 1, 2, //
    3, 4, 3, 3, 4, 4, //
    5, 5, 5, 3, 3, 4, //
    4, 3, 4, 5, 5, 5,
];

/// Maps a folder's sequential index to its super-tile position.
///
/// The default is the hardwired 6×6 arrangement of the reference dataset. It
/// cannot be derived from the data and must be reproduced exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementTable {
    /// Layout width in super-tiles.
    pub columns: usize,
    /// Layout height in super-tiles.
    pub rows: usize,
    /// Super-tile column per folder.
    pub x: Vec<usize>,
    /// Super-tile row per folder.
    pub y: Vec<usize>,
}

impl Default for PlacementTable {
    fn default() -> Self {
        Self::reference()
    }
}

impl PlacementTable {
    /// The 36-entry table of the reference dataset.
    pub fn reference() -> Self {
        Self {
            columns: 6,
            rows: 6,
            x: REFERENCE_X.to_vec(),
            y: REFERENCE_Y.to_vec(),
        }
    }

    /// A table with a single super-tile at the origin.
    pub fn single() -> Self {
        Self {
            columns: 1,
            rows: 1,
            x: vec![0],
            y: vec![0],
        }
    }

    /// Raster-order placement for a `columns`×`rows` layout.
    pub fn raster(columns: usize, rows: usize) -> Self {
        let n = columns * rows;
        Self {
            columns,
            rows,
            x: (0..n).map(|i| i % columns).collect(),
            y: (0..n).map(|i| i / columns).collect(),
        }
    }

    /// Number of folders the table expects.
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Super-tile (column, row) of folder `index`.
    #[inline]
    pub fn position(&self, index: usize) -> (usize, usize) {
        (self.x[index], self.y[index])
    }

    /// Check lengths, ranges and that no two folders share a super-tile.
    pub fn validate(&self) -> GridResult<()> {
        if self.x.len() != self.y.len() {
            return Err(GridError::invalid_placement(format!(
                "x has {} entries but y has {}",
                self.x.len(),
                self.y.len()
            )));
        }
        if self.is_empty() {
            return Err(GridError::invalid_placement("table is empty"));
        }

        let mut seen = HashSet::with_capacity(self.len());
        for (i, (&x, &y)) in self.x.iter().zip(&self.y).enumerate() {
            if x >= self.columns || y >= self.rows {
                return Err(GridError::invalid_placement(format!(
                    "entry {} = ({}, {}) is outside the {}x{} layout",
                    i, x, y, self.columns, self.rows
                )));
            }
            if !seen.insert((x, y)) {
                return Err(GridError::invalid_placement(format!(
                    "entry {} = ({}, {}) is already used by another folder",
                    i, x, y
                )));
            }
        }
        Ok(())
    }
}

/// Tile geometry plus folder placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLayout {
    /// Samples along each edge of one tile.
    pub tile_side: usize,
    /// Tiles along each edge of one super-tile.
    pub tiles_per_side: usize,
    /// Folder → super-tile mapping.
    pub placement: PlacementTable,
}

impl Default for TileLayout {
    fn default() -> Self {
        Self {
            tile_side: DEFAULT_TILE_SIDE,
            tiles_per_side: DEFAULT_TILES_PER_SIDE,
            placement: PlacementTable::reference(),
        }
    }
}

impl TileLayout {
    /// Samples along each edge of a super-tile.
    #[inline]
    pub fn super_side(&self) -> usize {
        self.tile_side * self.tiles_per_side
    }

    /// Tiles per super-tile.
    #[inline]
    pub fn quadrants(&self) -> usize {
        self.tiles_per_side * self.tiles_per_side
    }

    /// Exact size of one tile file in bytes.
    #[inline]
    pub fn tile_bytes(&self) -> u64 {
        (self.tile_side * self.tile_side * 2) as u64
    }

    /// Full grid width in samples.
    pub fn grid_width(&self) -> usize {
        self.placement.columns * self.super_side()
    }

    /// Full grid height in samples.
    pub fn grid_height(&self) -> usize {
        self.placement.rows * self.super_side()
    }

    /// Global sample origin of folder `index`'s super-tile.
    pub fn super_origin(&self, index: usize) -> (usize, usize) {
        let (sx, sy) = self.placement.position(index);
        (sx * self.super_side(), sy * self.super_side())
    }

    /// Offset of the `k`-th tile inside its super-tile.
    ///
    /// Tiles fill the super-tile left to right, then top to bottom.
    pub fn quadrant_offset(&self, k: usize) -> (usize, usize) {
        (
            (k % self.tiles_per_side) * self.tile_side,
            (k / self.tiles_per_side) * self.tile_side,
        )
    }

    pub fn validate(&self) -> GridResult<()> {
        if self.tile_side == 0 {
            return Err(GridError::invalid_param(
                "tile_side",
                self.tile_side,
                "must be positive",
            ));
        }
        if self.tiles_per_side == 0 {
            return Err(GridError::invalid_param(
                "tiles_per_side",
                self.tiles_per_side,
                "must be positive",
            ));
        }
        self.placement.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_table_is_valid() {
        let table = PlacementTable::reference();
        assert_eq!(table.len(), 36);
        table.validate().unwrap();

        // Every one of the 36 super-tiles is covered exactly once.
        let covered: HashSet<_> = (0..36).map(|i| table.position(i)).collect();
        assert_eq!(covered.len(), 36);
    }

    #[test]
    fn test_reference_positions() {
        let table = PlacementTable::reference();
        assert_eq!(table.position(0), (0, 0));
        assert_eq!(table.position(3), (0, 1));
        assert_eq!(table.position(9), (3, 0));
        assert_eq!(table.position(18), (0, 3));
        assert_eq!(table.position(35), (5, 5));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut table = PlacementTable::reference();
        table.x[1] = 0;
        let err = table.validate().unwrap_err();
        assert!(matches!(err, GridError::InvalidPlacement { .. }));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut table = PlacementTable::reference();
        table.y[4] = 6;
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut table = PlacementTable::reference();
        table.y.pop();
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_default_geometry() {
        let layout = TileLayout::default();
        assert_eq!(layout.super_side(), 512);
        assert_eq!(layout.tile_bytes(), 131072);
        assert_eq!(layout.grid_width(), 3072);
        assert_eq!(layout.grid_height(), 3072);
        assert_eq!(layout.super_origin(9), (1536, 0));
    }

    #[test]
    fn test_quadrant_order() {
        let layout = TileLayout::default();
        assert_eq!(layout.quadrant_offset(0), (0, 0));
        assert_eq!(layout.quadrant_offset(1), (256, 0));
        assert_eq!(layout.quadrant_offset(2), (0, 256));
        assert_eq!(layout.quadrant_offset(3), (256, 256));
    }

    #[test]
    fn test_raster_table() {
        let table = PlacementTable::raster(3, 2);
        table.validate().unwrap();
        assert_eq!(table.position(4), (1, 1));
    }
}
