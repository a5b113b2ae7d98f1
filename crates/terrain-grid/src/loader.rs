//! Tile discovery and global grid assembly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, info_span, warn};
use walkdir::WalkDir;

use crate::crop::ExclusionMask;
use crate::error::{GridError, GridResult};
use crate::grid::Grid;
use crate::layout::TileLayout;
use crate::tile::{DEFAULT_BASE_HEIGHT_OFFSET, Tile, normalize_sample};

/// Default tile file extension.
pub const DEFAULT_TILE_EXTENSION: &str = "hght";

/// One region folder and its tile files, both in sorted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionFolder {
    pub path: PathBuf,
    pub tiles: Vec<PathBuf>,
}

/// Find every directory under `root` that holds tile files.
///
/// Folders are sorted lexicographically by path and tiles by file name, which
/// is the order the placement table is written against.
pub fn discover_regions(root: &Path, extension: &str) -> GridResult<Vec<RegionFolder>> {
    let mut folders: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            GridError::io_read(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        let matches = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if !matches {
            continue;
        }

        if let Some(parent) = path.parent() {
            folders.entry(parent.to_path_buf()).or_default().push(path);
        }
    }

    let mut regions: Vec<RegionFolder> = folders
        .into_iter()
        .map(|(path, mut tiles)| {
            tiles.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));
            RegionFolder { path, tiles }
        })
        .collect();
    regions.sort_by(|a, b| a.path.to_string_lossy().cmp(&b.path.to_string_lossy()));

    debug!(
        root = %root.display(),
        folders = regions.len(),
        tiles = regions.iter().map(|r| r.tiles.len()).sum::<usize>(),
        "Discovered tile folders"
    );
    Ok(regions)
}

/// Parameters for assembling the global grid.
#[derive(Debug, Clone)]
pub struct LoadParams {
    pub layout: TileLayout,
    /// Height subtracted from each sample before clamping at zero.
    pub base_height_offset: f32,
    /// Samples inside this rectangle (global coordinates) are forced to zero.
    pub mask: Option<ExclusionMask>,
    /// Fail instead of zero-filling when a folder has fewer tiles than quadrants.
    pub strict: bool,
}

impl Default for LoadParams {
    fn default() -> Self {
        Self {
            layout: TileLayout::default(),
            base_height_offset: DEFAULT_BASE_HEIGHT_OFFSET,
            mask: None,
            strict: false,
        }
    }
}

/// Decoded super-tile waiting to be copied into the grid.
struct SuperTile {
    origin: (usize, usize),
    samples: Vec<f32>,
}

/// Assembles region folders into one elevation grid.
#[derive(Debug, Clone)]
pub struct TileLoader {
    params: LoadParams,
}

impl TileLoader {
    pub fn new(params: LoadParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &LoadParams {
        &self.params
    }

    /// Discover folders under `root` and assemble them.
    pub fn load_dir(&self, root: &Path, extension: &str) -> GridResult<Grid> {
        let regions = discover_regions(root, extension)?;
        self.load(&regions)
    }

    /// Assemble `regions` (already sorted) into the global grid.
    ///
    /// Folders are decoded in parallel into private buffers, one per
    /// super-tile; the buffers are then copied into the grid in order.
    pub fn load(&self, regions: &[RegionFolder]) -> GridResult<Grid> {
        let layout = &self.params.layout;
        layout.validate()?;
        self.check_regions(regions)?;

        let _span = info_span!("load_tiles", folders = regions.len()).entered();

        let super_tiles = regions
            .par_iter()
            .enumerate()
            .map(|(index, folder)| self.load_super_tile(index, folder))
            .collect::<GridResult<Vec<_>>>()?;

        let side = layout.super_side();
        let mut grid = Grid::zeros(layout.grid_width(), layout.grid_height());
        for tile in &super_tiles {
            grid.blit(tile.origin.0, tile.origin.1, side, side, &tile.samples);
        }

        info!(
            width = grid.width(),
            height = grid.height(),
            folders = regions.len(),
            "Assembled elevation grid"
        );
        Ok(grid)
    }

    fn check_regions(&self, regions: &[RegionFolder]) -> GridResult<()> {
        let layout = &self.params.layout;
        let expected = layout.placement.len();
        if regions.len() != expected {
            return Err(GridError::LayoutMismatch {
                found: regions.len(),
                expected,
            });
        }

        let capacity = layout.quadrants();
        for folder in regions {
            let found = folder.tiles.len();
            if found > capacity {
                return Err(GridError::TooManyTiles {
                    folder: folder.path.clone(),
                    found,
                    capacity,
                });
            }
            if found < capacity {
                if self.params.strict {
                    return Err(GridError::MissingTile {
                        folder: folder.path.clone(),
                        found,
                        expected: capacity,
                    });
                }
                warn!(
                    folder = %folder.path.display(),
                    found,
                    expected = capacity,
                    "Missing tiles will be zero-filled"
                );
            }
        }
        Ok(())
    }

    fn load_super_tile(&self, index: usize, folder: &RegionFolder) -> GridResult<SuperTile> {
        let layout = &self.params.layout;
        let side = layout.tile_side;
        let stride = layout.super_side();
        let (ox, oy) = layout.super_origin(index);
        let mut samples = vec![0.0f32; stride * stride];

        for (k, path) in folder.tiles.iter().enumerate() {
            let tile = Tile::read(path, side)?;
            let (qx, qy) = layout.quadrant_offset(k);
            debug!(
                path = %path.display(),
                x = ox + qx,
                y = oy + qy,
                "Placing tile"
            );

            for ty in 0..side {
                let gy = oy + qy + ty;
                let row = &mut samples[(qy + ty) * stride + qx..][..side];
                for (tx, out) in row.iter_mut().enumerate() {
                    let gx = ox + qx + tx;
                    let masked = self.params.mask.is_some_and(|m| m.contains(gx, gy));
                    *out = if masked {
                        0.0
                    } else {
                        normalize_sample(tile.raw(tx, ty), self.params.base_height_offset)
                    };
                }
            }
        }

        Ok(SuperTile {
            origin: (ox, oy),
            samples,
        })
    }
}
