//! Elevation grid assembly for heightmap-to-solid conversion.
//!
//! This crate turns a directory of raw elevation tiles into one cropped,
//! resampled grid ready for meshing.
//!
//! # Pipeline
//!
//! 1. [`discover_regions`] finds region folders and their tile files.
//! 2. [`TileLoader`] decodes tiles and places them using a [`PlacementTable`].
//! 3. [`CropWindow`] + [`crop_grid`] trim the grid to the reachable area.
//! 4. [`Downsampler`] resamples the grid to a printable resolution.
//!
//! Every stage consumes its input [`Grid`] and returns a new one.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use terrain_grid::{
//!     CropRatios, CropWindow, Downsampler, LoadParams, MaskRatios, TileLayout, TileLoader,
//!     crop_grid,
//! };
//!
//! let layout = TileLayout::default();
//! let window =
//!     CropWindow::compute(layout.grid_width(), layout.grid_height(), &CropRatios::default())?;
//!
//! let loader = TileLoader::new(LoadParams {
//!     layout,
//!     mask: MaskRatios::default().derive(&window),
//!     ..Default::default()
//! });
//! let grid = loader.load_dir(Path::new("terrain"), "hght")?;
//! let grid = crop_grid(grid, &window)?;
//! let grid = Downsampler::default().apply(grid)?;
//! println!("{} x {}", grid.width(), grid.height());
//! # Ok::<(), terrain_grid::GridError>(())
//! ```
//!
//! # Tile Format
//!
//! Each tile file is exactly `side * side * 2` bytes of little-endian `u16`
//! samples. A sample is fixed point: `raw / 256` height units. The
//! `base_height_offset` (default 31) is subtracted and the result clamped at
//! zero.

mod error;
mod grid;

pub mod crop;
pub mod layout;
pub mod loader;
pub mod raster;
pub mod resample;
pub mod tile;

pub use error::{GridError, GridErrorCode, GridRecoverySuggestion, GridResult};
pub use grid::Grid;

pub use crop::{CropRatios, CropSpec, CropWindow, ExclusionMask, MaskRatios, MaskSpec, crop_grid};
pub use layout::{PlacementTable, TileLayout};
pub use loader::{DEFAULT_TILE_EXTENSION, LoadParams, RegionFolder, TileLoader, discover_regions};
pub use raster::{DebugRaster, write_debug_raster};
pub use resample::{DEFAULT_DOWNSAMPLE_FACTOR, Downsampler, ResampleFilter, downsample};
pub use tile::{DEFAULT_BASE_HEIGHT_OFFSET, Tile, normalize_sample};
