//! Grayscale debug raster of a grid.

use std::path::Path;

use image::GrayImage;
use tracing::info;

use crate::error::{GridError, GridResult};
use crate::grid::Grid;

/// Render the grid as 8-bit grayscale, one pixel per sample.
///
/// Pixel intensity is the sample truncated toward zero and clamped to 0..=255.
pub fn to_luma(grid: &Grid) -> GrayImage {
    GrayImage::from_fn(grid.width() as u32, grid.height() as u32, |x, y| {
        let v = grid.get(x as usize, y as usize);
        image::Luma([v.trunc().clamp(0.0, 255.0) as u8])
    })
}

/// A rendered grid held in memory until it is saved.
#[derive(Debug, Clone)]
pub struct DebugRaster {
    image: GrayImage,
}

impl DebugRaster {
    pub fn render(grid: &Grid) -> Self {
        Self {
            image: to_luma(grid),
        }
    }

    /// (width, height) in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Write the raster as a PNG.
    pub fn save(&self, path: &Path) -> GridResult<()> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| GridError::IoWrite {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;
        info!(path = %path.display(), "Wrote debug raster");
        Ok(())
    }
}

/// Write [`to_luma`] as a PNG.
pub fn write_debug_raster(grid: &Grid, path: &Path) -> GridResult<()> {
    DebugRaster::render(grid).save(path)
}
