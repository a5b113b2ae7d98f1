//! End-to-end conversion from a tile directory to an STL file.
//!
//! [`ConversionConfig`] carries every setting and can be loaded from TOML:
//!
//! ```toml
//! input_dir = "terrain"
//! output = "terrain.stl"
//! debug_raster = "terrain.png"
//!
//! [grid]
//! tile_extension = "hght"
//! base_height_offset = 31.0
//! downsample_factor = 0.5
//! filter = "cubic"
//!
//! [grid.crop]
//! mode = "ratios"
//! y_margin_divisor = 5.75
//!
//! [grid.mask]
//! mode = "explicit"
//! x_min = 0
//! x_max = 405
//! y_min = 1069
//! y_max = 1495
//!
//! [mesh]
//! target_size = 255.0
//! wall_thickness = -20.0
//! ```
//!
//! Omitted keys take their defaults. `mesh.zoom_factor` defaults to the
//! downsample factor so relief keeps its proportion to the horizontal scale.
//!
//! # Example
//!
//! ```no_run
//! use terrain_mesh::{ConversionConfig, Pipeline};
//!
//! let config = ConversionConfig::from_toml_file("terrain.toml")?;
//! let summary = Pipeline::new(config)?.run()?;
//! println!("{} faces written to {}", summary.face_count, summary.output.display());
//! # Ok::<(), terrain_mesh::MeshError>(())
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use terrain_grid::{
    CropSpec, CropWindow, DEFAULT_BASE_HEIGHT_OFFSET, DEFAULT_DOWNSAMPLE_FACTOR,
    DEFAULT_TILE_EXTENSION, DebugRaster, Downsampler, ExclusionMask, Grid, LoadParams, MaskSpec,
    ResampleFilter, TileLayout, TileLoader, crop_grid, discover_regions,
};
use tracing::{info, warn};

use crate::Mesh;
use crate::builder::{DEFAULT_TARGET_SIZE, DEFAULT_WALL_THICKNESS, MeshBuilder, MeshParams};
use crate::error::{MeshError, MeshResult};
use crate::faces::expected_face_count;
use crate::io::save_stl_checked;
use crate::tracing_ext::{OperationTimer, log_validation_result};
use crate::validate::{MeshReport, validate_mesh};

/// Tile assembly, cropping and resampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Extension of tile files, without the dot.
    pub tile_extension: String,
    /// Height subtracted from every sample.
    pub base_height_offset: f32,
    /// Fail on folders with missing tiles instead of zero-filling.
    pub strict: bool,
    pub downsample_factor: f64,
    pub filter: ResampleFilter,
    /// Tile geometry and folder placement.
    pub layout: TileLayout,
    pub crop: CropSpec,
    pub mask: MaskSpec,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            tile_extension: DEFAULT_TILE_EXTENSION.to_string(),
            base_height_offset: DEFAULT_BASE_HEIGHT_OFFSET,
            strict: false,
            downsample_factor: DEFAULT_DOWNSAMPLE_FACTOR,
            filter: ResampleFilter::default(),
            layout: TileLayout::default(),
            crop: CropSpec::default(),
            mask: MaskSpec::default(),
        }
    }
}

/// Solid geometry settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub target_size: f64,
    pub wall_thickness: f64,
    /// Vertical exaggeration; `None` follows the downsample factor.
    pub zoom_factor: Option<f64>,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            wall_thickness: DEFAULT_WALL_THICKNESS,
            zoom_factor: None,
        }
    }
}

/// Complete configuration of one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Directory holding the region folders.
    pub input_dir: PathBuf,
    /// STL file to write.
    pub output: PathBuf,
    /// Grayscale PNG of the cropped grid, saved after the STL.
    pub debug_raster: Option<PathBuf>,
    /// Check the generated solid for watertightness before writing it.
    pub validate: bool,
    pub grid: GridConfig,
    pub mesh: MeshConfig,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output: PathBuf::from("terrain.stl"),
            debug_raster: None,
            validate: true,
            grid: GridConfig::default(),
            mesh: MeshConfig::default(),
        }
    }
}

impl ConversionConfig {
    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> MeshResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| MeshError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents).map_err(|e| MeshError::ConfigParse {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
    }

    /// Serialize to pretty TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Geometry parameters with the zoom factor resolved.
    pub fn mesh_params(&self) -> MeshParams {
        MeshParams {
            target_size: self.mesh.target_size,
            wall_thickness: self.mesh.wall_thickness,
            zoom_factor: self
                .mesh
                .zoom_factor
                .unwrap_or(self.grid.downsample_factor),
        }
    }

    pub fn downsampler(&self) -> Downsampler {
        Downsampler::new(self.grid.downsample_factor, self.grid.filter)
    }

    /// Check every parameter that can be checked without touching the disk.
    pub fn validate(&self) -> MeshResult<()> {
        self.grid.layout.validate()?;
        let factor = self.grid.downsample_factor;
        if !(factor.is_finite() && factor > 0.0) {
            return Err(MeshError::invalid_param(
                "downsample_factor",
                factor,
                "must be a positive finite number",
            ));
        }
        if !self.grid.base_height_offset.is_finite() {
            return Err(MeshError::invalid_param(
                "base_height_offset",
                self.grid.base_height_offset,
                "must be finite",
            ));
        }
        if self.grid.tile_extension.is_empty() {
            return Err(MeshError::invalid_param(
                "tile_extension",
                "\"\"",
                "must not be empty",
            ));
        }
        self.mesh_params().validate()
    }
}

/// What a conversion run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionSummary {
    pub input_dir: PathBuf,
    pub output: PathBuf,
    pub region_count: usize,
    pub tile_count: usize,
    /// (height, width) of the assembled grid.
    pub full_shape: (usize, usize),
    pub crop_window: Option<CropWindow>,
    pub mask: Option<ExclusionMask>,
    /// (height, width) after cropping.
    pub cropped_shape: (usize, usize),
    /// (height, width) after resampling.
    pub resampled_shape: (usize, usize),
    pub vertex_count: usize,
    pub face_count: usize,
    /// Facet count read back from the written file.
    pub facets_written: u32,
    pub dimensions: Option<(f64, f64, f64)>,
    pub report: Option<MeshReport>,
    pub debug_raster: Option<PathBuf>,
    pub elapsed_ms: f64,
}

/// Runs every conversion stage in order.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ConversionConfig,
}

impl Pipeline {
    /// Validate `config` and wrap it.
    pub fn new(config: ConversionConfig) -> MeshResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Crop window for the full grid, or `None` when cropping is disabled.
    pub fn crop_window(&self) -> MeshResult<Option<CropWindow>> {
        let layout = &self.config.grid.layout;
        Ok(self
            .config
            .grid
            .crop
            .window(layout.grid_width(), layout.grid_height())?)
    }

    /// Exclusion mask for the given crop window.
    pub fn exclusion_mask(&self, window: Option<&CropWindow>) -> Option<ExclusionMask> {
        self.config.grid.mask.resolve(window)
    }

    /// Build the closed solid for an already prepared grid.
    pub fn mesh_from_grid(&self, grid: &Grid) -> MeshResult<Mesh> {
        MeshBuilder::with_params(self.config.mesh_params()).build(grid)
    }

    /// Run the whole conversion and write the STL.
    ///
    /// Nothing is written unless every earlier stage succeeded.
    pub fn run(&self) -> MeshResult<ConversionSummary> {
        let start = Instant::now();
        let config = &self.config;

        let window = self.crop_window()?;
        let mask = self.exclusion_mask(window.as_ref());

        let regions = {
            let _timer = OperationTimer::new("discover_tiles");
            discover_regions(&config.input_dir, &config.grid.tile_extension)?
        };
        let tile_count = regions.iter().map(|r| r.tiles.len()).sum();

        let grid = {
            let _timer = OperationTimer::new("load_tiles");
            TileLoader::new(LoadParams {
                layout: config.grid.layout.clone(),
                base_height_offset: config.grid.base_height_offset,
                mask,
                strict: config.grid.strict,
            })
            .load(&regions)?
        };
        let full_shape = grid.shape();

        let grid = match &window {
            Some(window) => {
                let _timer = OperationTimer::with_grid("crop", full_shape.0, full_shape.1);
                crop_grid(grid, window)?
            }
            None => grid,
        };
        let cropped_shape = grid.shape();
        info!(
            full_height = full_shape.0,
            full_width = full_shape.1,
            height = cropped_shape.0,
            width = cropped_shape.1,
            "Cropped grid"
        );

        // Rendered from the cropped grid, saved only once the STL is verified.
        let raster = config
            .debug_raster
            .as_ref()
            .map(|path| (path, DebugRaster::render(&grid)));

        let grid = {
            let _timer = OperationTimer::with_grid("downsample", cropped_shape.0, cropped_shape.1);
            config.downsampler().apply(grid)?
        };
        let resampled_shape = grid.shape();

        let mesh = self.mesh_from_grid(&grid)?;
        drop(grid);

        let report = if config.validate {
            let _timer = OperationTimer::new("validate");
            let report = validate_mesh(&mesh);
            log_validation_result(&report);
            report.require_printable()?;
            Some(report)
        } else {
            warn!("Skipping mesh validation");
            None
        };

        let facets_written = {
            let _timer = OperationTimer::new("export");
            save_stl_checked(
                &mesh,
                &config.output,
                expected_face_count(resampled_shape.0, resampled_shape.1),
            )?
        };

        if let Some((path, raster)) = &raster {
            raster.save(path)?;
        }

        let summary = ConversionSummary {
            input_dir: config.input_dir.clone(),
            output: config.output.clone(),
            region_count: regions.len(),
            tile_count,
            full_shape,
            crop_window: window,
            mask,
            cropped_shape,
            resampled_shape,
            vertex_count: mesh.vertex_count(),
            face_count: mesh.face_count(),
            facets_written,
            dimensions: mesh
                .bounds()
                .map(|(min, max)| (max.x - min.x, max.y - min.y, max.z - min.z)),
            report,
            debug_raster: config.debug_raster.clone(),
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        };

        info!(
            output = %summary.output.display(),
            vertices = summary.vertex_count,
            faces = summary.face_count,
            elapsed_ms = format!("{:.0}", summary.elapsed_ms),
            "Conversion complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrain_grid::CropRatios;

    #[test]
    fn test_default_config_is_valid() {
        let config = ConversionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mesh_params().zoom_factor, 0.5);
        assert!(config.validate);
    }

    #[test]
    fn test_zoom_follows_factor() {
        let mut config = ConversionConfig::default();
        config.grid.downsample_factor = 0.25;
        assert_eq!(config.mesh_params().zoom_factor, 0.25);

        config.mesh.zoom_factor = Some(1.0);
        assert_eq!(config.mesh_params().zoom_factor, 1.0);
    }

    #[test]
    fn test_partial_toml() {
        let config = ConversionConfig::from_toml(
            r#"
            input_dir = "tiles"
            output = "out.stl"

            [grid]
            downsample_factor = 0.25
            filter = "linear"

            [grid.crop]
            mode = "ratios"
            y_margin_divisor = 6.0

            [grid.mask]
            mode = "disabled"

            [mesh]
            wall_thickness = -10.0
            "#,
        )
        .unwrap();

        assert_eq!(config.input_dir, PathBuf::from("tiles"));
        assert_eq!(config.grid.filter, ResampleFilter::Linear);
        assert_eq!(config.grid.tile_extension, "hght");
        assert_eq!(
            config.grid.crop,
            CropSpec::Ratios(CropRatios {
                y_margin_divisor: 6.0,
                ..Default::default()
            })
        );
        assert_eq!(config.grid.mask, MaskSpec::Disabled);
        assert_eq!(config.mesh.wall_thickness, -10.0);
        assert_eq!(config.mesh.target_size, 255.0);
        assert_eq!(config.grid.layout.placement.len(), 36);
    }

    #[test]
    fn test_explicit_mask_toml() {
        let config = ConversionConfig::from_toml(
            r#"
            [grid.mask]
            mode = "explicit"
            x_min = 0
            x_max = 10
            y_min = 5
            y_max = 6
            "#,
        )
        .unwrap();
        assert_eq!(
            config.grid.mask,
            MaskSpec::Explicit(ExclusionMask {
                x_min: 0,
                x_max: 10,
                y_min: 5,
                y_max: 6,
            })
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ConversionConfig::default();
        config.grid.crop = CropSpec::Disabled;
        config.debug_raster = Some(PathBuf::from("debug.png"));
        let text = config.to_toml().unwrap();
        assert_eq!(ConversionConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_factor_rejected() {
        let mut config = ConversionConfig::default();
        config.grid.downsample_factor = 0.0;
        assert!(matches!(
            Pipeline::new(config),
            Err(MeshError::InvalidParams { .. })
        ));
    }

    #[test]
    fn test_reference_window_and_mask() {
        let pipeline = Pipeline::new(ConversionConfig::default()).unwrap();
        let window = pipeline.crop_window().unwrap().unwrap();
        assert_eq!((window.width(), window.height()), (2505, 2048));
        let mask = pipeline.exclusion_mask(Some(&window)).unwrap();
        assert_eq!((mask.x_max, mask.y_min, mask.y_max), (405, 1069, 1495));
    }

    #[test]
    fn test_missing_config_file() {
        let err = ConversionConfig::from_toml_file("/nonexistent/terrain.toml").unwrap_err();
        assert!(matches!(err, MeshError::ConfigRead { .. }));
    }
}
