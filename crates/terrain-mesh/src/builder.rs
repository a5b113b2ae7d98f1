//! Vertex generation and the closed-solid builder.
//!
//! # Example
//!
//! ```
//! use terrain_grid::Grid;
//! use terrain_mesh::MeshBuilder;
//!
//! let grid = Grid::filled(4, 3, 10.0);
//! let mesh = MeshBuilder::new()
//!     .target_size(100.0)
//!     .wall_thickness(-5.0)
//!     .build(&grid)
//!     .unwrap();
//!
//! assert_eq!(mesh.vertex_count(), 2 * 4 * 3);
//! assert_eq!(mesh.face_count(), 4 * 2 * 3 + 4 * 2 + 4 * 3);
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use terrain_grid::Grid;
use tracing::{debug, info};

use crate::error::{MeshError, MeshResult};
use crate::faces::{FaceGenerator, expected_face_count};
use crate::tracing_ext::{OperationTimer, log_mesh_stats};
use crate::{Mesh, Vertex};

/// Default length of the grid's row axis after scaling.
pub const DEFAULT_TARGET_SIZE: f64 = 255.0;

/// Default height of the bottom face, in elevation units.
pub const DEFAULT_WALL_THICKNESS: f64 = -20.0;

/// Default vertical exaggeration; matches the default downsample factor.
pub const DEFAULT_ZOOM_FACTOR: f64 = 0.5;

/// Geometry parameters of the solid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshParams {
    /// Length that the grid width is scaled to.
    pub target_size: f64,
    /// Elevation of the bottom face. Negative values put it below zero.
    pub wall_thickness: f64,
    /// Multiplier applied to elevations and the wall thickness.
    pub zoom_factor: f64,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            wall_thickness: DEFAULT_WALL_THICKNESS,
            zoom_factor: DEFAULT_ZOOM_FACTOR,
        }
    }
}

impl MeshParams {
    /// Horizontal scale for a grid `width` samples wide.
    #[inline]
    pub fn scale(&self, width: usize) -> f64 {
        self.target_size / width as f64
    }

    /// Z coordinate of a top vertex with the given elevation.
    #[inline]
    pub fn top_z(&self, elevation: f64, scale: f64) -> f64 {
        elevation * self.zoom_factor * scale
    }

    /// Z coordinate of every bottom vertex.
    #[inline]
    pub fn bottom_z(&self, scale: f64) -> f64 {
        self.wall_thickness * self.zoom_factor * scale
    }

    pub fn validate(&self) -> MeshResult<()> {
        if !(self.target_size.is_finite() && self.target_size > 0.0) {
            return Err(MeshError::invalid_param(
                "target_size",
                self.target_size,
                "must be a positive finite number",
            ));
        }
        if !self.wall_thickness.is_finite() {
            return Err(MeshError::invalid_param(
                "wall_thickness",
                self.wall_thickness,
                "must be finite",
            ));
        }
        if !(self.zoom_factor.is_finite() && self.zoom_factor > 0.0) {
            return Err(MeshError::invalid_param(
                "zoom_factor",
                self.zoom_factor,
                "must be a positive finite number",
            ));
        }
        Ok(())
    }
}

/// Vertices of the solid: all top vertices row-major, then all bottom
/// vertices row-major.
///
/// Sample `(r, c)` (row `r`, column `c`) lands at
/// `(r * scale, c * scale, z)` with `scale = target_size / W`.
pub fn build_vertices(grid: &Grid, params: &MeshParams) -> Vec<Vertex> {
    let (height, width) = grid.shape();
    let n = height * width;
    if n == 0 {
        return Vec::new();
    }
    let scale = params.scale(width);
    let bottom_z = params.bottom_z(scale);

    let mut vertices = vec![Vertex::from_coords(0.0, 0.0, 0.0); 2 * n];
    let (top, bottom) = vertices.split_at_mut(n);

    top.par_chunks_mut(width)
        .zip(bottom.par_chunks_mut(width))
        .enumerate()
        .for_each(|(r, (top_row, bottom_row))| {
            let x = r as f64 * scale;
            let elevations = grid.row(r);
            for (c, ((t, b), &elev)) in top_row
                .iter_mut()
                .zip(bottom_row.iter_mut())
                .zip(elevations)
                .enumerate()
            {
                let y = c as f64 * scale;
                *t = Vertex::from_coords(x, y, params.top_z(elev as f64, scale));
                *b = Vertex::from_coords(x, y, bottom_z);
            }
        });

    vertices
}

/// Builds the closed solid for a grid.
#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    params: MeshParams,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: MeshParams) -> Self {
        Self { params }
    }

    pub fn target_size(mut self, size: f64) -> Self {
        self.params.target_size = size;
        self
    }

    pub fn wall_thickness(mut self, thickness: f64) -> Self {
        self.params.wall_thickness = thickness;
        self
    }

    pub fn zoom_factor(mut self, zoom: f64) -> Self {
        self.params.zoom_factor = zoom;
        self
    }

    pub fn params(&self) -> &MeshParams {
        &self.params
    }

    /// Build vertices and faces for `grid`.
    ///
    /// # Errors
    ///
    /// - [`MeshError::GridTooSmall`] if either side is shorter than 2 samples.
    /// - [`MeshError::InvalidParams`] for non-finite parameters or a grid
    ///   whose vertex count does not fit a `u32` index.
    /// - [`MeshError::InvalidCoordinate`] if an elevation produces NaN/Inf.
    /// - [`MeshError::FaceCountMismatch`] if face generation disagrees with
    ///   [`expected_face_count`].
    pub fn build(&self, grid: &Grid) -> MeshResult<Mesh> {
        let (height, width) = grid.shape();
        if height < 2 || width < 2 {
            return Err(MeshError::GridTooSmall { width, height });
        }
        self.params.validate()?;

        let vertex_count = 2 * height * width;
        if vertex_count > u32::MAX as usize {
            return Err(MeshError::invalid_param(
                "grid",
                format!("{}x{}", height, width),
                "too many samples for 32-bit vertex indices; use a smaller downsample factor",
            ));
        }

        let _timer = OperationTimer::with_grid("build_mesh", height, width);

        let vertices = build_vertices(grid, &self.params);
        if let Some((idx, v)) = vertices
            .iter()
            .enumerate()
            .find(|(_, v)| !v.position.z.is_finite())
        {
            return Err(MeshError::InvalidCoordinate {
                vertex_index: idx,
                coordinate: "z",
                value: v.position.z,
            });
        }
        debug!(vertices = vertices.len(), "Generated vertices");

        let faces = FaceGenerator::new(height, width).generate();
        let expected = expected_face_count(height, width);
        if faces.len() != expected {
            return Err(MeshError::face_count_mismatch(faces.len(), expected));
        }

        let mesh = Mesh { vertices, faces };
        info!(
            height,
            width,
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            scale = self.params.scale(width),
            "Built terrain solid"
        );
        log_mesh_stats(&mesh, "build_mesh");
        Ok(mesh)
    }
}
