//! Watertight terrain solids from elevation grids.
//!
//! This crate turns a [`terrain_grid::Grid`] into a closed triangle mesh (a
//! top surface following the terrain, a flat bottom and four side walls),
//! checks that it is printable, and writes it as binary STL.
//!
//! # Coordinate System
//!
//! Right-handed, with the grid's rows along **X**, its columns along **Y**
//! and elevation along **Z**. The row axis is scaled so the grid width maps
//! to `target_size` (default 255, read as millimetres by most slicers).
//!
//! Face winding is **counter-clockwise (CCW) when viewed from outside** the
//! solid, so normals point outward by the right-hand rule.
//!
//! # Quick Start
//!
//! ```
//! use terrain_grid::Grid;
//! use terrain_mesh::{MeshBuilder, expected_face_count};
//!
//! let grid = Grid::from_rows(&[[10.0, 12.0], [11.0, 15.0]]).unwrap();
//! let mesh = MeshBuilder::new().build(&grid).unwrap();
//!
//! assert_eq!(mesh.vertex_count(), 8);
//! assert_eq!(mesh.face_count(), expected_face_count(2, 2));
//! assert!(mesh.validate().is_printable());
//! ```
//!
//! For the full tile-directory-to-STL run, see [`Pipeline`].
//!
//! # Index Layout
//!
//! For an `H x W` grid the mesh has `2 * H * W` vertices: the top vertex of
//! sample `(r, c)` is `r * W + c`, the bottom vertex is `H * W + r * W + c`.
//! Nothing is deduplicated, and the face count is always
//! `4(H-1)(W-1) + 4(H-1) + 4(W-1)`.

mod builder;
mod error;
mod pipeline;
pub mod tracing_ext;
mod types;

pub mod adjacency;
pub mod faces;
pub mod io;
pub mod validate;

// Re-export core types at crate root
pub use error::{ErrorCode, MeshError, MeshResult, RecoverySuggestion};
pub use types::{Mesh, Triangle, Vertex};

pub use adjacency::MeshAdjacency;

pub use builder::{
    DEFAULT_TARGET_SIZE, DEFAULT_WALL_THICKNESS, DEFAULT_ZOOM_FACTOR, MeshBuilder, MeshParams,
    build_vertices,
};
pub use faces::{
    FaceGenerator, Side, WallPost, Winding, expected_face_count, generate_faces, wall_quad,
};
pub use io::{load_stl, read_facet_count, save_stl, save_stl_checked};
pub use pipeline::{ConversionConfig, ConversionSummary, GridConfig, MeshConfig, Pipeline};
pub use validate::{MeshReport, validate_mesh};

pub use tracing_ext::{OperationTimer, log_mesh_stats, log_validation_result};

// Convenience methods on Mesh
impl Mesh {
    /// Load a mesh from an STL file.
    pub fn load(path: impl AsRef<std::path::Path>) -> MeshResult<Self> {
        io::load_stl(path.as_ref())
    }

    /// Save the mesh as binary STL.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> MeshResult<()> {
        io::save_stl(self, path.as_ref())
    }

    /// Validate the mesh and return a report of any issues.
    pub fn validate(&self) -> MeshReport {
        validate::validate_mesh(self)
    }
}
