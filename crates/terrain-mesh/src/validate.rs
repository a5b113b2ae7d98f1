//! Mesh validation and reporting.

use nalgebra::Point3;
use serde::Serialize;
use tracing::{debug, warn};

use crate::Mesh;
use crate::adjacency::MeshAdjacency;
use crate::error::{MeshError, MeshResult};

/// Validation report for a mesh.
#[derive(Debug, Clone, Serialize)]
pub struct MeshReport {
    /// Whether the mesh has no boundary edges.
    pub is_watertight: bool,

    /// Whether all edges have at most 2 adjacent faces.
    pub is_manifold: bool,

    /// Whether every shared edge is walked once in each direction.
    pub is_consistently_wound: bool,

    /// Number of boundary edges (edges with 1 adjacent face).
    pub boundary_edge_count: usize,

    /// Number of non-manifold edges (edges with >2 adjacent faces).
    pub non_manifold_edge_count: usize,

    /// Number of shared edges walked twice in the same direction.
    pub inconsistent_edge_count: usize,

    /// Total vertex count.
    pub vertex_count: usize,

    /// Total face count.
    pub face_count: usize,

    /// Bounding box as ([min x, y, z], [max x, y, z]).
    #[serde(serialize_with = "serialize_bounds")]
    pub bounds: Option<(Point3<f64>, Point3<f64>)>,

    /// Dimensions (x, y, z).
    pub dimensions: Option<(f64, f64, f64)>,

    /// Signed volume (positive = outward normals, negative = inside-out).
    /// Only meaningful for closed meshes.
    pub signed_volume: f64,

    /// Absolute volume.
    pub volume: f64,

    /// Total surface area.
    pub surface_area: f64,

    /// Whether the mesh appears to be inside-out (negative signed volume).
    pub is_inside_out: bool,
}

fn serialize_bounds<S>(
    bounds: &Option<(Point3<f64>, Point3<f64>)>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    bounds
        .map(|(min, max)| ([min.x, min.y, min.z], [max.x, max.y, max.z]))
        .serialize(serializer)
}

impl MeshReport {
    /// Check if mesh has any geometry at all.
    pub fn is_valid(&self) -> bool {
        self.vertex_count > 0 && self.face_count > 0
    }

    /// Check if mesh is suitable for 3D printing.
    ///
    /// A printable mesh must be:
    /// - Watertight (no boundary edges)
    /// - Manifold (no edge shared by more than 2 faces)
    /// - Consistently wound, with normals pointing outward
    pub fn is_printable(&self) -> bool {
        self.is_valid()
            && self.is_watertight
            && self.is_manifold
            && self.is_consistently_wound
            && !self.is_inside_out
    }

    /// Turn a failed check into [`MeshError::InvalidTopology`].
    pub fn require_printable(&self) -> MeshResult<()> {
        if !self.is_valid() {
            return Err(MeshError::EmptyMesh {
                details: format!(
                    "{} vertices, {} faces",
                    self.vertex_count, self.face_count
                ),
            });
        }
        if self.is_printable() {
            return Ok(());
        }
        let mut problems = Vec::new();
        if !self.is_watertight {
            problems.push(format!("{} boundary edges", self.boundary_edge_count));
        }
        if !self.is_manifold {
            problems.push(format!(
                "{} non-manifold edges",
                self.non_manifold_edge_count
            ));
        }
        if !self.is_consistently_wound {
            problems.push(format!(
                "{} inconsistently wound edges",
                self.inconsistent_edge_count
            ));
        }
        if self.is_inside_out {
            problems.push("negative signed volume".to_string());
        }
        Err(MeshError::invalid_topology(problems.join(", ")))
    }
}

impl std::fmt::Display for MeshReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Mesh Report:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Faces: {}", self.face_count)?;

        if let Some((min, max)) = &self.bounds {
            writeln!(
                f,
                "  Bounds: [{:.1}, {:.1}, {:.1}] to [{:.1}, {:.1}, {:.1}]",
                min.x, min.y, min.z, max.x, max.y, max.z
            )?;
        }

        if let Some((dx, dy, dz)) = &self.dimensions {
            writeln!(f, "  Dimensions: {:.1} x {:.1} x {:.1}", dx, dy, dz)?;
        }

        writeln!(f, "  Surface Area: {:.2}", self.surface_area)?;
        writeln!(
            f,
            "  Volume: {:.2} (signed: {:.2})",
            self.volume, self.signed_volume
        )?;

        writeln!(
            f,
            "  Watertight: {} (boundary edges: {})",
            if self.is_watertight { "yes" } else { "NO" },
            self.boundary_edge_count
        )?;

        writeln!(
            f,
            "  Manifold: {} (non-manifold edges: {})",
            if self.is_manifold { "yes" } else { "NO" },
            self.non_manifold_edge_count
        )?;

        writeln!(
            f,
            "  Winding: {} (inconsistent edges: {})",
            if self.is_consistently_wound {
                "consistent"
            } else {
                "MIXED"
            },
            self.inconsistent_edge_count
        )?;

        writeln!(
            f,
            "  Orientation: {}",
            if self.is_inside_out {
                "INSIDE-OUT"
            } else {
                "correct"
            }
        )?;

        writeln!(
            f,
            "  Printable: {}",
            if self.is_printable() { "yes" } else { "NO" }
        )?;

        Ok(())
    }
}

/// Validate a mesh and return a report.
pub fn validate_mesh(mesh: &Mesh) -> MeshReport {
    let adjacency = MeshAdjacency::build(&mesh.faces);

    let boundary_edge_count = adjacency.boundary_edge_count();
    let non_manifold_edge_count = adjacency.non_manifold_edge_count();
    let inconsistent_edge_count = adjacency.inconsistent_edge_count();

    let bounds = mesh.bounds();
    let dimensions = bounds.map(|(min, max)| (max.x - min.x, max.y - min.y, max.z - min.z));

    let signed_volume = mesh.signed_volume();

    let report = MeshReport {
        is_watertight: boundary_edge_count == 0,
        is_manifold: non_manifold_edge_count == 0,
        is_consistently_wound: inconsistent_edge_count == 0,
        boundary_edge_count,
        non_manifold_edge_count,
        inconsistent_edge_count,
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        bounds,
        dimensions,
        signed_volume,
        volume: signed_volume.abs(),
        surface_area: mesh.surface_area(),
        is_inside_out: signed_volume < 0.0,
    };

    if !report.is_watertight {
        warn!(
            "Mesh is not watertight: {} boundary edges",
            boundary_edge_count
        );
    }

    if !report.is_manifold {
        warn!(
            "Mesh is not manifold: {} non-manifold edges",
            non_manifold_edge_count
        );
    }

    if !report.is_consistently_wound {
        warn!(
            "Mesh winding is inconsistent: {} edges",
            inconsistent_edge_count
        );
    }

    if report.is_inside_out && report.is_watertight {
        warn!("Mesh appears to be inside-out (negative signed volume)");
    }

    debug!("{}", report);

    report
}
