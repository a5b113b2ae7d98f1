//! Tracing helpers for the conversion stages.
//!
//! Stage timings are emitted under the `terrain_mesh::timing` target, mesh
//! summaries under `terrain_mesh::mesh_state` and validation outcomes under
//! `terrain_mesh::validation`, so each can be filtered independently:
//!
//! ```text
//! RUST_LOG=terrain_mesh::timing=info,terrain_grid=debug terrain2stl convert ...
//! ```

use std::time::Instant;
use tracing::{Span, debug, info, warn};

use crate::{Mesh, MeshReport};

/// A stage timer that logs its duration on drop.
///
/// ```rust
/// use terrain_mesh::tracing_ext::OperationTimer;
///
/// {
///     let _timer = OperationTimer::new("downsample");
///     // ... work ...
/// } // duration is logged here
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTimer {
    /// Start timing the named stage.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("conversion_stage", stage = name);
        debug!(target: "terrain_mesh::timing", stage = name, "Starting stage");
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Start timing a stage that works on a grid of the given shape.
    pub fn with_grid(name: &'static str, height: usize, width: usize) -> Self {
        let span = tracing::info_span!("conversion_stage", stage = name, height, width);
        debug!(
            target: "terrain_mesh::timing",
            stage = name,
            height,
            width,
            "Starting stage"
        );
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Milliseconds since the timer started.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        info!(
            target: "terrain_mesh::timing",
            stage = self.name,
            elapsed_ms = format!("{:.2}", elapsed_ms),
            "Stage completed"
        );
    }
}

/// Log vertex/face counts and extents at debug level.
pub fn log_mesh_stats(mesh: &Mesh, context: &str) {
    let (min_bounds, max_bounds) = mesh.bounds().unwrap_or_default();
    let dims = max_bounds - min_bounds;

    debug!(
        target: "terrain_mesh::mesh_state",
        context = context,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        dimensions = format!("{:.2} x {:.2} x {:.2}", dims.x, dims.y, dims.z),
        "Mesh state"
    );
}

/// Log a validation report: info when printable, warn otherwise.
pub fn log_validation_result(report: &MeshReport) {
    if report.is_printable() {
        info!(
            target: "terrain_mesh::validation",
            is_watertight = report.is_watertight,
            is_manifold = report.is_manifold,
            vertex_count = report.vertex_count,
            face_count = report.face_count,
            "Mesh validation passed"
        );
    } else {
        warn!(
            target: "terrain_mesh::validation",
            is_watertight = report.is_watertight,
            is_manifold = report.is_manifold,
            boundary_edges = report.boundary_edge_count,
            non_manifold_edges = report.non_manifold_edge_count,
            inconsistent_edges = report.inconsistent_edge_count,
            is_inside_out = report.is_inside_out,
            "Mesh validation found issues"
        );
    }
}
