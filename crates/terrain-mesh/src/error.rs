// Allow unused_assignments lint for error struct fields that are used in thiserror Display macros
// but appear as "never read" to the compiler.
#![allow(unused_assignments)]

//! Error types for mesh generation with rich diagnostics.
//!
//! Each error has a unique code in the format `MESH-XXXX`:
//! - `MESH-1xxx`: I/O errors (file reading, writing, parsing)
//! - `MESH-2xxx`: Validation errors (grid shape, topology, face counts)
//! - `MESH-3xxx`: Grid stage errors (wrapped [`terrain_grid::GridError`])
//! - `MESH-4xxx`: Configuration errors
//!
//! # Example
//!
//! ```rust
//! use terrain_mesh::{ErrorCode, MeshError};
//!
//! let err = MeshError::face_count_mismatch(10, 12);
//! assert_eq!(err.code(), ErrorCode::FaceCountMismatch);
//! println!("Recovery: {}", err.recovery_suggestion());
//! ```

use std::path::PathBuf;

use miette::Diagnostic;
use terrain_grid::GridError;
use thiserror::Error;

/// Result type alias for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Machine-readable error codes for mesh operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // I/O errors (1xxx)
    /// MESH-1001: Failed to read file
    IoRead = 1001,
    /// MESH-1002: Failed to write file
    IoWrite = 1002,
    /// MESH-1003: Failed to parse file format
    ParseError = 1003,

    // Validation errors (2xxx)
    /// MESH-2001: Grid too small to form a solid
    GridTooSmall = 2001,
    /// MESH-2002: Vertex has NaN or Infinity coordinate
    InvalidCoordinate = 2002,
    /// MESH-2003: Mesh has no vertices or faces
    EmptyMesh = 2003,
    /// MESH-2004: Invalid mesh topology (open, non-manifold, misoriented)
    InvalidTopology = 2004,
    /// MESH-2005: Face count differs from the closed-form count
    FaceCountMismatch = 2005,

    // Grid errors (3xxx)
    /// MESH-3001: Tile assembly, crop or resample failed
    GridStage = 3001,

    // Configuration errors (4xxx)
    /// MESH-4001: Invalid parameter value
    InvalidParams = 4001,
    /// MESH-4002: Configuration file could not be read
    ConfigRead = 4002,
    /// MESH-4003: Configuration file could not be parsed
    ConfigParse = 4003,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `MESH-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IoRead => "MESH-1001",
            ErrorCode::IoWrite => "MESH-1002",
            ErrorCode::ParseError => "MESH-1003",
            ErrorCode::GridTooSmall => "MESH-2001",
            ErrorCode::InvalidCoordinate => "MESH-2002",
            ErrorCode::EmptyMesh => "MESH-2003",
            ErrorCode::InvalidTopology => "MESH-2004",
            ErrorCode::FaceCountMismatch => "MESH-2005",
            ErrorCode::GridStage => "MESH-3001",
            ErrorCode::InvalidParams => "MESH-4001",
            ErrorCode::ConfigRead => "MESH-4002",
            ErrorCode::ConfigParse => "MESH-4003",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for mesh errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Check the input or output location.
    CheckPath { checks: Vec<String> },
    /// Adjust parameters for the operation.
    AdjustParameters { parameters: Vec<(String, String)> },
    /// Indicates a bug in mesh generation rather than bad input.
    ReportBug { details: String },
    /// Follow the grid stage's own suggestion.
    Grid { suggestion: String },
    /// No automatic recovery available.
    None,
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::CheckPath { checks } => {
                write!(f, "Check: {}", checks.join(", "))
            }
            RecoverySuggestion::AdjustParameters { parameters } => {
                let params: Vec<String> = parameters
                    .iter()
                    .map(|(k, v)| format!("{} = {}", k, v))
                    .collect();
                write!(f, "Try adjusting: {}", params.join(", "))
            }
            RecoverySuggestion::ReportBug { details } => {
                write!(f, "This is an internal consistency failure: {}", details)
            }
            RecoverySuggestion::Grid { suggestion } => write!(f, "{}", suggestion),
            RecoverySuggestion::None => write!(f, "No automatic recovery available"),
        }
    }
}

/// Errors that can occur while building, validating or writing a mesh.
#[derive(Debug, Error, Diagnostic)]
pub enum MeshError {
    /// Error reading from a file.
    #[error("failed to read mesh from {path}")]
    #[diagnostic(
        code(mesh::io::read),
        help("Check that the file exists and is readable")
    )]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing to a file.
    #[error("failed to write mesh to {path}")]
    #[diagnostic(
        code(mesh::io::write),
        help("Check that the directory exists and is writable")
    )]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing a mesh file.
    #[error("failed to parse mesh from {path}: {details}")]
    #[diagnostic(
        code(mesh::parse::error),
        help("The file may be truncated or not a binary STL")
    )]
    ParseError { path: PathBuf, details: String },

    /// Grid cannot form a closed solid.
    #[error("grid of {height}x{width} samples is too small; at least 2x2 is needed")]
    #[diagnostic(
        code(mesh::validation::grid_too_small),
        help("Use a larger crop window or a larger downsample factor")
    )]
    GridTooSmall { width: usize, height: usize },

    /// Mesh has no vertices or faces.
    #[error("mesh is empty: {details}")]
    #[diagnostic(code(mesh::validation::empty))]
    EmptyMesh { details: String },

    /// Invalid coordinate value (NaN or Infinity).
    #[error("invalid coordinate at vertex {vertex_index}: {coordinate} is {value}")]
    #[diagnostic(
        code(mesh::validation::coordinate),
        help("Check the scale parameters; target size and wall thickness must be finite")
    )]
    InvalidCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
        value: f64,
    },

    /// Mesh is not a closed, consistently oriented manifold.
    #[error("invalid mesh topology: {details}")]
    #[diagnostic(
        code(mesh::validation::topology),
        help("Generated solids are closed by construction; this points at an indexing bug")
    )]
    InvalidTopology { details: String },

    /// Face count differs from the closed-form count for the grid shape.
    #[error("generated {actual} faces, expected {expected}")]
    #[diagnostic(
        code(mesh::validation::face_count),
        help("Face generation and the face-count formula disagree; this is an internal bug")
    )]
    FaceCountMismatch { expected: usize, actual: usize },

    /// Grid stage failed.
    ///
    /// Displays the grid error unchanged; its own code is on the inner value.
    #[error(transparent)]
    #[diagnostic(code(mesh::grid::stage))]
    Grid(#[from] GridError),

    /// Invalid parameter value.
    #[error("invalid parameter {name} = {value}: {details}")]
    #[diagnostic(code(mesh::params::invalid))]
    InvalidParams {
        name: String,
        value: String,
        details: String,
    },

    /// Configuration file could not be read.
    #[error("failed to read configuration {path}")]
    #[diagnostic(code(mesh::config::read))]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration {path}: {details}")]
    #[diagnostic(
        code(mesh::config::parse),
        help("Check the TOML syntax and the key names under [grid] and [mesh]")
    )]
    ConfigParse { path: PathBuf, details: String },
}

impl MeshError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MeshError::IoRead { .. } => ErrorCode::IoRead,
            MeshError::IoWrite { .. } => ErrorCode::IoWrite,
            MeshError::ParseError { .. } => ErrorCode::ParseError,
            MeshError::GridTooSmall { .. } => ErrorCode::GridTooSmall,
            MeshError::EmptyMesh { .. } => ErrorCode::EmptyMesh,
            MeshError::InvalidCoordinate { .. } => ErrorCode::InvalidCoordinate,
            MeshError::InvalidTopology { .. } => ErrorCode::InvalidTopology,
            MeshError::FaceCountMismatch { .. } => ErrorCode::FaceCountMismatch,
            MeshError::Grid(_) => ErrorCode::GridStage,
            MeshError::InvalidParams { .. } => ErrorCode::InvalidParams,
            MeshError::ConfigRead { .. } => ErrorCode::ConfigRead,
            MeshError::ConfigParse { .. } => ErrorCode::ConfigParse,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            MeshError::IoRead { .. } | MeshError::ConfigRead { .. } => {
                RecoverySuggestion::CheckPath {
                    checks: vec!["file exists".into(), "file permissions".into()],
                }
            }
            MeshError::IoWrite { .. } => RecoverySuggestion::CheckPath {
                checks: vec!["directory exists".into(), "write permissions".into()],
            },
            MeshError::GridTooSmall { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![("downsample_factor".into(), "try a larger value".into())],
            },
            MeshError::InvalidCoordinate { .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![
                    ("target_size".into(), "finite and positive".into()),
                    ("wall_thickness".into(), "finite".into()),
                ],
            },
            MeshError::InvalidTopology { details } => RecoverySuggestion::ReportBug {
                details: details.clone(),
            },
            MeshError::FaceCountMismatch { expected, actual } => RecoverySuggestion::ReportBug {
                details: format!("{} faces generated, {} expected", actual, expected),
            },
            MeshError::Grid(e) => RecoverySuggestion::Grid {
                suggestion: e.recovery_suggestion().to_string(),
            },
            MeshError::InvalidParams { name, details, .. } => {
                RecoverySuggestion::AdjustParameters {
                    parameters: vec![(name.clone(), details.clone())],
                }
            }
            MeshError::ParseError { .. }
            | MeshError::EmptyMesh { .. }
            | MeshError::ConfigParse { .. } => RecoverySuggestion::None,
        }
    }

    // Constructor helpers for common error patterns

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeshError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create an IoWrite error.
    pub fn io_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeshError::IoWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a ParseError.
    pub fn parse_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        MeshError::ParseError {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Create an InvalidTopology error.
    pub fn invalid_topology(details: impl Into<String>) -> Self {
        MeshError::InvalidTopology {
            details: details.into(),
        }
    }

    /// Create a FaceCountMismatch error.
    pub fn face_count_mismatch(actual: usize, expected: usize) -> Self {
        MeshError::FaceCountMismatch { expected, actual }
    }

    /// Create an InvalidParams error.
    pub fn invalid_param(
        name: impl Into<String>,
        value: impl ToString,
        details: impl Into<String>,
    ) -> Self {
        MeshError::InvalidParams {
            name: name.into(),
            value: value.to_string(),
            details: details.into(),
        }
    }
}
