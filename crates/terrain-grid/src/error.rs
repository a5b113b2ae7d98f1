// Allow unused_assignments lint for error struct fields that are used in thiserror Display macros
// but appear as "never read" to the compiler.
#![allow(unused_assignments)]

//! Error types for grid assembly with rich diagnostics.
//!
//! This module provides:
//! - Machine-readable error codes for programmatic handling
//! - Rich context (tile paths, folder indices, grid dimensions)
//! - Recovery suggestions for common issues
//! - Terminal display via miette

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for grid operations.
pub type GridResult<T> = Result<T, GridError>;

/// Machine-readable error codes for grid operations.
///
/// Codes follow the pattern `GRID-XXXX` where:
/// - 1xxx = Tile I/O errors
/// - 2xxx = Layout errors
/// - 3xxx = Parameter and validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridErrorCode {
    /// GRID-1001: Failed to read a tile or directory
    IoRead = 1001,
    /// GRID-1002: Tile file has the wrong size
    TileSize = 1002,
    /// GRID-1003: Expected tile is absent (strict mode)
    MissingTile = 1003,
    /// GRID-1004: Failed to write the debug raster
    IoWrite = 1004,

    /// GRID-2001: Folder count does not match the placement table
    LayoutMismatch = 2001,
    /// GRID-2002: Placement table is malformed
    InvalidPlacement = 2002,
    /// GRID-2003: A folder holds more tiles than a super-tile has quadrants
    TooManyTiles = 2003,

    /// GRID-3001: Crop window has zero width or height
    DegenerateCrop = 3001,
    /// GRID-3002: Invalid parameters
    InvalidParams = 3002,
}

impl GridErrorCode {
    /// Returns the error code as a string in the format `GRID-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            GridErrorCode::IoRead => "GRID-1001",
            GridErrorCode::TileSize => "GRID-1002",
            GridErrorCode::MissingTile => "GRID-1003",
            GridErrorCode::IoWrite => "GRID-1004",
            GridErrorCode::LayoutMismatch => "GRID-2001",
            GridErrorCode::InvalidPlacement => "GRID-2002",
            GridErrorCode::TooManyTiles => "GRID-2003",
            GridErrorCode::DegenerateCrop => "GRID-3001",
            GridErrorCode::InvalidParams => "GRID-3002",
        }
    }
}

impl std::fmt::Display for GridErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for grid errors.
#[derive(Debug, Clone, PartialEq)]
pub enum GridRecoverySuggestion {
    /// Re-extract the tile from the source archive.
    ReextractTile { path: PathBuf },
    /// Check the input directory layout.
    CheckLayout { expected_folders: usize },
    /// Relax strict mode so missing tiles are zero-filled.
    DisableStrict,
    /// Adjust a parameter.
    AdjustParameter { name: String, hint: String },
    /// No specific suggestion.
    None,
}

impl std::fmt::Display for GridRecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridRecoverySuggestion::ReextractTile { path } => {
                write!(f, "Re-extract {} from the source data", path.display())
            }
            GridRecoverySuggestion::CheckLayout { expected_folders } => {
                write!(
                    f,
                    "Check that the input directory holds exactly {} region folders",
                    expected_folders
                )
            }
            GridRecoverySuggestion::DisableStrict => {
                write!(f, "Run without --strict to zero-fill missing tiles")
            }
            GridRecoverySuggestion::AdjustParameter { name, hint } => {
                write!(f, "Try adjusting {}: {}", name, hint)
            }
            GridRecoverySuggestion::None => {
                write!(f, "No specific suggestion available")
            }
        }
    }
}

/// Errors that can occur while assembling, cropping or resampling a grid.
#[derive(Debug, Error, Diagnostic)]
pub enum GridError {
    /// Error reading a tile file or walking the input directory.
    #[error("failed to read {path}")]
    #[diagnostic(
        code(grid::io::read),
        help("Check that the path exists and is readable")
    )]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing the debug raster.
    #[error("failed to write {path}: {details}")]
    #[diagnostic(
        code(grid::io::write),
        help("Check that the directory exists and is writable")
    )]
    IoWrite { path: PathBuf, details: String },

    /// Tile file does not contain exactly one tile of samples.
    #[error("tile {path} is {actual} bytes, expected {expected}")]
    #[diagnostic(
        code(grid::tile::size),
        help("Tiles are raw little-endian u16 samples with no header. The file may be truncated.")
    )]
    TileSize {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// A tile expected by the layout is missing (strict mode only).
    #[error("folder {folder} has {found} tiles, expected {expected}")]
    #[diagnostic(
        code(grid::tile::missing),
        help("Missing tiles are zero-filled unless strict mode is enabled")
    )]
    MissingTile {
        folder: PathBuf,
        found: usize,
        expected: usize,
    },

    /// A folder holds more tiles than fit in one super-tile.
    #[error("folder {folder} has {found} tiles, but a super-tile holds only {capacity}")]
    #[diagnostic(
        code(grid::layout::too_many_tiles),
        help("Extra tiles would spill into a neighbouring super-tile. Remove stray files.")
    )]
    TooManyTiles {
        folder: PathBuf,
        found: usize,
        capacity: usize,
    },

    /// Folder count does not match the placement table.
    #[error("found {found} region folders, but the placement table has {expected} entries")]
    #[diagnostic(
        code(grid::layout::mismatch),
        help("Spatial assembly needs one folder per placement entry, in sorted order")
    )]
    LayoutMismatch { found: usize, expected: usize },

    /// Placement table is malformed.
    #[error("invalid placement table: {details}")]
    #[diagnostic(code(grid::layout::placement))]
    InvalidPlacement { details: String },

    /// Crop window has zero width or height.
    #[error(
        "crop window is empty: x {x_min}..={x_max}, y {y_min}..={y_max} on a {width}x{height} grid"
    )]
    #[diagnostic(
        code(grid::crop::degenerate),
        help("The crop divisors are tuned for a 3072x3072 grid; disable cropping for small inputs")
    )]
    DegenerateCrop {
        x_min: i64,
        x_max: i64,
        y_min: i64,
        y_max: i64,
        width: usize,
        height: usize,
    },

    /// Invalid parameters.
    #[error("invalid parameter {name} = {value}: {details}")]
    #[diagnostic(code(grid::params::invalid))]
    InvalidParams {
        name: String,
        value: String,
        details: String,
    },
}

impl GridError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> GridErrorCode {
        match self {
            GridError::IoRead { .. } => GridErrorCode::IoRead,
            GridError::IoWrite { .. } => GridErrorCode::IoWrite,
            GridError::TileSize { .. } => GridErrorCode::TileSize,
            GridError::MissingTile { .. } => GridErrorCode::MissingTile,
            GridError::TooManyTiles { .. } => GridErrorCode::TooManyTiles,
            GridError::LayoutMismatch { .. } => GridErrorCode::LayoutMismatch,
            GridError::InvalidPlacement { .. } => GridErrorCode::InvalidPlacement,
            GridError::DegenerateCrop { .. } => GridErrorCode::DegenerateCrop,
            GridError::InvalidParams { .. } => GridErrorCode::InvalidParams,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> GridRecoverySuggestion {
        match self {
            GridError::TileSize { path, .. } => {
                GridRecoverySuggestion::ReextractTile { path: path.clone() }
            }
            GridError::MissingTile { .. } => GridRecoverySuggestion::DisableStrict,
            GridError::LayoutMismatch { expected, .. } => GridRecoverySuggestion::CheckLayout {
                expected_folders: *expected,
            },
            GridError::DegenerateCrop { .. } => GridRecoverySuggestion::AdjustParameter {
                name: "crop".into(),
                hint: "use --no-crop or smaller divisors".into(),
            },
            GridError::InvalidParams { name, details, .. } => {
                GridRecoverySuggestion::AdjustParameter {
                    name: name.clone(),
                    hint: details.clone(),
                }
            }
            _ => GridRecoverySuggestion::None,
        }
    }

    // Constructor helpers

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GridError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid placement error.
    pub fn invalid_placement(details: impl Into<String>) -> Self {
        GridError::InvalidPlacement {
            details: details.into(),
        }
    }

    /// Create an invalid params error.
    pub fn invalid_param(
        name: impl Into<String>,
        value: impl ToString,
        details: impl Into<String>,
    ) -> Self {
        GridError::InvalidParams {
            name: name.into(),
            value: value.to_string(),
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = GridError::LayoutMismatch {
            found: 35,
            expected: 36,
        };
        assert_eq!(err.code(), GridErrorCode::LayoutMismatch);
        assert_eq!(err.code().as_str(), "GRID-2001");
    }

    #[test]
    fn test_tile_size_display() {
        let err = GridError::TileSize {
            path: PathBuf::from("a/b.hght"),
            expected: 131072,
            actual: 100,
        };
        let display = format!("{}", err);
        assert!(display.contains("a/b.hght"));
        assert!(display.contains("131072"));
        assert!(display.contains("100 bytes"));
    }

    #[test]
    fn test_layout_suggestion() {
        let err = GridError::LayoutMismatch {
            found: 2,
            expected: 36,
        };
        match err.recovery_suggestion() {
            GridRecoverySuggestion::CheckLayout { expected_folders } => {
                assert_eq!(expected_folders, 36)
            }
            other => panic!("Expected CheckLayout, got {:?}", other),
        }
    }
}
