//! Crop window and exclusion mask.
//!
//! The divisors and factors below were fitted by hand to one dataset's
//! reachable area. They are kept as named parameters with their observed
//! defaults; there is no analytic derivation for them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GridError, GridResult};
use crate::grid::Grid;

/// Divisors that place the crop window inside the full grid.
///
/// ```text
/// x_min  = floor(width / x_margin_divisor)
/// x_max  = width - x_min
/// x_min += floor(x_max / x_shift_divisor)
/// y_min  = floor(height / y_margin_divisor)
/// y_max  = floor(height - y_min + height / y_extra_divisor)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropRatios {
    pub x_margin_divisor: f64,
    pub x_shift_divisor: f64,
    pub y_margin_divisor: f64,
    pub y_extra_divisor: f64,
}

impl Default for CropRatios {
    fn default() -> Self {
        Self {
            x_margin_divisor: 12.0,
            x_shift_divisor: 50.0,
            y_margin_divisor: 5.75,
            y_extra_divisor: 70.0,
        }
    }
}

impl CropRatios {
    fn validate(&self) -> GridResult<()> {
        for (name, value) in [
            ("x_margin_divisor", self.x_margin_divisor),
            ("x_shift_divisor", self.x_shift_divisor),
            ("y_margin_divisor", self.y_margin_divisor),
            ("y_extra_divisor", self.y_extra_divisor),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(GridError::invalid_param(
                    name,
                    value,
                    "crop divisors must be positive",
                ));
            }
        }
        Ok(())
    }
}

/// Inclusive rectangle of retained samples, in full-grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
}

impl CropWindow {
    /// Compute the window for a `width`×`height` grid.
    ///
    /// Upper bounds are clamped to the last valid index. A window with no
    /// columns or rows is a [`GridError::DegenerateCrop`].
    pub fn compute(width: usize, height: usize, ratios: &CropRatios) -> GridResult<Self> {
        ratios.validate()?;

        let w = width as f64;
        let h = height as f64;

        let mut x_min = (w / ratios.x_margin_divisor).floor() as i64;
        let mut x_max = width as i64 - x_min;
        x_min += (x_max as f64 / ratios.x_shift_divisor).floor() as i64;
        x_max = x_max.min(width as i64 - 1);

        let y_min = (h / ratios.y_margin_divisor).floor() as i64;
        let y_max = ((h - y_min as f64 + h / ratios.y_extra_divisor).floor() as i64)
            .min(height as i64 - 1);

        if width == 0 || height == 0 || x_max < x_min || y_max < y_min {
            return Err(GridError::DegenerateCrop {
                x_min,
                x_max,
                y_min,
                y_max,
                width,
                height,
            });
        }

        let window = Self {
            x_min: x_min as usize,
            x_max: x_max as usize,
            y_min: y_min as usize,
            y_max: y_max as usize,
        };
        debug!(?window, width, height, "Computed crop window");
        Ok(window)
    }

    /// A window covering the whole grid.
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x_min: 0,
            x_max: width.saturating_sub(1),
            y_min: 0,
            y_max: height.saturating_sub(1),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.x_max - self.x_min + 1
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.y_max - self.y_min + 1
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }
}

/// Whether the grid is cropped, and with which divisors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CropSpec {
    Ratios(CropRatios),
    Disabled,
}

impl Default for CropSpec {
    fn default() -> Self {
        CropSpec::Ratios(CropRatios::default())
    }
}

impl CropSpec {
    /// Window for a `width`×`height` grid, or `None` when cropping is off.
    pub fn window(&self, width: usize, height: usize) -> GridResult<Option<CropWindow>> {
        match self {
            CropSpec::Ratios(ratios) => CropWindow::compute(width, height, ratios).map(Some),
            CropSpec::Disabled => Ok(None),
        }
    }
}

/// Copy the window's samples into a new grid.
///
/// The input grid is consumed; the result is `window.width()`×`window.height()`.
pub fn crop_grid(grid: Grid, window: &CropWindow) -> GridResult<Grid> {
    if window.x_max >= grid.width() || window.y_max >= grid.height() {
        return Err(GridError::DegenerateCrop {
            x_min: window.x_min as i64,
            x_max: window.x_max as i64,
            y_min: window.y_min as i64,
            y_max: window.y_max as i64,
            width: grid.width(),
            height: grid.height(),
        });
    }

    let mut out = Grid::zeros(window.width(), window.height());
    for (dy, y) in (window.y_min..=window.y_max).enumerate() {
        out.row_mut(dy)
            .copy_from_slice(&grid.row(y)[window.x_min..=window.x_max]);
    }
    Ok(out)
}

/// Inclusive rectangle of samples forced to zero, in full-grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionMask {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
}

impl ExclusionMask {
    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

/// Factors that derive the exclusion mask from a crop window.
///
/// Masked columns satisfy `x < crop.x_min * x_extent`; masked rows satisfy
/// `crop.y_min * y_start < y < crop.y_min * y_end`. Both comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskRatios {
    pub x_extent: f64,
    pub y_start: f64,
    pub y_end: f64,
}

impl Default for MaskRatios {
    fn default() -> Self {
        Self {
            x_extent: 1.3,
            y_start: 2.0,
            y_end: 2.8,
        }
    }
}

impl MaskRatios {
    /// Resolve to an inclusive rectangle, or `None` if it covers nothing.
    pub fn derive(&self, window: &CropWindow) -> Option<ExclusionMask> {
        let x_limit = window.x_min as f64 * self.x_extent;
        let y_low = window.y_min as f64 * self.y_start;
        let y_high = window.y_min as f64 * self.y_end;

        // Largest integer strictly below `x_limit` / `y_high`, smallest strictly above `y_low`.
        let x_max = x_limit.ceil() as i64 - 1;
        let y_min = y_low.floor() as i64 + 1;
        let y_max = y_high.ceil() as i64 - 1;

        if x_max < 0 || y_max < y_min || y_min < 0 {
            return None;
        }
        Some(ExclusionMask {
            x_min: 0,
            x_max: x_max as usize,
            y_min: y_min as usize,
            y_max: y_max as usize,
        })
    }
}

/// How the exclusion mask is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MaskSpec {
    /// Derive from the crop window.
    Derived(MaskRatios),
    /// Use this rectangle.
    Explicit(ExclusionMask),
    /// No mask.
    Disabled,
}

impl Default for MaskSpec {
    fn default() -> Self {
        MaskSpec::Derived(MaskRatios::default())
    }
}

impl MaskSpec {
    /// Resolve against the crop window, if cropping is enabled.
    pub fn resolve(&self, window: Option<&CropWindow>) -> Option<ExclusionMask> {
        match self {
            MaskSpec::Derived(ratios) => window.and_then(|w| ratios.derive(w)),
            MaskSpec::Explicit(mask) => Some(*mask),
            MaskSpec::Disabled => None,
        }
    }
}
