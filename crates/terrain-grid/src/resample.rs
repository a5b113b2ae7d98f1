//! Uniform grid resampling.
//!
//! A full-resolution grid would turn into a mesh of several gigabytes, so the
//! cropped grid is resampled once by a constant factor before meshing. The
//! resampling is separable and interpolating: each output sample is a weighted
//! sum of nearby input samples along x, then along y.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GridError, GridResult};
use crate::grid::Grid;

/// Default resampling factor.
pub const DEFAULT_DOWNSAMPLE_FACTOR: f64 = 0.5;

/// Interpolation kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    /// Bilinear interpolation.
    Linear,
    /// Catmull-Rom bicubic interpolation.
    #[default]
    Cubic,
}

impl ResampleFilter {
    /// Kernel weight at distance `t` from the sample point.
    fn weight(self, t: f64) -> f64 {
        let t = t.abs();
        match self {
            ResampleFilter::Linear => (1.0 - t).max(0.0),
            ResampleFilter::Cubic => {
                if t <= 1.0 {
                    1.5 * t * t * t - 2.5 * t * t + 1.0
                } else if t < 2.0 {
                    -0.5 * t * t * t + 2.5 * t * t - 4.0 * t + 2.0
                } else {
                    0.0
                }
            }
        }
    }

    fn radius(self) -> isize {
        match self {
            ResampleFilter::Linear => 1,
            ResampleFilter::Cubic => 2,
        }
    }
}

/// Output length for `len` input samples scaled by `factor`.
///
/// Rounds half to even and never returns zero.
pub fn output_len(len: usize, factor: f64) -> usize {
    ((len as f64 * factor).round_ties_even() as usize).max(1)
}

/// Resamples a grid by a constant factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Downsampler {
    pub factor: f64,
    pub filter: ResampleFilter,
}

impl Default for Downsampler {
    fn default() -> Self {
        Self {
            factor: DEFAULT_DOWNSAMPLE_FACTOR,
            filter: ResampleFilter::default(),
        }
    }
}

impl Downsampler {
    pub fn new(factor: f64, filter: ResampleFilter) -> Self {
        Self { factor, filter }
    }

    /// Output (height, width) for a given input grid.
    pub fn output_shape(&self, grid: &Grid) -> (usize, usize) {
        (
            output_len(grid.height(), self.factor),
            output_len(grid.width(), self.factor),
        )
    }

    /// Resample `grid`, consuming it.
    ///
    /// When the output shape equals the input shape the grid is returned
    /// unchanged.
    pub fn apply(&self, grid: Grid) -> GridResult<Grid> {
        if !(self.factor.is_finite() && self.factor > 0.0) {
            return Err(GridError::invalid_param(
                "downsample_factor",
                self.factor,
                "must be a positive finite number",
            ));
        }
        if grid.is_empty() {
            return Err(GridError::invalid_param(
                "grid",
                "0 samples",
                "cannot resample an empty grid",
            ));
        }

        let (out_h, out_w) = self.output_shape(&grid);
        if (out_h, out_w) == grid.shape() {
            debug!(factor = self.factor, "Resample is a no-op for this shape");
            return Ok(grid);
        }

        let in_w = grid.width();
        let x_taps = taps(in_w, out_w, self.filter);
        let y_taps = taps(grid.height(), out_h, self.filter);

        // Horizontal pass: height × out_w.
        let mut horizontal = vec![0.0f32; grid.height() * out_w];
        horizontal
            .par_chunks_mut(out_w)
            .zip(grid.values().par_chunks(in_w))
            .for_each(|(out_row, in_row)| {
                for (out, taps) in out_row.iter_mut().zip(&x_taps) {
                    *out = taps
                        .iter()
                        .map(|&(i, w)| in_row[i] as f64 * w)
                        .sum::<f64>() as f32;
                }
            });

        // Vertical pass: out_h × out_w.
        let mut values = vec![0.0f32; out_h * out_w];
        values
            .par_chunks_mut(out_w)
            .zip(y_taps.par_iter())
            .for_each(|(out_row, taps)| {
                for (x, out) in out_row.iter_mut().enumerate() {
                    *out = taps
                        .iter()
                        .map(|&(j, w)| horizontal[j * out_w + x] as f64 * w)
                        .sum::<f64>() as f32;
                }
            });

        info!(
            from_height = grid.height(),
            from_width = in_w,
            to_height = out_h,
            to_width = out_w,
            factor = self.factor,
            filter = ?self.filter,
            "Resampled grid"
        );

        Grid::from_vec(out_w, out_h, values).ok_or_else(|| {
            GridError::invalid_param("grid", format!("{}x{}", out_w, out_h), "buffer size mismatch")
        })
    }
}

/// Resample `grid` by `factor` with the default filter.
pub fn downsample(grid: Grid, factor: f64) -> GridResult<Grid> {
    Downsampler::new(factor, ResampleFilter::default()).apply(grid)
}

/// Per output index, the contributing (input index, weight) pairs.
///
/// Output sample `i` maps to input coordinate `i * (in_len-1) / (out_len-1)`,
/// so the first and last samples of both grids line up. Taps past the edge
/// are clamped to the border sample, and weights are normalised to sum to 1.
fn taps(in_len: usize, out_len: usize, filter: ResampleFilter) -> Vec<Vec<(usize, f64)>> {
    let step = if out_len > 1 {
        (in_len - 1) as f64 / (out_len - 1) as f64
    } else {
        0.0
    };
    let last = in_len as isize - 1;
    let radius = filter.radius();

    (0..out_len)
        .map(|i| {
            let src = i as f64 * step;
            let base = src.floor() as isize;
            let mut taps: Vec<(usize, f64)> = Vec::with_capacity(2 * radius as usize);
            for k in (base - radius + 1)..=(base + radius) {
                let w = filter.weight(src - k as f64);
                if w == 0.0 {
                    continue;
                }
                let idx = k.clamp(0, last) as usize;
                match taps.iter_mut().find(|(j, _)| *j == idx) {
                    Some((_, acc)) => *acc += w,
                    None => taps.push((idx, w)),
                }
            }
            let total: f64 = taps.iter().map(|(_, w)| w).sum();
            if total != 0.0 && total != 1.0 {
                for (_, w) in &mut taps {
                    *w /= total;
                }
            }
            taps
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: usize, height: usize) -> Grid {
        let rows: Vec<Vec<f32>> = (0..height)
            .map(|y| (0..width).map(|x| (x + 2 * y) as f32).collect())
            .collect();
        Grid::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_output_len_rounding() {
        assert_eq!(output_len(2048, 0.5), 1024);
        // 1252.5 rounds to even.
        assert_eq!(output_len(2505, 0.5), 1252);
        assert_eq!(output_len(3, 0.5), 2);
        assert_eq!(output_len(1, 0.1), 1);
    }

    #[test]
    fn test_factor_one_is_identity() {
        let grid = ramp(7, 5);
        let out = downsample(grid.clone(), 1.0).unwrap();
        assert_eq!(out, grid);
    }

    #[test]
    fn test_shape() {
        let out = downsample(ramp(10, 6), 0.5).unwrap();
        assert_eq!(out.shape(), (3, 5));
    }

    #[test]
    fn test_constant_preserved() {
        let grid = Grid::filled(9, 7, 4.25);
        for filter in [ResampleFilter::Linear, ResampleFilter::Cubic] {
            let out = Downsampler::new(0.5, filter).apply(grid.clone()).unwrap();
            for &v in out.values() {
                assert!((v - 4.25).abs() < 1e-5, "{:?} produced {}", filter, v);
            }
        }
    }

    #[test]
    fn test_linear_ramp_preserved() {
        // Both kernels reproduce linear functions exactly away from clamping.
        let grid = ramp(9, 9);
        let out = Downsampler::new(0.5, ResampleFilter::Linear)
            .apply(grid)
            .unwrap();
        assert_eq!(out.shape(), (4, 4)); // 4.5 rounds to even
        // Corners line up with the input corners.
        assert!((out.get(0, 0) - 0.0).abs() < 1e-5);
        assert!((out.get(3, 3) - 24.0).abs() < 1e-5);
        // Interior: x_src = 8/3, y_src = 8/3.
        let expected = 8.0 / 3.0 + 2.0 * 8.0 / 3.0;
        assert!((out.get(1, 1) - expected as f32).abs() < 1e-4);
    }

    #[test]
    fn test_upsample_corners() {
        let grid = Grid::from_rows(&[[0.0, 3.0], [6.0, 9.0]]).unwrap();
        let out = downsample(grid, 2.0).unwrap();
        assert_eq!(out.shape(), (4, 4));
        assert!((out.get(0, 0) - 0.0).abs() < 1e-5);
        assert!((out.get(3, 0) - 3.0).abs() < 1e-5);
        assert!((out.get(0, 3) - 6.0).abs() < 1e-5);
        assert!((out.get(3, 3) - 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_factor() {
        for factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(downsample(ramp(3, 3), factor).is_err());
        }
    }
}
