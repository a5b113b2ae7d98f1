//! Row-major elevation grid.

/// A dense width×height matrix of elevation samples in height units.
///
/// Samples are stored row-major: the sample at column `x`, row `y` lives at
/// `y * width + x`. Pipeline stages take a `Grid` by value and return a new
/// one, so no two stages ever share a mutable grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl Grid {
    /// Create a zero-filled grid.
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width * height],
        }
    }

    /// Create a grid filled with one value.
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            values: vec![value; width * height],
        }
    }

    /// Wrap existing row-major samples.
    ///
    /// Returns `None` if `values.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, values: Vec<f32>) -> Option<Self> {
        (values.len() == width * height).then_some(Self {
            width,
            height,
            values,
        })
    }

    /// Build a grid from a list of rows of equal length.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let mut values = Vec::with_capacity(width * height);
        for row in rows {
            let row = row.as_ref();
            if row.len() != width {
                return None;
            }
            values.extend_from_slice(row);
        }
        Some(Self {
            width,
            height,
            values,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// (height, width), matching row/column order.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sample at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.values[y * self.width + x] = value;
    }

    /// One row of samples.
    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        &self.values[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let w = self.width;
        &mut self.values[y * w..(y + 1) * w]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }

    /// Copy a `width`×`height` block of row-major samples into this grid with
    /// its top-left corner at (`x0`, `y0`). The block must fit.
    pub fn blit(&mut self, x0: usize, y0: usize, width: usize, height: usize, block: &[f32]) {
        debug_assert_eq!(block.len(), width * height);
        debug_assert!(x0 + width <= self.width && y0 + height <= self.height);
        for (dy, src) in block.chunks_exact(width).enumerate() {
            let start = (y0 + dy) * self.width + x0;
            self.values[start..start + width].copy_from_slice(src);
        }
    }

    /// Minimum and maximum sample, or `None` for an empty grid.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut iter = self.values.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_indexing() {
        let mut grid = Grid::zeros(3, 2);
        grid.set(2, 1, 7.0);
        assert_eq!(grid.values()[5], 7.0);
        assert_eq!(grid.row(1), &[0.0, 0.0, 7.0]);
        assert_eq!(grid.shape(), (2, 3));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(Grid::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_none());
        let grid = Grid::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert_eq!(grid.get(0, 1), 3.0);
    }

    #[test]
    fn test_blit() {
        let mut grid = Grid::zeros(4, 4);
        grid.blit(2, 1, 2, 2, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(grid.row(1), &[0.0, 0.0, 1.0, 2.0]);
        assert_eq!(grid.row(2), &[0.0, 0.0, 3.0, 4.0]);
        assert_eq!(grid.row(3), &[0.0; 4]);
    }

    #[test]
    fn test_min_max() {
        let grid = Grid::from_rows(&[[1.0, -2.0], [5.0, 0.5]]).unwrap();
        assert_eq!(grid.min_max(), Some((-2.0, 5.0)));
        assert_eq!(Grid::zeros(0, 0).min_max(), None);
    }
}
