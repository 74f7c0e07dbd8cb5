//! Matrice dense row-major en `f64`.
//!
//! Dimensions fixed at construction. Every operation returns a new matrix.

use anyhow::{Result, ensure};
use rayon::prelude::*;

/// Dense row-major matrix.
///
/// # Example
/// ```
/// use mel_core::matrix::Matrix;
/// let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(m.get(1, 0), 4.0);
/// assert_eq!(m.transpose().shape(), (3, 2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// All-zero matrix.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap row-major data.
    ///
    /// # Errors
    /// Returns an error if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        ensure!(
            data.len() == rows * cols,
            "Matrix data has {} values, expected {rows}x{cols}",
            data.len()
        );
        Ok(Self { rows, cols, data })
    }

    /// Build a matrix row by row, in parallel. `fill` receives the row index and a
    /// zeroed row slice.
    ///
    /// # Example
    /// ```
    /// use mel_core::matrix::Matrix;
    /// let eye = Matrix::par_from_rows(3, 3, |r, row| row[r] = 1.0);
    /// assert_eq!(eye.get(2, 2), 1.0);
    /// assert_eq!(eye.get(2, 1), 0.0);
    /// ```
    #[must_use]
    pub fn par_from_rows<F>(rows: usize, cols: usize, fill: F) -> Self
    where
        F: Fn(usize, &mut [f64]) + Sync,
    {
        let mut out = Self::zeros(rows, cols);
        if cols > 0 {
            out.data
                .par_chunks_mut(cols)
                .enumerate()
                .for_each(|(r, row)| fill(r, row));
        }
        out
    }

    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[inline]
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// # Panics
    /// Panics if `(r, c)` is out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> f64 {
        assert!(r < self.rows && c < self.cols, "({r}, {c}) out of bounds");
        self.data[r * self.cols + c]
    }

    /// # Panics
    /// Panics if `r` is out of bounds.
    #[inline]
    #[must_use]
    pub fn row(&self, r: usize) -> &[f64] {
        assert!(r < self.rows, "row {r} out of bounds");
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Column `c`, copied out.
    #[must_use]
    pub fn column(&self, c: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.get(r, c)).collect()
    }

    /// Raw row-major values.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        let (rows, cols) = (self.rows, self.cols);
        Self::par_from_rows(cols, rows, |c, out| {
            for (r, slot) in out.iter_mut().enumerate() {
                *slot = self.data[r * cols + c];
            }
        })
    }

    /// Matrix product `self · rhs`.
    ///
    /// Exact-zero entries of `self` are skipped; the filterbank matrices are banded so
    /// this keeps the product close to linear in the number of non-zeros.
    ///
    /// # Errors
    /// Returns an error if the inner dimensions differ.
    ///
    /// # Example
    /// ```
    /// use mel_core::matrix::Matrix;
    /// let a = Matrix::from_vec(1, 2, vec![1.0, 2.0]).unwrap();
    /// let b = Matrix::from_vec(2, 1, vec![3.0, 4.0]).unwrap();
    /// assert_eq!(a.matmul(&b).unwrap().get(0, 0), 11.0);
    /// ```
    pub fn matmul(&self, rhs: &Self) -> Result<Self> {
        ensure!(
            self.cols == rhs.rows,
            "Cannot multiply {}x{} by {}x{}",
            self.rows,
            self.cols,
            rhs.rows,
            rhs.cols
        );
        Ok(Self::par_from_rows(self.rows, rhs.cols, |r, out| {
            for (k, &a) in self.row(r).iter().enumerate() {
                if a == 0.0 {
                    continue;
                }
                for (slot, &b) in out.iter_mut().zip(rhs.row(k)) {
                    *slot += a * b;
                }
            }
        }))
    }

    /// Sum of each column.
    #[must_use]
    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.cols];
        for r in 0..self.rows {
            for (s, &v) in sums.iter_mut().zip(self.row(r)) {
                *s += v;
            }
        }
        sums
    }

    /// `self · diag(scale)`: multiply column `c` by `scale[c]`.
    ///
    /// # Errors
    /// Returns an error if `scale.len() != cols`.
    pub fn scale_columns(&self, scale: &[f64]) -> Result<Self> {
        ensure!(
            scale.len() == self.cols,
            "Column scale has {} values for {} columns",
            scale.len(),
            self.cols
        );
        Ok(Self::par_from_rows(self.rows, self.cols, |r, out| {
            for ((slot, &v), &d) in out.iter_mut().zip(self.row(r)).zip(scale) {
                *slot = v * d;
            }
        }))
    }

    /// Number of entries that are not exactly `0.0`.
    #[must_use]
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0.0).count()
    }
}
