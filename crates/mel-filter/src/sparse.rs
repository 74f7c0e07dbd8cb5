//! Encodage creux `(row, col, value)`.

use anyhow::{Result, ensure};
use mel_core::matrix::Matrix;

/// One non-zero matrix entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triple {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

/// Sparse matrix as an ordered triple list, row-major scan order.
///
/// # Example
/// ```
/// use mel_core::matrix::Matrix;
/// use mel_filter::sparse::SparseMatrix;
/// let dense = Matrix::from_vec(2, 2, vec![0.0, 1.5, 2.0, 0.0]).unwrap();
/// let sparse = SparseMatrix::from_dense(&dense);
/// assert_eq!(sparse.len(), 2);
/// assert_eq!(sparse.to_dense(), dense);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    rows: usize,
    cols: usize,
    triples: Vec<Triple>,
}

impl SparseMatrix {
    /// Keep every entry that is not exactly `0.0`; no tolerance is applied.
    #[must_use]
    pub fn from_dense(dense: &Matrix) -> Self {
        let (rows, cols) = dense.shape();
        let mut triples = Vec::with_capacity(dense.count_nonzero());
        for row in 0..rows {
            for (col, &value) in dense.row(row).iter().enumerate() {
                if value != 0.0 {
                    triples.push(Triple { row, col, value });
                }
            }
        }
        Self {
            rows,
            cols,
            triples,
        }
    }

    /// `(rows, cols)` of the dense matrix this encodes.
    #[inline]
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    /// Fraction of entries stored, in `[0, 1]`.
    #[must_use]
    pub fn density(&self) -> f64 {
        let total = self.rows * self.cols;
        if total == 0 {
            0.0
        } else {
            self.len() as f64 / total as f64
        }
    }

    /// Rebuild the dense matrix.
    #[must_use]
    pub fn to_dense(&self) -> Matrix {
        // Triples triés row-major : chaque ligne est une tranche contiguë.
        Matrix::par_from_rows(self.rows, self.cols, |r, out| {
            let start = self.triples.partition_point(|t| t.row < r);
            for t in self.triples[start..].iter().take_while(|t| t.row == r) {
                out[t.col] = t.value;
            }
        })
    }

    /// Apply the encoded `[M, S]` matrix to a mel-domain vector, the way the
    /// synthesis runtime does: `out[c] = Σ_r mel[r] · v(r, c)`.
    ///
    /// # Errors
    /// Returns an error if `mel.len()` differs from the number of rows.
    ///
    /// # Example
    /// ```
    /// use mel_core::matrix::Matrix;
    /// use mel_filter::sparse::SparseMatrix;
    /// let dense = Matrix::from_vec(2, 3, vec![1.0, 0.0, 0.0, 0.0, 0.5, 0.5]).unwrap();
    /// let sparse = SparseMatrix::from_dense(&dense);
    /// assert_eq!(sparse.apply(&[2.0, 4.0]).unwrap(), vec![2.0, 2.0, 2.0]);
    /// ```
    pub fn apply(&self, mel: &[f64]) -> Result<Vec<f64>> {
        ensure!(
            mel.len() == self.rows,
            "Mel vector has {} values, matrix has {} rows",
            mel.len(),
            self.rows
        );
        let mut out = vec![0.0; self.cols];
        for t in &self.triples {
            out[t.col] += mel[t.row] * t.value;
        }
        Ok(out)
    }
}
