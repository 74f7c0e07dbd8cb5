//! Pseudo-inverse mel → linear.
//!
//! The filterbank is banded and nearly orthogonal, so instead of a generic
//! pseudo-inverse the transpose is normalised by the column sums of the correlation
//! matrix `P = W · Wᵀ`.

use anyhow::Result;
use mel_core::matrix::Matrix;

/// Column sums at or below this magnitude are passed through unchanged.
pub const NORMALIZE_EPSILON: f64 = 1e-8;

/// Correlation across spectrogram bins: `P = W · Wᵀ`, shape `[S, S]`.
///
/// # Errors
/// Propagates matrix shape errors (cannot happen for a transpose product).
pub fn correlation(w_linear2mel: &Matrix) -> Result<Matrix> {
    w_linear2mel.matmul(&w_linear2mel.transpose())
}

/// Diagonal normaliser from the column sums `s_j` of `p`.
///
/// `d_j = 1 / s_j` when `|s_j| > 1e-8`, otherwise `d_j = s_j` unchanged.
///
/// # Example
/// ```
/// use mel_core::matrix::Matrix;
/// use mel_filter::inverse::normalizer;
/// let p = Matrix::from_vec(2, 2, vec![2.0, 0.0, 2.0, 1e-9]).unwrap();
/// assert_eq!(normalizer(&p), vec![0.25, 1e-9]);
/// ```
#[must_use]
pub fn normalizer(p: &Matrix) -> Vec<f64> {
    p.column_sums()
        .into_iter()
        .map(|s| if s.abs() > NORMALIZE_EPSILON { 1.0 / s } else { s })
        .collect()
}

/// `W_mel2linear = Wᵀ · diag(d)`, shape `[num_mel_bins, num_spectrogram_bins]`.
///
/// # Errors
/// Propagates matrix shape errors.
///
/// # Example
/// ```
/// use mel_core::config::FilterbankConfig;
/// use mel_filter::filterbank::MelFilterbank;
/// use mel_filter::inverse::mel_to_linear;
/// let config = FilterbankConfig { num_mel_bins: 4, num_spectrogram_bins: 8, ..FilterbankConfig::default() };
/// let bank = MelFilterbank::new(&config).unwrap();
/// let inverse = mel_to_linear(bank.weights()).unwrap();
/// assert_eq!(inverse.shape(), (4, 8));
/// ```
pub fn mel_to_linear(w_linear2mel: &Matrix) -> Result<Matrix> {
    let p = correlation(w_linear2mel)?;
    let d = normalizer(&p);
    let passthrough = d.iter().filter(|v| v.abs() <= NORMALIZE_EPSILON).count();
    if passthrough > 0 {
        log::debug!(
            "{passthrough}/{} spectrogram bins below {NORMALIZE_EPSILON:e}, left unnormalised",
            d.len()
        );
    }
    w_linear2mel.transpose().scale_columns(&d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filterbank::MelFilterbank;
    use mel_core::config::FilterbankConfig;

    fn weights(num_mel_bins: usize, num_spectrogram_bins: usize) -> Matrix {
        let config = FilterbankConfig {
            num_mel_bins,
            num_spectrogram_bins,
            ..FilterbankConfig::default()
        };
        MelFilterbank::new(&config).unwrap().into_weights()
    }

    #[test]
    fn correlation_is_symmetric() {
        let w = weights(128, 1024);
        let p = correlation(&w).unwrap();
        assert_eq!(p.shape(), (1024, 1024));
        for i in 0..p.rows() {
            for j in i + 1..p.cols() {
                assert!((p.get(i, j) - p.get(j, i)).abs() <= 1e-12, "P[{i}][{j}]");
            }
        }
        assert!(p.as_slice().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn dc_bin_passes_through() {
        let w = weights(16, 64);
        let d = normalizer(&correlation(&w).unwrap());
        // Colonne DC nulle : d_0 reste 0, jamais NaN.
        assert_eq!(d[0], 0.0);
        assert!(d.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn near_zero_sum_is_kept_verbatim() {
        let p = Matrix::from_vec(1, 3, vec![5e-9, -2e-9, 4.0]).unwrap();
        assert_eq!(normalizer(&p), vec![5e-9, -2e-9, 0.25]);
    }

    #[test]
    fn threshold_is_strict() {
        let p = Matrix::from_vec(1, 1, vec![NORMALIZE_EPSILON]).unwrap();
        assert_eq!(normalizer(&p), vec![NORMALIZE_EPSILON]);
    }

    #[test]
    fn mel_round_trip_columns_sum_to_one() {
        for (mels, bins) in [(4, 8), (128, 1024), (1024, 1024)] {
            let w = weights(mels, bins);
            let inv = mel_to_linear(&w).unwrap();
            assert_eq!(inv.shape(), (mels, bins));
            let sums = correlation(&w).unwrap().column_sums();
            let round_trip = w.matmul(&inv).unwrap().column_sums();
            for (j, (&s, &r)) in sums.iter().zip(&round_trip).enumerate() {
                if s.abs() > NORMALIZE_EPSILON {
                    assert!((r - 1.0).abs() < 1e-9, "{mels}x{bins}: column {j} sums to {r}");
                }
            }
        }
    }

    #[test]
    fn inverse_is_scaled_transpose() {
        let w = weights(8, 32);
        let inv = mel_to_linear(&w).unwrap();
        let d = normalizer(&correlation(&w).unwrap());
        for m in 0..8 {
            for k in 0..32 {
                assert_eq!(inv.get(m, k), w.get(k, m) * d[k]);
            }
        }
    }
}
