//! Banc de filtres mel triangulaire (linear → mel).
//!
//! HTK layout: the DC bin is excluded, bands are triangles linear in hertz between
//! edges spaced evenly in mel, and bands narrower than 1.5 spectrogram bins are
//! widened so they never collapse to zero or one sample.

use anyhow::{Result, ensure};
use mel_core::config::{EdgeCorrection, FilterbankConfig};
use mel_core::matrix::Matrix;
use mel_core::scale::{
    MEL_BREAK_FREQUENCY_HERTZ, MEL_HIGH_FREQUENCY_Q, hertz_to_mel, linspace, mel_to_hertz,
};

/// Leading spectrogram bins forced to zero (the DC bin).
pub const BANDS_TO_ZERO: usize = 1;

/// Minimum band width, in spectrogram bins.
pub const MIN_BANDWIDTH_BINS: f64 = 1.5;

/// Mel-space edges of one triangular band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandEdges {
    pub lower_mel: f64,
    pub center_mel: f64,
    pub upper_mel: f64,
}

impl BandEdges {
    #[inline]
    #[must_use]
    pub fn lower_hz(&self) -> f64 {
        mel_to_hertz(self.lower_mel)
    }

    #[inline]
    #[must_use]
    pub fn center_hz(&self) -> f64 {
        mel_to_hertz(self.center_mel)
    }

    #[inline]
    #[must_use]
    pub fn upper_hz(&self) -> f64 {
        mel_to_hertz(self.upper_mel)
    }

    /// Width of the band in hertz.
    #[inline]
    #[must_use]
    pub fn bandwidth_hz(&self) -> f64 {
        self.upper_hz() - self.lower_hz()
    }

    /// Triangle weight at `freq_hz`: rises from the lower edge to 1.0 at the center,
    /// falls to the upper edge, zero outside.
    #[inline(always)]
    #[must_use]
    pub fn weight(&self, freq_hz: f64) -> f64 {
        let (lo, mid, hi) = (self.lower_hz(), self.center_hz(), self.upper_hz());
        triangle(freq_hz, lo, mid, hi)
    }
}

#[inline(always)]
fn triangle(freq_hz: f64, lo: f64, mid: f64, hi: f64) -> f64 {
    let rising = (freq_hz - lo) / (mid - lo);
    let falling = (hi - freq_hz) / (hi - mid);
    0.0f64.max(rising.min(falling))
}

/// Mel half-width of a band centred on `center_hz` whose hertz half-width is
/// `0.5 * min_bandwidth_hz`.
///
/// `dm = Q * ln(r + sqrt(1 + r²))`, `r = 0.5 * min_bandwidth_hz / (center_hz + F0)`.
#[must_use]
pub fn min_half_width_mel(center_hz: f64, min_bandwidth_hz: f64) -> f64 {
    let r = 0.5 * min_bandwidth_hz / (center_hz + MEL_BREAK_FREQUENCY_HERTZ);
    MEL_HIGH_FREQUENCY_Q * (r + (1.0 + r * r).sqrt()).ln()
}

/// Minimum band width in hertz for `config`.
#[inline]
#[must_use]
pub fn min_bandwidth_hz(config: &FilterbankConfig) -> f64 {
    MIN_BANDWIDTH_BINS * config.frequency_resolution_hz()
}

/// Centre frequencies of the spectrogram bins, DC included.
#[must_use]
pub fn linear_frequencies(config: &FilterbankConfig) -> Vec<f64> {
    linspace(0.0, config.nyquist_hz(), config.num_spectrogram_bins)
}

/// Compute the `(lower, center, upper)` mel edges of every band, after the
/// minimum-bandwidth correction.
///
/// # Example
/// ```
/// use mel_core::config::FilterbankConfig;
/// use mel_filter::filterbank::band_edges;
/// let config = FilterbankConfig { num_mel_bins: 4, num_spectrogram_bins: 8, ..FilterbankConfig::default() };
/// let edges = band_edges(&config);
/// assert_eq!(edges.len(), 4);
/// assert!(edges.iter().all(|e| e.lower_mel <= e.center_mel && e.center_mel <= e.upper_mel));
/// ```
#[must_use]
pub fn band_edges(config: &FilterbankConfig) -> Vec<BandEdges> {
    let mut grid = linspace(
        hertz_to_mel(config.lower_edge_hz),
        hertz_to_mel(config.upper_edge_hz),
        config.num_mel_bins + 2,
    );
    let freq_th = min_bandwidth_hz(config);
    let mut widened = 0usize;

    let edges: Vec<BandEdges> = match config.edge_correction {
        EdgeCorrection::Independent => grid
            .windows(3)
            .map(|w| {
                let mut band = BandEdges {
                    lower_mel: w[0],
                    center_mel: w[1],
                    upper_mel: w[2],
                };
                if band.bandwidth_hz() < freq_th {
                    let dm = min_half_width_mel(band.center_hz(), freq_th);
                    band.lower_mel = band.center_mel - dm;
                    band.upper_mel = band.center_mel + dm;
                    widened += 1;
                }
                band
            })
            .collect(),
        EdgeCorrection::InPlace => {
            // Les bords élargis sont réécrits dans la grille partagée.
            for i in 0..config.num_mel_bins {
                let lower_hz = mel_to_hertz(grid[i]);
                let upper_hz = mel_to_hertz(grid[i + 2]);
                if upper_hz - lower_hz < freq_th {
                    let center = grid[i + 1];
                    let dm = min_half_width_mel(mel_to_hertz(center), freq_th);
                    grid[i] = center - dm;
                    grid[i + 2] = center + dm;
                    widened += 1;
                }
            }
            grid.windows(3)
                .map(|w| BandEdges {
                    lower_mel: w[0],
                    center_mel: w[1],
                    upper_mel: w[2],
                })
                .collect()
        }
    };

    if widened > 0 {
        log::debug!(
            "Widened {widened}/{} mel bands to {freq_th:.3} Hz ({:?})",
            config.num_mel_bins,
            config.edge_correction
        );
    }
    edges
}

/// Triangular linear→mel filterbank.
///
/// # Example
/// ```
/// use mel_core::config::FilterbankConfig;
/// use mel_filter::filterbank::MelFilterbank;
/// let config = FilterbankConfig { num_mel_bins: 4, num_spectrogram_bins: 8, ..FilterbankConfig::default() };
/// let bank = MelFilterbank::new(&config).unwrap();
/// assert_eq!(bank.weights().shape(), (8, 4));
/// ```
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    config: FilterbankConfig,
    edges: Vec<BandEdges>,
    /// `[num_spectrogram_bins, num_mel_bins]`.
    weights: Matrix,
}

impl MelFilterbank {
    /// Validate `config` and build the weight matrix.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &FilterbankConfig) -> Result<Self> {
        config.validate()?;
        let edges = band_edges(config);
        let freqs = linear_frequencies(config);

        // Bords convertis une seule fois en Hz.
        let edges_hz: Vec<(f64, f64, f64)> = edges
            .iter()
            .map(|e| (e.lower_hz(), e.center_hz(), e.upper_hz()))
            .collect();

        let weights = Matrix::par_from_rows(
            config.num_spectrogram_bins,
            config.num_mel_bins,
            |bin, row| {
                if bin < BANDS_TO_ZERO {
                    return;
                }
                let f = freqs[bin];
                for (slot, &(lo, mid, hi)) in row.iter_mut().zip(&edges_hz) {
                    *slot = triangle(f, lo, mid, hi);
                }
            },
        );

        log::debug!(
            "Built {}x{} mel filterbank ({} non-zero weights)",
            weights.rows(),
            weights.cols(),
            weights.count_nonzero()
        );

        Ok(Self {
            config: *config,
            edges,
            weights,
        })
    }

    #[must_use]
    pub fn config(&self) -> &FilterbankConfig {
        &self.config
    }

    #[must_use]
    pub fn edges(&self) -> &[BandEdges] {
        &self.edges
    }

    /// `W_linear2mel`, shape `[num_spectrogram_bins, num_mel_bins]`.
    #[must_use]
    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    #[must_use]
    pub fn into_weights(self) -> Matrix {
        self.weights
    }

    /// Project a linear spectrum onto the mel bands: `mel[m] = Σ_k spectrum[k] · W[k][m]`.
    ///
    /// # Errors
    /// Returns an error if `spectrum.len() != num_spectrogram_bins`.
    pub fn project(&self, spectrum: &[f64]) -> Result<Vec<f64>> {
        ensure!(
            spectrum.len() == self.weights.rows(),
            "Spectrum has {} bins, filterbank expects {}",
            spectrum.len(),
            self.weights.rows()
        );
        let mut mel = vec![0.0; self.weights.cols()];
        for (k, &x) in spectrum.iter().enumerate() {
            if x == 0.0 {
                continue;
            }
            for (acc, &w) in mel.iter_mut().zip(self.weights.row(k)) {
                *acc += x * w;
            }
        }
        Ok(mel)
    }
}
