//! Configuration du banc de filtres mel.
//!
//! A [`FilterbankConfig`] is read from TOML (every key optional), overridden by the
//! command line, then checked once by [`FilterbankConfig::validate`] before anything
//! is allocated.

use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

/// How the minimum-bandwidth rule rewrites the edges of narrow bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeCorrection {
    /// Each band is widened around its own center; neighbours are untouched.
    #[default]
    Independent,
    /// Widened edges are written back into the shared edge grid, so a band's new
    /// upper edge becomes the next band's center. Reproduces the historical
    /// GANSynth coefficient table.
    InPlace,
}

/// Parameters of a mel filterbank.
///
/// Defaults are the GANSynth values: 1024 mel bins over 1024 spectrogram bins at
/// 16 kHz, covering 0 Hz to Nyquist.
///
/// # Example
/// ```
/// use mel_core::config::FilterbankConfig;
/// let config = FilterbankConfig::default();
/// assert_eq!(config.nyquist_hz(), 8000.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterbankConfig {
    /// Nombre de bandes mel (colonnes de la matrice linear→mel).
    pub num_mel_bins: usize,
    /// Nombre de bins du spectrogramme linéaire, DC inclus.
    pub num_spectrogram_bins: usize,
    /// Fréquence d'échantillonnage en Hz. Nyquist vaut la moitié.
    pub sample_rate_hz: f64,
    /// Bas de la première bande mel, en Hz (`>= 0`).
    pub lower_edge_hz: f64,
    /// Haut de la dernière bande mel, en Hz (`<= nyquist`).
    pub upper_edge_hz: f64,
    /// Minimum-bandwidth correction mode. TOML key `edge_correction`,
    /// `"independent"` or `"in-place"`.
    pub edge_correction: EdgeCorrection,
}

impl Default for FilterbankConfig {
    fn default() -> Self {
        Self {
            num_mel_bins: 1024,
            num_spectrogram_bins: 1024,
            sample_rate_hz: 16_000.0,
            lower_edge_hz: 0.0,
            upper_edge_hz: 8000.0,
            edge_correction: EdgeCorrection::Independent,
        }
    }
}

impl FilterbankConfig {
    /// Half the sample rate.
    #[inline]
    #[must_use]
    pub fn nyquist_hz(&self) -> f64 {
        self.sample_rate_hz / 2.0
    }

    /// Width of one spectrogram bin in hertz, as used by the minimum-bandwidth rule.
    #[inline]
    #[must_use]
    pub fn frequency_resolution_hz(&self) -> f64 {
        self.nyquist_hz() / self.num_spectrogram_bins as f64
    }

    /// Check every precondition of the filterbank builder.
    ///
    /// # Errors
    /// Returns an error naming the first violated constraint.
    ///
    /// # Example
    /// ```
    /// use mel_core::config::FilterbankConfig;
    /// let config = FilterbankConfig { upper_edge_hz: 12_000.0, ..FilterbankConfig::default() };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        ensure!(self.num_mel_bins > 0, "num_mel_bins must be > 0");
        ensure!(
            self.num_spectrogram_bins > 0,
            "num_spectrogram_bins must be > 0"
        );
        ensure!(
            self.num_mel_bins.checked_add(2).is_some(),
            "num_mel_bins ({}) is too large",
            self.num_mel_bins
        );
        // P = W·Wᵀ est une matrice dense [S, S] de f64.
        ensure!(
            self.num_spectrogram_bins
                .checked_mul(self.num_spectrogram_bins)
                .and_then(|n| n.checked_mul(size_of::<f64>()))
                .is_some(),
            "num_spectrogram_bins ({}) is too large for a dense [S, S] matrix",
            self.num_spectrogram_bins
        );
        ensure!(
            self.num_spectrogram_bins
                .checked_mul(self.num_mel_bins)
                .and_then(|n| n.checked_mul(size_of::<f64>()))
                .is_some(),
            "num_spectrogram_bins × num_mel_bins ({} × {}) is too large",
            self.num_spectrogram_bins,
            self.num_mel_bins
        );
        ensure!(
            self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0,
            "sample_rate_hz must be a positive finite number, got {}",
            self.sample_rate_hz
        );
        ensure!(
            self.lower_edge_hz.is_finite() && self.lower_edge_hz >= 0.0,
            "lower_edge_hz must be >= 0, got {}",
            self.lower_edge_hz
        );
        ensure!(
            self.upper_edge_hz.is_finite() && self.upper_edge_hz <= self.nyquist_hz(),
            "upper_edge_hz ({}) exceeds Nyquist ({})",
            self.upper_edge_hz,
            self.nyquist_hz()
        );
        ensure!(
            self.lower_edge_hz < self.upper_edge_hz,
            "lower_edge_hz ({}) must be below upper_edge_hz ({})",
            self.lower_edge_hz,
            self.upper_edge_hz
        );
        Ok(())
    }

    /// Parse a TOML document. Missing fields keep their default value.
    ///
    /// # Errors
    /// Returns an error on malformed TOML or unknown keys. Does not validate.
    ///
    /// # Example
    /// ```
    /// use mel_core::config::FilterbankConfig;
    /// let config = FilterbankConfig::from_toml_str("num_mel_bins = 128").unwrap();
    /// assert_eq!(config.num_mel_bins, 128);
    /// assert_eq!(config.num_spectrogram_bins, 1024);
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid filterbank configuration")
    }

    /// Serialize as a TOML document that [`Self::from_toml_str`] reads back.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).context("Cannot serialize filterbank configuration")
    }

    /// Read a TOML configuration file. Validation is left to the caller, which may
    /// still apply overrides.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn read_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read configuration {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("While parsing {}", path.display()))?;
        log::debug!("Loaded filterbank configuration from {}", path.display());
        Ok(config)
    }
}
