use std::io::Write;

use anyhow::Result;
use mel_core::config::{EdgeCorrection, FilterbankConfig};
use mel_core::matrix::Matrix;
use mel_export::emit::CoefficientEmitter;
use mel_filter::filterbank::MelFilterbank;
use mel_filter::inverse::mel_to_linear;
use mel_filter::sparse::SparseMatrix;

use crate::cli::Cli;

/// Every stage of the coefficient computation, kept for inspection.
#[derive(Debug, Clone)]
pub struct Coefficients {
    /// Linear→mel filterbank (`W_linear2mel`, `[S, M]`).
    pub filterbank: MelFilterbank,
    /// Approximate inverse (`W_mel2linear`, `[M, S]`).
    pub mel_to_linear: Matrix,
    /// Non-zero entries of `mel_to_linear`, row-major.
    pub sparse: SparseMatrix,
}

/// Merge the configuration file (if any) with command-line overrides.
///
/// Order: defaults, then file, then flags. The result is validated.
///
/// # Errors
/// Returns an error if the file cannot be loaded or the merged configuration is
/// invalid.
///
/// # Example
/// ```
/// use mel_app::cli::Cli;
/// use mel_app::pipeline::resolve_config;
///
/// let cli = Cli { mel_bins: Some(80), ..Cli::default() };
/// let config = resolve_config(&cli).unwrap();
/// assert_eq!(config.num_mel_bins, 80);
/// ```
pub fn resolve_config(cli: &Cli) -> Result<FilterbankConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            log::info!("Loading configuration: {}", path.display());
            FilterbankConfig::read_file(path)?
        }
        None => FilterbankConfig::default(),
    };

    if let Some(v) = cli.mel_bins {
        config.num_mel_bins = v;
    }
    if let Some(v) = cli.spectrogram_bins {
        config.num_spectrogram_bins = v;
    }
    if let Some(v) = cli.sample_rate {
        config.sample_rate_hz = v;
    }
    if let Some(v) = cli.lower_hz {
        config.lower_edge_hz = v;
    }
    if let Some(v) = cli.upper_hz {
        config.upper_edge_hz = v;
    }
    if cli.in_place_edges {
        config.edge_correction = EdgeCorrection::InPlace;
    }

    config.validate()?;
    Ok(config)
}

/// Run the whole computation: filterbank, inverse, sparse encoding.
///
/// # Errors
/// Returns an error if the configuration is invalid.
///
/// # Example
/// ```
/// use mel_core::config::FilterbankConfig;
/// use mel_app::pipeline::compute;
///
/// let config = FilterbankConfig { num_mel_bins: 4, num_spectrogram_bins: 8, ..FilterbankConfig::default() };
/// let coeffs = compute(&config).unwrap();
/// assert_eq!(coeffs.mel_to_linear.shape(), (4, 8));
/// assert_eq!(coeffs.sparse.len(), coeffs.mel_to_linear.count_nonzero());
/// ```
pub fn compute(config: &FilterbankConfig) -> Result<Coefficients> {
    let filterbank = MelFilterbank::new(config)?;
    let mel_to_linear = mel_to_linear(filterbank.weights())?;
    let sparse = SparseMatrix::from_dense(&mel_to_linear);

    let (rows, cols) = sparse.shape();
    log::info!(
        "mel→linear [{rows}, {cols}]: {} non-zero coefficients ({:.3}% dense)",
        sparse.len(),
        sparse.density() * 100.0
    );
    if sparse.is_empty() {
        log::warn!("Degenerate filterbank: the mel→linear table is empty");
    }

    Ok(Coefficients {
        filterbank,
        mel_to_linear,
        sparse,
    })
}

/// Entry point behind the binary: resolve, compute, emit.
///
/// # Errors
/// Returns an error on invalid configuration or if the artifact cannot be written.
pub fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;

    if cli.print_config {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(config.to_toml_string()?.as_bytes())?;
        return Ok(());
    }

    log::info!(
        "Filterbank: {} mel bins, {} spectrogram bins, {} Hz, {}–{} Hz ({:?})",
        config.num_mel_bins,
        config.num_spectrogram_bins,
        config.sample_rate_hz,
        config.lower_edge_hz,
        config.upper_edge_hz,
        config.edge_correction
    );

    let coeffs = compute(&config)?;

    let mut emitter = CoefficientEmitter::new(cli.format);
    if cli.header {
        emitter = emitter.with_header(config);
    }

    match &cli.output {
        Some(path) => emitter.write_to_path(path, &coeffs.sparse),
        None => {
            let mut stdout = std::io::stdout().lock();
            emitter.write_to(&mut stdout, &coeffs.sparse)
        }
    }
}
