use std::path::PathBuf;

use clap::Parser;
use mel_export::emit::OutputFormat;

/// melsparse — génère la table creuse mel→linear d'un banc de filtres mel.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "melsparse", version, about)]
pub struct Cli {
    /// TOML configuration file (missing keys use the GANSynth defaults).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of mel bands.
    #[arg(long)]
    pub mel_bins: Option<usize>,

    /// Number of linear spectrogram bins, DC included.
    #[arg(long)]
    pub spectrogram_bins: Option<usize>,

    /// Sample rate in Hz.
    #[arg(long)]
    pub sample_rate: Option<f64>,

    /// Lowest band edge in Hz.
    #[arg(long)]
    pub lower_hz: Option<f64>,

    /// Highest band edge in Hz (at most Nyquist).
    #[arg(long)]
    pub upper_hz: Option<f64>,

    /// Write widened band edges back into the shared edge grid, reproducing the
    /// historical GANSynth table.
    #[arg(long)]
    pub in_place_edges: bool,

    /// Output layout: `literal` or `typescript`.
    #[arg(short, long, default_value_t = OutputFormat::Literal)]
    pub format: OutputFormat,

    /// Output file (stdout when absent).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Prefix the TypeScript module with a comment recording the configuration.
    #[arg(long)]
    pub header: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,
}
