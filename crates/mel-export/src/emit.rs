//! Sérialisation de la table creuse mel→linear.
//!
//! Two layouts:
//! - `literal`: one `[row, col, value] ,` line per entry, as the historical generator
//!   printed it (append to a `.ts` file by hand).
//! - `typescript`: a complete module exporting `MEL_SPARSE_COEFFS`.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use mel_core::config::FilterbankConfig;
use mel_filter::sparse::{SparseMatrix, Triple};

/// Name of the constant exported by the TypeScript layout.
pub const TS_CONST_NAME: &str = "MEL_SPARSE_COEFFS";

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Literal,
    TypeScript,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "literal" | "lines" => Ok(Self::Literal),
            "typescript" | "ts" => Ok(Self::TypeScript),
            other => bail!("Unknown output format '{other}' (expected literal or typescript)"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal => f.write_str("literal"),
            Self::TypeScript => f.write_str("typescript"),
        }
    }
}

/// Format a float the way Python's `repr` does: shortest round-trip digits,
/// scientific notation below `1e-4` or from `1e16`, two-digit signed exponent.
///
/// # Example
/// ```
/// use mel_export::emit::python_float;
/// assert_eq!(python_float(0.5), "0.5");
/// assert_eq!(python_float(1.0), "1.0");
/// assert_eq!(python_float(2.5e-5), "2.5e-05");
/// assert_eq!(python_float(1e16), "1e+16");
/// ```
#[must_use]
pub fn python_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        return text.to_owned();
    }
    // `{:?}` bascule déjà en notation scientifique aux mêmes seuils que Python.
    let text = format!("{value:?}");
    match text.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => text,
    }
}

fn record(t: &Triple) -> String {
    format!("[{}, {}, {}]", t.row, t.col, python_float(t.value))
}

/// Writes a [`SparseMatrix`] in one of the [`OutputFormat`] layouts.
///
/// # Example
/// ```
/// use mel_core::matrix::Matrix;
/// use mel_filter::sparse::SparseMatrix;
/// use mel_export::emit::{CoefficientEmitter, OutputFormat};
///
/// let dense = Matrix::from_vec(1, 2, vec![0.0, 0.25]).unwrap();
/// let sparse = SparseMatrix::from_dense(&dense);
/// let text = CoefficientEmitter::new(OutputFormat::Literal).render(&sparse);
/// assert_eq!(text, "[0, 1, 0.25] ,\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoefficientEmitter {
    format: OutputFormat,
    header: Option<FilterbankConfig>,
}

impl CoefficientEmitter {
    #[must_use]
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            header: None,
        }
    }

    /// Record the configuration in a leading comment (TypeScript layout only).
    #[must_use]
    pub fn with_header(mut self, config: FilterbankConfig) -> Self {
        self.header = Some(config);
        self
    }

    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render the whole artifact into a string.
    #[must_use]
    pub fn render(&self, sparse: &SparseMatrix) -> String {
        let mut text = String::with_capacity(sparse.len() * 40 + 128);
        match self.format {
            OutputFormat::Literal => {
                for t in sparse.triples() {
                    text.push_str(&record(t));
                    text.push_str(" ,\n");
                }
            }
            OutputFormat::TypeScript => {
                if let Some(c) = &self.header {
                    text.push_str(&format!(
                        "// Generated by melsparse: num_mel_bins={}, num_spectrogram_bins={}, \
                         sample_rate_hz={}, lower_edge_hz={}, upper_edge_hz={}, edge_correction={:?}\n",
                        c.num_mel_bins,
                        c.num_spectrogram_bins,
                        c.sample_rate_hz,
                        c.lower_edge_hz,
                        c.upper_edge_hz,
                        c.edge_correction
                    ));
                    let (rows, cols) = sparse.shape();
                    text.push_str(&format!(
                        "// [{rows}, {cols}] mel→linear, {} entries\n",
                        sparse.len()
                    ));
                }
                text.push_str(&format!("export const {TS_CONST_NAME} = [\n"));
                for t in sparse.triples() {
                    text.push_str(&record(t));
                    text.push_str(",\n");
                }
                text.push_str("];\n");
            }
        }
        text
    }

    /// Write the artifact to `out`.
    ///
    /// # Errors
    /// Returns an error if writing or flushing fails.
    pub fn write_to<W: Write>(&self, out: &mut W, sparse: &SparseMatrix) -> Result<()> {
        out.write_all(self.render(sparse).as_bytes())
            .context("Failed to write coefficient table")?;
        out.flush().context("Failed to flush coefficient table")?;
        Ok(())
    }

    /// Create (or truncate) `path` and write the artifact there.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn write_to_path(&self, path: &Path, sparse: &SparseMatrix) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        self.write_to(&mut out, sparse)
            .with_context(|| format!("While writing {}", path.display()))?;
        log::info!(
            "Wrote {} coefficients ({}) to {}",
            sparse.len(),
            self.format,
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mel_core::matrix::Matrix;

    fn sample() -> SparseMatrix {
        let dense =
            Matrix::from_vec(2, 3, vec![0.0, 0.5, 0.0, 3.0e-7, 0.0, 1.0]).unwrap();
        SparseMatrix::from_dense(&dense)
    }

    #[test]
    fn literal_layout_matches_python_print() {
        let text = CoefficientEmitter::new(OutputFormat::Literal).render(&sample());
        assert_eq!(text, "[0, 1, 0.5] ,\n[1, 0, 3e-07] ,\n[1, 2, 1.0] ,\n");
    }

    #[test]
    fn typescript_layout_is_a_module() {
        let text = CoefficientEmitter::new(OutputFormat::TypeScript).render(&sample());
        assert_eq!(
            text,
            "export const MEL_SPARSE_COEFFS = [\n[0, 1, 0.5],\n[1, 0, 3e-07],\n[1, 2, 1.0],\n];\n"
        );
    }

    #[test]
    fn typescript_header_records_config() {
        let config = FilterbankConfig::default();
        let text = CoefficientEmitter::new(OutputFormat::TypeScript)
            .with_header(config)
            .render(&sample());
        let first = text.lines().next().unwrap();
        assert!(first.starts_with("// Generated by melsparse"), "{first}");
        assert!(first.contains("num_mel_bins=1024"));
        assert!(text.contains("// [2, 3] mel→linear, 3 entries"));
    }

    #[test]
    fn typescript_header_exact_text() {
        let config = FilterbankConfig {
            num_mel_bins: 4,
            num_spectrogram_bins: 8,
            ..FilterbankConfig::default()
        };
        let text = CoefficientEmitter::new(OutputFormat::TypeScript)
            .with_header(config)
            .render(&sample());
        assert_eq!(
            text,
            "// Generated by melsparse: num_mel_bins=4, num_spectrogram_bins=8, \
             sample_rate_hz=16000, lower_edge_hz=0, upper_edge_hz=8000, edge_correction=Independent\n\
             // [2, 3] mel→linear, 3 entries\n\
             export const MEL_SPARSE_COEFFS = [\n\
             [0, 1, 0.5],\n\
             [1, 0, 3e-07],\n\
             [1, 2, 1.0],\n\
             ];\n"
        );
    }

    #[test]
    fn literal_ignores_header() {
        let text = CoefficientEmitter::new(OutputFormat::Literal)
            .with_header(FilterbankConfig::default())
            .render(&sample());
        assert!(text.starts_with("[0, 1, 0.5] ,"));
    }

    #[test]
    fn empty_table() {
        let empty = SparseMatrix::from_dense(&Matrix::zeros(2, 2));
        assert_eq!(CoefficientEmitter::new(OutputFormat::Literal).render(&empty), "");
        assert_eq!(
            CoefficientEmitter::new(OutputFormat::TypeScript).render(&empty),
            "export const MEL_SPARSE_COEFFS = [\n];\n"
        );
    }

    #[test]
    fn python_float_repr() {
        assert_eq!(python_float(0.1), "0.1");
        assert_eq!(python_float(0.0001), "0.0001");
        assert_eq!(python_float(0.00009), "9e-05");
        assert_eq!(python_float(-1.25e-10), "-1.25e-10");
        assert_eq!(python_float(123.0), "123.0");
        assert_eq!(python_float(1.5e300), "1.5e+300");
        assert_eq!(python_float(f64::NAN), "nan");
        assert_eq!(python_float(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn python_float_round_trips() {
        for v in [0.1 + 0.2, 7.0e-9, 0.008_561_234, 1.0 / 3.0] {
            let back: f64 = python_float(v).parse().unwrap();
            assert_eq!(back.to_bits(), v.to_bits());
        }
    }

    #[test]
    fn format_parsing() {
        assert_eq!("literal".parse::<OutputFormat>().unwrap(), OutputFormat::Literal);
        assert_eq!("TS".parse::<OutputFormat>().unwrap(), OutputFormat::TypeScript);
        assert!("json".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::TypeScript.to_string(), "typescript");
    }

    #[test]
    fn write_to_buffer() {
        let mut buf = Vec::new();
        CoefficientEmitter::new(OutputFormat::Literal)
            .write_to(&mut buf, &sample())
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 3);
    }

    #[test]
    fn write_to_path_creates_file() {
        let path = std::env::temp_dir().join(format!("melsparse-emit-{}.ts", std::process::id()));
        CoefficientEmitter::new(OutputFormat::TypeScript)
            .write_to_path(&path, &sample())
            .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(text.ends_with("];\n"));
    }

    #[test]
    fn write_to_missing_dir_fails() {
        let path = std::env::temp_dir()
            .join("melsparse-no-such-dir")
            .join("deeper")
            .join("out.ts");
        let err = CoefficientEmitter::new(OutputFormat::Literal)
            .write_to_path(&path, &sample())
            .unwrap_err();
        assert!(err.to_string().contains("Cannot create"), "{err}");
    }
}
