use std::path::PathBuf;

use thiserror::Error;

/// Failure modes of spectrum evaluation, statistics and tabulation.
///
/// A failed statistic is always one of these variants, never a sentinel
/// number, so callers can tell a valid small value from a failed one.
#[derive(Debug, Error)]
pub enum SpectrumError {
    /// Invalid argument to a physically meaningful function.
    #[error("invalid {quantity} = {value}: {reason}")]
    Domain {
        quantity: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Quadrature exhausted its interval budget before reaching tolerance.
    #[error(
        "{quantity} did not converge after {intervals} intervals \
         (estimate {estimate:e}, error {error:e})"
    )]
    NotConverged {
        quantity: &'static str,
        estimate: f64,
        error: f64,
        intervals: usize,
    },

    /// A positive-definite statistic came out non-positive or non-finite.
    #[error("{quantity} is degenerate: {value}")]
    Degenerate { quantity: &'static str, value: f64 },

    /// Paired k and P(k) sequences of different lengths.
    #[error("sample length mismatch: {k} wavenumbers, {pk} power values")]
    LengthMismatch { k: usize, pk: usize },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed line in a two-column table.
    #[error("{}:{line}: {reason}", .path.display())]
    Table {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] validator::ValidationErrors),
}

pub type Result<T> = std::result::Result<T, SpectrumError>;

impl SpectrumError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Reject non-finite or non-positive wavenumbers.
pub fn check_wavenumber(k: f64) -> Result<f64> {
    if k.is_finite() && k > 0.0 {
        Ok(k)
    } else {
        Err(SpectrumError::Domain {
            quantity: "k",
            value: k,
            reason: "wavenumber must be finite and > 0",
        })
    }
}
