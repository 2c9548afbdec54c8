use std::path::Path;
use std::sync::Arc;

use crate::config::StatsConfig;
use crate::cosmology::Cosmology;
use crate::error::{check_wavenumber, Result, SpectrumError};
use crate::spectrum::PowerSpectrum;
use crate::tabulation::{read_table, SampleArray};

/// A spectrum known only at sample points.
///
/// Interpolates log-log between neighbours that are both positive and
/// linearly in ln k otherwise (so zeros in the table stay exact). Asking
/// for a k outside the table is a domain error; the default statistics are
/// restricted to the table range through [`PowerSpectrum::stats_config`].
#[derive(Debug, Clone)]
pub struct Tabulated {
    cosmology: Arc<Cosmology>,
    ln_k: Vec<f64>,
    pk: Vec<f64>,
    k_range: (f64, f64),
}

impl Tabulated {
    /// Build from samples with at least two points, strictly increasing
    /// positive k, and finite non-negative P(k).
    pub fn new(cosmology: Arc<Cosmology>, samples: SampleArray) -> Result<Self> {
        if samples.len() < 2 {
            return Err(SpectrumError::Domain {
                quantity: "sample count",
                value: samples.len() as f64,
                reason: "a table needs at least two points",
            });
        }
        for &k in samples.k() {
            check_wavenumber(k)?;
        }
        if let Some(w) = samples.k().windows(2).find(|w| w[1] <= w[0]) {
            return Err(SpectrumError::Domain {
                quantity: "k",
                value: w[1],
                reason: "tabulated wavenumbers must be strictly increasing",
            });
        }
        if let Some(&p) = samples.pk().iter().find(|p| !(p.is_finite() && **p >= 0.0)) {
            return Err(SpectrumError::Domain {
                quantity: "P(k)",
                value: p,
                reason: "tabulated power must be finite and >= 0",
            });
        }

        let (k, pk) = samples.into_parts();
        Ok(Self {
            cosmology,
            ln_k: k.iter().map(|k| k.ln()).collect(),
            k_range: (k[0], k[k.len() - 1]),
            pk,
        })
    }

    /// Load a two-column table, e.g. one written by
    /// [`PowerSpectrum::save`].
    pub fn load(cosmology: Arc<Cosmology>, path: &Path) -> Result<Self> {
        Self::new(cosmology, read_table(path)?)
    }

    /// `(k_min, k_max)` of the table.
    pub fn range(&self) -> (f64, f64) {
        self.k_range
    }
}

impl PowerSpectrum for Tabulated {
    fn cosmology(&self) -> &Cosmology {
        &self.cosmology
    }

    fn evaluate(&self, k: f64) -> Result<f64> {
        let u = check_wavenumber(k)?.ln();
        let last = self.ln_k.len() - 1;
        if u < self.ln_k[0] || u > self.ln_k[last] {
            return Err(SpectrumError::Domain {
                quantity: "k",
                value: k,
                reason: "outside tabulated range",
            });
        }

        // First index with ln_k > u, clamped so [i-1, i] is a valid bracket.
        let i = self.ln_k.partition_point(|&x| x <= u).clamp(1, last);
        let (u0, u1) = (self.ln_k[i - 1], self.ln_k[i]);
        let (p0, p1) = (self.pk[i - 1], self.pk[i]);
        let t = (u - u0) / (u1 - u0);

        Ok(if p0 > 0.0 && p1 > 0.0 {
            (p0.ln() + t * (p1.ln() - p0.ln())).exp()
        } else {
            p0 + t * (p1 - p0)
        })
    }

    fn stats_config(&self) -> StatsConfig {
        let (k_min, k_max) = self.range();
        StatsConfig {
            k_min,
            k_max,
            ..StatsConfig::default()
        }
    }
}
