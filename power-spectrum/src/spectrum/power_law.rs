use std::sync::Arc;

use crate::cosmology::Cosmology;
use crate::error::{check_wavenumber, Result, SpectrumError};
use crate::spectrum::PowerSpectrum;

/// P(k) = A·kⁿ on `[k_lo, k_hi]`, zero outside.
///
/// Not a physical model; its moments have closed forms, which makes it the
/// reference for checking the statistics layer. Untruncated by default.
#[derive(Debug, Clone)]
pub struct PowerLaw {
    cosmology: Arc<Cosmology>,
    amplitude: f64,
    index: f64,
    k_lo: f64,
    k_hi: f64,
}

impl PowerLaw {
    pub fn new(cosmology: Arc<Cosmology>, amplitude: f64, index: f64) -> Result<Self> {
        if !(amplitude.is_finite() && amplitude >= 0.0) {
            return Err(SpectrumError::Domain {
                quantity: "amplitude",
                value: amplitude,
                reason: "amplitude must be finite and >= 0",
            });
        }
        if !index.is_finite() {
            return Err(SpectrumError::Domain {
                quantity: "index",
                value: index,
                reason: "spectral index must be finite",
            });
        }
        Ok(Self {
            cosmology,
            amplitude,
            index,
            k_lo: 0.0,
            k_hi: f64::INFINITY,
        })
    }

    /// Restrict support to `[k_lo, k_hi]`.
    pub fn truncated(self, k_lo: f64, k_hi: f64) -> Result<Self> {
        check_wavenumber(k_lo)?;
        if !(k_hi > k_lo) {
            return Err(SpectrumError::Domain {
                quantity: "k_hi",
                value: k_hi,
                reason: "upper cutoff must exceed lower cutoff",
            });
        }
        Ok(Self { k_lo, k_hi, ..self })
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn index(&self) -> f64 {
        self.index
    }

    pub fn support(&self) -> (f64, f64) {
        (self.k_lo, self.k_hi)
    }
}

impl PowerSpectrum for PowerLaw {
    fn cosmology(&self) -> &Cosmology {
        &self.cosmology
    }

    fn evaluate(&self, k: f64) -> Result<f64> {
        let k = check_wavenumber(k)?;
        if k < self.k_lo || k > self.k_hi {
            return Ok(0.0);
        }
        let p = self.amplitude * k.powf(self.index);
        if p.is_finite() {
            Ok(p)
        } else {
            Err(SpectrumError::Degenerate {
                quantity: "P(k)",
                value: p,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosmo() -> Arc<Cosmology> {
        Arc::new(Cosmology::default())
    }

    #[test]
    fn evaluates_power_law() {
        let pl = PowerLaw::new(cosmo(), 3.0, -2.0).unwrap();
        assert_eq!(pl.evaluate(2.0).unwrap(), 0.75);
        assert_eq!(pl.support(), (0.0, f64::INFINITY));
    }

    #[test]
    fn zero_outside_support_inclusive_at_edges() {
        let pl = PowerLaw::new(cosmo(), 1.0, 0.0)
            .unwrap()
            .truncated(1e-3, 1.0)
            .unwrap();
        assert_eq!(pl.evaluate(1e-3).unwrap(), 1.0);
        assert_eq!(pl.evaluate(1.0).unwrap(), 1.0);
        assert_eq!(pl.evaluate(9e-4).unwrap(), 0.0);
        assert_eq!(pl.evaluate(1.01).unwrap(), 0.0);
    }

    #[test]
    fn non_positive_k_is_domain_error() {
        let pl = PowerLaw::new(cosmo(), 1.0, 1.0).unwrap();
        for k in [0.0, -1.0] {
            assert!(matches!(
                pl.evaluate(k),
                Err(SpectrumError::Domain { quantity: "k", .. })
            ));
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(PowerLaw::new(cosmo(), -1.0, 1.0).is_err());
        assert!(PowerLaw::new(cosmo(), 1.0, f64::NAN).is_err());
        let pl = PowerLaw::new(cosmo(), 1.0, 1.0).unwrap();
        assert!(pl.clone().truncated(1.0, 0.5).is_err());
        assert!(pl.truncated(0.0, 1.0).is_err());
    }

    #[test]
    fn overflow_is_degenerate() {
        let pl = PowerLaw::new(cosmo(), 1.0, -400.0).unwrap();
        assert!(matches!(
            pl.evaluate(1e-3),
            Err(SpectrumError::Degenerate { .. })
        ));
    }

    #[test]
    fn cosmology_is_shared_not_copied() {
        let c = cosmo();
        let a = PowerLaw::new(Arc::clone(&c), 1.0, 1.0).unwrap();
        let b = PowerLaw::new(Arc::clone(&c), 2.0, 1.0).unwrap();
        assert!(std::ptr::eq(a.cosmology(), b.cosmology()));
        assert_eq!(Arc::strong_count(&c), 3);
    }
}
