pub mod power_law;
pub mod tabulated;

pub use power_law::PowerLaw;
pub use tabulated::Tabulated;

use std::path::Path;

use crate::config::{GridConfig, StatsConfig};
use crate::cosmology::Cosmology;
use crate::error::Result;
use crate::parallel::{par_map, MIN_PARALLEL_LEN};
use crate::{statistics, tabulation};

/// A wavenumber-to-power mapping bound to a cosmology.
///
/// Units: k in h/Mpc, P(k) in (Mpc/h)³, smoothing radii in Mpc/h, with the
/// normalization `(2π)³ δ_D(k + k') P(k) = ⟨δ(k) δ(k')⟩`.
///
/// Implementors supply [`cosmology`](Self::cosmology) and
/// [`evaluate`](Self::evaluate); everything else has a default built on
/// those two and may be overridden when a model has a faster route (a
/// vectorized batch path, a closed-form variance, ...).
///
/// `evaluate` must be a pure function of `k` and the bound cosmology, which
/// is what makes the default batch path safe to run in parallel. The
/// cosmology is shared read-only; callers must not mutate a cosmology that
/// an in-flight evaluation can observe (an `Arc<Cosmology>` makes that
/// impossible without interior mutability).
pub trait PowerSpectrum: Sync {
    fn cosmology(&self) -> &Cosmology;

    /// P(k) at a single wavenumber.
    ///
    /// `k` must be finite and positive; anything else is a
    /// [`SpectrumError::Domain`](crate::SpectrumError::Domain). The result
    /// is never negative or NaN.
    fn evaluate(&self, k: f64) -> Result<f64>;

    /// P(k) at every wavenumber in `k`; `out[i]` corresponds to `k[i]`.
    ///
    /// The default fans out over the rayon pool. Evaluation order is
    /// unspecified; any failing element fails the whole batch.
    fn evaluate_many(&self, k: &[f64]) -> Result<Vec<f64>> {
        par_map(k, k.len() < MIN_PARALLEL_LEN, |&k| self.evaluate(k))
    }

    /// Integration bounds and tolerances used by the default statistics.
    fn stats_config(&self) -> StatsConfig {
        StatsConfig::default()
    }

    /// σ(R) for a top-hat of radius `r` Mpc/h.
    fn sigma(&self, r: f64) -> Result<f64> {
        statistics::sigma(self, r)
    }

    /// 1-D velocity dispersion σ_v² = (1/6π²) ∫ P(k) dk.
    fn velocity_dispersion(&self) -> Result<f64> {
        statistics::velocity_dispersion(self, &self.stats_config())
    }

    /// k_nl = 1/σ_v.
    fn nonlinear_scale(&self) -> Result<f64> {
        statistics::nonlinear_scale(self.velocity_dispersion()?)
    }

    /// Tabulate P(k) on `grid` and write it as a two-column text table.
    fn save(&self, path: &Path, grid: &GridConfig) -> Result<()> {
        tabulation::save(self, path, grid)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256StarStar;

    use super::*;
    use crate::SpectrumError;

    /// Counts scalar calls so tests can tell which path ran.
    struct Counting {
        cosmology: Arc<Cosmology>,
        calls: AtomicUsize,
    }

    impl PowerSpectrum for Counting {
        fn cosmology(&self) -> &Cosmology {
            &self.cosmology
        }

        fn evaluate(&self, k: f64) -> Result<f64> {
            crate::check_wavenumber(k)?;
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(1.0 / (1.0 + k * k))
        }
    }

    /// Overrides the dispersion with a fixed value.
    struct ClosedForm(Arc<Cosmology>);

    impl PowerSpectrum for ClosedForm {
        fn cosmology(&self) -> &Cosmology {
            &self.0
        }

        fn evaluate(&self, k: f64) -> Result<f64> {
            crate::check_wavenumber(k)?;
            Ok(0.0)
        }

        fn velocity_dispersion(&self) -> Result<f64> {
            Ok(0.25)
        }
    }

    /// A batch override that drops the last value.
    struct ShortBatch(Arc<Cosmology>);

    impl PowerSpectrum for ShortBatch {
        fn cosmology(&self) -> &Cosmology {
            &self.0
        }

        fn evaluate(&self, k: f64) -> Result<f64> {
            crate::check_wavenumber(k)?;
            Ok(1.0)
        }

        fn evaluate_many(&self, k: &[f64]) -> Result<Vec<f64>> {
            Ok(vec![1.0; k.len().saturating_sub(1)])
        }
    }

    fn counting() -> Counting {
        Counting {
            cosmology: Arc::new(Cosmology::default()),
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn batch_matches_scalar_on_random_wavenumbers() {
        let spec = counting();
        let mut rng = Xoshiro256StarStar::seed_from_u64(42);
        let k: Vec<f64> = (0..500)
            .map(|_| 10f64.powf(rng.gen_range(-4.0..2.0)))
            .collect();

        let batch = spec.evaluate_many(&k).unwrap();
        assert_eq!(batch.len(), k.len());
        for (&ki, &pi) in k.iter().zip(batch.iter()) {
            assert_eq!(pi, spec.evaluate(ki).unwrap());
        }
    }

    #[test]
    fn batch_preserves_order_for_unsorted_input() {
        let spec = counting();
        let k = [5.0, 0.01, 1.0, 0.5, 100.0];
        let p = spec.evaluate_many(&k).unwrap();
        assert_eq!(p[0], 1.0 / 26.0);
        assert_eq!(p[2], 0.5);
        assert!(p[1] > p[3] && p[3] > p[0] && p[0] > p[4]);
    }

    #[test]
    fn batch_of_one_agrees_with_scalar() {
        let spec = counting();
        assert_eq!(
            spec.evaluate_many(&[0.3]).unwrap()[0],
            spec.evaluate(0.3).unwrap()
        );
    }

    #[test]
    fn empty_batch_is_empty() {
        let spec = counting();
        assert!(spec.evaluate_many(&[]).unwrap().is_empty());
        assert_eq!(spec.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn invalid_element_fails_batch() {
        let spec = counting();
        let k: Vec<f64> = (0..100).map(|i| if i == 73 { -1.0 } else { 0.1 }).collect();
        assert!(matches!(
            spec.evaluate_many(&k),
            Err(SpectrumError::Domain { .. })
        ));
    }

    #[test]
    fn nonlinear_scale_uses_overridden_dispersion() {
        let spec = ClosedForm(Arc::new(Cosmology::default()));
        assert_eq!(spec.nonlinear_scale().unwrap(), 2.0);
    }

    #[test]
    fn short_batch_override_is_an_error_not_a_panic() {
        let spec = ShortBatch(Arc::new(Cosmology::default()));
        assert!(matches!(
            spec.velocity_dispersion(),
            Err(SpectrumError::LengthMismatch { .. })
        ));
        assert!(matches!(
            spec.sigma(8.0),
            Err(SpectrumError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn works_through_trait_object() {
        let spec: Box<dyn PowerSpectrum + Send> = Box::new(counting());
        assert_eq!(spec.cosmology().name, "planck18");
        assert!(spec.sigma(8.0).unwrap() > 0.0);
    }
}
