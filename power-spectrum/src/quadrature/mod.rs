mod gauss_kronrod;

use tracing::{debug, warn};
use validator::Validate;

use crate::config::QuadConfig;
use crate::error::{Result, SpectrumError};

use gauss_kronrod::NODES_PER_PANEL;

/// Outcome of an adaptive integration.
///
/// A non-converged result still carries the best estimate; callers decide
/// whether to accept it ([`QuadResult::require_converged`] rejects it).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadResult {
    /// Integral estimate.
    pub value: f64,
    /// Estimated absolute error.
    pub error: f64,
    /// Number of integrand evaluations.
    pub n_eval: usize,
    /// Number of subintervals in the final partition.
    pub intervals: usize,
    /// Whether the tolerance was reached within the budget.
    pub converged: bool,
}

impl QuadResult {
    /// Turn a non-converged result into [`SpectrumError::NotConverged`].
    pub fn require_converged(self, quantity: &'static str) -> Result<f64> {
        if self.converged {
            Ok(self.value)
        } else {
            Err(SpectrumError::NotConverged {
                quantity,
                estimate: self.value,
                error: self.error,
                intervals: self.intervals,
            })
        }
    }
}

struct Interval {
    lo: f64,
    hi: f64,
    value: f64,
    error: f64,
}

/// Evaluate a batch of panels in one integrand call.
fn eval_panels<F>(f: &mut F, panels: &[(f64, f64)], n_eval: &mut usize) -> Result<Vec<Interval>>
where
    F: FnMut(&[f64]) -> Result<Vec<f64>>,
{
    let mut nodes = Vec::with_capacity(panels.len() * NODES_PER_PANEL);
    for &(lo, hi) in panels {
        gauss_kronrod::push_nodes(lo, hi, &mut nodes);
    }

    let fx = f(&nodes)?;
    if fx.len() != nodes.len() {
        return Err(SpectrumError::LengthMismatch {
            k: nodes.len(),
            pk: fx.len(),
        });
    }
    *n_eval += nodes.len();

    if let Some(&bad) = fx.iter().find(|v| !v.is_finite()) {
        return Err(SpectrumError::Degenerate {
            quantity: "integrand",
            value: bad,
        });
    }

    Ok(panels
        .iter()
        .zip(fx.chunks_exact(NODES_PER_PANEL))
        .map(|(&(lo, hi), chunk)| {
            let (value, error) = gauss_kronrod::apply(lo, hi, chunk);
            Interval {
                lo,
                hi,
                value,
                error,
            }
        })
        .collect())
}

/// Integrate a batch integrand over `[a, b]` with adaptive Gauss–Kronrod.
///
/// `f` receives every node of one refinement step at once and must return
/// one value per node, in order; a batch of the wrong length is a
/// [`SpectrumError::LengthMismatch`]. Refinement bisects the interval with
/// the largest error estimate until the summed error meets
/// `max(atol, rtol·|I|)` or `config.limit` intervals are in use. Nodes never
/// touch the endpoints, so integrable endpoint singularities are tolerated.
///
/// Errors from the integrand propagate unchanged; a non-finite integrand
/// value is reported as [`SpectrumError::Degenerate`].
pub fn integrate_batch<F>(mut f: F, a: f64, b: f64, config: &QuadConfig) -> Result<QuadResult>
where
    F: FnMut(&[f64]) -> Result<Vec<f64>>,
{
    config.validate()?;
    if !(a.is_finite() && b.is_finite()) {
        return Err(SpectrumError::Domain {
            quantity: "integration bound",
            value: if a.is_finite() { b } else { a },
            reason: "bounds must be finite",
        });
    }
    if b < a {
        return Err(SpectrumError::Domain {
            quantity: "integration bound",
            value: b,
            reason: "upper bound must not be below lower bound",
        });
    }
    if a == b {
        return Ok(QuadResult {
            value: 0.0,
            error: 0.0,
            n_eval: 0,
            intervals: 0,
            converged: true,
        });
    }

    let n0 = config.initial_intervals;
    let width = (b - a) / n0 as f64;
    let panels: Vec<(f64, f64)> = (0..n0)
        .map(|i| {
            let lo = a + i as f64 * width;
            let hi = if i + 1 == n0 { b } else { lo + width };
            (lo, hi)
        })
        .collect();

    let mut n_eval = 0;
    let mut intervals = eval_panels(&mut f, &panels, &mut n_eval)?;

    let converged = loop {
        let value: f64 = intervals.iter().map(|iv| iv.value).sum();
        let error: f64 = intervals.iter().map(|iv| iv.error).sum();
        if error <= config.atol.max(config.rtol * value.abs()) {
            break true;
        }
        if intervals.len() >= config.limit {
            break false;
        }

        let Some((worst, _)) = intervals
            .iter()
            .enumerate()
            .max_by(|(_, x), (_, y)| x.error.total_cmp(&y.error))
        else {
            break false;
        };
        let Interval { lo, hi, .. } = intervals[worst];
        let mid = 0.5 * (lo + hi);
        // Floating-point resolution exhausted.
        if mid <= lo || mid >= hi {
            break false;
        }

        let halves = eval_panels(&mut f, &[(lo, mid), (mid, hi)], &mut n_eval)?;
        intervals.swap_remove(worst);
        intervals.extend(halves);
    };

    let result = QuadResult {
        value: intervals.iter().map(|iv| iv.value).sum(),
        error: intervals.iter().map(|iv| iv.error).sum(),
        n_eval,
        intervals: intervals.len(),
        converged,
    };

    if converged {
        debug!(
            a,
            b,
            value = result.value,
            error = result.error,
            intervals = result.intervals,
            n_eval = result.n_eval,
            "quadrature converged"
        );
    } else {
        warn!(
            a,
            b,
            value = result.value,
            error = result.error,
            intervals = result.intervals,
            "quadrature did not reach tolerance"
        );
    }

    Ok(result)
}

/// Integrate a pointwise function over `[a, b]`.
pub fn integrate(f: impl Fn(f64) -> f64, a: f64, b: f64, config: &QuadConfig) -> Result<QuadResult> {
    integrate_batch(|x| Ok(x.iter().map(|&x| f(x)).collect()), a, b, config)
}

/// Integrate `∫ f(k) dk` over `[k_min, k_max]` in `u = ln k`.
///
/// The substitution `k = e^u` turns the integrand into `k·f(k)`, which
/// spreads many decades of k over a domain of modest width. `f` receives
/// wavenumbers, not logarithms.
pub fn integrate_log<F>(mut f: F, k_min: f64, k_max: f64, config: &QuadConfig) -> Result<QuadResult>
where
    F: FnMut(&[f64]) -> Result<Vec<f64>>,
{
    if !(k_min > 0.0 && k_max > 0.0) {
        return Err(SpectrumError::Domain {
            quantity: "integration bound",
            value: k_min.min(k_max),
            reason: "log-space bounds must be > 0",
        });
    }
    integrate_batch(
        |u| {
            let k: Vec<f64> = u.iter().map(|&u| u.exp()).collect();
            let fk = f(&k)?;
            if fk.len() != k.len() {
                return Err(SpectrumError::LengthMismatch {
                    k: k.len(),
                    pk: fk.len(),
                });
            }
            Ok(fk.iter().zip(k.iter()).map(|(&fk, &k)| fk * k).collect())
        },
        k_min.ln(),
        k_max.ln(),
        config,
    )
}
