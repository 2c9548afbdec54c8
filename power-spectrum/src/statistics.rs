use std::f64::consts::PI;

use validator::Validate;

use crate::config::StatsConfig;
use crate::error::{Result, SpectrumError};
use crate::quadrature::{integrate_log, QuadResult};
use crate::spectrum::PowerSpectrum;
use crate::window::Window;

/// 2π², the angular normalization of an isotropic k-space integral.
const TWO_PI_SQ: f64 = 2.0 * PI * PI;

fn positive_finite(quantity: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SpectrumError::Degenerate { quantity, value })
    }
}

fn scaled(res: QuadResult, factor: f64) -> QuadResult {
    QuadResult {
        value: res.value * factor,
        error: res.error * factor,
        ..res
    }
}

/// Raw quadrature for σ²(R) = (1/2π²) ∫ k² P(k) W²(kR) dk.
///
/// The integral runs in `u = ln k` over the bounds of `config`, with P(k)
/// taken as zero outside them; every quadrature step is one
/// `evaluate_many` call.
///
/// Returns the [`QuadResult`] as-is, converged or not, so a caller can
/// inspect the error estimate and decide. Use [`sigma_with`] for the checked
/// σ(R).
pub fn variance<P>(spec: &P, r: f64, window: Window, config: &StatsConfig) -> Result<QuadResult>
where
    P: PowerSpectrum + ?Sized,
{
    if !(r.is_finite() && r > 0.0) {
        return Err(SpectrumError::Domain {
            quantity: "R",
            value: r,
            reason: "smoothing radius must be finite and > 0",
        });
    }
    config.validate()?;

    let res = integrate_log(
        |k| {
            let pk = spec.evaluate_many(k)?;
            Ok(k.iter()
                .zip(pk.iter())
                .map(|(&k, &p)| {
                    let w = window.eval(k * r);
                    k * k * p * w * w
                })
                .collect())
        },
        config.k_min,
        config.k_max,
        &config.quad,
    )?;

    Ok(scaled(res, 1.0 / TWO_PI_SQ))
}

/// σ(R) with an explicit window and configuration.
pub fn sigma_with<P>(spec: &P, r: f64, window: Window, config: &StatsConfig) -> Result<f64>
where
    P: PowerSpectrum + ?Sized,
{
    let s2 = variance(spec, r, window, config)?.require_converged("sigma^2(R)")?;
    Ok(positive_finite("sigma^2(R)", s2)?.sqrt())
}

/// σ(R) with the top-hat window and the spectrum's own configuration.
pub fn sigma<P>(spec: &P, r: f64) -> Result<f64>
where
    P: PowerSpectrum + ?Sized,
{
    sigma_with(spec, r, Window::TopHat, &spec.stats_config())
}

/// Raw quadrature for σ_v² = (1/3)(1/2π²) ∫ P(k) dk.
///
/// This is not the R → 0 limit of [`variance`]: the kernel has no k² and no
/// window.
pub fn dispersion_integral<P>(spec: &P, config: &StatsConfig) -> Result<QuadResult>
where
    P: PowerSpectrum + ?Sized,
{
    config.validate()?;
    let res = integrate_log(
        |k| spec.evaluate_many(k),
        config.k_min,
        config.k_max,
        &config.quad,
    )?;
    Ok(scaled(res, 1.0 / (3.0 * TWO_PI_SQ)))
}

/// Checked σ_v²: converged, finite and positive.
pub fn velocity_dispersion<P>(spec: &P, config: &StatsConfig) -> Result<f64>
where
    P: PowerSpectrum + ?Sized,
{
    let v = dispersion_integral(spec, config)?.require_converged("sigma_v^2")?;
    positive_finite("sigma_v^2", v)
}

/// k_nl = 1/√σ_v².
///
/// A non-positive dispersion cannot come from a physical spectrum, so it is
/// rejected as a domain error rather than turned into `inf`.
pub fn nonlinear_scale(sigma_v2: f64) -> Result<f64> {
    if sigma_v2.is_finite() && sigma_v2 > 0.0 {
        Ok(1.0 / sigma_v2.sqrt())
    } else {
        Err(SpectrumError::Domain {
            quantity: "sigma_v^2",
            value: sigma_v2,
            reason: "velocity dispersion must be finite and > 0",
        })
    }
}
