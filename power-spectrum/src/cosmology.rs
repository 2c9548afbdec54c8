use validator::{Validate, ValidationError};

use crate::error;

fn validate_cosmology(c: &Cosmology) -> Result<(), ValidationError> {
    if !(c.h > 0.0) {
        return Err(ValidationError::new("h must be > 0"));
    }
    if !(c.omega_m > 0.0) {
        return Err(ValidationError::new("omega_m must be > 0"));
    }
    if !(c.omega_b >= 0.0 && c.omega_b <= c.omega_m) {
        return Err(ValidationError::new("omega_b must lie in [0, omega_m]"));
    }
    if !(c.sigma8 > 0.0) {
        return Err(ValidationError::new("sigma8 must be > 0"));
    }
    Ok(())
}

/// Background cosmological parameters a spectrum is bound to.
///
/// Spectra hold this behind an `Arc` and never mutate it; evaluation only
/// reads it, so a single instance can back any number of spectra across
/// threads.
#[derive(Debug, Clone, PartialEq, Validate)]
#[validate(schema(function = "validate_cosmology"))]
pub struct Cosmology {
    pub name: String,
    /// Dimensionless Hubble parameter, H0 / (100 km/s/Mpc).
    pub h: f64,
    pub omega_m: f64,
    pub omega_b: f64,
    #[validate(range(min = 0.5, max = 1.5))]
    pub n_s: f64,
    pub sigma8: f64,
}

impl Cosmology {
    /// Validate and return `self`.
    pub fn checked(self) -> error::Result<Self> {
        self.validate()?;
        Ok(self)
    }
}

impl Default for Cosmology {
    /// Planck 2018 (TT,TE,EE+lowE+lensing+BAO).
    fn default() -> Self {
        Self {
            name: "planck18".to_string(),
            h: 0.6766,
            omega_m: 0.3111,
            omega_b: 0.04897,
            n_s: 0.9665,
            sigma8: 0.8102,
        }
    }
}
