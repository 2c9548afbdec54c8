use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridSpacing {
    Linear,
    Log,
}

impl GridSpacing {
    pub fn from_log_flag(log: bool) -> Self {
        if log {
            Self::Log
        } else {
            Self::Linear
        }
    }
}

impl TryFrom<&str> for GridSpacing {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "linear" | "lin" => Ok(Self::Linear),
            "log" => Ok(Self::Log),
            _ => Err(format!(
                "unknown grid spacing '{s}', expected 'linear' or 'log'"
            )),
        }
    }
}

fn validate_quad_config(cfg: &QuadConfig) -> Result<(), ValidationError> {
    if !(cfg.rtol >= 0.0 && cfg.atol >= 0.0) {
        return Err(ValidationError::new("rtol and atol must be >= 0"));
    }
    if cfg.rtol == 0.0 && cfg.atol == 0.0 {
        return Err(ValidationError::new("rtol and atol cannot both be zero"));
    }
    if cfg.initial_intervals < 1 {
        return Err(ValidationError::new("initial_intervals must be >= 1"));
    }
    if cfg.limit < cfg.initial_intervals {
        return Err(ValidationError::new("limit must be >= initial_intervals"));
    }
    Ok(())
}

/// Tolerances and budget for the adaptive quadrature engine.
#[derive(Debug, Clone, Copy, PartialEq, Validate)]
#[validate(schema(function = "validate_quad_config"))]
pub struct QuadConfig {
    /// Relative tolerance on the integral.
    pub rtol: f64,
    /// Absolute tolerance on the integral.
    pub atol: f64,
    /// Maximum number of subintervals before giving up.
    pub limit: usize,
    /// Equal-width panels the domain is split into before refinement.
    pub initial_intervals: usize,
}

impl Default for QuadConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-12,
            limit: 200,
            initial_intervals: 8,
        }
    }
}

fn validate_stats_config(cfg: &StatsConfig) -> Result<(), ValidationError> {
    if !(cfg.k_min.is_finite() && cfg.k_min > 0.0) {
        return Err(ValidationError::new("k_min must be finite and > 0"));
    }
    if !(cfg.k_max.is_finite() && cfg.k_max > cfg.k_min) {
        return Err(ValidationError::new("k_max must be finite and > k_min"));
    }
    Ok(())
}

/// Integration bounds and quadrature settings for the spectrum statistics.
///
/// P(k) is treated as zero outside `[k_min, k_max]`.
#[derive(Debug, Clone, Copy, PartialEq, Validate)]
#[validate(schema(function = "validate_stats_config"))]
pub struct StatsConfig {
    pub k_min: f64,
    pub k_max: f64,
    #[validate]
    pub quad: QuadConfig,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            k_min: 1e-5,
            k_max: 1e2,
            quad: QuadConfig::default(),
        }
    }
}

fn validate_grid_config(cfg: &GridConfig) -> Result<(), ValidationError> {
    if cfg.n_k < 2 {
        return Err(ValidationError::new("n_k must be >= 2"));
    }
    if !(cfg.k_min.is_finite() && cfg.k_min > 0.0) {
        return Err(ValidationError::new("k_min must be finite and > 0"));
    }
    if !(cfg.k_max.is_finite() && cfg.k_max > cfg.k_min) {
        return Err(ValidationError::new("k_max must be finite and > k_min"));
    }
    Ok(())
}

/// A k-grid for tabulation and `save`.
#[derive(Debug, Clone, Copy, PartialEq, Validate)]
#[validate(schema(function = "validate_grid_config"))]
pub struct GridConfig {
    pub k_min: f64,
    pub k_max: f64,
    pub n_k: usize,
    pub spacing: GridSpacing,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            k_min: 1e-3,
            k_max: 1.0,
            n_k: 1000,
            spacing: GridSpacing::Linear,
        }
    }
}
