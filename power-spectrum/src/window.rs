/// Fourier-space smoothing kernels W(x), x = kR.
///
/// All kernels satisfy W(0) = 1 and are pure functions of x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Window {
    /// Real-space spherical top-hat: `3 (sin x − x cos x) / x³`.
    #[default]
    TopHat,
    /// Real-space Gaussian: `exp(−x²/2)`.
    Gaussian,
    /// Sharp cut in k-space: 1 for `x ≤ 1`, 0 beyond.
    SharpK,
}

/// Below this |x| the top-hat uses its Taylor series; the closed form
/// cancels catastrophically there.
const TOP_HAT_SERIES_MAX: f64 = 1e-2;

impl Window {
    pub fn eval(self, x: f64) -> f64 {
        match self {
            Self::TopHat => top_hat(x),
            Self::Gaussian => (-0.5 * x * x).exp(),
            Self::SharpK => {
                if x.abs() <= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl TryFrom<&str> for Window {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "tophat" | "top-hat" => Ok(Self::TopHat),
            "gaussian" => Ok(Self::Gaussian),
            "sharpk" | "sharp-k" => Ok(Self::SharpK),
            _ => Err(format!(
                "unknown window '{s}', expected 'tophat', 'gaussian', or 'sharpk'"
            )),
        }
    }
}

fn top_hat(x: f64) -> f64 {
    if x.abs() < TOP_HAT_SERIES_MAX {
        let x2 = x * x;
        // 1 − x²/10 + x⁴/280 − x⁶/15120
        1.0 - x2 / 10.0 * (1.0 - x2 / 28.0 * (1.0 - x2 / 54.0))
    } else {
        3.0 * (x.sin() - x * x.cos()) / (x * x * x)
    }
}
