use std::path::PathBuf;
use std::sync::Arc;

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use numpy::ndarray::Array1;
use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1};
use pyo3::exceptions::{PyArithmeticError, PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyFloat;
use rayon::prelude::*;

use power_spectrum::{
    statistics, tabulation, Cosmology, GridConfig, GridSpacing, PowerLaw, PowerSpectrum,
    SampleArray, SpectrumError, Tabulated, Window,
};

fn to_py_err(e: SpectrumError) -> PyErr {
    match e {
        SpectrumError::Domain { .. }
        | SpectrumError::LengthMismatch { .. }
        | SpectrumError::Config(_) => PyValueError::new_err(e.to_string()),
        SpectrumError::NotConverged { .. } | SpectrumError::Degenerate { .. } => {
            PyArithmeticError::new_err(e.to_string())
        }
        SpectrumError::Io { .. } | SpectrumError::Table { .. } => {
            PyIOError::new_err(e.to_string())
        }
    }
}

fn parse_window(window: &str) -> PyResult<Window> {
    Window::try_from(window).map_err(PyValueError::new_err)
}

#[pyclass(name = "Cosmology", frozen)]
#[derive(Clone)]
struct PyCosmology {
    #[pyo3(get)]
    name: String,
    #[pyo3(get)]
    h: f64,
    #[pyo3(get)]
    omega_m: f64,
    #[pyo3(get)]
    omega_b: f64,
    #[pyo3(get)]
    n_s: f64,
    #[pyo3(get)]
    sigma8: f64,
}

impl PyCosmology {
    fn to_core(&self) -> PyResult<Arc<Cosmology>> {
        let c = Cosmology {
            name: self.name.clone(),
            h: self.h,
            omega_m: self.omega_m,
            omega_b: self.omega_b,
            n_s: self.n_s,
            sigma8: self.sigma8,
        };
        Ok(Arc::new(c.checked().map_err(to_py_err)?))
    }
}

impl From<&Cosmology> for PyCosmology {
    fn from(c: &Cosmology) -> Self {
        Self {
            name: c.name.clone(),
            h: c.h,
            omega_m: c.omega_m,
            omega_b: c.omega_b,
            n_s: c.n_s,
            sigma8: c.sigma8,
        }
    }
}

#[pymethods]
impl PyCosmology {
    /// Background parameters. Defaults are Planck 2018.
    #[new]
    #[pyo3(signature = (name=None, h=None, omega_m=None, omega_b=None, n_s=None, sigma8=None))]
    fn new(
        name: Option<String>,
        h: Option<f64>,
        omega_m: Option<f64>,
        omega_b: Option<f64>,
        n_s: Option<f64>,
        sigma8: Option<f64>,
    ) -> PyResult<Self> {
        let d = Cosmology::default();
        let c = Self {
            name: name.unwrap_or(d.name),
            h: h.unwrap_or(d.h),
            omega_m: omega_m.unwrap_or(d.omega_m),
            omega_b: omega_b.unwrap_or(d.omega_b),
            n_s: n_s.unwrap_or(d.n_s),
            sigma8: sigma8.unwrap_or(d.sigma8),
        };
        c.to_core()?;
        Ok(c)
    }

    fn __repr__(&self) -> String {
        format!(
            "Cosmology(name={:?}, h={}, omega_m={}, omega_b={}, n_s={}, sigma8={})",
            self.name, self.h, self.omega_m, self.omega_b, self.n_s, self.sigma8
        )
    }
}

fn bound_cosmology(cosmology: Option<PyRef<'_, PyCosmology>>) -> PyResult<Arc<Cosmology>> {
    match cosmology {
        Some(c) => c.to_core(),
        None => Ok(Arc::new(Cosmology::default())),
    }
}

#[pyclass(name = "PowerSpectrum", frozen)]
struct PyPowerSpectrum {
    inner: Box<dyn PowerSpectrum + Send>,
    kind: &'static str,
}

#[pymethods]
impl PyPowerSpectrum {
    /// P(k) = amplitude * k**index, optionally zero outside [k_lo, k_hi].
    #[staticmethod]
    #[pyo3(signature = (amplitude, index, k_lo=None, k_hi=None, cosmology=None))]
    fn power_law(
        amplitude: f64,
        index: f64,
        k_lo: Option<f64>,
        k_hi: Option<f64>,
        cosmology: Option<PyRef<'_, PyCosmology>>,
    ) -> PyResult<Self> {
        let mut pl = PowerLaw::new(bound_cosmology(cosmology)?, amplitude, index)
            .map_err(to_py_err)?;
        if k_lo.is_some() || k_hi.is_some() {
            pl = pl
                .truncated(k_lo.unwrap_or(f64::MIN_POSITIVE), k_hi.unwrap_or(f64::INFINITY))
                .map_err(to_py_err)?;
        }
        Ok(Self {
            inner: Box::new(pl),
            kind: "power_law",
        })
    }

    /// Interpolating spectrum through (k, pk) samples.
    #[staticmethod]
    #[pyo3(signature = (k, pk, cosmology=None))]
    fn from_samples(
        k: PyReadonlyArray1<f64>,
        pk: PyReadonlyArray1<f64>,
        cosmology: Option<PyRef<'_, PyCosmology>>,
    ) -> PyResult<Self> {
        let samples =
            SampleArray::new(k.as_slice()?.to_vec(), pk.as_slice()?.to_vec()).map_err(to_py_err)?;
        let t = Tabulated::new(bound_cosmology(cosmology)?, samples).map_err(to_py_err)?;
        Ok(Self {
            inner: Box::new(t),
            kind: "tabulated",
        })
    }

    /// Interpolating spectrum read from a two-column text file.
    #[staticmethod]
    #[pyo3(signature = (filename, cosmology=None))]
    fn load(filename: PathBuf, cosmology: Option<PyRef<'_, PyCosmology>>) -> PyResult<Self> {
        let t = Tabulated::load(bound_cosmology(cosmology)?, &filename).map_err(to_py_err)?;
        Ok(Self {
            inner: Box::new(t),
            kind: "tabulated",
        })
    }

    #[getter]
    fn cosmology(&self) -> PyCosmology {
        PyCosmology::from(self.inner.cosmology())
    }

    fn evaluate(&self, k: f64) -> PyResult<f64> {
        self.inner.evaluate(k).map_err(to_py_err)
    }

    /// `spectrum(k)`: a float for a scalar k, an array for a 1-D array.
    fn __call__(&self, py: Python<'_>, k: &Bound<'_, PyAny>) -> PyResult<PyObject> {
        if let Ok(ks) = k.extract::<PyReadonlyArray1<f64>>() {
            return Ok(self.evaluate_many(py, ks)?.into_any().unbind());
        }
        let k: f64 = k.extract()?;
        Ok(PyFloat::new(py, self.evaluate(k)?).into_any().unbind())
    }

    /// Evaluate at every k of a 1-D array; runs on the rayon pool with the
    /// GIL released.
    fn evaluate_many<'py>(
        &self,
        py: Python<'py>,
        k: PyReadonlyArray1<f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let k = k.as_slice()?.to_vec();
        let pk = py
            .allow_threads(|| self.inner.evaluate_many(&k))
            .map_err(to_py_err)?;
        Ok(Array1::from(pk).into_pyarray(py))
    }

    /// sigma(R) for a smoothing radius R in Mpc/h.
    ///
    /// window: "tophat" (default), "gaussian", or "sharpk"
    #[pyo3(signature = (r, window="tophat"))]
    fn sigma(&self, py: Python<'_>, r: f64, window: &str) -> PyResult<f64> {
        let window = parse_window(window)?;
        let spec = self.inner.as_ref();
        py.allow_threads(|| statistics::sigma_with(spec, r, window, &spec.stats_config()))
            .map_err(to_py_err)
    }

    /// sigma(R) for every radius in `radii`, in parallel over radii.
    #[pyo3(signature = (radii, window="tophat", progress=false))]
    fn sigma_many<'py>(
        &self,
        py: Python<'py>,
        radii: PyReadonlyArray1<f64>,
        window: &str,
        progress: bool,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let window = parse_window(window)?;
        let radii = radii.as_slice()?.to_vec();

        let pb = if progress {
            let pb = ProgressBar::new(radii.len() as u64);
            pb.set_style(
                ProgressStyle::with_template(
                    "{msg} [{bar:40}] {pos}/{len} [{elapsed_precise} < {eta_precise}, {per_sec}]",
                )
                .map_err(|e| PyValueError::new_err(e.to_string()))?
                .progress_chars("=> "),
            );
            pb.set_message("sigma(R)");
            pb
        } else {
            ProgressBar::hidden()
        };

        let spec = self.inner.as_ref();
        let config = spec.stats_config();
        let sigmas = py
            .allow_threads(|| {
                let out = radii
                    .par_iter()
                    .progress_with(pb.clone())
                    .map(|&r| statistics::sigma_with(spec, r, window, &config))
                    .collect::<Result<Vec<f64>, SpectrumError>>();
                pb.finish();
                out
            })
            .map_err(to_py_err)?;

        Ok(Array1::from(sigmas).into_pyarray(py))
    }

    /// sigma_v^2 = (1/6 pi^2) * integral of P(k) dk
    fn velocity_dispersion(&self, py: Python<'_>) -> PyResult<f64> {
        py.allow_threads(|| self.inner.velocity_dispersion())
            .map_err(to_py_err)
    }

    /// k_nl = 1 / sigma_v
    fn nonlinear_scale(&self, py: Python<'_>) -> PyResult<f64> {
        py.allow_threads(|| self.inner.nonlinear_scale())
            .map_err(to_py_err)
    }

    /// Return (k, P(k)) arrays on a grid.
    ///
    /// spacing: "linear" (default) or "log"
    #[pyo3(signature = (kmin=1e-3, kmax=1.0, nk=1000, spacing="linear"))]
    #[allow(clippy::type_complexity)]
    fn tabulate<'py>(
        &self,
        py: Python<'py>,
        kmin: f64,
        kmax: f64,
        nk: usize,
        spacing: &str,
    ) -> PyResult<(Bound<'py, PyArray1<f64>>, Bound<'py, PyArray1<f64>>)> {
        let grid = GridConfig {
            k_min: kmin,
            k_max: kmax,
            n_k: nk,
            spacing: GridSpacing::try_from(spacing).map_err(PyValueError::new_err)?,
        };
        let spec = self.inner.as_ref();
        let samples = py
            .allow_threads(|| tabulation::tabulate(spec, &grid))
            .map_err(to_py_err)?;
        let (k, pk) = samples.into_parts();
        Ok((
            Array1::from(k).into_pyarray(py),
            Array1::from(pk).into_pyarray(py),
        ))
    }

    /// Write P(k) on an nk-point grid to `filename` as two text columns.
    #[pyo3(signature = (filename, kmin=1e-3, kmax=1.0, nk=1000, log=false))]
    fn save(
        &self,
        py: Python<'_>,
        filename: PathBuf,
        kmin: f64,
        kmax: f64,
        nk: usize,
        log: bool,
    ) -> PyResult<()> {
        let grid = GridConfig {
            k_min: kmin,
            k_max: kmax,
            n_k: nk,
            spacing: GridSpacing::from_log_flag(log),
        };
        py.allow_threads(|| self.inner.save(&filename, &grid))
            .map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "PowerSpectrum(kind={:?}, cosmology={:?})",
            self.kind,
            self.inner.cosmology().name
        )
    }
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyCosmology>()?;
    m.add_class::<PyPowerSpectrum>()?;
    Ok(())
}
