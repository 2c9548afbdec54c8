use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;
use validator::Validate;

use crate::config::{GridConfig, GridSpacing};
use crate::error::{Result, SpectrumError};
use crate::spectrum::PowerSpectrum;

/// Paired wavenumbers and power values of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleArray {
    k: Vec<f64>,
    pk: Vec<f64>,
}

impl SampleArray {
    pub fn new(k: Vec<f64>, pk: Vec<f64>) -> Result<Self> {
        if k.len() != pk.len() {
            return Err(SpectrumError::LengthMismatch {
                k: k.len(),
                pk: pk.len(),
            });
        }
        Ok(Self { k, pk })
    }

    pub fn k(&self) -> &[f64] {
        &self.k
    }

    pub fn pk(&self) -> &[f64] {
        &self.pk
    }

    pub fn len(&self) -> usize {
        self.k.len()
    }

    pub fn is_empty(&self) -> bool {
        self.k.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.k.iter().copied().zip(self.pk.iter().copied())
    }

    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.k, self.pk)
    }
}

/// `n_k` wavenumbers from `k_min` to `k_max` inclusive, strictly increasing.
///
/// The endpoints are exact; interior points are spaced uniformly in k or
/// in ln k. A range too narrow to hold `n_k` distinct floats is a
/// [`SpectrumError::Domain`] error.
pub fn k_grid(grid: &GridConfig) -> Result<Vec<f64>> {
    grid.validate()?;
    let GridConfig {
        k_min,
        k_max,
        n_k,
        spacing,
    } = *grid;
    let last = (n_k - 1) as f64;

    let mut k: Vec<f64> = match spacing {
        GridSpacing::Linear => {
            let dk = (k_max - k_min) / last;
            (0..n_k).map(|i| k_min + i as f64 * dk).collect()
        }
        GridSpacing::Log => {
            let (lo, hi) = (k_min.ln(), k_max.ln());
            let du = (hi - lo) / last;
            (0..n_k).map(|i| (lo + i as f64 * du).exp()).collect()
        }
    };
    k[0] = k_min;
    k[n_k - 1] = k_max;

    if let Some(w) = k.windows(2).find(|w| w[1] <= w[0]) {
        return Err(SpectrumError::Domain {
            quantity: "k",
            value: w[1],
            reason: "grid too fine for the k range; wavenumbers would repeat",
        });
    }
    Ok(k)
}

/// Evaluate `spec` over the grid described by `grid`.
pub fn tabulate<P>(spec: &P, grid: &GridConfig) -> Result<SampleArray>
where
    P: PowerSpectrum + ?Sized,
{
    let k = k_grid(grid)?;
    let pk = spec.evaluate_many(&k)?;
    SampleArray::new(k, pk)
}

/// Destination for tabulated samples.
pub trait TableSink {
    fn write_samples(&mut self, samples: &SampleArray) -> io::Result<()>;
}

/// Whitespace-separated `k  P(k)` rows behind `#` comment lines.
pub struct TextTable<W: Write> {
    out: W,
    header: Vec<String>,
}

impl<W: Write> TextTable<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            header: vec!["k [h/Mpc]  P(k) [(Mpc/h)^3]".to_string()],
        }
    }

    /// Add a comment line above the column header.
    pub fn with_comment(mut self, line: impl Into<String>) -> Self {
        self.header.insert(self.header.len() - 1, line.into());
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TableSink for TextTable<W> {
    fn write_samples(&mut self, samples: &SampleArray) -> io::Result<()> {
        for line in &self.header {
            writeln!(self.out, "# {line}")?;
        }
        for (k, pk) in samples.iter() {
            writeln!(self.out, "{k:.8e}  {pk:.8e}")?;
        }
        self.out.flush()
    }
}

/// Tabulate `spec` and write the table to `path`.
///
/// The table is written to a temporary file next to `path` and renamed into
/// place only once complete, so a failure at any point leaves no partial
/// table behind. An existing file at `path` is replaced.
pub fn save<P>(spec: &P, path: &Path, grid: &GridConfig) -> Result<()>
where
    P: PowerSpectrum + ?Sized,
{
    let samples = tabulate(spec, grid)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir).map_err(|e| SpectrumError::io(path, e))?;

    let mut table = TextTable::new(BufWriter::new(tmp))
        .with_comment(format!("cosmology: {}", spec.cosmology().name))
        .with_comment(format!(
            "grid: {} points, {:?} spacing, k in [{:e}, {:e}]",
            grid.n_k, grid.spacing, grid.k_min, grid.k_max
        ));
    table
        .write_samples(&samples)
        .map_err(|e| SpectrumError::io(path, e))?;

    let tmp = table
        .into_inner()
        .into_inner()
        .map_err(|e| SpectrumError::io(path, e.into_error()))?;
    tmp.persist(path)
        .map_err(|e| SpectrumError::io(path, e.error))?;

    info!(path = %path.display(), rows = samples.len(), "saved power spectrum table");
    Ok(())
}

/// Parse a two-column table as written by [`TextTable`].
///
/// Blank lines and lines starting with `#` are skipped; extra columns are
/// ignored.
pub fn read_table(path: &Path) -> Result<SampleArray> {
    let text = fs::read_to_string(path).map_err(|e| SpectrumError::io(path, e))?;
    let bad = |line: usize, reason: String| SpectrumError::Table {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut k = Vec::new();
    let mut pk = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut cols = line.split_whitespace();
        let (Some(a), Some(b)) = (cols.next(), cols.next()) else {
            return Err(bad(i + 1, "expected two columns".to_string()));
        };
        let parse = |s: &str| {
            s.parse::<f64>()
                .map_err(|e| bad(i + 1, format!("'{s}': {e}")))
        };
        k.push(parse(a)?);
        pk.push(parse(b)?);
    }
    SampleArray::new(k, pk)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cosmology::Cosmology;
    use crate::spectrum::PowerLaw;

    fn spec() -> PowerLaw {
        PowerLaw::new(Arc::new(Cosmology::default()), 2.0, -1.0).unwrap()
    }

    fn grid(n_k: usize, spacing: GridSpacing) -> GridConfig {
        GridConfig {
            k_min: 1e-3,
            k_max: 1.0,
            n_k,
            spacing,
        }
    }

    #[test]
    fn linear_grid_is_uniform_with_exact_ends() {
        let k = k_grid(&grid(11, GridSpacing::Linear)).unwrap();
        assert_eq!(k.len(), 11);
        assert_eq!(k[0], 1e-3);
        assert_eq!(k[10], 1.0);
        let dk = k[1] - k[0];
        for w in k.windows(2) {
            assert!(((w[1] - w[0]) - dk).abs() < 1e-12);
        }
    }

    #[test]
    fn log_grid_has_constant_ratio() {
        let k = k_grid(&grid(4, GridSpacing::Log)).unwrap();
        assert_eq!(k[0], 1e-3);
        assert_eq!(k[3], 1.0);
        assert!((k[1] - 1e-2).abs() < 1e-15);
        assert!((k[2] - 1e-1).abs() < 1e-14);
    }

    #[test]
    fn two_point_grid_is_just_the_ends() {
        let k = k_grid(&grid(2, GridSpacing::Log)).unwrap();
        assert_eq!(k, vec![1e-3, 1.0]);
    }

    #[test]
    fn grid_with_repeated_wavenumbers_is_rejected() {
        let k_max = f64::from_bits(1.0f64.to_bits() + 1);
        for spacing in [GridSpacing::Linear, GridSpacing::Log] {
            let g = GridConfig {
                k_min: 1.0,
                k_max,
                n_k: 10,
                spacing,
            };
            assert!(matches!(k_grid(&g), Err(SpectrumError::Domain { .. })));
        }
    }

    #[test]
    fn narrow_grid_save_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pk.dat");
        let g = GridConfig {
            k_min: 1.0,
            k_max: f64::from_bits(1.0f64.to_bits() + 1),
            n_k: 10,
            spacing: GridSpacing::Log,
        };
        assert!(spec().save(&path, &g).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn invalid_grid_is_config_error() {
        assert!(matches!(
            k_grid(&grid(1, GridSpacing::Linear)),
            Err(SpectrumError::Config(_))
        ));
    }

    #[test]
    fn sample_array_rejects_mismatch() {
        assert!(matches!(
            SampleArray::new(vec![1.0, 2.0], vec![1.0]),
            Err(SpectrumError::LengthMismatch { k: 2, pk: 1 })
        ));
    }

    #[test]
    fn tabulate_pairs_grid_with_values() {
        let s = tabulate(&spec(), &grid(5, GridSpacing::Log)).unwrap();
        assert_eq!(s.len(), 5);
        for (k, p) in s.iter() {
            assert!((p - 2.0 / k).abs() <= 1e-12 * p);
        }
    }

    #[test]
    fn text_table_format() {
        let samples = SampleArray::new(vec![0.5, 1.0], vec![4.0, 2.0]).unwrap();
        let mut table = TextTable::new(Vec::new()).with_comment("unit");
        table.write_samples(&samples).unwrap();
        let text = String::from_utf8(table.into_inner()).unwrap();
        assert_eq!(
            text,
            "# unit\n# k [h/Mpc]  P(k) [(Mpc/h)^3]\n\
             5.00000000e-1  4.00000000e0\n1.00000000e0  2.00000000e0\n"
        );
    }

    #[test]
    fn save_writes_n_rows_in_ascending_k() {
        let dir = tempfile::tempdir().unwrap();
        for spacing in [GridSpacing::Linear, GridSpacing::Log] {
            let path = dir.path().join(format!("pk_{spacing:?}.dat"));
            let g = grid(1000, spacing);
            spec().save(&path, &g).unwrap();

            let table = read_table(&path).unwrap();
            assert_eq!(table.len(), 1000);
            let k = table.k();
            assert!(k.windows(2).all(|w| w[1] > w[0]));
            assert!((k[0] - 1e-3).abs() < 1e-10);
            assert!((k[999] - 1.0).abs() < 1e-8);

            let mid = k[500] / k[499];
            let first = k[1] / k[0];
            match spacing {
                GridSpacing::Log => assert!((mid - first).abs() < 1e-6),
                GridSpacing::Linear => assert!(mid < first),
            }
        }
    }

    #[test]
    fn save_uses_default_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pk.dat");
        spec().save(&path, &GridConfig::default()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# cosmology: planck18\n"));
        assert_eq!(read_table(&path).unwrap().len(), 1000);
    }

    #[test]
    fn save_to_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/pk.dat");
        assert!(matches!(
            spec().save(&path, &GridConfig::default()),
            Err(SpectrumError::Io { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn failed_evaluation_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pk.dat");
        let overflowing = PowerLaw::new(Arc::new(Cosmology::default()), 1.0, -400.0).unwrap();
        assert!(overflowing.save(&path, &GridConfig::default()).is_err());
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn read_table_reports_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.dat");
        fs::write(&path, "# header\n0.1 1.0\n0.2\n").unwrap();
        match read_table(&path) {
            Err(SpectrumError::Table { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected Table error, got {other:?}"),
        }

        fs::write(&path, "0.1 one\n").unwrap();
        assert!(matches!(
            read_table(&path),
            Err(SpectrumError::Table { line: 1, .. })
        ));
    }
}
