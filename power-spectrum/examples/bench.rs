use std::sync::Arc;
use std::time::Instant;

use power_spectrum::{Cosmology, GridConfig, GridSpacing, PowerSpectrum, Tabulated};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

const N_TABLE: usize = 4096;
const N_RANDOM: usize = 1_000_000;
const RADII: [f64; 6] = [1.0, 2.0, 4.0, 8.0, 16.0, 32.0];

/// BBKS transfer function shape; realistic dynamic range for the quadrature.
fn shape(k: f64) -> f64 {
    let q = k / 0.2;
    let t = (1.0 + 2.34 * q).ln() / (2.34 * q)
        * (1.0 + 3.89 * q + (16.1 * q).powi(2) + (5.46 * q).powi(3) + (6.71 * q).powi(4))
            .powf(-0.25);
    2.0e4 * k.powf(0.9665) * t * t
}

fn main() {
    let cosmology = Arc::new(Cosmology::default());

    let grid = GridConfig {
        k_min: 1e-5,
        k_max: 1e2,
        n_k: N_TABLE,
        spacing: GridSpacing::Log,
    };
    let k = power_spectrum::tabulation::k_grid(&grid).unwrap();
    let pk: Vec<f64> = k.iter().map(|&k| shape(k)).collect();
    let spec = Tabulated::new(
        cosmology,
        power_spectrum::SampleArray::new(k, pk).unwrap(),
    )
    .unwrap();

    let mut rng = Xoshiro256StarStar::seed_from_u64(42);
    let queries: Vec<f64> = (0..N_RANDOM)
        .map(|_| 10f64.powf(rng.gen_range(-5.0..2.0)))
        .collect();

    println!(
        "Table: {} points  |  Random queries: {}  |  Threads: {}",
        N_TABLE,
        N_RANDOM,
        rayon::current_num_threads()
    );
    println!("{}", "-".repeat(70));

    let t0 = Instant::now();
    let values = spec.evaluate_many(&queries).unwrap();
    let elapsed = t0.elapsed().as_secs_f64();
    println!(
        "evaluate_many: {:.3} s  |  {:.1} ns/point  |  checksum {:.6e}",
        elapsed,
        elapsed / N_RANDOM as f64 * 1e9,
        values.iter().sum::<f64>()
    );

    for r in RADII {
        let t0 = Instant::now();
        let s = spec.sigma(r).unwrap();
        println!(
            "sigma({:>4.1}) = {:.6}  |  {:.3} ms",
            r,
            s,
            t0.elapsed().as_secs_f64() * 1e3
        );
    }

    let t0 = Instant::now();
    let sv2 = spec.velocity_dispersion().unwrap();
    let knl = spec.nonlinear_scale().unwrap();
    println!(
        "sigma_v^2 = {:.6}  |  k_nl = {:.6}  |  {:.3} ms",
        sv2,
        knl,
        t0.elapsed().as_secs_f64() * 1e3
    );
}
