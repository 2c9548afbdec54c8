pub mod config;
pub mod cosmology;
pub mod error;
pub mod quadrature;
pub mod spectrum;
pub mod statistics;
pub mod tabulation;
pub mod window;

mod parallel;

pub use config::{GridConfig, GridSpacing, QuadConfig, StatsConfig};
pub use cosmology::Cosmology;
pub use error::{check_wavenumber, Result, SpectrumError};
pub use quadrature::QuadResult;
pub use spectrum::{PowerLaw, PowerSpectrum, Tabulated};
pub use tabulation::{SampleArray, TableSink, TextTable};
pub use window::Window;
