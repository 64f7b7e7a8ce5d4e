pub mod detectors;
pub mod error;
pub mod io;
pub mod metrics;
pub mod signal;

pub use detectors::*;
pub use error::EstimateError;
pub use metrics::rpm::{estimate_rolling_rpm, RollingRpmEstimator, RpmEstimatorConfig};
pub use signal::*;
