use crate::signal::RpmSample;
use serde::{Deserialize, Serialize};

/// Descriptive statistics over a rolling RPM output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RpmSummary {
    pub n: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub sd: f64,
}

pub fn rpm_summary(samples: &[RpmSample]) -> RpmSummary {
    let n = samples.len();
    if n == 0 {
        return RpmSummary {
            n,
            mean: 0.0,
            min: 0.0,
            max: 0.0,
            sd: 0.0,
        };
    }
    let rpm: Vec<f64> = samples.iter().map(|s| s.rpm as f64).collect();
    let mean = rpm.iter().sum::<f64>() / n as f64;
    let min = rpm.iter().copied().fold(f64::INFINITY, f64::min);
    let max = rpm.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let sd = if n > 1 {
        (rpm.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0)).sqrt()
    } else {
        0.0
    };
    RpmSummary {
        n,
        mean,
        min,
        max,
        sd,
    }
}
