//! Rolling RPM estimation over fixed, non-overlapping windows.
//!
//! Each window is searched for strict local maxima, peaks closer than the
//! configured dwell time are dropped, and the mean spacing of the remaining
//! peaks is converted to revolutions per minute. A window yields at most one
//! sample; windows with fewer than two usable peaks yield nothing.
//!
//! Trailing readings that do not fill a whole window are ignored.

use crate::{
    detectors::peaks::{detect_peaks, filter_min_interval},
    error::EstimateError,
    signal::{RpmSample, Series, WallClock},
};
use log::debug;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Parameters of the rolling estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RpmEstimatorConfig {
    /// Readings per window.
    pub window_size: usize,
    /// Minimum spacing between retained peaks (seconds).
    pub min_time_interval_s: f64,
}

impl Default for RpmEstimatorConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            min_time_interval_s: 0.0,
        }
    }
}

impl RpmEstimatorConfig {
    pub fn new(window_size: usize, min_time_interval_s: f64) -> Self {
        Self {
            window_size,
            min_time_interval_s,
        }
    }

    /// Derive the peak dwell time from the fastest physically plausible speed.
    pub fn from_max_rpm(window_size: usize, max_rpm: f64) -> Result<Self, EstimateError> {
        if !(max_rpm > 0.0 && max_rpm.is_finite()) {
            return Err(EstimateError::InvalidMaxRpm(max_rpm));
        }
        Ok(Self::new(window_size, 60.0 / max_rpm))
    }

    pub fn validate(&self) -> Result<(), EstimateError> {
        if self.window_size == 0 {
            return Err(EstimateError::ZeroWindowSize);
        }
        // NaN fails the comparison as well
        if !(self.min_time_interval_s >= 0.0) {
            return Err(EstimateError::NegativeMinInterval(self.min_time_interval_s));
        }
        Ok(())
    }
}

/// Why a window produced no sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer than two peaks survived filtering.
    TooFewPeaks { found: usize },
    /// Mean peak spacing was zero, negative or not finite.
    ZeroPeriod,
}

/// Period and speed derived from a set of peak times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodEstimate {
    pub period_s: f64,
    pub rpm: f64,
    pub mean_time_s: f64,
}

impl PeriodEstimate {
    pub fn to_sample(&self) -> RpmSample {
        RpmSample {
            rpm: self.rpm.trunc() as i64,
            timestamp: WallClock::from_seconds(self.mean_time_s),
        }
    }
}

/// Per-window diagnostics, with peak indices relative to the whole series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowReport {
    pub index: usize,
    pub start: usize,
    pub peaks: Vec<usize>,
    pub filtered_peaks: Vec<usize>,
    pub period_s: Option<f64>,
    pub sample: Option<RpmSample>,
    pub skipped: Option<SkipReason>,
}

/// Index ranges of the full windows covering `len` readings.
pub fn window_ranges(len: usize, window_size: usize) -> Result<Vec<Range<usize>>, EstimateError> {
    if window_size == 0 {
        return Err(EstimateError::ZeroWindowSize);
    }
    let num_windows = len / window_size;
    Ok((0..num_windows)
        .map(|w| w * window_size..(w + 1) * window_size)
        .collect())
}

/// Mean inter-peak period converted to RPM, stamped at the mean peak time.
pub fn rpm_from_peak_times(peak_times: &[f64]) -> Result<PeriodEstimate, SkipReason> {
    if peak_times.len() < 2 {
        return Err(SkipReason::TooFewPeaks {
            found: peak_times.len(),
        });
    }
    let spacing: f64 = peak_times.windows(2).map(|w| w[1] - w[0]).sum();
    let period_s = spacing / (peak_times.len() - 1) as f64;
    if !(period_s > 0.0 && period_s.is_finite()) {
        return Err(SkipReason::ZeroPeriod);
    }
    let rpm = 60.0 / period_s;
    if !rpm.is_finite() {
        return Err(SkipReason::ZeroPeriod);
    }
    let mean_time_s = peak_times.iter().sum::<f64>() / peak_times.len() as f64;
    Ok(PeriodEstimate {
        period_s,
        rpm,
        mean_time_s,
    })
}

/// Batch rolling RPM estimator. Holds only its configuration, so one instance
/// can serve any number of series from any number of threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingRpmEstimator {
    config: RpmEstimatorConfig,
}

impl RollingRpmEstimator {
    pub fn new(config: RpmEstimatorConfig) -> Result<Self, EstimateError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RpmEstimatorConfig {
        &self.config
    }

    /// One sample per window that had at least two well-spaced peaks, in window order.
    pub fn estimate(&self, series: &Series) -> Vec<RpmSample> {
        self.estimate_windows(series)
            .into_iter()
            .filter_map(|report| report.sample)
            .collect()
    }

    /// Full per-window breakdown, including the windows that produced nothing.
    pub fn estimate_windows(&self, series: &Series) -> Vec<WindowReport> {
        let ranges = match window_ranges(series.len(), self.config.window_size) {
            Ok(ranges) => ranges,
            Err(_) => return Vec::new(),
        };
        if series.len() % self.config.window_size != 0 {
            debug!(
                "dropping {} trailing readings that do not fill a window",
                series.len() % self.config.window_size
            );
        }
        ranges
            .into_iter()
            .enumerate()
            .map(|(index, range)| self.process_window(series, index, range))
            .collect()
    }

    fn process_window(&self, series: &Series, index: usize, range: Range<usize>) -> WindowReport {
        let start = range.start;
        let values = &series.values()[range.clone()];
        let times = &series.times()[range];

        let peaks = detect_peaks(values);
        let filtered = filter_min_interval(&peaks, times, self.config.min_time_interval_s);
        let peak_times = filtered.times(times);

        let mut report = WindowReport {
            index,
            start,
            peaks: peaks.offset(start).indices,
            filtered_peaks: filtered.offset(start).indices,
            period_s: None,
            sample: None,
            skipped: None,
        };
        match rpm_from_peak_times(&peak_times) {
            Ok(estimate) => {
                report.period_s = Some(estimate.period_s);
                report.sample = Some(estimate.to_sample());
            }
            Err(reason) => {
                debug!("window {} skipped: {:?}", index, reason);
                report.skipped = Some(reason);
            }
        }
        report
    }
}

/// Rolling RPM over `values`/`times` in windows of `window_size` readings.
///
/// Arguments are validated before any work is done. The output has at most
/// `values.len() / window_size` entries.
pub fn estimate_rolling_rpm<V: ToPrimitive>(
    values: &[V],
    times: &[f64],
    window_size: usize,
    min_time_interval: f64,
) -> Result<Vec<RpmSample>, EstimateError> {
    let config = RpmEstimatorConfig::new(window_size, min_time_interval);
    let estimator = RollingRpmEstimator::new(config)?;
    let series = Series::from_numeric(values, times)?;
    Ok(estimator.estimate(&series))
}
