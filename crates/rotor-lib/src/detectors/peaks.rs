use crate::signal::Events;

/// Strict local maxima: samples greater than both immediate neighbours.
///
/// The first and last samples never qualify, plateaus never qualify, and no
/// smoothing is applied, so callers must pre-condition noisy signals themselves.
pub fn detect_peaks(values: &[f64]) -> Events {
    if values.len() < 3 {
        return Events::default();
    }
    let indices = values
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] > w[0] && w[1] > w[2])
        .map(|(i, _)| i + 1)
        .collect();
    Events::from_indices(indices)
}

/// Drop peaks closer than `min_interval_s` seconds to the last retained peak.
///
/// Greedy left to right: the first peak is always kept, and a rejected peak
/// does not move the reference point. `times` is indexed by the peak indices.
pub fn filter_min_interval(peaks: &Events, times: &[f64], min_interval_s: f64) -> Events {
    let mut kept = Vec::with_capacity(peaks.len());
    let mut last_time: Option<f64> = None;
    for &idx in &peaks.indices {
        let Some(&t) = times.get(idx) else {
            continue;
        };
        if let Some(prev) = last_time {
            if t - prev < min_interval_s {
                continue;
            }
        }
        kept.push(idx);
        last_time = Some(t);
    }
    Events::from_indices(kept)
}

/// Peak detection followed by minimum-interval filtering.
pub fn detect_filtered_peaks(values: &[f64], times: &[f64], min_interval_s: f64) -> Events {
    let peaks = detect_peaks(values);
    filter_min_interval(&peaks, times, min_interval_s)
}
