use crate::error::EstimateError;
use chrono::{NaiveTime, Timelike};
use num_traits::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const SECONDS_PER_DAY: u64 = 86_400;

/// A single reading: proximity value observed at `time` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub value: f64,
}

/// Time-stamped sensor readings, sorted ascending by time.
///
/// Both columns always share one length; the constructors enforce it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl Series {
    pub fn new(values: Vec<f64>, times: Vec<f64>) -> Result<Self, EstimateError> {
        if values.len() != times.len() {
            return Err(EstimateError::LengthMismatch {
                values: values.len(),
                times: times.len(),
            });
        }
        Ok(Self { times, values })
    }

    /// Build a series from any numeric value type, converting to `f64` at the boundary.
    pub fn from_numeric<V: ToPrimitive>(
        values: &[V],
        times: &[f64],
    ) -> Result<Self, EstimateError> {
        if values.len() != times.len() {
            return Err(EstimateError::LengthMismatch {
                values: values.len(),
                times: times.len(),
            });
        }
        let values = values
            .iter()
            .enumerate()
            .map(|(index, v)| {
                v.to_f64().ok_or(EstimateError::UnrepresentableValue { index })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            times: times.to_vec(),
            values,
        })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Seconds between the first and last reading.
    pub fn duration(&self) -> f64 {
        match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.times.push(sample.time);
        self.values.push(sample.value);
    }

    /// Append every reading of `other` after the readings of `self`.
    pub fn extend_from(&mut self, other: &Series) {
        self.times.extend_from_slice(&other.times);
        self.values.extend_from_slice(&other.values);
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.times
            .iter()
            .zip(self.values.iter())
            .map(|(&time, &value)| Sample { time, value })
    }
}

impl FromIterator<Sample> for Series {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        let mut series = Series::default();
        for sample in iter {
            series.push(sample);
        }
        series
    }
}

/// Point events on a timeline (peak indices).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Events {
    pub indices: Vec<usize>,
}

impl Events {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Shift every index by `offset`, e.g. to map window-local indices onto the series.
    pub fn offset(&self, offset: usize) -> Self {
        Self {
            indices: self.indices.iter().map(|i| i + offset).collect(),
        }
    }

    /// Timestamps of the events looked up in `times`; out-of-range indices are skipped.
    pub fn times(&self, times: &[f64]) -> Vec<f64> {
        self.indices
            .iter()
            .filter_map(|&i| times.get(i).copied())
            .collect()
    }
}

/// Time of day derived from a raw seconds value.
///
/// Values beyond one day wrap around the 24-hour clock face, so multi-day runs
/// lose their day component. Serialized as `HH:MM:SS.ffffff`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallClock {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub microsecond: u32,
}

impl WallClock {
    /// Convert seconds (since the epoch or since the run started) to a time of day.
    ///
    /// Microseconds are rounded; a rounding carry moves into the next second.
    /// Non-finite input maps to midnight.
    pub fn from_seconds(seconds: f64) -> Self {
        if !seconds.is_finite() {
            return Self::default();
        }
        let whole = seconds.floor();
        let mut micros = ((seconds - whole) * 1e6).round() as u64;
        let mut of_day = whole.rem_euclid(SECONDS_PER_DAY as f64) as u64;
        if micros >= 1_000_000 {
            micros -= 1_000_000;
            of_day = (of_day + 1) % SECONDS_PER_DAY;
        }
        Self {
            hour: (of_day / 3600) as u32,
            minute: ((of_day % 3600) / 60) as u32,
            second: (of_day % 60) as u32,
            microsecond: micros as u32,
        }
    }

    pub fn as_naive_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_micro_opt(self.hour, self.minute, self.second, self.microsecond)
    }

    /// Seconds since midnight.
    pub fn seconds_of_day(&self) -> f64 {
        (self.hour * 3600 + self.minute * 60 + self.second) as f64
            + self.microsecond as f64 / 1e6
    }
}

impl From<NaiveTime> for WallClock {
    fn from(time: NaiveTime) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
            // leap-second representation folds into the last microsecond
            microsecond: (time.nanosecond() / 1_000).min(999_999),
        }
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:06}",
            self.hour, self.minute, self.second, self.microsecond
        )
    }
}

impl FromStr for WallClock {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s, "%H:%M:%S%.f").map(WallClock::from)
    }
}

impl Serialize for WallClock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WallClock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// One rolling RPM estimate: truncated RPM at the mean time of the window's peaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpmSample {
    pub rpm: i64,
    pub timestamp: WallClock,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_rejects_mismatched_lengths() {
        let err = Series::new(vec![1.0, 2.0], vec![0.0]).unwrap_err();
        assert_eq!(
            err,
            EstimateError::LengthMismatch {
                values: 2,
                times: 1
            }
        );
    }

    #[test]
    fn series_converts_integer_values() {
        let series = Series::from_numeric(&[3u8, 7, 255], &[0.0, 0.1, 0.2]).expect("series");
        assert_eq!(series.values(), &[3.0, 7.0, 255.0]);
        assert!((series.duration() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn series_collects_from_samples() {
        let series: Series = [(0.0, 4.0), (0.5, 9.0)]
            .into_iter()
            .map(|(time, value)| Sample { time, value })
            .collect();
        assert_eq!(series.len(), 2);
        let back: Vec<Sample> = series.samples().collect();
        assert_eq!(back[1], Sample { time: 0.5, value: 9.0 });
    }

    #[test]
    fn wall_clock_splits_seconds() {
        let clock = WallClock::from_seconds(2.75);
        assert_eq!(clock.to_string(), "00:00:02.750000");

        let clock = WallClock::from_seconds(3600.0 * 13.0 + 60.0 * 7.0 + 9.5);
        assert_eq!(
            clock,
            WallClock {
                hour: 13,
                minute: 7,
                second: 9,
                microsecond: 500_000
            }
        );
    }

    #[test]
    fn wall_clock_wraps_after_one_day() {
        let clock = WallClock::from_seconds(86_400.0 + 61.25);
        assert_eq!(clock.to_string(), "00:01:01.250000");
        assert!((clock.seconds_of_day() - 61.25).abs() < 1e-9);
    }

    #[test]
    fn wall_clock_carries_rounded_microseconds() {
        let clock = WallClock::from_seconds(59.999_999_9);
        assert_eq!(clock.to_string(), "00:01:00.000000");
        let clock = WallClock::from_seconds(86_399.999_999_9);
        assert_eq!(clock.to_string(), "00:00:00.000000");
    }

    #[test]
    fn wall_clock_matches_chrono() {
        let clock = WallClock::from_seconds(45_296.000_123);
        let naive = clock.as_naive_time().expect("valid time");
        assert_eq!(naive, NaiveTime::from_hms_micro_opt(12, 34, 56, 123).unwrap());
        assert_eq!(WallClock::from(naive), clock);
    }

    #[test]
    fn rpm_sample_serializes_timestamp_as_text() {
        let sample = RpmSample {
            rpm: 40,
            timestamp: WallClock::from_seconds(2.75),
        };
        let js = serde_json::to_string(&sample).unwrap();
        assert_eq!(js, r#"{"rpm":40,"timestamp":"00:00:02.750000"}"#);
        let back: RpmSample = serde_json::from_str(&js).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn events_lookup_times() {
        let events = Events::from_indices(vec![1, 3, 9]);
        assert_eq!(events.times(&[0.0, 0.5, 1.0, 1.5]), vec![0.5, 1.5]);
        assert_eq!(events.offset(10).indices, vec![11, 13, 19]);
    }
}
