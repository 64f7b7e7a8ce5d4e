use crate::signal::{Sample, Series};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use log::info;
use std::path::{Path, PathBuf};

/// Timestamp layouts written by the sensor recorder (`%D %T`, UTC).
const RECORDER_FORMATS: [&str; 2] = ["%m/%d/%y %H:%M:%S%.f", "%m/%d/%y %H:%M:%S"];

/// Parse a recorder timestamp: float seconds, or `MM/DD/YY HH:MM:SS` in UTC.
pub fn parse_timestamp(text: &str) -> Result<f64> {
    let text = text.trim();
    if let Ok(seconds) = text.parse::<f64>() {
        return Ok(seconds);
    }
    for format in RECORDER_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt.and_utc().timestamp_micros() as f64 / 1e6);
        }
    }
    anyhow::bail!("unrecognised timestamp: {}", text)
}

/// Parse `value;timestamp` lines, ignoring blank/comment lines.
pub fn parse_series(text: &str) -> Result<Series> {
    let mut series = Series::default();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (value, timestamp) = trimmed
            .split_once(';')
            .with_context(|| format!("line {} is not value;timestamp: {}", idx + 1, trimmed))?;
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("line {} value is not numeric: {}", idx + 1, value))?;
        let time = parse_timestamp(timestamp).with_context(|| format!("line {}", idx + 1))?;
        series.push(Sample { time, value });
    }
    if series.is_empty() {
        anyhow::bail!("no samples found");
    }
    Ok(series)
}

/// Read a `value;timestamp` recording from disk.
pub fn read_series(path: &Path) -> Result<Series> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_series(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Read every `.txt` recording in `dir`, sorted by file name.
///
/// Each file stays a separate series so estimation windows never straddle two recordings.
pub fn read_directory(dir: &Path) -> Result<Vec<(PathBuf, Series)>> {
    let mut paths = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?
    {
        let path = entry?.path();
        let is_txt = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);
        if path.is_file() && is_txt {
            paths.push(path);
        }
    }
    paths.sort();
    if paths.is_empty() {
        anyhow::bail!("no .txt recordings in {}", dir.display());
    }
    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        info!("Processing file: {}", path.display());
        let series = read_series(&path)?;
        out.push((path, series));
    }
    Ok(out)
}

/// Fail on the first reading whose timestamp goes backwards.
pub fn ensure_sorted(series: &Series) -> Result<()> {
    for (idx, pair) in series.times().windows(2).enumerate() {
        if pair[1] < pair[0] {
            anyhow::bail!(
                "timestamps out of order at sample {}: {} < {}",
                idx + 1,
                pair[1],
                pair[0]
            );
        }
    }
    Ok(())
}
