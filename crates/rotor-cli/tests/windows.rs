use assert_cmd::cargo::cargo_bin_cmd;
use rotor_lib::metrics::{
    rpm::{SkipReason, WindowReport},
    summary::RpmSummary,
};
use serde::Deserialize;
use std::{error::Error, path::PathBuf};

fn sample_path(relative: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join(relative)
        .to_string_lossy()
        .to_string()
}

#[derive(Deserialize)]
struct PeaksOutput {
    peaks: Vec<usize>,
    filtered_peaks: Vec<usize>,
}

#[test]
fn windows_report_skipped_windows() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("rotor");
    cmd.args([
        "windows",
        "--input",
        &sample_path("test_data/single_window.txt"),
        "--window-size",
        "5",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output)?;
    let reports: Vec<WindowReport> = text
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    // 12 readings in windows of 5: two windows, two readings dropped
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].peaks, vec![1]);
    assert_eq!(reports[0].skipped, Some(SkipReason::TooFewPeaks { found: 1 }));
    assert_eq!(reports[1].start, 5);
    assert_eq!(reports[1].peaks, vec![7]);
    assert!(reports.iter().all(|r| r.sample.is_none()));
    Ok(())
}

#[test]
fn peaks_use_min_interval() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("rotor");
    cmd.args([
        "peaks",
        "--input",
        &sample_path("test_data/single_window.txt"),
        "--min-interval-s",
        "2.0",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let peaks: PeaksOutput = serde_json::from_slice(&output)?;
    assert_eq!(peaks.peaks, vec![1, 4, 7, 10]);
    assert_eq!(peaks.filtered_peaks, vec![1, 7]);
    Ok(())
}

#[test]
fn summary_reads_config_file() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("rotor");
    cmd.args([
        "summary",
        "--input",
        &sample_path("test_data/single_window.txt"),
        "--config",
        &sample_path("test_data/rotor_config.toml"),
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let summary: RpmSummary = serde_json::from_slice(&output)?;
    assert_eq!(summary.n, 1);
    assert_eq!(summary.mean, 40.0);
    Ok(())
}

#[test]
fn flags_override_config_file() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("rotor");
    cmd.args([
        "summary",
        "--input",
        &sample_path("test_data/single_window.txt"),
        "--config",
        &sample_path("test_data/rotor_config.toml"),
        "--window-size",
        "6",
    ]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let summary: RpmSummary = serde_json::from_slice(&output)?;
    // windows of 6 hold two peaks each, 1.5 s apart
    assert_eq!(summary.n, 2);
    assert_eq!(summary.min, 40.0);
    assert_eq!(summary.max, 40.0);
    Ok(())
}
