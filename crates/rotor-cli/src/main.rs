use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use rotor_lib::{
    detectors::peaks::{detect_peaks, filter_min_interval},
    io::{
        sink::{write_json_lines, write_samples, OutputFormat},
        text as text_io,
    },
    metrics::{
        rpm::{RollingRpmEstimator, RpmEstimatorConfig},
        summary::rpm_summary,
    },
    signal::{RpmSample, Series},
};
use serde::{Deserialize, Serialize};
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "rotor",
    version,
    about = "Rolling RPM estimation from proximity-sensor recordings"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Format {
    #[value(name = "json")]
    Json,
    #[value(name = "csv")]
    Csv,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputFormat::Json,
            Format::Csv => OutputFormat::Csv,
        }
    }
}

/// Estimator parameters shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct EstimatorArgs {
    /// `value;timestamp` recording, or a directory of `.txt` recordings (stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,
    /// TOML file with window_size / min_time_interval_s / max_rpm
    #[arg(long)]
    config: Option<PathBuf>,
    /// Readings per window
    #[arg(long)]
    window_size: Option<usize>,
    /// Minimum seconds between retained peaks
    #[arg(long, conflicts_with = "max_rpm")]
    min_interval_s: Option<f64>,
    /// Fastest plausible speed; sets the minimum interval to 60 / max_rpm
    #[arg(long)]
    max_rpm: Option<f64>,
    /// Reject recordings whose timestamps go backwards
    #[arg(long)]
    require_sorted: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rolling RPM estimate, one line per window with enough peaks
    RollingRpm {
        #[command(flatten)]
        args: EstimatorArgs,
        #[arg(long, default_value = "json")]
        format: Format,
    },
    /// Per-window diagnostics: peaks, retained peaks, period and skip reason
    Windows {
        #[command(flatten)]
        args: EstimatorArgs,
    },
    /// Detected and retained peaks over each whole recording
    Peaks {
        #[command(flatten)]
        args: EstimatorArgs,
    },
    /// Summary statistics of the rolling RPM output
    Summary {
        #[command(flatten)]
        args: EstimatorArgs,
    },
}

/// Optional settings file; any key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    window_size: Option<usize>,
    min_time_interval_s: Option<f64>,
    max_rpm: Option<f64>,
}

#[derive(Serialize)]
struct PeaksOutput<'a> {
    source: &'a str,
    peaks: Vec<usize>,
    filtered_peaks: Vec<usize>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::RollingRpm { args, format } => cmd_rolling_rpm(&args, format)?,
        Commands::Windows { args } => cmd_windows(&args)?,
        Commands::Peaks { args } => cmd_peaks(&args)?,
        Commands::Summary { args } => cmd_summary(&args)?,
    }
    Ok(())
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Defaults, then the config file, then explicit flags.
fn resolve_config(args: &EstimatorArgs) -> Result<RpmEstimatorConfig> {
    let file = match &args.config {
        Some(path) => read_file_config(path)?,
        None => FileConfig::default(),
    };
    let mut cfg = RpmEstimatorConfig::default();
    if let Some(window_size) = file.window_size {
        cfg.window_size = window_size;
    }
    if let Some(min_interval) = file.min_time_interval_s {
        cfg.min_time_interval_s = min_interval;
    } else if let Some(max_rpm) = file.max_rpm {
        cfg = RpmEstimatorConfig::from_max_rpm(cfg.window_size, max_rpm)?;
    }
    if let Some(window_size) = args.window_size {
        cfg.window_size = window_size;
    }
    if let Some(min_interval) = args.min_interval_s {
        cfg.min_time_interval_s = min_interval;
    } else if let Some(max_rpm) = args.max_rpm {
        cfg = RpmEstimatorConfig::from_max_rpm(cfg.window_size, max_rpm)?;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn load_inputs(input: Option<&Path>) -> Result<Vec<(String, Series)>> {
    match input {
        Some(path) if path.is_dir() => Ok(text_io::read_directory(path)?
            .into_iter()
            .map(|(path, series)| (path.display().to_string(), series))
            .collect()),
        Some(path) => Ok(vec![(
            path.display().to_string(),
            text_io::read_series(path)?,
        )]),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(vec![("-".to_string(), text_io::parse_series(&buf)?)])
        }
    }
}

fn prepare(args: &EstimatorArgs) -> Result<(RollingRpmEstimator, Vec<(String, Series)>)> {
    let cfg = resolve_config(args)?;
    let estimator = RollingRpmEstimator::new(cfg)?;
    let inputs = load_inputs(args.input.as_deref())?;
    if args.require_sorted {
        for (source, series) in &inputs {
            text_io::ensure_sorted(series).with_context(|| source.clone())?;
        }
    }
    info!(
        "window_size={} min_time_interval_s={} recordings={}",
        cfg.window_size,
        cfg.min_time_interval_s,
        inputs.len()
    );
    Ok((estimator, inputs))
}

fn rolling_samples(
    estimator: &RollingRpmEstimator,
    inputs: &[(String, Series)],
) -> Vec<RpmSample> {
    let mut samples = Vec::new();
    for (source, series) in inputs {
        let out = estimator.estimate(series);
        info!(
            "{}: {} readings -> {} rpm samples",
            source,
            series.len(),
            out.len()
        );
        samples.extend(out);
    }
    samples
}

fn cmd_rolling_rpm(args: &EstimatorArgs, format: Format) -> Result<()> {
    let (estimator, inputs) = prepare(args)?;
    let samples = rolling_samples(&estimator, &inputs);
    write_samples(io::stdout().lock(), &samples, format.into())
}

fn cmd_windows(args: &EstimatorArgs) -> Result<()> {
    let (estimator, inputs) = prepare(args)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (_, series) in &inputs {
        write_json_lines(&mut out, &estimator.estimate_windows(series))?;
    }
    Ok(())
}

fn cmd_peaks(args: &EstimatorArgs) -> Result<()> {
    let (estimator, inputs) = prepare(args)?;
    let min_interval = estimator.config().min_time_interval_s;
    let mut rows = Vec::with_capacity(inputs.len());
    for (source, series) in &inputs {
        let peaks = detect_peaks(series.values());
        let filtered = filter_min_interval(&peaks, series.times(), min_interval);
        rows.push(PeaksOutput {
            source,
            peaks: peaks.indices,
            filtered_peaks: filtered.indices,
        });
    }
    write_json_lines(io::stdout().lock(), &rows)
}

fn cmd_summary(args: &EstimatorArgs) -> Result<()> {
    let (estimator, inputs) = prepare(args)?;
    let samples = rolling_samples(&estimator, &inputs);
    let summary = rpm_summary(&samples);
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
