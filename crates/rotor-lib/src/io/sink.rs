use crate::signal::RpmSample;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// `rpm,timestamp` with a header row.
    Csv,
}

/// Write any serializable records as JSON lines.
pub fn write_json_lines<W: Write, T: Serialize>(mut writer: W, records: &[T]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_samples<W: Write>(
    writer: W,
    samples: &[RpmSample],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => write_json_lines(writer, samples),
        OutputFormat::Csv => {
            let mut csv = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(writer);
            csv.write_record(["rpm", "timestamp"])?;
            for sample in samples {
                csv.serialize(sample)?;
            }
            csv.flush()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::WallClock;

    fn samples() -> Vec<RpmSample> {
        vec![
            RpmSample {
                rpm: 40,
                timestamp: WallClock::from_seconds(2.75),
            },
            RpmSample {
                rpm: 1200,
                timestamp: WallClock::from_seconds(3_661.5),
            },
        ]
    }

    #[test]
    fn writes_json_lines() {
        let mut buf = Vec::new();
        write_samples(&mut buf, &samples(), OutputFormat::Json).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"rpm":40,"timestamp":"00:00:02.750000"}"#);
    }

    #[test]
    fn writes_csv_with_header() {
        let mut buf = Vec::new();
        write_samples(&mut buf, &samples(), OutputFormat::Csv).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "rpm,timestamp\n40,00:00:02.750000\n1200,01:01:01.500000\n"
        );
    }

    #[test]
    fn csv_header_is_written_for_empty_output() {
        let mut buf = Vec::new();
        write_samples(&mut buf, &[], OutputFormat::Csv).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "rpm,timestamp\n");
    }
}
