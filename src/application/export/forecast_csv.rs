//! Delimited-text export of a forecast: one row per point, header included.

use crate::domain::forecast::{Forecast, ForecastPoint};
use anyhow::{Context, Result};
use chrono::SecondsFormat;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const FORECAST_CSV_HEADER: [&str; 4] = ["timestamp", "predicted", "lower", "upper"];

#[derive(Debug, Serialize)]
struct ForecastRow {
    timestamp: String,
    predicted: f64,
    lower: f64,
    upper: f64,
}

impl From<&ForecastPoint> for ForecastRow {
    fn from(p: &ForecastPoint) -> Self {
        Self {
            timestamp: p.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            predicted: p.predicted,
            lower: p.lower,
            upper: p.upper,
        }
    }
}

/// Writes the history tail followed by the future points.
pub fn write_forecast<W: Write>(forecast: &Forecast, writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(FORECAST_CSV_HEADER)
        .context("Failed to write forecast CSV header")?;
    for point in forecast.points() {
        wtr.serialize(ForecastRow::from(point))
            .context("Failed to serialize forecast row")?;
    }
    wtr.flush().context("Failed to flush forecast CSV writer")?;
    Ok(())
}

pub fn forecast_to_csv_string(forecast: &Forecast) -> Result<String> {
    let mut buffer = Vec::new();
    write_forecast(forecast, &mut buffer)?;
    String::from_utf8(buffer).context("Forecast CSV is not valid UTF-8")
}

/// Writes `<dir>/<SYMBOL>_forecast.csv`, replacing any previous export.
pub fn export_forecast(forecast: &Forecast, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {:?}", dir))?;

    let path = dir.join(format!("{}_forecast.csv", forecast.symbol));
    let file =
        File::create(&path).with_context(|| format!("Failed to create export file {:?}", path))?;
    write_forecast(forecast, file)?;

    info!(
        "Exported {} forecast rows for {} to {:?}",
        forecast.points().count(),
        forecast.symbol,
        path
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn point(day: u32, predicted: f64, half: f64) -> ForecastPoint {
        ForecastPoint {
            timestamp: Utc.with_ymd_and_hms(2024, 2, day, 0, 0, 0).unwrap(),
            predicted,
            lower: predicted - half,
            upper: predicted + half,
        }
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_point() {
        let forecast = Forecast::new(
            "BTCUSDT",
            vec![point(1, 100.0, 1.0)],
            vec![point(2, 101.5, 2.0), point(3, 102.0, 2.5)],
        );

        let csv = forecast_to_csv_string(&forecast).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "timestamp,predicted,lower,upper");
        assert_eq!(lines[1], "2024-02-01T00:00:00Z,100.0,99.0,101.0");
        assert_eq!(lines[3], "2024-02-03T00:00:00Z,102.0,99.5,104.5");
    }

    #[test]
    fn test_export_writes_named_file() {
        let dir = std::env::temp_dir().join(format!("candlecast-export-{}", std::process::id()));
        let forecast = Forecast::new("ETHUSDT", Vec::new(), vec![point(5, 3000.0, 10.0)]);

        let path = export_forecast(&forecast, &dir).unwrap();
        assert!(path.ends_with("ETHUSDT_forecast.csv"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("timestamp,predicted,lower,upper"));
        assert_eq!(content.lines().count(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }
}
