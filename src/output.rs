//! Output formatting and persistence for history reports.
//!
//! Supports pretty-printing, JSON serialization, CSV export of a chart
//! series (optionally gzip-compressed), and CSV append of summary rows.

use anyhow::Result;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::{debug, info};

use crate::chart::{ChartPoint, HistoryReport};
use crate::stats::TankSummary;
use csv::WriterBuilder;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &HistoryReport) {
    debug!("{:#?}", report);
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Logs the headline numbers of a report, one event per line.
pub fn print_summary(report: &HistoryReport) {
    let stats = &report.statistics;
    info!(
        tank_id = report.tank_id.as_deref().unwrap_or("-"),
        period = %report.period,
        points = report.points.len(),
        grouping = report.grouping,
        "History series"
    );
    info!(
        average = %format!("{:.1}%", stats.average_level),
        range = %format!("{:.1}% - {:.1}%", stats.min_level, stats.max_level),
        trend = report.trend_headline,
        consumption = %format!("{:.0}L", report.displayed_consumption),
        "Statistics"
    );
}

/// Writes a chart series as CSV, replacing `path`. With `gzip` the bytes
/// are gzip-compressed.
pub fn write_series_csv(path: &str, points: &[ChartPoint], gzip: bool) -> Result<()> {
    let csv_bytes = series_csv_bytes(points)?;

    let mut file = File::create(path)?;
    if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&csv_bytes)?;
        file.write_all(&encoder.finish()?)?;
    } else {
        file.write_all(&csv_bytes)?;
    }

    debug!(path, rows = points.len(), gzip, "Series CSV written");
    Ok(())
}

fn series_csv_bytes(points: &[ChartPoint]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());
    for point in points {
        writer.serialize(point)?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV buffer: {}", e.error()))
}

/// Appends a [`TankSummary`] record as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, summary: &TankSummary) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(summary)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::env;
    use std::fs;
    use std::io::Read;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_points() -> Vec<ChartPoint> {
        vec![
            ChartPoint {
                label: "00:50".to_string(),
                full_date: "01/05/2024, 00:50:00".to_string(),
                percentage: 89.0,
                liters: 267.0,
                count: 2,
            },
            ChartPoint {
                label: "01:15".to_string(),
                full_date: "01/05/2024, 01:15:00".to_string(),
                percentage: 85.0,
                liters: 255.0,
                count: 1,
            },
        ]
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&sample_points()).unwrap();
    }

    #[test]
    fn test_series_csv_layout() {
        let path = temp_path("tank_history_test_series.csv");
        let _ = fs::remove_file(&path);

        write_series_csv(&path, &sample_points(), false).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "label,fullDate,percentage,liters,count");
        assert_eq!(lines[1], "00:50,\"01/05/2024, 00:50:00\",89.0,267.0,2");
        assert_eq!(lines.len(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_series_csv_gzip() {
        let path = temp_path("tank_history_test_series.csv.gz");
        let _ = fs::remove_file(&path);

        write_series_csv(&path, &sample_points(), true).unwrap();

        let mut decoded = String::new();
        GzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert!(decoded.starts_with("label,fullDate,percentage,liters,count"));
        assert_eq!(decoded.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_empty_series_writes_nothing_but_succeeds() {
        let path = temp_path("tank_history_test_empty.csv");
        let _ = fs::remove_file(&path);

        write_series_csv(&path, &[], false).unwrap();

        assert!(Path::new(&path).exists());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("tank_history_test_header.csv");
        let _ = fs::remove_file(&path);

        let summary = TankSummary::default();
        append_record(&path, &summary).unwrap();
        append_record(&path, &summary).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        // Header line should appear exactly once
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }
}
