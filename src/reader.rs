use crate::codec::{self, CodecError};
use crate::config::{MalformedPolicy, ReaderConfig};
use crate::downsample::reduce;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use thiserror::Error;
use tracing::warn;

/// Time-aligned series decoded from the log, ready for charting. The three
/// vectors always have equal length; statuses are plot codes (OK 0,
/// DEGRADED 0.5, ERROR 1).
#[derive(Clone, Debug, Default, Serialize)]
pub struct TimeSeries {
    /// Epoch seconds, microsecond precision.
    pub timestamps: Vec<f64>,
    /// Aggregate latency per cycle, seconds.
    pub latencies: Vec<f64>,
    pub statuses: Vec<f64>,
    /// Lines seen in the file, including filtered and malformed ones.
    pub lines: usize,
    /// Entries kept after window filtering.
    pub entries: usize,
    /// Malformed lines skipped under `MalformedPolicy::Skip`.
    pub skipped: usize,
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read log: {0}")]
    Io(#[from] io::Error),
    #[error("malformed log line {line}: {source}")]
    Malformed { line: usize, source: CodecError },
}

/// Read the log into parallel series, applying the optional time window and
/// downsampling.
///
/// Records are assumed time-ordered, so the first record past `end` stops
/// the scan; nothing after it is read. Records before `start` are skipped
/// individually.
pub fn read_series(config: &ReaderConfig) -> Result<TimeSeries, ReadError> {
    let file = File::open(&config.logfile)?;
    let start = config.start.map(codec::epoch_seconds);
    let end = config.end.map(codec::epoch_seconds);

    let mut series = TimeSeries::default();

    for line in BufReader::new(file).lines() {
        let line = line?;
        series.lines += 1;

        let record = match codec::decode_line(&line) {
            Ok(record) => record,
            Err(source) => match config.on_malformed {
                MalformedPolicy::Fail => {
                    return Err(ReadError::Malformed {
                        line: series.lines,
                        source,
                    });
                }
                MalformedPolicy::Skip => {
                    warn!("skipping malformed log line {}: {source}", series.lines);
                    series.skipped += 1;
                    continue;
                }
            },
        };

        let timestamp = codec::epoch_seconds(record.timestamp);
        if start.is_some_and(|start| timestamp < start) {
            continue;
        }
        if end.is_some_and(|end| timestamp > end) {
            break;
        }

        series.entries += 1;
        series.timestamps.push(timestamp);
        series.latencies.push(record.latency);
        series.statuses.push(record.status.plot_value());
    }

    if let Some(points) = config.data_points {
        series.timestamps = reduce(&series.timestamps, points);
        series.latencies = reduce(&series.latencies, points);
        series.statuses = reduce(&series.statuses, points);
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LOG: &str = "\
2015-01-10T21:55:36.959123\t0.01\tOK
2015-01-10T21:56:06.959123\t0.02\tDEGRADED
2015-01-10T21:56:36.959123\t3.0\tERROR
2015-01-10T21:57:06.959123\t0.015\tOK
";

    fn write_log(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write");
        file
    }

    fn timestamp(text: &str) -> chrono::NaiveDateTime {
        codec::parse_timestamp(text).expect("timestamp")
    }

    #[test]
    fn reads_all_series_in_file_order() {
        crate::common::time::pin_zone();
        let file = write_log(LOG);
        let series = read_series(&ReaderConfig::new(file.path())).expect("read");

        assert_eq!(series.lines, 4);
        assert_eq!(series.entries, 4);
        assert_eq!(series.skipped, 0);
        assert_eq!(series.latencies, vec![0.01, 0.02, 3.0, 0.015]);
        assert_eq!(series.statuses, vec![0.0, 0.5, 1.0, 0.0]);
        // Absolute epoch values depend on the host zone; the 30-second
        // cycle spacing does not.
        assert!(
            series
                .timestamps
                .windows(2)
                .all(|w| (w[1] - w[0] - 30.0).abs() < 1e-3)
        );
    }

    #[test]
    fn start_bound_skips_earlier_entries() {
        crate::common::time::pin_zone();
        let file = write_log(LOG);
        let mut config = ReaderConfig::new(file.path());
        config.start = Some(timestamp("2015-01-10T21:56:36"));

        let series = read_series(&config).expect("read");
        assert_eq!(series.lines, 4);
        assert_eq!(series.entries, 2);
        assert_eq!(series.latencies, vec![3.0, 0.015]);
    }

    #[test]
    fn end_bound_stops_the_scan_early() {
        crate::common::time::pin_zone();
        let file = write_log(LOG);
        let mut config = ReaderConfig::new(file.path());
        config.end = Some(timestamp("2015-01-10T21:56:10"));

        let series = read_series(&config).expect("read");
        // The scan stops at the first entry past the bound and never reads
        // the final line.
        assert_eq!(series.lines, 3);
        assert_eq!(series.entries, 2);
        assert_eq!(series.latencies, vec![0.01, 0.02]);
    }

    #[test]
    fn entries_exactly_on_the_bounds_are_kept() {
        crate::common::time::pin_zone();
        let file = write_log(LOG);
        let mut config = ReaderConfig::new(file.path());
        config.start = Some(timestamp("2015-01-10T21:55:36.959123"));
        config.end = Some(timestamp("2015-01-10T21:57:06.959123"));

        let series = read_series(&config).expect("read");
        assert_eq!(series.entries, 4);
    }

    #[test]
    fn malformed_line_fails_the_read_by_default() {
        let file = write_log("2015-01-10T21:55:36.959123\t0.01\tOK\ngarbage\n");
        let err = read_series(&ReaderConfig::new(file.path())).expect_err("error");
        assert!(matches!(err, ReadError::Malformed { line: 2, .. }));
    }

    #[test]
    fn malformed_lines_can_be_skipped_and_counted() {
        let file = write_log(
            "garbage\n2015-01-10T21:55:36.959123\t0.01\tOK\n2015-01-10T21:56:06\t0.02\tBROKEN\n",
        );
        let mut config = ReaderConfig::new(file.path());
        config.on_malformed = MalformedPolicy::Skip;

        let series = read_series(&config).expect("read");
        assert_eq!(series.lines, 3);
        assert_eq!(series.entries, 1);
        assert_eq!(series.skipped, 2);
        assert_eq!(series.latencies, vec![0.01]);
    }

    #[test]
    fn downsampling_applies_to_every_series() {
        let file = write_log(LOG);
        let mut config = ReaderConfig::new(file.path());
        config.data_points = Some(2);

        let series = read_series(&config).expect("read");
        assert_eq!(series.timestamps.len(), 2);
        assert_eq!(series.latencies.len(), 2);
        assert_eq!(series.statuses.len(), 2);
        // Counters reflect the file, not the reduced series.
        assert_eq!(series.entries, 4);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let config = ReaderConfig::new("/nonexistent/connpulse.log");
        assert!(matches!(read_series(&config), Err(ReadError::Io(_))));
    }
}
