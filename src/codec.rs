use crate::cycle::CycleStatus;
use chrono::{Local, LocalResult, NaiveDateTime};
use thiserror::Error;

/// Written form: ISO-8601 local time with a fixed six-digit fraction.
const ENCODE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
/// Read form: the fraction is optional so logs written by older builds,
/// which omitted it on whole seconds, still decode.
const DECODE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// One cycle's result as stored in the log. Immutable once written; the log
/// is append-only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogRecord {
    pub timestamp: NaiveDateTime,
    pub latency: f64,
    pub status: CycleStatus,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("expected 3 tab-separated fields, found {found}")]
    FieldCount { found: usize },
    #[error("malformed timestamp {text:?}")]
    BadTimestamp { text: String },
    #[error("malformed latency {text:?}")]
    BadLatency { text: String },
    #[error("unknown status {text:?}")]
    UnknownStatus { text: String },
}

/// Encode a record as one log line, newline included.
pub fn encode_line(record: &LogRecord) -> String {
    format!(
        "{}\t{}\t{}\n",
        record.timestamp.format(ENCODE_FORMAT),
        format_latency(record.latency),
        record.status
    )
}

/// Whole-second values keep a trailing `.0` so lines stay byte-identical
/// with the historical writer, which always printed floats with a decimal
/// point.
fn format_latency(latency: f64) -> String {
    if latency.fract() == 0.0 {
        format!("{latency:.1}")
    } else {
        latency.to_string()
    }
}

/// Decode one log line. Field count, timestamp, latency, and status are all
/// validated; the caller decides whether a bad line is fatal.
pub fn decode_line(line: &str) -> Result<LogRecord, CodecError> {
    let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split('\t').collect();
    let (timestamp, latency, status) = match fields[..] {
        [timestamp, latency, status] => (timestamp, latency, status),
        _ => {
            return Err(CodecError::FieldCount {
                found: fields.len(),
            });
        }
    };

    Ok(LogRecord {
        timestamp: parse_timestamp(timestamp)?,
        latency: latency.parse().map_err(|_| CodecError::BadLatency {
            text: latency.into(),
        })?,
        status: CycleStatus::parse(status).ok_or_else(|| CodecError::UnknownStatus {
            text: status.into(),
        })?,
    })
}

pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, CodecError> {
    NaiveDateTime::parse_from_str(text, DECODE_FORMAT)
        .map_err(|_| CodecError::BadTimestamp { text: text.into() })
}

/// Epoch seconds with microsecond precision. Log timestamps are naive local
/// wall time, so they resolve through the host zone, the same reading the
/// writer used when it stamped them. An ambiguous fold time takes the
/// earlier instant; a wall time skipped by a DST jump falls back to the UTC
/// reading.
pub fn epoch_seconds(timestamp: NaiveDateTime) -> f64 {
    let micros = match timestamp.and_local_timezone(Local) {
        LocalResult::Single(instant) | LocalResult::Ambiguous(instant, _) => {
            instant.timestamp_micros()
        }
        LocalResult::None => timestamp.and_utc().timestamp_micros(),
    };
    micros as f64 / 1e6
}
