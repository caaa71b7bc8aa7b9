use crate::probe::Probe;
use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOGFILE: &str = "connection.log";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Everything the monitoring loop needs, assembled by the CLI layer.
/// Destinations are parsed before this exists, so a bad address aborts
/// startup instead of a cycle.
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    pub probes: Vec<Probe>,
    pub logfile: PathBuf,
    /// Target spacing between cycle starts.
    pub interval: Duration,
    /// Per-probe connection timeout, also the sentinel latency written when
    /// every probe in a cycle fails.
    pub timeout: Duration,
    /// Suppress the console echo of log lines. File output is unaffected.
    pub quiet: bool,
}

/// What to do with a log line that fails to decode.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MalformedPolicy {
    /// Fail the whole read, matching the strict historical behavior.
    #[default]
    Fail,
    /// Skip the line, count it, and warn.
    Skip,
}

/// One log-reading invocation. `start`/`end` bound inclusion by record
/// timestamp; `data_points` caps the series length for rendering.
#[derive(Clone, Debug)]
pub struct ReaderConfig {
    pub logfile: PathBuf,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub data_points: Option<usize>,
    pub on_malformed: MalformedPolicy,
}

impl ReaderConfig {
    pub fn new(logfile: impl Into<PathBuf>) -> Self {
        Self {
            logfile: logfile.into(),
            start: None,
            end: None,
            data_points: None,
            on_malformed: MalformedPolicy::default(),
        }
    }
}
