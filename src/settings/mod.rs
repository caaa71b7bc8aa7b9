use crate::codec;
use crate::config::{
    DEFAULT_INTERVAL, DEFAULT_LOGFILE, DEFAULT_TIMEOUT, MalformedPolicy, MonitorConfig,
    ReaderConfig,
};
use crate::probe::{DestinationError, Probe};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "connpulse")]
#[command(about = "TCP connection quality monitor", long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Probe destinations on an interval and append results to the log
    Monitor {
        /// TCP address to monitor, e.g. google.com:80 (repeatable; use
        /// several for best results)
        #[arg(long = "tcp", value_name = "HOST:PORT", required = true)]
        tcp: Vec<String>,

        /// Where to store the connection quality data
        #[arg(long, default_value = DEFAULT_LOGFILE)]
        logfile: PathBuf,

        /// Seconds between checks
        #[arg(long, default_value_t = DEFAULT_INTERVAL.as_secs_f64())]
        interval: f64,

        /// Seconds to wait for a connection
        #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs_f64())]
        timeout: f64,

        /// Do not echo log lines to the console
        #[arg(long)]
        quiet: bool,
    },
    /// Read the log back as JSON series for rendering
    Report {
        /// Where the connection quality data is stored
        #[arg(long, default_value = DEFAULT_LOGFILE)]
        logfile: PathBuf,

        /// Only include entries starting from this timestamp
        #[arg(long, value_name = "ISO-8601")]
        start: Option<String>,

        /// Only include entries until this timestamp
        #[arg(long, value_name = "ISO-8601")]
        end: Option<String>,

        /// Limit the number of data points in the output
        #[arg(long)]
        datapoints: Option<usize>,

        /// Skip and count malformed log lines instead of failing
        #[arg(long)]
        skip_malformed: bool,

        /// Write the JSON series here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    InvalidDestination(#[from] DestinationError),
    #[error("interval must be greater than zero (got {value})")]
    InvalidInterval { value: f64 },
    #[error("timeout must be greater than zero (got {value})")]
    InvalidTimeout { value: f64 },
    #[error("invalid timestamp {text:?} (expected e.g. 2015-01-10T21:55:36)")]
    InvalidTimestamp { text: String },
    #[error("datapoints must be greater than zero")]
    InvalidDataPoints,
}

/// What the binary was asked to do, with all inputs validated.
#[derive(Debug)]
pub enum AppCommand {
    Monitor(MonitorConfig),
    Report(ReportSettings),
}

#[derive(Debug)]
pub struct ReportSettings {
    pub reader: ReaderConfig,
    pub out: Option<PathBuf>,
}

pub fn load_from_cli() -> Result<AppCommand, SettingsError> {
    from_args(CliArgs::parse())
}

pub fn from_args(args: CliArgs) -> Result<AppCommand, SettingsError> {
    match args.command {
        CliCommand::Monitor {
            tcp,
            logfile,
            interval,
            timeout,
            quiet,
        } => {
            if !interval.is_finite() || interval <= 0.0 {
                return Err(SettingsError::InvalidInterval { value: interval });
            }
            if !timeout.is_finite() || timeout <= 0.0 {
                return Err(SettingsError::InvalidTimeout { value: timeout });
            }

            let probes = tcp
                .iter()
                .map(|text| Probe::tcp(text))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(AppCommand::Monitor(MonitorConfig {
                probes,
                logfile,
                interval: std::time::Duration::from_secs_f64(interval),
                timeout: std::time::Duration::from_secs_f64(timeout),
                quiet,
            }))
        }
        CliCommand::Report {
            logfile,
            start,
            end,
            datapoints,
            skip_malformed,
            out,
        } => {
            if datapoints == Some(0) {
                return Err(SettingsError::InvalidDataPoints);
            }

            Ok(AppCommand::Report(ReportSettings {
                reader: ReaderConfig {
                    logfile,
                    start: start.as_deref().map(parse_bound).transpose()?,
                    end: end.as_deref().map(parse_bound).transpose()?,
                    data_points: datapoints,
                    on_malformed: if skip_malformed {
                        MalformedPolicy::Skip
                    } else {
                        MalformedPolicy::Fail
                    },
                },
                out,
            }))
        }
    }
}

fn parse_bound(text: &str) -> Result<NaiveDateTime, SettingsError> {
    codec::parse_timestamp(text).map_err(|_| SettingsError::InvalidTimestamp { text: text.into() })
}
