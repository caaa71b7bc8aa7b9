use connpulse::reader;
use connpulse::runtime;
use connpulse::settings::{AppCommand, ReportSettings, load_from_cli};
use std::io::{self, Write};
use tracing::debug;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let command = load_from_cli()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;

    match command {
        AppCommand::Monitor(config) => runtime::run_monitor(config).map_err(io::Error::other),
        AppCommand::Report(report) => run_report(report),
    }
}

fn run_report(report: ReportSettings) -> io::Result<()> {
    let series = reader::read_series(&report.reader).map_err(io::Error::other)?;
    debug!("read {} entries on {} lines", series.entries, series.lines);

    let json = serde_json::to_string_pretty(&series)?;
    match report.out {
        Some(path) => std::fs::write(path, json)?,
        None => writeln!(io::stdout(), "{json}")?,
    }
    Ok(())
}
