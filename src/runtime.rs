use crate::codec::{self, LogRecord};
use crate::common::time::{Clock, SystemClock, to_local_naive};
use crate::config::MonitorConfig;
use crate::cycle;
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

#[derive(Clone, Copy, Debug)]
pub enum ControlMessage {
    Stop,
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("log file {path}: {source}")]
    Log {
        path: String,
        source: std::io::Error,
    },
}

/// Handle to a monitor running on its own thread. Dropping the sender (or
/// sending `Stop`) ends the loop at the next cycle or sleep boundary.
pub struct MonitorHandle {
    pub sender: crossbeam_channel::Sender<ControlMessage>,
    pub join: Option<JoinHandle<Result<(), MonitorError>>>,
}

impl MonitorHandle {
    /// Signal the loop and wait for it to finish its in-flight cycle.
    pub fn stop(mut self) -> Result<(), MonitorError> {
        let _ = self.sender.send(ControlMessage::Stop);
        match self.join.take().map(JoinHandle::join) {
            Some(Ok(result)) => result,
            _ => Ok(()),
        }
    }
}

pub fn spawn_monitor(config: MonitorConfig) -> MonitorHandle {
    let (tx, rx) = crossbeam_channel::unbounded();
    let join = thread::spawn(move || run_loop(config, rx, &SystemClock));
    MonitorHandle {
        sender: tx,
        join: Some(join),
    }
}

/// Run the monitor on the calling thread until the process is killed.
/// Probe failures are absorbed into the cycle status; log I/O errors are
/// fatal and propagate.
pub fn run_monitor(config: MonitorConfig) -> Result<(), MonitorError> {
    // Keep one sender alive so the loop never sees a disconnect.
    let (_tx, rx) = crossbeam_channel::unbounded();
    run_loop(config, rx, &SystemClock)
}

fn run_loop(
    config: MonitorConfig,
    control_rx: Receiver<ControlMessage>,
    clock: &impl Clock,
) -> Result<(), MonitorError> {
    // Opened once in append mode and held for the life of the loop; the
    // single writer is what makes lockless whole-line appends safe.
    let mut log = open_log(&config.logfile)?;

    info!(
        "starting monitor: {} destinations, {:?} interval, logging to {}",
        config.probes.len(),
        config.interval,
        config.logfile.display()
    );

    loop {
        let started = Instant::now();

        let outcome = cycle::run_cycle(&config.probes, config.timeout);
        let record = LogRecord {
            timestamp: to_local_naive(clock.now()),
            latency: outcome.latency,
            status: outcome.status,
        };
        let line = codec::encode_line(&record);
        append_line(&mut log, &config, &line)?;

        if !config.quiet {
            info!("{}", line.trim_end());
        }

        let wait = config.interval.saturating_sub(started.elapsed());
        if wait.is_zero() {
            // Cycle overran the interval; go straight into the next one,
            // still honoring a pending stop.
            match control_rx.try_recv() {
                Ok(ControlMessage::Stop) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => continue,
            }
        }
        match control_rx.recv_timeout(wait) {
            Ok(ControlMessage::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    info!("monitor stopped");
    Ok(())
}

fn open_log(path: &Path) -> Result<File, MonitorError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| MonitorError::Log {
            path: path.display().to_string(),
            source,
        })
}

fn append_line(log: &mut File, config: &MonitorConfig, line: &str) -> Result<(), MonitorError> {
    log.write_all(line.as_bytes())
        .and_then(|()| log.flush())
        .map_err(|source| MonitorError::Log {
            path: config.logfile.display().to_string(),
            source,
        })
}
