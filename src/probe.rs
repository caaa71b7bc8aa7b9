use crate::common::round_micros;
use std::fmt;
use std::net::{TcpStream, ToSocketAddrs};
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// A `host:port` pair, validated at construction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Destination {
    pub address: String,
    pub port: u16,
}

#[derive(Debug, Error)]
pub enum DestinationError {
    #[error("address {text:?} doesn't look valid (no : found)")]
    NoSeparator { text: String },
    #[error("address {text:?} doesn't look valid (no address specified)")]
    NoAddress { text: String },
    #[error("address {text:?} doesn't look valid (no port specified)")]
    NoPort { text: String },
    #[error("address {text:?} doesn't look valid (port is not a valid number)")]
    BadPort { text: String },
}

impl FromStr for Destination {
    type Err = DestinationError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let Some((address, port)) = text.split_once(':') else {
            return Err(DestinationError::NoSeparator { text: text.into() });
        };
        if address.is_empty() {
            return Err(DestinationError::NoAddress { text: text.into() });
        }
        if port.is_empty() {
            return Err(DestinationError::NoPort { text: text.into() });
        }
        let port = port
            .parse::<u16>()
            .ok()
            .filter(|port| *port != 0)
            .ok_or_else(|| DestinationError::BadPort { text: text.into() })?;

        Ok(Self {
            address: address.to_string(),
            port,
        })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// One measurement attempt: elapsed seconds (microsecond precision) or an
/// undifferentiated failure. Refusals, timeouts, and resolution errors are
/// deliberately not told apart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProbeOutcome {
    Measured(f64),
    Failed,
}

impl ProbeOutcome {
    pub fn latency(&self) -> Option<f64> {
        match self {
            ProbeOutcome::Measured(seconds) => Some(*seconds),
            ProbeOutcome::Failed => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ProbeOutcome::Failed)
    }
}

/// Closed set of probe variants. New probe kinds are added here, not as
/// trait objects.
#[derive(Clone, Debug)]
pub enum Probe {
    Tcp(Destination),
}

impl Probe {
    pub fn tcp(text: &str) -> Result<Self, DestinationError> {
        Ok(Self::Tcp(text.parse()?))
    }

    pub fn destination(&self) -> &Destination {
        match self {
            Probe::Tcp(destination) => destination,
        }
    }

    /// Run one measurement. Blocks for up to `timeout`; never panics and
    /// never aborts the caller's cycle.
    pub fn measure(&self, timeout: Duration) -> ProbeOutcome {
        match self {
            Probe::Tcp(destination) => measure_tcp(destination, timeout),
        }
    }
}

fn measure_tcp(destination: &Destination, timeout: Duration) -> ProbeOutcome {
    debug!("checking connection to {destination}");

    // Resolution is part of the measurement, like a bare connect() would be.
    let started = Instant::now();
    let addr = match (destination.address.as_str(), destination.port).to_socket_addrs() {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => addr,
            None => {
                warn!("no usable address for {destination}");
                return ProbeOutcome::Failed;
            }
        },
        Err(err) => {
            warn!("failed to resolve {destination}: {err}");
            return ProbeOutcome::Failed;
        }
    };

    match TcpStream::connect_timeout(&addr, timeout) {
        Ok(_stream) => {
            let elapsed = round_micros(started.elapsed().as_secs_f64());
            debug!("connection to {destination} established in {elapsed}s");
            ProbeOutcome::Measured(elapsed)
        }
        Err(err) => {
            warn!("connection to {destination} failed: {err}");
            ProbeOutcome::Failed
        }
    }
}
