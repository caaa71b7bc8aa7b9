use crate::common::round_micros;
use crate::probe::{Probe, ProbeOutcome};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Coarse health of one monitoring cycle, as written to the log.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CycleStatus {
    Ok,
    Degraded,
    Error,
}

impl CycleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CycleStatus::Ok => "OK",
            CycleStatus::Degraded => "DEGRADED",
            CycleStatus::Error => "ERROR",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "OK" => Some(CycleStatus::Ok),
            "DEGRADED" => Some(CycleStatus::Degraded),
            "ERROR" => Some(CycleStatus::Error),
            _ => None,
        }
    }

    /// Numeric code used on the status axis of rendered charts.
    pub fn plot_value(self) -> f64 {
        match self {
            CycleStatus::Ok => 0.0,
            CycleStatus::Degraded => 0.5,
            CycleStatus::Error => 1.0,
        }
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CycleOutcome {
    pub latency: f64,
    pub status: CycleStatus,
}

/// Run every probe once, sequentially and to completion, then fold the
/// outcomes. Probe failures never abort the cycle.
pub fn run_cycle(probes: &[Probe], timeout: Duration) -> CycleOutcome {
    debug!("running {} checks", probes.len());

    let outcomes: Vec<ProbeOutcome> = probes.iter().map(|probe| probe.measure(timeout)).collect();
    let outcome = aggregate(&outcomes, timeout);

    debug!(
        "cycle finished: {} with average latency {}s",
        outcome.status, outcome.latency
    );
    outcome
}

/// Classify a cycle and compute its aggregate latency.
///
/// The average divides by the full probe count, failures included, so a
/// failed probe pulls the mean toward zero instead of being excluded.
/// Historical logs were written with this arithmetic; changing it would
/// shift every existing chart. When every probe fails there is nothing to
/// average and the configured timeout is written as a sentinel.
pub fn aggregate(outcomes: &[ProbeOutcome], timeout: Duration) -> CycleOutcome {
    let total = outcomes.len();
    let failures = outcomes.iter().filter(|o| o.is_failure()).count();
    let measured: f64 = outcomes.iter().filter_map(|o| o.latency()).sum();

    let status = if failures == total {
        CycleStatus::Error
    } else if failures > 0 {
        CycleStatus::Degraded
    } else {
        CycleStatus::Ok
    };

    let latency = if failures == total {
        timeout.as_secs_f64()
    } else {
        round_micros(measured / total as f64)
    };

    CycleOutcome { latency, status }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::Probe;
    use std::net::TcpListener;

    const TIMEOUT: Duration = Duration::from_secs(3);

    #[test]
    fn all_successes_are_ok_and_averaged() {
        let outcomes = [
            ProbeOutcome::Measured(0.01),
            ProbeOutcome::Measured(0.02),
            ProbeOutcome::Measured(0.03),
        ];
        let outcome = aggregate(&outcomes, TIMEOUT);
        assert_eq!(outcome.status, CycleStatus::Ok);
        assert_eq!(outcome.latency, 0.02);
    }

    #[test]
    fn partial_failure_is_degraded_and_dilutes_the_average() {
        let outcomes = [
            ProbeOutcome::Measured(0.01),
            ProbeOutcome::Measured(0.02),
            ProbeOutcome::Failed,
        ];
        let outcome = aggregate(&outcomes, TIMEOUT);
        assert_eq!(outcome.status, CycleStatus::Degraded);
        assert_eq!(outcome.latency, 0.01);
    }

    #[test]
    fn total_failure_is_error_with_timeout_sentinel() {
        let outcomes = [ProbeOutcome::Failed, ProbeOutcome::Failed, ProbeOutcome::Failed];
        let outcome = aggregate(&outcomes, TIMEOUT);
        assert_eq!(outcome.status, CycleStatus::Error);
        assert_eq!(outcome.latency, 3.0);
    }

    #[test]
    fn single_failure_among_many_is_degraded() {
        for total in 2..6 {
            let mut outcomes = vec![ProbeOutcome::Measured(0.001); total - 1];
            outcomes.push(ProbeOutcome::Failed);
            assert_eq!(aggregate(&outcomes, TIMEOUT).status, CycleStatus::Degraded);
        }
    }

    #[test]
    fn average_is_rounded_to_microseconds() {
        let outcomes = [
            ProbeOutcome::Measured(0.1),
            ProbeOutcome::Measured(0.1),
            ProbeOutcome::Measured(0.1),
        ];
        // 0.3 / 3 carries float noise without the rounding step.
        assert_eq!(aggregate(&outcomes, TIMEOUT).latency, 0.1);
    }

    #[test]
    fn status_text_round_trips() {
        for status in [CycleStatus::Ok, CycleStatus::Degraded, CycleStatus::Error] {
            assert_eq!(CycleStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CycleStatus::parse("ok"), None);
        assert_eq!(CycleStatus::parse(""), None);
    }

    #[test]
    fn run_cycle_mixes_live_and_dead_destinations() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let open_port = listener.local_addr().expect("addr").port();
        let closed_port = {
            let probe_listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            probe_listener.local_addr().expect("addr").port()
        };

        let probes = vec![
            Probe::tcp(&format!("127.0.0.1:{open_port}")).expect("probe"),
            Probe::tcp(&format!("127.0.0.1:{closed_port}")).expect("probe"),
        ];

        let outcome = run_cycle(&probes, Duration::from_secs(1));
        assert_eq!(outcome.status, CycleStatus::Degraded);
        assert!(outcome.latency >= 0.0);
    }
}
