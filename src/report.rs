//! Periodic summary of what the monitor has been doing.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::info;

/// Counter values for one reporting window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSnapshot {
    /// Ticks that actually probed (grace-suppressed ticks excluded)
    pub checks_performed: u64,
    /// Probe servers visited
    pub servers_checked: u64,
    /// Connection or I/O failures
    pub failed_connections: u64,
    /// Portal detections that started a login
    pub login_attempts: u64,
    /// Logins after which the portal was gone
    pub successful_logins: u64,
    /// Logins after which the portal was still there
    pub failed_logins: u64,
}

impl fmt::Display for ReportSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Checks performed: {}, Servers tested: {}, Failed connections: {}, \
             Login attempts: {}, Successful logins: {}, Failed logins: {}",
            self.checks_performed,
            self.servers_checked,
            self.failed_connections,
            self.login_attempts,
            self.successful_logins,
            self.failed_logins
        )
    }
}

/// Counts checks, logins and failures since the last emitted report.
#[derive(Debug, Clone)]
pub struct ReportAccumulator {
    window_start: DateTime<Utc>,
    interval: Duration,
    counts: ReportSnapshot,
}

impl ReportAccumulator {
    /// Starts an empty window at `now`.
    pub fn new(interval: Duration, now: DateTime<Utc>) -> Self {
        ReportAccumulator {
            window_start: now,
            interval,
            counts: ReportSnapshot::default(),
        }
    }

    /// Start of the current window.
    pub fn window_start(&self) -> DateTime<Utc> {
        self.window_start
    }

    /// Counts so far in the current window.
    pub fn counts(&self) -> ReportSnapshot {
        self.counts
    }

    /// Whether the window has lasted at least one reporting interval.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(self.window_start);
        match elapsed.to_std() {
            Ok(elapsed) => elapsed >= self.interval,
            // Clock went backwards
            Err(_) => false,
        }
    }

    /// Logs the summary line and starts a new window at `now`.
    pub fn emit(&mut self, now: DateTime<Utc>) -> ReportSnapshot {
        let snapshot = self.counts;
        info!("REPORT: {snapshot}");
        self.counts = ReportSnapshot::default();
        self.window_start = now;
        snapshot
    }

    /// A tick that probes.
    pub fn record_check(&mut self) {
        self.counts.checks_performed += 1;
    }

    /// A probe server visited.
    pub fn record_server_checked(&mut self) {
        self.counts.servers_checked += 1;
    }

    /// A connection or I/O failure.
    pub fn record_failed_connection(&mut self) {
        self.counts.failed_connections += 1;
    }

    /// A portal detection.
    pub fn record_login_attempt(&mut self) {
        self.counts.login_attempts += 1;
    }

    /// A login that cleared the portal.
    pub fn record_successful_login(&mut self) {
        self.counts.successful_logins += 1;
    }

    /// A login that did not clear the portal.
    pub fn record_failed_login(&mut self) {
        self.counts.failed_logins += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_counts_start_at_zero() {
        let report = ReportAccumulator::new(Duration::from_secs(3600), at(0));
        assert_eq!(report.counts(), ReportSnapshot::default());
        assert_eq!(report.window_start(), at(0));
    }

    #[test]
    fn test_is_due_after_interval() {
        let report = ReportAccumulator::new(Duration::from_secs(3600), at(0));
        assert!(!report.is_due(at(0)));
        assert!(!report.is_due(at(3599)));
        assert!(report.is_due(at(3600)));
        assert!(report.is_due(at(7200)));
        assert!(!report.is_due(at(-10)));
    }

    #[test]
    fn test_emit_returns_counts_and_resets() {
        let mut report = ReportAccumulator::new(Duration::from_secs(60), at(0));
        report.record_check();
        report.record_server_checked();
        report.record_server_checked();
        report.record_failed_connection();
        report.record_login_attempt();
        report.record_successful_login();
        report.record_login_attempt();
        report.record_failed_login();

        let snapshot = report.emit(at(61));
        assert_eq!(
            snapshot,
            ReportSnapshot {
                checks_performed: 1,
                servers_checked: 2,
                failed_connections: 1,
                login_attempts: 2,
                successful_logins: 1,
                failed_logins: 1,
            }
        );
        assert_eq!(report.counts(), ReportSnapshot::default());
        assert_eq!(report.window_start(), at(61));
        assert!(!report.is_due(at(61)));
    }

    #[test]
    fn test_summary_line_format() {
        let snapshot = ReportSnapshot {
            checks_performed: 120,
            servers_checked: 130,
            failed_connections: 3,
            login_attempts: 2,
            successful_logins: 1,
            failed_logins: 1,
        };
        assert_eq!(
            snapshot.to_string(),
            "Checks performed: 120, Servers tested: 130, Failed connections: 3, \
             Login attempts: 2, Successful logins: 1, Failed logins: 1"
        );
    }
}
