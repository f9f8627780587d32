//! Wall-clock gated progress reporting.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::identifier::IdValue;

/// Source of timestamps for report lines and the progress timer.
pub trait Clock: Send {
    fn now(&mut self) -> DateTime<Utc>;
}

/// Wall-clock time that never goes backwards.
///
/// The wall time is read once; later readings add the elapsed time of a
/// monotonic timer to it.
#[derive(Debug, Clone)]
pub struct SystemClock {
    anchor_wall: DateTime<Utc>,
    anchor: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            anchor_wall: Utc::now(),
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.anchor.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.anchor_wall + elapsed
    }
}

/// Deterministic clock that advances by a fixed step on every reading.
#[derive(Debug, Clone)]
pub struct SteppingClock {
    next: DateTime<Utc>,
    step: chrono::Duration,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            next: start,
            step: chrono::Duration::from_std(step).unwrap_or_else(|_| chrono::Duration::zero()),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&mut self) -> DateTime<Utc> {
        let now = self.next;
        self.next = now + self.step;
        now
    }
}

/// Merge-join progress at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub at: DateTime<Utc>,
    /// Merge steps completed so far.
    pub steps: u64,
    pub consumed_a: u64,
    pub consumed_b: u64,
    pub current_a: IdValue,
    pub current_b: IdValue,
}

/// True once `interval` has elapsed since `last_report`.
///
/// A clock reading earlier than `last_report` never triggers a report.
pub fn should_report(now: DateTime<Utc>, last_report: DateTime<Utc>, interval: Duration) -> bool {
    match (now - last_report).to_std() {
        Ok(elapsed) => elapsed >= interval,
        Err(_) => false,
    }
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2016-01-19T00:26:56.351Z`.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Render a snapshot as a single report line.
pub fn format_progress(snapshot: &ProgressSnapshot, is_final: bool) -> String {
    format!(
        "{}: {}progress: {}: A ({}): {}, B ({}): {}",
        format_timestamp(&snapshot.at),
        if is_final { "final " } else { "" },
        snapshot.steps,
        snapshot.consumed_a,
        snapshot.current_a,
        snapshot.consumed_b,
        snapshot.current_b
    )
}

/// Owns the clock and the time of the last progress report.
pub struct ProgressReporter {
    clock: Box<dyn Clock>,
    interval: Duration,
    last_report: Option<DateTime<Utc>>,
}

impl ProgressReporter {
    pub fn new(clock: Box<dyn Clock>, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            last_report: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn now(&mut self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Restart the interval timer at the current time.
    pub fn start(&mut self) -> DateTime<Utc> {
        let now = self.clock.now();
        self.last_report = Some(now);
        now
    }

    /// Whether a report is due at `now`. Resets the timer when it is.
    pub fn due(&mut self, now: DateTime<Utc>) -> bool {
        let last = *self.last_report.get_or_insert(now);
        if should_report(now, last, self.interval) {
            self.last_report = Some(now);
            true
        } else {
            false
        }
    }
}
