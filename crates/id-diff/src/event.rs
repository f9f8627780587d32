//! Report events emitted during a diff run.
//!
//! Every line the engine reports is one [`DiffEvent`]. Its `Display`
//! implementation renders the line, prefixed with the event timestamp.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::DiffError;
use crate::identifier::IdValue;
use crate::merge::Side;
use crate::progress::{format_progress, format_timestamp, ProgressSnapshot};
use crate::range::IdRange;
use crate::report::DiffSummary;

#[derive(Debug, Clone, PartialEq)]
pub enum DiffEvent {
    /// Name of the collection being compared.
    Collection { at: DateTime<Utc>, name: String },
    /// Description of the endpoint behind one side.
    Source {
        at: DateTime<Utc>,
        side: Side,
        description: String,
    },
    Count {
        at: DateTime<Utc>,
        side: Side,
        count: u64,
    },
    Range {
        at: DateTime<Utc>,
        side: Side,
        range: IdRange,
    },
    ProgressInterval { at: DateTime<Utc>, interval: Duration },
    /// An identifier present on one side only.
    OnlyIn {
        at: DateTime<Utc>,
        side: Side,
        id: IdValue,
    },
    /// An identifier present on both sides. Only emitted on request.
    Matched { at: DateTime<Utc>, id: IdValue },
    Progress(ProgressSnapshot),
    FinalProgress(ProgressSnapshot),
    Complete {
        at: DateTime<Utc>,
        summary: DiffSummary,
    },
    Incomplete { at: DateTime<Utc>, error: DiffError },
}

impl DiffEvent {
    /// The classified identifier, for `OnlyIn` events.
    pub fn only_in(&self) -> Option<(Side, &IdValue)> {
        match self {
            DiffEvent::OnlyIn { side, id, .. } => Some((*side, id)),
            _ => None,
        }
    }

    pub fn is_progress(&self) -> bool {
        matches!(self, DiffEvent::Progress(_))
    }
}

impl fmt::Display for DiffEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffEvent::Collection { at, name } => {
                write!(f, "{}: collection: {name}", format_timestamp(at))
            }
            DiffEvent::Source {
                at,
                side,
                description,
            } => write!(f, "{}: {side}: {description}", format_timestamp(at)),
            DiffEvent::Count { at, side, count } => {
                write!(f, "{}: id count: {side}: {count}", format_timestamp(at))
            }
            DiffEvent::Range { at, side, range } => {
                write!(f, "{}: id range: {side}: {range}", format_timestamp(at))
            }
            DiffEvent::ProgressInterval { at, interval } => write!(
                f,
                "{}: progress will be output every {} secs",
                format_timestamp(at),
                interval.as_secs_f64()
            ),
            DiffEvent::OnlyIn { at, side, id } => {
                write!(f, "{}: only {side}: {id}", format_timestamp(at))
            }
            DiffEvent::Matched { at, id } => write!(f, "{}: both: {id}", format_timestamp(at)),
            DiffEvent::Progress(snapshot) => f.write_str(&format_progress(snapshot, false)),
            DiffEvent::FinalProgress(snapshot) => f.write_str(&format_progress(snapshot, true)),
            DiffEvent::Complete { at, summary } => write!(
                f,
                "{}: diff complete: {} compared, {} only in A, {} only in B, {} in both",
                format_timestamp(at),
                summary.total_compared,
                summary.only_in_a,
                summary.only_in_b,
                summary.matched
            ),
            DiffEvent::Incomplete { at, error } => write!(
                f,
                "{}: diff incomplete due to error: {error}",
                format_timestamp(at)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_lines() {
        let at = Utc.with_ymd_and_hms(2015, 2, 12, 0, 1, 45).unwrap();

        let only = DiffEvent::OnlyIn {
            at,
            side: Side::B,
            id: IdValue::from("b"),
        };
        assert_eq!(only.to_string(), "2015-02-12T00:01:45.000Z: only B: \"b\"");
        assert_eq!(only.only_in(), Some((Side::B, &IdValue::from("b"))));

        let interval = DiffEvent::ProgressInterval {
            at,
            interval: Duration::from_secs(5),
        };
        assert_eq!(
            interval.to_string(),
            "2015-02-12T00:01:45.000Z: progress will be output every 5 secs"
        );

        let incomplete = DiffEvent::Incomplete {
            at,
            error: DiffError::Cancelled { steps: 4 },
        };
        assert_eq!(
            incomplete.to_string(),
            "2015-02-12T00:01:45.000Z: diff incomplete due to error: cancelled after 4 steps"
        );
    }
}
