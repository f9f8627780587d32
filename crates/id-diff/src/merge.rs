//! Merge-join over two ascending identifier cursors.
//!
//! Each side keeps an explicit [`SideState`]. A step computes the
//! [`Verdict`] of the two states, classifies one identifier (or one matching
//! pair) and advances the side or sides the verdict names. A side whose
//! cursor runs dry is marked exhausted but keeps its last identifier, so the
//! remaining identifiers of the other side are classified by the same verdict
//! function, including the last unequal pair.

use std::cmp::Ordering;
use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{ComparisonTypeError, DiffError, EmptySides};
use crate::event::DiffEvent;
use crate::identifier::IdValue;
use crate::progress::{ProgressReporter, ProgressSnapshot};
use crate::sink::DiffSink;
use crate::source::IdCursor;

/// One of the two compared sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    A,
    B,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

/// Merge state of one side.
#[derive(Debug, Clone, PartialEq)]
pub struct SideState {
    /// Last identifier read. Kept after exhaustion for reporting.
    pub current: IdValue,
    /// Identifiers read from the cursor so far.
    pub consumed: u64,
    /// `current` has been classified and the cursor has nothing left.
    pub exhausted: bool,
}

impl SideState {
    pub fn new(first: IdValue) -> Self {
        Self {
            current: first,
            consumed: 1,
            exhausted: false,
        }
    }
}

/// Outcome of comparing the two side states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Less,
    Equal,
    Greater,
    AExhausted,
    BExhausted,
    BothExhausted,
}

/// How one step classifies the identifier under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    OnlyIn(Side),
    Both,
}

/// What a single merge step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub classification: Classification,
    pub advance_a: bool,
    pub advance_b: bool,
}

impl Verdict {
    pub fn between(a: &SideState, b: &SideState) -> Result<Self, ComparisonTypeError> {
        let verdict = match (a.exhausted, b.exhausted) {
            (true, true) => Verdict::BothExhausted,
            (true, false) => Verdict::AExhausted,
            (false, true) => Verdict::BExhausted,
            (false, false) => match a.current.try_cmp(&b.current)? {
                Ordering::Less => Verdict::Less,
                Ordering::Equal => Verdict::Equal,
                Ordering::Greater => Verdict::Greater,
            },
        };
        Ok(verdict)
    }

    /// The step this verdict calls for, or `None` when the merge is done.
    pub fn step(self) -> Option<Step> {
        let step = match self {
            Verdict::Less | Verdict::BExhausted => Step {
                classification: Classification::OnlyIn(Side::A),
                advance_a: true,
                advance_b: false,
            },
            Verdict::Greater | Verdict::AExhausted => Step {
                classification: Classification::OnlyIn(Side::B),
                advance_a: false,
                advance_b: true,
            },
            Verdict::Equal => Step {
                classification: Classification::Both,
                advance_a: true,
                advance_b: true,
            },
            Verdict::BothExhausted => return None,
        };
        Some(step)
    }
}

/// Counters of a finished merge-join.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub steps: u64,
    pub only_in_a: u64,
    pub only_in_b: u64,
    pub matched: u64,
    pub consumed_a: u64,
    pub consumed_b: u64,
}

/// Walk both cursors to the end, emitting one event per identifier found on
/// one side only (and per match when `emit_matches` is set).
///
/// Emits periodic progress snapshots through `reporter` and a final snapshot
/// once both sides are exhausted. Fails with [`DiffError::EmptySource`] if
/// either cursor is empty, and checks `cancel` between steps and while
/// waiting for a read.
pub async fn merge_join(
    mut cursor_a: Box<dyn IdCursor>,
    mut cursor_b: Box<dyn IdCursor>,
    reporter: &mut ProgressReporter,
    sink: &mut dyn DiffSink,
    emit_matches: bool,
    cancel: &CancellationToken,
) -> Result<MergeStats, DiffError> {
    let first_a = read_next(&mut cursor_a, Side::A, 0, cancel).await?;
    let first_b = read_next(&mut cursor_b, Side::B, 0, cancel).await?;
    let (first_a, first_b) = EmptySides::pair(first_a, first_b).map_err(DiffError::EmptySource)?;
    let mut a = SideState::new(first_a);
    let mut b = SideState::new(first_b);

    let mut stats = MergeStats::default();
    reporter.start();

    loop {
        if cancel.is_cancelled() {
            return Err(DiffError::Cancelled { steps: stats.steps });
        }

        let verdict = Verdict::between(&a, &b).map_err(|mismatch| DiffError::ComparisonType {
            steps: stats.steps,
            mismatch,
        })?;
        let Some(step) = verdict.step() else {
            break;
        };

        let now = reporter.now();
        stats.steps += 1;
        trace!("step {}: {:?} {} / {}", stats.steps, verdict, a.current, b.current);

        match step.classification {
            Classification::OnlyIn(Side::A) => {
                stats.only_in_a += 1;
                sink.emit(&DiffEvent::OnlyIn {
                    at: now,
                    side: Side::A,
                    id: a.current.clone(),
                });
            }
            Classification::OnlyIn(Side::B) => {
                stats.only_in_b += 1;
                sink.emit(&DiffEvent::OnlyIn {
                    at: now,
                    side: Side::B,
                    id: b.current.clone(),
                });
            }
            Classification::Both => {
                stats.matched += 1;
                if emit_matches {
                    sink.emit(&DiffEvent::Matched {
                        at: now,
                        id: a.current.clone(),
                    });
                }
            }
        }

        if step.advance_a {
            advance(&mut a, &mut cursor_a, Side::A, stats.steps, cancel).await?;
        }
        if step.advance_b {
            advance(&mut b, &mut cursor_b, Side::B, stats.steps, cancel).await?;
        }

        if reporter.due(now) {
            sink.emit(&DiffEvent::Progress(snapshot(now, stats.steps, &a, &b)));
        }
    }

    stats.consumed_a = a.consumed;
    stats.consumed_b = b.consumed;

    let now = reporter.now();
    sink.emit(&DiffEvent::FinalProgress(snapshot(now, stats.steps, &a, &b)));

    debug!(
        "Merge-join finished after {} steps: {} only in A, {} only in B, {} matched",
        stats.steps, stats.only_in_a, stats.only_in_b, stats.matched
    );
    Ok(stats)
}

fn snapshot(at: DateTime<Utc>, steps: u64, a: &SideState, b: &SideState) -> ProgressSnapshot {
    ProgressSnapshot {
        at,
        steps,
        consumed_a: a.consumed,
        consumed_b: b.consumed,
        current_a: a.current.clone(),
        current_b: b.current.clone(),
    }
}

/// Await `fut` unless `cancel` fires first.
pub(crate) async fn or_cancelled<T>(
    cancel: &CancellationToken,
    steps: u64,
    fut: impl Future<Output = Result<T, DiffError>>,
) -> Result<T, DiffError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DiffError::Cancelled { steps }),
        result = fut => result,
    }
}

async fn read_next(
    cursor: &mut Box<dyn IdCursor>,
    side: Side,
    steps: u64,
    cancel: &CancellationToken,
) -> Result<Option<IdValue>, DiffError> {
    or_cancelled(cancel, steps, async {
        cursor
            .next_id()
            .await
            .map_err(|e| DiffError::from_source(side, steps, e))
    })
    .await
}

async fn advance(
    state: &mut SideState,
    cursor: &mut Box<dyn IdCursor>,
    side: Side,
    steps: u64,
    cancel: &CancellationToken,
) -> Result<(), DiffError> {
    match read_next(cursor, side, steps, cancel).await? {
        Some(next) => {
            state.current = next;
            state.consumed += 1;
        }
        None => state.exhausted = true,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::memory::MemorySource;
    use crate::progress::SteppingClock;
    use crate::source::IdSource;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::time::Duration;

    /// Serves `ids`; once `cancel_at` ids were served it cancels `cancel`,
    /// then either keeps serving or never answers again.
    struct CancellingCursor {
        ids: std::vec::IntoIter<IdValue>,
        served: usize,
        cancel_at: usize,
        stall: bool,
        cancel: CancellationToken,
    }

    impl CancellingCursor {
        fn boxed(
            ids: &[i32],
            cancel_at: usize,
            stall: bool,
            cancel: &CancellationToken,
        ) -> Box<dyn IdCursor> {
            let ids: Vec<IdValue> = ids.iter().copied().map(IdValue::Int32).collect();
            Box::new(Self {
                ids: ids.into_iter(),
                served: 0,
                cancel_at,
                stall,
                cancel: cancel.clone(),
            })
        }
    }

    #[async_trait]
    impl IdCursor for CancellingCursor {
        async fn next_id(&mut self) -> Result<Option<IdValue>, SourceError> {
            if self.served == self.cancel_at {
                self.cancel.cancel();
                if self.stall {
                    return std::future::pending().await;
                }
            }
            let next = self.ids.next();
            if next.is_some() {
                self.served += 1;
            }
            Ok(next)
        }
    }

    fn state(id: i32, exhausted: bool) -> SideState {
        SideState {
            current: IdValue::Int32(id),
            consumed: 1,
            exhausted,
        }
    }

    fn reporter(interval: Duration) -> ProgressReporter {
        let start = Utc.with_ymd_and_hms(2016, 1, 19, 0, 26, 56).unwrap();
        ProgressReporter::new(
            Box::new(SteppingClock::new(start, Duration::from_secs(1))),
            interval,
        )
    }

    async fn run(
        a: &[i32],
        b: &[i32],
        emit_matches: bool,
    ) -> Result<(MergeStats, Vec<DiffEvent>), DiffError> {
        let source_a = MemorySource::from_values("a", a.iter().copied());
        let source_b = MemorySource::from_values("b", b.iter().copied());
        let mut events: Vec<DiffEvent> = Vec::new();
        let stats = merge_join(
            source_a.open_ascending().await.unwrap(),
            source_b.open_ascending().await.unwrap(),
            &mut reporter(Duration::from_secs(3600)),
            &mut events,
            emit_matches,
            &CancellationToken::new(),
        )
        .await?;
        Ok((stats, events))
    }

    fn only_in(events: &[DiffEvent]) -> Vec<(Side, IdValue)> {
        events
            .iter()
            .filter_map(|e| e.only_in().map(|(side, id)| (side, id.clone())))
            .collect()
    }

    #[test]
    fn test_verdict_between() {
        assert_eq!(Verdict::between(&state(1, false), &state(2, false)).unwrap(), Verdict::Less);
        assert_eq!(Verdict::between(&state(2, false), &state(2, false)).unwrap(), Verdict::Equal);
        assert_eq!(Verdict::between(&state(3, false), &state(2, false)).unwrap(), Verdict::Greater);
        assert_eq!(Verdict::between(&state(3, true), &state(2, false)).unwrap(), Verdict::AExhausted);
        assert_eq!(Verdict::between(&state(3, false), &state(2, true)).unwrap(), Verdict::BExhausted);
        assert_eq!(
            Verdict::between(&state(3, true), &state(3, true)).unwrap(),
            Verdict::BothExhausted
        );
    }

    #[test]
    fn test_exhausted_sides_are_never_compared() {
        let a = SideState {
            current: IdValue::from("x"),
            consumed: 1,
            exhausted: true,
        };
        assert_eq!(Verdict::between(&a, &state(1, false)).unwrap(), Verdict::AExhausted);
    }

    #[test]
    fn test_last_pair_verdict_surfaces_both_sides() {
        // A's 3 was just classified and A ran dry; B's 4 is still pending.
        let step = Verdict::between(&state(3, true), &state(4, false))
            .unwrap()
            .step()
            .unwrap();
        assert_eq!(step.classification, Classification::OnlyIn(Side::B));
        assert!(step.advance_b);
        assert!(!step.advance_a);
        assert_eq!(Verdict::BothExhausted.step(), None);
    }

    #[tokio::test]
    async fn test_identical_sources() {
        let (stats, events) = run(&[1, 2, 3], &[1, 2, 3], false).await.unwrap();
        assert!(only_in(&events).is_empty());
        assert_eq!(stats.steps, 3);
        assert_eq!(stats.matched, 3);
        assert_eq!(stats.consumed_a, 3);
        assert_eq!(stats.consumed_b, 3);
    }

    #[tokio::test]
    async fn test_fully_disjoint_sources_interleave() {
        let (stats, events) = run(&[1, 3, 5], &[2, 4, 6], false).await.unwrap();
        assert_eq!(
            only_in(&events),
            vec![
                (Side::A, IdValue::Int32(1)),
                (Side::B, IdValue::Int32(2)),
                (Side::A, IdValue::Int32(3)),
                (Side::B, IdValue::Int32(4)),
                (Side::A, IdValue::Int32(5)),
                (Side::B, IdValue::Int32(6)),
            ]
        );
        assert_eq!(stats.only_in_a, 3);
        assert_eq!(stats.only_in_b, 3);
        assert_eq!(stats.matched, 0);
    }

    #[tokio::test]
    async fn test_last_pair_mismatch() {
        let (stats, events) = run(&[1, 2, 3], &[1, 2, 4], false).await.unwrap();
        assert_eq!(
            only_in(&events),
            vec![(Side::A, IdValue::Int32(3)), (Side::B, IdValue::Int32(4))]
        );
        assert_eq!(stats.matched, 2);
    }

    #[tokio::test]
    async fn test_last_pair_mismatch_reversed() {
        let (_, events) = run(&[1, 2, 4], &[1, 2, 3], false).await.unwrap();
        assert_eq!(
            only_in(&events),
            vec![(Side::B, IdValue::Int32(3)), (Side::A, IdValue::Int32(4))]
        );
    }

    #[tokio::test]
    async fn test_one_side_runs_out_early() {
        let (stats, events) = run(&[1], &[2, 3, 4], false).await.unwrap();
        assert_eq!(
            only_in(&events),
            vec![
                (Side::A, IdValue::Int32(1)),
                (Side::B, IdValue::Int32(2)),
                (Side::B, IdValue::Int32(3)),
                (Side::B, IdValue::Int32(4)),
            ]
        );
        assert_eq!(stats.steps, 4);
    }

    #[tokio::test]
    async fn test_single_shared_identifier() {
        let (stats, events) = run(&[7], &[7], false).await.unwrap();
        assert!(only_in(&events).is_empty());
        assert_eq!(stats.matched, 1);
        match events.last() {
            Some(DiffEvent::FinalProgress(snapshot)) => {
                assert_eq!(snapshot.steps, 1);
                assert_eq!(snapshot.current_a, IdValue::Int32(7));
            }
            other => panic!("expected final progress, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_matches_emitted_on_request() {
        let (_, events) = run(&[1, 2], &[2, 3], true).await.unwrap();
        let matched: Vec<&DiffEvent> = events
            .iter()
            .filter(|e| matches!(e, DiffEvent::Matched { .. }))
            .collect();
        assert_eq!(matched.len(), 1);
        assert!(matched[0].to_string().ends_with("both: 2"));
    }

    #[tokio::test]
    async fn test_empty_side_fails_before_comparing() {
        let err = run(&[], &[1], false).await.unwrap_err();
        assert_eq!(err, DiffError::EmptySource(EmptySides::A));

        let err = run(&[], &[], false).await.unwrap_err();
        assert_eq!(err, DiffError::EmptySource(EmptySides::Both));
    }

    #[tokio::test]
    async fn test_progress_cadence() {
        let ids: Vec<i32> = (1..=12).collect();
        let source_a = MemorySource::from_values("a", ids.clone());
        let source_b = MemorySource::from_values("b", ids);
        let mut events: Vec<DiffEvent> = Vec::new();

        let stats = merge_join(
            source_a.open_ascending().await.unwrap(),
            source_b.open_ascending().await.unwrap(),
            &mut reporter(Duration::from_secs(5)),
            &mut events,
            false,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(stats.steps, 12);

        let progress: Vec<&ProgressSnapshot> = events
            .iter()
            .filter_map(|e| match e {
                DiffEvent::Progress(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(progress.len(), 12 / 5);
        assert!(progress.windows(2).all(|w| w[0].steps <= w[1].steps));
        assert_eq!(progress[0].steps, 5);
        assert_eq!(progress[1].steps, 10);

        assert!(matches!(events.last(), Some(DiffEvent::FinalProgress(s)) if s.steps == 12));
    }

    #[tokio::test]
    async fn test_kind_mismatch_aborts() {
        let source_a = MemorySource::from_values("a", [1]);
        let source_b = MemorySource::from_values("b", ["1"]);
        let err = merge_join(
            source_a.open_ascending().await.unwrap(),
            source_b.open_ascending().await.unwrap(),
            &mut reporter(Duration::from_secs(60)),
            &mut Vec::<DiffEvent>::new(),
            false,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DiffError::ComparisonType { steps: 0, .. }));
    }

    #[tokio::test]
    async fn test_read_failure_names_side_and_steps() {
        let source_a = MemorySource::from_values("a", [1, 2, 3, 4]);
        let source_b = MemorySource::from_values("b", [1, 2, 3, 4])
            .with_failure_after(2, SourceError::Read("socket closed".to_string()));
        let mut events: Vec<DiffEvent> = Vec::new();

        let err = merge_join(
            source_a.open_ascending().await.unwrap(),
            source_b.open_ascending().await.unwrap(),
            &mut reporter(Duration::from_secs(60)),
            &mut events,
            false,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.side(), Some(Side::B));
        assert_eq!(err.steps(), 2);
        assert!(matches!(err, DiffError::SourceRead { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_run_stops() {
        let source_a = MemorySource::from_values("a", [1, 2, 3]);
        let source_b = MemorySource::from_values("b", [1, 2, 3]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = merge_join(
            source_a.open_ascending().await.unwrap(),
            source_b.open_ascending().await.unwrap(),
            &mut reporter(Duration::from_secs(60)),
            &mut Vec::<DiffEvent>::new(),
            false,
            &cancel,
        )
        .await
        .unwrap_err();
        assert_eq!(err, DiffError::Cancelled { steps: 0 });
    }

    #[tokio::test]
    async fn test_cancelled_between_steps_keeps_earlier_lines() {
        let cancel = CancellationToken::new();
        // The third read of A cancels the run but still returns its identifier.
        let cursor_a = CancellingCursor::boxed(&[1, 2, 3, 4, 5], 2, false, &cancel);
        let source_b = MemorySource::from_values("b", [10]);
        let mut events: Vec<DiffEvent> = Vec::new();

        let err = merge_join(
            cursor_a,
            source_b.open_ascending().await.unwrap(),
            &mut reporter(Duration::from_secs(3600)),
            &mut events,
            false,
            &cancel,
        )
        .await
        .unwrap_err();

        assert_eq!(err, DiffError::Cancelled { steps: 2 });
        assert_eq!(
            only_in(&events),
            vec![(Side::A, IdValue::Int32(1)), (Side::A, IdValue::Int32(2))]
        );
        assert!(!events.iter().any(|e| matches!(e, DiffEvent::FinalProgress(_))));
    }

    #[tokio::test]
    async fn test_cancelled_while_read_is_pending() {
        let cancel = CancellationToken::new();
        // A serves three identifiers, then its fourth read never resolves.
        let cursor_a = CancellingCursor::boxed(&[1, 2, 3], 3, true, &cancel);
        let source_b = MemorySource::from_values("b", [3, 4, 5, 6]);
        let mut events: Vec<DiffEvent> = Vec::new();

        let err = merge_join(
            cursor_a,
            source_b.open_ascending().await.unwrap(),
            &mut reporter(Duration::from_secs(3600)),
            &mut events,
            false,
            &cancel,
        )
        .await
        .unwrap_err();

        assert_eq!(err, DiffError::Cancelled { steps: 3 });
        assert_eq!(
            only_in(&events),
            vec![(Side::A, IdValue::Int32(1)), (Side::A, IdValue::Int32(2))]
        );
    }
}
