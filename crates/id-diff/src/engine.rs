//! Diff engine entry point.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{DiffError, EmptySides};
use crate::event::DiffEvent;
use crate::merge::{merge_join, or_cancelled, Side};
use crate::progress::{Clock, ProgressReporter, SystemClock};
use crate::range::{probe_range, IdRange};
use crate::report::{DiffFailure, DiffResult, DiffSummary};
use crate::sink::{DiffSink, Recording};
use crate::source::{IdCursor, IdSource};

pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(60);

/// Options of a diff run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOptions {
    /// Minimum time between two progress lines.
    pub progress_interval: Duration,
    /// Also report identifiers found on both sides.
    pub emit_matches: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            emit_matches: false,
        }
    }
}

/// Compares the identifiers of one collection on two sources.
pub struct DiffEngine {
    options: DiffOptions,
    clock: Box<dyn Clock>,
    cancel: CancellationToken,
}

impl DiffEngine {
    pub fn new(options: DiffOptions) -> Self {
        Self {
            options,
            clock: Box::new(SystemClock::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the wall clock, e.g. with a [`crate::SteppingClock`] in tests.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Abort the run once `cancel` is triggered.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the full diff: header lines, counts, range probe, merge-join,
    /// and a closing summary line.
    ///
    /// Every line is streamed to `sink` as it happens. On failure a
    /// "diff incomplete" line is emitted and the error is returned together
    /// with every line of the run; lines already emitted stay valid.
    pub async fn compare_identifiers(
        self,
        collection: &str,
        source_a: &dyn IdSource,
        source_b: &dyn IdSource,
        sink: &mut dyn DiffSink,
    ) -> Result<DiffResult, DiffFailure> {
        let mut reporter = ProgressReporter::new(self.clock, self.options.progress_interval);
        let mut recording = Recording::new(sink);

        let outcome = run(
            collection,
            source_a,
            source_b,
            &self.options,
            &self.cancel,
            &mut reporter,
            &mut recording,
        )
        .await;

        let at = reporter.now();
        match outcome {
            Ok(summary) => {
                recording.emit(&DiffEvent::Complete {
                    at,
                    summary: summary.clone(),
                });
                info!(
                    "Diff of '{}' complete: {} compared, {} only in A, {} only in B",
                    collection, summary.total_compared, summary.only_in_a, summary.only_in_b
                );
                Ok(DiffResult {
                    summary,
                    log: recording.into_lines(),
                })
            }
            Err(error) => {
                recording.emit(&DiffEvent::Incomplete {
                    at,
                    error: error.clone(),
                });
                warn!("Diff of '{}' incomplete: {}", collection, error);
                Err(DiffFailure {
                    error,
                    log: recording.into_lines(),
                })
            }
        }
    }
}

/// Compare identifiers with the system clock and no external cancellation.
pub async fn compare_identifiers(
    collection: &str,
    source_a: &dyn IdSource,
    source_b: &dyn IdSource,
    options: DiffOptions,
    sink: &mut dyn DiffSink,
) -> Result<DiffResult, DiffFailure> {
    DiffEngine::new(options)
        .compare_identifiers(collection, source_a, source_b, sink)
        .await
}

async fn run(
    collection: &str,
    source_a: &dyn IdSource,
    source_b: &dyn IdSource,
    options: &DiffOptions,
    cancel: &CancellationToken,
    reporter: &mut ProgressReporter,
    sink: &mut dyn DiffSink,
) -> Result<DiffSummary, DiffError> {
    info!("Comparing identifiers of '{}'", collection);

    let at = reporter.now();
    sink.emit(&DiffEvent::Collection {
        at,
        name: collection.to_string(),
    });
    for (side, source) in [(Side::A, source_a), (Side::B, source_b)] {
        let at = reporter.now();
        sink.emit(&DiffEvent::Source {
            at,
            side,
            description: source.describe(),
        });
    }

    let count_a = or_cancelled(cancel, 0, count(source_a, Side::A, reporter, sink)).await?;
    let count_b = or_cancelled(cancel, 0, count(source_b, Side::B, reporter, sink)).await?;

    let range_a = or_cancelled(cancel, 0, range(source_a, Side::A)).await?;
    let range_b = or_cancelled(cancel, 0, range(source_b, Side::B)).await?;
    let (range_a, range_b) = EmptySides::pair(range_a, range_b).map_err(DiffError::EmptySource)?;
    emit_range(Side::A, &range_a, reporter, sink);
    emit_range(Side::B, &range_b, reporter, sink);

    let cursor_a = or_cancelled(cancel, 0, open(source_a, Side::A)).await?;
    let cursor_b = or_cancelled(cancel, 0, open(source_b, Side::B)).await?;

    let at = reporter.now();
    sink.emit(&DiffEvent::ProgressInterval {
        at,
        interval: reporter.interval(),
    });

    let stats = merge_join(
        cursor_a,
        cursor_b,
        reporter,
        sink,
        options.emit_matches,
        cancel,
    )
    .await?;

    Ok(DiffSummary {
        collection: collection.to_string(),
        total_compared: stats.steps,
        only_in_a: stats.only_in_a,
        only_in_b: stats.only_in_b,
        matched: stats.matched,
        consumed_a: stats.consumed_a,
        consumed_b: stats.consumed_b,
        count_a,
        count_b,
        range_a,
        range_b,
    })
}

async fn count(
    source: &dyn IdSource,
    side: Side,
    reporter: &mut ProgressReporter,
    sink: &mut dyn DiffSink,
) -> Result<Option<u64>, DiffError> {
    let count = source
        .count()
        .await
        .map_err(|e| DiffError::from_source(side, 0, e))?;
    if let Some(count) = count {
        let at = reporter.now();
        sink.emit(&DiffEvent::Count { at, side, count });
    }
    Ok(count)
}

async fn range(source: &dyn IdSource, side: Side) -> Result<Option<IdRange>, DiffError> {
    probe_range(source)
        .await
        .map_err(|e| DiffError::from_source(side, 0, e))
}

async fn open(source: &dyn IdSource, side: Side) -> Result<Box<dyn IdCursor>, DiffError> {
    source
        .open_ascending()
        .await
        .map_err(|e| DiffError::from_source(side, 0, e))
}

fn emit_range(side: Side, range: &IdRange, reporter: &mut ProgressReporter, sink: &mut dyn DiffSink) {
    let at = reporter.now();
    sink.emit(&DiffEvent::Range {
        at,
        side,
        range: range.clone(),
    });
}
