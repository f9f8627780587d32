//! Ordered cursor diff engine.
//!
//! Compares the identifiers of one collection held by two independently
//! accessed sources. Both sources are read through ascending cursors and
//! merge-joined in a single pass; every identifier present on only one side
//! is reported as soon as it is found, in ascending order, with periodic
//! progress lines in between.
//!
//! # Example
//!
//! ```ignore
//! use id_diff::{compare_identifiers, DiffOptions, MemorySource, WriterSink};
//!
//! let a = MemorySource::from_values("a", [1, 2, 3]);
//! let b = MemorySource::from_values("b", [1, 2, 4]);
//! let mut sink = WriterSink::new(std::io::stdout());
//!
//! let result = compare_identifiers("test.test", &a, &b, DiffOptions::default(), &mut sink).await?;
//! assert_eq!(result.summary.only_in_a, 1);
//! ```

pub mod engine;
pub mod error;
pub mod event;
pub mod identifier;
pub mod memory;
pub mod merge;
pub mod progress;
pub mod range;
pub mod report;
pub mod sink;
pub mod source;

pub use engine::{compare_identifiers, DiffEngine, DiffOptions, DEFAULT_PROGRESS_INTERVAL};
pub use error::{ComparisonTypeError, DiffError, EmptySides, SourceError};
pub use event::DiffEvent;
pub use identifier::{IdKind, IdValue};
pub use memory::MemorySource;
pub use merge::{merge_join, Classification, MergeStats, Side, SideState, Step, Verdict};
pub use progress::{
    format_progress, format_timestamp, should_report, Clock, ProgressReporter, ProgressSnapshot,
    SteppingClock, SystemClock,
};
pub use range::{probe_range, IdRange};
pub use report::{DiffFailure, DiffResult, DiffSummary};
pub use sink::{DiffSink, Tee, TracingSink, WriterSink};
pub use source::{IdCursor, IdSource};
