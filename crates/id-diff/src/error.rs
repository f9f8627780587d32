//! Error types for identifier sources and the diff engine.

use std::fmt;

use thiserror::Error;

use crate::identifier::{IdKind, IdValue};
use crate::merge::Side;

/// Two identifiers of different kinds met in a comparison.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot compare {left} identifier {left_value} with {right} identifier {right_value}")]
pub struct ComparisonTypeError {
    pub left: IdKind,
    pub right: IdKind,
    pub left_value: String,
    pub right_value: String,
}

impl ComparisonTypeError {
    pub fn new(left: &IdValue, right: &IdValue) -> Self {
        Self {
            left: left.kind(),
            right: right.kind(),
            left_value: left.to_string(),
            right_value: right.to_string(),
        }
    }
}

/// Errors raised by an identifier source (the connection layer).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The endpoint could not be reached.
    #[error("cannot reach {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    /// The endpoint rejected the credentials.
    #[error("authentication rejected by {endpoint}: {message}")]
    Authentication { endpoint: String, message: String },

    /// A read did not complete within the connection layer's timeout.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Any other failure while reading from a cursor.
    #[error("read failed: {0}")]
    Read(String),

    /// The source produced an identifier the engine cannot represent.
    #[error("unsupported identifier: {0}")]
    UnsupportedId(String),

    /// The source was configured with invalid parameters.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Which of the two sources turned out to be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptySides {
    A,
    B,
    Both,
}

impl EmptySides {
    /// Pair up the first reads of both sides, or name the sides that had none.
    pub fn pair<A, B>(a: Option<A>, b: Option<B>) -> Result<(A, B), EmptySides> {
        match (a, b) {
            (Some(a), Some(b)) => Ok((a, b)),
            (None, None) => Err(EmptySides::Both),
            (None, Some(_)) => Err(EmptySides::A),
            (Some(_), None) => Err(EmptySides::B),
        }
    }
}

impl fmt::Display for EmptySides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptySides::A => f.write_str("\"A\" collection is empty"),
            EmptySides::B => f.write_str("\"B\" collection is empty"),
            EmptySides::Both => f.write_str("both collections are empty"),
        }
    }
}

/// Fatal errors of a diff run.
///
/// Every variant carries enough context for the caller to decide whether to
/// re-run: the side that failed (if any) and how many merge steps completed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    #[error("{side}: connection error after {steps} steps: {message}")]
    Connection {
        side: Side,
        steps: u64,
        message: String,
    },

    #[error("{side}: authentication error: {message}")]
    Authentication {
        side: Side,
        steps: u64,
        message: String,
    },

    #[error("{0}")]
    EmptySource(EmptySides),

    #[error("comparison failed after {steps} steps: {mismatch}")]
    ComparisonType {
        steps: u64,
        mismatch: ComparisonTypeError,
    },

    #[error("{side}: read failed after {steps} steps: {message}")]
    SourceRead {
        side: Side,
        steps: u64,
        message: String,
    },

    #[error("{side}: timed out after {steps} steps: {message}")]
    Timeout {
        side: Side,
        steps: u64,
        message: String,
    },

    #[error("cancelled after {steps} steps")]
    Cancelled { steps: u64 },
}

impl DiffError {
    /// Attribute a source failure to one side of the diff.
    pub fn from_source(side: Side, steps: u64, err: SourceError) -> Self {
        match err {
            SourceError::Connection { .. } => DiffError::Connection {
                side,
                steps,
                message: err.to_string(),
            },
            SourceError::Authentication { .. } => DiffError::Authentication {
                side,
                steps,
                message: err.to_string(),
            },
            SourceError::Timeout(message) => DiffError::Timeout {
                side,
                steps,
                message,
            },
            SourceError::Read(_) | SourceError::UnsupportedId(_) | SourceError::Config(_) => {
                DiffError::SourceRead {
                    side,
                    steps,
                    message: err.to_string(),
                }
            }
        }
    }

    /// The side the error is attributed to, if any.
    pub fn side(&self) -> Option<Side> {
        match self {
            DiffError::Connection { side, .. }
            | DiffError::Authentication { side, .. }
            | DiffError::SourceRead { side, .. }
            | DiffError::Timeout { side, .. } => Some(*side),
            DiffError::EmptySource(_)
            | DiffError::ComparisonType { .. }
            | DiffError::Cancelled { .. } => None,
        }
    }

    /// Number of merge steps completed before the failure.
    pub fn steps(&self) -> u64 {
        match self {
            DiffError::Connection { steps, .. }
            | DiffError::Authentication { steps, .. }
            | DiffError::ComparisonType { steps, .. }
            | DiffError::SourceRead { steps, .. }
            | DiffError::Timeout { steps, .. }
            | DiffError::Cancelled { steps } => *steps,
            DiffError::EmptySource(_) => 0,
        }
    }
}
