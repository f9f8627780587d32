//! Diff run results.

use serde::Serialize;
use thiserror::Error;

use crate::error::DiffError;
use crate::range::IdRange;

/// Counters of a completed diff run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffSummary {
    pub collection: String,
    /// Merge steps; every step classifies exactly one identifier (or one matching pair).
    pub total_compared: u64,
    pub only_in_a: u64,
    pub only_in_b: u64,
    pub matched: u64,
    pub consumed_a: u64,
    pub consumed_b: u64,
    pub count_a: Option<u64>,
    pub count_b: Option<u64>,
    pub range_a: IdRange,
    pub range_b: IdRange,
}

impl DiffSummary {
    /// No identifier is missing on either side.
    pub fn is_identical(&self) -> bool {
        self.only_in_a == 0 && self.only_in_b == 0
    }

    pub fn mismatches(&self) -> u64 {
        self.only_in_a + self.only_in_b
    }
}

/// Summary plus every report line emitted during the run.
#[derive(Debug, Clone, Serialize)]
pub struct DiffResult {
    pub summary: DiffSummary,
    pub log: Vec<String>,
}

/// A run that stopped early: the error plus every report line emitted,
/// the closing "diff incomplete" line included.
#[derive(Error, Debug, Clone)]
#[error("{error}")]
pub struct DiffFailure {
    pub error: DiffError,
    pub log: Vec<String>,
}
