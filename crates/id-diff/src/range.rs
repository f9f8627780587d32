//! Minimum/maximum identifier probe.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::SourceError;
use crate::identifier::IdValue;
use crate::source::IdSource;

/// Smallest and largest identifier of a source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdRange {
    pub min: IdValue,
    pub max: IdValue,
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.min, self.max)
    }
}

/// Fetch the first identifier of an ascending and of a descending cursor.
///
/// Returns `Ok(None)` when the source is empty. This is the cheapest way to
/// detect an empty source before walking it.
pub async fn probe_range(source: &dyn IdSource) -> Result<Option<IdRange>, SourceError> {
    let mut ascending = source.open_ascending().await?;
    let min = ascending.next_id().await?;
    drop(ascending);

    let mut descending = source.open_descending().await?;
    let max = descending.next_id().await?;

    debug!(
        "Range probe on {}: min={:?} max={:?}",
        source.describe(),
        min,
        max
    );

    match (min, max) {
        (Some(min), Some(max)) => Ok(Some(IdRange { min, max })),
        // Emptied between the two probes
        _ => Ok(None),
    }
}
