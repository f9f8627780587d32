//! Identifier source and cursor traits.
//!
//! These traits are the seam between the diff engine and the connection
//! layer. A source is one endpoint plus one collection; it can open any
//! number of cursors, but the engine opens exactly one ascending cursor for
//! the merge-join plus one ascending and one descending cursor for the range
//! probe.
//!
//! # Implementations
//!
//! - [`crate::memory::MemorySource`] - identifiers held in memory
//! - `id_diff_mongodb::MongoIdSource` - `_id` index of a MongoDB collection

use async_trait::async_trait;

use crate::error::SourceError;
use crate::identifier::IdValue;

/// A forward-only cursor over identifiers.
///
/// Ascending cursors must yield non-decreasing identifiers. The engine does
/// not verify this; an out-of-order source produces a wrong diff.
#[async_trait]
pub trait IdCursor: Send {
    /// Fetch the next identifier, or `None` once the cursor is exhausted.
    async fn next_id(&mut self) -> Result<Option<IdValue>, SourceError>;
}

/// One connected endpoint plus a target collection.
#[async_trait]
pub trait IdSource: Send + Sync {
    /// Short description of the endpoint, used in report headers.
    fn describe(&self) -> String;

    /// Open a cursor over all identifiers in ascending order.
    async fn open_ascending(&self) -> Result<Box<dyn IdCursor>, SourceError>;

    /// Open a cursor over all identifiers in descending order.
    ///
    /// Only used to find the maximum identifier.
    async fn open_descending(&self) -> Result<Box<dyn IdCursor>, SourceError>;

    /// Number of identifiers in the collection, if the source can tell cheaply.
    ///
    /// Diagnostic only; never used for correctness.
    async fn count(&self) -> Result<Option<u64>, SourceError> {
        Ok(None)
    }
}
