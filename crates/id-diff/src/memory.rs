//! In-memory identifier source.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::identifier::IdValue;
use crate::source::{IdCursor, IdSource};

/// Identifier source backed by a vector.
///
/// The identifiers are served in the order given; callers are responsible
/// for passing them sorted ascending. A read failure can be injected after a
/// number of successful ascending reads.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    ids: Vec<IdValue>,
    failure: Option<(usize, SourceError)>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, ids: Vec<IdValue>) -> Self {
        Self {
            name: name.into(),
            ids,
            failure: None,
        }
    }

    /// Convenience constructor from anything convertible to [`IdValue`].
    pub fn from_values<T: Into<IdValue>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        Self::new(name, values.into_iter().map(Into::into).collect())
    }

    /// Make ascending cursors fail with `error` after `reads` identifiers.
    pub fn with_failure_after(mut self, reads: usize, error: SourceError) -> Self {
        self.failure = Some((reads, error));
        self
    }
}

#[async_trait]
impl IdSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }

    async fn open_ascending(&self) -> Result<Box<dyn IdCursor>, SourceError> {
        Ok(Box::new(MemoryCursor {
            ids: self.ids.clone().into_iter(),
            served: 0,
            failure: self.failure.clone(),
        }))
    }

    async fn open_descending(&self) -> Result<Box<dyn IdCursor>, SourceError> {
        let mut ids = self.ids.clone();
        ids.reverse();
        Ok(Box::new(MemoryCursor {
            ids: ids.into_iter(),
            served: 0,
            failure: None,
        }))
    }

    async fn count(&self) -> Result<Option<u64>, SourceError> {
        Ok(Some(self.ids.len() as u64))
    }
}

struct MemoryCursor {
    ids: std::vec::IntoIter<IdValue>,
    served: usize,
    failure: Option<(usize, SourceError)>,
}

#[async_trait]
impl IdCursor for MemoryCursor {
    async fn next_id(&mut self) -> Result<Option<IdValue>, SourceError> {
        if let Some((after, error)) = &self.failure {
            if self.served >= *after {
                return Err(error.clone());
            }
        }
        let next = self.ids.next();
        if next.is_some() {
            self.served += 1;
        }
        Ok(next)
    }
}
