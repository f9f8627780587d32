//! `_id` cursors over a MongoDB collection.

use async_trait::async_trait;
use bson::{doc, Document};
use id_diff::{IdCursor, IdSource, IdValue, SourceError};
use mongodb::options::Hint;
use mongodb::{Collection, Cursor};
use tracing::debug;

use crate::convert::id_from_document;
use crate::error::classify;

/// Identifier source reading the `_id` index of one collection.
pub struct MongoIdSource {
    collection: Collection<Document>,
    description: String,
    batch_size: Option<u32>,
}

impl MongoIdSource {
    pub fn new(collection: Collection<Document>, description: String, batch_size: Option<u32>) -> Self {
        Self {
            collection,
            description,
            batch_size,
        }
    }

    async fn open(&self, direction: i32, batch_size: Option<u32>) -> Result<MongoIdCursor, SourceError> {
        debug!(
            "Opening {} _id cursor on {}",
            if direction > 0 { "ascending" } else { "descending" },
            self.description
        );
        let mut find = self
            .collection
            .find(doc! {})
            .projection(doc! { "_id": 1 })
            .sort(doc! { "_id": direction })
            .hint(Hint::Keys(doc! { "_id": 1 }));
        if let Some(batch_size) = batch_size {
            find = find.batch_size(batch_size);
        }
        let cursor = find.await.map_err(|e| classify(&self.description, e))?;
        Ok(MongoIdCursor {
            cursor,
            description: self.description.clone(),
        })
    }
}

#[async_trait]
impl IdSource for MongoIdSource {
    fn describe(&self) -> String {
        self.description.clone()
    }

    async fn open_ascending(&self) -> Result<Box<dyn IdCursor>, SourceError> {
        Ok(Box::new(self.open(1, self.batch_size).await?))
    }

    async fn open_descending(&self) -> Result<Box<dyn IdCursor>, SourceError> {
        // Only ever read for the maximum
        Ok(Box::new(self.open(-1, Some(1)).await?))
    }

    async fn count(&self) -> Result<Option<u64>, SourceError> {
        let count = self
            .collection
            .estimated_document_count()
            .await
            .map_err(|e| classify(&self.description, e))?;
        Ok(Some(count))
    }
}

/// Forward-only cursor yielding converted `_id` values.
pub struct MongoIdCursor {
    cursor: Cursor<Document>,
    description: String,
}

#[async_trait]
impl IdCursor for MongoIdCursor {
    async fn next_id(&mut self) -> Result<Option<IdValue>, SourceError> {
        if !self
            .cursor
            .advance()
            .await
            .map_err(|e| classify(&self.description, e))?
        {
            return Ok(None);
        }
        let doc = self
            .cursor
            .deserialize_current()
            .map_err(|e| classify(&self.description, e))?;
        id_from_document(&doc).map(Some)
    }
}
