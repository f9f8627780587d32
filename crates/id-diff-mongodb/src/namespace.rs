use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::NamespaceError;

/// A `database.collection` pair.
///
/// The database name ends at the first dot; collection names may themselves
/// contain dots (`system.profile`, `fs.chunks`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl FromStr for Namespace {
    type Err = NamespaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (database, collection) = s
            .split_once('.')
            .ok_or_else(|| NamespaceError::Malformed(s.to_string()))?;
        if database.is_empty() {
            return Err(NamespaceError::EmptyDatabase(s.to_string()));
        }
        if collection.is_empty() {
            return Err(NamespaceError::EmptyCollection(s.to_string()));
        }
        Ok(Self {
            database: database.to_string(),
            collection: collection.to_string(),
        })
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}
