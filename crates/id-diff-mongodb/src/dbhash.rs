//! Per-collection `dbHash` comparison across endpoints.

use std::collections::{BTreeMap, BTreeSet};

use bson::{doc, Bson};
use id_diff::SourceError;
use serde::Serialize;
use tracing::debug;

use crate::connect::MongoEndpoint;
use crate::error::classify;

/// Collection hashes of one database on one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbHashes {
    pub endpoint: String,
    pub collections: BTreeMap<String, String>,
}

/// Hashes of one collection on every endpoint, in endpoint order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionHashes {
    pub collection: String,
    /// `None` where the collection does not exist on that endpoint.
    pub hashes: Vec<Option<String>>,
    pub same: bool,
}

/// Run `dbHash` on `database` of `endpoint`.
pub async fn fetch_db_hashes(endpoint: &MongoEndpoint, database: &str) -> Result<DbHashes, SourceError> {
    let response = endpoint
        .database(database)
        .run_command(doc! { "dbHash": 1 })
        .await
        .map_err(|e| classify(endpoint.description(), e))?;

    let collections: BTreeMap<String, String> = match response.get("collections") {
        Some(Bson::Document(collections)) => collections
            .iter()
            .filter_map(|(name, hash)| match hash {
                Bson::String(hash) => Some((name.clone(), hash.clone())),
                _ => None,
            })
            .collect(),
        _ => {
            return Err(SourceError::Read(format!(
                "{}: dbHash response without collections",
                endpoint.description()
            )))
        }
    };
    debug!("dbHash of {} on {}: {:?}", database, endpoint.description(), collections);

    Ok(DbHashes {
        endpoint: endpoint.description().to_string(),
        collections,
    })
}

/// Line up the hashes of every collection seen on any endpoint.
///
/// A collection is the same only if every endpoint has it with the same hash.
pub fn compare_hashes(all: &[DbHashes]) -> Vec<CollectionHashes> {
    let names: BTreeSet<&String> = all.iter().flat_map(|h| h.collections.keys()).collect();
    names
        .into_iter()
        .map(|name| {
            let hashes: Vec<Option<String>> =
                all.iter().map(|h| h.collections.get(name).cloned()).collect();
            let same = hashes.iter().all(|h| h.is_some() && *h == hashes[0]);
            CollectionHashes {
                collection: name.clone(),
                hashes,
                same,
            }
        })
        .collect()
}

/// Render a comparison as a padded plain-text table.
pub fn format_table(endpoints: &[String], rows: &[CollectionHashes]) -> Vec<String> {
    let width = rows
        .iter()
        .map(|r| r.collection.len())
        .chain(std::iter::once("collection".len()))
        .max()
        .unwrap_or_default();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    let mut header = format!("     {:width$}", "collection");
    for endpoint in endpoints {
        header.push_str(&format!(" | {endpoint:32}"));
    }
    lines.push(header.trim_end().to_string());

    for row in rows {
        let mut line = format!(
            "{} {:width$}",
            if row.same { "same" } else { "DIFF" },
            row.collection
        );
        for hash in &row.hashes {
            line.push_str(&format!(" | {:32}", hash.as_deref().unwrap_or("-")));
        }
        lines.push(line.trim_end().to_string());
    }
    lines
}
