//! `dbs` command: per-collection `dbHash` comparison across endpoints.

use anyhow::Context;
use futures::future::try_join_all;
use id_diff_mongodb::{compare_hashes, connect, fetch_db_hashes, format_table, CollectionHashes};
use serde::Serialize;
use tracing::info;

use crate::{CompareDbsArgs, OutputFormat};

#[derive(Debug, Clone, Serialize)]
pub struct DbsReport {
    pub database: String,
    pub endpoints: Vec<String>,
    pub collections: Vec<CollectionHashes>,
}

impl DbsReport {
    pub fn is_identical(&self) -> bool {
        self.collections.iter().all(|c| c.same)
    }
}

/// Hash `args.database` on every endpoint and print one line per collection.
pub async fn run_compare_dbs(args: CompareDbsArgs) -> anyhow::Result<DbsReport> {
    if args.endpoints.len() < 2 {
        anyhow::bail!(
            "At least two endpoints are required, got {}",
            args.endpoints.len()
        );
    }
    let connect_options = args.connect.to_connect_options();

    let hashes = try_join_all(args.endpoints.iter().map(|endpoint| {
        let connect_options = &connect_options;
        let database = &args.database;
        async move {
            let endpoint = connect(endpoint, connect_options)
                .await
                .with_context(|| format!("Failed to connect to {endpoint}"))?;
            fetch_db_hashes(&endpoint, database)
                .await
                .with_context(|| format!("dbHash failed on {}", endpoint.description()))
        }
    }))
    .await?;

    let endpoints: Vec<String> = hashes.iter().map(|h| h.endpoint.clone()).collect();
    let report = DbsReport {
        database: args.database.clone(),
        collections: compare_hashes(&hashes),
        endpoints,
    };
    info!(
        "Compared {} collections of '{}' across {} endpoints",
        report.collections.len(),
        report.database,
        report.endpoints.len()
    );

    match args.format {
        OutputFormat::Text => {
            for line in format_table(&report.endpoints, &report.collections) {
                println!("{line}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(report)
}
