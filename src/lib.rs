//! compare-ids library
//!
//! Finds the records present in one copy of a MongoDB collection but not in
//! another, by merge-joining the `_id` indexes of both copies in a single
//! pass.
//!
//! # Features
//!
//! - Identifier diff: every `_id` found on one side only, in ascending order
//! - Progress lines at a configurable interval, plus a final snapshot
//! - Works against standalone servers, replica-set members and mongos
//! - `dbHash` comparison of whole databases across two or more endpoints
//!
//! # CLI Usage
//!
//! ```bash
//! # Compare a collection on a primary and a restored copy
//! compare-ids ids \
//!   --endpoint-a db1.example.net:27017 \
//!   --endpoint-b mongodb://localhost:27018 \
//!   --namespace shop.orders -u admin -p secret
//!
//! # Compare the collection hashes of the config database on three servers
//! compare-ids dbs --database config \
//!   --endpoint cfg1:27019 --endpoint cfg2:27019 --endpoint cfg3:27019
//! ```

use clap::{Args, ValueEnum};
use id_diff_mongodb::MongoConnectArgs;

pub mod compare_dbs;
pub mod compare_ids;
pub mod config;
pub mod shutdown;

pub use compare_dbs::run_compare_dbs;
pub use compare_ids::run_compare_ids;

/// How the outcome of a run is printed on stdout.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Report lines as they happen
    #[default]
    Text,
    /// One JSON document at the end; report lines go to stderr
    Json,
}

#[derive(Args, Clone, Debug)]
pub struct CompareIdsArgs {
    /// First endpoint, a mongodb:// URI or host:port
    #[arg(long, short = 'a', env = "COMPARE_IDS_ENDPOINT_A")]
    pub endpoint_a: String,

    /// Second endpoint, a mongodb:// URI or host:port
    #[arg(long, short = 'b', env = "COMPARE_IDS_ENDPOINT_B")]
    pub endpoint_b: String,

    /// Collection to compare, as <database>.<collection>
    #[arg(long, short = 'n', env = "COMPARE_IDS_NAMESPACE")]
    pub namespace: String,

    /// Connection settings for both endpoints
    #[command(flatten)]
    pub connect: MongoConnectArgs,

    /// Minimum time between progress lines (e.g. "60", "5s", "1m")
    #[arg(long, default_value = "60s", env = "COMPARE_IDS_PROGRESS_INTERVAL")]
    pub progress_interval: String,

    /// Also report identifiers present on both sides
    #[arg(long)]
    pub emit_matches: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Exit with status 2 when any identifier is missing on either side
    #[arg(long)]
    pub fail_on_diff: bool,
}

#[derive(Args, Clone, Debug)]
pub struct CompareDbsArgs {
    /// Endpoints to compare (repeat, or separate with commas; at least two)
    #[arg(long = "endpoint", value_delimiter = ',', num_args = 1.., required = true)]
    pub endpoints: Vec<String>,

    /// Database to hash on every endpoint
    #[arg(long, short = 'd', env = "COMPARE_IDS_DATABASE")]
    pub database: String,

    /// Connection settings for every endpoint
    #[command(flatten)]
    pub connect: MongoConnectArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Exit with status 2 when any collection differs
    #[arg(long)]
    pub fail_on_diff: bool,
}
