//! Command-line interface for compare-ids
//!
//! # Usage Examples
//!
//! ## Identifier diff
//! ```bash
//! # Compare a collection on two replica-set members
//! compare-ids ids \
//!   --endpoint-a rs0-a:27017 --endpoint-b rs0-b:27017 \
//!   --namespace test.users \
//!   --username root --password root \
//!   --progress-interval 10s
//!
//! # Machine-readable summary, non-zero exit when anything differs
//! compare-ids ids -a mongodb://a:27017 -b mongodb://b:27017 -n test.users \
//!   --format json --fail-on-diff
//! ```
//!
//! ## Database hashes
//! ```bash
//! compare-ids dbs --database config --endpoint cfg1:27019,cfg2:27019,cfg3:27019
//! ```
//!
//! ## Exit status
//! - 0: finished (differences are reported, not failures)
//! - 1: error (connection, authentication, empty collection, cancelled, ...)
//! - 2: finished with differences and `--fail-on-diff` was given

use clap::{Parser, Subcommand};
use compare_ids::shutdown::setup_shutdown_handler;
use compare_ids::{run_compare_dbs, run_compare_ids, CompareDbsArgs, CompareIdsArgs};

const EXIT_DIFFERENCES: i32 = 2;

#[derive(Parser)]
#[command(name = "compare-ids")]
#[command(about = "Find records present in one copy of a MongoDB collection but not the other")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff the _id values of one collection on two endpoints
    Ids(CompareIdsArgs),

    /// Compare per-collection dbHash values of a database across endpoints
    Dbs(CompareDbsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_DIFFERENCES),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Returns `false` when differences were found and the caller asked to fail
/// on them.
async fn run() -> anyhow::Result<bool> {
    // Logs go to stderr, the report owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ids(args) => {
            let fail_on_diff = args.fail_on_diff;
            let cancel = setup_shutdown_handler();
            let result = run_compare_ids(args, cancel).await?;
            Ok(!fail_on_diff || result.summary.is_identical())
        }
        Commands::Dbs(args) => {
            let fail_on_diff = args.fail_on_diff;
            let report = run_compare_dbs(args).await?;
            Ok(!fail_on_diff || report.is_identical())
        }
    }
}
