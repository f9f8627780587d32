//! `ids` command: merge-join diff of one collection on two endpoints.

use std::io;

use anyhow::Context;
use id_diff::{DiffEngine, DiffOptions, DiffResult, DiffSink, Tee, TracingSink, WriterSink};
use id_diff_mongodb::{connect, Namespace};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::parse_duration;
use crate::{CompareIdsArgs, OutputFormat};

/// Resolve the diff options from the command line.
pub fn diff_options(args: &CompareIdsArgs) -> anyhow::Result<DiffOptions> {
    let progress_interval = parse_duration(&args.progress_interval).with_context(|| {
        format!(
            "Failed to parse progress interval '{}'",
            args.progress_interval
        )
    })?;
    Ok(DiffOptions {
        progress_interval,
        emit_matches: args.emit_matches,
    })
}

/// Run the identifier diff.
///
/// Report lines are streamed to stdout (stderr in JSON mode) while the diff
/// runs. Returns the finished result; any fatal diff error is returned after
/// its "diff incomplete" line has been printed.
pub async fn run_compare_ids(
    args: CompareIdsArgs,
    cancel: CancellationToken,
) -> anyhow::Result<DiffResult> {
    let namespace: Namespace = args
        .namespace
        .parse()
        .with_context(|| format!("Invalid namespace '{}'", args.namespace))?;
    let options = diff_options(&args)?;
    let connect_options = args.connect.to_connect_options();

    info!(
        "Comparing {} between {} and {}",
        namespace, args.endpoint_a, args.endpoint_b
    );
    let (endpoint_a, endpoint_b) = tokio::try_join!(
        async {
            connect(&args.endpoint_a, &connect_options)
                .await
                .context("Failed to connect to endpoint A")
        },
        async {
            connect(&args.endpoint_b, &connect_options)
                .await
                .context("Failed to connect to endpoint B")
        },
    )?;

    let source_a = endpoint_a.collection(&namespace);
    let source_b = endpoint_b.collection(&namespace);

    let mut sink: Box<dyn DiffSink> = match args.format {
        OutputFormat::Text => Box::new(Tee(WriterSink::new(io::stdout()), TracingSink)),
        OutputFormat::Json => Box::new(Tee(WriterSink::new(io::stderr()), TracingSink)),
    };

    let result = DiffEngine::new(options)
        .with_cancellation(cancel)
        .compare_identifiers(
            &namespace.to_string(),
            &source_a,
            &source_b,
            sink.as_mut(),
        )
        .await
        .with_context(|| format!("Diff of {namespace} failed"))?;

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(result)
}
