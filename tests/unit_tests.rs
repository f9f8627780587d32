use std::time::Duration;

use clap::Parser;
use compare_ids::compare_ids::diff_options;
use compare_ids::config::parse_duration;
use compare_ids::{CompareDbsArgs, CompareIdsArgs, OutputFormat};

#[derive(Parser)]
struct IdsCli {
    #[command(flatten)]
    args: CompareIdsArgs,
}

#[derive(Parser)]
struct DbsCli {
    #[command(flatten)]
    args: CompareDbsArgs,
}

#[test]
fn test_parse_duration_forms() {
    assert_eq!(parse_duration("300").unwrap(), Duration::from_secs(300));
    assert_eq!(parse_duration("300s").unwrap(), Duration::from_secs(300));
    assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
    assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
    assert_eq!(parse_duration("0.5").unwrap(), Duration::from_millis(500));
    assert_eq!(parse_duration(" 5s ").unwrap(), Duration::from_secs(5));
}

#[test]
fn test_parse_duration_rejects_garbage() {
    assert!(parse_duration("").is_err());
    assert!(parse_duration("soon").is_err());
    assert!(parse_duration("-5").is_err());
    assert!(parse_duration("1.5h").is_err());
}

#[test]
fn test_parse_duration_overflow_is_an_error() {
    let err = parse_duration("9999999999999999h").unwrap_err();
    assert!(err.to_string().contains("Duration out of range"));
    assert!(parse_duration("999999999999999999m").is_err());
    assert_eq!(
        parse_duration("5124095576030431h").unwrap(),
        Duration::from_secs(5124095576030431 * 3600)
    );
}

#[test]
fn test_compare_ids_args_defaults() {
    let cli = IdsCli::parse_from([
        "compare-ids",
        "--endpoint-a",
        "localhost:27017",
        "--endpoint-b",
        "localhost:27018",
        "--namespace",
        "test.users",
    ]);

    assert_eq!(cli.args.endpoint_a, "localhost:27017");
    assert_eq!(cli.args.namespace, "test.users");
    assert_eq!(cli.args.format, OutputFormat::Text);
    assert!(!cli.args.fail_on_diff);
    assert_eq!(cli.args.connect.auth_db, "admin");

    let options = diff_options(&cli.args).unwrap();
    assert_eq!(options.progress_interval, Duration::from_secs(60));
    assert!(!options.emit_matches);
}

#[test]
fn test_compare_ids_args_overrides() {
    let cli = IdsCli::parse_from([
        "compare-ids",
        "-a",
        "mongodb://a:27017",
        "-b",
        "mongodb://b:27017",
        "-n",
        "shop.orders",
        "--progress-interval",
        "5s",
        "--emit-matches",
        "--format",
        "json",
        "--fail-on-diff",
    ]);

    assert_eq!(cli.args.format, OutputFormat::Json);
    assert!(cli.args.fail_on_diff);

    let options = diff_options(&cli.args).unwrap();
    assert_eq!(options.progress_interval, Duration::from_secs(5));
    assert!(options.emit_matches);
}

#[test]
fn test_bad_progress_interval_is_reported() {
    let cli = IdsCli::parse_from([
        "compare-ids",
        "-a",
        "a:1",
        "-b",
        "b:1",
        "-n",
        "t.c",
        "--progress-interval",
        "often",
    ]);

    let err = diff_options(&cli.args).unwrap_err();
    assert!(format!("{err:#}").contains("often"));
}

#[test]
fn test_compare_dbs_endpoints() {
    let cli = DbsCli::parse_from([
        "compare-ids",
        "--database",
        "config",
        "--endpoint",
        "cfg1:27019,cfg2:27019",
        "--endpoint",
        "cfg3:27019",
    ]);

    assert_eq!(cli.args.database, "config");
    assert_eq!(
        cli.args.endpoints,
        vec!["cfg1:27019", "cfg2:27019", "cfg3:27019"]
    );
}
