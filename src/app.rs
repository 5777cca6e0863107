//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs logging
//! - parses CLI arguments
//! - resolves the run configuration and rule book
//! - runs one check and hands its report to the pipeline

use std::env;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::checks::processors::ProcessorOptions;
use crate::checks::{
    categories, category_values, columns, dimm_ranks, group, mapping, numeric, part_number, processors, text_columns,
};
use crate::cli::{Cli, Command, GlobalArgs, ProcessorsArgs};
use crate::domain::RunConfig;
use crate::error::AppError;
use crate::report::CheckReport;
use crate::rules::RuleBook;

pub mod pipeline;

/// Fallback for `--out-dir`.
pub const ENV_OUT_DIR: &str = "CATCHECK_OUT_DIR";
/// Fallback for `--rules`.
pub const ENV_RULES: &str = "CATCHECK_RULES";

/// Entry point for the `catcheck` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let config = run_config_from_args(&cli.global);
    let rules = RuleBook::load(config.rules_path.as_deref())?;
    let report = run_check(cli.command, &rules)?;
    pipeline::finish(&config, report)?;
    Ok(())
}

/// Load the input(s) for `command` and run its check.
///
/// Row errors met while loading end up in the report's notes.
pub fn run_check(command: Command, rules: &RuleBook) -> Result<CheckReport, AppError> {
    let mut loader = pipeline::Loader::default();
    let mut report = dispatch(command, rules, &mut loader)?;
    loader.annotate(&mut report);
    Ok(report)
}

fn dispatch(command: Command, rules: &RuleBook, loader: &mut pipeline::Loader) -> Result<CheckReport, AppError> {
    match command {
        Command::PartNumber(args) => {
            let validator = rules.validator(&args.format)?;
            let table = loader.load(&args.input.input)?;
            part_number::run(&table, &args.column, &validator, Some(args.context.as_str()))
        }
        Command::DimmRanks(args) => dimm_ranks::run_groups(&loader.load(&args.input)?),
        Command::DimmRanksRows(args) => dimm_ranks::run_rows(&loader.load(&args.input)?),
        Command::ServerDimmRanks(args) => dimm_ranks::run_server(&loader.load(&args.input)?),
        Command::Numeric(args) => numeric::run(&loader.load(&args.input.input)?, &args.columns),
        Command::Columns(args) => {
            let table = loader.load(&args.input.input)?;
            columns::run(&table, args.brand.as_deref(), rules)
        }
        Command::Categories(args) => categories::run(&loader.load(&args.input)?, rules),
        Command::CategoryValues(args) => {
            let table = loader.load(&args.input.input)?;
            category_values::run(&table, rules, args.require_all)
        }
        Command::Text(args) => {
            let table = loader.load(&args.input.input)?;
            text_columns::run(&table, &args.columns, args.rule)
        }
        Command::Processors(args) => {
            let reference = loader.load(&args.reference)?;
            let input = loader.load(&args.input)?;
            processors::run(&reference, &input, &processor_options(&args))
        }
        Command::Group(args) => {
            let table = loader.load(&args.input.input)?;
            group::run(&table, args.key.as_deref(), args.values.as_deref())
        }
        Command::Mapping(args) => {
            let source = loader.load(&args.input)?;
            let destination = loader.load(&args.destination)?;
            mapping::run(&source, &destination)
        }
    }
}

/// Flags first, then the environment (`.env` included), then defaults.
pub fn run_config_from_args(args: &GlobalArgs) -> RunConfig {
    let defaults = RunConfig::default();
    RunConfig {
        out_dir: args
            .out_dir
            .clone()
            .or_else(|| env_path(ENV_OUT_DIR))
            .unwrap_or(defaults.out_dir),
        rules_path: args.rules.clone().or_else(|| env_path(ENV_RULES)),
        strict: args.strict,
        summary_json: args.summary_json.clone(),
    }
}

pub fn processor_options(args: &ProcessorsArgs) -> ProcessorOptions {
    ProcessorOptions {
        vendor: args.vendor.clone(),
        reference_key: args.reference_key.clone(),
        reference_list: args.reference_list.clone(),
        input_key: args.input_key.clone(),
        input_list: args.input_list.clone(),
        key_style: args.key_style,
        fail_on_extra: args.fail_on_extra,
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Diagnostics go to stderr so stdout stays the summary.
fn init_tracing(verbose: bool) {
    let default = if verbose { "catalog_checks=info" } else { "catalog_checks=warn" };
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::InputArgs;
    use std::path::Path;

    #[test]
    fn flags_win_over_defaults() {
        let args = GlobalArgs {
            out_dir: Some(PathBuf::from("out")),
            rules: Some(PathBuf::from("rules.json")),
            strict: true,
            summary_json: Some(PathBuf::from("s.json")),
            verbose: false,
        };
        let cfg = run_config_from_args(&args);
        assert_eq!(cfg.out_dir, PathBuf::from("out"));
        assert_eq!(cfg.rules_path.as_deref(), Some(Path::new("rules.json")));
        assert!(cfg.strict);
        assert_eq!(cfg.summary_json, Some(PathBuf::from("s.json")));
    }

    #[test]
    fn run_check_dispatches_to_the_named_check() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("06052025_cisco_db_import.csv");
        std::fs::write(&input, "store,category\ncisco,memory\ncisco,ssd\ncisco,hdd\n").unwrap();

        let report = run_check(
            Command::Categories(InputArgs { input: input.clone() }),
            &RuleBook::builtin(),
        )
        .unwrap();
        assert_eq!(report.check, "categories");
        assert_eq!(report.tally.pass, 1);
    }

    #[test]
    fn undecodable_rows_are_checked_in_place_and_noted() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cisco.csv");
        std::fs::write(
            &input,
            b"option_part_no,ranks,rank_width,dimm_ranks\nUCS-A,1,4,1Rx4\nUCS-\xAE,2,8,1Rx4\nUCS-C,1,4,1Rx4\n",
        )
        .unwrap();

        let report = run_check(
            Command::DimmRanksRows(InputArgs { input: input.clone() }),
            &RuleBook::builtin(),
        )
        .unwrap();
        let out = report.table(dimm_ranks::ROW_REPORT_FILE).unwrap();
        assert_eq!(out.rows.len(), 3);
        assert_eq!(out.value(1, "status"), Some("FAIL"));
        assert_eq!(out.value(1, "expected"), Some("2Rx8"));
        assert_eq!(out.value(2, "option_part_no"), Some("UCS-C"));
        assert_eq!(out.value(2, "status"), Some("PASS"));
        assert_eq!(report.failures, vec!["UCS-\u{fffd}(row 1)"]);
        assert!(report.failed(false));
        assert_eq!(report.notes.len(), 1);
        assert!(report.notes[0].contains("line 3"));
        assert!(report.notes[0].contains("U+FFFD"));
    }

    #[test]
    fn mapping_reads_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("acer_mapping.csv");
        let destination = dir.path().join("acer_servers.csv");
        std::fs::write(&source, "option_part_no,server_description,processor\nKN.1,Altos,AMD EPYC 7003\n").unwrap();
        std::fs::write(
            &destination,
            "option_part_no,server_description,chipset,all_amd_processor\nKN.1,Altos,,AMD EPYC 7003\n",
        )
        .unwrap();

        let report = run_check(
            Command::Mapping(crate::cli::MappingArgs { input: source, destination }),
            &RuleBook::builtin(),
        )
        .unwrap();
        assert_eq!(report.check, "mapping");
        assert_eq!(report.tally.pass, 1);
        assert!(report.notes.is_empty());
    }

    #[test]
    fn unknown_format_fails_before_loading() {
        let args = crate::cli::PartNumberArgs {
            input: InputArgs {
                input: PathBuf::from("does-not-exist.csv"),
            },
            column: "option_part_no".to_string(),
            format: "nope".to_string(),
            context: "A".to_string(),
        };
        let err = run_check(Command::PartNumber(args), &RuleBook::builtin()).unwrap_err();
        assert!(err.message().starts_with("Unknown format `nope`"));
    }
}
