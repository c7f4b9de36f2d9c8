use super::helpers::{apply_oracle_overrides, build_locator, load_suite_config};
use super::{CliError, GlobalArgs};
use anyhow::Context;
use std::path::PathBuf;
use suitegen_core::modules::SystemClock;
use suitegen_core::modules::generator::render_generation_summary;
use suitegen_core::modules::pipeline::SuitePipeline;
use suitegen_core::modules::status::{SuiteStatus, render_status};
use suitegen_core::modules::store::{RefreshReport, render_refresh_summary};
use tracing::info;

#[derive(clap::Args)]
pub(super) struct OracleFlags {
    /// Oracle executable, overriding the environment and search locations
    #[arg(long)]
    oracle: Option<PathBuf>,

    /// Seconds before an oracle invocation is killed
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(clap::Args)]
pub(super) struct ExpectationsArgs {
    /// Re-capture every fixture, replacing cached records
    #[arg(long)]
    force: bool,

    #[command(flatten)]
    oracle: OracleFlags,
}

#[derive(clap::Args)]
pub(super) struct GenerateArgs {
    #[command(flatten)]
    oracle: OracleFlags,
}

#[derive(clap::Args)]
pub(super) struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    oracle: OracleFlags,
}

pub(super) fn run_expectations_command(
    global: &GlobalArgs,
    args: ExpectationsArgs,
) -> Result<i32, CliError> {
    let pipeline = build_pipeline(global, &args.oracle)?;
    let report = refresh(&pipeline, args.force)?;
    println!("{}", render_refresh_summary(&report, global.verbose));
    Ok(0)
}

pub(super) fn run_generate_command(
    global: &GlobalArgs,
    args: GenerateArgs,
) -> Result<i32, CliError> {
    let pipeline = build_pipeline(global, &args.oracle)?;
    pipeline.corpus()?;

    if !pipeline.has_expectations()? {
        println!("No expectations found. Generating first...");
        let report = refresh(&pipeline, false)?;
        println!("{}", render_refresh_summary(&report, global.verbose));
    }

    generate(&pipeline)
}

pub(super) fn run_setup_command(
    global: &GlobalArgs,
    args: ExpectationsArgs,
) -> Result<i32, CliError> {
    let pipeline = build_pipeline(global, &args.oracle)?;
    let report = refresh(&pipeline, args.force)?;
    println!("{}", render_refresh_summary(&report, global.verbose));
    generate(&pipeline)
}

pub(super) fn run_status_command(global: &GlobalArgs, args: StatusArgs) -> Result<i32, CliError> {
    let pipeline = build_pipeline(global, &args.oracle)?;
    let locator = build_locator(pipeline.config());
    let status = SuiteStatus::collect(&pipeline, &locator)?;

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&status).context("failed to serialize suite status")?;
        println!("{rendered}");
    } else {
        println!("{}", render_status(&status));
    }
    Ok(0)
}

fn build_pipeline(global: &GlobalArgs, oracle: &OracleFlags) -> Result<SuitePipeline, CliError> {
    let mut config = load_suite_config(global)?;
    apply_oracle_overrides(&mut config, oracle.oracle.as_ref(), oracle.timeout_secs);
    Ok(SuitePipeline::new(config))
}

fn refresh(pipeline: &SuitePipeline, force: bool) -> Result<RefreshReport, CliError> {
    pipeline.corpus()?;
    let locator = build_locator(pipeline.config());
    let oracle = pipeline.process_oracle(&locator)?;
    info!(oracle = %oracle.executable().display(), force, "refreshing expectations");
    Ok(pipeline.refresh_expectations(&oracle, force)?)
}

fn generate(pipeline: &SuitePipeline) -> Result<i32, CliError> {
    let renderer = pipeline.renderer()?;
    let report = pipeline.generate(&renderer, &SystemClock)?;
    println!("{}", render_generation_summary(&report));
    Ok(0)
}
