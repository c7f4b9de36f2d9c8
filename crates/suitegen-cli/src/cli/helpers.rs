use super::{CliError, GlobalArgs};
use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;
use suitegen_core::common::SuiteConfig;
use suitegen_core::common::constants::ORACLE_ENV_VAR;
use suitegen_core::modules::locator::SearchLocator;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr so reports on stdout stay machine-readable.
pub(super) fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn load_suite_config(global: &GlobalArgs) -> Result<SuiteConfig, CliError> {
    let root = match &global.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    SuiteConfig::load(root, global.config.as_deref())
        .map_err(|error| CliError::Suite(error.into()))
}

pub(super) fn apply_oracle_overrides(
    config: &mut SuiteConfig,
    oracle: Option<&PathBuf>,
    timeout_secs: Option<u64>,
) {
    if let Some(path) = oracle {
        config.oracle_executable = Some(config.resolve(path));
    }
    if let Some(seconds) = timeout_secs {
        config.oracle_timeout = Duration::from_secs(seconds);
    }
}

pub(super) fn build_locator(config: &SuiteConfig) -> SearchLocator {
    let environment = std::env::var_os(ORACLE_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from);
    SearchLocator::new(config.root.clone())
        .with_explicit(config.oracle_executable.clone())
        .with_environment(environment)
}
