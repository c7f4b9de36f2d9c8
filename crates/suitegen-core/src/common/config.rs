//! Explicitly constructed pipeline configuration.
//!
//! Nothing below the CLI discovers paths on its own: every component receives
//! a [`SuiteConfig`] built from a root directory, an optional JSON overlay and
//! command-line overrides.

use super::constants::{
    CONFIG_FILE_NAME, DEFAULT_ACCEPTED_EXIT_CODES, DEFAULT_EXPECTATION_EXTENSION,
    DEFAULT_FIXTURE_PATTERN, DEFAULT_ORACLE_TIMEOUT_SECS, EXPECTATIONS_RELATIVE_DIR,
    FIXTURES_RELATIVE_DIR, SUITE_RELATIVE_PATH,
};
use crate::domain::SuiteError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteConfig {
    pub root: PathBuf,
    pub fixtures_dir: PathBuf,
    pub expectations_dir: PathBuf,
    pub output_path: PathBuf,
    pub template_path: Option<PathBuf>,
    pub fixture_pattern: String,
    pub expectation_extension: String,
    pub accepted_exit_codes: Vec<i32>,
    pub oracle_timeout: Duration,
    pub oracle_executable: Option<PathBuf>,
}

impl SuiteConfig {
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            fixtures_dir: root.join(FIXTURES_RELATIVE_DIR),
            expectations_dir: root.join(EXPECTATIONS_RELATIVE_DIR),
            output_path: root.join(SUITE_RELATIVE_PATH),
            template_path: None,
            fixture_pattern: DEFAULT_FIXTURE_PATTERN.to_string(),
            expectation_extension: DEFAULT_EXPECTATION_EXTENSION.to_string(),
            accepted_exit_codes: DEFAULT_ACCEPTED_EXIT_CODES.to_vec(),
            oracle_timeout: Duration::from_secs(DEFAULT_ORACLE_TIMEOUT_SECS),
            oracle_executable: None,
            root,
        }
    }

    /// Builds the conventional layout for `root`, then applies `config_path`
    /// (or `<root>/suitegen.json` when it exists).
    pub fn load(root: impl Into<PathBuf>, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::for_root(root);
        let overlay_path = match config_path {
            Some(path) => Some(config.resolve(path)),
            None => {
                let default_path = config.root.join(CONFIG_FILE_NAME);
                default_path.is_file().then_some(default_path)
            }
        };

        if let Some(path) = overlay_path {
            let overlay = ConfigOverlay::read(&path)?;
            config.apply(overlay);
        }
        Ok(config)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn apply(&mut self, overlay: ConfigOverlay) {
        if let Some(path) = overlay.fixtures_dir {
            self.fixtures_dir = self.resolve(&path);
        }
        if let Some(path) = overlay.expectations_dir {
            self.expectations_dir = self.resolve(&path);
        }
        if let Some(path) = overlay.output_path {
            self.output_path = self.resolve(&path);
        }
        if let Some(path) = overlay.template_path {
            self.template_path = Some(self.resolve(&path));
        }
        if let Some(pattern) = overlay.fixture_pattern {
            self.fixture_pattern = pattern;
        }
        if let Some(extension) = overlay.expectation_extension {
            self.expectation_extension = extension;
        }
        if let Some(codes) = overlay.accepted_exit_codes {
            self.accepted_exit_codes = codes;
        }
        if let Some(seconds) = overlay.oracle_timeout_secs {
            self.oracle_timeout = Duration::from_secs(seconds);
        }
        if let Some(path) = overlay.oracle_executable {
            self.oracle_executable = Some(self.resolve(&path));
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigOverlay {
    fixtures_dir: Option<PathBuf>,
    expectations_dir: Option<PathBuf>,
    output_path: Option<PathBuf>,
    template_path: Option<PathBuf>,
    fixture_pattern: Option<String>,
    expectation_extension: Option<String>,
    accepted_exit_codes: Option<Vec<i32>>,
    oracle_timeout_secs: Option<u64>,
    oracle_executable: Option<PathBuf>,
}

impl ConfigOverlay {
    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<ConfigError> for SuiteError {
    fn from(error: ConfigError) -> Self {
        let message = error.to_string();
        match error {
            ConfigError::Read { .. } => SuiteError::io_system("IO.CONFIG_READ", message),
            ConfigError::Parse { .. } => SuiteError::input_validation("INPUT.CONFIG_PARSE", message),
        }
    }
}
