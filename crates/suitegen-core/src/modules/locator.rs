use super::traits::OracleLocator;
use crate::common::constants::{ORACLE_CANDIDATE_DIRS, ORACLE_CANDIDATE_NAMES};
use crate::domain::SuiteError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Finds the oracle executable: explicit override, environment override,
/// conventional build locations under the root, then `PATH`.
#[derive(Debug, Clone)]
pub struct SearchLocator {
    explicit: Option<PathBuf>,
    environment: Option<PathBuf>,
    root: PathBuf,
    search_path: bool,
}

impl SearchLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            explicit: None,
            environment: None,
            root: root.into(),
            search_path: true,
        }
    }

    pub fn with_explicit(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    pub fn with_environment(mut self, path: Option<PathBuf>) -> Self {
        self.environment = path;
        self
    }

    pub fn without_path_search(mut self) -> Self {
        self.search_path = false;
        self
    }

    pub fn candidates(&self) -> Vec<PathBuf> {
        ORACLE_CANDIDATE_DIRS
            .iter()
            .flat_map(|dir| {
                ORACLE_CANDIDATE_NAMES
                    .iter()
                    .map(move |name| self.root.join(dir).join(name))
            })
            .collect()
    }
}

impl OracleLocator for SearchLocator {
    fn locate(&self) -> Result<PathBuf, LocatorError> {
        if let Some(path) = &self.explicit {
            return if path.is_file() {
                Ok(path.clone())
            } else {
                Err(LocatorError::OverrideMissing { path: path.clone() })
            };
        }

        if let Some(path) = self.environment.as_ref().filter(|path| path.is_file()) {
            debug!(path = %path.display(), "oracle taken from environment");
            return Ok(path.clone());
        }

        let candidates = self.candidates();
        if let Some(found) = candidates.iter().find(|candidate| candidate.is_file()) {
            return Ok(normalize(found));
        }

        if self.search_path {
            for name in ORACLE_CANDIDATE_NAMES {
                if let Ok(found) = which::which(name) {
                    debug!(path = %found.display(), "oracle found on PATH");
                    return Ok(found);
                }
            }
        }

        Err(LocatorError::NotFound {
            searched: candidates,
        })
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    #[error("oracle executable override '{}' does not exist", path.display())]
    OverrideMissing { path: PathBuf },
    #[error("oracle executable not found; searched: {}", render_searched(searched))]
    NotFound { searched: Vec<PathBuf> },
}

fn render_searched(searched: &[PathBuf]) -> String {
    let mut locations: Vec<String> = searched
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    locations.push("PATH".to_string());
    locations.join(", ")
}

impl From<LocatorError> for SuiteError {
    fn from(error: LocatorError) -> Self {
        SuiteError::input_validation("INPUT.ORACLE_NOT_FOUND", error.to_string())
    }
}
