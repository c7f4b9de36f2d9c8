pub mod errors;

pub use errors::{SuiteError, SuiteErrorCategory, SuiteResult};

use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Quality tag derived from a fixture's captured oracle output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Valid,
    Invalid,
    Warning,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Valid,
        Category::Invalid,
        Category::Warning,
        Category::Unknown,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Warning => "warning",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// One input file of the corpus. Never mutated after discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub path: PathBuf,
    pub file_name: String,
    pub base_name: String,
    pub extension: Option<String>,
}

impl Fixture {
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let file_name = path.file_name()?.to_str()?.to_string();
        let base_name = Path::new(&file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&file_name)
            .to_string();
        let extension = Path::new(&file_name)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_string);

        Some(Self {
            path,
            file_name,
            base_name,
            extension,
        })
    }
}

/// Result of running the oracle against one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleOutput {
    /// stdout followed by stderr, verbatim.
    pub text: String,
    /// `None` when the process could not be launched or was killed.
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Why the process produced no exit status, when it did not.
    pub failure: Option<OracleFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleFailure {
    TimedOut { after: Duration },
    LaunchFailed { reason: String },
}

/// Cached oracle output for one fixture.
///
/// Records read back from the store only carry `text`; the exit code and
/// verdict exist for records produced in the current capture pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectationRecord {
    pub fixture_name: String,
    pub text: String,
    pub exit_code: Option<i32>,
    pub success: Option<bool>,
}

impl ExpectationRecord {
    pub fn captured(fixture_name: impl Into<String>, output: &OracleOutput) -> Self {
        Self {
            fixture_name: fixture_name.into(),
            text: output.text.clone(),
            exit_code: output.exit_code,
            success: Some(output.success),
        }
    }

    pub fn loaded(fixture_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            fixture_name: fixture_name.into(),
            text: text.into(),
            exit_code: None,
            success: None,
        }
    }
}

/// Per-fixture view model handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRecord {
    pub test_name: String,
    pub filename: String,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Statistics {
    pub valid: usize,
    pub invalid: usize,
    pub warning: usize,
    pub unknown: usize,
    pub total: usize,
}

impl Statistics {
    pub fn record(&mut self, category: Category) {
        match category {
            Category::Valid => self.valid += 1,
            Category::Invalid => self.invalid += 1,
            Category::Warning => self.warning += 1,
            Category::Unknown => self.unknown += 1,
        }
        self.total += 1;
    }

    pub const fn count(&self, category: Category) -> usize {
        match category {
            Category::Valid => self.valid,
            Category::Invalid => self.invalid,
            Category::Warning => self.warning,
            Category::Unknown => self.unknown,
        }
    }
}
