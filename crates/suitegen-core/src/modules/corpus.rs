use crate::domain::{Fixture, SuiteError};
use globset::{Glob, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fixtures of one directory, ordered lexicographically by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureCorpus {
    directory: PathBuf,
    fixtures: Vec<Fixture>,
}

impl FixtureCorpus {
    pub fn scan(directory: impl AsRef<Path>, pattern: &str) -> Result<Self, CorpusError> {
        let directory = directory.as_ref();
        let matcher = compile_pattern(pattern)?;

        if !directory.is_dir() {
            return Err(CorpusError::Missing {
                path: directory.to_path_buf(),
            });
        }

        let entries = fs::read_dir(directory).map_err(|source| CorpusError::ReadDirectory {
            path: directory.to_path_buf(),
            source,
        })?;

        let mut fixtures = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CorpusError::ReadDirectory {
                path: directory.to_path_buf(),
                source,
            })?;
            let file_type = entry
                .file_type()
                .map_err(|source| CorpusError::ReadDirectory {
                    path: entry.path(),
                    source,
                })?;
            if !file_type.is_file() {
                continue;
            }

            let file_name = entry.file_name();
            if !matcher.is_match(Path::new(&file_name)) {
                continue;
            }

            match Fixture::from_path(entry.path()) {
                Some(fixture) => fixtures.push(fixture),
                None => debug!(path = %entry.path().display(), "skipping non UTF-8 fixture name"),
            }
        }

        fixtures.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        debug!(
            directory = %directory.display(),
            count = fixtures.len(),
            "scanned fixture corpus"
        );

        Ok(Self {
            directory: directory.to_path_buf(),
            fixtures,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    pub fn require_non_empty(self) -> Result<Self, CorpusError> {
        if self.fixtures.is_empty() {
            return Err(CorpusError::Empty {
                path: self.directory,
            });
        }
        Ok(self)
    }
}

fn compile_pattern(pattern: &str) -> Result<GlobMatcher, CorpusError> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|source| CorpusError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("fixture directory '{}' does not exist", path.display())]
    Missing { path: PathBuf },
    #[error("no fixtures found in '{}'", path.display())]
    Empty { path: PathBuf },
    #[error("invalid fixture pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: globset::Error,
    },
    #[error("failed to read fixture directory '{}': {source}", path.display())]
    ReadDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<CorpusError> for SuiteError {
    fn from(error: CorpusError) -> Self {
        let message = error.to_string();
        match error {
            CorpusError::Missing { .. } | CorpusError::Empty { .. } => {
                SuiteError::input_validation("INPUT.FIXTURES_MISSING", message)
            }
            CorpusError::Pattern { .. } => {
                SuiteError::input_validation("INPUT.FIXTURE_PATTERN", message)
            }
            CorpusError::ReadDirectory { .. } => {
                SuiteError::io_system("IO.FIXTURE_DIRECTORY", message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CorpusError, FixtureCorpus};
    use crate::domain::SuiteError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn scan_filters_by_pattern_and_sorts_by_file_name() {
        let temp = TempDir::new().expect("tempdir should be created");
        for name in ["zeta.png", "alpha.png", "Beta.png", "notes.txt"] {
            fs::write(temp.path().join(name), b"x").expect("fixture should be written");
        }
        fs::create_dir(temp.path().join("nested.png")).expect("dir should be created");

        let corpus = FixtureCorpus::scan(temp.path(), "*.png").expect("scan should succeed");
        let names: Vec<&str> = corpus
            .fixtures()
            .iter()
            .map(|fixture| fixture.file_name.as_str())
            .collect();
        assert_eq!(names, ["Beta.png", "alpha.png", "zeta.png"]);
    }

    #[test]
    fn missing_directory_is_reported_as_fixtures_missing() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = FixtureCorpus::scan(temp.path().join("absent"), "*.png")
            .expect_err("scan should fail");
        assert!(matches!(error, CorpusError::Missing { .. }));
        assert_eq!(
            SuiteError::from(error).placeholder(),
            "INPUT.FIXTURES_MISSING"
        );
    }

    #[test]
    fn empty_corpus_is_rejected_only_on_request() {
        let temp = TempDir::new().expect("tempdir should be created");
        let corpus = FixtureCorpus::scan(temp.path(), "*.png").expect("scan should succeed");
        assert!(corpus.is_empty());

        let error = corpus.require_non_empty().expect_err("empty corpus");
        assert!(matches!(error, CorpusError::Empty { .. }));
    }

    #[test]
    fn malformed_pattern_is_rejected() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = FixtureCorpus::scan(temp.path(), "[").expect_err("pattern should fail");
        assert!(matches!(error, CorpusError::Pattern { .. }));
    }
}
