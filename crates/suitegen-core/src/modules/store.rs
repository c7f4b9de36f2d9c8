//! Cached oracle output, one plain-text record per fixture.
//!
//! A record lives at `<store_dir>/<fixture_file_name>.<extension>` and holds
//! the oracle's stdout+stderr verbatim. Records are replaced whole through a
//! temp file in the same directory, so a reader never sees a partial record.

use super::corpus::FixtureCorpus;
use super::traits::OracleRunner;
use crate::domain::{ExpectationRecord, Fixture, OracleFailure, OracleOutput, SuiteError};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ExpectationStore {
    directory: PathBuf,
    extension: String,
}

impl ExpectationStore {
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            extension: extension.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, fixture: &Fixture) -> PathBuf {
        self.directory
            .join(format!("{}.{}", fixture.file_name, self.extension))
    }

    pub fn contains(&self, fixture: &Fixture) -> bool {
        self.path_for(fixture).is_file()
    }

    pub fn read(&self, fixture: &Fixture) -> Result<Option<ExpectationRecord>, StoreError> {
        let path = self.path_for(fixture);
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(Some(ExpectationRecord::loaded(
            fixture.file_name.clone(),
            String::from_utf8_lossy(&bytes).into_owned(),
        )))
    }

    pub fn ensure_directory(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.directory).map_err(|source| StoreError::CreateDirectory {
            path: self.directory.clone(),
            source,
        })
    }

    /// Replaces the record for `fixture` with `text`.
    pub fn write(&self, fixture: &Fixture, text: &str) -> Result<PathBuf, StoreError> {
        let path = self.path_for(fixture);
        write_atomically(&self.directory, &path, text.as_bytes()).map_err(|source| {
            StoreError::Write {
                path: path.clone(),
                source,
            }
        })?;
        Ok(path)
    }

    /// Number of record files present, whether or not a fixture still owns them.
    pub fn record_count(&self) -> Result<usize, StoreError> {
        if !self.directory.is_dir() {
            return Ok(0);
        }
        let entries = fs::read_dir(&self.directory).map_err(|source| StoreError::Read {
            path: self.directory.clone(),
            source,
        })?;

        let mut count = 0;
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Read {
                path: self.directory.clone(),
                source,
            })?;
            let path = entry.path();
            let has_extension = path
                .extension()
                .is_some_and(|extension| extension == self.extension.as_str());
            if has_extension && path.is_file() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Reads every record owned by `corpus` once, so classification and
    /// statistics within one run see the same store state.
    pub fn snapshot(&self, corpus: &FixtureCorpus) -> Result<StoreSnapshot, StoreError> {
        let mut records = BTreeMap::new();
        for fixture in corpus.fixtures() {
            if let Some(record) = self.read(fixture)? {
                records.insert(fixture.file_name.clone(), record);
            }
        }
        Ok(StoreSnapshot { records })
    }

    /// Ensures every fixture of `corpus` has a record, invoking `oracle` on a
    /// miss or for every fixture when `force` is set.
    ///
    /// Oracle failures become `Error` outcomes and never stop the batch. Only
    /// an unusable store directory or a failed record write aborts the run.
    pub fn refresh(
        &self,
        corpus: &FixtureCorpus,
        oracle: &dyn OracleRunner,
        force: bool,
    ) -> Result<RefreshReport, StoreError> {
        self.ensure_directory()?;

        let mut report = RefreshReport::default();
        for fixture in corpus.fixtures() {
            if !force && self.contains(fixture) {
                debug!(fixture = %fixture.file_name, "expectation already cached");
                report.push(FileOutcome {
                    file_name: fixture.file_name.clone(),
                    status: RefreshStatus::Skipped,
                    message: "Already exists".to_string(),
                });
                continue;
            }

            let output = oracle.run(&fixture.path);
            let record = ExpectationRecord::captured(fixture.file_name.clone(), &output);
            self.write(fixture, &record.text)?;

            let outcome = if output.success {
                FileOutcome {
                    file_name: fixture.file_name.clone(),
                    status: RefreshStatus::Success,
                    message: "Generated".to_string(),
                }
            } else {
                FileOutcome {
                    file_name: fixture.file_name.clone(),
                    status: RefreshStatus::Error,
                    message: failure_message(&output),
                }
            };
            debug!(
                fixture = %fixture.file_name,
                status = %outcome.status,
                "expectation captured"
            );
            report.push(outcome);
        }

        info!(
            processed = report.processed,
            success = report.success,
            errors = report.errors,
            skipped = report.skipped,
            "expectation refresh finished"
        );
        Ok(report)
    }
}

fn failure_message(output: &OracleOutput) -> String {
    match (&output.failure, output.exit_code) {
        (Some(OracleFailure::TimedOut { .. }), _) => "Timed out".to_string(),
        (Some(OracleFailure::LaunchFailed { reason }), _) => format!("Launch failed: {reason}"),
        (None, Some(code)) => format!("Exit code: {code}"),
        (None, None) => "Oracle did not exit normally".to_string(),
    }
}

/// Records of one corpus, read at a single point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    records: BTreeMap<String, ExpectationRecord>,
}

impl StoreSnapshot {
    pub fn get(&self, file_name: &str) -> Option<&ExpectationRecord> {
        self.records.get(file_name)
    }

    pub fn text_for(&self, file_name: &str) -> Option<&str> {
        self.get(file_name).map(|record| record.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn insert(&mut self, record: ExpectationRecord) {
        self.records.insert(record.fixture_name.clone(), record);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStatus {
    Skipped,
    Success,
    Error,
}

impl Display for RefreshStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Skipped => "skipped",
            Self::Success => "success",
            Self::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub file_name: String,
    pub status: RefreshStatus,
    pub message: String,
}

/// Outcome of one refresh pass; `files` follows corpus order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub processed: usize,
    pub success: usize,
    pub errors: usize,
    pub skipped: usize,
    pub files: Vec<FileOutcome>,
}

impl RefreshReport {
    fn push(&mut self, outcome: FileOutcome) {
        match outcome.status {
            RefreshStatus::Skipped => self.skipped += 1,
            RefreshStatus::Success => {
                self.processed += 1;
                self.success += 1;
            }
            RefreshStatus::Error => {
                self.processed += 1;
                self.errors += 1;
            }
        }
        self.files.push(outcome);
    }
}

pub fn render_refresh_summary(report: &RefreshReport, verbose: bool) -> String {
    let mut lines = vec![format!("Processed {} files", report.processed)];
    if report.success > 0 {
        lines.push(format!(
            "Set expectations for {} successes",
            report.success
        ));
    }
    if report.errors > 0 {
        lines.push(format!("Set expectations for {} errors", report.errors));
    }
    if report.skipped > 0 {
        lines.push(format!("Skipped {} cached files", report.skipped));
    }

    if verbose {
        for file in &report.files {
            lines.push(format!(
                "  {} [{}] - {}",
                file.file_name, file.status, file.message
            ));
        }
    }

    lines.join("\n")
}

pub(crate) fn write_atomically(
    directory: &Path,
    target: &Path,
    bytes: &[u8],
) -> std::io::Result<()> {
    fs::create_dir_all(directory)?;
    let mut staged = NamedTempFile::new_in(directory)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(target).map_err(|error| error.error)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create expectation directory '{}': {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read expectation '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write expectation '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<StoreError> for SuiteError {
    fn from(error: StoreError) -> Self {
        let message = error.to_string();
        match error {
            StoreError::CreateDirectory { .. } => {
                SuiteError::io_system("IO.EXPECTATION_DIRECTORY", message)
            }
            StoreError::Read { .. } => SuiteError::io_system("IO.EXPECTATION_READ", message),
            StoreError::Write { .. } => SuiteError::io_system("IO.EXPECTATION_WRITE", message),
        }
    }
}
