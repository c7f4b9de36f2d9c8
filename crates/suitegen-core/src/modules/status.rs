use super::corpus::FixtureCorpus;
use super::pipeline::SuitePipeline;
use super::statistics::collect_statistics;
use super::traits::OracleLocator;
use crate::common::constants::TIMESTAMP_FORMAT;
use crate::domain::{Statistics, SuiteResult};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteStatus {
    pub root: String,
    pub fixtures_dir: String,
    pub fixture_count: Option<usize>,
    pub expectation_count: usize,
    pub statistics: Option<Statistics>,
    pub oracle: OracleStatus,
    pub suite_file: Option<SuiteFileStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OracleStatus {
    Found {
        path: String,
        launchable: bool,
        version: Option<String>,
    },
    Missing {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteFileStatus {
    pub path: String,
    pub size_bytes: u64,
    pub modified: Option<String>,
}

impl SuiteStatus {
    /// Read-only snapshot of every pipeline component. A missing corpus is
    /// reported, not raised.
    pub fn collect(pipeline: &SuitePipeline, locator: &dyn OracleLocator) -> SuiteResult<Self> {
        let config = pipeline.config();
        let corpus = FixtureCorpus::scan(&config.fixtures_dir, &config.fixture_pattern).ok();
        let statistics = match &corpus {
            Some(corpus) if !corpus.is_empty() => Some(collect_statistics(
                corpus,
                pipeline.store(),
                pipeline.policy(),
            )?),
            _ => None,
        };

        let oracle = match pipeline.process_oracle(locator) {
            Ok(oracle) => {
                let launchable = oracle.probe();
                OracleStatus::Found {
                    path: normalize_path(oracle.executable()),
                    launchable,
                    version: launchable.then(|| oracle.version()).flatten(),
                }
            }
            Err(error) => OracleStatus::Missing {
                reason: error.message().to_string(),
            },
        };

        Ok(Self {
            root: normalize_path(&config.root),
            fixtures_dir: normalize_path(&config.fixtures_dir),
            fixture_count: corpus.as_ref().map(FixtureCorpus::len),
            expectation_count: pipeline.store().record_count()?,
            statistics,
            oracle,
            suite_file: suite_file_status(&config.output_path),
        })
    }
}

fn suite_file_status(path: &Path) -> Option<SuiteFileStatus> {
    let metadata = fs::metadata(path).ok().filter(fs::Metadata::is_file)?;
    let modified = metadata.modified().ok().map(|time| {
        DateTime::<Local>::from(time)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    });
    Some(SuiteFileStatus {
        path: normalize_path(path),
        size_bytes: metadata.len(),
        modified,
    })
}

pub fn render_status(status: &SuiteStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Repository: {}", status.root);

    match &status.oracle {
        OracleStatus::Found {
            path,
            launchable,
            version,
        } => {
            let _ = writeln!(out, "Oracle: {path}");
            let _ = writeln!(
                out,
                "  Launchable: {}",
                if *launchable { "yes" } else { "no" }
            );
            if let Some(version) = version {
                let _ = writeln!(out, "  Version: {version}");
            }
        }
        OracleStatus::Missing { reason } => {
            let _ = writeln!(out, "Oracle: not found ({reason})");
        }
    }

    match status.fixture_count {
        Some(count) => {
            let _ = writeln!(out, "Fixtures: {count} in {}", status.fixtures_dir);
        }
        None => {
            let _ = writeln!(out, "Fixtures: missing from {}", status.fixtures_dir);
        }
    }
    let _ = writeln!(out, "Expectations: {} captured", status.expectation_count);

    if let Some(statistics) = &status.statistics {
        let _ = writeln!(out, "Categories:");
        let _ = writeln!(out, "  Valid: {}", statistics.valid);
        let _ = writeln!(out, "  Invalid: {}", statistics.invalid);
        let _ = writeln!(out, "  Warning: {}", statistics.warning);
        if statistics.unknown > 0 {
            let _ = writeln!(out, "  Unknown: {}", statistics.unknown);
        }
    }

    match &status.suite_file {
        Some(file) => {
            let _ = writeln!(out, "Test suite: {}", file.path);
            let _ = writeln!(out, "  Size: {} bytes", file.size_bytes);
            if let Some(modified) = &file.modified {
                let _ = writeln!(out, "  Modified: {modified}");
            }
        }
        None => {
            let _ = writeln!(out, "Test suite: not generated");
        }
    }

    out.trim_end().to_string()
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::{OracleStatus, SuiteStatus, render_status};
    use crate::common::SuiteConfig;
    use crate::modules::locator::SearchLocator;
    use crate::modules::pipeline::SuitePipeline;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn status_reports_missing_pieces_without_failing() {
        let temp = TempDir::new().expect("tempdir should be created");
        let pipeline = SuitePipeline::new(SuiteConfig::for_root(temp.path()));
        let locator = SearchLocator::new(temp.path()).without_path_search();

        let status = SuiteStatus::collect(&pipeline, &locator).expect("status");
        assert_eq!(status.fixture_count, None);
        assert_eq!(status.expectation_count, 0);
        assert!(status.statistics.is_none());
        assert!(status.suite_file.is_none());
        assert!(matches!(status.oracle, OracleStatus::Missing { .. }));

        let rendered = render_status(&status);
        assert!(rendered.contains("Fixtures: missing from"));
        assert!(rendered.contains("Test suite: not generated"));
    }

    #[test]
    fn status_reports_counts_and_suite_metadata() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = SuiteConfig::for_root(temp.path());
        fs::create_dir_all(&config.fixtures_dir).expect("fixture dir");
        fs::create_dir_all(&config.expectations_dir).expect("store dir");
        fs::create_dir_all(config.output_path.parent().expect("parent")).expect("suite dir");
        fs::write(config.fixtures_dir.join("a.png"), b"x").expect("fixture");
        fs::write(config.fixtures_dir.join("b.png"), b"x").expect("fixture");
        fs::write(config.expectations_dir.join("a.png.out"), "ERROR: bad").expect("record");
        fs::write(&config.output_path, "suite body").expect("suite");

        let pipeline = SuitePipeline::new(config);
        let locator = SearchLocator::new(temp.path()).without_path_search();
        let status = SuiteStatus::collect(&pipeline, &locator).expect("status");

        assert_eq!(status.fixture_count, Some(2));
        assert_eq!(status.expectation_count, 1);
        let statistics = status.statistics.expect("statistics");
        assert_eq!(statistics.invalid, 1);
        assert_eq!(statistics.unknown, 1);
        let suite = status.suite_file.expect("suite metadata");
        assert_eq!(suite.size_bytes, 10);
        assert!(suite.modified.is_some());

        let json = serde_json::to_value(SuiteStatus::collect(&pipeline, &locator).expect("status"))
            .expect("status should serialize");
        assert_eq!(json["oracle"]["state"], "missing");
        assert_eq!(json["statistics"]["total"], 2);
    }
}
