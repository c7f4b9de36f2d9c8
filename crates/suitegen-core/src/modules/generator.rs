use super::classifier::ClassificationPolicy;
use super::corpus::{CorpusError, FixtureCorpus};
use super::render::{RenderContext, RenderError};
use super::sanitizer::{IdentifierError, assign_identifiers};
use super::statistics::classify_fixtures;
use super::store::{ExpectationStore, StoreError, StoreSnapshot, write_atomically};
use super::traits::{Clock, SuiteRenderer};
use crate::common::constants::TIMESTAMP_FORMAT;
use crate::domain::{GenerationRecord, Statistics, SuiteError};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub output_path: PathBuf,
    pub statistics: Statistics,
    pub record_count: usize,
}

/// Renders the suite for a corpus and replaces the output file in one step.
pub struct SuiteGenerator<'a> {
    store: &'a ExpectationStore,
    policy: &'a ClassificationPolicy,
    renderer: &'a dyn SuiteRenderer,
    clock: &'a dyn Clock,
    output_path: PathBuf,
}

impl<'a> SuiteGenerator<'a> {
    pub fn new(
        store: &'a ExpectationStore,
        policy: &'a ClassificationPolicy,
        renderer: &'a dyn SuiteRenderer,
        clock: &'a dyn Clock,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            policy,
            renderer,
            clock,
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn generate(&self, corpus: &FixtureCorpus) -> Result<GenerationReport, GenerationError> {
        if corpus.is_empty() {
            return Err(CorpusError::Empty {
                path: corpus.directory().to_path_buf(),
            }
            .into());
        }

        let snapshot = self.store.snapshot(corpus)?;
        let context = self.build_context(corpus, &snapshot)?;
        let rendered = self.renderer.render(&context)?;

        let directory = self
            .output_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        write_atomically(directory, &self.output_path, rendered.as_bytes()).map_err(|source| {
            GenerationError::Write {
                path: self.output_path.clone(),
                source,
            }
        })?;

        info!(
            output = %self.output_path.display(),
            total = context.statistics.total,
            "generated test suite"
        );

        Ok(GenerationReport {
            output_path: self.output_path.clone(),
            statistics: context.statistics,
            record_count: context.records.len(),
        })
    }

    /// Records and statistics come from the same snapshot so the rendered
    /// cases and the header counts cannot disagree.
    pub fn build_context(
        &self,
        corpus: &FixtureCorpus,
        snapshot: &StoreSnapshot,
    ) -> Result<RenderContext, IdentifierError> {
        let records = build_records(corpus, snapshot, self.policy)?;
        Ok(RenderContext::new(
            records,
            self.clock.now().format(TIMESTAMP_FORMAT).to_string(),
        ))
    }
}

pub fn build_records(
    corpus: &FixtureCorpus,
    snapshot: &StoreSnapshot,
    policy: &ClassificationPolicy,
) -> Result<Vec<GenerationRecord>, IdentifierError> {
    let fixtures = corpus.fixtures();
    let identifiers = assign_identifiers(fixtures)?;
    let categories = classify_fixtures(fixtures, snapshot, policy);

    Ok(fixtures
        .iter()
        .zip(identifiers)
        .zip(categories)
        .map(|((fixture, test_name), category)| GenerationRecord {
            test_name,
            filename: fixture.file_name.clone(),
            category,
        })
        .collect())
}

pub fn render_generation_summary(report: &GenerationReport) -> String {
    let statistics = &report.statistics;
    let mut lines = vec![
        format!("Generated test suite: {}", report.output_path.display()),
        "Test statistics:".to_string(),
        format!("  Valid: {}", statistics.valid),
        format!("  Invalid: {}", statistics.invalid),
        format!("  Warning: {}", statistics.warning),
    ];
    if statistics.unknown > 0 {
        lines.push(format!("  Unknown: {}", statistics.unknown));
    }
    lines.push(format!("  Total tests: {}", statistics.total));
    lines.join("\n")
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to write test suite '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<GenerationError> for SuiteError {
    fn from(error: GenerationError) -> Self {
        match error {
            GenerationError::Corpus(source) => source.into(),
            GenerationError::Store(source) => source.into(),
            GenerationError::Identifier(source) => source.into(),
            GenerationError::Render(source) => source.into(),
            GenerationError::Write { .. } => {
                SuiteError::io_system("IO.SUITE_WRITE", error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GenerationError, SuiteGenerator, build_records, render_generation_summary};
    use crate::domain::{Category, SuiteError};
    use crate::modules::classifier::ClassificationPolicy;
    use crate::modules::corpus::FixtureCorpus;
    use crate::modules::render::TemplateRenderer;
    use crate::modules::sanitizer::IdentifierError;
    use crate::modules::store::ExpectationStore;
    use crate::modules::traits::FixedClock;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn moment(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|date| date.and_hms_opt(12, minute, 0))
            .expect("valid timestamp")
    }

    fn workspace(fixtures: &[(&str, Option<&str>)]) -> (TempDir, FixtureCorpus, ExpectationStore) {
        let temp = TempDir::new().expect("tempdir should be created");
        let fixture_dir = temp.path().join("fixtures");
        fs::create_dir_all(&fixture_dir).expect("fixture dir");
        let store = ExpectationStore::new(temp.path().join("expectations"), "out");
        for (name, expectation) in fixtures {
            fs::write(fixture_dir.join(name), b"\x89PNG").expect("fixture");
            if let Some(text) = expectation {
                fs::create_dir_all(store.directory()).expect("store dir");
                fs::write(store.directory().join(format!("{name}.out")), text)
                    .expect("expectation");
            }
        }
        let corpus = FixtureCorpus::scan(&fixture_dir, "*.png").expect("scan");
        (temp, corpus, store)
    }

    #[test]
    fn records_carry_identifier_filename_and_category_in_corpus_order() {
        let (_temp, corpus, store) = workspace(&[
            ("good.png", Some("No errors detected.")),
            ("bad.png", Some("ERROR: CRC error in chunk.")),
            ("1.2-odd name!.png", None),
        ]);
        let snapshot = store.snapshot(&corpus).expect("snapshot");

        let records = build_records(&corpus, &snapshot, &ClassificationPolicy::default())
            .expect("records");
        let summary: Vec<(&str, &str, Category)> = records
            .iter()
            .map(|record| {
                (
                    record.test_name.as_str(),
                    record.filename.as_str(),
                    record.category,
                )
            })
            .collect();
        assert_eq!(
            summary,
            [
                ("1_2_odd_name", "1.2-odd name!.png", Category::Unknown),
                ("bad", "bad.png", Category::Invalid),
                ("good", "good.png", Category::Valid),
            ]
        );
    }

    #[test]
    fn generation_writes_file_and_reports_statistics() {
        let (temp, corpus, store) = workspace(&[("good.png", Some("No errors detected."))]);
        let policy = ClassificationPolicy::default();
        let renderer = TemplateRenderer::builtin().expect("template");
        let clock = FixedClock(moment(30));
        let output = temp.path().join("out/nested/test_suite.c");

        let report = SuiteGenerator::new(&store, &policy, &renderer, &clock, &output)
            .generate(&corpus)
            .expect("generation should succeed");

        assert_eq!(report.record_count, 1);
        assert_eq!(report.statistics.valid, 1);
        assert_eq!(report.statistics.total, 1);
        let summary = render_generation_summary(&report);
        assert!(summary.contains("  Valid: 1"));
        assert!(summary.contains("  Total tests: 1"));
        assert!(!summary.contains("Unknown"));

        let content = fs::read_to_string(&output).expect("suite should be written");
        assert!(content.contains("2024-05-01 12:30:00"));
        assert!(content.contains("test_png_file(\"good.png\", 0, \"OK\");"));
    }

    #[test]
    fn regeneration_differs_only_in_timestamp() {
        let (temp, corpus, store) = workspace(&[
            ("a.png", Some("OK")),
            ("b.png", Some("additional data after IEND chunk")),
        ]);
        let policy = ClassificationPolicy::default();
        let renderer = TemplateRenderer::builtin().expect("template");
        let output = temp.path().join("suite.c");

        let first_clock = FixedClock(moment(0));
        SuiteGenerator::new(&store, &policy, &renderer, &first_clock, &output)
            .generate(&corpus)
            .expect("first generation");
        let first = fs::read_to_string(&output).expect("first output");

        let second_clock = FixedClock(moment(59));
        SuiteGenerator::new(&store, &policy, &renderer, &second_clock, &output)
            .generate(&corpus)
            .expect("second generation");
        let second = fs::read_to_string(&output).expect("second output");

        assert_ne!(first, second);
        assert_eq!(
            first.replace("2024-05-01 12:00:00", "<ts>"),
            second.replace("2024-05-01 12:59:00", "<ts>")
        );
    }

    #[test]
    fn collision_fails_and_keeps_previous_output() {
        let (temp, corpus, store) = workspace(&[("a!.png", None), ("a?.png", None)]);
        let output = temp.path().join("suite.c");
        fs::write(&output, "previous good suite").expect("previous output");
        let policy = ClassificationPolicy::default();
        let renderer = TemplateRenderer::builtin().expect("template");
        let clock = FixedClock(moment(0));

        let error = SuiteGenerator::new(&store, &policy, &renderer, &clock, &output)
            .generate(&corpus)
            .expect_err("collision should fail generation");
        assert!(matches!(
            error,
            GenerationError::Identifier(IdentifierError::Collision { .. })
        ));

        let suite_error = SuiteError::from(error);
        assert_eq!(suite_error.placeholder(), "RUN.IDENTIFIER_COLLISION");
        assert!(suite_error.message().contains("a!.png"));
        assert!(suite_error.message().contains("a?.png"));
        assert_eq!(
            fs::read_to_string(&output).expect("previous output"),
            "previous good suite"
        );
    }

    #[test]
    fn write_failure_is_fatal_and_leaves_existing_target_untouched() {
        let (temp, corpus, store) = workspace(&[("good.png", Some("No errors detected."))]);
        let output = temp.path().join("suite/test_suite.c");
        fs::create_dir_all(output.join("kept")).expect("directory in the way");
        fs::write(output.join("kept/previous.c"), "previous good suite").expect("previous");
        let policy = ClassificationPolicy::default();
        let renderer = TemplateRenderer::builtin().expect("template");
        let clock = FixedClock(moment(0));

        let error = SuiteGenerator::new(&store, &policy, &renderer, &clock, &output)
            .generate(&corpus)
            .expect_err("write should fail");
        assert!(matches!(error, GenerationError::Write { .. }));

        let suite_error = SuiteError::from(error);
        assert_eq!(suite_error.placeholder(), "IO.SUITE_WRITE");
        assert_eq!(suite_error.exit_code(), 3);
        assert_eq!(
            fs::read_to_string(output.join("kept/previous.c")).expect("previous"),
            "previous good suite"
        );
        let siblings = fs::read_dir(temp.path().join("suite"))
            .expect("suite dir")
            .count();
        assert_eq!(siblings, 1, "no staged file may be left behind");
    }

    #[test]
    fn context_groups_records_by_category() {
        let (_temp, corpus, store) = workspace(&[
            ("a.png", Some("ERROR: bad")),
            ("b.png", Some("OK")),
            ("c.png", Some("ERRORS DETECTED")),
        ]);
        let policy = ClassificationPolicy::default();
        let renderer = TemplateRenderer::builtin().expect("template");
        let clock = FixedClock(moment(0));
        let generator = SuiteGenerator::new(&store, &policy, &renderer, &clock, "unused.c");

        let snapshot = store.snapshot(&corpus).expect("snapshot");
        let context = generator.build_context(&corpus, &snapshot).expect("context");
        let invalid: Vec<&str> = context
            .records_invalid
            .iter()
            .map(|record| record.filename.as_str())
            .collect();
        assert_eq!(invalid, ["a.png", "c.png"]);
        assert_eq!(context.records_valid.len(), 1);
        assert!(context.records_warning.is_empty());
        assert_eq!(context.statistics.total, 3);
        assert_eq!(context.generated_at, "2024-05-01 12:00:00");
    }

    #[test]
    fn empty_corpus_is_fixtures_missing() {
        let (temp, corpus, store) = workspace(&[]);
        let policy = ClassificationPolicy::default();
        let renderer = TemplateRenderer::builtin().expect("template");
        let clock = FixedClock(moment(0));
        let output = temp.path().join("suite.c");

        let error = SuiteGenerator::new(&store, &policy, &renderer, &clock, &output)
            .generate(&corpus)
            .expect_err("empty corpus should fail");
        assert_eq!(
            SuiteError::from(error).placeholder(),
            "INPUT.FIXTURES_MISSING"
        );
        assert!(!Path::new(&output).exists());
    }
}
