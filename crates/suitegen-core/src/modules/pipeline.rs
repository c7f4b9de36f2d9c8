use super::classifier::ClassificationPolicy;
use super::corpus::FixtureCorpus;
use super::generator::{GenerationReport, SuiteGenerator};
use super::oracle::ProcessOracle;
use super::render::TemplateRenderer;
use super::statistics::collect_statistics;
use super::store::{ExpectationStore, RefreshReport};
use super::traits::{Clock, OracleLocator, OracleRunner, SuiteRenderer};
use crate::common::SuiteConfig;
use crate::domain::{Statistics, SuiteResult};

/// Wires the pipeline components from one [`SuiteConfig`].
#[derive(Debug, Clone)]
pub struct SuitePipeline {
    config: SuiteConfig,
    store: ExpectationStore,
    policy: ClassificationPolicy,
}

impl SuitePipeline {
    pub fn new(config: SuiteConfig) -> Self {
        let store = ExpectationStore::new(
            config.expectations_dir.clone(),
            config.expectation_extension.clone(),
        );
        Self {
            config,
            store,
            policy: ClassificationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ClassificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    pub fn store(&self) -> &ExpectationStore {
        &self.store
    }

    pub fn policy(&self) -> &ClassificationPolicy {
        &self.policy
    }

    /// Corpus of the configured fixture directory; missing or empty is fatal.
    pub fn corpus(&self) -> SuiteResult<FixtureCorpus> {
        let corpus =
            FixtureCorpus::scan(&self.config.fixtures_dir, &self.config.fixture_pattern)?;
        Ok(corpus.require_non_empty()?)
    }

    pub fn process_oracle(&self, locator: &dyn OracleLocator) -> SuiteResult<ProcessOracle> {
        let executable = locator.locate()?;
        Ok(ProcessOracle::new(
            executable,
            self.config.accepted_exit_codes.clone(),
            self.config.oracle_timeout,
        ))
    }

    pub fn renderer(&self) -> SuiteResult<TemplateRenderer> {
        Ok(TemplateRenderer::from_optional_file(
            self.config.template_path.as_deref(),
        )?)
    }

    pub fn has_expectations(&self) -> SuiteResult<bool> {
        Ok(self.store.record_count()? > 0)
    }

    pub fn refresh_expectations(
        &self,
        oracle: &dyn OracleRunner,
        force: bool,
    ) -> SuiteResult<RefreshReport> {
        let corpus = self.corpus()?;
        Ok(self.store.refresh(&corpus, oracle, force)?)
    }

    pub fn statistics(&self) -> SuiteResult<Statistics> {
        let corpus = self.corpus()?;
        Ok(collect_statistics(&corpus, &self.store, &self.policy)?)
    }

    pub fn generate(
        &self,
        renderer: &dyn SuiteRenderer,
        clock: &dyn Clock,
    ) -> SuiteResult<GenerationReport> {
        let corpus = self.corpus()?;
        let generator = SuiteGenerator::new(
            &self.store,
            &self.policy,
            renderer,
            clock,
            self.config.output_path.clone(),
        );
        Ok(generator.generate(&corpus)?)
    }
}
