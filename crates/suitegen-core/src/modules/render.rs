use super::statistics::aggregate;
use super::traits::SuiteRenderer;
use crate::domain::{Category, GenerationRecord, Statistics, SuiteError};
use handlebars::Handlebars;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const TEMPLATE_NAME: &str = "suite";
const BUILTIN_TEMPLATE: &str = include_str!("../templates/test_suite.c.hbs");

/// Everything a suite template may reference.
///
/// `records_<category>` hold the same records as `records`, filtered by
/// category and in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderContext {
    pub records: Vec<GenerationRecord>,
    pub records_valid: Vec<GenerationRecord>,
    pub records_invalid: Vec<GenerationRecord>,
    pub records_warning: Vec<GenerationRecord>,
    pub records_unknown: Vec<GenerationRecord>,
    pub statistics: Statistics,
    pub generated_at: String,
}

impl RenderContext {
    pub fn new(records: Vec<GenerationRecord>, generated_at: impl Into<String>) -> Self {
        let categories: Vec<Category> = records.iter().map(|record| record.category).collect();
        let in_category = |category: Category| -> Vec<GenerationRecord> {
            records
                .iter()
                .filter(|record| record.category == category)
                .cloned()
                .collect()
        };
        Self {
            records_valid: in_category(Category::Valid),
            records_invalid: in_category(Category::Invalid),
            records_warning: in_category(Category::Warning),
            records_unknown: in_category(Category::Unknown),
            statistics: aggregate(&categories),
            generated_at: generated_at.into(),
            records,
        }
    }
}

/// Handlebars-backed renderer in strict mode: a template that references a
/// field outside [`RenderContext`] fails instead of rendering blanks.
pub struct TemplateRenderer {
    registry: Handlebars<'static>,
    source: TemplateSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Builtin,
    File(PathBuf),
}

impl TemplateRenderer {
    pub fn builtin() -> Result<Self, RenderError> {
        Self::from_source(BUILTIN_TEMPLATE, TemplateSource::Builtin)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let template = fs::read_to_string(path).map_err(|source| RenderError::ReadTemplate {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(&template, TemplateSource::File(path.to_path_buf()))
    }

    pub fn from_optional_file(path: Option<&Path>) -> Result<Self, RenderError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    fn from_source(template: &str, source: TemplateSource) -> Result<Self, RenderError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|error| RenderError::ParseTemplate {
                source_name: describe(&source),
                message: error.to_string(),
            })?;
        Ok(Self { registry, source })
    }
}

impl SuiteRenderer for TemplateRenderer {
    fn render(&self, context: &RenderContext) -> Result<String, RenderError> {
        self.registry
            .render(TEMPLATE_NAME, context)
            .map_err(|error| RenderError::Render {
                source_name: describe(&self.source),
                message: error.to_string(),
            })
    }
}

fn describe(source: &TemplateSource) -> String {
    match source {
        TemplateSource::Builtin => "builtin template".to_string(),
        TemplateSource::File(path) => format!("template '{}'", path.display()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to read template '{}': {source}", path.display())]
    ReadTemplate {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {source_name}: {message}")]
    ParseTemplate { source_name: String, message: String },
    #[error("failed to render {source_name}: {message}")]
    Render { source_name: String, message: String },
}

impl From<RenderError> for SuiteError {
    fn from(error: RenderError) -> Self {
        let message = error.to_string();
        match error {
            RenderError::ReadTemplate { .. } => SuiteError::io_system("IO.TEMPLATE_READ", message),
            RenderError::ParseTemplate { .. } => {
                SuiteError::input_validation("INPUT.TEMPLATE_PARSE", message)
            }
            RenderError::Render { .. } => SuiteError::computation("RUN.TEMPLATE_RENDER", message),
        }
    }
}
