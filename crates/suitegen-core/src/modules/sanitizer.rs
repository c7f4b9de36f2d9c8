use crate::domain::{Fixture, SuiteError};
use std::collections::BTreeMap;

/// Maps a fixture base name onto `[A-Za-z0-9_]`, collapsing `_` runs and
/// trimming the edges: `1.2-odd name!` becomes `1_2_odd_name`.
pub fn sanitize_identifier(name: &str) -> String {
    let mut identifier = String::with_capacity(name.len());
    for character in name.chars() {
        let mapped = if character.is_ascii_alphanumeric() || character == '_' {
            character
        } else {
            '_'
        };
        if mapped == '_' && identifier.ends_with('_') {
            continue;
        }
        identifier.push(mapped);
    }

    let trimmed = identifier.strip_prefix('_').unwrap_or(&identifier);
    let trimmed = trimmed.strip_suffix('_').unwrap_or(trimmed);
    trimmed.to_string()
}

/// Sanitized identifier for every fixture, in input order.
///
/// Fails on the first pair of fixtures that map to the same identifier, or on
/// a fixture whose name has no usable characters at all.
pub fn assign_identifiers(fixtures: &[Fixture]) -> Result<Vec<String>, IdentifierError> {
    let mut owners: BTreeMap<String, &str> = BTreeMap::new();
    let mut identifiers = Vec::with_capacity(fixtures.len());

    for fixture in fixtures {
        let identifier = sanitize_identifier(&fixture.base_name);
        if identifier.is_empty() {
            return Err(IdentifierError::Empty {
                file_name: fixture.file_name.clone(),
            });
        }
        if let Some(first) = owners.get(&identifier) {
            return Err(IdentifierError::Collision {
                identifier,
                first: (*first).to_string(),
                second: fixture.file_name.clone(),
            });
        }
        owners.insert(identifier.clone(), &fixture.file_name);
        identifiers.push(identifier);
    }

    Ok(identifiers)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("fixtures '{first}' and '{second}' both map to test identifier '{identifier}'")]
    Collision {
        identifier: String,
        first: String,
        second: String,
    },
    #[error("fixture '{file_name}' does not yield a usable test identifier")]
    Empty { file_name: String },
}

impl From<IdentifierError> for SuiteError {
    fn from(error: IdentifierError) -> Self {
        let message = error.to_string();
        match error {
            IdentifierError::Collision { .. } => {
                SuiteError::computation("RUN.IDENTIFIER_COLLISION", message)
            }
            IdentifierError::Empty { .. } => {
                SuiteError::input_validation("INPUT.IDENTIFIER_EMPTY", message)
            }
        }
    }
}
