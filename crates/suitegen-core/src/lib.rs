//! Oracle-driven test-suite generation for a file-format validator.
//!
//! Fixtures are run once through the validator, the captured output is cached
//! per fixture, classified lexically, and rendered into a generated test
//! source file through a template.

pub mod common;
pub mod domain;
pub mod modules;
