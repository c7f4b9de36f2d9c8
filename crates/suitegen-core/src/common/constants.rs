//! Conventional layout and oracle defaults for a pngcheck checkout.

pub const CONFIG_FILE_NAME: &str = "suitegen.json";

pub const FIXTURES_RELATIVE_DIR: &str = "test/fixtures/pngsuite";
pub const EXPECTATIONS_RELATIVE_DIR: &str = "test/expectations/pngsuite";
pub const SUITE_RELATIVE_PATH: &str = "test/test/test_pngcheck_suite.c";

pub const DEFAULT_FIXTURE_PATTERN: &str = "*.png";
pub const DEFAULT_EXPECTATION_EXTENSION: &str = "out";

/// pngcheck exits 1 when it rejects an input but still completed its report.
pub const DEFAULT_ACCEPTED_EXIT_CODES: [i32; 2] = [0, 1];
pub const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 30;

pub const ORACLE_ENV_VAR: &str = "SUITEGEN_ORACLE";
pub const ORACLE_CANDIDATE_NAMES: [&str; 2] = ["pngcheck", "pngcheck.exe"];
pub const ORACLE_CANDIDATE_DIRS: [&str; 3] = [".", "build", "target/release"];

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
