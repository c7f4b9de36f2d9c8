use super::locator::LocatorError;
use super::render::{RenderContext, RenderError};
use crate::domain::OracleOutput;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

pub trait OracleRunner {
    fn run(&self, fixture_path: &Path) -> OracleOutput;
}

pub trait OracleLocator {
    fn locate(&self) -> Result<PathBuf, LocatorError>;
}

pub trait SuiteRenderer {
    fn render(&self, context: &RenderContext) -> Result<String, RenderError>;
}

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock, OracleRunner};
    use crate::domain::OracleOutput;
    use chrono::NaiveDate;
    use std::path::Path;

    struct EchoOracle;

    impl OracleRunner for EchoOracle {
        fn run(&self, fixture_path: &Path) -> OracleOutput {
            OracleOutput {
                text: fixture_path.display().to_string(),
                exit_code: Some(0),
                success: true,
                failure: None,
            }
        }
    }

    #[test]
    fn runners_are_usable_as_trait_objects() {
        let oracle = EchoOracle;
        let runner: &dyn OracleRunner = &oracle;
        let output = runner.run(Path::new("a.png"));
        assert_eq!(output.text, "a.png");
        assert!(output.success);
    }

    #[test]
    fn fixed_clock_is_stable() {
        let moment = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|date| date.and_hms_opt(12, 30, 0))
            .expect("valid timestamp");
        let clock = FixedClock(moment);
        assert_eq!(clock.now(), clock.now());
    }
}
