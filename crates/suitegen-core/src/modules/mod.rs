pub mod classifier;
pub mod corpus;
pub mod generator;
pub mod locator;
pub mod oracle;
pub mod pipeline;
pub mod render;
pub mod sanitizer;
pub mod statistics;
pub mod status;
pub mod store;

mod traits;

pub use traits::{Clock, FixedClock, OracleLocator, OracleRunner, SuiteRenderer, SystemClock};
