pub mod analysis;
pub mod config;
pub mod dispatcher;
pub mod executor;
pub mod orchestrator;
pub mod outcome;
pub mod phase;
pub mod report;
pub mod stats;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use analysis::*;
pub use config::*;
pub use dispatcher::*;
pub use executor::*;
pub use orchestrator::*;
pub use outcome::*;
pub use phase::*;
pub use report::*;
pub use stats::*;
pub use transport::*;
