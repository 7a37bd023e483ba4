pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod model;
pub mod protocol;
pub mod report;
pub mod time;

pub use config::{ReportDesign, ReporterOptions};
pub use error::ReporterError;
pub use protocol::{MessageName, ServiceMessage, escape};
pub use report::{Reporter, TeamcityReporter};
