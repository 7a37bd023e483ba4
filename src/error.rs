// Reporter errors - fatal conditions raised by the translator

use thiserror::Error;

use crate::model::{SuiteId, TestId};

/// Errors returned by reporter callbacks.
///
/// Every variant is fatal for the run: the reporter cannot keep producing a
/// trustworthy protocol stream once one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReporterError {
    /// A test result carried a status this reporter does not know how to render.
    #[error("status '{status}' isn't supported (test '{test}')")]
    UnsupportedStatus { status: String, test: String },

    /// A buffered test was replayed but no completed attempt was pending for it.
    #[error("result should not be empty for test '{test}'")]
    MissingResult { test: String },

    /// A lifecycle callback arrived in a state where it is not allowed.
    #[error("unexpected {event} while reporter is {state}")]
    OutOfOrder {
        event: &'static str,
        state: &'static str,
    },

    /// A callback referenced a test id that is not part of the suite tree.
    #[error("test {0} is not part of the suite tree")]
    UnknownTest(TestId),

    /// A suite id that is not part of the suite tree.
    #[error("suite {0} is not part of the suite tree")]
    UnknownSuite(SuiteId),
}

pub type Result<T, E = ReporterError> = std::result::Result<T, E>;
