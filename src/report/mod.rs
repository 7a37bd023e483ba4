// Report module - lifecycle callbacks and the TeamCity translator

pub mod attachment;
mod attempt;
pub mod console;
pub mod flow;
pub mod replay;
pub mod teamcity;

use crate::error::Result;
use crate::model::{FullResult, RunConfig, SuiteTree, TestError, TestId, TestResult};
pub use console::{Console, ConsoleLine, MemoryConsole, StdConsole};
pub use flow::FlowTracker;
pub use replay::{ReporterMode, SuiteReconstructor};
pub use teamcity::TeamcityReporter;

/// Reporter trait
///
/// Callbacks arrive one at a time from the execution engine. `on_begin`
/// precedes everything, `on_test_begin` precedes that test's `on_test_end`
/// calls (one per attempt), and `on_end` follows everything.
pub trait Reporter {
    /// Called once when the run starts
    fn on_begin(&mut self, config: &RunConfig, suite: &SuiteTree) -> Result<()>;

    /// Called when a test attempt starts
    fn on_test_begin(&mut self, suite: &SuiteTree, test: TestId) -> Result<()>;

    /// Called for stdout output, tagged with the test that produced it, if any
    fn on_std_out(&mut self, suite: &SuiteTree, chunk: &str, test: Option<TestId>) -> Result<()>;

    /// Called for stderr output, tagged with the test that produced it, if any
    fn on_std_err(&mut self, suite: &SuiteTree, chunk: &str, test: Option<TestId>) -> Result<()>;

    /// Called when a test attempt finishes
    fn on_test_end(&mut self, suite: &SuiteTree, test: TestId, result: &TestResult) -> Result<()>;

    /// Called for errors outside of any test, at any time
    fn on_error(&mut self, error: &TestError);

    /// Called when the entire run finishes
    fn on_end(&mut self, suite: &SuiteTree, result: &FullResult) -> Result<()>;
}
