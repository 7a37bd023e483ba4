// Execution module - stands in for the test engine by replaying recorded events

pub mod driver;
pub mod events;

pub use driver::{RunDriver, build_tree};
pub use events::{AttachmentSpec, ResultSpec, RunEvent, SuiteSpec, TestSpec};
