// Model module - what the execution engine hands to the reporter
// The engine owns and mutates these; reporters only read them.

pub mod metadata;
pub mod result;
pub mod run;
pub mod suite;

pub use metadata::{MetadataObject, MetadataValue};
pub use result::{Attachment, AttachmentBody, TestError, TestResult, TestStatus};
pub use run::{FullResult, ProjectConfig, RunConfig, RunStatus};
pub use suite::{Suite, SuiteId, SuiteTree, TestCase, TestId};
