// Test result structures - one execution attempt of a test case

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one attempt.
///
/// Statuses coming from the execution engine are kept verbatim when they are
/// not recognised so the reporter can refuse them instead of dropping them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TestStatus {
    Passed,
    Failed,
    TimedOut,
    Skipped,
    Interrupted,
    Unknown(String),
}

impl TestStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::TimedOut => "timedOut",
            Self::Skipped => "skipped",
            Self::Interrupted => "interrupted",
            Self::Unknown(other) => other,
        }
    }
}

impl From<&str> for TestStatus {
    fn from(value: &str) -> Self {
        match value {
            "passed" => Self::Passed,
            "failed" => Self::Failed,
            "timedOut" => Self::TimedOut,
            "skipped" => Self::Skipped,
            "interrupted" => Self::Interrupted,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for TestStatus {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<TestStatus> for String {
    fn from(value: TestStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported by the execution engine for a failed attempt or the run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stack: Option<String>,
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.stack, &self.message) {
            (Some(stack), _) => f.write_str(stack),
            (None, Some(message)) => f.write_str(message),
            (None, None) => f.write_str("unknown error"),
        }
    }
}

/// Where an attachment's content lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentBody {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// Named side artifact of an attempt (screenshot, trace, log)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    pub body: AttachmentBody,
}

impl Attachment {
    pub fn path(
        name: impl Into<String>,
        content_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            body: AttachmentBody::Path(path.into()),
        }
    }

    pub fn bytes(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            body: AttachmentBody::Bytes(bytes.into()),
        }
    }
}

/// One execution attempt
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub status: TestStatus,
    pub start_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub error: Option<TestError>,
    pub attachments: Vec<Attachment>,
}

impl TestResult {
    pub fn new(status: impl Into<TestStatus>, start_time: DateTime<Utc>, duration_ms: u64) -> Self {
        Self {
            status: status.into(),
            start_time,
            duration_ms,
            error: None,
            attachments: Vec::new(),
        }
    }

    /// Create a passed attempt starting now
    pub fn passed(duration_ms: u64) -> Self {
        Self::new(TestStatus::Passed, Utc::now(), duration_ms)
    }

    /// Create a failed attempt starting now
    pub fn failed(message: impl Into<String>, stack: impl Into<String>, duration_ms: u64) -> Self {
        Self::new(TestStatus::Failed, Utc::now(), duration_ms).with_error(TestError {
            message: Some(message.into()),
            stack: Some(stack.into()),
        })
    }

    pub fn with_error(mut self, error: TestError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn error_message(&self) -> &str {
        self.error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .unwrap_or_default()
    }

    pub fn error_stack(&self) -> &str {
        self.error
            .as_ref()
            .and_then(|e| e.stack.as_deref())
            .unwrap_or_default()
    }
}
