// Run events - JSON lines describing a test run's lifecycle
//
// {"event":"begin","config":{"workers":1},"suite":{"suites":[...]}}
// {"event":"testBegin","test":"t1"}
// {"event":"stdOut","chunk":"hello\n","test":"t1"}
// {"event":"testEnd","test":"t1","result":{"status":"passed","duration":12}}
// {"event":"end","result":{"status":"passed"}}

use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{Attachment, FullResult, RunConfig, TestError, TestResult, TestStatus};

/// One lifecycle event, tagged by `event`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum RunEvent {
    Begin {
        #[serde(default)]
        config: RunConfig,
        suite: SuiteSpec,
    },
    TestBegin {
        test: String,
    },
    StdOut {
        chunk: String,
        #[serde(default)]
        test: Option<String>,
    },
    StdErr {
        chunk: String,
        #[serde(default)]
        test: Option<String>,
    },
    TestEnd {
        test: String,
        result: ResultSpec,
    },
    Error {
        error: TestError,
    },
    End {
        result: FullResult,
    },
}

/// Declared suite; the top-level entry is the root and normally has no title
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuiteSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub suites: Vec<SuiteSpec>,
    #[serde(default)]
    pub tests: Vec<TestSpec>,
}

/// Declared test; `id` is how later events refer to it
#[derive(Debug, Clone, Deserialize)]
pub struct TestSpec {
    pub id: String,
    pub title: String,
    /// Declared timeout in milliseconds
    #[serde(default)]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSpec {
    pub status: TestStatus,
    #[serde(default = "Utc::now")]
    pub start_time: DateTime<Utc>,
    /// Duration in milliseconds
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub error: Option<TestError>,
    #[serde(default)]
    pub attachments: Vec<AttachmentSpec>,
}

/// Attachment as written in the event stream: a file path or a text body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentSpec {
    pub name: String,
    pub content_type: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub body: Option<String>,
}

impl AttachmentSpec {
    pub fn into_attachment(self) -> Result<Attachment> {
        match (self.path, self.body) {
            (Some(path), None) => Ok(Attachment::path(self.name, self.content_type, path)),
            (None, Some(body)) => Ok(Attachment::bytes(
                self.name,
                self.content_type,
                body.into_bytes(),
            )),
            (Some(_), Some(_)) => bail!("attachment '{}' has both a path and a body", self.name),
            (None, None) => bail!("attachment '{}' has neither a path nor a body", self.name),
        }
    }
}

impl ResultSpec {
    pub fn into_result(self) -> Result<TestResult> {
        let attachments = self
            .attachments
            .into_iter()
            .map(AttachmentSpec::into_attachment)
            .collect::<Result<Vec<_>>>()?;

        Ok(TestResult {
            status: self.status,
            start_time: self.start_time,
            duration_ms: self.duration,
            error: self.error,
            attachments,
        })
    }
}
