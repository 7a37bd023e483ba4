// Attempt messages - the result half of a testStarted..testFinished sequence

use crate::error::{ReporterError, Result};
use crate::model::{TestResult, TestStatus};
use crate::protocol::{MessageName, ServiceMessage};

use super::attachment;

/// Everything needed to render one attempt of a test
pub(crate) struct Attempt<'a> {
    pub name: &'a str,
    pub timeout_ms: u64,
    pub result: &'a TestResult,
    pub artifacts: &'a str,
}

impl Attempt<'_> {
    /// Reject statuses this reporter cannot render.
    ///
    /// Checked before anything is written so an unknown status never leaves a
    /// half-reported attempt behind.
    pub fn check_status(&self) -> Result<()> {
        match &self.result.status {
            TestStatus::Unknown(status) => Err(ReporterError::UnsupportedStatus {
                status: status.clone(),
                test: self.name.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Outcome, metadata and testFinished messages, without flow ids
    pub fn result_messages(&self) -> Result<Vec<ServiceMessage>> {
        let mut messages = Vec::with_capacity(self.result.attachments.len() + 2);

        match &self.result.status {
            TestStatus::Passed => {}
            TestStatus::Skipped => messages.push(
                ServiceMessage::new(MessageName::TestIgnored)
                    .attr("name", self.name)
                    .attr("message", "skipped"),
            ),
            TestStatus::TimedOut => messages.push(
                ServiceMessage::new(MessageName::TestFailed)
                    .attr("name", self.name)
                    .attr(
                        "message",
                        format!("Timeout of {}ms exceeded.", self.timeout_ms),
                    )
                    .attr("details", self.result.error_stack()),
            ),
            TestStatus::Failed => messages.push(
                ServiceMessage::new(MessageName::TestFailed)
                    .attr("name", self.name)
                    .attr("message", self.result.error_message())
                    .attr("details", self.result.error_stack()),
            ),
            TestStatus::Interrupted => messages.push(
                ServiceMessage::new(MessageName::TestFailed)
                    .attr("name", self.name)
                    .attr("message", "Test interrupted"),
            ),
            TestStatus::Unknown(_) => {
                self.check_status()?;
            }
        }

        for item in &self.result.attachments {
            let encoded = attachment::encode(item, self.artifacts);
            messages.push(
                ServiceMessage::new(MessageName::TestMetadata)
                    .attr("type", encoded.kind.as_str())
                    .attr("testName", self.name)
                    .attr("name", encoded.name)
                    .attr("value", encoded.value),
            );
        }

        messages.push(
            ServiceMessage::new(MessageName::TestFinished)
                .attr("name", self.name)
                .attr("duration", self.result.duration_ms.to_string()),
        );

        Ok(messages)
    }
}
