// Suite reconstructor - replays buffered results inside suite envelopes
//
// The execution engine only notifies per test. To show suites, completed
// attempts are queued per test and later replayed by walking the suite tree,
// either whenever the running anchor suite changes (single worker) or once at
// the end of the run (several workers).

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::error::{ReporterError, Result};
use crate::model::{SuiteId, SuiteTree, TestId, TestResult};
use crate::protocol::{MessageName, ServiceMessage};
use crate::time::format_timestamp;

use super::attempt::Attempt;

/// When buffered results are replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterMode {
    /// Flush each anchor suite as soon as the next one starts
    Continuous,
    /// Replay the whole tree at the end of the run
    Batched,
}

impl ReporterMode {
    /// Interleaving can only be reconstructed while tests run one at a time
    pub fn for_workers(workers: usize) -> Self {
        if workers == 1 {
            Self::Continuous
        } else {
            Self::Batched
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputChunk {
    Out(String),
    Err(String),
}

#[derive(Debug)]
struct PendingAttempt {
    result: TestResult,
    output: Vec<OutputChunk>,
}

/// Buffers attempts per test and replays them grouped by suite
#[derive(Debug)]
pub struct SuiteReconstructor {
    mode: ReporterMode,
    suite_depth: usize,
    flow_id: String,
    artifacts: String,
    current_anchor: Option<SuiteId>,
    pending: HashMap<TestId, VecDeque<PendingAttempt>>,
    open_output: HashMap<TestId, Vec<OutputChunk>>,
    reported: HashSet<TestId>,
}

impl SuiteReconstructor {
    pub fn new(
        mode: ReporterMode,
        suite_depth: usize,
        flow_id: impl Into<String>,
        artifacts: impl Into<String>,
    ) -> Self {
        Self {
            mode,
            suite_depth,
            flow_id: flow_id.into(),
            artifacts: artifacts.into(),
            current_anchor: None,
            pending: HashMap::new(),
            open_output: HashMap::new(),
            reported: HashSet::new(),
        }
    }

    pub fn mode(&self) -> ReporterMode {
        self.mode
    }

    /// Suite under which `test`'s results are grouped
    pub fn anchor_of(&self, tree: &SuiteTree, test: TestId) -> Result<SuiteId> {
        let parent = tree.test(test)?.parent;
        tree.ancestor_at_depth(parent, self.suite_depth)
    }

    /// Track a starting test; returns the messages of a suite that just ended
    pub fn test_begin(&mut self, tree: &SuiteTree, test: TestId) -> Result<Vec<ServiceMessage>> {
        let mut messages = Vec::new();

        if self.mode == ReporterMode::Continuous {
            let anchor = self.anchor_of(tree, test)?;
            if self.current_anchor != Some(anchor) {
                if let Some(previous) = self.current_anchor.take() {
                    self.emit_anchor(tree, previous, &mut messages)?;
                }
                self.current_anchor = Some(anchor);
            }
        }

        self.open_output.insert(test, Vec::new());
        Ok(messages)
    }

    /// Buffer stdout of `test`; `false` when no attempt can take it
    pub fn std_out(&mut self, test: TestId, chunk: &str) -> bool {
        self.buffer_output(test, OutputChunk::Out(chunk.to_string()))
    }

    /// Buffer stderr of `test`; `false` when no attempt can take it
    pub fn std_err(&mut self, test: TestId, chunk: &str) -> bool {
        self.buffer_output(test, OutputChunk::Err(chunk.to_string()))
    }

    /// Output goes to the running attempt, else to the last queued one.
    /// Once a test's attempts are replayed there is nowhere left to put it.
    fn buffer_output(&mut self, test: TestId, chunk: OutputChunk) -> bool {
        if let Some(output) = self.open_output.get_mut(&test) {
            output.push(chunk);
            return true;
        }
        match self.pending.get_mut(&test).and_then(VecDeque::back_mut) {
            Some(attempt) => {
                attempt.output.push(chunk);
                true
            }
            None => false,
        }
    }

    /// Queue a completed attempt together with the output captured since it began
    pub fn test_end(&mut self, test: TestId, result: &TestResult) {
        let output = self.open_output.remove(&test).unwrap_or_default();
        self.pending
            .entry(test)
            .or_default()
            .push_back(PendingAttempt {
                result: result.clone(),
                output,
            });
    }

    /// Everything still buffered at the end of the run
    pub fn finish(&mut self, tree: &SuiteTree) -> Result<Vec<ServiceMessage>> {
        let mut messages = Vec::new();
        match self.mode {
            ReporterMode::Continuous => {
                if let Some(anchor) = self.current_anchor.take() {
                    self.emit_anchor(tree, anchor, &mut messages)?;
                }
            }
            ReporterMode::Batched => {
                for suite_id in tree.suites_preorder() {
                    let depth = tree.depth(suite_id)?;
                    let is_anchor = depth == self.suite_depth
                        || (depth < self.suite_depth && !tree.suite(suite_id)?.tests.is_empty());
                    if is_anchor {
                        self.emit_suite(tree, suite_id, depth, &mut messages)?;
                    }
                }
            }
        }
        Ok(messages)
    }

    fn emit_anchor(
        &mut self,
        tree: &SuiteTree,
        anchor: SuiteId,
        messages: &mut Vec<ServiceMessage>,
    ) -> Result<()> {
        debug!("flushing suite '{}'", tree.suite(anchor)?.title);
        let depth = tree.depth(anchor)?;
        self.emit_suite(tree, anchor, depth, messages)
    }

    fn emit_suite(
        &mut self,
        tree: &SuiteTree,
        suite_id: SuiteId,
        depth: usize,
        messages: &mut Vec<ServiceMessage>,
    ) -> Result<()> {
        if !self.has_unreported(tree, suite_id)? {
            return Ok(());
        }
        let suite = tree.suite(suite_id)?;
        // The root has no title and TeamCity rejects nameless suites
        let envelope = !suite.title.is_empty();

        if envelope {
            messages.push(self.with_flow(
                ServiceMessage::new(MessageName::TestSuiteStarted)
                    .attr("name", suite.title.as_str()),
            ));
        }

        for &test in &suite.tests {
            self.emit_test(tree, test, messages)?;
        }

        // Suites at or above the anchor depth are replayed as anchors of their own
        if depth >= self.suite_depth {
            for &child in &suite.suites {
                self.emit_suite(tree, child, depth + 1, messages)?;
            }
        }

        if envelope {
            messages.push(self.with_flow(
                ServiceMessage::new(MessageName::TestSuiteFinished)
                    .attr("name", suite.title.as_str()),
            ));
        }
        Ok(())
    }

    /// Whether the subtree holds a queued attempt or a test not yet replayed
    fn has_unreported(&self, tree: &SuiteTree, suite_id: SuiteId) -> Result<bool> {
        let suite = tree.suite(suite_id)?;
        let test_unreported = suite.tests.iter().any(|test| {
            !self.reported.contains(test)
                || self.pending.get(test).is_some_and(|queue| !queue.is_empty())
        });
        if test_unreported {
            return Ok(true);
        }
        for &child in &suite.suites {
            if self.has_unreported(tree, child)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn emit_test(
        &mut self,
        tree: &SuiteTree,
        test: TestId,
        messages: &mut Vec<ServiceMessage>,
    ) -> Result<()> {
        let case = tree.test(test)?;
        let attempts = self.pending.remove(&test).unwrap_or_default();

        if attempts.is_empty() {
            if self.reported.contains(&test) {
                // Already replayed by an earlier flush of the same anchor
                return Ok(());
            }
            return Err(ReporterError::MissingResult {
                test: case.title.clone(),
            });
        }
        self.reported.insert(test);

        for pending in attempts {
            let attempt = Attempt {
                name: &case.title,
                timeout_ms: case.timeout_ms,
                result: &pending.result,
                artifacts: &self.artifacts,
            };

            messages.push(
                self.with_flow(
                    ServiceMessage::new(MessageName::TestStarted)
                        .attr("name", case.title.as_str())
                        .attr("timestamp", format_timestamp(pending.result.start_time))
                        .attr("captureStandardOutput", "true"),
                ),
            );

            for chunk in &pending.output {
                let message = match chunk {
                    OutputChunk::Out(text) => ServiceMessage::new(MessageName::TestStdOut)
                        .attr("name", case.title.as_str())
                        .attr("out", text.as_str()),
                    OutputChunk::Err(text) => ServiceMessage::new(MessageName::TestStdErr)
                        .attr("name", case.title.as_str())
                        .attr("out", text.as_str()),
                };
                messages.push(self.with_flow(message));
            }

            for message in attempt.result_messages()? {
                messages.push(self.with_flow(message));
            }
        }
        Ok(())
    }

    fn with_flow(&self, message: ServiceMessage) -> ServiceMessage {
        message.attr("flowId", self.flow_id.as_str())
    }
}
