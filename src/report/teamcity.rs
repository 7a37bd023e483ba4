// TeamCity reporter - translates run lifecycle callbacks into service messages
// https://www.jetbrains.com/help/teamcity/service-messages.html#Reporting+Tests

use std::mem;

use tracing::debug;

use crate::config::{ReportDesign, ReporterOptions};
use crate::error::{ReporterError, Result};
use crate::model::{FullResult, RunConfig, SuiteTree, TestError, TestId, TestResult};
use crate::protocol::{MessageName, ServiceMessage};

use super::attempt::Attempt;
use super::console::{Console, StdConsole};
use super::flow::FlowTracker;
use super::replay::{ReporterMode, SuiteReconstructor};
use super::Reporter;

/// Per-run bookkeeping of the selected design
#[derive(Debug)]
enum Strategy {
    /// Each test streams under its own flow id
    Flow(FlowTracker),
    /// Results are buffered and replayed inside suite envelopes
    Replay(SuiteReconstructor),
}

#[derive(Debug)]
enum RunState {
    Idle,
    Running(Strategy),
    Finished,
}

impl RunState {
    fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running(_) => "running",
            Self::Finished => "finished",
        }
    }
}

/// Reporter writing the TeamCity service message protocol to a [`Console`]
#[derive(Debug)]
pub struct TeamcityReporter<C: Console = StdConsole> {
    options: ReporterOptions,
    console: C,
    state: RunState,
}

impl TeamcityReporter<StdConsole> {
    pub fn new(options: ReporterOptions) -> Self {
        Self::with_console(options, StdConsole)
    }
}

impl<C: Console> TeamcityReporter<C> {
    pub fn with_console(options: ReporterOptions, console: C) -> Self {
        Self {
            options,
            console,
            state: RunState::Idle,
        }
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    /// Replay mode of a running suite-replay report
    pub fn mode(&self) -> Option<ReporterMode> {
        match &self.state {
            RunState::Running(Strategy::Replay(reconstructor)) => Some(reconstructor.mode()),
            _ => None,
        }
    }

    pub fn into_console(self) -> C {
        self.console
    }

    /// Render one service message onto the protocol stream
    fn write_message(&mut self, message: &ServiceMessage) {
        self.console.log(&message.to_string());
    }

    fn running(&mut self, event: &'static str) -> Result<&mut Strategy> {
        match &mut self.state {
            RunState::Running(strategy) => Ok(strategy),
            other => Err(ReporterError::OutOfOrder {
                event,
                state: other.label(),
            }),
        }
    }

    fn std_chunk(
        &mut self,
        suite: &SuiteTree,
        chunk: &str,
        test: Option<TestId>,
        name: MessageName,
    ) -> Result<()> {
        let Some(test) = test else {
            self.pass_through(chunk, name);
            return Ok(());
        };

        let event = match name {
            MessageName::TestStdErr => "on_std_err",
            _ => "on_std_out",
        };
        let strategy = match &mut self.state {
            RunState::Running(strategy) => strategy,
            other => {
                return Err(ReporterError::OutOfOrder {
                    event,
                    state: other.label(),
                });
            }
        };

        match strategy {
            Strategy::Flow(flows) => {
                let message = ServiceMessage::new(name)
                    .attr("name", suite.full_title(test)?)
                    .attr("out", chunk)
                    .attr("flowId", flows.flow_for(test));
                self.write_message(&message);
            }
            Strategy::Replay(reconstructor) => {
                suite.test(test)?;
                let buffered = match name {
                    MessageName::TestStdErr => reconstructor.std_err(test, chunk),
                    _ => reconstructor.std_out(test, chunk),
                };
                if !buffered {
                    debug!("no attempt of test {} left to hold output", test);
                    self.pass_through(chunk, name);
                }
            }
        }
        Ok(())
    }

    fn pass_through(&mut self, chunk: &str, name: MessageName) {
        match name {
            MessageName::TestStdErr => self.console.stderr(chunk),
            _ => self.console.stdout(chunk),
        }
    }
}

impl<C: Console> Reporter for TeamcityReporter<C> {
    fn on_begin(&mut self, config: &RunConfig, suite: &SuiteTree) -> Result<()> {
        if !matches!(self.state, RunState::Idle) {
            return Err(ReporterError::OutOfOrder {
                event: "on_begin",
                state: self.state.label(),
            });
        }
        debug!(
            "run started: {} tests, {} workers",
            suite.test_count(),
            config.workers
        );

        let (strategy, run_flow) = match self.options.design {
            ReportDesign::FlowKeyed => (Strategy::Flow(FlowTracker::new()), None),
            ReportDesign::SuiteReplay => {
                let mode = ReporterMode::for_workers(config.workers);
                if mode == ReporterMode::Batched {
                    self.console.info(&format!(
                        "Tests run in {} workers. The results will be reported after all of them finish.",
                        config.workers
                    ));
                }
                let flow_id = std::process::id().to_string();
                let reconstructor = SuiteReconstructor::new(
                    mode,
                    self.options.suite_depth,
                    flow_id.clone(),
                    self.options.test_metadata_artifacts.clone(),
                );
                (Strategy::Replay(reconstructor), Some(flow_id))
            }
        };

        let mut messages = Vec::new();
        if self.options.log_config {
            messages.push(
                ServiceMessage::new(MessageName::Message).attr("text", config.to_message_text()),
            );
        }
        if config.retries_enabled() {
            messages.push(ServiceMessage::new(MessageName::TestRetrySupport).attr("enabled", "true"));
        }
        for message in messages {
            let message = match &run_flow {
                Some(flow_id) => message.attr("flowId", flow_id.as_str()),
                None => message,
            };
            self.write_message(&message);
        }

        self.state = RunState::Running(strategy);
        Ok(())
    }

    fn on_test_begin(&mut self, suite: &SuiteTree, test: TestId) -> Result<()> {
        let messages = match self.running("on_test_begin")? {
            Strategy::Flow(flows) => {
                let name = suite.full_title(test)?;
                vec![ServiceMessage::new(MessageName::TestStarted)
                    .attr("name", name)
                    .attr("flowId", flows.flow_for(test))]
            }
            Strategy::Replay(reconstructor) => reconstructor.test_begin(suite, test)?,
        };

        for message in &messages {
            self.write_message(message);
        }
        Ok(())
    }

    fn on_std_out(&mut self, suite: &SuiteTree, chunk: &str, test: Option<TestId>) -> Result<()> {
        self.std_chunk(suite, chunk, test, MessageName::TestStdOut)
    }

    fn on_std_err(&mut self, suite: &SuiteTree, chunk: &str, test: Option<TestId>) -> Result<()> {
        self.std_chunk(suite, chunk, test, MessageName::TestStdErr)
    }

    fn on_test_end(&mut self, suite: &SuiteTree, test: TestId, result: &TestResult) -> Result<()> {
        let artifacts = self.options.test_metadata_artifacts.clone();
        let case = suite.test(test)?;

        let messages = match self.running("on_test_end")? {
            Strategy::Flow(flows) => {
                let name = suite.full_title(test)?;
                let attempt = Attempt {
                    name: &name,
                    timeout_ms: case.timeout_ms,
                    result,
                    artifacts: &artifacts,
                };
                attempt.check_status()?;
                let flow_id = flows.flow_for(test);
                attempt
                    .result_messages()?
                    .into_iter()
                    .map(|message| message.attr("flowId", flow_id))
                    .collect()
            }
            Strategy::Replay(reconstructor) => {
                let attempt = Attempt {
                    name: &case.title,
                    timeout_ms: case.timeout_ms,
                    result,
                    artifacts: &artifacts,
                };
                attempt.check_status()?;
                reconstructor.test_end(test, result);
                Vec::new()
            }
        };

        for message in &messages {
            self.write_message(message);
        }
        Ok(())
    }

    fn on_error(&mut self, error: &TestError) {
        self.console.error(&error.to_string());
    }

    fn on_end(&mut self, suite: &SuiteTree, result: &FullResult) -> Result<()> {
        let strategy = match mem::replace(&mut self.state, RunState::Finished) {
            RunState::Running(strategy) => strategy,
            other => {
                let state = other.label();
                self.state = other;
                return Err(ReporterError::OutOfOrder {
                    event: "on_end",
                    state,
                });
            }
        };

        if let Strategy::Replay(mut reconstructor) = strategy {
            for message in reconstructor.finish(suite)? {
                self.write_message(&message);
            }
        }

        self.console
            .info(&format!("Finished the run: {}", result.status));
        Ok(())
    }
}
